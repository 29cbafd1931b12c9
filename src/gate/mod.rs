//! Role-based page gating

pub mod guard;
pub mod machine;
pub mod routes;

pub use guard::{PageVisit, RoleGate};
pub use machine::{evaluate, GateState};
pub use routes::{Access, RouteRule, RouteTable};
