//! Clinic portal - role-gated client for the clinic management API
//!
//! This is the library interface: session handling, the role gate, the
//! authenticated API gateway and the typed CRUD resources. The `clinic` binary is
//! a terminal front end over it.

pub mod api;
pub mod auth;
pub mod cli;
pub mod config;
pub mod error;
pub mod gate;
pub mod navigation;
pub mod portal;
pub mod resources;

pub use config::Config;
pub use error::Error;
pub use portal::Portal;
