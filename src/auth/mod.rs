//! Authentication and session management

pub mod context;
pub mod jwt;
pub mod models;
pub mod session;
pub mod storage;

pub use context::{SessionContext, SessionState};
pub use models::{Credentials, Registration, Role, Session, UserProfile};
pub use session::SessionStore;
pub use storage::{FileStorage, MemoryStorage, PersistedSession, SessionStorage};
