pub mod session;

pub use session::{SessionManager, SESSION_TIMEOUT_SECS};
