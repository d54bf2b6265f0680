pub mod config;
pub mod core;
pub mod error;
pub mod session;

pub use error::LogError;
pub use session::{Credentials, LogSession, ReadStatus, SessionOptions};
