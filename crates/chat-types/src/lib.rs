pub mod message;
pub mod event;
pub mod config;
pub mod error;
pub mod session;


pub use error::{ChatError, LogError};
pub type Result<T> = std::result::Result<T, ChatError>;
