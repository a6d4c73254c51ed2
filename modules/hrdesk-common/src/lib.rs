pub mod config;
pub mod session;

pub use config::{Config, ConfigError};
pub use session::Session;
