//! The acting user's identity, passed explicitly to whatever needs it.

use crate::config::{Config, ConfigError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub employee_id: String,
}

impl Session {
    pub fn new(employee_id: impl Into<String>) -> Self {
        Self {
            employee_id: employee_id.into(),
        }
    }

    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        config.require_employee_id().map(Self::new)
    }
}
