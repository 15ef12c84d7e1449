//! Machine configuration.
//!
//! A `FlopConfig` sets the starting gate and the history bound of every
//! machine a registry creates. It deserializes from JSON with every field
//! optional, so hosts can keep it alongside their own settings.

use crate::core::DEFAULT_HISTORY_LIMIT;
use serde::{Deserialize, Serialize};

/// Settings applied to a machine when it is created.
///
/// # Example
///
/// ```rust
/// use flipflop::FlopConfig;
///
/// let config = FlopConfig::from_json(r#"{ "history_limit": 8 }"#).unwrap();
/// assert_eq!(config.history_limit, 8);
/// assert!(config.accept_events);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlopConfig {
    /// Whether new machines start with the gate open.
    pub accept_events: bool,

    /// How many transitions each machine remembers. Zero disables history.
    pub history_limit: usize,
}

impl Default for FlopConfig {
    fn default() -> Self {
        Self {
            accept_events: true,
            history_limit: DEFAULT_HISTORY_LIMIT,
        }
    }
}

impl FlopConfig {
    /// Parse a config from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    pub fn accept_events(mut self, accept: bool) -> Self {
        self.accept_events = accept;
        self
    }

    pub fn history_limit(mut self, limit: usize) -> Self {
        self.history_limit = limit;
        self
    }
}
