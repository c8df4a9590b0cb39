//! Card configuration: which entity to bind to and how the card is laid out.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing required `entity` (the media player entity id)")]
    MissingEntity,
    #[error("cannot read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid config file: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardConfig {
    #[serde(default, alias = "entity_id")]
    pub entity: Option<String>,
    #[serde(default = "default_show_controls")]
    pub show_controls: bool,
    /// Card height in pixels.
    #[serde(default = "default_card_height")]
    pub card_height: u32,
}

impl Default for CardConfig {
    fn default() -> Self {
        Self {
            entity: None,
            show_controls: default_show_controls(),
            card_height: default_card_height(),
        }
    }
}

fn default_show_controls() -> bool {
    true
}

fn default_card_height() -> u32 {
    400
}

impl CardConfig {
    /// Load a JSON card config. Validation is left to [`CardConfig::validate`]
    /// so that CLI flags can still fill in the entity.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// The configured entity id, or `MissingEntity` when absent or blank.
    pub fn validate(&self) -> Result<&str, ConfigError> {
        self.entity
            .as_deref()
            .map(str::trim)
            .filter(|e| !e.is_empty())
            .ok_or(ConfigError::MissingEntity)
    }
}
