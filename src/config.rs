// ⚙️ Network configuration
//
// Defaults reproduce the template network; a JSON file and BNA_* environment
// variables can override them.

use crate::error::{LedgerError, Result};
use crate::schema::{validate_namespace, DEFAULT_NAMESPACE};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const ENV_NAMESPACE: &str = "BNA_NAMESPACE";
pub const ENV_DATABASE: &str = "BNA_DATABASE";
pub const ENV_ACTOR: &str = "BNA_ACTOR";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Namespace that qualifies every type name
    pub namespace: String,

    /// SQLite file used by the CLI
    pub database_path: PathBuf,

    /// Participant recorded as the submitter of transactions
    pub actor: String,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        NetworkConfig {
            namespace: DEFAULT_NAMESPACE.to_string(),
            database_path: PathBuf::from("commodity-trading.db"),
            actor: "admin".to_string(),
        }
    }
}

impl NetworkConfig {
    /// Load from a JSON file; missing keys keep their defaults
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            LedgerError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let config: NetworkConfig = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults overridden by environment variables
    pub fn from_env() -> Result<Self> {
        NetworkConfig::default().with_env_overrides()
    }

    /// Apply BNA_NAMESPACE / BNA_DATABASE / BNA_ACTOR when set
    pub fn with_env_overrides(self) -> Result<Self> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        if let Some(namespace) = lookup(ENV_NAMESPACE) {
            self.namespace = namespace;
        }
        if let Some(path) = lookup(ENV_DATABASE) {
            self.database_path = PathBuf::from(path);
        }
        if let Some(actor) = lookup(ENV_ACTOR) {
            self.actor = actor;
        }
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<()> {
        validate_namespace(&self.namespace)
            .map_err(|_| LedgerError::Config(format!("Invalid namespace: '{}'", self.namespace)))?;
        if self.actor.trim().is_empty() {
            return Err(LedgerError::Config("Actor must not be empty".to_string()));
        }
        Ok(())
    }
}
