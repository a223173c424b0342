//! Runtime configuration, loadable from `kestrel.toml`.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use kestrel_core::{ObjError, ObjResult};

pub const DEFAULT_LOOKUP_DEPTH: usize = 8;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid toml in '{path}': {source}")]
    Toml {
        path: String,
        #[source]
        source: toml::de::Error,
    },
    #[error("{0}")]
    Invalid(#[from] ObjError),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Seed of the remaining-depth counter of the lookup chain.
    pub max_lookup_depth: usize,
    /// Initial size of the formatter buffer.
    pub repr_initial_capacity: usize,
    /// Module consulted by `String % x`.
    pub format_module: String,
    /// Function consulted by `String % x`.
    pub format_function: String,
    pub install_builtins: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            max_lookup_depth: DEFAULT_LOOKUP_DEPTH,
            repr_initial_capacity: 128,
            format_module: "__builtins__".to_string(),
            format_function: "format".to_string(),
            install_builtins: true,
        }
    }
}

impl RuntimeConfig {
    /// Load and validate a config file.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let cfg: Self = toml::from_str(&content).map_err(|source| ConfigError::Toml {
            path: path.display().to_string(),
            source,
        })?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let cfg: Self = toml::from_str(s).map_err(|source| ConfigError::Toml {
            path: "<string>".to_string(),
            source,
        })?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> ObjResult<()> {
        if self.max_lookup_depth == 0 {
            return Err(ObjError::value_error(
                "config",
                "max_lookup_depth must be at least 1",
            ));
        }
        if self.format_module.is_empty() || self.format_function.is_empty() {
            return Err(ObjError::value_error(
                "config",
                "format_module and format_function must be non-empty",
            ));
        }
        Ok(())
    }
}
