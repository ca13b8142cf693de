//! Tools for loading settings from YAML files.

use std::path::Path;

use crate::{error::ConfigError, system::RuntimeConfig};

impl RuntimeConfig {
    /// Read [RuntimeConfig] from YAML file. Missing fields take their default values.
    pub fn from_yaml<P: AsRef<Path>>(file: P) -> Result<Self, ConfigError> {
        let path = file.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_yaml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}
