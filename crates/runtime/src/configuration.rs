//! Job configuration properties.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Name of a job.
pub const JOB_NAME: &str = "mapreduce.job.name";
/// Number of reduce tasks.
pub const JOB_REDUCES: &str = "mapreduce.job.reduces";
/// Fraction of map tasks which must complete before reduce tasks are started.
pub const REDUCE_SLOWSTART: &str = "mapreduce.job.reduce.slowstart.completedmaps";

/// Used when [REDUCE_SLOWSTART] is not set.
pub const DEFAULT_REDUCE_SLOWSTART: &str = "0.05";
/// Used when [JOB_REDUCES] is not set.
pub const DEFAULT_REDUCES: &str = "1";

/// String properties of a job, keyed by property name.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Configuration {
    properties: BTreeMap<String, String>,
}

impl Configuration {
    /// Creates empty configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a property, replacing the previous value.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.properties.insert(key.into(), value.into());
    }

    /// Value of a property.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }

    /// Value of a property or `default` if it is not set.
    pub fn get_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.get(key).unwrap_or(default)
    }

    /// Iterates over all properties in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.properties.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl FromIterator<(String, String)> for Configuration {
    fn from_iter<T: IntoIterator<Item = (String, String)>>(iter: T) -> Self {
        Configuration {
            properties: iter.into_iter().collect(),
        }
    }
}

/// Parses a `key=value` property definition. The value may itself contain `=`.
pub fn parse_property(definition: &str) -> Result<(String, String), ConfigError> {
    match definition.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => Ok((key.trim().to_string(), value.to_string())),
        _ => Err(ConfigError::InvalidProperty(definition.to_string())),
    }
}
