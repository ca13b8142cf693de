//! Settings of the machine a job runs on.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Hadoop's default block size.
pub const DEFAULT_SPLIT_SIZE: u64 = 128 * 1024 * 1024;

fn available_cores() -> usize {
    std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1)
}

fn default_split_size() -> u64 {
    DEFAULT_SPLIT_SIZE
}

fn default_dfs_root() -> PathBuf {
    PathBuf::from("/")
}

/// Settings of the local job runner.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Number of map tasks running at the same time.
    #[serde(default = "available_cores")]
    pub map_slots: usize,
    /// Number of reduce tasks running at the same time.
    #[serde(default = "available_cores")]
    pub reduce_slots: usize,
    /// Size of an input split in bytes.
    #[serde(default = "default_split_size")]
    pub split_size: u64,
    /// Local directory against which file system paths are resolved.
    #[serde(default = "default_dfs_root")]
    pub dfs_root: PathBuf,
    /// Local directory against which relative paths are resolved. The current directory if absent.
    #[serde(default)]
    pub working_dir: Option<PathBuf>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        RuntimeConfig {
            map_slots: available_cores(),
            reduce_slots: available_cores(),
            split_size: DEFAULT_SPLIT_SIZE,
            dfs_root: default_dfs_root(),
            working_dir: None,
        }
    }
}
