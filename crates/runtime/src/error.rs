//! Errors of job configuration and execution.

use std::path::PathBuf;

use thiserror::Error;
use wcbench_dfs::dfs::DfsError;

use crate::task::TaskKind;

/// Errors of loading runtime settings and configuration properties.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("can't read file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("can't parse YAML from file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("property must look like key=value, got {0:?}")]
    InvalidProperty(String),
}

/// Reasons a job fails.
#[derive(Debug, Error)]
pub enum JobError {
    #[error("invalid reduce slowstart {0:?}: expected a number between 0 and 1")]
    InvalidSlowstart(String),
    #[error("invalid number of reduce tasks {0:?}: expected a positive integer")]
    InvalidReduceTasks(String),
    #[error("job has no input paths")]
    NoInputPaths,
    #[error("job has no output path")]
    MissingOutputPath,
    #[error(transparent)]
    Dfs(#[from] DfsError),
    #[error("{kind} task {task_id} failed: {message}")]
    TaskFailed {
        kind: TaskKind,
        task_id: usize,
        message: String,
    },
    #[error("reduce task {0} aborted since the job has failed")]
    Aborted(usize),
    #[error("can't write trace to {path}: {message}")]
    Trace { path: PathBuf, message: String },
}
