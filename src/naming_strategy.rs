//! Deriving run metadata and job names from input paths.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use wcbench_dfs::path::DfsPath;

use crate::job_params::{JobParameters, ParamError};

/// Data size label used when the input path carries none.
pub const UNKNOWN_DATA_SIZE: &str = "unknown";

/// Kind of workload an input was generated for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Workload {
    WordCount,
    TeraSort,
}

impl fmt::Display for Workload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Workload::WordCount => f.write_str("WordCount"),
            Workload::TeraSort => f.write_str("TeraSort"),
        }
    }
}

/// What an input path tells about a run.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunMetadata {
    pub workload: Workload,
    /// Only derived by [NamingStrategy::PathWithDataSize].
    pub data_size: Option<String>,
}

/// How run metadata and the job name are derived.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NamingStrategy {
    /// Data scalability experiment: inputs are named `input_<workload>_<size>`,
    /// e.g. `/user/root/task2/input_wordcount_500MB`.
    #[serde(alias = "task2")]
    PathWithDataSize,
    /// Workload comparison experiment: the workload is found anywhere in the path.
    #[serde(alias = "task3")]
    SubstringMatchOnly,
}

impl NamingStrategy {
    /// Name of the experiment which uses the strategy.
    pub fn experiment(&self) -> &'static str {
        match self {
            NamingStrategy::PathWithDataSize => "task2",
            NamingStrategy::SubstringMatchOnly => "task3",
        }
    }

    pub fn derive(&self, input_path: &DfsPath) -> RunMetadata {
        match self {
            NamingStrategy::PathWithDataSize => {
                let Some(rest) = input_path.last_segment().strip_prefix("input_") else {
                    return RunMetadata {
                        workload: Workload::WordCount,
                        data_size: Some(UNKNOWN_DATA_SIZE.to_string()),
                    };
                };
                let (workload, data_size) = if let Some(size) = rest.strip_prefix("wordcount_") {
                    (Workload::WordCount, size)
                } else if let Some(size) = rest.strip_prefix("terasort_") {
                    (Workload::TeraSort, size)
                } else {
                    // Older inputs carry only the size, e.g. `input_500MB`.
                    (Workload::WordCount, rest)
                };
                RunMetadata {
                    workload,
                    data_size: Some(data_size.to_string()),
                }
            }
            NamingStrategy::SubstringMatchOnly => {
                let path = input_path.as_str().to_lowercase();
                let workload = if path.contains("terasort") {
                    Workload::TeraSort
                } else {
                    Workload::WordCount
                };
                RunMetadata {
                    workload,
                    data_size: None,
                }
            }
        }
    }

    /// Job name built from the strategy's template.
    pub fn job_name(&self, metadata: &RunMetadata, params: &JobParameters) -> String {
        match self {
            NamingStrategy::PathWithDataSize => format!(
                "Task2_{}_{}_slowstart{}_reducers{}",
                metadata.workload,
                metadata.data_size.as_deref().unwrap_or(UNKNOWN_DATA_SIZE),
                params.slowstart,
                params.reducers
            ),
            NamingStrategy::SubstringMatchOnly => format!(
                "Task3_{}_slowstart{}_reducers{}",
                metadata.workload, params.slowstart, params.reducers
            ),
        }
    }
}

impl fmt::Display for NamingStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.experiment())
    }
}

impl FromStr for NamingStrategy {
    type Err = ParamError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "task2" | "path-with-data-size" => Ok(NamingStrategy::PathWithDataSize),
            "task3" | "substring-match-only" => Ok(NamingStrategy::SubstringMatchOnly),
            other => Err(ParamError::UnknownNamingStrategy(other.to_string())),
        }
    }
}
