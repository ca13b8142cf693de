//! Parameters of one run, resolved from positional arguments.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use wcbench_dfs::path::DfsPath;

/// Used when the slow-start fraction argument is absent.
pub const DEFAULT_SLOWSTART: &str = "0.50";
/// Used when the reducer count argument is absent.
pub const DEFAULT_REDUCERS: u32 = 4;

/// Errors in command line arguments. All of them are detected before a job is submitted.
#[derive(Debug, Error)]
pub enum ParamError {
    #[error("missing required argument <{0}>, usage: <inputPath> <outputPath> [slowstartFraction] [reducerCount]")]
    MissingArgument(&'static str),
    #[error("reducer count must be a positive integer, got {0:?}")]
    InvalidReducerCount(String),
    #[error("unknown naming strategy {0:?}, expected task2, task3, path-with-data-size or substring-match-only")]
    UnknownNamingStrategy(String),
}

/// Immutable parameters of a run.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobParameters {
    pub input_path: DfsPath,
    pub output_path: DfsPath,
    /// Slow-start fraction exactly as given. Validated by the runner.
    pub slowstart: String,
    pub reducers: u32,
}

impl JobParameters {
    /// Reads `<inputPath> <outputPath> [slowstartFraction] [reducerCount]`. Further arguments are ignored.
    pub fn from_args<I, S>(args: I) -> Result<JobParameters, ParamError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut args = args.into_iter().map(Into::into);
        let input_path = args.next().ok_or(ParamError::MissingArgument("inputPath"))?;
        let output_path = args.next().ok_or(ParamError::MissingArgument("outputPath"))?;
        let slowstart = args.next().unwrap_or_else(|| DEFAULT_SLOWSTART.to_string());
        let reducers = match args.next() {
            Some(arg) => arg.parse().map_err(|_| ParamError::InvalidReducerCount(arg))?,
            None => DEFAULT_REDUCERS,
        };
        Ok(JobParameters {
            input_path: input_path.into(),
            output_path: output_path.into(),
            slowstart,
            reducers,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let params = JobParameters::from_args(["/in", "/out"]).unwrap();
        assert_eq!(params.input_path.as_str(), "/in");
        assert_eq!(params.output_path.as_str(), "/out");
        assert_eq!(params.slowstart, "0.50");
        assert_eq!(params.reducers, 4);
    }

    #[test]
    fn explicit_values_are_kept_verbatim() {
        let params = JobParameters::from_args(["/in", "/out", "0.8", "16", "extra"]).unwrap();
        assert_eq!(params.slowstart, "0.8");
        assert_eq!(params.reducers, 16);

        let params = JobParameters::from_args(["/in", "/out", "1.00"]).unwrap();
        assert_eq!(params.slowstart, "1.00");
        assert_eq!(params.reducers, 4);
    }

    #[test]
    fn bad_arguments() {
        assert!(matches!(
            JobParameters::from_args(["/in"]),
            Err(ParamError::MissingArgument("outputPath"))
        ));
        assert!(matches!(
            JobParameters::from_args(Vec::<String>::new()),
            Err(ParamError::MissingArgument("inputPath"))
        ));
        for count in ["four", "-1", "4.0", ""] {
            assert!(matches!(
                JobParameters::from_args(["/in", "/out", "0.5", count]),
                Err(ParamError::InvalidReducerCount(_))
            ));
        }
        assert_eq!(
            ParamError::InvalidReducerCount("four".to_string()).to_string(),
            "reducer count must be a positive integer, got \"four\""
        );
    }
}
