//! Job definition: roles, paths and configuration.

use wcbench_dfs::path::DfsPath;

use crate::{
    configuration::{Configuration, DEFAULT_REDUCES, DEFAULT_REDUCE_SLOWSTART, JOB_NAME, JOB_REDUCES, REDUCE_SLOWSTART},
    error::JobError,
    run_stats::JobReport,
    runner::LocalJobRunner,
    task::{Mapper, Reducer},
};

/// A map-reduce job ready to be submitted to a [LocalJobRunner].
pub struct Job<M, R> {
    configuration: Configuration,
    name: String,
    mapper: M,
    reducer: R,
    combiner: Option<R>,
    input_paths: Vec<DfsPath>,
    output_path: Option<DfsPath>,
}

pub(crate) struct JobParts<M, R> {
    pub name: String,
    pub mapper: M,
    pub reducer: R,
    pub combiner: Option<R>,
    pub input_paths: Vec<DfsPath>,
    pub output_path: Option<DfsPath>,
}

impl<M, R> Job<M, R>
where
    M: Mapper,
    R: Reducer<Value = M::Value>,
{
    /// Creates a job. Its name is also stored in the configuration as [JOB_NAME].
    pub fn new(mut configuration: Configuration, name: impl Into<String>, mapper: M, reducer: R) -> Self {
        let name = name.into();
        configuration.set(JOB_NAME, name.clone());
        Job {
            configuration,
            name,
            mapper,
            reducer,
            combiner: None,
            input_paths: Vec::new(),
            output_path: None,
        }
    }

    /// Sets a reducer which is applied to the output of each map task before the shuffle.
    pub fn set_combiner(&mut self, combiner: R) {
        self.combiner = Some(combiner);
    }

    pub fn set_num_reduce_tasks(&mut self, reduce_tasks: u32) {
        self.configuration.set(JOB_REDUCES, reduce_tasks.to_string());
    }

    pub fn set_reduce_slowstart(&mut self, fraction: &str) {
        self.configuration.set(REDUCE_SLOWSTART, fraction);
    }

    pub fn add_input_path(&mut self, path: impl Into<DfsPath>) {
        self.input_paths.push(path.into());
    }

    pub fn set_output_path(&mut self, path: impl Into<DfsPath>) {
        self.output_path = Some(path.into());
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn configuration(&self) -> &Configuration {
        &self.configuration
    }

    pub fn has_combiner(&self) -> bool {
        self.combiner.is_some()
    }

    pub fn input_paths(&self) -> &[DfsPath] {
        &self.input_paths
    }

    pub fn output_path(&self) -> Option<&DfsPath> {
        self.output_path.as_ref()
    }

    /// Number of reduce tasks. Must be a positive integer.
    pub fn num_reduce_tasks(&self) -> Result<usize, JobError> {
        let value = self.configuration.get_or(JOB_REDUCES, DEFAULT_REDUCES);
        match value.trim().parse::<usize>() {
            Ok(n) if n > 0 => Ok(n),
            _ => Err(JobError::InvalidReduceTasks(value.to_string())),
        }
    }

    /// Fraction of map tasks which must complete before reduce tasks start. Must be within `[0, 1]`.
    pub fn reduce_slowstart(&self) -> Result<f64, JobError> {
        let value = self.configuration.get_or(REDUCE_SLOWSTART, DEFAULT_REDUCE_SLOWSTART);
        match value.trim().parse::<f64>() {
            Ok(fraction) if (0.0..=1.0).contains(&fraction) => Ok(fraction),
            _ => Err(JobError::InvalidSlowstart(value.to_string())),
        }
    }

    /// Runs the job and blocks until it finishes.
    pub fn wait_for_completion(self, runner: &LocalJobRunner) -> Result<JobReport, JobError>
    where
        M::Value: std::fmt::Display,
    {
        runner.run(self)
    }

    pub(crate) fn into_parts(self) -> JobParts<M, R> {
        JobParts {
            name: self.name,
            mapper: self.mapper,
            reducer: self.reducer,
            combiner: self.combiner,
            input_paths: self.input_paths,
            output_path: self.output_path,
        }
    }
}
