//! Configuring and submitting the word count job.

use log::{error, info};
use wcbench_mr::{
    configuration::{Configuration, JOB_NAME},
    error::JobError,
    job::Job,
    run_stats::JobReport,
    runner::LocalJobRunner,
};

use crate::{
    int_sum::IntSumReducer,
    job_params::JobParameters,
    naming_strategy::{NamingStrategy, RunMetadata},
    tokenizer::TokenizerMapper,
};

/// Turns [JobParameters] into a submitted word count job.
#[derive(Clone, Debug)]
pub struct JobConfigurator {
    strategy: NamingStrategy,
    configuration: Configuration,
}

impl JobConfigurator {
    /// `configuration` is the base of every configured job, e.g. properties given with `-D`.
    pub fn new(strategy: NamingStrategy, configuration: Configuration) -> Self {
        JobConfigurator {
            strategy,
            configuration,
        }
    }

    pub fn strategy(&self) -> NamingStrategy {
        self.strategy
    }

    pub fn configuration(&self) -> &Configuration {
        &self.configuration
    }

    pub fn metadata(&self, params: &JobParameters) -> RunMetadata {
        self.strategy.derive(&params.input_path)
    }

    /// A non-empty `mapreduce.job.name` property wins over the strategy's template.
    pub fn job_name(&self, params: &JobParameters) -> String {
        match self.configuration.get(JOB_NAME) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => self.strategy.job_name(&self.metadata(params), params),
        }
    }

    pub fn configure(&self, params: &JobParameters) -> Job<TokenizerMapper, IntSumReducer> {
        let mut job = Job::new(
            self.configuration.clone(),
            self.job_name(params),
            TokenizerMapper,
            IntSumReducer,
        );
        job.set_combiner(IntSumReducer);
        job.set_num_reduce_tasks(params.reducers);
        job.set_reduce_slowstart(&params.slowstart);
        job.add_input_path(params.input_path.clone());
        job.set_output_path(params.output_path.clone());
        job
    }

    /// Configures the job, runs it and blocks until it finishes.
    pub fn submit(&self, params: &JobParameters, runner: &LocalJobRunner) -> Result<JobReport, JobError> {
        let job = self.configure(params);
        info!(
            "Submitting job {} ({}): input {}, output {}",
            job.name(),
            self.strategy,
            params.input_path,
            params.output_path
        );
        job.wait_for_completion(runner)
    }

    /// Same as [submit](JobConfigurator::submit), reporting only whether the job succeeded.
    pub fn run(&self, params: &JobParameters, runner: &LocalJobRunner) -> bool {
        match self.submit(params, runner) {
            Ok(report) => {
                info!(
                    "Job {} finished: maps done at {:.3}s, first reduce at {:.3}s, reduces done at {:.3}s",
                    report.job_name,
                    report.timeline.map_completion,
                    report.timeline.first_reduce_start,
                    report.timeline.reduce_completion
                );
                true
            }
            Err(e) => {
                error!("Job failed: {}", e);
                false
            }
        }
    }
}

/// Process exit status for a job result.
pub fn exit_code(success: bool) -> u8 {
    if success {
        0
    } else {
        1
    }
}
