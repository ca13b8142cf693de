//! Campaigns of runs over inputs, slow-start fractions and reducer counts.

use std::{
    collections::BTreeMap,
    io::Write,
    path::PathBuf,
    time::{Duration, Instant},
};

use itertools::Itertools;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use wcbench_dfs::path::DfsPath;
use wcbench_mr::{
    run_stats::{straggler_ratio, JobReport},
    runner::LocalJobRunner,
    system::RuntimeConfig,
};

use crate::{
    configurator::JobConfigurator,
    job_params::JobParameters,
    naming_strategy::{RunMetadata, Workload},
};

struct Run {
    input: DfsPath,
    slowstart: String,
    reducers: u32,
    attempt: usize,
}

/// Outcome of one run of a campaign.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RunResult {
    pub input: String,
    pub workload: Workload,
    pub data_size: Option<String>,
    pub slowstart: String,
    pub reducers: u32,
    pub attempt: usize,
    pub job_name: String,
    /// Present if the job succeeded.
    pub report: Option<JobReport>,
}

/// Name of the output directory of one run, e.g. `output_wordcount_500MB_s050_reducers4_run1`.
pub fn output_dir_name(metadata: &RunMetadata, slowstart: &str, reducers: u32, attempt: usize) -> String {
    let workload = metadata.workload.to_string().to_lowercase();
    let size = metadata
        .data_size
        .as_ref()
        .map(|size| format!("_{}", size))
        .unwrap_or_default();
    let slowstart = match slowstart.parse::<f64>() {
        Ok(fraction) => format!("{:03}", (fraction * 100.).round() as i64),
        Err(_) => slowstart.replace(|c: char| !c.is_ascii_alphanumeric(), "_"),
    };
    format!(
        "output_{}{}_s{}_reducers{}_run{}",
        workload, size, slowstart, reducers, attempt
    )
}

pub struct Experiment {
    inputs: Vec<DfsPath>,
    slowstarts: Vec<String>,
    reducers: Vec<u32>,
    runs_per_config: usize,
    output_dir: DfsPath,
    configurator: JobConfigurator,
    runtime: RuntimeConfig,
    traces_folder: Option<PathBuf>,
}

impl Experiment {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        inputs: Vec<DfsPath>,
        slowstarts: Vec<String>,
        reducers: Vec<u32>,
        runs_per_config: usize,
        output_dir: DfsPath,
        configurator: JobConfigurator,
        runtime: RuntimeConfig,
        traces_folder: Option<PathBuf>,
    ) -> Self {
        Self {
            inputs,
            slowstarts,
            reducers,
            runs_per_config,
            output_dir,
            configurator,
            runtime,
            traces_folder,
        }
    }

    /// Runs every combination of parameters one after another, so runs don't compete for cores.
    pub fn run(self) -> std::io::Result<Vec<RunResult>> {
        if let Some(dir) = &self.traces_folder {
            std::fs::create_dir_all(dir)?;
        }

        let runs = self
            .inputs
            .iter()
            .cloned()
            .cartesian_product(self.slowstarts.iter().cloned())
            .cartesian_product(self.reducers.iter().copied())
            .cartesian_product(1..=self.runs_per_config)
            .map(|(((input, slowstart), reducers), attempt)| Run {
                input,
                slowstart,
                reducers,
                attempt,
            })
            .collect::<Vec<_>>();

        let total_runs = runs.len();
        let start_time = Instant::now();
        let mut results = Vec::with_capacity(total_runs);
        for (finished_runs, run) in runs.into_iter().enumerate() {
            results.push(self.execute(run));

            let finished_runs = finished_runs + 1;
            let elapsed = start_time.elapsed();
            let remaining = Duration::from_secs_f64(
                elapsed.as_secs_f64() / finished_runs as f64 * (total_runs - finished_runs) as f64,
            );
            print!("\r{}", " ".repeat(70));
            print!(
                "\rFinished {}/{} [{}%] runs in {:.2?}, remaining time: {:.2?}",
                finished_runs,
                total_runs,
                (finished_runs as f64 * 100. / total_runs as f64).round() as i32,
                elapsed,
                remaining
            );
            std::io::stdout().flush()?;
        }

        print!("\r{}", " ".repeat(70));
        println!("\rFinished {} runs in {:.2?}", total_runs, start_time.elapsed());
        Ok(results)
    }

    fn execute(&self, run: Run) -> RunResult {
        let metadata = self.configurator.strategy().derive(&run.input);
        let run_name = output_dir_name(&metadata, &run.slowstart, run.reducers, run.attempt);
        let output = self.output_dir.join(&run_name);
        let params = JobParameters {
            input_path: run.input.clone(),
            output_path: output.clone(),
            slowstart: run.slowstart.clone(),
            reducers: run.reducers,
        };
        let job_name = self.configurator.job_name(&params);

        let mut runner = LocalJobRunner::new(self.runtime.clone());
        if let Some(folder) = &self.traces_folder {
            // Job names may be overridden with one name for all runs.
            runner = runner.with_trace(folder.join(format!("{}.json", run_name)));
        }
        match runner.dfs().remove(&output) {
            Ok(true) => info!("Removed previous output {}", output),
            Ok(false) => {}
            Err(e) => warn!("Can't remove previous output {}: {}", output, e),
        }

        let report = match self.configurator.submit(&params, &runner) {
            Ok(report) => Some(report),
            Err(e) => {
                warn!("Run {} #{} failed: {}", job_name, run.attempt, e);
                None
            }
        };
        RunResult {
            input: run.input.to_string(),
            workload: metadata.workload,
            data_size: metadata.data_size,
            slowstart: run.slowstart,
            reducers: run.reducers,
            attempt: run.attempt,
            job_name,
            report,
        }
    }
}

/// Aggregated timings of all runs of one configuration, in seconds.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SummaryRow {
    pub input: String,
    pub slowstart: String,
    pub reducers: u32,
    pub runs: usize,
    pub failed: usize,
    pub mean_total: f64,
    pub stddev_total: f64,
    pub mean_map_completion: f64,
    pub mean_first_reduce_start: f64,
    pub mean_min_reduce_elapsed: f64,
    pub mean_avg_reduce_elapsed: f64,
    pub mean_max_reduce_elapsed: f64,
    /// Mean slowest over mean fastest reduce task run time.
    pub straggler_ratio: f64,
    /// Mean slowest minus mean average reduce task run time.
    pub straggler_delay: f64,
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation, zero for less than two values.
fn stddev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.;
    }
    let mean = mean(values);
    (values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (values.len() - 1) as f64).sqrt()
}

/// Groups results by configuration. Failed runs are counted but excluded from timings.
pub fn summarize(results: &[RunResult]) -> Vec<SummaryRow> {
    let mut groups: BTreeMap<(String, u32, String), Vec<&RunResult>> = BTreeMap::new();
    for result in results.iter() {
        groups
            .entry((result.input.clone(), result.reducers, result.slowstart.clone()))
            .or_default()
            .push(result);
    }

    groups
        .into_iter()
        .map(|((input, reducers, slowstart), runs)| {
            let timelines = runs
                .iter()
                .filter_map(|run| run.report.as_ref().map(|report| &report.timeline))
                .collect::<Vec<_>>();
            let totals = timelines.iter().map(|t| t.total).collect::<Vec<_>>();
            let min_reduce = mean(&timelines.iter().map(|t| t.min_reduce_elapsed).collect::<Vec<_>>());
            let avg_reduce = mean(&timelines.iter().map(|t| t.avg_reduce_elapsed).collect::<Vec<_>>());
            let max_reduce = mean(&timelines.iter().map(|t| t.max_reduce_elapsed).collect::<Vec<_>>());
            SummaryRow {
                input,
                slowstart,
                reducers,
                runs: runs.len(),
                failed: runs.len() - timelines.len(),
                mean_total: mean(&totals),
                stddev_total: stddev(&totals),
                mean_map_completion: mean(&timelines.iter().map(|t| t.map_completion).collect::<Vec<_>>()),
                mean_first_reduce_start: mean(&timelines.iter().map(|t| t.first_reduce_start).collect::<Vec<_>>()),
                mean_min_reduce_elapsed: min_reduce,
                mean_avg_reduce_elapsed: avg_reduce,
                mean_max_reduce_elapsed: max_reduce,
                straggler_ratio: straggler_ratio(min_reduce, max_reduce),
                straggler_delay: max_reduce - avg_reduce,
            }
        })
        .collect()
}
