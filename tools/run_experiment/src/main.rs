use std::{
    collections::BTreeMap,
    fs::File,
    io::{BufReader, Write},
    path::PathBuf,
};

use anyhow::Context;
use clap::Parser;
use env_logger::Builder;
use log::LevelFilter;
use serde::Deserialize;
use wcbench::{
    configurator::JobConfigurator,
    experiment::{summarize, Experiment, RunResult},
    naming_strategy::NamingStrategy,
};
use wcbench_dfs::path::DfsPath;
use wcbench_mr::{configuration::Configuration, system::RuntimeConfig};

fn default_runs_per_config() -> usize {
    3
}

fn default_task() -> NamingStrategy {
    NamingStrategy::PathWithDataSize
}

#[derive(Deserialize)]
struct Config {
    inputs: Vec<DfsPath>,
    slowstarts: Vec<String>,
    reducers: Vec<u32>,
    #[serde(default = "default_runs_per_config")]
    runs_per_config: usize,
    /// Directory where output directories of all runs are created.
    output_dir: DfsPath,
    #[serde(default = "default_task")]
    task: NamingStrategy,
    /// Path to YAML file with runner settings.
    runtime: Option<PathBuf>,
    /// Extra job configuration properties.
    #[serde(default)]
    properties: BTreeMap<String, String>,
}

/// Runs a slow-start campaign.
#[derive(Parser, Debug)]
struct Args {
    /// Path to config.
    #[arg(short, long)]
    config: PathBuf,

    /// Path to folder with traces.
    #[arg(short, long, default_value = None)]
    traces: Option<PathBuf>,

    /// Path to file with results.
    #[arg(short, long)]
    output: PathBuf,

    /// Do not run experiments, just read results from --output.
    #[arg(long)]
    precalculated: bool,
}

fn main() -> anyhow::Result<()> {
    Builder::new()
        .filter_level(LevelFilter::Warn)
        .parse_default_env()
        .format(|buf, record| writeln!(buf, "{}", record.args()))
        .init();

    let args = Args::parse();

    let results: Vec<RunResult> = if args.precalculated {
        let file = File::open(&args.output).context("Can't read file with results")?;
        serde_json::from_reader(BufReader::new(file)).context("Can't parse file with results")?
    } else {
        let config: Config = serde_yaml::from_str(
            &std::fs::read_to_string(&args.config).context("Can't read config file")?,
        )
        .context("Can't parse config file")?;
        let runtime = match &config.runtime {
            Some(path) => RuntimeConfig::from_yaml(path).context("Can't load runtime config")?,
            None => RuntimeConfig::default(),
        };
        let configurator = JobConfigurator::new(config.task, config.properties.into_iter().collect::<Configuration>());

        let experiment = Experiment::new(
            config.inputs,
            config.slowstarts,
            config.reducers,
            config.runs_per_config,
            config.output_dir,
            configurator,
            runtime,
            args.traces,
        );
        let results = experiment.run()?;
        File::create(&args.output)
            .context("Can't create output file")?
            .write_all(serde_json::to_string_pretty(&results)?.as_bytes())
            .context("Can't write to output file")?;
        results
    };

    let summary = summarize(&results);
    let width = summary.iter().map(|row| row.input.len()).max().unwrap_or(0).max("input".len());
    println!(
        "| {: <width$} | reducers | slowstart | runs | failed | total, s (mean ± sd) | maps done, s | first reduce, s \
         | reduce task min/avg/max, s | straggler ratio | straggler delay, s |",
        "input",
        width = width
    );
    println!(
        "|-{:-<width$}-|----------|-----------|------|--------|----------------------|--------------|-----------------\
         |----------------------------|-----------------|--------------------|",
        "",
        width = width
    );
    for row in summary.into_iter() {
        println!(
            "| {: <width$} | {: >8} | {: >9} | {: >4} | {: >6} | {: >10.3} ± {: >7.3} | {: >12.3} | {: >15.3} \
             | {: >8.3} / {: >7.3} / {: >7.3} | {: >15.2} | {: >18.3} |",
            row.input,
            row.reducers,
            row.slowstart,
            row.runs,
            row.failed,
            row.mean_total,
            row.stddev_total,
            row.mean_map_completion,
            row.mean_first_reduce_start,
            row.mean_min_reduce_elapsed,
            row.mean_avg_reduce_elapsed,
            row.mean_max_reduce_elapsed,
            row.straggler_ratio,
            row.straggler_delay,
            width = width
        );
    }
    Ok(())
}
