use std::{io::Write, path::PathBuf, process::ExitCode};

use anyhow::Context;
use clap::Parser;
use env_logger::Builder;
use log::LevelFilter;
use wcbench::{
    configurator::{exit_code, JobConfigurator},
    job_params::JobParameters,
    naming_strategy::NamingStrategy,
};
use wcbench_mr::{
    configuration::{parse_property, Configuration},
    runner::LocalJobRunner,
    system::RuntimeConfig,
};

/// Counts words of the input and writes `word\tcount` lines to the output directory.
#[derive(Parser, Debug)]
struct Args {
    /// Configuration property, e.g. `-D mapreduce.job.name=MyRun`.
    #[arg(short = 'D', value_name = "KEY=VALUE")]
    properties: Vec<String>,

    /// How the job is named: task2 (path with data size) or task3 (substring match).
    #[arg(long, default_value = "task2")]
    task: NamingStrategy,

    /// Path to YAML file with runner settings.
    #[arg(long)]
    runtime_config: Option<PathBuf>,

    /// Path to file where the task trace is saved.
    #[arg(long)]
    trace: Option<PathBuf>,

    /// <inputPath> <outputPath> [slowstartFraction] [reducerCount]. Further arguments are ignored.
    #[arg(required = true, num_args = 2.., allow_hyphen_values = true, value_name = "ARGS")]
    args: Vec<String>,
}

fn main() -> anyhow::Result<ExitCode> {
    Builder::new()
        .filter_level(LevelFilter::Info)
        .parse_default_env()
        .format(|buf, record| writeln!(buf, "{} {}", record.level(), record.args()))
        .init();

    let args = Args::parse();
    let configuration = args
        .properties
        .iter()
        .map(|property| parse_property(property))
        .collect::<Result<Configuration, _>>()
        .context("Can't parse -D properties")?;
    let params = JobParameters::from_args(args.args).context("Invalid arguments")?;
    let runtime = match &args.runtime_config {
        Some(path) => RuntimeConfig::from_yaml(path).context("Can't load runtime config")?,
        None => RuntimeConfig::default(),
    };

    let mut runner = LocalJobRunner::new(runtime);
    if let Some(path) = args.trace {
        runner = runner.with_trace(path);
    }
    let configurator = JobConfigurator::new(args.task, configuration);
    Ok(ExitCode::from(exit_code(configurator.run(&params, &runner))))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positional_arguments() {
        let args = Args::try_parse_from(["wordcount", "-D", "mapreduce.job.name=X", "/in", "/out", "-0.5", "4", "extra"])
            .unwrap();
        assert_eq!(args.properties, vec!["mapreduce.job.name=X"]);
        assert_eq!(args.args, vec!["/in", "/out", "-0.5", "4", "extra"]);

        let params = JobParameters::from_args(args.args).unwrap();
        assert_eq!(params.slowstart, "-0.5");
        assert_eq!(params.reducers, 4);

        let args = Args::try_parse_from(["wordcount", "--task", "task3", "in", "out"]).unwrap();
        assert_eq!(args.task, NamingStrategy::SubstringMatchOnly);
        assert_eq!(args.args, vec!["in", "out"]);

        assert!(Args::try_parse_from(["wordcount", "/in"]).is_err());
    }
}
