use std::{collections::BTreeMap, fs, path::Path};

use wcbench::{
    configurator::{exit_code, JobConfigurator},
    experiment::{summarize, Experiment, RunResult},
    int_sum::IntSumReducer,
    job_params::JobParameters,
    naming_strategy::{NamingStrategy, Workload},
    tokenizer::TokenizerMapper,
};
use wcbench_dfs::path::DfsPath;
use wcbench_mr::{
    configuration::{Configuration, JOB_NAME, JOB_REDUCES, REDUCE_SLOWSTART},
    job::Job,
    runner::LocalJobRunner,
    system::RuntimeConfig,
    trace::Trace,
};

fn runner(root: &Path, split_size: u64) -> LocalJobRunner {
    LocalJobRunner::new(RuntimeConfig {
        map_slots: 3,
        reduce_slots: 2,
        split_size,
        dfs_root: root.to_path_buf(),
        working_dir: None,
    })
}

fn write_file(root: &Path, path: &str, contents: &str) {
    let path = root.join(path.trim_start_matches('/'));
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

fn read_counts(runner: &LocalJobRunner, output: &str) -> BTreeMap<String, u64> {
    runner
        .dfs()
        .read_parts(&DfsPath::new(output))
        .unwrap()
        .into_iter()
        .map(|line| {
            let line = String::from_utf8(line).unwrap();
            let (word, count) = line.split_once('\t').unwrap();
            (word.to_string(), count.parse().unwrap())
        })
        .collect()
}

fn params(args: &[&str]) -> JobParameters {
    JobParameters::from_args(args.iter().copied()).unwrap()
}

#[test]
fn path_with_data_size_naming() {
    let configurator = JobConfigurator::new(NamingStrategy::PathWithDataSize, Configuration::new());
    let params = params(&["/user/root/task2/input_wordcount_500MB", "/user/root/task2/output"]);
    let metadata = configurator.metadata(&params);
    assert_eq!(metadata.workload, Workload::WordCount);
    assert_eq!(metadata.data_size.as_deref(), Some("500MB"));
    assert_eq!(
        configurator.job_name(&params),
        "Task2_WordCount_500MB_slowstart0.50_reducers4"
    );

    let params = JobParameters::from_args(["/data/input_terasort_1GB", "/out", "0.8", "8"]).unwrap();
    assert_eq!(configurator.job_name(&params), "Task2_TeraSort_1GB_slowstart0.8_reducers8");

    let params = JobParameters::from_args(["/data/wordcount", "/out"]).unwrap();
    assert_eq!(configurator.job_name(&params), "Task2_WordCount_unknown_slowstart0.50_reducers4");
}

#[test]
fn substring_match_naming() {
    let configurator = JobConfigurator::new(NamingStrategy::SubstringMatchOnly, Configuration::new());
    let params = params(&["/user/root/task3/input_terasort", "/user/root/task3/output"]);
    assert_eq!(configurator.metadata(&params).workload, Workload::TeraSort);
    assert_eq!(configurator.metadata(&params).data_size, None);
    assert_eq!(configurator.job_name(&params), "Task3_TeraSort_slowstart0.50_reducers4");

    let params = JobParameters::from_args(["/user/root/task3/Input_WordCount", "/out", "0.05", "1"]).unwrap();
    assert_eq!(configurator.job_name(&params), "Task3_WordCount_slowstart0.05_reducers1");
}

#[test]
fn job_name_override() {
    for strategy in [NamingStrategy::PathWithDataSize, NamingStrategy::SubstringMatchOnly] {
        let mut configuration = Configuration::new();
        configuration.set(JOB_NAME, "MyRun");
        let configurator = JobConfigurator::new(strategy, configuration);
        let params = params(&["/user/root/task2/input_wordcount_500MB", "/out"]);
        assert_eq!(configurator.job_name(&params), "MyRun");
        assert_eq!(configurator.configure(&params).name(), "MyRun");

        let mut configuration = Configuration::new();
        configuration.set(JOB_NAME, "");
        let configurator = JobConfigurator::new(strategy, configuration);
        assert!(configurator.job_name(&params).starts_with("Task"));
    }
}

#[test]
fn configured_job() {
    let configurator = JobConfigurator::new(NamingStrategy::PathWithDataSize, Configuration::new());
    let job = configurator.configure(&params(&["/in/input_wordcount_1GB", "/out", "0.30", "16"]));
    assert_eq!(job.name(), "Task2_WordCount_1GB_slowstart0.30_reducers16");
    assert_eq!(job.configuration().get(REDUCE_SLOWSTART), Some("0.30"));
    assert_eq!(job.configuration().get(JOB_REDUCES), Some("16"));
    assert_eq!(job.configuration().get(JOB_NAME), Some(job.name()));
    assert_eq!(job.num_reduce_tasks().unwrap(), 16);
    assert!(job.has_combiner());
    assert_eq!(job.input_paths(), &[DfsPath::new("/in/input_wordcount_1GB")]);
    assert_eq!(job.output_path(), Some(&DfsPath::new("/out")));
}

#[test]
fn counts_words_for_any_reducer_count() {
    let root = tempfile::tempdir().unwrap();
    write_file(root.path(), "/in/input_wordcount_tiny/data.txt", "the cat sat on the mat the cat ran\n");
    let runner = runner(root.path(), 8);
    let configurator = JobConfigurator::new(NamingStrategy::PathWithDataSize, Configuration::new());

    let expected = [("cat", 2), ("mat", 1), ("on", 1), ("ran", 1), ("sat", 1), ("the", 3)]
        .into_iter()
        .map(|(w, c)| (w.to_string(), c))
        .collect::<BTreeMap<_, _>>();
    for reducers in ["1", "4", "16"] {
        let output = format!("/out_{}", reducers);
        let params = params(&["/in/input_wordcount_tiny", output.as_str(), "0.50", reducers]);
        assert!(configurator.run(&params, &runner));
        assert_eq!(read_counts(&runner, &output), expected);
        let parts = fs::read_dir(root.path().join(output.trim_start_matches('/')))
            .unwrap()
            .filter(|e| e.as_ref().unwrap().file_name().to_string_lossy().starts_with("part-r-"))
            .count();
        assert_eq!(parts.to_string(), reducers);
    }
}

#[test]
fn result_does_not_depend_on_splits_or_combiner() {
    let root = tempfile::tempdir().unwrap();
    let mut text = String::new();
    for i in 0..300 {
        text.push_str(&format!("w{} common\tw{}  x{}\r\n", i % 13, i % 5, i % 2));
    }
    write_file(root.path(), "/in/a.txt", &text);
    write_file(root.path(), "/in/b.txt", "common common\n\n   \nlast line without newline");

    let configurator = JobConfigurator::new(NamingStrategy::PathWithDataSize, Configuration::new());
    let mut results = Vec::new();
    for (i, split_size) in [16u64, 100, 1 << 20].into_iter().enumerate() {
        let runner = runner(root.path(), split_size);
        let output = format!("/out{}", i);
        let report = configurator
            .submit(&params(&["/in", output.as_str(), "0.05", "3"]), &runner)
            .unwrap();
        assert_eq!(report.counters.map_output_records, 300 * 4 + 6);
        results.push(read_counts(&runner, &output));
    }
    assert_eq!(results[0]["common"], 302);
    assert_eq!(results[0]["w0"], 24 + 60);
    assert_eq!(results[0]["x1"], 150);
    assert_eq!(results[0]["newline"], 1);
    assert!(results.iter().all(|r| *r == results[0]));

    let runner = runner(root.path(), 100);
    let mut job = Job::new(Configuration::new(), "plain", TokenizerMapper, IntSumReducer);
    job.set_num_reduce_tasks(3);
    job.add_input_path("/in");
    job.set_output_path("/plain");
    assert!(!job.has_combiner());
    job.wait_for_completion(&runner).unwrap();
    assert_eq!(read_counts(&runner, "/plain"), results[0]);
}

#[test]
fn empty_input_succeeds() {
    let root = tempfile::tempdir().unwrap();
    write_file(root.path(), "/in/empty.txt", "");
    write_file(root.path(), "/in/blank.txt", " \n\t\n");
    let runner = runner(root.path(), 1024);
    let configurator = JobConfigurator::new(NamingStrategy::SubstringMatchOnly, Configuration::new());

    assert!(configurator.run(&params(&["/in", "/out"]), &runner));
    assert!(read_counts(&runner, "/out").is_empty());
    assert!(root.path().join("out/_SUCCESS").exists());
}

#[test]
fn rerun_is_deterministic() {
    let root = tempfile::tempdir().unwrap();
    write_file(root.path(), "/in/data.txt", &"alpha beta gamma beta\n".repeat(50));
    let runner = runner(root.path(), 64);
    let configurator = JobConfigurator::new(NamingStrategy::PathWithDataSize, Configuration::new());

    configurator.submit(&params(&["/in", "/first"]), &runner).unwrap();
    configurator.submit(&params(&["/in", "/second"]), &runner).unwrap();
    for part in 0..4 {
        let name = format!("part-r-0000{}", part);
        assert_eq!(
            fs::read(root.path().join("first").join(&name)).unwrap(),
            fs::read(root.path().join("second").join(&name)).unwrap()
        );
    }
}

#[test]
fn failures_give_exit_code_one() {
    let root = tempfile::tempdir().unwrap();
    write_file(root.path(), "/in/data.txt", "a b c\n");
    write_file(root.path(), "/taken/keep", "");
    let runner = runner(root.path(), 1024);
    let configurator = JobConfigurator::new(NamingStrategy::PathWithDataSize, Configuration::new());

    assert!(!configurator.run(&params(&["/in", "/taken"]), &runner));
    assert!(!configurator.run(&params(&["/missing", "/out1"]), &runner));
    assert!(!configurator.run(&params(&["/in", "/out2", "fast"]), &runner));
    assert!(!configurator.run(&params(&["/in", "/out3", "0.5", "0"]), &runner));
    assert!(configurator.run(&params(&["/in", "/out4", "0.5", "2"]), &runner));

    assert_eq!(exit_code(true), 0);
    assert_eq!(exit_code(false), 1);
}

#[test]
fn experiment_campaign() {
    let root = tempfile::tempdir().unwrap();
    write_file(root.path(), "/data/input_wordcount_1KB/part", &"map reduce map\n".repeat(40));
    let configurator = JobConfigurator::new(NamingStrategy::PathWithDataSize, Configuration::new());
    let traces = root.path().join("traces");

    let experiment = Experiment::new(
        vec![DfsPath::new("/data/input_wordcount_1KB")],
        vec!["0.05".to_string(), "1.00".to_string()],
        vec![2],
        2,
        DfsPath::new("/results"),
        configurator,
        RuntimeConfig {
            map_slots: 2,
            reduce_slots: 2,
            split_size: 128,
            dfs_root: root.path().to_path_buf(),
            working_dir: None,
        },
        Some(traces.clone()),
    );
    let results: Vec<RunResult> = experiment.run().unwrap();
    assert_eq!(results.len(), 4);
    assert!(results.iter().all(|r| r.report.is_some()));
    assert!(root
        .path()
        .join("results/output_wordcount_1KB_s100_reducers2_run2/_SUCCESS")
        .exists());
    assert!(traces.join("output_wordcount_1KB_s005_reducers2_run1.json").exists());
    assert_eq!(fs::read_dir(&traces).unwrap().count(), 4);

    let summary = summarize(&results);
    assert_eq!(summary.len(), 2);
    assert!(summary.iter().all(|row| row.runs == 2 && row.failed == 0));
    assert_eq!(summary[0].slowstart, "0.05");
    assert!(summary.iter().all(|row| row.mean_total > 0.));
    assert!(summary
        .iter()
        .all(|row| row.mean_min_reduce_elapsed <= row.mean_max_reduce_elapsed && row.straggler_delay >= 0.));
}

#[test]
fn campaign_with_fixed_job_name() {
    let root = tempfile::tempdir().unwrap();
    write_file(root.path(), "/data/input_wordcount_1KB/part", &"map reduce map\n".repeat(10));
    let configuration = [(JOB_NAME.to_string(), "X".to_string())].into_iter().collect::<Configuration>();
    let configurator = JobConfigurator::new(NamingStrategy::PathWithDataSize, configuration);
    let traces = root.path().join("traces");

    let results = Experiment::new(
        vec![DfsPath::new("/data/input_wordcount_1KB")],
        vec!["0.05".to_string(), "1.00".to_string()],
        vec![2],
        1,
        DfsPath::new("/results"),
        configurator,
        RuntimeConfig {
            map_slots: 1,
            reduce_slots: 1,
            split_size: 64,
            dfs_root: root.path().to_path_buf(),
            working_dir: None,
        },
        Some(traces.clone()),
    )
    .run()
    .unwrap();
    assert!(results.iter().all(|r| r.job_name == "X" && r.report.is_some()));

    for run in ["output_wordcount_1KB_s005_reducers2_run1", "output_wordcount_1KB_s100_reducers2_run1"] {
        let trace = Trace::load(&traces.join(format!("{}.json", run))).unwrap();
        assert_eq!(trace.job_name, "X");
    }
}
