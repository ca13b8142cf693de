//! Local job runner: executes map and reduce tasks on thread pools.

use std::{
    any::Any,
    fmt::Display,
    panic::{catch_unwind, AssertUnwindSafe},
    path::PathBuf,
    sync::{Arc, Mutex, PoisonError},
    time::Instant,
};

use log::{debug, error, info, warn};
use threadpool::ThreadPool;
use wcbench_dfs::{dfs::DfsError, dfs::LocalDfs, path::DfsPath, split::InputSplit};

use crate::{
    error::JobError,
    job::Job,
    run_stats::{Counters, JobReport, JobTimeline},
    shuffle::{grouped, merge_runs, partition, Fetch, Run, ShuffleTracker},
    system::RuntimeConfig,
    task::{Mapper, Reducer, TaskKind},
    trace::{Trace, TraceEvent},
};

/// Number of completed map tasks after which reduce tasks are started.
pub fn reduce_start_threshold(slowstart: f64, map_tasks: usize) -> usize {
    ((slowstart * map_tasks as f64).ceil() as usize).min(map_tasks)
}

fn panic_message(panic: Box<dyn Any + Send>) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "task panicked".to_string()
    }
}

/// Runs jobs against a [LocalDfs] on this machine.
pub struct LocalJobRunner {
    config: RuntimeConfig,
    dfs: LocalDfs,
    trace_path: Option<PathBuf>,
}

impl LocalJobRunner {
    pub fn new(config: RuntimeConfig) -> Self {
        let mut dfs = LocalDfs::new(config.dfs_root.clone());
        if let Some(dir) = config.working_dir.clone().or_else(|| std::env::current_dir().ok()) {
            dfs = dfs.with_working_dir(dir);
        }
        LocalJobRunner {
            config,
            dfs,
            trace_path: None,
        }
    }

    /// Saves the trace of every job to `path` as JSON.
    pub fn with_trace(mut self, path: impl Into<PathBuf>) -> Self {
        self.trace_path = Some(path.into());
        self
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    pub fn dfs(&self) -> &LocalDfs {
        &self.dfs
    }

    /// Runs a job to completion.
    ///
    /// The output directory must not exist. It gets one `part-r-NNNNN` file per reduce task and a
    /// success marker once all of them are written.
    pub fn run<M, R>(&self, job: Job<M, R>) -> Result<JobReport, JobError>
    where
        M: Mapper,
        R: Reducer<Value = M::Value>,
        M::Value: Display,
    {
        let start = Instant::now();
        let slowstart = job.reduce_slowstart()?;
        let reduce_tasks = job.num_reduce_tasks()?;
        let job = job.into_parts();
        if job.input_paths.is_empty() {
            return Err(JobError::NoInputPaths);
        }
        let output = job.output_path.ok_or(JobError::MissingOutputPath)?;
        if self.dfs.exists(&output) {
            return Err(DfsError::AlreadyExists(output).into());
        }

        let splits = self.dfs.splits(&job.input_paths, self.config.split_size)?;
        self.dfs.create_output_dir(&output)?;
        let map_tasks = splits.len();
        let threshold = reduce_start_threshold(slowstart, map_tasks);
        info!(
            "Running job {}: {} map tasks, {} reduce tasks, reduces start after {} completed maps (slowstart {})",
            job.name, map_tasks, reduce_tasks, threshold, slowstart
        );

        let context = Arc::new(TaskContext {
            dfs: self.dfs.clone(),
            mapper: job.mapper,
            reducer: job.reducer,
            combiner: job.combiner,
            output: output.clone(),
            reduce_tasks,
            tracker: ShuffleTracker::new(map_tasks, reduce_tasks),
            counters: Counters::default(),
            trace: Mutex::new(Trace::new(
                job.name.clone(),
                map_tasks,
                reduce_tasks,
                self.config.map_slots,
                self.config.reduce_slots,
            )),
            start,
        });

        let map_pool = ThreadPool::with_name("map".to_string(), self.config.map_slots.max(1));
        for split in splits {
            let context = context.clone();
            map_pool.execute(move || context.run_map_task(split));
        }

        let reduce_pool = ThreadPool::with_name("reduce".to_string(), self.config.reduce_slots.max(1));
        if context.tracker.wait_completed(threshold) {
            debug!("{} map tasks completed, starting reduce tasks", threshold);
            for partition in 0..reduce_tasks {
                let context = context.clone();
                reduce_pool.execute(move || context.run_reduce_task(partition));
            }
        }
        map_pool.join();
        reduce_pool.join();

        let trace = std::mem::take(&mut *context.trace.lock().unwrap_or_else(PoisonError::into_inner));
        if let Some(error) = context.tracker.take_failure() {
            error!("Job {} failed: {}", job.name, error);
            if let Some(path) = &self.trace_path {
                if let Err(e) = trace.save(path) {
                    warn!("{}", e);
                }
            }
            return Err(error);
        }

        self.dfs.mark_success(&output)?;
        let total = start.elapsed().as_secs_f64();
        if let Some(path) = &self.trace_path {
            trace.save(path)?;
        }

        let counters = context.counters.snapshot();
        let timeline = JobTimeline::from_trace(&trace, total);
        info!("Job {} completed successfully in {:.3}s", job.name, total);
        info!(
            "Counters: map input records={}, map output records={}, combine input records={}, combine output records={}, \
             reduce input groups={}, reduce input records={}, reduce output records={}",
            counters.map_input_records,
            counters.map_output_records,
            counters.combine_input_records,
            counters.combine_output_records,
            counters.reduce_input_groups,
            counters.reduce_input_records,
            counters.reduce_output_records
        );

        Ok(JobReport {
            job_name: job.name,
            input_paths: job.input_paths.iter().map(|p| p.to_string()).collect(),
            output_path: output.to_string(),
            map_tasks,
            reduce_tasks,
            reduce_slowstart: slowstart,
            reduce_start_threshold: threshold,
            counters,
            timeline,
            trace,
        })
    }
}

/// Everything tasks of one job share.
struct TaskContext<M: Mapper, R> {
    dfs: LocalDfs,
    mapper: M,
    reducer: R,
    combiner: Option<R>,
    output: DfsPath,
    reduce_tasks: usize,
    tracker: ShuffleTracker<M::Value>,
    counters: Counters,
    trace: Mutex<Trace>,
    start: Instant,
}

impl<M, R> TaskContext<M, R>
where
    M: Mapper,
    R: Reducer<Value = M::Value>,
    M::Value: Display,
{
    fn log(&self, event: impl FnOnce(f64) -> TraceEvent) {
        let mut trace = self.trace.lock().unwrap_or_else(PoisonError::into_inner);
        let event = event(self.start.elapsed().as_secs_f64());
        debug!("{:?}", event);
        trace.log(event);
    }

    fn run_map_task(&self, split: InputSplit) {
        let task_id = split.id;
        if self.tracker.is_failed() {
            debug!("skipping map task {} of a failed job", task_id);
            return;
        }
        self.log(|time| TraceEvent::TaskStarted {
            time,
            kind: TaskKind::Map,
            task_id,
        });
        let result = catch_unwind(AssertUnwindSafe(|| self.map(&split))).unwrap_or_else(|panic| {
            Err(JobError::TaskFailed {
                kind: TaskKind::Map,
                task_id,
                message: panic_message(panic),
            })
        });
        match result {
            Ok(runs) => {
                self.log(|time| TraceEvent::TaskCompleted {
                    time,
                    kind: TaskKind::Map,
                    task_id,
                });
                let completed = self.tracker.publish(task_id, runs);
                if completed == self.tracker.map_tasks() {
                    info!("All {} map tasks completed", completed);
                }
            }
            Err(e) => {
                error!("map task {} failed: {}", task_id, e);
                self.tracker.fail(e);
            }
        }
    }

    /// Maps all records of a split into sorted and optionally combined runs, one per reduce partition.
    fn map(&self, split: &InputSplit) -> Result<Vec<Run<M::Value>>, JobError> {
        let records = self.dfs.read_records(split)?;
        let mut partitions = (0..self.reduce_tasks).map(|_| Vec::new()).collect::<Vec<_>>();
        let mut emitted = 0;
        for record in records.records() {
            for (key, value) in self.mapper.map(record) {
                partitions[partition(key, self.reduce_tasks)].push((key, value));
                emitted += 1;
            }
        }
        Counters::add(&self.counters.map_input_records, records.len() as u64);
        Counters::add(&self.counters.map_output_records, emitted);

        let runs = partitions
            .into_iter()
            .map(|mut pairs| {
                pairs.sort_by(|a, b| a.0.cmp(b.0));
                match &self.combiner {
                    Some(combiner) => grouped(
                        pairs,
                        combiner,
                        &self.counters.combine_output_records,
                        &self.counters.combine_input_records,
                    )
                    .map(|(key, value)| (key.to_vec(), value))
                    .collect(),
                    None => pairs.into_iter().map(|(key, value)| (key.to_vec(), value)).collect(),
                }
            })
            .collect();
        Ok(runs)
    }

    fn run_reduce_task(&self, partition: usize) {
        self.log(|time| TraceEvent::TaskStarted {
            time,
            kind: TaskKind::Reduce,
            task_id: partition,
        });
        let result = catch_unwind(AssertUnwindSafe(|| self.reduce(partition))).unwrap_or_else(|panic| {
            Err(JobError::TaskFailed {
                kind: TaskKind::Reduce,
                task_id: partition,
                message: panic_message(panic),
            })
        });
        match result {
            Ok(written) => {
                Counters::add(&self.counters.reduce_output_records, written);
                self.log(|time| TraceEvent::TaskCompleted {
                    time,
                    kind: TaskKind::Reduce,
                    task_id: partition,
                });
            }
            Err(e @ JobError::Aborted(_)) => debug!("{}", e),
            Err(e) => {
                error!("reduce task {} failed: {}", partition, e);
                self.tracker.fail(e);
            }
        }
    }

    /// Fetches output of every map task for `partition`, merges it and writes reduced groups.
    fn reduce(&self, partition: usize) -> Result<u64, JobError> {
        let mut runs = Vec::new();
        loop {
            match self.tracker.fetch(partition) {
                Fetch::Output { map_task, run } => {
                    self.log(|time| TraceEvent::MapOutputFetched {
                        time,
                        reduce_task: partition,
                        map_task,
                        records: run.len(),
                    });
                    runs.push(run);
                }
                Fetch::Done => break,
                Fetch::Aborted => return Err(JobError::Aborted(partition)),
            }
        }
        let output = grouped(
            merge_runs(runs),
            &self.reducer,
            &self.counters.reduce_input_groups,
            &self.counters.reduce_input_records,
        );
        Ok(self.dfs.write_part(&self.output, partition, output)?)
    }
}
