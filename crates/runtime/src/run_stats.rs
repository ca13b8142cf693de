//! Counters and timings of a completed job.

use std::{
    collections::BTreeMap,
    sync::atomic::{AtomicU64, Ordering},
};

use serde::{Deserialize, Serialize};

use crate::{
    task::TaskKind,
    trace::{Trace, TraceEvent},
};

/// Live counters shared by all tasks of a running job.
#[derive(Debug, Default)]
pub struct Counters {
    pub map_input_records: AtomicU64,
    pub map_output_records: AtomicU64,
    pub combine_input_records: AtomicU64,
    pub combine_output_records: AtomicU64,
    pub reduce_input_groups: AtomicU64,
    pub reduce_input_records: AtomicU64,
    pub reduce_output_records: AtomicU64,
}

impl Counters {
    pub fn add(counter: &AtomicU64, value: u64) {
        counter.fetch_add(value, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> JobCounters {
        let get = |counter: &AtomicU64| counter.load(Ordering::Relaxed);
        JobCounters {
            map_input_records: get(&self.map_input_records),
            map_output_records: get(&self.map_output_records),
            combine_input_records: get(&self.combine_input_records),
            combine_output_records: get(&self.combine_output_records),
            reduce_input_groups: get(&self.reduce_input_groups),
            reduce_input_records: get(&self.reduce_input_records),
            reduce_output_records: get(&self.reduce_output_records),
        }
    }
}

/// Final values of job counters.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobCounters {
    pub map_input_records: u64,
    pub map_output_records: u64,
    pub combine_input_records: u64,
    pub combine_output_records: u64,
    pub reduce_input_groups: u64,
    pub reduce_input_records: u64,
    pub reduce_output_records: u64,
}

/// Ratio of the slowest to the fastest reduce task run time, zero when the fastest took no time.
pub fn straggler_ratio(min_elapsed: f64, max_elapsed: f64) -> f64 {
    if min_elapsed > 0.0 {
        max_elapsed / min_elapsed
    } else {
        0.0
    }
}

/// Phase timings of a job in seconds since submission.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct JobTimeline {
    /// When the last map task completed.
    pub map_completion: f64,
    /// When the first reduce task started.
    pub first_reduce_start: f64,
    /// When the last reduce task completed.
    pub reduce_completion: f64,
    /// When the job finished, including the output commit.
    pub total: f64,
    /// Shortest run time of a single reduce task.
    #[serde(default)]
    pub min_reduce_elapsed: f64,
    #[serde(default)]
    pub avg_reduce_elapsed: f64,
    /// Run time of the slowest reduce task.
    #[serde(default)]
    pub max_reduce_elapsed: f64,
}

impl JobTimeline {
    pub fn from_trace(trace: &Trace, total: f64) -> Self {
        let mut timeline = JobTimeline {
            first_reduce_start: f64::MAX,
            total,
            ..Default::default()
        };
        let mut reduce_starts = BTreeMap::new();
        let mut reduce_elapsed = Vec::new();
        for event in trace.events.iter() {
            match event {
                TraceEvent::TaskCompleted {
                    time,
                    kind: TaskKind::Map,
                    ..
                } => timeline.map_completion = timeline.map_completion.max(*time),
                TraceEvent::TaskStarted {
                    time,
                    kind: TaskKind::Reduce,
                    task_id,
                } => {
                    timeline.first_reduce_start = timeline.first_reduce_start.min(*time);
                    reduce_starts.insert(*task_id, *time);
                }
                TraceEvent::TaskCompleted {
                    time,
                    kind: TaskKind::Reduce,
                    task_id,
                } => {
                    timeline.reduce_completion = timeline.reduce_completion.max(*time);
                    if let Some(start) = reduce_starts.get(task_id) {
                        reduce_elapsed.push(time - start);
                    }
                }
                _ => {}
            }
        }
        if timeline.first_reduce_start == f64::MAX {
            timeline.first_reduce_start = 0.0;
        }
        if !reduce_elapsed.is_empty() {
            timeline.min_reduce_elapsed = reduce_elapsed.iter().copied().fold(f64::MAX, f64::min);
            timeline.max_reduce_elapsed = reduce_elapsed.iter().copied().fold(0.0, f64::max);
            timeline.avg_reduce_elapsed = reduce_elapsed.iter().sum::<f64>() / reduce_elapsed.len() as f64;
        }
        timeline
    }

    /// How long reduce tasks ran alongside map tasks.
    pub fn overlap(&self) -> f64 {
        (self.map_completion - self.first_reduce_start).max(0.0)
    }

    /// How many times the slowest reduce task ran longer than the fastest one.
    pub fn straggler_ratio(&self) -> f64 {
        straggler_ratio(self.min_reduce_elapsed, self.max_reduce_elapsed)
    }

    /// How much longer the slowest reduce task ran than an average one.
    pub fn straggler_delay(&self) -> f64 {
        self.max_reduce_elapsed - self.avg_reduce_elapsed
    }
}

/// Summary of a successful job.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct JobReport {
    pub job_name: String,
    pub input_paths: Vec<String>,
    pub output_path: String,
    pub map_tasks: usize,
    pub reduce_tasks: usize,
    pub reduce_slowstart: f64,
    /// Number of completed map tasks after which reduce tasks were started.
    pub reduce_start_threshold: usize,
    pub counters: JobCounters,
    pub timeline: JobTimeline,
    #[serde(skip)]
    pub trace: Trace,
}
