//! Moving map output to reduce tasks: partitioning, fetching, merging and grouping.

use std::{
    collections::{hash_map::DefaultHasher, VecDeque},
    hash::{Hash, Hasher},
    iter::Peekable,
    sync::{
        atomic::{AtomicU64, Ordering},
        Condvar, Mutex, MutexGuard, PoisonError,
    },
};

use itertools::Itertools;

use crate::{error::JobError, task::Reducer};

/// Sorted output of one map task for one reduce partition.
pub type Run<V> = Vec<(Vec<u8>, V)>;

/// Reduce partition of a key. Deterministic for the same key and number of partitions.
pub fn partition(key: &[u8], partitions: usize) -> usize {
    let mut hasher = DefaultHasher::new();
    key.hash(&mut hasher);
    (hasher.finish() % partitions as u64) as usize
}

/// Result of [ShuffleTracker::fetch].
pub enum Fetch<V> {
    /// Output of a completed map task.
    Output { map_task: usize, run: Run<V> },
    /// All map tasks completed and all their output for the partition was fetched.
    Done,
    /// The job failed.
    Aborted,
}

struct ShuffleState<V> {
    pending: Vec<VecDeque<(usize, Run<V>)>>,
    completed_maps: usize,
    failure: Option<JobError>,
}

/// Keeps output of completed map tasks until reduce tasks fetch it.
pub struct ShuffleTracker<V> {
    map_tasks: usize,
    state: Mutex<ShuffleState<V>>,
    changed: Condvar,
}

impl<V> ShuffleTracker<V> {
    pub fn new(map_tasks: usize, reduce_tasks: usize) -> Self {
        ShuffleTracker {
            map_tasks,
            state: Mutex::new(ShuffleState {
                pending: (0..reduce_tasks).map(|_| VecDeque::new()).collect(),
                completed_maps: 0,
                failure: None,
            }),
            changed: Condvar::new(),
        }
    }

    pub fn map_tasks(&self) -> usize {
        self.map_tasks
    }

    fn lock(&self) -> MutexGuard<'_, ShuffleState<V>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn wait<'a>(&self, guard: MutexGuard<'a, ShuffleState<V>>) -> MutexGuard<'a, ShuffleState<V>> {
        self.changed.wait(guard).unwrap_or_else(PoisonError::into_inner)
    }

    /// Registers output of a completed map task, one run per reduce partition.
    /// Returns the number of completed map tasks.
    pub fn publish(&self, map_task: usize, runs: Vec<Run<V>>) -> usize {
        let mut state = self.lock();
        for (queue, run) in state.pending.iter_mut().zip(runs) {
            queue.push_back((map_task, run));
        }
        state.completed_maps += 1;
        let completed = state.completed_maps;
        drop(state);
        self.changed.notify_all();
        completed
    }

    /// Marks the job as failed. Only the first failure is kept.
    pub fn fail(&self, error: JobError) {
        let mut state = self.lock();
        if state.failure.is_none() {
            state.failure = Some(error);
        }
        drop(state);
        self.changed.notify_all();
    }

    pub fn is_failed(&self) -> bool {
        self.lock().failure.is_some()
    }

    /// Takes the error which failed the job.
    pub fn take_failure(&self) -> Option<JobError> {
        self.lock().failure.take()
    }

    /// Blocks until at least `threshold` map tasks completed. Returns `false` if the job failed first.
    pub fn wait_completed(&self, threshold: usize) -> bool {
        let mut state = self.lock();
        loop {
            if state.failure.is_some() {
                return false;
            }
            if state.completed_maps >= threshold {
                return true;
            }
            state = self.wait(state);
        }
    }

    /// Blocks until there is unfetched map output for `partition` or nothing more will come.
    pub fn fetch(&self, partition: usize) -> Fetch<V> {
        let mut state = self.lock();
        loop {
            if state.failure.is_some() {
                return Fetch::Aborted;
            }
            if let Some((map_task, run)) = state.pending[partition].pop_front() {
                return Fetch::Output { map_task, run };
            }
            if state.completed_maps == self.map_tasks {
                return Fetch::Done;
            }
            state = self.wait(state);
        }
    }
}

/// Merges sorted runs into one stream sorted by key.
pub fn merge_runs<V>(runs: Vec<Run<V>>) -> impl Iterator<Item = (Vec<u8>, V)> {
    runs.into_iter().map(|run| run.into_iter()).kmerge_by(|a, b| a.0 < b.0)
}

/// Applies a reducer to each group of equal keys of a sorted stream.
///
/// Values of a group are streamed to the reducer without being collected.
/// `groups` and `values` count the groups and the values passed through.
pub struct Grouped<'a, I: Iterator, R> {
    records: Peekable<I>,
    reducer: &'a R,
    groups: &'a AtomicU64,
    values: &'a AtomicU64,
}

pub fn grouped<'a, K, I, R>(records: I, reducer: &'a R, groups: &'a AtomicU64, values: &'a AtomicU64) -> Grouped<'a, I::IntoIter, R>
where
    K: AsRef<[u8]>,
    I: IntoIterator<Item = (K, R::Value)>,
    R: Reducer,
{
    Grouped {
        records: records.into_iter().peekable(),
        reducer,
        groups,
        values,
    }
}

impl<'a, K, I, R> Iterator for Grouped<'a, I, R>
where
    K: AsRef<[u8]>,
    I: Iterator<Item = (K, R::Value)>,
    R: Reducer,
{
    type Item = (K, R::Value);

    fn next(&mut self) -> Option<Self::Item> {
        let (key, first) = self.records.next()?;
        let mut first = Some(first);
        let mut count = 0u64;

        let records = &mut self.records;
        let values = std::iter::from_fn(|| {
            let value = first
                .take()
                .or_else(|| records.next_if(|(k, _)| k.as_ref() == key.as_ref()).map(|(_, v)| v));
            if value.is_some() {
                count += 1;
            }
            value
        });
        let value = self.reducer.reduce(key.as_ref(), values);

        // The reducer may stop early, the rest of the group still belongs to this key.
        while self.records.next_if(|(k, _)| k.as_ref() == key.as_ref()).is_some() {
            count += 1;
        }

        self.groups.fetch_add(1, Ordering::Relaxed);
        self.values.fetch_add(count, Ordering::Relaxed);
        Some((key, value))
    }
}
