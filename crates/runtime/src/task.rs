//! Map and reduce roles of a job.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Map role: turns one input record into key/value pairs.
pub trait Mapper: Send + Sync + 'static {
    /// Type of emitted values.
    type Value: Send + 'static;

    /// Emits pairs for one record, lazily and in order. Keys may borrow from the record.
    fn map<'a>(&'a self, record: &'a [u8]) -> impl Iterator<Item = (&'a [u8], Self::Value)> + 'a;
}

/// Reduce role: folds all values of one key into a single value.
///
/// Also used as a combiner, in which case it sees only the values produced by one map task.
pub trait Reducer: Send + Sync + 'static {
    /// Type of consumed and produced values.
    type Value: Send + 'static;

    /// Reduces a non-empty stream of values of `key`. The order of values is unspecified.
    fn reduce<I>(&self, key: &[u8], values: I) -> Self::Value
    where
        I: Iterator<Item = Self::Value>;
}

/// Kind of a task.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskKind {
    Map,
    Reduce,
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskKind::Map => f.write_str("map"),
            TaskKind::Reduce => f.write_str("reduce"),
        }
    }
}
