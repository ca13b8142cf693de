//! Local stand-in for a distributed file system: input splits, line records and committed job outputs.

pub mod dfs;
pub mod path;
pub mod split;
