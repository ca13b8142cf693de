//! Local map-reduce runtime: jobs, map and reduce tasks, shuffle and traces.

pub mod configuration;
pub mod error;
pub mod job;
pub mod parser;
pub mod run_stats;
pub mod runner;
pub mod shuffle;
pub mod system;
pub mod task;
pub mod trace;
