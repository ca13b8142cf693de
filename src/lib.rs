//! Word count job for slow-start benchmarking.
//!
//! [TokenizerMapper](tokenizer::TokenizerMapper) splits lines into words, [IntSumReducer](int_sum::IntSumReducer)
//! sums their counts both as the combiner and as the reducer, and [JobConfigurator](configurator::JobConfigurator)
//! names the run after its input path and submits it to the local runner.

pub mod configurator;
pub mod experiment;
pub mod int_sum;
pub mod job_params;
pub mod naming_strategy;
pub mod tokenizer;
