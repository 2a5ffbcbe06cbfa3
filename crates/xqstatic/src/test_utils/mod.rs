//! Test helpers shared by unit tests, integration tests and benchmarks.
//!
//! Compiled for `cfg(test)` and under the `test-support` feature.

pub mod fixture;
pub mod fixture_query;
