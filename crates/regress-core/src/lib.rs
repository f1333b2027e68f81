//! Regression-test runner for an external citation formatter.
//!
//! Fixtures (`*.in.json`) are formatted once per applicable style and the
//! JSON result is compared field by field with the recorded expected output.

pub mod catalog;
pub mod diff;
pub mod domain;
pub mod evaluator;
pub mod fixture;
pub mod formatter;
pub mod report;
pub mod runner;
