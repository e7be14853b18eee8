// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! CLI command modules.

pub mod list;
pub mod run;
pub mod show;
pub mod validate;

use std::path::Path;

use clonebench_core::{BenchmarkSuite, HarnessResult, SuiteLoader};
use thiserror::Error;

/// Errors raised by the CLI itself rather than the harness.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("No benchmark matches filter '{filter}'")]
    NoMatchingBenchmarks { filter: String },
}

/// Identifier of the built-in suite in reports.
pub const BUILTIN_SUITE: &str = "builtin";

/// Load the suite at `path`, or the built-in suite when no path is given.
///
/// Returns the suite id used in reports along with the suite.
pub fn load_suite(path: Option<&Path>) -> HarnessResult<(String, BenchmarkSuite)> {
    match path {
        Some(path) => {
            let suite = SuiteLoader::load_file(path)?;
            Ok((suite_id(path), suite))
        }
        None => Ok((BUILTIN_SUITE.to_string(), BenchmarkSuite::builtin()?)),
    }
}

fn suite_id(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| BUILTIN_SUITE.to_string())
}
