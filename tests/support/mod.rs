//! Test support utilities for envsecrets integration tests.
//!
//! Provides reusable test environment setup and helper commands.

#![allow(dead_code)]

pub mod assertions;
pub mod commands;
pub mod fixtures;
pub mod skip;

#[allow(unused_imports)]
pub use assertions::*;
#[allow(unused_imports)]
pub use fixtures::*;

use tempfile::TempDir;

/// Test environment with an isolated working directory.
///
/// No process-global state is mutated: child processes get `.current_dir()`
/// and an explicit environment so tests can run in parallel.
pub struct Test {
    /// Temporary directory the CLI runs in
    pub dir: TempDir,
}

impl Test {
    /// Create a new empty test environment.
    pub fn new() -> Self {
        let dir = TempDir::new().expect("failed to create temp dir");
        Self { dir }
    }

    /// Create a test environment with `.envsecrets.toml` written.
    pub fn with_config(contents: &str) -> Self {
        let t = Self::new();
        std::fs::write(t.dir.path().join(".envsecrets.toml"), contents)
            .expect("failed to write config");
        t
    }
}
