//! git::mock
//!
//! Scripted command runner for deterministic testing.
//!
//! # Design
//!
//! `MockRunner` records every invocation and answers from a queue of
//! scripted results, in order. When the queue is empty every command
//! succeeds with empty output.
//!
//! # Example
//!
//! ```
//! use reposync::git::mock::MockRunner;
//! use reposync::git::{CommandRunner, RunOptions};
//!
//! let runner = MockRunner::new();
//! runner.push_ok("https://github.com/a/b\n");
//! runner.push_failure(1, "");
//!
//! let argv = vec!["git".to_string(), "config".to_string()];
//! let out = runner.run(&argv, &RunOptions::default()).unwrap();
//! assert_eq!(out.stdout.trim(), "https://github.com/a/b");
//! assert!(runner.run(&argv, &RunOptions::default()).is_err());
//! assert_eq!(runner.calls().len(), 2);
//! ```

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use super::runner::{render_command, CommandError, CommandOutput, CommandRunner, RunOptions};

/// One recorded invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockCall {
    pub argv: Vec<String>,
    pub options: RunOptions,
}

impl MockCall {
    /// The git subcommand and its arguments (everything after the program).
    pub fn args(&self) -> &[String] {
        self.argv.get(1..).unwrap_or(&[])
    }
}

#[derive(Debug)]
enum Scripted {
    Ok(String),
    Fail { exit_code: i32, output: String },
}

/// Mock runner for testing.
///
/// Thread-safe via internal `Arc<Mutex<...>>` wrapping.
#[derive(Debug, Clone, Default)]
pub struct MockRunner {
    inner: Arc<Mutex<MockRunnerInner>>,
}

#[derive(Debug, Default)]
struct MockRunnerInner {
    script: VecDeque<Scripted>,
    calls: Vec<MockCall>,
}

impl MockRunner {
    /// Create a runner with an empty script.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful result with the given stdout.
    pub fn push_ok(&self, stdout: impl Into<String>) {
        self.lock().script.push_back(Scripted::Ok(stdout.into()));
    }

    /// Queue a failing result.
    pub fn push_failure(&self, exit_code: i32, output: impl Into<String>) {
        self.lock().script.push_back(Scripted::Fail {
            exit_code,
            output: output.into(),
        });
    }

    /// All invocations so far, in order.
    pub fn calls(&self) -> Vec<MockCall> {
        self.lock().calls.clone()
    }

    /// The git subcommand name of each invocation, in order.
    pub fn subcommands(&self) -> Vec<String> {
        self.lock()
            .calls
            .iter()
            .filter_map(|call| call.args().first().cloned())
            .collect()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MockRunnerInner> {
        // A panicking test thread must not hide the recorded calls.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl CommandRunner for MockRunner {
    fn run(&self, argv: &[String], options: &RunOptions) -> Result<CommandOutput, CommandError> {
        let mut inner = self.lock();
        inner.calls.push(MockCall {
            argv: argv.to_vec(),
            options: options.clone(),
        });

        match inner.script.pop_front() {
            None => Ok(CommandOutput::default()),
            Some(Scripted::Ok(stdout)) => Ok(CommandOutput::from_stdout(stdout)),
            Some(Scripted::Fail { exit_code, output }) => Err(CommandError::Failed {
                command: render_command(argv),
                exit_code: Some(exit_code),
                output,
            }),
        }
    }
}
