//! git::runner
//!
//! Execution of external commands.
//!
//! # Design
//!
//! Commands are always an argument vector. Nothing is ever concatenated
//! into a shell line and re-split, so no call site needs to quote. The
//! only place quoting happens is [`render_command`], which produces the
//! human-readable line used in logs and error messages.
//!
//! The [`CommandRunner`] trait is the seam between the engine and the
//! operating system. [`ProcessRunner`] is the real implementation;
//! [`MockRunner`](super::mock::MockRunner) replays scripted results.

use std::path::PathBuf;
use std::process::{Command, Stdio};

use thiserror::Error;

/// Errors from running an external command.
#[derive(Debug, Error)]
pub enum CommandError {
    /// The command ran and exited unsuccessfully.
    #[error("`{command}` failed with {}: {}", exit_label(.exit_code), .output.trim())]
    Failed {
        /// Rendered command line
        command: String,
        /// Exit code, or `None` if killed by a signal
        exit_code: Option<i32>,
        /// Captured stdout followed by stderr
        output: String,
    },

    /// The command could not be started.
    #[error("failed to run `{command}`: {source}")]
    Spawn {
        /// Rendered command line
        command: String,
        /// Underlying I/O error
        source: std::io::Error,
    },
}

impl CommandError {
    /// Exit code of a command that ran, if it exited normally.
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            CommandError::Failed { exit_code, .. } => *exit_code,
            CommandError::Spawn { .. } => None,
        }
    }

    /// Captured combined output (empty if the command never ran).
    pub fn output(&self) -> &str {
        match self {
            CommandError::Failed { output, .. } => output,
            CommandError::Spawn { .. } => "",
        }
    }
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {}", code),
        None => "no exit code".to_string(),
    }
}

/// Options for one command invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunOptions {
    /// Directory to run in; `None` inherits the caller's
    pub working_dir: Option<PathBuf>,
    /// Identity to run as
    pub run_as: Option<String>,
}

impl RunOptions {
    /// Options running in `dir`.
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            working_dir: Some(dir.into()),
            run_as: None,
        }
    }

    /// Set the identity to run as.
    pub fn as_user(mut self, user: Option<String>) -> Self {
        self.run_as = user;
        self
    }
}

/// Output captured from a successful command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    /// Output with only stdout populated.
    pub fn from_stdout(stdout: impl Into<String>) -> Self {
        Self {
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    /// Stdout followed by stderr.
    pub fn combined(&self) -> String {
        combine(&self.stdout, &self.stderr)
    }
}

fn combine(stdout: &str, stderr: &str) -> String {
    match (stdout.is_empty(), stderr.is_empty()) {
        (_, true) => stdout.to_string(),
        (true, false) => stderr.to_string(),
        (false, false) => format!("{}\n{}", stdout.trim_end(), stderr),
    }
}

/// Runs external commands.
///
/// Implementations must fail with [`CommandError::Failed`] on a nonzero
/// exit, carrying the combined output.
pub trait CommandRunner {
    /// Run `argv` (program first) and wait for it to finish.
    fn run(&self, argv: &[String], options: &RunOptions) -> Result<CommandOutput, CommandError>;
}

/// Runs commands as child processes.
#[derive(Debug, Clone, Default)]
pub struct ProcessRunner {
    current_user: Option<String>,
}

impl ProcessRunner {
    /// A runner for a process owned by `current_user`.
    ///
    /// Commands asked to run as `current_user` run directly; any other
    /// identity goes through `sudo`.
    pub fn new(current_user: Option<String>) -> Self {
        Self { current_user }
    }

    /// The argument vector actually executed, after identity switching.
    pub fn effective_argv(&self, argv: &[String], options: &RunOptions) -> Vec<String> {
        match &options.run_as {
            Some(user) if self.current_user.as_ref() != Some(user) => {
                let mut wrapped = vec![
                    "sudo".to_string(),
                    "-u".to_string(),
                    user.clone(),
                    "-H".to_string(),
                    "--".to_string(),
                ];
                wrapped.extend(argv.iter().cloned());
                wrapped
            }
            _ => argv.to_vec(),
        }
    }
}

impl CommandRunner for ProcessRunner {
    fn run(&self, argv: &[String], options: &RunOptions) -> Result<CommandOutput, CommandError> {
        let argv = self.effective_argv(argv, options);
        let rendered = render_command(&argv);

        let (program, args) = argv.split_first().ok_or_else(|| CommandError::Spawn {
            command: rendered.clone(),
            source: std::io::Error::new(std::io::ErrorKind::InvalidInput, "empty command"),
        })?;

        let mut cmd = Command::new(program);
        cmd.args(args)
            .env("GIT_TERMINAL_PROMPT", "0")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(dir) = &options.working_dir {
            cmd.current_dir(dir);
        }

        tracing::debug!(command = %rendered, cwd = ?options.working_dir, "running command");

        let output = cmd.output().map_err(|source| CommandError::Spawn {
            command: rendered.clone(),
            source,
        })?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

        if !output.status.success() {
            tracing::debug!(
                command = %rendered,
                exit_code = ?output.status.code(),
                "command failed"
            );
            return Err(CommandError::Failed {
                command: rendered,
                exit_code: output.status.code(),
                output: combine(&stdout, &stderr),
            });
        }

        Ok(CommandOutput { stdout, stderr })
    }
}

/// Quote one token for a POSIX shell.
///
/// Tokens made only of safe characters are returned unchanged.
pub fn shell_quote(token: &str) -> String {
    let safe = !token.is_empty()
        && token
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "_@%+=:,./-".contains(c));
    if safe {
        token.to_string()
    } else {
        format!("'{}'", token.replace('\'', r"'\''"))
    }
}

/// Render an argument vector as a copy-pasteable shell line.
pub fn render_command(argv: &[String]) -> String {
    argv.iter()
        .map(|token| shell_quote(token))
        .collect::<Vec<_>>()
        .join(" ")
}
