//! External tool execution
//!
//! The pipeline only talks to `ProcessRunner`. `TokioProcessRunner` spawns
//! real processes; tests substitute a scripted runner.

pub mod progress;
pub mod tokio_runner;

pub use progress::{decode_ffmpeg_progress, format_time, format_time_progress};
pub use tokio_runner::TokioProcessRunner;

use async_trait::async_trait;
use std::fmt;

/// Extracts a progress value from the latest stdout/stderr chunks
pub type DecodeProgress = fn(&str, &str) -> Option<i64>;

/// Renders `(current, total)` for display
pub type FormatProgress = fn(i64, i64) -> String;

/// How to turn a tool's output stream into a progress ratio
#[derive(Clone, Copy)]
pub struct ProgressSpec {
    pub start: i64,
    pub end: i64,
    pub decode: DecodeProgress,
    pub format: FormatProgress,
}

impl ProgressSpec {
    /// Fraction of `start..end` reached by `value`, clamped to `0.0..=1.0`
    pub fn ratio(&self, value: i64) -> f64 {
        let span = self.end - self.start;
        if span <= 0 {
            return 1.0;
        }
        ((value - self.start) as f64 / span as f64).clamp(0.0, 1.0)
    }
}

impl fmt::Debug for ProgressSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProgressSpec")
            .field("start", &self.start)
            .field("end", &self.end)
            .finish()
    }
}

/// One progress observation surfaced while a tool runs
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressUpdate {
    pub tool: String,
    pub value: i64,
    pub ratio: f64,
    pub display: String,
}

/// A request to run one external program
#[derive(Debug, Clone)]
pub struct ToolInvocation {
    pub program: String,
    pub args: Vec<String>,
    pub capture_stdout: bool,
    pub progress: Option<ProgressSpec>,
}

impl ToolInvocation {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            capture_stdout: true,
            progress: None,
        }
    }

    /// Drain stdout without keeping it, for tools whose output is a file
    pub fn discard_stdout(mut self) -> Self {
        self.capture_stdout = false;
        self
    }

    pub fn with_progress(mut self, progress: ProgressSpec) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn command_line(&self) -> String {
        let mut parts = vec![self.program.clone()];
        parts.extend(self.args.iter().cloned());
        parts.join(" ")
    }
}

/// The single completion event of a tool invocation
#[derive(Debug, Clone, Default)]
pub struct ToolOutput {
    pub stdout: String,
    pub stderr: String,
    /// Exit code; `None` when the process was killed by a signal
    pub exit_code: Option<i32>,
}

impl ToolOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    pub fn status_description(&self) -> String {
        match self.exit_code {
            Some(code) => format!("exit code {code}"),
            None => "termination by signal".to_string(),
        }
    }
}

/// Runs one external tool to completion.
///
/// Returns `Err` only when the process could not be started or read;
/// a non-zero exit is reported through `ToolOutput::exit_code`.
#[async_trait]
pub trait ProcessRunner: Send + Sync {
    async fn invoke(&self, invocation: ToolInvocation) -> std::io::Result<ToolOutput>;
}
