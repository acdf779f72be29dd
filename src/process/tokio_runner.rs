use super::{ProcessRunner, ProgressUpdate, ToolInvocation, ToolOutput};
use async_trait::async_trait;
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::io::AsyncReadExt;
use tokio::process::Command;
use tokio::sync::mpsc;
use tracing::{debug, error, info};

/// Bytes of stderr kept for error reports
const STDERR_TAIL_BYTES: usize = 8 * 1024;

/// Runs tools with `tokio::process`, streaming their output for progress
#[derive(Debug, Clone)]
pub struct TokioProcessRunner {
    progress_tx: Option<mpsc::UnboundedSender<ProgressUpdate>>,
    log_interval: Duration,
}

impl TokioProcessRunner {
    pub fn new() -> Self {
        Self {
            progress_tx: None,
            log_interval: Duration::from_secs(5),
        }
    }

    /// Forward every decoded progress value to `tx`
    pub fn with_progress_channel(mut self, tx: mpsc::UnboundedSender<ProgressUpdate>) -> Self {
        self.progress_tx = Some(tx);
        self
    }

    pub fn with_log_interval(mut self, interval: Duration) -> Self {
        self.log_interval = interval;
        self
    }
}

impl Default for TokioProcessRunner {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProcessRunner for TokioProcessRunner {
    async fn invoke(&self, invocation: ToolInvocation) -> std::io::Result<ToolOutput> {
        let start_time = Instant::now();
        debug!("Spawning: {}", invocation.command_line());

        let mut child = Command::new(&invocation.program)
            .args(&invocation.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                error!("❌ Failed to spawn {}: {}", invocation.program, e);
                e
            })?;

        let mut stdout = child
            .stdout
            .take()
            .ok_or_else(|| std::io::Error::other("stdout was not captured"))?;
        let mut stderr = child
            .stderr
            .take()
            .ok_or_else(|| std::io::Error::other("stderr was not captured"))?;

        let mut stdout_buf = [0u8; 4096];
        let mut stderr_buf = [0u8; 4096];
        let mut stdout_open = true;
        let mut stderr_open = true;
        let mut captured_stdout: Vec<u8> = Vec::new();
        let mut stderr_tail: Vec<u8> = Vec::new();
        let mut last_log = Instant::now();

        while stdout_open || stderr_open {
            let (stdout_chunk, stderr_chunk) = tokio::select! {
                read = stdout.read(&mut stdout_buf), if stdout_open => {
                    let n = read?;
                    if n == 0 {
                        stdout_open = false;
                        continue;
                    }
                    if invocation.capture_stdout {
                        captured_stdout.extend_from_slice(&stdout_buf[..n]);
                    }
                    (String::from_utf8_lossy(&stdout_buf[..n]).into_owned(), String::new())
                }
                read = stderr.read(&mut stderr_buf), if stderr_open => {
                    let n = read?;
                    if n == 0 {
                        stderr_open = false;
                        continue;
                    }
                    stderr_tail.extend_from_slice(&stderr_buf[..n]);
                    if stderr_tail.len() > STDERR_TAIL_BYTES {
                        let excess = stderr_tail.len() - STDERR_TAIL_BYTES;
                        stderr_tail.drain(..excess);
                    }
                    (String::new(), String::from_utf8_lossy(&stderr_buf[..n]).into_owned())
                }
            };

            let Some(spec) = invocation.progress else {
                continue;
            };
            let Some(value) = (spec.decode)(&stdout_chunk, &stderr_chunk) else {
                continue;
            };

            let update = ProgressUpdate {
                tool: invocation.program.clone(),
                value,
                ratio: spec.ratio(value),
                display: (spec.format)(value, spec.end),
            };
            if last_log.elapsed() >= self.log_interval {
                info!("⏳ {}: {} ({:.1}%)", update.tool, update.display, update.ratio * 100.0);
                last_log = Instant::now();
            }
            if let Some(tx) = &self.progress_tx {
                // receiver may have gone away; progress is advisory
                let _ = tx.send(update);
            }
        }

        let status = child.wait().await?;
        debug!(
            "{} finished with {:?} in {:.1}s",
            invocation.program,
            status.code(),
            start_time.elapsed().as_secs_f64()
        );

        Ok(ToolOutput {
            stdout: String::from_utf8_lossy(&captured_stdout).into_owned(),
            stderr: String::from_utf8_lossy(&stderr_tail).into_owned(),
            exit_code: status.code(),
        })
    }
}
