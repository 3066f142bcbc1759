//! FFmpeg command builder and runner.
//!
//! Commands are always built as argument vectors and handed to a
//! [`CommandExecutor`]; nothing is ever passed through a shell.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::io::AsyncReadExt;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::error::{MediaError, MediaResult};

/// Default hard timeout for a single FFmpeg invocation.
pub const DEFAULT_FFMPEG_TIMEOUT_SECS: u64 = 300;

/// Maximum stderr bytes kept from a failed run.
const STDERR_TAIL_BYTES: usize = 4096;

/// Builder for FFmpeg commands.
#[derive(Debug, Clone)]
pub struct FfmpegCommand {
    /// Input file path
    input: PathBuf,
    /// Output file path
    output: PathBuf,
    /// Input arguments (before -i)
    input_args: Vec<String>,
    /// Output arguments (after -i)
    output_args: Vec<String>,
    /// Whether to overwrite output
    overwrite: bool,
    /// Log level
    log_level: String,
}

impl FfmpegCommand {
    /// Create a new FFmpeg command.
    pub fn new(input: impl AsRef<Path>, output: impl AsRef<Path>) -> Self {
        Self {
            input: input.as_ref().to_path_buf(),
            output: output.as_ref().to_path_buf(),
            input_args: Vec::new(),
            output_args: Vec::new(),
            overwrite: true,
            log_level: "error".to_string(),
        }
    }

    /// Add input arguments (before -i).
    pub fn input_arg(mut self, arg: impl Into<String>) -> Self {
        self.input_args.push(arg.into());
        self
    }

    /// Add multiple input arguments.
    pub fn input_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.input_args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Add output arguments (after -i).
    pub fn output_arg(mut self, arg: impl Into<String>) -> Self {
        self.output_args.push(arg.into());
        self
    }

    /// Add multiple output arguments.
    pub fn output_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.output_args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Set seek position (before input).
    pub fn seek(self, seconds: f64) -> Self {
        self.input_arg("-ss").input_arg(format!("{:.3}", seconds))
    }

    /// Limit how much of the input is read (before input).
    pub fn duration(self, seconds: f64) -> Self {
        self.input_arg("-t").input_arg(format!("{:.3}", seconds))
    }

    /// Limit the output length (after input).
    pub fn output_duration(self, seconds: f64) -> Self {
        self.output_arg("-t").output_arg(format!("{:.3}", seconds))
    }

    /// Force the input container format, e.g. `concat`.
    pub fn input_format(self, format: impl Into<String>) -> Self {
        self.input_arg("-f").input_arg(format)
    }

    /// Copy all streams without re-encoding.
    pub fn codec_copy(self) -> Self {
        self.output_arg("-c").output_arg("copy")
    }

    /// Set video filter.
    pub fn video_filter(self, filter: impl Into<String>) -> Self {
        self.output_arg("-vf").output_arg(filter)
    }

    /// Set video codec.
    pub fn video_codec(self, codec: impl Into<String>) -> Self {
        self.output_arg("-c:v").output_arg(codec)
    }

    /// Set audio codec.
    pub fn audio_codec(self, codec: impl Into<String>) -> Self {
        self.output_arg("-c:a").output_arg(codec)
    }

    pub fn output(&self) -> &Path {
        &self.output
    }

    /// Build the command arguments.
    pub fn build_args(&self) -> Vec<String> {
        let mut args = Vec::new();

        // Overwrite flag
        if self.overwrite {
            args.push("-y".to_string());
        }

        // Log level
        args.push("-v".to_string());
        args.push(self.log_level.clone());

        // Input args
        args.extend(self.input_args.clone());

        // Input file
        args.push("-i".to_string());
        args.push(self.input.to_string_lossy().to_string());

        // Output args
        args.extend(self.output_args.clone());

        // Output file
        args.push(self.output.to_string_lossy().to_string());

        args
    }
}

/// How an external process ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessOutcome {
    Success,
    NonZeroExit { code: Option<i32>, stderr: String },
    TimedOut { secs: u64 },
}

impl ProcessOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ProcessOutcome::Success)
    }

    /// Convert to a result, mapping failures to [`MediaError`].
    pub fn into_result(self, program: &str) -> MediaResult<()> {
        match self {
            ProcessOutcome::Success => Ok(()),
            ProcessOutcome::NonZeroExit { code, stderr } => Err(MediaError::ffmpeg_failed(
                format!("{} exited with non-zero status", program),
                (!stderr.is_empty()).then_some(stderr),
                code,
            )),
            ProcessOutcome::TimedOut { secs } => Err(MediaError::Timeout(secs)),
        }
    }
}

/// Runs an external program from an argument vector.
///
/// `Err` is reserved for failing to start the process at all; exit status
/// and timeouts are reported through [`ProcessOutcome`].
#[async_trait]
pub trait CommandExecutor: Send + Sync {
    async fn execute(
        &self,
        program: &str,
        args: &[String],
        timeout: Duration,
    ) -> MediaResult<ProcessOutcome>;
}

/// Executor backed by `tokio::process`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioExecutor;

#[async_trait]
impl CommandExecutor for TokioExecutor {
    async fn execute(
        &self,
        program: &str,
        args: &[String],
        timeout: Duration,
    ) -> MediaResult<ProcessOutcome> {
        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => MediaError::FfmpegNotFound,
                _ => MediaError::Io(e),
            })?;

        let mut stderr = child
            .stderr
            .take()
            .ok_or_else(|| MediaError::internal("stderr not captured"))?;
        let stderr_task = tokio::spawn(async move {
            let mut buf = Vec::new();
            let _ = stderr.read_to_end(&mut buf).await;
            buf
        });

        let status = match tokio::time::timeout(timeout, child.wait()).await {
            Ok(status) => status?,
            Err(_) => {
                // Timeout - kill the process
                warn!(
                    "{} timed out after {} seconds, killing process",
                    program,
                    timeout.as_secs()
                );
                let _ = child.kill().await;
                stderr_task.abort();
                return Ok(ProcessOutcome::TimedOut {
                    secs: timeout.as_secs(),
                });
            }
        };

        let stderr = stderr_task.await.unwrap_or_default();

        if status.success() {
            Ok(ProcessOutcome::Success)
        } else {
            Ok(ProcessOutcome::NonZeroExit {
                code: status.code(),
                stderr: stderr_tail(&stderr),
            })
        }
    }
}

fn stderr_tail(bytes: &[u8]) -> String {
    let start = bytes.len().saturating_sub(STDERR_TAIL_BYTES);
    String::from_utf8_lossy(&bytes[start..]).trim().to_string()
}

/// Runner for FFmpeg commands with a hard timeout.
#[derive(Clone)]
pub struct FfmpegRunner {
    executor: Arc<dyn CommandExecutor>,
    program: String,
    /// Timeout in seconds
    timeout_secs: u64,
}

impl Default for FfmpegRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl FfmpegRunner {
    /// Create a runner that spawns the `ffmpeg` binary.
    pub fn new() -> Self {
        Self::with_executor(Arc::new(TokioExecutor))
    }

    pub fn with_executor(executor: Arc<dyn CommandExecutor>) -> Self {
        Self {
            executor,
            program: "ffmpeg".to_string(),
            timeout_secs: DEFAULT_FFMPEG_TIMEOUT_SECS,
        }
    }

    /// Set timeout.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    pub fn timeout_secs(&self) -> u64 {
        self.timeout_secs
    }

    /// Run an FFmpeg command to completion.
    pub async fn run(&self, cmd: &FfmpegCommand) -> MediaResult<()> {
        let args = cmd.build_args();
        debug!("Running FFmpeg: {} {}", self.program, args.join(" "));

        let started = Instant::now();
        let outcome = self
            .executor
            .execute(
                &self.program,
                &args,
                Duration::from_secs(self.timeout_secs),
            )
            .await?;

        let label = match &outcome {
            ProcessOutcome::Success => "success",
            ProcessOutcome::NonZeroExit { .. } => "failed",
            ProcessOutcome::TimedOut { .. } => "timeout",
        };
        metrics::counter!("reelcut_ffmpeg_runs_total", "outcome" => label).increment(1);
        metrics::histogram!("reelcut_ffmpeg_run_duration_seconds")
            .record(started.elapsed().as_secs_f64());

        outcome.into_result(&self.program)
    }
}

/// Check if FFmpeg is available.
pub fn check_ffmpeg() -> MediaResult<PathBuf> {
    which::which("ffmpeg").map_err(|_| MediaError::FfmpegNotFound)
}
