//! In-process executor for exercising pipelines without ffmpeg.

use async_trait::async_trait;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::command::{CommandExecutor, ProcessOutcome};
use crate::error::MediaResult;

/// One recorded invocation.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub program: String,
    pub args: Vec<String>,
    pub timeout: Duration,
}

impl RecordedCall {
    /// The output path, which is always the last argument.
    pub fn output(&self) -> &str {
        self.args.last().map(String::as_str).unwrap_or_default()
    }

    /// File name component of the output path.
    pub fn output_file_name(&self) -> &str {
        Path::new(self.output())
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
    }

    /// Value following `flag`, if present.
    pub fn arg_after(&self, flag: &str) -> Option<&str> {
        self.args
            .iter()
            .position(|a| a == flag)
            .and_then(|i| self.args.get(i + 1))
            .map(String::as_str)
    }
}

type Predicate = Arc<dyn Fn(&RecordedCall) -> Option<ProcessOutcome> + Send + Sync>;

/// Records every call and, unless a rule says otherwise, succeeds by
/// writing a small placeholder file at the output path.
#[derive(Clone, Default)]
pub struct RecordingExecutor {
    calls: Arc<Mutex<Vec<RecordedCall>>>,
    rules: Arc<Mutex<Vec<Predicate>>>,
}

impl RecordingExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail any call whose output file name contains `needle`.
    pub fn fail_when_output_contains(self, needle: impl Into<String>) -> Self {
        let needle = needle.into();
        self.with_rule(move |call| {
            call.output_file_name().contains(&needle).then(|| ProcessOutcome::NonZeroExit {
                code: Some(1),
                stderr: format!("simulated failure for {}", call.output()),
            })
        })
    }

    /// Time out any call whose output file name contains `needle`.
    pub fn time_out_when_output_contains(self, needle: impl Into<String>) -> Self {
        let needle = needle.into();
        self.with_rule(move |call| {
            call.output_file_name()
                .contains(&needle)
                .then(|| ProcessOutcome::TimedOut {
                    secs: call.timeout.as_secs(),
                })
        })
    }

    /// Add an arbitrary rule; the first rule returning `Some` wins.
    pub fn with_rule<F>(self, rule: F) -> Self
    where
        F: Fn(&RecordedCall) -> Option<ProcessOutcome> + Send + Sync + 'static,
    {
        if let Ok(mut rules) = self.rules.lock() {
            rules.push(Arc::new(rule));
        }
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    /// Output paths of recorded calls whose file name contains `needle`.
    pub fn outputs_containing(&self, needle: &str) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|c| c.output_file_name().contains(needle))
            .map(|c| c.output().to_string())
            .collect()
    }
}

#[async_trait]
impl CommandExecutor for RecordingExecutor {
    async fn execute(
        &self,
        program: &str,
        args: &[String],
        timeout: Duration,
    ) -> MediaResult<ProcessOutcome> {
        let call = RecordedCall {
            program: program.to_string(),
            args: args.to_vec(),
            timeout,
        };
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call.clone());
        }

        let verdict = self
            .rules
            .lock()
            .ok()
            .and_then(|rules| rules.iter().find_map(|rule| rule(&call)));
        if let Some(outcome) = verdict {
            return Ok(outcome);
        }

        let output = Path::new(call.output());
        if let Some(parent) = output.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(output, b"fake media").await?;
        Ok(ProcessOutcome::Success)
    }
}
