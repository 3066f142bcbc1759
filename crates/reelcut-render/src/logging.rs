//! Structured job logging utilities.

use std::fmt;
use tracing::{error, info, warn, Span};

use reelcut_models::{JobId, VideoId};

/// Lifecycle phases of a rendition job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobPhase {
    Created,
    Extracting,
    Concatenating,
    Rendering,
    Done,
    Failed,
}

impl JobPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobPhase::Created => "created",
            JobPhase::Extracting => "extracting",
            JobPhase::Concatenating => "concatenating",
            JobPhase::Rendering => "rendering",
            JobPhase::Done => "done",
            JobPhase::Failed => "failed",
        }
    }
}

impl fmt::Display for JobPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Job logger for structured logging with consistent formatting.
///
/// Every event carries the job id, the source video and the current phase,
/// so one job's stages can be followed across interleaved logs.
#[derive(Debug, Clone)]
pub struct JobLogger {
    job_id: String,
    video_id: String,
    phase: JobPhase,
}

impl JobLogger {
    pub fn new(job_id: &JobId, video_id: &VideoId) -> Self {
        Self {
            job_id: job_id.to_string(),
            video_id: video_id.to_string(),
            phase: JobPhase::Created,
        }
    }

    /// Move to `phase` and log the transition.
    pub fn enter(&mut self, phase: JobPhase) {
        self.phase = phase;
        info!(
            job_id = %self.job_id,
            video_id = %self.video_id,
            phase = %self.phase,
            "Job phase: {}", phase
        );
    }

    pub fn log_start(&self, message: &str) {
        info!(
            job_id = %self.job_id,
            video_id = %self.video_id,
            phase = %self.phase,
            "Job started: {}", message
        );
    }

    pub fn log_progress(&self, message: &str) {
        info!(
            job_id = %self.job_id,
            video_id = %self.video_id,
            phase = %self.phase,
            "Job progress: {}", message
        );
    }

    /// A recoverable failure: something was skipped, the job goes on.
    pub fn log_skip(&self, message: &str) {
        warn!(
            job_id = %self.job_id,
            video_id = %self.video_id,
            phase = %self.phase,
            "Job skipped: {}", message
        );
    }

    /// A fatal failure; also moves the job to [`JobPhase::Failed`].
    pub fn log_failure(&mut self, message: &str) {
        self.phase = JobPhase::Failed;
        error!(
            job_id = %self.job_id,
            video_id = %self.video_id,
            phase = %self.phase,
            "Job failed: {}", message
        );
    }

    pub fn log_completion(&mut self, message: &str) {
        self.phase = JobPhase::Done;
        info!(
            job_id = %self.job_id,
            video_id = %self.video_id,
            phase = %self.phase,
            "Job completed: {}", message
        );
    }

    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    pub fn phase(&self) -> JobPhase {
        self.phase
    }

    /// Create a tracing span for this job.
    pub fn create_span(&self) -> Span {
        tracing::info_span!(
            "rendition_job",
            job_id = %self.job_id,
            video_id = %self.video_id
        )
    }
}
