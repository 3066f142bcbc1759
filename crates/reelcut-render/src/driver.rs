//! Rendition Matrix Driver.
//!
//! Runs one edit job end to end inside its own working directory:
//! extract parts, concatenate them once, then per duration trim once and
//! render every aspect ratio from that trimmed clip. Only three things fail
//! a job: nothing extracted, concatenation failing, or zero variants
//! produced. Everything else is skipped and logged.

use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::Instrument;

use reelcut_media::clip::part_file_name;
use reelcut_media::subtitles::{retime_for_selections, write_srt};
use reelcut_media::{
    concat_segments, extract_segments, render_variant, trim_to_duration, FfmpegRunner,
    VariantSpec,
};
use reelcut_models::{
    CaptionMode, EditRequest, JobId, RenditionJobResponse, Selection, TranscriptEntry,
};

use crate::config::RenderConfig;
use crate::error::{RenderError, RenderResult};
use crate::logging::{JobLogger, JobPhase};
use crate::matrix::{RenditionMatrix, VariantPlan, VariantStrategy};

/// Subtitle file written once per captioned job.
pub const CAPTIONS_FILE: &str = "captions.srt";

/// Result of a job that produced at least one rendition.
#[derive(Debug, Clone)]
pub struct RenditionOutcome {
    pub job_id: JobId,
    pub output_dir: PathBuf,
    /// Produced files, in matrix order
    pub files: Vec<PathBuf>,
    /// Variants attempted
    pub attempted: usize,
}

impl RenditionOutcome {
    pub fn message(&self) -> String {
        format!(
            "Created {} of {} video variant(s)",
            self.files.len(),
            self.attempted
        )
    }

    pub fn into_response(self) -> RenditionJobResponse {
        let message = self.message();
        RenditionJobResponse {
            job_id: self.job_id,
            files: self
                .files
                .iter()
                .map(|p| p.to_string_lossy().to_string())
                .collect(),
            output_dir: self.output_dir.to_string_lossy().to_string(),
            message,
        }
    }
}

/// Orchestrates the rendition pipeline.
#[derive(Clone)]
pub struct RenditionDriver {
    runner: FfmpegRunner,
    config: RenderConfig,
    strategy: VariantStrategy,
}

impl RenditionDriver {
    pub fn new(runner: FfmpegRunner, config: RenderConfig) -> Self {
        let runner = runner.with_timeout(config.ffmpeg_timeout_secs);
        let strategy = config.strategy();
        Self {
            runner,
            config,
            strategy,
        }
    }

    /// Override the variant scheduling strategy.
    pub fn with_strategy(mut self, strategy: VariantStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// Render every variant of `request` from `source`.
    ///
    /// `transcript` is only used when the request asks for burned captions;
    /// an empty transcript renders uncaptioned output.
    pub async fn run(
        &self,
        request: &EditRequest,
        source: &Path,
        transcript: &[TranscriptEntry],
    ) -> RenderResult<RenditionOutcome> {
        request.validate()?;

        let job_id = JobId::new();
        let logger = JobLogger::new(&job_id, &request.video_id);
        let span = logger.create_span();
        let started = Instant::now();

        let result = self
            .run_job(job_id, logger, request, source, transcript)
            .instrument(span)
            .await;

        let outcome = if result.is_ok() { "success" } else { "failed" };
        metrics::counter!("reelcut_render_jobs_total", "outcome" => outcome).increment(1);
        metrics::histogram!("reelcut_render_job_duration_seconds")
            .record(started.elapsed().as_secs_f64());
        result
    }

    async fn run_job(
        &self,
        job_id: JobId,
        mut logger: JobLogger,
        request: &EditRequest,
        source: &Path,
        transcript: &[TranscriptEntry],
    ) -> RenderResult<RenditionOutcome> {
        let matrix = RenditionMatrix::from_request(request);
        logger.log_start(&format!(
            "{} selection(s), {} duration(s) x {} aspect ratio(s), captions {}, template {}",
            request.selections.len(),
            matrix.durations().len(),
            matrix.aspects().len(),
            request.caption_mode()?,
            request.template_id.as_deref().unwrap_or("none"),
        ));
        for label in matrix.skipped_labels() {
            logger.log_skip(&format!("unknown aspect ratio {}", label));
        }
        if matrix.is_empty() {
            logger.log_failure("no supported aspect ratios requested");
            return Err(RenderError::NoRenditionsProduced { attempted: 0 });
        }

        let work_dir = self.config.job_dir(job_id.as_str());
        tokio::fs::create_dir_all(&work_dir).await?;

        logger.enter(JobPhase::Extracting);
        let parts =
            extract_segments(&self.runner, source, &request.selections, &work_dir).await?;
        if parts.is_empty() {
            logger.log_failure("no segments extracted");
            return Err(RenderError::NoSegmentsExtracted);
        }
        logger.log_progress(&format!(
            "extracted {}/{} segment(s)",
            parts.len(),
            request.selections.len()
        ));

        logger.enter(JobPhase::Concatenating);
        let concatenated = match concat_segments(&self.runner, &parts, &work_dir).await {
            Ok(path) => path,
            Err(e) => {
                logger.log_failure(&format!("concatenation failed: {}", e));
                return Err(RenderError::ConcatenationFailed(e.to_string()));
            }
        };

        // Selections that made it into the concatenated clip, in order
        let kept: Vec<Selection> = request
            .selections
            .iter()
            .enumerate()
            .filter(|(index, _)| parts.contains(&work_dir.join(part_file_name(*index))))
            .map(|(_, selection)| *selection)
            .collect();
        let subtitles = self
            .prepare_captions(&logger, request.caption_mode()?, transcript, &kept, &work_dir)
            .await;

        logger.enter(JobPhase::Rendering);
        let mut files = Vec::new();
        for &duration in matrix.durations() {
            let trimmed =
                match trim_to_duration(&self.runner, &concatenated, &work_dir, duration).await {
                    Ok(path) => path,
                    Err(e) => {
                        logger.log_skip(&format!("duration {}s: {}", duration, e));
                        record_variants(matrix.aspects().len(), "failed");
                        continue;
                    }
                };

            let results = self
                .strategy
                .run(matrix.variants_for(duration), |plan| {
                    self.render_one(&trimmed, &work_dir, plan, subtitles.as_deref())
                })
                .await;

            for (plan, result) in matrix.variants_for(duration).into_iter().zip(results) {
                match result {
                    Ok(path) => {
                        record_variants(1, "success");
                        files.push(path);
                    }
                    Err(e) => {
                        record_variants(1, "failed");
                        logger.log_skip(&format!(
                            "variant {}s {}: {}",
                            plan.duration_secs, plan.aspect, e
                        ));
                    }
                }
            }
        }

        if files.is_empty() {
            logger.log_failure("every variant failed");
            return Err(RenderError::NoRenditionsProduced {
                attempted: matrix.len(),
            });
        }

        let outcome = RenditionOutcome {
            job_id,
            output_dir: work_dir,
            files,
            attempted: matrix.len(),
        };
        logger.log_completion(&outcome.message());
        Ok(outcome)
    }

    async fn render_one(
        &self,
        trimmed: &Path,
        work_dir: &Path,
        plan: VariantPlan,
        subtitles: Option<&Path>,
    ) -> RenderResult<PathBuf> {
        let spec = VariantSpec {
            duration_secs: plan.duration_secs,
            aspect: plan.aspect,
            subtitles,
        };
        Ok(render_variant(&self.runner, trimmed, work_dir, &spec, &self.config.encoding).await?)
    }

    /// Write the job's subtitle file if captions were asked for and there is
    /// something to show. Cues are retimed onto the concatenated clip built
    /// from `selections`. Any failure here means uncaptioned output.
    async fn prepare_captions(
        &self,
        logger: &JobLogger,
        mode: CaptionMode,
        transcript: &[TranscriptEntry],
        selections: &[Selection],
        work_dir: &Path,
    ) -> Option<PathBuf> {
        if mode != CaptionMode::Burned {
            return None;
        }
        let cues = retime_for_selections(transcript, selections);
        if cues.is_empty() {
            logger.log_progress("captions requested but no transcript falls inside the selections");
            return None;
        }

        let path = work_dir.join(CAPTIONS_FILE);
        match write_srt(&cues, &path).await {
            Ok(()) => Some(path),
            Err(e) => {
                logger.log_skip(&format!("could not write subtitles: {}", e));
                None
            }
        }
    }
}

fn record_variants(count: usize, outcome: &'static str) {
    metrics::counter!("reelcut_renditions_total", "outcome" => outcome).increment(count as u64);
}
