//! Stream-copy cutting: segment extraction and duration trimming.

use std::path::{Path, PathBuf};
use tracing::{info, warn};

use reelcut_models::Selection;

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};

/// File name for the part cut from selection `index`.
pub fn part_file_name(index: usize) -> String {
    format!("part_{:03}.mp4", index)
}

/// File name for the concatenated clip trimmed to `duration_secs`.
pub fn trimmed_file_name(duration_secs: u32) -> String {
    format!("trimmed_{}s.mp4", duration_secs)
}

/// Extract a segment from a video file without re-encoding.
pub async fn extract_segment(
    runner: &FfmpegRunner,
    input: &Path,
    output: &Path,
    selection: &Selection,
) -> MediaResult<()> {
    info!(
        "Extracting segment: {} -> {} (start: {:.2}s, duration: {:.2}s)",
        input.display(),
        output.display(),
        selection.start_secs(),
        selection.duration_secs()
    );

    let cmd = FfmpegCommand::new(input, output)
        .seek(selection.start_secs())
        .duration(selection.duration_secs())
        .codec_copy() // Fast copy without re-encoding
        .output_args(["-avoid_negative_ts", "make_zero"]);

    runner.run(&cmd).await?;
    Ok(())
}

/// Cut every selection into its own part file under `work_dir`.
///
/// Parts come back in selection order. A selection that fails to extract
/// is skipped and logged; the returned list may therefore be shorter than
/// `selections`, or empty.
pub async fn extract_segments(
    runner: &FfmpegRunner,
    source: &Path,
    selections: &[Selection],
    work_dir: &Path,
) -> MediaResult<Vec<PathBuf>> {
    if !source.exists() {
        return Err(MediaError::FileNotFound(source.to_path_buf()));
    }

    let mut parts = Vec::with_capacity(selections.len());
    for (index, selection) in selections.iter().enumerate() {
        let output = work_dir.join(part_file_name(index));
        match extract_segment(runner, source, &output, selection).await {
            Ok(()) => parts.push(output),
            Err(e) if e.is_tool_failure() => {
                warn!(
                    "Skipping selection {} ({}ms-{}ms): {}",
                    index, selection.start_ms, selection.end_ms, e
                );
            }
            Err(e) => return Err(e),
        }
    }

    info!(
        "Extracted {}/{} segments into {}",
        parts.len(),
        selections.len(),
        work_dir.display()
    );
    Ok(parts)
}

/// Trim `input` to its first `duration_secs` seconds without re-encoding.
///
/// A clip shorter than the target is copied whole.
pub async fn trim_to_duration(
    runner: &FfmpegRunner,
    input: &Path,
    work_dir: &Path,
    duration_secs: u32,
) -> MediaResult<PathBuf> {
    let output = work_dir.join(trimmed_file_name(duration_secs));
    info!("Trimming {} to {}s", input.display(), duration_secs);

    let cmd = FfmpegCommand::new(input, &output)
        .output_duration(f64::from(duration_secs))
        .codec_copy();

    runner.run(&cmd).await?;
    Ok(output)
}
