//! SRT subtitle generation from transcript entries.

use std::fmt::Write as _;
use std::path::Path;
use tracing::debug;

use reelcut_models::{Selection, TranscriptEntry};

use crate::error::MediaResult;

/// Format milliseconds as an SRT timestamp, `HH:MM:SS,mmm`.
pub fn ms_to_subtitle_timestamp(ms: u64) -> String {
    let total_seconds = ms / 1000;
    let millis = ms % 1000;
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;
    format!("{:02}:{:02}:{:02},{:03}", hours, minutes, seconds, millis)
}

/// Whether `entry` would render as a visible cue.
fn is_displayable(entry: &TranscriptEntry) -> bool {
    !entry.text.trim().is_empty() && entry.effective_end_ms() > entry.start_ms
}

/// Render transcript entries as an SRT document, cues numbered from 1.
///
/// Blank cues and cues that end before they start are dropped; numbering
/// stays consecutive over the cues that remain.
pub fn transcript_to_srt(entries: &[TranscriptEntry]) -> String {
    let mut srt = String::new();
    for (i, entry) in entries.iter().filter(|e| is_displayable(e)).enumerate() {
        // Writing to a String cannot fail
        let _ = write!(
            srt,
            "{}\n{} --> {}\n{}\n\n",
            i + 1,
            ms_to_subtitle_timestamp(entry.start_ms),
            ms_to_subtitle_timestamp(entry.effective_end_ms()),
            entry.text.trim()
        );
    }
    srt
}

/// Move source-timed entries onto the timeline of the concatenated clip.
///
/// Selections are laid end to end in order. Each entry is clipped to every
/// selection it overlaps and shifted by that selection's output offset;
/// entries outside all selections are dropped.
pub fn retime_for_selections(
    entries: &[TranscriptEntry],
    selections: &[Selection],
) -> Vec<TranscriptEntry> {
    let mut retimed = Vec::new();
    let mut offset = 0u64;
    for selection in selections {
        let mut cues: Vec<TranscriptEntry> = entries
            .iter()
            .filter_map(|entry| {
                let start = entry.start_ms.max(selection.start_ms);
                let end = entry.effective_end_ms().min(selection.end_ms);
                (start < end).then(|| {
                    TranscriptEntry::new(
                        start - selection.start_ms + offset,
                        Some(end - selection.start_ms + offset),
                        entry.text.clone(),
                    )
                })
            })
            .collect();
        cues.sort_by_key(|cue| cue.start_ms);
        retimed.extend(cues);
        offset += selection.duration_ms();
    }
    retimed
}

/// Write an SRT file for `entries` at `path`.
pub async fn write_srt(entries: &[TranscriptEntry], path: &Path) -> MediaResult<()> {
    tokio::fs::write(path, transcript_to_srt(entries)).await?;
    debug!("Wrote {} subtitle cues to {}", entries.len(), path.display());
    Ok(())
}
