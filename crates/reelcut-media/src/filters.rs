//! FFmpeg video filter definitions.

use std::path::Path;

/// Downscale into a `width`x`height` box preserving aspect ratio, then pad
/// to the exact size with the picture centered.
///
/// The scale box is clamped to the input size so small sources are never
/// upscaled.
pub fn letterbox_filter(width: u32, height: u32) -> String {
    format!(
        "scale='min({w},iw)':'min({h},ih)':force_original_aspect_ratio=decrease:force_divisible_by=2,\
         pad={w}:{h}:(ow-iw)/2:(oh-ih)/2",
        w = width,
        h = height
    )
}

/// Append a subtitle burn-in stage to an existing filter chain.
pub fn with_subtitles(chain: &str, subtitle_path: &Path) -> String {
    format!(
        "{},subtitles=filename='{}':charenc=UTF-8",
        chain,
        escape_filter_path(subtitle_path)
    )
}

/// Escape a path for use as a filter option value.
pub fn escape_filter_path(path: &Path) -> String {
    let normalized = path.to_string_lossy().replace('\\', "/");
    let mut escaped = String::with_capacity(normalized.len() + 12);
    for ch in normalized.chars() {
        match ch {
            ':' => escaped.push_str("\\:"),
            '\'' => escaped.push_str("\\'"),
            ',' => escaped.push_str("\\,"),
            ';' => escaped.push_str("\\;"),
            '[' => escaped.push_str("\\["),
            ']' => escaped.push_str("\\]"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_letterbox_portrait() {
        assert_eq!(
            letterbox_filter(1080, 1920),
            "scale='min(1080,iw)':'min(1920,ih)':force_original_aspect_ratio=decrease:force_divisible_by=2,\
             pad=1080:1920:(ow-iw)/2:(oh-ih)/2"
        );
    }

    #[test]
    fn test_subtitles_appended_last() {
        let chain = with_subtitles(&letterbox_filter(1080, 1080), Path::new("/data/jobs/j1/captions.srt"));
        assert!(chain.starts_with("scale="));
        assert!(chain.ends_with(",subtitles=filename='/data/jobs/j1/captions.srt':charenc=UTF-8"));
    }

    #[test]
    fn test_escape_filter_path() {
        assert_eq!(
            escape_filter_path(Path::new("C:\\clips\\it's,[a];b.srt")),
            "C\\:/clips/it\\'s\\,\\[a\\]\\;b.srt"
        );
    }
}
