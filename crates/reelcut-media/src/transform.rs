//! Scale-and-letterbox rendering, with optional burned captions.

use std::path::{Path, PathBuf};
use tracing::info;

use reelcut_models::{AspectRatio, EncodingConfig};

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::MediaResult;
use crate::filters::{letterbox_filter, with_subtitles};

/// Output file name for one rendition, e.g. `15s_1080x1920.mp4`.
pub fn rendition_file_name(duration_secs: u32, aspect: AspectRatio) -> String {
    let (w, h) = aspect.dimensions();
    format!("{}s_{}x{}.mp4", duration_secs, w, h)
}

/// One rendition to produce from a trimmed clip.
#[derive(Debug, Clone)]
pub struct VariantSpec<'a> {
    pub duration_secs: u32,
    pub aspect: AspectRatio,
    /// Subtitle file to burn in, if any
    pub subtitles: Option<&'a Path>,
}

/// Build the output arguments for a rendition.
pub fn build_variant_command(
    input: &Path,
    output: &Path,
    variant: &VariantSpec<'_>,
    encoding: &EncodingConfig,
) -> FfmpegCommand {
    let (w, h) = variant.aspect.dimensions();
    let mut filter = letterbox_filter(w, h);
    if let Some(srt) = variant.subtitles {
        filter = with_subtitles(&filter, srt);
    }

    FfmpegCommand::new(input, output)
        .video_filter(filter)
        .output_args(encoding.to_ffmpeg_args())
        .output_args(["-movflags", "+faststart"])
}

/// Scale and pad `input` to the variant's frame size under `out_dir`.
pub async fn render_variant(
    runner: &FfmpegRunner,
    input: &Path,
    out_dir: &Path,
    variant: &VariantSpec<'_>,
    encoding: &EncodingConfig,
) -> MediaResult<PathBuf> {
    let output = out_dir.join(rendition_file_name(variant.duration_secs, variant.aspect));
    info!(
        "Rendering {} at {} (captions: {})",
        output.display(),
        variant.aspect,
        variant.subtitles.is_some()
    );

    let cmd = build_variant_command(input, &output, variant, encoding);
    runner.run(&cmd).await?;
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::RecordingExecutor;
    use std::sync::Arc;

    #[test]
    fn test_file_names() {
        assert_eq!(rendition_file_name(15, AspectRatio::Portrait), "15s_1080x1920.mp4");
        assert_eq!(rendition_file_name(30, AspectRatio::Square), "30s_1080x1080.mp4");
        assert_eq!(rendition_file_name(60, AspectRatio::Landscape), "60s_1920x1080.mp4");
    }

    #[test]
    fn test_audio_passthrough() {
        let variant = VariantSpec {
            duration_secs: 15,
            aspect: AspectRatio::Landscape,
            subtitles: None,
        };
        let args = build_variant_command(
            Path::new("trimmed_15s.mp4"),
            Path::new("15s_1920x1080.mp4"),
            &variant,
            &EncodingConfig::default(),
        )
        .build_args();

        let pos = args.iter().position(|a| a == "-c:a").unwrap();
        assert_eq!(args[pos + 1], "copy");
        let vf = &args[args.iter().position(|a| a == "-vf").unwrap() + 1];
        assert!(vf.contains("pad=1920:1080"));
        assert!(!vf.contains("subtitles"));
    }

    #[tokio::test]
    async fn test_render_with_captions() {
        let dir = tempfile::tempdir().unwrap();
        let executor = Arc::new(RecordingExecutor::new());
        let runner = FfmpegRunner::with_executor(executor.clone());
        let srt = dir.path().join("captions.srt");
        let variant = VariantSpec {
            duration_secs: 15,
            aspect: AspectRatio::Portrait,
            subtitles: Some(&srt),
        };

        let out = render_variant(
            &runner,
            &dir.path().join("trimmed_15s.mp4"),
            dir.path(),
            &variant,
            &EncodingConfig::default(),
        )
        .await
        .unwrap();

        assert_eq!(out, dir.path().join("15s_1080x1920.mp4"));
        let call = &executor.calls()[0];
        let vf = call.arg_after("-vf").unwrap();
        assert!(vf.starts_with("scale='min(1080,iw)':'min(1920,ih)'"));
        assert!(vf.contains(",subtitles=filename='"));
        assert_eq!(call.arg_after("-c:v"), Some("libx264"));
    }
}
