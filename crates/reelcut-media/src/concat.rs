//! Stream-copy concatenation via the concat demuxer.

use std::path::{Path, PathBuf};
use tracing::info;

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};

pub const CONCAT_LIST_FILE: &str = "concat_list.txt";
pub const CONCATENATED_FILE: &str = "concatenated.mp4";

/// Render a concat demuxer manifest, one `file` line per part, in order.
pub fn concat_manifest(parts: &[PathBuf]) -> String {
    parts
        .iter()
        .map(|p| {
            let path = p.to_string_lossy().replace('\'', "'\\''");
            format!("file '{}'\n", path)
        })
        .collect()
}

/// Join `parts` into one clip under `work_dir`, preserving order.
pub async fn concat_segments(
    runner: &FfmpegRunner,
    parts: &[PathBuf],
    work_dir: &Path,
) -> MediaResult<PathBuf> {
    if parts.is_empty() {
        return Err(MediaError::internal("no parts to concatenate"));
    }

    let list_path = work_dir.join(CONCAT_LIST_FILE);
    tokio::fs::write(&list_path, concat_manifest(parts)).await?;

    let output = work_dir.join(CONCATENATED_FILE);
    info!(
        "Concatenating {} parts -> {}",
        parts.len(),
        output.display()
    );

    let cmd = FfmpegCommand::new(&list_path, &output)
        .input_format("concat")
        .input_args(["-safe", "0"])
        .codec_copy();

    runner.run(&cmd).await?;
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::RecordingExecutor;
    use std::sync::Arc;

    #[test]
    fn test_manifest_preserves_order() {
        let manifest = concat_manifest(&[
            PathBuf::from("/jobs/a/part_000.mp4"),
            PathBuf::from("/jobs/a/part_002.mp4"),
        ]);
        assert_eq!(
            manifest,
            "file '/jobs/a/part_000.mp4'\nfile '/jobs/a/part_002.mp4'\n"
        );
    }

    #[test]
    fn test_manifest_quotes() {
        let manifest = concat_manifest(&[PathBuf::from("/jobs/it's/part_000.mp4")]);
        assert_eq!(manifest, "file '/jobs/it'\\''s/part_000.mp4'\n");
    }

    #[tokio::test]
    async fn test_concat_invocation() {
        let dir = tempfile::tempdir().unwrap();
        let executor = Arc::new(RecordingExecutor::new());
        let runner = FfmpegRunner::with_executor(executor.clone());
        let parts = vec![dir.path().join("part_000.mp4"), dir.path().join("part_001.mp4")];

        let out = concat_segments(&runner, &parts, dir.path()).await.unwrap();

        assert_eq!(out, dir.path().join(CONCATENATED_FILE));
        let call = &executor.calls()[0];
        assert_eq!(call.arg_after("-f"), Some("concat"));
        assert_eq!(call.arg_after("-safe"), Some("0"));
        let list = dir.path().join(CONCAT_LIST_FILE);
        assert_eq!(call.arg_after("-i"), Some(list.to_str().unwrap()));
        assert_eq!(std::fs::read_to_string(list).unwrap(), concat_manifest(&parts));
    }

    #[tokio::test]
    async fn test_concat_failure_propagates() {
        let dir = tempfile::tempdir().unwrap();
        let executor = Arc::new(RecordingExecutor::new().fail_when_output_contains("concatenated"));
        let runner = FfmpegRunner::with_executor(executor);

        let result = concat_segments(&runner, &[dir.path().join("part_000.mp4")], dir.path()).await;
        assert!(matches!(result, Err(MediaError::FfmpegFailed { .. })));
    }
}
