//! Transcript entries extracted from analysis documents.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Default cue length when an entry carries no end time.
pub const DEFAULT_CUE_MS: u64 = 1000;

/// One timed line of spoken text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TranscriptEntry {
    #[serde(alias = "start_ms")]
    pub start_ms: u64,
    #[serde(default, alias = "end_ms")]
    pub end_ms: Option<u64>,
    #[serde(default)]
    pub text: String,
}

impl TranscriptEntry {
    pub fn new(start_ms: u64, end_ms: Option<u64>, text: impl Into<String>) -> Self {
        Self {
            start_ms,
            end_ms,
            text: text.into(),
        }
    }

    /// End time, defaulting to one second after the start.
    pub fn effective_end_ms(&self) -> u64 {
        self.end_ms
            .unwrap_or_else(|| self.start_ms.saturating_add(DEFAULT_CUE_MS))
    }
}

/// Read the `transcript` array out of an analysis document.
///
/// Malformed entries are dropped. Returns an empty vec when the document
/// has no transcript.
pub fn transcript_from_analysis(analysis: &serde_json::Value) -> Vec<TranscriptEntry> {
    analysis
        .get("transcript")
        .and_then(|t| t.as_array())
        .map(|entries| {
            entries
                .iter()
                .filter_map(|e| serde_json::from_value::<TranscriptEntry>(e.clone()).ok())
                .collect()
        })
        .unwrap_or_default()
}
