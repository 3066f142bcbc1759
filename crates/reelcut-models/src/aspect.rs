//! Output aspect ratios and their pixel dimensions.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Supported output aspect ratios.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub enum AspectRatio {
    /// 9:16 vertical (Shorts, Reels, TikTok)
    #[serde(rename = "9:16")]
    Portrait,
    /// 1:1 square
    #[serde(rename = "1:1")]
    Square,
    /// 16:9 horizontal
    #[serde(rename = "16:9")]
    Landscape,
}

impl AspectRatio {
    /// All supported ratios.
    pub const ALL: [AspectRatio; 3] = [
        AspectRatio::Portrait,
        AspectRatio::Square,
        AspectRatio::Landscape,
    ];

    /// Parse a label such as `"9:16"`. Unknown labels yield `None`.
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim() {
            "9:16" => Some(AspectRatio::Portrait),
            "1:1" => Some(AspectRatio::Square),
            "16:9" => Some(AspectRatio::Landscape),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            AspectRatio::Portrait => "9:16",
            AspectRatio::Square => "1:1",
            AspectRatio::Landscape => "16:9",
        }
    }

    /// Target frame size as `(width, height)`.
    pub fn dimensions(&self) -> (u32, u32) {
        match self {
            AspectRatio::Portrait => (1080, 1920),
            AspectRatio::Square => (1080, 1080),
            AspectRatio::Landscape => (1920, 1080),
        }
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}
