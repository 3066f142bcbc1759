//! Rendition pipeline orchestration.
//!
//! Turns a validated edit request and a local source file into a set of
//! rendered variants, one per (duration, aspect ratio) pair.

pub mod config;
pub mod driver;
pub mod error;
pub mod logging;
pub mod matrix;
pub mod source;

pub use config::RenderConfig;
pub use driver::{RenditionDriver, RenditionOutcome};
pub use error::{RenderError, RenderResult};
pub use logging::{JobLogger, JobPhase};
pub use matrix::{RenditionMatrix, VariantPlan, VariantStrategy};
pub use source::{source_file_path, LocalSourceLocator, SourceLocator};
