//! Client for the video-understanding provider.
//!
//! The provider indexes submitted videos asynchronously. This crate covers
//! the three calls the rest of the system depends on (submit, poll, fetch)
//! behind the [`AnalysisProvider`] trait, plus index bootstrap helpers.

pub mod client;
pub mod config;
pub mod error;
pub mod types;

pub use client::{AnalysisProvider, ProviderClient};
#[cfg(any(test, feature = "mock"))]
pub use client::MockAnalysisProvider;
pub use config::ProviderConfig;
pub use error::{ProviderError, ProviderResult};
pub use types::{
    CreateIndexRequest, IndexEngine, IndexSummary, ProviderTaskStatus, SubmitSource, TaskSnapshot,
};
