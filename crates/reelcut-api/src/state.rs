//! Application state.

use std::path::PathBuf;
use std::sync::Arc;

use reelcut_media::FfmpegRunner;
use reelcut_provider::{AnalysisProvider, ProviderClient};
use reelcut_render::{LocalSourceLocator, RenderConfig, RenditionDriver, SourceLocator};

use crate::config::ApiConfig;
use crate::services::StatusBridge;
use crate::store::{InMemoryVideoStore, VideoStore};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub store: Arc<dyn VideoStore>,
    pub provider: Arc<dyn AnalysisProvider>,
    pub bridge: Arc<StatusBridge>,
    pub driver: Arc<RenditionDriver>,
    pub locator: Arc<dyn SourceLocator>,
    /// Where uploads are persisted
    pub sources_dir: PathBuf,
}

impl AppState {
    /// Create application state from the environment.
    ///
    /// Fails when the provider key is missing.
    pub fn new(config: ApiConfig) -> anyhow::Result<Self> {
        let provider = ProviderClient::from_env()?;
        let render_config = RenderConfig::from_env();
        let locator = LocalSourceLocator::new(render_config.sources_dir())?;
        let driver = RenditionDriver::new(FfmpegRunner::new(), render_config);

        Ok(Self::from_parts(
            config,
            Arc::new(InMemoryVideoStore::new()),
            Arc::new(provider),
            driver,
            Arc::new(locator),
        ))
    }

    /// Assemble state from explicit collaborators.
    pub fn from_parts(
        config: ApiConfig,
        store: Arc<dyn VideoStore>,
        provider: Arc<dyn AnalysisProvider>,
        driver: RenditionDriver,
        locator: Arc<dyn SourceLocator>,
    ) -> Self {
        let bridge = Arc::new(StatusBridge::new(Arc::clone(&store), Arc::clone(&provider)));
        let sources_dir = driver.config().sources_dir();
        Self {
            config,
            store,
            provider,
            bridge,
            driver: Arc::new(driver),
            locator,
            sources_dir,
        }
    }
}
