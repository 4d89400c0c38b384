use anyhow::Result;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::driver::traits::BrowserPage;
use crate::error::E2eError;
use crate::pages::ProgressSink;
use crate::utils::config::Config;

/// Everything one scenario run needs
#[derive(Clone)]
pub struct ScenarioContext {
    pub config: Arc<Config>,

    /// Fresh page for UI scenarios, `None` for API scenarios
    pub page: Option<Arc<dyn BrowserPage>>,

    /// Receives flow stages as they are reached
    pub progress: Option<ProgressSink>,

    /// Directory holding upload fixtures
    pub assets_dir: PathBuf,

    /// Output directory for screenshots and reports
    pub output_dir: PathBuf,
}

impl ScenarioContext {
    pub fn new(config: Arc<Config>) -> Self {
        Self {
            config,
            page: None,
            progress: None,
            assets_dir: PathBuf::from("tests/assets"),
            output_dir: PathBuf::from("output"),
        }
    }

    pub fn with_page(mut self, page: Arc<dyn BrowserPage>) -> Self {
        self.page = Some(page);
        self
    }

    pub fn with_progress(mut self, progress: ProgressSink) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn with_assets_dir(mut self, dir: &Path) -> Self {
        self.assets_dir = dir.to_path_buf();
        self
    }

    pub fn with_output_dir(mut self, dir: &Path) -> Self {
        self.output_dir = dir.to_path_buf();
        self
    }

    pub fn require_page(&self) -> Result<Arc<dyn BrowserPage>> {
        self.page
            .clone()
            .ok_or_else(|| E2eError::Config("UI scenario started without a browser page".into()).into())
    }

    /// Resolve a fixture file name against the assets directory
    pub fn asset(&self, name: &str) -> PathBuf {
        self.assets_dir.join(name)
    }

    /// Get the output path for a file
    pub fn output_path(&self, filename: &str) -> PathBuf {
        self.output_dir.join(filename)
    }
}
