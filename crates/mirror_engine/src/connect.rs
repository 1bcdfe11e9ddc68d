use std::sync::Arc;

use crate::convert::{BlockRenderer, Renderer};
use crate::{ClientSettings, NotionClient, PageStore, RenderError, StoreError};

/// Builds authenticated store and renderer handles. Called with a freshly
/// resolved token every cycle, so a rotated token takes effect without a
/// restart.
pub trait Connector: Send + Sync {
    fn store(&self, token: &str) -> Result<Arc<dyn PageStore>, StoreError>;

    fn renderer(&self, token: &str) -> Result<Box<dyn Renderer>, RenderError>;
}

#[derive(Debug, Clone, Default)]
pub struct NotionConnector {
    settings: ClientSettings,
}

impl NotionConnector {
    pub fn new(settings: ClientSettings) -> Self {
        Self { settings }
    }
}

impl Connector for NotionConnector {
    fn store(&self, token: &str) -> Result<Arc<dyn PageStore>, StoreError> {
        Ok(Arc::new(NotionClient::new(self.settings.clone(), token)?))
    }

    fn renderer(&self, token: &str) -> Result<Box<dyn Renderer>, RenderError> {
        let store = self.store(token)?;
        Ok(Box::new(BlockRenderer::new(store)))
    }
}
