use std::path::{Path, PathBuf};
use std::sync::Arc;

use mirror_logging::{mirror_error, mirror_info};

use crate::config::SyncSettings;
use crate::download::ImageDownloader;
use crate::frontmatter::{HeaderProperties, PublishingHeader};
use crate::hooks::{ImageSaveOptions, OverrideOptions, PublishingImageHook, RenderOptions};
use crate::persist::AtomicFileWriter;
use crate::{Connector, RenderError};

/// Renders single pages with a fixed set of options and writes the result.
pub struct RenderInvoker {
    connector: Arc<dyn Connector>,
    options: RenderOptions,
}

impl RenderInvoker {
    pub fn new(connector: Arc<dyn Connector>, options: RenderOptions) -> Self {
        Self { connector, options }
    }

    /// Publishing setup: front-matter header, self-hosted images, empty
    /// paragraphs dropped.
    pub fn publishing(
        connector: Arc<dyn Connector>,
        settings: &SyncSettings,
        downloader: Arc<dyn ImageDownloader>,
    ) -> Self {
        let header = PublishingHeader::new(HeaderProperties {
            title: settings.gate.title_property.clone(),
            ..HeaderProperties::default()
        });
        let image = PublishingImageHook::new(
            downloader,
            settings.image_base_dir.clone(),
            settings.public_image_base_url.clone(),
            settings.gate.title_property.clone(),
        );
        let options = RenderOptions {
            image: ImageSaveOptions::default(),
            overrides: OverrideOptions {
                header: Some(Arc::new(header)),
                image: Some(Arc::new(image)),
            },
            skip_empty_paragraphs: true,
        };
        Self::new(connector, options)
    }

    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    /// Renders `page_id` into `path`. Failures are logged here with the page
    /// id and returned; none of them is fatal to the caller.
    pub async fn render_page(
        &self,
        token: &str,
        page_id: &str,
        path: &Path,
    ) -> Result<PathBuf, RenderError> {
        let result = self.try_render(token, page_id, path).await;
        match &result {
            Ok(written) => mirror_info!("Rendered page {} to {}", page_id, written.display()),
            Err(err) => mirror_error!("Failed rendering page {}: {}", page_id, err),
        }
        result
    }

    async fn try_render(
        &self,
        token: &str,
        page_id: &str,
        path: &Path,
    ) -> Result<PathBuf, RenderError> {
        let renderer = self.connector.renderer(token)?;
        let bytes = renderer.render(page_id, &self.options).await?;

        let filename = path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| RenderError::OutputPath(path.display().to_string()))?;
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let writer = AtomicFileWriter::new(dir);
        Ok(writer.write(filename, &bytes)?)
    }
}
