//! Override hooks the renderer calls back into while walking a page.
//!
//! The renderer only sees the [`HeaderHook`] and [`ImageHook`] signatures;
//! which implementation is installed is decided by whoever builds the
//! [`RenderOptions`].

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use mirror_core::{sanitize_title, Block, BlockKind, FileObject, Page, PropertyError};

use crate::download::{DownloadError, ImageDownloader};

#[derive(Debug, thiserror::Error)]
pub enum HookError {
    #[error("expected an image block, found {found}")]
    NotAnImage { found: String },
    #[error(transparent)]
    Property(#[from] PropertyError),
    #[error("front matter serialization failed: {0}")]
    Serialize(String),
    #[error("image download failed: {0}")]
    Download(#[from] DownloadError),
    #[error("saved image path {0} has no file name")]
    SavedPath(PathBuf),
}

/// Produces the literal block prepended to a rendered document, delimiters
/// included.
pub trait HeaderHook: Send + Sync {
    fn header(&self, page: &Page) -> Result<String, HookError>;
}

impl<F> HeaderHook for F
where
    F: Fn(&Page) -> Result<String, HookError> + Send + Sync,
{
    fn header(&self, page: &Page) -> Result<String, HookError> {
        self(page)
    }
}

/// What the renderer knows when it meets an image block.
#[derive(Debug, Clone, Copy)]
pub struct ImageContext<'a> {
    pub page: &'a Page,
    pub options: &'a RenderOptions,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageResolution {
    pub markdown: String,
    /// Set when the image was downloaded.
    pub saved_path: Option<PathBuf>,
}

/// Turns an image block into Markdown, downloading it if needed. May fail,
/// which aborts the render of the owning page.
#[async_trait::async_trait]
pub trait ImageHook: Send + Sync {
    async fn resolve(
        &self,
        block: &Block,
        ctx: &ImageContext<'_>,
    ) -> Result<ImageResolution, HookError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageSaveOptions {
    /// Empty until an image hook picks a directory.
    pub save_dir: PathBuf,
    pub max_bytes: u64,
}

impl Default for ImageSaveOptions {
    fn default() -> Self {
        Self {
            save_dir: PathBuf::new(),
            max_bytes: 20 * 1024 * 1024,
        }
    }
}

#[derive(Clone, Default)]
pub struct OverrideOptions {
    pub header: Option<Arc<dyn HeaderHook>>,
    pub image: Option<Arc<dyn ImageHook>>,
}

impl fmt::Debug for OverrideOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OverrideOptions")
            .field("header", &self.header.is_some())
            .field("image", &self.image.is_some())
            .finish()
    }
}

#[derive(Debug, Clone, Default)]
pub struct RenderOptions {
    pub image: ImageSaveOptions,
    pub overrides: OverrideOptions,
    pub skip_empty_paragraphs: bool,
}

/// Image hook for self-hosted publishing.
///
/// External images are linked as-is. Uploaded images are saved under
/// `{base_dir}/{slug}/` and linked through `{public_base_url}/{slug}/{file}`,
/// where the file server exposes `base_dir`.
pub struct PublishingImageHook {
    downloader: Arc<dyn ImageDownloader>,
    base_dir: PathBuf,
    public_base_url: String,
    title_property: String,
}

impl PublishingImageHook {
    pub fn new(
        downloader: Arc<dyn ImageDownloader>,
        base_dir: PathBuf,
        public_base_url: impl Into<String>,
        title_property: impl Into<String>,
    ) -> Self {
        Self {
            downloader,
            base_dir,
            public_base_url: public_base_url.into(),
            title_property: title_property.into(),
        }
    }
}

#[async_trait::async_trait]
impl ImageHook for PublishingImageHook {
    async fn resolve(
        &self,
        block: &Block,
        ctx: &ImageContext<'_>,
    ) -> Result<ImageResolution, HookError> {
        let BlockKind::Image { file, .. } = &block.kind else {
            return Err(HookError::NotAnImage {
                found: block.type_name().to_string(),
            });
        };

        let url = match file {
            FileObject::External { url } => {
                // TODO: use the block caption as alt text instead of "image".
                return Ok(ImageResolution {
                    markdown: format!("![image]({url})"),
                    saved_path: None,
                });
            }
            FileObject::Uploaded { url } => url,
        };

        let slug = sanitize_title(ctx.page.title_text(&self.title_property)?);
        let mut options = ctx.options.image.clone();
        options.save_dir = self.base_dir.join(&slug);

        let saved = self.downloader.download(url, &options).await?;
        let file_name = saved
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| HookError::SavedPath(saved.clone()))?
            .to_string();

        let public = format!(
            "{}/{}/{}",
            self.public_base_url.trim_end_matches('/'),
            slug,
            file_name
        );
        Ok(ImageResolution {
            markdown: format!("![{public}]({public})"),
            saved_path: Some(saved),
        })
    }
}
