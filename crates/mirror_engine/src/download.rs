use std::path::PathBuf;

use futures_util::StreamExt;
use mirror_logging::mirror_debug;
use reqwest::header::CONTENT_TYPE;
use url::Url;

use crate::filename::image_filename;
use crate::hooks::ImageSaveOptions;
use crate::persist::{AtomicFileWriter, PersistError};
use crate::ClientSettings;

#[derive(Debug, thiserror::Error)]
pub enum DownloadError {
    #[error("invalid image url {url}: {message}")]
    InvalidUrl { url: String, message: String },
    #[error("image request returned http status {0}")]
    HttpStatus(u16),
    #[error("image request timed out")]
    Timeout,
    #[error("image too large (max {max_bytes}, actual {actual:?})")]
    TooLarge { max_bytes: u64, actual: Option<u64> },
    #[error("no save directory configured")]
    NoSaveDir,
    #[error("network error: {0}")]
    Network(String),
    #[error(transparent)]
    Persist(#[from] PersistError),
}

/// Fetches an image and stores it under `options.save_dir`, returning the
/// path of the saved file.
#[async_trait::async_trait]
pub trait ImageDownloader: Send + Sync {
    async fn download(&self, url: &str, options: &ImageSaveOptions)
        -> Result<PathBuf, DownloadError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestImageDownloader {
    client: reqwest::Client,
}

impl ReqwestImageDownloader {
    pub fn new(settings: &ClientSettings) -> Result<Self, DownloadError> {
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| DownloadError::Network(err.to_string()))?;
        Ok(Self { client })
    }
}

#[async_trait::async_trait]
impl ImageDownloader for ReqwestImageDownloader {
    async fn download(
        &self,
        url: &str,
        options: &ImageSaveOptions,
    ) -> Result<PathBuf, DownloadError> {
        if options.save_dir.as_os_str().is_empty() {
            return Err(DownloadError::NoSaveDir);
        }
        let parsed = Url::parse(url).map_err(|err| DownloadError::InvalidUrl {
            url: url.to_string(),
            message: err.to_string(),
        })?;

        let response = self
            .client
            .get(parsed.clone())
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(DownloadError::HttpStatus(status.as_u16()));
        }

        if let Some(content_len) = response.content_length() {
            if content_len > options.max_bytes {
                return Err(DownloadError::TooLarge {
                    max_bytes: options.max_bytes,
                    actual: Some(content_len),
                });
            }
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.to_string());

        let mut bytes = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(map_reqwest_error)?;
            let next_len = bytes.len() as u64 + chunk.len() as u64;
            if next_len > options.max_bytes {
                return Err(DownloadError::TooLarge {
                    max_bytes: options.max_bytes,
                    actual: Some(next_len),
                });
            }
            bytes.extend_from_slice(&chunk);
        }

        let filename = image_filename(&parsed, content_type.as_deref());
        let writer = AtomicFileWriter::new(options.save_dir.clone());
        let path = writer.write(&filename, &bytes)?;
        mirror_debug!("Saved image {} ({} bytes)", path.display(), bytes.len());
        Ok(path)
    }
}

fn map_reqwest_error(err: reqwest::Error) -> DownloadError {
    if err.is_timeout() {
        return DownloadError::Timeout;
    }
    DownloadError::Network(err.to_string())
}
