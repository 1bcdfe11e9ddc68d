//! Mirror engine: store client, rendering hooks, render invocation and the
//! poll loop.
mod config;
mod connect;
mod convert;
mod download;
mod engine;
mod filename;
mod frontmatter;
mod hooks;
mod invoke;
mod persist;
mod store;
mod token;
mod types;

pub use config::{default_config_path, ConfigError, SyncSettings, UserConfig, CONFIG_FILENAME};
pub use connect::{Connector, NotionConnector};
pub use convert::{rich_text_to_markdown, BlockRenderer, Renderer};
pub use download::{DownloadError, ImageDownloader, ReqwestImageDownloader};
pub use engine::{CycleError, CycleReport, PageOutcome, PageReport, Poller};
pub use filename::image_filename;
pub use frontmatter::{build_front_matter, HeaderMeta, HeaderProperties, PublishingHeader};
pub use hooks::{
    HeaderHook, HookError, ImageContext, ImageHook, ImageResolution, ImageSaveOptions,
    OverrideOptions, PublishingImageHook, RenderOptions,
};
pub use invoke::RenderInvoker;
pub use persist::{ensure_output_dir, AtomicFileWriter, PersistError};
pub use store::{ClientSettings, NotionClient, PageStore};
pub use token::{TokenError, TokenResolver, TOKEN_ENV_VAR};
pub use types::{FailureKind, RenderError, StoreError};
