use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;

use mirror_core::PublishGate;
use serde::{Deserialize, Serialize};

use crate::ClientSettings;

pub const CONFIG_FILENAME: &str = "notion-mirror.yaml";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not determine home directory")]
    NoHome,
    #[error("configuration not found at {}", path.display())]
    NotFound { path: PathBuf },
    #[error("I/O error reading {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid configuration in {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("database_id is not set in {}", path.display())]
    MissingDatabase { path: PathBuf },
}

/// `<home>/.config/notion-mirror.yaml`
pub fn default_config_path() -> Result<PathBuf, ConfigError> {
    let home = dirs::home_dir().ok_or(ConfigError::NoHome)?;
    Ok(home.join(".config").join(CONFIG_FILENAME))
}

/// Contents of the user configuration file. Every field is optional in the
/// file; the token may instead come from the environment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserConfig {
    pub token: String,
    pub database_id: String,
    pub output_dir: PathBuf,
    pub image_base_dir: PathBuf,
    pub public_image_base_url: String,
    pub publish_status: String,
    pub poll_interval_secs: u64,
}

impl Default for UserConfig {
    fn default() -> Self {
        Self {
            token: String::new(),
            database_id: String::new(),
            output_dir: PathBuf::from("out"),
            image_base_dir: PathBuf::from("/usr/share/server/files/img/posts"),
            public_image_base_url: "https://files.example.com/img/posts".to_string(),
            publish_status: "online".to_string(),
            poll_interval_secs: 5,
        }
    }
}

impl UserConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| {
            if source.kind() == ErrorKind::NotFound {
                ConfigError::NotFound {
                    path: path.to_path_buf(),
                }
            } else {
                ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                }
            }
        })?;
        serde_yaml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Like [`UserConfig::load`], but a missing file yields the defaults.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        match Self::load(path) {
            Err(ConfigError::NotFound { .. }) => Ok(Self::default()),
            other => other,
        }
    }

    /// Settings for the sync loop. The database id has no default.
    pub fn sync_settings(&self, path: &Path) -> Result<SyncSettings, ConfigError> {
        if self.database_id.trim().is_empty() {
            return Err(ConfigError::MissingDatabase {
                path: path.to_path_buf(),
            });
        }
        let gate = PublishGate {
            publishable_status: self.publish_status.clone(),
            ..PublishGate::default()
        };
        Ok(SyncSettings {
            database_id: self.database_id.trim().to_string(),
            output_dir: self.output_dir.clone(),
            image_base_dir: self.image_base_dir.clone(),
            public_image_base_url: self.public_image_base_url.clone(),
            poll_interval: Duration::from_secs(self.poll_interval_secs.max(1)),
            gate,
            client: ClientSettings::default(),
        })
    }
}

#[derive(Debug, Clone)]
pub struct SyncSettings {
    pub database_id: String,
    pub output_dir: PathBuf,
    pub image_base_dir: PathBuf,
    pub public_image_base_url: String,
    pub poll_interval: Duration,
    pub gate: PublishGate,
    pub client: ClientSettings,
}

impl SyncSettings {
    /// `{output_dir}/{slug}.md`
    pub fn output_path(&self, slug: &str) -> PathBuf {
        self.output_dir.join(format!("{slug}.md"))
    }
}
