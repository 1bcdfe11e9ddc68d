use std::path::PathBuf;

use crate::config::{ConfigError, UserConfig};

pub const TOKEN_ENV_VAR: &str = "NOTION_TOKEN";

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("no token in ${env_var} and no configuration file location")]
    NoConfigLocation { env_var: String },
    #[error("no token in ${env_var}: {source}")]
    Config {
        env_var: String,
        #[source]
        source: ConfigError,
    },
    #[error("no token in ${env_var} and token from {} was empty", path.display())]
    EmptyToken { env_var: String, path: PathBuf },
}

/// Finds the store integration token: the environment variable first, then
/// the `token` field of the user configuration file.
///
/// Nothing is cached; every call reads both sources again.
#[derive(Debug, Clone)]
pub struct TokenResolver {
    env_var: String,
    config_path: Option<PathBuf>,
}

impl TokenResolver {
    pub fn new(env_var: impl Into<String>, config_path: Option<PathBuf>) -> Self {
        Self {
            env_var: env_var.into(),
            config_path,
        }
    }

    pub fn resolve(&self) -> Result<String, TokenError> {
        if let Ok(token) = std::env::var(&self.env_var) {
            if !token.is_empty() {
                return Ok(token);
            }
        }

        let path = self
            .config_path
            .as_ref()
            .ok_or_else(|| TokenError::NoConfigLocation {
                env_var: self.env_var.clone(),
            })?;
        let config = UserConfig::load(path).map_err(|source| TokenError::Config {
            env_var: self.env_var.clone(),
            source,
        })?;
        if config.token.is_empty() {
            return Err(TokenError::EmptyToken {
                env_var: self.env_var.clone(),
                path: path.clone(),
            });
        }
        Ok(config.token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with(dir: &tempfile::TempDir, token: &str) -> PathBuf {
        let path = dir.path().join("notion-mirror.yaml");
        std::fs::write(&path, format!("token: '{token}'\n")).unwrap();
        path
    }

    // Each test uses its own variable name so parallel tests never race.

    #[test]
    fn environment_wins_over_configuration() {
        let dir = tempfile::tempdir().unwrap();
        let path = config_with(&dir, "from-config");
        std::env::set_var("MIRROR_TEST_TOKEN_PRECEDENCE", "from-env");

        let resolver = TokenResolver::new("MIRROR_TEST_TOKEN_PRECEDENCE", Some(path));
        assert_eq!(resolver.resolve().unwrap(), "from-env");
    }

    #[test]
    fn configuration_used_when_environment_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = config_with(&dir, "from-config");
        std::env::set_var("MIRROR_TEST_TOKEN_EMPTY", "");

        let resolver = TokenResolver::new("MIRROR_TEST_TOKEN_EMPTY", Some(path.clone()));
        assert_eq!(resolver.resolve().unwrap(), "from-config");

        let unset = TokenResolver::new("MIRROR_TEST_TOKEN_NEVER_SET", Some(path));
        assert_eq!(unset.resolve().unwrap(), "from-config");
    }

    #[test]
    fn fails_without_any_token() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.yaml");
        let resolver = TokenResolver::new("MIRROR_TEST_TOKEN_NONE", Some(missing));
        assert!(matches!(
            resolver.resolve(),
            Err(TokenError::Config {
                source: ConfigError::NotFound { .. },
                ..
            })
        ));

        let empty = config_with(&dir, "");
        let resolver = TokenResolver::new("MIRROR_TEST_TOKEN_NONE", Some(empty));
        assert!(matches!(
            resolver.resolve(),
            Err(TokenError::EmptyToken { .. })
        ));

        let nowhere = TokenResolver::new("MIRROR_TEST_TOKEN_NONE", None);
        assert!(matches!(
            nowhere.resolve(),
            Err(TokenError::NoConfigLocation { .. })
        ));
    }
}
