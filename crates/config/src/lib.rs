#![cfg_attr(test, allow(unused_crate_dependencies))]

//! Configuration of the translation engine, read from a TOML file.
//!
//! ```toml
//! [schema]
//! path = "schema.graphql"
//!
//! [translation]
//! default_limit = 50
//! max_limit = 1000
//!
//! [authentication.jwt]
//! secret = "..."
//! ```

mod authentication;
mod translation;

use std::path::{Path, PathBuf};

pub use authentication::{AuthenticationConfig, AuthenticationHeader, JwtAlgorithm, JwtConfig};
pub use translation::TranslationConfig;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Could not read the configuration at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Default, Debug, PartialEq, serde::Deserialize, Clone)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub schema: SchemaConfig,
    pub translation: TranslationConfig,
    pub authentication: AuthenticationConfig,
}

#[derive(Default, Debug, PartialEq, serde::Deserialize, Clone)]
#[serde(default, deny_unknown_fields)]
pub struct SchemaConfig {
    /// Path of the type definitions, relative to the working directory.
    pub path: Option<PathBuf>,
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Config, ConfigError> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        content.parse()
    }

    fn validate(self) -> Result<Config, ConfigError> {
        self.translation.validate()?;
        self.authentication.validate()?;

        Ok(self)
    }
}

impl std::str::FromStr for Config {
    type Err = ConfigError;

    fn from_str(content: &str) -> Result<Self, Self::Err> {
        let config: Config = toml::from_str(content)?;
        config.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        let config: Config = "".parse().unwrap();

        assert_eq!(config, Config::default());
        assert_eq!(config.translation.default_limit, None);
        assert!(config.authentication.jwt.is_none());
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let error = "[translation]\ndefault_limt = 3".parse::<Config>().unwrap_err();

        assert!(matches!(error, ConfigError::Parse(_)));
        assert!(error.to_string().contains("default_limt"));
    }
}
