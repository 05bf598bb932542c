use std::path::Path;

use config::{Config, ConfigError, Environment, File, FileFormat};
use serde::Deserialize;

use crate::model::Tag;

pub const ENV_PREFIX: &str = "METACAT";

#[derive(Deserialize, Debug, PartialEq, Eq, Clone, Default)]
pub struct MetacatConfig {
    #[serde(default)]
    pub catalog: Catalog,
    #[serde(default)]
    pub frontend: Frontend,
    #[serde(default)]
    pub misc: Misc,
    // Registered on startup so that datasets can be tagged with them
    #[serde(default)]
    pub tags: Vec<Tag>,
}

#[derive(Deserialize, Debug, PartialEq, Eq, Clone)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Catalog {
    #[serde(rename = "memory")]
    InMemory(InMemory),
}

impl Default for Catalog {
    fn default() -> Self {
        Catalog::InMemory(InMemory {})
    }
}

#[derive(Deserialize, Debug, PartialEq, Eq, Clone)]
pub struct InMemory {}

#[derive(Deserialize, Debug, PartialEq, Eq, Clone)]
pub struct Frontend {
    pub http: Option<HttpFrontend>,
}

impl Default for Frontend {
    fn default() -> Self {
        Self {
            http: Some(HttpFrontend::default()),
        }
    }
}

#[derive(Deserialize, Debug, PartialEq, Eq, Clone)]
#[serde(default)]
pub struct HttpFrontend {
    pub bind_host: String,
    pub bind_port: u16,
}

impl Default for HttpFrontend {
    fn default() -> Self {
        Self {
            bind_host: "127.0.0.1".to_string(),
            bind_port: 5000,
        }
    }
}

#[derive(Deserialize, Debug, PartialEq, Eq, Clone)]
#[serde(default)]
pub struct Misc {
    pub default_limit: usize,
    pub max_limit: usize,
}

impl Default for Misc {
    fn default() -> Self {
        Self {
            default_limit: 100,
            max_limit: 1000,
        }
    }
}

pub fn validate_config(config: MetacatConfig) -> Result<MetacatConfig, ConfigError> {
    let Misc {
        default_limit,
        max_limit,
    } = config.misc;

    if max_limit == 0 {
        Err(ConfigError::Message(
            "misc.max_limit must be greater than zero".to_string(),
        ))
    } else if default_limit > max_limit {
        Err(ConfigError::Message(format!(
            "misc.default_limit ({default_limit}) can't be greater than \
            misc.max_limit ({max_limit})"
        )))
    } else {
        Ok(config)
    }
}

/// Load the config at `path`, overlaid with `METACAT__SECTION__KEY`
/// environment variables. A missing file leaves every setting at its default.
pub fn load_config(path: &Path) -> Result<MetacatConfig, ConfigError> {
    let config = Config::builder()
        .add_source(File::from(path).format(FileFormat::Toml).required(false))
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true),
        );

    config.build()?.try_deserialize().and_then(validate_config)
}

// Load a config from a string (to test our structs are defined correctly)
pub fn load_config_from_string(
    config_str: &str,
    skip_validation: bool,
) -> Result<MetacatConfig, ConfigError> {
    let config =
        Config::builder().add_source(File::from_str(config_str, FileFormat::Toml));

    if skip_validation {
        config.build()?.try_deserialize()
    } else {
        config.build()?.try_deserialize().and_then(validate_config)
    }
}
