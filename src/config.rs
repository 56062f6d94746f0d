use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::constants::DEFAULT_OBJECT_TYPE;
use crate::error::{ConvertError, Result};
use crate::transform::{AliasTagging, BuilderOptions, HeaderMode};

pub const DEFAULT_CONFIG_FILE: &str = "client-jsonl.toml";
pub const CONFIG_PATH_ENV: &str = "CLIENT_JSONL_CONFIG";

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub convert: ConvertConfig,
    pub input: InputConfig,
    pub output: OutputConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ConvertConfig {
    pub header_mode: HeaderMode,
    pub alias_tags: AliasTagging,
    pub object_type: String,
    /// Drop records that carry nothing beyond `objectType`
    pub skip_empty_records: bool,
}

impl Default for ConvertConfig {
    fn default() -> Self {
        Self {
            header_mode: HeaderMode::default(),
            alias_tags: AliasTagging::default(),
            object_type: DEFAULT_OBJECT_TYPE.to_string(),
            skip_empty_records: false,
        }
    }
}

impl ConvertConfig {
    pub fn builder_options(&self) -> BuilderOptions {
        BuilderOptions {
            header_mode: self.header_mode,
            alias_tags: self.alias_tags,
            object_type: self.object_type.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    pub sheet: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("output"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Directory for daily-rotated JSON logs; console only when unset
    pub dir: Option<PathBuf>,
    /// Used when RUST_LOG is not set
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            dir: None,
            filter: "client_jsonl=info".to_string(),
        }
    }
}

impl Config {
    /// Load from an explicit path, else `$CLIENT_JSONL_CONFIG`, else
    /// `client-jsonl.toml` if present. No file at all means defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }
        if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
            if !path.trim().is_empty() {
                return Self::from_file(Path::new(path.trim()));
            }
        }
        let default_path = Path::new(DEFAULT_CONFIG_FILE);
        if default_path.exists() {
            return Self::from_file(default_path);
        }
        Ok(Self::default())
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            ConvertError::Config(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        if config.convert.object_type.trim().is_empty() {
            return Err(ConvertError::Config(
                "convert.object_type must not be blank".to_string(),
            ));
        }
        Ok(config)
    }
}
