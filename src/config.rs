use crate::error::ConfigError;
use crate::platform::{PlatformOverrides, UserAgent};
use crate::prompt::CHANGE_VALUE_TITLE;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
};

const QUALIFIER: &str = "net.blocktext";
const ORGANIZATION: &str = "Blocktext";
const APPLICATION: &str = "blocktext";
const CONFIG_FILE_NAME: &str = "field.toml";

/// Point size of field text. Matches the `blocklyText` CSS font size.
pub const DEFAULT_FONT_SIZE: f64 = 11.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldConfig {
    /// Font size in points at zoom 1.0.
    pub font_size: f64,
    /// Whether the overlay input asks the platform to spellcheck.
    pub spellcheck: bool,
    /// Title of the modal prompt used on touch platforms.
    pub prompt_title: String,
    pub platform: PlatformOverrides,
}

impl Default for FieldConfig {
    fn default() -> Self {
        FieldConfig {
            font_size: DEFAULT_FONT_SIZE,
            spellcheck: true,
            prompt_title: CHANGE_VALUE_TITLE.to_string(),
            platform: PlatformOverrides::default(),
        }
    }
}

impl FieldConfig {
    /// Detected platform flags with this config's overrides applied.
    pub fn user_agent(&self) -> UserAgent {
        UserAgent::detect().with_overrides(&self.platform)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }
}

pub fn config_file_path() -> Option<PathBuf> {
    ProjectDirs::from(QUALIFIER, ORGANIZATION, APPLICATION)
        .map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
}

/// Read the config at `path`. A missing file yields the defaults.
pub fn load_config(path: &Path) -> Result<FieldConfig, ConfigError> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(FieldConfig::default()),
        Err(source) => {
            return Err(ConfigError::Io {
                path: path.to_path_buf(),
                source,
            });
        }
    };

    toml::from_str::<FieldConfig>(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Like `load_config`, but logs failures and falls back to the defaults.
pub fn load_or_default(path: Option<&Path>) -> FieldConfig {
    let Some(path) = path else {
        return FieldConfig::default();
    };
    match load_config(path) {
        Ok(config) => config,
        Err(err) => {
            log::warn!("{err}; using default field configuration");
            FieldConfig::default()
        }
    }
}

pub fn save_config(path: &Path, config: &FieldConfig) -> Result<(), ConfigError> {
    let io_err = |source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(io_err)?;
    }
    fs::write(path, config.to_toml()?).map_err(io_err)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("blocktext-config-{}-{}", std::process::id(), name))
            .join(CONFIG_FILE_NAME)
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let config = load_config(&temp_path("missing")).unwrap();
        assert_eq!(config, FieldConfig::default());
        assert_eq!(config.font_size, 11.0);
        assert!(config.spellcheck);
    }

    #[test]
    fn test_partial_file() {
        let config: FieldConfig = toml::from_str(
            r#"
            spellcheck = false

            [platform]
            webkit = true
            "#,
        )
        .unwrap();
        assert!(!config.spellcheck);
        assert_eq!(config.font_size, DEFAULT_FONT_SIZE);
        assert_eq!(config.platform.webkit, Some(true));
        assert!(config.user_agent().webkit);
    }

    #[test]
    fn test_save_and_load() {
        let path = temp_path("save");
        let config = FieldConfig {
            font_size: 14.0,
            ..Default::default()
        };
        save_config(&path, &config).unwrap();
        assert_eq!(load_config(&path).unwrap(), config);
        let _ = fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn test_parse_error_falls_back() {
        let path = temp_path("broken");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "font_size = \"big\"").unwrap();
        assert!(matches!(load_config(&path), Err(ConfigError::Parse { .. })));
        assert_eq!(load_or_default(Some(&path)), FieldConfig::default());
        let _ = fs::remove_dir_all(path.parent().unwrap());
    }
}
