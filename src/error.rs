use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors reading or writing the field configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("toml serialization error: {0}")]
    Serialize(#[from] toml::ser::Error),
}
