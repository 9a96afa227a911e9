use std::{io, path::PathBuf};

use lofty::error::LoftyError;
use thiserror::Error;

use crate::format::AudioFormat;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Not an existing file: {0:?}")]
    InvalidPath(PathBuf),

    #[error("Unsupported audio format {extension:?} for file {path:?}")]
    UnsupportedFormat { path: PathBuf, extension: String },

    #[error("Writing tags is not supported for {0} files")]
    UnsupportedWrite(AudioFormat),

    #[error("I/O error for path {path:?}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Lofty(#[from] LoftyError),

    #[error("Invalid timestamp format {0:?}")]
    InvalidTimestampFormat(String),

    #[error("Configuration parse error: {0}")]
    Config(#[from] ::config::ConfigError),

    #[error("Serialization error: {0}")]
    TomlSer(#[from] toml::ser::Error),
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
