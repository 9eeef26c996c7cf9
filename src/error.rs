use std::path::PathBuf;
use thiserror::Error;

use crate::classfile::ClassParseError;
use crate::descriptor::ClassLocation;

pub type Result<T> = std::result::Result<T, DetectError>;

#[derive(Debug, Error)]
pub enum DetectError {
    #[error("failed to read class file {location}")]
    MalformedClassFile {
        location: ClassLocation,
        #[source]
        source: ClassParseError,
    },
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("failed to read {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to open library archive {}", path.display())]
    Archive {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },
}

impl DetectError {
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }
}
