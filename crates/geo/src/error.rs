use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// No usable inputs or an unusable output location, detected before any raster is processed
    #[error("Configuration error: {0}")]
    Configuration(String),
    #[error("Failed to open raster source '{}' ({reason})", .path.display())]
    SourceOpen { path: PathBuf, reason: String },
    #[error("Raster grid of '{}' does not match the reference grid: expected {expected}, got {actual}", .path.display())]
    GridMismatch {
        path: PathBuf,
        expected: String,
        actual: String,
    },
    #[error("Failed to write raster '{}' ({reason})", .path.display())]
    Write { path: PathBuf, reason: String },
    #[error("Block dimensions do not match ({}x{}) <-> ({}x{})", .size1.0, .size1.1, .size2.0, .size2.1)]
    SizeMismatch {
        size1: (usize, usize),
        size2: (usize, usize),
    },
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    #[error("Runtime error: {0}")]
    Runtime(String),
    #[error("Operation was cancelled")]
    Cancelled,
    #[error(transparent)]
    Infra(inf::Error),
    #[error("GDAL error: {0}")]
    GdalError(#[from] gdal::errors::GdalError),
    #[error("Invalid string: {0}")]
    InvalidString(#[from] std::ffi::NulError),
    #[error("IO error: {0}")]
    IOError(#[from] std::io::Error),
}

impl From<inf::Error> for Error {
    fn from(err: inf::Error) -> Self {
        match err {
            inf::Error::Cancelled => Error::Cancelled,
            inf::Error::GdalError(err) => Error::GdalError(err),
            err => Error::Infra(err),
        }
    }
}
