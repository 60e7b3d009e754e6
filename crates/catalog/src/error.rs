use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum CatalogError {
    #[error("Failed to read {}: {message}", .path.display())]
    Io { path: PathBuf, message: String },
    #[error("Failed to load the C++ grammar: {0}")]
    Language(String),
    #[error("C++ front end gave up on {0}")]
    ParseFailed(String),
}
