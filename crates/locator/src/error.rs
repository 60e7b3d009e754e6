use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum LocatorError {
    #[error("{name} include path does not exist: {path}")]
    MissingIncludePath { name: String, path: String },
    #[error("{name} header set is empty: {}", .path.display())]
    EmptyHeaderSet { name: String, path: PathBuf },
    #[error("failed to read directory {}: {message}", .path.display())]
    ReadDir { path: PathBuf, message: String },
    #[error("failed to write umbrella header {}: {message}", .path.display())]
    WriteUmbrella { path: PathBuf, message: String },
}
