use binder::ResolveError;
use catalog::CatalogError;
use locator::LocatorError;
use parser::ParserError;
use std::path::PathBuf;
use thiserror::Error;

/// Fatal errors of a generation run. Each aborts before the output tree is written.
#[derive(Error, Debug)]
pub enum GeneratorError {
    #[error("environment variable {0} is not set")]
    MissingEnv(&'static str),
    #[error("root path does not exist: {}", .0.display())]
    RootMissing(PathBuf),
    #[error(transparent)]
    Locator(#[from] LocatorError),
    #[error(transparent)]
    Config(#[from] ParserError),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error(transparent)]
    Resolve(#[from] ResolveError),
    #[error("failed to write {}: {message}", .path.display())]
    Io { path: PathBuf, message: String },
}
