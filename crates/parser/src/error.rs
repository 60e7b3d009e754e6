use std::fmt::Debug;
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ParserError {
    #[error("Configuration file not found: {0}")]
    MissingFile(String),
    #[error("Parser error: failed to parse {file}: {message}")]
    Syntax { file: String, message: String },
    #[error("Parser error: unexpected rule in {0}: {1}")]
    UnexpectedRule(String, String),
    #[error("Parser error: Missing '{0}' for {1} directive")]
    IncompleteDirective(String, String),
    #[error("Parser error: unknown declaration kind '{0}'")]
    UnknownKind(String),
    #[error("Parser error: duplicate template alias '{0}'")]
    DuplicateAlias(String),
    #[error("IO error: {0}")]
    Io(String),
}

impl From<std::io::Error> for ParserError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e.to_string())
    }
}
