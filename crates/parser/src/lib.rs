//! Binder configuration parser.
//!
//! The configuration file selects what the binder emits: which declaration
//! kinds are bound, which modules are included or excluded, which headers
//! and declarations are skipped, and which class templates are instantiated
//! under which alias.
//!
//! ```text
//! +bind classes
//! -bind typedefs
//! -module Interface
//! -header OSD_Parallel.hxx
//! -class SMESH_Gen::TAlgoStateError
//! +template NCollection_Array1<gp_Pnt> as TColgp_Array1OfPnt in TColgp
//! ```

pub mod config;
pub mod directive;
pub mod error;

pub use config::{BindToggles, BinderConfig};
pub use directive::{BindKind, Directive, Instantiation};
pub use error::ParserError;

use pest::iterators::Pair;
use pest_derive::Parser;

/// Result type used throughout the parser crate.
pub type Result<T> = std::result::Result<T, ParserError>;

/// Configuration parser, powered by Pest.
#[derive(Parser)]
#[grammar = "config.pest"]
pub struct ConfigParser;

/// Trait for converting Pest parse trees into configuration types.
pub trait Lexeme: Sized {
    /// Converts a Pest parse rule into a structured configuration type.
    fn from_parsed_rule(parsed_rule: Pair<Rule>) -> Result<Self>;
}

#[cfg(test)]
mod tests;
