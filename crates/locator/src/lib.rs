//! Header discovery for the SMESH binder.
//!
//! - [`find_include_root`] / [`locate_sources`]: find the include directory of
//!   every dependency by searching for a signature header.
//! - [`collect_includes`]: union the headers of all sources into an
//!   [`IncludeSet`], assigning each header to a module.
//! - [`write_umbrella`]: synthesize the umbrella header that drives the
//!   whole-corpus parse.

pub mod aggregate;
pub mod error;
pub mod locate;
pub mod sources;
pub mod umbrella;

pub use aggregate::{collect_includes, module_of, Header, IncludeSet};
pub use error::LocatorError;
pub use locate::{find_include_root, locate_sources, LocatedSource, SearchRoots};
pub use sources::{HeaderRules, ModuleRule, Platform, SearchBase, SourceSpec, SOURCES};
pub use umbrella::{render_umbrella, write_umbrella};

pub type Result<T> = std::result::Result<T, LocatorError>;
