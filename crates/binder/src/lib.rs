//! Binder stage of the SMESH binding generator.
//!
//! - [`BinderRegistry`]: one [`Binder`] per bindable declaration, with
//!   ordering ([`BinderRegistry::sort_binders`]), include lists, module
//!   imports and import cycle breaking ([`BinderRegistry::check_circular`])
//! - [`bind_templates`]: binders for explicit class template instantiations
//! - [`glue`]: pybind11 registration code per binder

pub mod binder;
pub mod circular;
pub mod error;
pub mod glue;
mod graph;
mod imports;
pub mod registry;
mod sorter;
pub mod template;

pub use binder::{sanitize_name, Binder, Import, ImportKind};
pub use circular::{ModuleEdge, ModuleGraph};
pub use error::ResolveError;
pub use registry::BinderRegistry;
pub use template::bind_templates;

pub type Result<T> = std::result::Result<T, ResolveError>;
