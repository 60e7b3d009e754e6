//! Declaration model of the parsed C++ corpus.
//!
//! - [`front_end`]: tree-sitter based header parser
//! - [`decl`]: declaration types, a tagged variant with uniform dependency edges
//! - [`namespace`]: package and module assignment of headers
//! - [`model`]: the [`DeclarationModel`] with lookups, dependency resolution
//!   and the bindability pass

pub mod decl;
pub mod error;
pub mod front_end;
pub mod model;
pub mod namespace;
pub mod sanitize;

pub use decl::{
    ClassDecl, DeclKind, Declaration, EnumDecl, Field, FunctionDecl, Method, ModuleRef, Param,
    Signature, TemplateDecl, TypeDependency, TypeName, TypeRef, TypedefDecl, Usage,
};
pub use error::CatalogError;
pub use model::{identifiers, is_builtin, umbrella_includes, DeclarationModel};
pub use namespace::Namespace;

pub type Result<T> = std::result::Result<T, CatalogError>;
