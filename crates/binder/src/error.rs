use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ResolveError {
    #[error("Unresolvable import cycle between modules {modules}: every edge needs a complete type")]
    UnresolvableImportCycle { modules: String },
}
