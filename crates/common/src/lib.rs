//! Shared utilities for the SMESH binding generator.
//!
//! - [`Config`]: command line configuration of a generation run.
//! - [`Diagnostics`]: accumulator for non-fatal findings, owned per stage
//!   and merged once by the driver.
//! - [`RunSummary`]: end-of-run reporting.

pub mod config;
pub mod diagnostics;
pub mod formatter;

pub use config::Config;
pub use diagnostics::{Diagnostic, DiagnosticKind, Diagnostics};
pub use formatter::RunSummary;

/// Case-insensitive ordering key used wherever the generator promises a
/// deterministic "case-insensitive lexical" order. The exact spelling is the
/// secondary key so distinct names never compare equal.
pub fn case_insensitive_key(name: &str) -> (String, String) {
    (name.to_lowercase(), name.to_string())
}

/// Sort names case-insensitively in place (exact spelling breaks ties).
pub fn sort_case_insensitive(names: &mut [String]) {
    names.sort_by_cached_key(|n| case_insensitive_key(n));
}
