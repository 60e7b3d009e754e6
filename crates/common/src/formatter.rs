//! End-of-run reporting for the binder.

use crate::diagnostics::{DiagnosticKind, Diagnostics};
use tracing::{info, warn};

/// Counters collected while emitting, printed once when the run finishes.
pub struct RunSummary {
    tool_name: String,
    modules: usize,
    binders: usize,
    instantiations: usize,
    deferred_imports: usize,
}

impl RunSummary {
    pub fn new(tool_name: &str) -> Self {
        info!("{}", "-".repeat(100));
        info!("{}", tool_name);
        info!("{}", "-".repeat(100));

        Self {
            tool_name: tool_name.to_string(),
            modules: 0,
            binders: 0,
            instantiations: 0,
            deferred_imports: 0,
        }
    }

    pub fn record_modules(&mut self, count: usize) {
        self.modules += count;
    }

    pub fn record_binders(&mut self, count: usize) {
        self.binders += count;
    }

    pub fn record_instantiations(&mut self, count: usize) {
        self.instantiations += count;
    }

    pub fn record_deferred_imports(&mut self, count: usize) {
        self.deferred_imports += count;
    }

    /// Print counters and every drained diagnostic.
    ///
    /// Returns `true` when the run finished without findings that need
    /// manual attention.
    pub fn finish(self, mut diagnostics: Diagnostics) -> bool {
        info!("");
        info!("SUMMARY:");
        info!("  Modules: {}", self.modules);
        info!("  Binders: {}", self.binders);
        info!("  Template instantiations: {}", self.instantiations);
        info!("  Deferred imports: {}", self.deferred_imports);

        let parse_level = diagnostics.iter().filter(|d| d.kind().is_parse_level()).count();
        let skipped = diagnostics.count(DiagnosticKind::UnresolvedInstantiation);
        let review = diagnostics.count(DiagnosticKind::TypeCycle);
        info!("  Parse diagnostics: {}", parse_level);
        info!("  Skipped instantiations: {}", skipped);
        info!("  Needs manual review: {}", review);

        let clean = skipped == 0 && review == 0;
        if !diagnostics.is_empty() {
            warn!("Diagnostics:\n{}", diagnostics);
            diagnostics.drain();
        }
        if clean {
            info!("{} finished.", self.tool_name);
        } else {
            warn!(
                "{} finished with skipped or unordered binders. Check the diagnostics above.",
                self.tool_name
            );
        }
        info!("{}", "-".repeat(100));
        clean
    }
}
