//! Non-fatal findings collected during a generation run.
//!
//! Each pipeline stage owns its own [`Diagnostics`] and hands it back to the
//! driver, which merges them once and prints the summary at the end of the
//! run. Nothing is flushed incrementally.

use itertools::Itertools;
use std::fmt;

/// Category of a non-fatal finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DiagnosticKind {
    /// A header named by the umbrella file did not resolve against the include path.
    UnresolvedHeader,
    /// The C++ front end reported a syntax error inside a header.
    SyntaxError,
    /// Binders whose declarations reference each other in a way that cannot be
    /// forward declared away. They are emitted in a stable but arbitrary order.
    TypeCycle,
    /// A configured template instantiation could not be resolved and was skipped.
    UnresolvedInstantiation,
}

impl DiagnosticKind {
    /// Parse-level findings come from the front end, not from the binder stages.
    #[must_use]
    pub fn is_parse_level(self) -> bool {
        matches!(self, Self::UnresolvedHeader | Self::SyntaxError)
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::UnresolvedHeader => "unresolved header",
            Self::SyntaxError => "syntax error",
            Self::TypeCycle => "type cycle (needs manual review)",
            Self::UnresolvedInstantiation => "skipped template instantiation",
        }
    }
}

/// One finding: what kind, about which entity, and a human readable message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    kind: DiagnosticKind,
    subject: String,
    message: String,
}

impl Diagnostic {
    #[must_use]
    pub fn new(kind: DiagnosticKind, subject: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            subject: subject.into(),
            message: message.into(),
        }
    }

    #[must_use]
    #[inline]
    pub fn kind(&self) -> DiagnosticKind {
        self.kind
    }

    /// Header, declaration or instantiation the finding is about.
    #[must_use]
    #[inline]
    pub fn subject(&self) -> &str {
        &self.subject
    }

    #[must_use]
    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.kind.label(), self.subject, self.message)
    }
}

/// Ordered accumulator of [`Diagnostic`]s.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a new finding.
    pub fn push(
        &mut self,
        kind: DiagnosticKind,
        subject: impl Into<String>,
        message: impl Into<String>,
    ) {
        self.entries.push(Diagnostic::new(kind, subject, message));
    }

    /// Move every finding of `other` into `self`, preserving order.
    pub fn merge(&mut self, other: Diagnostics) {
        self.entries.extend(other.entries);
    }

    #[must_use]
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter()
    }

    /// Findings of one kind, in recording order.
    pub fn of_kind(&self, kind: DiagnosticKind) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter().filter(move |d| d.kind == kind)
    }

    #[must_use]
    pub fn count(&self, kind: DiagnosticKind) -> usize {
        self.of_kind(kind).count()
    }

    /// Take all findings out, leaving the accumulator empty.
    pub fn drain(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.entries)
    }
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let grouped = self.entries.iter().into_group_map_by(|d| d.kind);
        for kind in grouped.keys().sorted() {
            let items = &grouped[kind];
            writeln!(f, "{} ({}):", kind.label(), items.len())?;
            for d in items {
                writeln!(f, "  - {}: {}", d.subject, d.message)?;
            }
        }
        Ok(())
    }
}
