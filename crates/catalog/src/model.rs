//! The declaration model: every parsed declaration, resolved dependencies and
//! bindability.

use crate::decl::{DeclKind, Declaration, TypeDependency, Usage};
use crate::front_end::FrontEnd;
use crate::namespace::Namespace;
use crate::{CatalogError, Result};
use common::{DiagnosticKind, Diagnostics};
use parser::{BindKind, BinderConfig};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// C++ words that name builtin types or qualify them.
const BUILTIN_WORDS: &[&str] = &[
    "void", "bool", "char", "wchar_t", "char16_t", "char32_t", "short", "int", "long", "float",
    "double", "signed", "unsigned", "const", "volatile", "size_t", "ptrdiff_t", "int8_t",
    "int16_t", "int32_t", "int64_t", "uint8_t", "uint16_t", "uint32_t", "uint64_t",
];

/// Whether `word` is a builtin type word. Standard library names count as builtin.
#[must_use]
pub fn is_builtin(word: &str) -> bool {
    BUILTIN_WORDS.contains(&word) || word.starts_with("std::")
}

/// Identifiers (qualified names included) in a type spelling, in order.
#[must_use]
pub fn identifiers(spelling: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut current = String::new();
    let mut chars = spelling.chars().peekable();
    while let Some(c) = chars.next() {
        if c.is_ascii_alphanumeric() || c == '_' {
            current.push(c);
        } else if c == ':' && chars.peek() == Some(&':') {
            chars.next();
            if !current.is_empty() {
                current.push_str("::");
            }
        } else if !current.is_empty() {
            out.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        out.push(current);
    }
    out.retain(|w| !w.starts_with(|c: char| c.is_ascii_digit()));
    out
}

/// `#include` targets of the umbrella file outside preprocessor conditionals.
#[must_use]
pub fn umbrella_includes(text: &str) -> Vec<String> {
    let mut depth = 0usize;
    let mut includes = Vec::new();
    for line in text.lines() {
        let line = line.trim();
        let Some(directive) = line.strip_prefix('#') else {
            continue;
        };
        let directive = directive.trim_start();
        if directive.starts_with("if") {
            depth += 1;
        } else if directive.starts_with("endif") {
            depth = depth.saturating_sub(1);
        } else if depth == 0 {
            if let Some(target) = directive.strip_prefix("include") {
                let target = target.trim().trim_matches(|c| matches!(c, '<' | '>' | '"'));
                if !target.is_empty() {
                    includes.push(target.to_string());
                }
            }
        }
    }
    includes
}

/// All declarations of one generation run.
#[derive(Debug, Default)]
pub struct DeclarationModel {
    declarations: Vec<Declaration>,
    index: HashMap<String, usize>,
    diagnostics: Diagnostics,
}

impl DeclarationModel {
    /// Parse every header named by the umbrella file.
    ///
    /// Headers are resolved against `include_dirs` in order. Unresolved
    /// headers and syntax errors become parse-level diagnostics.
    pub fn parse(umbrella: &Path, include_dirs: &[PathBuf], namespace: &Namespace) -> Result<Self> {
        let text = fs::read_to_string(umbrella).map_err(|e| CatalogError::Io {
            path: umbrella.to_path_buf(),
            message: e.to_string(),
        })?;

        let mut diagnostics = Diagnostics::new();
        let mut sources = Vec::new();
        for header in umbrella_includes(&text) {
            let Some(path) = include_dirs
                .iter()
                .map(|dir| dir.join(&header))
                .find(|p| p.is_file())
            else {
                diagnostics.push(
                    DiagnosticKind::UnresolvedHeader,
                    &header,
                    "not found in any include directory",
                );
                continue;
            };
            match fs::read(&path) {
                Ok(bytes) => sources.push((header, String::from_utf8_lossy(&bytes).into_owned())),
                Err(e) => diagnostics.push(DiagnosticKind::UnresolvedHeader, &header, e.to_string()),
            }
        }
        info!("Resolved {} headers from {}", sources.len(), umbrella.display());

        let mut model = Self::from_sources(sources, namespace)?;
        diagnostics.merge(std::mem::take(&mut model.diagnostics));
        model.diagnostics = diagnostics;
        Ok(model)
    }

    /// Build the model from `(header file name, header text)` pairs.
    pub fn from_sources<I, H, T>(sources: I, namespace: &Namespace) -> Result<Self>
    where
        I: IntoIterator<Item = (H, T)>,
        H: AsRef<str>,
        T: AsRef<str>,
    {
        let mut front_end = FrontEnd::new()?;
        let mut model = Self::default();

        for (header, text) in sources {
            let header = header.as_ref();
            let contents = front_end.parse_header(header, text.as_ref())?;
            if let Some(first) = contents.error_lines.first() {
                model.diagnostics.push(
                    DiagnosticKind::SyntaxError,
                    header,
                    format!(
                        "{} syntax error(s), first at line {}",
                        contents.error_lines.len(),
                        first
                    ),
                );
            }
            for decl in contents.declarations {
                model.insert(decl);
            }
        }

        for decl in &mut model.declarations {
            decl.set_module(namespace.module_for_header(decl.header()));
        }
        model.resolve_dependencies();
        info!("Collected {} declarations", model.declarations.len());
        Ok(model)
    }

    fn insert(&mut self, decl: Declaration) {
        match self.index.get(decl.name()) {
            Some(&i) => {
                let existing = &mut self.declarations[i];
                if let (DeclKind::Function(into), DeclKind::Function(from)) =
                    (existing.kind_mut(), decl.kind())
                {
                    for overload in &from.overloads {
                        if !into.overloads.contains(overload) {
                            into.overloads.push(overload.clone());
                        }
                    }
                } else {
                    debug!("Keeping first declaration of {}, ignoring {}", existing, decl);
                }
            }
            None => {
                self.index
                    .insert(decl.name().to_string(), self.declarations.len());
                self.declarations.push(decl);
            }
        }
    }

    /// Resolve every declaration's referenced names to model declarations.
    fn resolve_dependencies(&mut self) {
        let resolved: Vec<Vec<TypeDependency>> = self
            .declarations
            .iter()
            .map(|decl| {
                // Members are looked up from inside the class.
                let scope = match decl.kind() {
                    DeclKind::Class(_) | DeclKind::Template(_) => decl.name(),
                    _ => decl.scope(),
                };
                let mut strongest: BTreeMap<String, Usage> = BTreeMap::new();
                for name in decl.referenced_names() {
                    let Some(target) = self.resolve(scope, &name.name) else {
                        continue;
                    };
                    if target.name() == decl.name() {
                        continue;
                    }
                    let usage = strongest.entry(target.name().to_string()).or_insert(name.usage);
                    *usage = (*usage).max(name.usage);
                }
                strongest
                    .into_iter()
                    .map(|(name, usage)| TypeDependency { name, usage })
                    .collect()
            })
            .collect();

        for (decl, deps) in self.declarations.iter_mut().zip(resolved) {
            decl.set_dependencies(deps);
        }
    }

    /// Mark declarations bindable according to the configuration.
    ///
    /// A declaration is bindable when its kind is enabled, it belongs to a
    /// selected module, it is not excluded by name and it is named.
    pub fn apply_config(&mut self, config: &BinderConfig) {
        let mut count = 0usize;
        for decl in &mut self.declarations {
            let kind = decl.kind().bind_kind();
            let excluded = config.is_excluded(kind, decl.name())
                || (kind == BindKind::Templates && config.is_excluded(BindKind::Classes, decl.name()));
            let bindable = !decl.name().is_empty()
                && config.is_enabled(kind)
                && !excluded
                && decl
                    .module()
                    .is_some_and(|m| config.selects_module(&m.module));
            decl.set_bindable(bindable);
            count += usize::from(bindable);
        }
        info!("{} of {} declarations are bindable", count, self.declarations.len());
    }

    #[must_use]
    #[inline]
    pub fn declarations(&self) -> &[Declaration] {
        &self.declarations
    }

    pub fn bindable(&self) -> impl Iterator<Item = &Declaration> {
        self.declarations.iter().filter(|d| d.is_bindable())
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Declaration> {
        self.index
            .get(name.trim_start_matches("::"))
            .map(|&i| &self.declarations[i])
    }

    /// Look `name` up from inside `scope`, innermost scope first.
    #[must_use]
    pub fn resolve(&self, scope: &str, name: &str) -> Option<&Declaration> {
        if let Some(global) = name.strip_prefix("::") {
            return self.get(global);
        }
        let mut scope = scope;
        loop {
            let candidate = if scope.is_empty() {
                name.to_string()
            } else {
                format!("{scope}::{name}")
            };
            if let Some(decl) = self.get(&candidate) {
                return Some(decl);
            }
            if scope.is_empty() {
                return None;
            }
            scope = scope.rsplit_once("::").map_or("", |(outer, _)| outer);
        }
    }

    /// Whether class `name` is `ancestor` or derives from it through public bases.
    #[must_use]
    pub fn derives_from(&self, name: &str, ancestor: &str) -> bool {
        name == ancestor || self.lineage(name).iter().any(|decl| decl.name() == ancestor)
    }

    /// Whether `name` or a class it derives from declares a non-public destructor.
    #[must_use]
    pub fn hides_destructor(&self, name: &str) -> bool {
        self.lineage(name).iter().any(|decl| match decl.kind() {
            DeclKind::Class(class) => class.hidden_destructor,
            DeclKind::Template(tmpl) => tmpl.class.hidden_destructor,
            _ => false,
        })
    }

    /// `name` followed by every class declaration it derives from, each once.
    fn lineage(&self, name: &str) -> Vec<&Declaration> {
        let mut seen = HashSet::new();
        let mut stack = vec![name.to_string()];
        let mut lineage = Vec::new();
        while let Some(current) = stack.pop() {
            if !seen.insert(current.clone()) {
                continue;
            }
            let Some(decl) = self.get(&current) else {
                continue;
            };
            let bases = match decl.kind() {
                DeclKind::Class(class) => &class.bases,
                DeclKind::Template(tmpl) => &tmpl.class.bases,
                _ => continue,
            };
            for base in bases {
                if let Some(base) = self.resolve(decl.scope(), base) {
                    stack.push(base.name().to_string());
                }
            }
            lineage.push(decl);
        }
        lineage
    }

    #[must_use]
    #[inline]
    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    /// Hand the parse-level diagnostics to the caller.
    pub fn take_diagnostics(&mut self) -> Diagnostics {
        std::mem::take(&mut self.diagnostics)
    }
}
