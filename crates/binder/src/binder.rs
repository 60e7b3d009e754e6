//! The per-declaration unit of generated output.

use catalog::{ModuleRef, TypeDependency};
use parser::Instantiation;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// How an imported module is made available to a binder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ImportKind {
    /// `py::module_::import` at registration time.
    Direct,
    /// Forward declarations only; the module is imported lazily by Python.
    Deferred,
}

impl fmt::Display for ImportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Direct => write!(f, "direct"),
            Self::Deferred => write!(f, "deferred"),
        }
    }
}

/// One module a binder needs at registration time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Import {
    kind: ImportKind,
    deferrable: bool,
    types: BTreeSet<String>,
}

impl Import {
    #[must_use]
    #[inline]
    pub fn kind(&self) -> ImportKind {
        self.kind
    }

    /// Whether every type the binder uses from the module is used through a
    /// pointer or reference.
    #[must_use]
    #[inline]
    pub fn is_deferrable(&self) -> bool {
        self.deferrable
    }

    /// Qualified names of the declarations used from the module.
    #[must_use]
    #[inline]
    pub fn types(&self) -> &BTreeSet<String> {
        &self.types
    }
}

/// A unit of generated output for one declaration or one template instantiation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binder {
    name: String,
    declaration: String,
    module: ModuleRef,
    header: String,
    dependencies: Vec<TypeDependency>,
    includes: Vec<String>,
    imports: BTreeMap<ModuleRef, Import>,
    needs_review: bool,
    instantiation: Option<Instantiation>,
}

impl Binder {
    #[must_use]
    pub fn new(
        declaration: &str,
        module: ModuleRef,
        header: &str,
        dependencies: Vec<TypeDependency>,
    ) -> Self {
        Self {
            name: declaration.to_string(),
            declaration: declaration.to_string(),
            module,
            header: header.to_string(),
            dependencies,
            includes: Vec::new(),
            imports: BTreeMap::new(),
            needs_review: false,
            instantiation: None,
        }
    }

    /// Binder for an explicit template instantiation; named by its alias.
    #[must_use]
    pub fn for_instantiation(
        instantiation: Instantiation,
        module: ModuleRef,
        header: &str,
        dependencies: Vec<TypeDependency>,
    ) -> Self {
        Self {
            name: instantiation.alias().to_string(),
            declaration: instantiation.template().to_string(),
            instantiation: Some(instantiation),
            ..Self::new("", module, header, dependencies)
        }
    }

    /// Ordering and Python-facing name: the qualified declaration name, or
    /// the alias of an instantiation.
    #[must_use]
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Model declaration the binder is generated from (the class template for
    /// instantiations).
    #[must_use]
    #[inline]
    pub fn declaration(&self) -> &str {
        &self.declaration
    }

    #[must_use]
    #[inline]
    pub fn module(&self) -> &ModuleRef {
        &self.module
    }

    #[must_use]
    #[inline]
    pub fn header(&self) -> &str {
        &self.header
    }

    #[must_use]
    #[inline]
    pub fn dependencies(&self) -> &[TypeDependency] {
        &self.dependencies
    }

    #[must_use]
    #[inline]
    pub fn includes(&self) -> &[String] {
        &self.includes
    }

    pub(crate) fn set_includes(&mut self, includes: Vec<String>) {
        self.includes = includes;
    }

    #[must_use]
    #[inline]
    pub fn imports(&self) -> &BTreeMap<ModuleRef, Import> {
        &self.imports
    }

    pub(crate) fn clear_imports(&mut self) {
        self.imports.clear();
    }

    /// Record that `type_name` is used from `module` with the given deferrability.
    pub fn add_import(&mut self, module: ModuleRef, type_name: &str, deferrable: bool) {
        let import = self.imports.entry(module).or_insert_with(|| Import {
            kind: ImportKind::Direct,
            deferrable: true,
            types: BTreeSet::new(),
        });
        import.deferrable &= deferrable;
        import.types.insert(type_name.to_string());
    }

    pub fn defer_import(&mut self, module: &ModuleRef) {
        if let Some(import) = self.imports.get_mut(module) {
            import.kind = ImportKind::Deferred;
        }
    }

    /// Whether the binder took part in a type cycle the sorter could not order.
    #[must_use]
    #[inline]
    pub fn needs_review(&self) -> bool {
        self.needs_review
    }

    pub(crate) fn flag_for_review(&mut self) {
        self.needs_review = true;
    }

    #[must_use]
    #[inline]
    pub fn instantiation(&self) -> Option<&Instantiation> {
        self.instantiation.as_ref()
    }

    /// Names other binders use to refer to this one.
    pub(crate) fn provided_names(&self) -> Vec<String> {
        match &self.instantiation {
            Some(inst) => vec![inst.alias().to_string(), inst.spelling()],
            None => vec![self.name.clone()],
        }
    }

    /// Identifier-safe form of the name, used for unit files and bind functions.
    #[must_use]
    pub fn sanitized_name(&self) -> String {
        sanitize_name(&self.name)
    }
}

impl fmt::Display for Binder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]", self.name, self.module)
    }
}

/// Replace scope separators and any other non-identifier characters with `_`.
#[must_use]
pub fn sanitize_name(name: &str) -> String {
    name.replace("::", "_")
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect()
}
