//! Package and module assignment of headers.

use crate::decl::ModuleRef;
use locator::{module_of, IncludeSet};
use std::collections::BTreeMap;

/// package → module names, plus explicit header → module assignments for
/// headers whose derived module name is not listed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Namespace {
    packages: BTreeMap<String, Vec<String>>,
    headers: BTreeMap<String, ModuleRef>,
}

impl Namespace {
    #[must_use]
    pub fn new(packages: BTreeMap<String, Vec<String>>, headers: BTreeMap<String, ModuleRef>) -> Self {
        Self { packages, headers }
    }

    /// Namespace of everything the include aggregator found.
    #[must_use]
    pub fn from_includes(includes: &IncludeSet) -> Self {
        let headers = includes
            .module_overrides()
            .into_iter()
            .map(|(file, (package, module))| (file, ModuleRef::new(package, module)))
            .collect();
        Self::new(includes.packages().clone(), headers)
    }

    #[must_use]
    #[inline]
    pub fn packages(&self) -> &BTreeMap<String, Vec<String>> {
        &self.packages
    }

    /// Every module, package by package.
    pub fn modules(&self) -> impl Iterator<Item = ModuleRef> + '_ {
        self.packages
            .iter()
            .flat_map(|(package, modules)| modules.iter().map(move |m| ModuleRef::new(package.as_str(), m.as_str())))
    }

    /// Module owning declarations of `header`: the derived module name when a
    /// package lists it, otherwise the explicit assignment.
    #[must_use]
    pub fn module_for_header(&self, header: &str) -> Option<ModuleRef> {
        let derived = module_of(header);
        self.packages
            .iter()
            .find(|(_, modules)| modules.contains(&derived))
            .map(|(package, _)| ModuleRef::new(package.as_str(), derived.as_str()))
            .or_else(|| self.headers.get(header).cloned())
    }
}
