//! `manifest.json`: the file set the packaging step consumes.

use crate::{GeneratorError, Result};
use binder::{Binder, ImportKind};
use catalog::ModuleRef;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// File name of the manifest inside the output directory.
pub const MANIFEST_FILE: &str = "manifest.json";

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    /// Python package the extension modules are installed under.
    pub package: String,
    /// Modules in sorted order.
    pub modules: Vec<ModuleManifest>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct ModuleManifest {
    /// Package-qualified module name, e.g. `OCCT.gp`.
    pub name: String,
    /// Module-init unit, relative to the output directory.
    pub init: String,
    /// Binder units in emission order, relative to the output directory.
    pub units: Vec<String>,
    pub imports: Vec<ImportManifest>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ImportManifest {
    pub module: String,
    /// `direct` or `deferred`.
    pub kind: String,
}

impl ModuleManifest {
    /// Entry for `module`, whose binders are given in emission order.
    #[must_use]
    pub fn new(module: &ModuleRef, init: String, units: Vec<String>, binders: &[&Binder]) -> Self {
        // A module imports another directly as soon as one binder does.
        let mut imports: BTreeMap<&ModuleRef, ImportKind> = BTreeMap::new();
        for (target, import) in binders.iter().flat_map(|b| b.imports()) {
            let kind = imports.entry(target).or_insert(import.kind());
            *kind = (*kind).min(import.kind());
        }
        Self {
            name: module.to_string(),
            init,
            units,
            imports: imports
                .into_iter()
                .map(|(module, kind)| ImportManifest {
                    module: module.to_string(),
                    kind: kind.to_string(),
                })
                .collect(),
        }
    }
}

impl Manifest {
    /// Serialize the manifest to a pretty JSON file.
    pub fn write_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).map_err(|err| GeneratorError::Io {
            path: path.to_path_buf(),
            message: err.to_string(),
        })?;
        crate::fs_utils::write_file(path, &(json + "\n"))
    }

    /// Every generated file, relative to the output directory.
    pub fn files(&self) -> impl Iterator<Item = &str> {
        self.modules
            .iter()
            .flat_map(|m| std::iter::once(m.init.as_str()).chain(m.units.iter().map(String::as_str)))
    }
}
