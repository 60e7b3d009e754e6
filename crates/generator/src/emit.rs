//! Writes the generated C++ tree: one unit per binder, one module-init unit
//! per module and the manifest.

use crate::fs_utils::write_file;
use crate::manifest::{Manifest, ModuleManifest, MANIFEST_FILE};
use crate::Result;
use binder::glue::{bind_function, forward_declarations, render_glue};
use binder::{Binder, BinderRegistry, ImportKind};
use catalog::{DeclarationModel, ModuleRef};
use std::collections::BTreeMap;
use std::fmt::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const INDENT: &str = "    ";

/// Renders and writes units below one output directory.
pub struct Emitter<'a> {
    output: PathBuf,
    package: String,
    model: &'a DeclarationModel,
}

impl<'a> Emitter<'a> {
    #[must_use]
    pub fn new(output: &Path, package: &str, model: &'a DeclarationModel) -> Self {
        Self {
            output: output.to_path_buf(),
            package: package.to_string(),
            model,
        }
    }

    /// Header every unit includes first, e.g. `pySMESH_Common.hxx`.
    #[must_use]
    pub fn common_header(&self) -> String {
        format!("py{}_Common.hxx", self.package)
    }

    /// `<package>/<module>/<file>.cxx`, relative to the output directory.
    #[must_use]
    pub fn unit_file(binder: &Binder) -> String {
        let module = binder.module();
        format!("{}/{}/{}.cxx", module.package, module.module, binder.sanitized_name())
    }

    /// `<package>/<module>.cxx`, relative to the output directory.
    #[must_use]
    pub fn module_file(module: &ModuleRef) -> String {
        format!("{}/{}.cxx", module.package, module.module)
    }

    /// Complete unit for `binder`.
    #[must_use]
    pub fn render_unit(&self, binder: &Binder) -> String {
        let mut out = format!("#include <{}>\n", self.common_header());

        if !binder.includes().is_empty() {
            out.push('\n');
            for header in binder.includes() {
                let _ = writeln!(out, "#include <{header}>");
            }
        }

        let forward = forward_declarations(binder, self.model);
        if !forward.is_empty() {
            out.push('\n');
            for line in forward {
                let _ = writeln!(out, "{line}");
            }
        }

        let _ = write!(out, "\nvoid {}(py::module_ &mod) {{\n", bind_function(binder));
        let direct: Vec<&ModuleRef> = binder
            .imports()
            .iter()
            .filter(|(_, import)| import.kind() == ImportKind::Direct)
            .map(|(module, _)| module)
            .collect();
        if !direct.is_empty() {
            for module in direct {
                let _ = writeln!(out, "{INDENT}py::module_::import(\"{module}\");");
            }
            out.push('\n');
        }
        out.push_str(&render_glue(binder, self.model));
        out.push_str("}\n");
        out
    }

    /// Module-init unit declaring and calling every binder function in order.
    #[must_use]
    pub fn render_module(&self, module: &ModuleRef, binders: &[&Binder]) -> String {
        let mut out = format!("#include <{}>\n\n", self.common_header());
        for binder in binders {
            let _ = writeln!(out, "void {}(py::module_ &mod);", bind_function(binder));
        }
        let _ = write!(out, "\nPYBIND11_MODULE({}, mod) {{\n", module.module);
        for binder in binders {
            let _ = writeln!(out, "{INDENT}{}(mod);", bind_function(binder));
        }
        out.push_str("}\n");
        out
    }

    /// Write the unit of `binder`, returning its path relative to the output directory.
    pub fn emit(&self, binder: &Binder) -> Result<String> {
        let file = Self::unit_file(binder);
        debug!("Writing {}", file);
        write_file(&self.output.join(&file), &self.render_unit(binder))?;
        Ok(file)
    }

    /// Emit every binder of `registry`, in order, then the module-init
    /// units and the manifest.
    pub fn emit_all(&self, registry: &BinderRegistry) -> Result<Manifest> {
        let mut modules: BTreeMap<&ModuleRef, (Vec<&Binder>, Vec<String>)> = BTreeMap::new();
        for binder in registry.binders() {
            let file = self.emit(binder)?;
            let (binders, units) = modules.entry(binder.module()).or_default();
            binders.push(binder);
            units.push(file);
        }

        let mut manifest = Manifest {
            package: self.package.clone(),
            modules: Vec::with_capacity(modules.len()),
        };
        for (module, (binders, units)) in modules {
            let init = Self::module_file(module);
            write_file(&self.output.join(&init), &self.render_module(module, &binders))?;
            manifest
                .modules
                .push(ModuleManifest::new(module, init, units, &binders));
        }
        manifest.write_json(&self.output.join(MANIFEST_FILE))?;
        info!(
            "Wrote {} units in {} modules to {}",
            manifest.files().count(),
            manifest.modules.len(),
            self.output.display()
        );
        Ok(manifest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use catalog::Namespace;
    use parser::BinderConfig;
    use tempfile::TempDir;

    fn model() -> DeclarationModel {
        let namespace = Namespace::new(
            BTreeMap::from([(
                "OCCT".to_string(),
                vec!["gp".to_string(), "Geom".to_string()],
            )]),
            BTreeMap::new(),
        );
        let mut model = DeclarationModel::from_sources(
            [
                ("gp_Pnt.hxx", "class gp_Pnt { public: double X() const; };"),
                (
                    "Geom_Point.hxx",
                    "class Geom_Point { public: gp_Pnt Pnt() const; };",
                ),
            ],
            &namespace,
        )
        .unwrap();
        model.apply_config(&BinderConfig::default());
        model
    }

    fn registry(model: &DeclarationModel) -> BinderRegistry {
        let mut registry = BinderRegistry::from_model(model);
        registry.sort_binders();
        registry.build_includes(model);
        registry.build_imports(model);
        registry.check_circular().unwrap();
        registry
    }

    #[test]
    fn unit_has_common_header_includes_imports_and_glue() {
        let model = model();
        let registry = registry(&model);
        let emitter = Emitter::new(Path::new("out"), "SMESH", &model);
        let unit = emitter.render_unit(registry.get("Geom_Point").unwrap());
        assert_eq!(
            unit,
            "#include <pySMESH_Common.hxx>\n\
             \n\
             #include <Geom_Point.hxx>\n\
             #include <gp_Pnt.hxx>\n\
             \n\
             void bind_Geom_Point(py::module_ &mod) {\n\
             \x20   py::module_::import(\"OCCT.gp\");\n\
             \n\
             \x20   py::class_<Geom_Point> cls(mod, \"Geom_Point\");\n\
             \x20   cls.def(py::init<>());\n\
             \x20   cls.def(\"Pnt\", &Geom_Point::Pnt);\n\
             }\n"
        );
    }

    #[test]
    fn module_init_calls_binders_in_order() {
        let model = model();
        let registry = registry(&model);
        let emitter = Emitter::new(Path::new("out"), "SMESH", &model);
        let binders: Vec<&Binder> = registry.binders().iter().collect();
        let init = emitter.render_module(&ModuleRef::new("OCCT", "gp"), &binders[..1]);
        assert_eq!(
            init,
            "#include <pySMESH_Common.hxx>\n\
             \n\
             void bind_gp_Pnt(py::module_ &mod);\n\
             \n\
             PYBIND11_MODULE(gp, mod) {\n\
             \x20   bind_gp_Pnt(mod);\n\
             }\n"
        );
    }

    #[test]
    fn emit_all_writes_units_inits_and_manifest() {
        let tmp = TempDir::new().unwrap();
        let model = model();
        let registry = registry(&model);
        let manifest = Emitter::new(tmp.path(), "SMESH", &model)
            .emit_all(&registry)
            .unwrap();

        let files: Vec<&str> = manifest.files().collect();
        assert_eq!(
            files,
            vec!["OCCT/Geom.cxx", "OCCT/Geom/Geom_Point.cxx", "OCCT/gp.cxx", "OCCT/gp/gp_Pnt.cxx"]
        );
        for file in files {
            assert!(tmp.path().join(file).is_file(), "{file}");
        }
        assert!(tmp.path().join(MANIFEST_FILE).is_file());
        assert_eq!(manifest.modules[0].imports[0].module, "OCCT.gp");
    }
}
