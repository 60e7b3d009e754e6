//! Include lists and cross-module imports of binders.

use crate::registry::BinderRegistry;
use catalog::{DeclKind, DeclarationModel, ModuleRef};
use common::sort_case_insensitive;
use std::collections::BTreeSet;
use tracing::info;

impl BinderRegistry {
    /// Own header plus the headers of every direct type dependency, sorted
    /// case-insensitively without duplicates.
    pub fn build_includes(&mut self, model: &DeclarationModel) {
        let index = self.name_index();
        let headers: Vec<Vec<String>> = self
            .binders()
            .iter()
            .map(|binder| {
                let mut headers: BTreeSet<String> = BTreeSet::from([binder.header().to_string()]);
                for dep in binder.dependencies() {
                    let header = match index.get(&dep.name) {
                        Some(&i) => Some(self.binders()[i].header()),
                        None => model.get(&dep.name).map(|d| d.header()),
                    };
                    headers.extend(header.map(str::to_string));
                }
                let mut headers: Vec<String> = headers.into_iter().collect();
                sort_case_insensitive(&mut headers);
                headers
            })
            .collect();

        for (binder, includes) in self.binders_mut().iter_mut().zip(headers) {
            binder.set_includes(includes);
        }
    }

    /// Modules other than its own whose bound declarations each binder uses.
    ///
    /// Every import starts direct. An import is deferrable when every use of
    /// the module goes through a pointer or reference.
    pub fn build_imports(&mut self, model: &DeclarationModel) {
        let index = self.name_index();
        let targets: Vec<Vec<(ModuleRef, String, bool)>> = self
            .binders()
            .iter()
            .map(|binder| {
                binder
                    .dependencies()
                    .iter()
                    .filter_map(|dep| {
                        let module = match index.get(&dep.name) {
                            Some(&i) => self.binders()[i].module().clone(),
                            None => model
                                .get(&dep.name)
                                .filter(|d| d.is_bindable() && !matches!(d.kind(), DeclKind::Template(_)))?
                                .module()?
                                .clone(),
                        };
                        (module != *binder.module()).then(|| (module, dep.name.clone(), dep.usage.is_deferrable()))
                    })
                    .collect()
            })
            .collect();

        let mut count = 0usize;
        for (binder, targets) in self.binders_mut().iter_mut().zip(targets) {
            binder.clear_imports();
            for (module, name, deferrable) in targets {
                binder.add_import(module, &name, deferrable);
            }
            count += binder.imports().len();
        }
        info!("Built {} module imports", count);
    }
}

#[cfg(test)]
mod tests {
    use crate::binder::ImportKind;
    use crate::registry::BinderRegistry;
    use catalog::{DeclarationModel, ModuleRef, Namespace};
    use parser::BinderConfig;
    use std::collections::BTreeMap;

    fn model() -> DeclarationModel {
        let namespace = Namespace::new(
            BTreeMap::from([(
                "OCCT".to_string(),
                vec!["gp".to_string(), "Geom".to_string(), "TopoDS".to_string()],
            )]),
            BTreeMap::new(),
        );
        let mut model = DeclarationModel::from_sources(
            [
                ("gp_Pnt.hxx", "class gp_Pnt { public: double X() const; };"),
                ("gp_Ax1.hxx", "class gp_Ax1 { public: const gp_Pnt& Location() const; };"),
                (
                    "Geom_Point.hxx",
                    "class Geom_Point { public: gp_Pnt Pnt() const; void SetAxis(const gp_Ax1& a); };",
                ),
                ("Geom_Axis.hxx", "class Geom_Axis { public: const gp_Ax1& Axis() const; };"),
                ("TopoDS_Shape.hxx", "class TopoDS_Shape { public: void Hidden(const Geom_Axis* a); };"),
            ],
            &namespace,
        )
        .unwrap();
        model.apply_config(&BinderConfig::default());
        model
    }

    fn registry(model: &DeclarationModel) -> BinderRegistry {
        let mut registry = BinderRegistry::from_model(model);
        registry.build_includes(model);
        registry.build_imports(model);
        registry
    }

    #[test]
    fn includes_cover_dependency_headers() {
        let model = model();
        let registry = registry(&model);
        assert_eq!(
            registry.get("Geom_Point").unwrap().includes(),
            ["Geom_Point.hxx", "gp_Ax1.hxx", "gp_Pnt.hxx"]
        );
        assert_eq!(registry.get("gp_Pnt").unwrap().includes(), ["gp_Pnt.hxx"]);
    }

    #[test]
    fn imports_exclude_own_module_and_track_deferrability() {
        let model = model();
        let registry = registry(&model);
        let gp = ModuleRef::new("OCCT", "gp");

        assert!(registry.get("gp_Ax1").unwrap().imports().is_empty());

        let point = &registry.get("Geom_Point").unwrap().imports()[&gp];
        assert_eq!(point.kind(), ImportKind::Direct);
        assert!(!point.is_deferrable());
        assert_eq!(point.types().iter().collect::<Vec<_>>(), ["gp_Ax1", "gp_Pnt"]);

        let axis = &registry.get("Geom_Axis").unwrap().imports()[&gp];
        assert!(axis.is_deferrable());

        let shape = registry.get("TopoDS_Shape").unwrap().imports();
        assert!(shape[&ModuleRef::new("OCCT", "Geom")].is_deferrable());
    }
}
