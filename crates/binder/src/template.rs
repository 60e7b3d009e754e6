//! Explicit class template instantiations.

use crate::binder::Binder;
use crate::registry::BinderRegistry;
use crate::ResolveError;
use catalog::{identifiers, is_builtin, DeclKind, DeclarationModel, ModuleRef, TypeDependency, Usage};
use common::DiagnosticKind;
use parser::Instantiation;
use std::collections::BTreeMap;
use tracing::{info, warn};

/// Class template spelled by `Handle(T)` after sanitizing.
const HANDLE_TEMPLATE: &str = "opencascade::handle";

/// Build, order and import-resolve one binder per valid instantiation.
///
/// Invalid instantiations are skipped with an
/// [`DiagnosticKind::UnresolvedInstantiation`] diagnostic on the returned
/// registry. Ordering and import resolution only see instantiation binders.
pub fn bind_templates(
    model: &DeclarationModel,
    instantiations: &[Instantiation],
) -> Result<BinderRegistry, ResolveError> {
    let mut binders = Vec::new();
    let mut skipped = Vec::new();
    for inst in instantiations {
        match instantiate(model, inst) {
            Ok(binder) => binders.push(binder),
            Err(reason) => {
                warn!("Skipping {}: {}", inst, reason);
                skipped.push((inst.to_string(), reason));
            }
        }
    }
    info!("Instantiated {} of {} templates", binders.len(), instantiations.len());

    let mut registry = BinderRegistry::from_binders(binders);
    for (subject, reason) in skipped {
        registry
            .diagnostics_mut()
            .push(DiagnosticKind::UnresolvedInstantiation, subject, reason);
    }
    registry.sort_binders();
    registry.build_includes(model);
    registry.build_imports(model);
    registry.check_circular()?;
    Ok(registry)
}

fn instantiate(model: &DeclarationModel, inst: &Instantiation) -> Result<Binder, String> {
    let template = model
        .get(inst.template())
        .ok_or_else(|| format!("unknown class template {}", inst.template()))?;
    let DeclKind::Template(decl) = template.kind() else {
        return Err(format!("{} is not a class template", template.name()));
    };
    if !template.is_bindable() {
        return Err(format!("class template {} is not bindable", template.name()));
    }
    if decl.params.len() != inst.args().len() {
        return Err(format!(
            "{} expects {} template argument(s), got {}",
            template.name(),
            decl.params.len(),
            inst.args().len()
        ));
    }
    let Some(template_module) = template.module() else {
        return Err(format!("class template {} has no module", template.name()));
    };

    let mut strongest: BTreeMap<String, Usage> = template
        .dependencies()
        .iter()
        .map(|dep| (dep.name.clone(), dep.usage))
        .collect();
    for arg in inst.args() {
        let usage = if arg.ends_with('*') || arg.contains(HANDLE_TEMPLATE) {
            Usage::Pointer
        } else {
            Usage::Value
        };
        for ident in identifiers(arg) {
            if is_builtin(&ident) || ident == HANDLE_TEMPLATE {
                continue;
            }
            let resolved = model
                .resolve(template.scope(), &ident)
                .ok_or_else(|| format!("unknown type {ident} in argument {arg}"))?;
            let entry = strongest.entry(resolved.name().to_string()).or_insert(usage);
            *entry = (*entry).max(usage);
        }
    }
    strongest.remove(template.name());

    let module = match inst.module() {
        Some(module) => ModuleRef::new(template_module.package.as_str(), module),
        None => template_module.clone(),
    };
    let dependencies = strongest
        .into_iter()
        .map(|(name, usage)| TypeDependency { name, usage })
        .collect();
    Ok(Binder::for_instantiation(inst.clone(), module, template.header(), dependencies))
}
