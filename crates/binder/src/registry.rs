//! The set of binders of one generation run.

use crate::binder::Binder;
use catalog::{DeclKind, DeclarationModel};
use common::Diagnostics;
use std::collections::{BTreeSet, HashMap};
use tracing::{debug, info};

/// Owns every [`Binder`] of a run, in emission order once sorted, plus the
/// structural diagnostics found while ordering them.
#[derive(Debug, Default)]
pub struct BinderRegistry {
    binders: Vec<Binder>,
    diagnostics: Diagnostics,
    /// Member names of every type cycle already reported, so re-sorting
    /// never repeats a diagnostic.
    reported_cycles: BTreeSet<Vec<String>>,
}

impl BinderRegistry {
    /// One binder per bindable declaration. Class templates are bound only
    /// through explicit instantiations.
    #[must_use]
    pub fn from_model(model: &DeclarationModel) -> Self {
        let binders: Vec<Binder> = model
            .bindable()
            .filter(|decl| !matches!(decl.kind(), DeclKind::Template(_)))
            .filter_map(|decl| {
                let module = decl.module()?.clone();
                Some(Binder::new(
                    decl.name(),
                    module,
                    decl.header(),
                    decl.dependencies().to_vec(),
                ))
            })
            .collect();
        info!("Registered {} binders", binders.len());
        Self::from_binders(binders)
    }

    #[must_use]
    pub fn from_binders(binders: Vec<Binder>) -> Self {
        Self {
            binders,
            diagnostics: Diagnostics::new(),
            reported_cycles: BTreeSet::new(),
        }
    }

    #[must_use]
    #[inline]
    pub fn binders(&self) -> &[Binder] {
        &self.binders
    }

    pub(crate) fn binders_mut(&mut self) -> &mut Vec<Binder> {
        &mut self.binders
    }

    #[must_use]
    #[inline]
    pub fn len(&self) -> usize {
        self.binders.len()
    }

    #[must_use]
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.binders.is_empty()
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Binder> {
        self.binders.iter().find(|b| b.name() == name)
    }

    /// Drop binders named like an instantiation binder of `instantiations`.
    ///
    /// `typedef NCollection_Array1<gp_Pnt> TColgp_Array1OfPnt` and the
    /// instantiation aliased `TColgp_Array1OfPnt` would otherwise share a unit.
    pub fn remove_superseded(&mut self, instantiations: &BinderRegistry) -> usize {
        let before = self.binders.len();
        self.binders.retain(|b| {
            let superseded = instantiations.get(b.name()).is_some();
            if superseded {
                debug!("{} is superseded by a template instantiation", b);
            }
            !superseded
        });
        before - self.binders.len()
    }

    /// Take over the binders of `instantiations` after dropping the typedef
    /// binders they supersede, then order the union.
    ///
    /// Their includes and imports stay as resolved by [`crate::bind_templates`].
    /// Re-sorting puts an instantiation ahead of every class built on it.
    pub fn merge_instantiations(&mut self, mut instantiations: BinderRegistry) -> usize {
        let superseded = self.remove_superseded(&instantiations);
        let added = instantiations.binders.len();
        self.binders.append(&mut instantiations.binders);
        self.diagnostics.merge(instantiations.take_diagnostics());
        self.reported_cycles.append(&mut instantiations.reported_cycles);
        self.sort_binders();
        info!("Merged {} instantiations, {} typedefs superseded", added, superseded);
        added
    }

    /// Every name a binder answers to, mapped to its position.
    pub(crate) fn name_index(&self) -> HashMap<String, usize> {
        let mut index = HashMap::new();
        for (i, binder) in self.binders.iter().enumerate() {
            for name in binder.provided_names() {
                index.entry(name).or_insert(i);
            }
        }
        index
    }

    #[must_use]
    #[inline]
    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub(crate) fn diagnostics_mut(&mut self) -> &mut Diagnostics {
        &mut self.diagnostics
    }

    /// Remember a cycle; `false` when it was reported before.
    pub(crate) fn mark_reported(&mut self, members: Vec<String>) -> bool {
        self.reported_cycles.insert(members)
    }

    /// Hand the structural diagnostics to the caller.
    pub fn take_diagnostics(&mut self) -> Diagnostics {
        std::mem::take(&mut self.diagnostics)
    }
}
