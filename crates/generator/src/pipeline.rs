//! One generation run, from include discovery to the written output tree.

use crate::emit::Emitter;
use crate::manifest::Manifest;
use crate::{GeneratorError, Result};
use binder::{bind_templates, BinderRegistry};
use catalog::{DeclarationModel, Namespace};
use common::{Config, Diagnostics};
use locator::{collect_includes, locate_sources, write_umbrella, SearchRoots, SourceSpec, SOURCES};
use parser::BinderConfig;
use std::path::Path;
use tracing::info;

/// What a successful run produced.
#[derive(Debug)]
pub struct RunReport {
    pub manifest: Manifest,
    pub binders: usize,
    pub instantiations: usize,
    pub deferred_imports: usize,
    /// Every non-fatal finding of the run, parse-level findings first.
    pub diagnostics: Diagnostics,
}

/// Run the whole pipeline against the dependency table of this platform.
pub fn run(config: &Config, search_root: &Path) -> Result<RunReport> {
    run_with_sources(config, search_root, SOURCES)
}

/// Run the whole pipeline against an explicit dependency table.
///
/// `search_root` is the environment prefix; the pyOCCT checkout comes from
/// `config`. Nothing is written before every required dependency has been
/// located.
pub fn run_with_sources(config: &Config, search_root: &Path, sources: &[SourceSpec]) -> Result<RunReport> {
    if !config.root().is_dir() {
        return Err(GeneratorError::RootMissing(config.root().to_path_buf()));
    }
    let binder_config = BinderConfig::parse(config.config_path())?;

    let roots = SearchRoots::new(search_root, config.pyocct_path());
    let located = locate_sources(&roots, sources)?;
    let mut includes = collect_includes(&located, binder_config.excluded_headers())?;
    let extra = config.extra_includes_path();
    if extra.is_dir() {
        info!("Extra include directory: {}", extra.display());
        includes.push_include_dir(extra);
    }
    let umbrella = config.umbrella_path();
    write_umbrella(&umbrella, &includes)?;

    info!("Parsing headers...");
    let namespace = Namespace::from_includes(&includes);
    let mut model = DeclarationModel::parse(&umbrella, includes.include_dirs(), &namespace)?;

    info!("Traversing headers...");
    model.apply_config(&binder_config);
    let mut registry = BinderRegistry::from_model(&model);

    info!("Sorting binders...");
    registry.sort_binders();

    info!("Building includes...");
    registry.build_includes(&model);

    info!("Building imports...");
    registry.build_imports(&model);

    info!("Checking circular imports...");
    let module_graph = registry.check_circular()?;

    info!("Binding templates...");
    let templates = bind_templates(&model, binder_config.instantiations())?;
    let instantiations = registry.merge_instantiations(templates);

    info!("Binding...");
    let manifest = Emitter::new(&config.output_path(), config.package(), &model).emit_all(&registry)?;
    info!("Done!");

    let mut diagnostics = model.take_diagnostics();
    diagnostics.merge(registry.take_diagnostics());
    Ok(RunReport {
        manifest,
        binders: registry.len() - instantiations,
        instantiations,
        deferred_imports: module_graph.deferred().len(),
        diagnostics,
    })
}
