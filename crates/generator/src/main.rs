use clap::Parser;
use common::config::PREFIX_ENV_VAR;
use common::{Config, RunSummary};
use generator::{run, GeneratorError};
use std::path::PathBuf;
use std::{env, process};
use tracing::error;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::parse();
    let mut summary = RunSummary::new("SMESH binder");

    let report = env::var_os(PREFIX_ENV_VAR)
        .map(PathBuf::from)
        .ok_or(GeneratorError::MissingEnv(PREFIX_ENV_VAR))
        .and_then(|prefix| run(&config, &prefix));

    match report {
        Ok(report) => {
            summary.record_modules(report.manifest.modules.len());
            summary.record_binders(report.binders);
            summary.record_instantiations(report.instantiations);
            summary.record_deferred_imports(report.deferred_imports);
            summary.finish(report.diagnostics);
        }
        Err(e) => {
            error!("{}", e);
            process::exit(1);
        }
    }
}
