//! Parsed binder configuration.

use crate::{
    directive::{BindKind, Directive, Instantiation},
    error::ParserError,
    ConfigParser, Lexeme, Result, Rule,
};
use pest::{iterators::Pair, Parser};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;
use tracing::{debug, info};

/// Which declaration kinds are bound. Every kind is enabled by default.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BindToggles {
    disabled: BTreeSet<BindKind>,
}

impl BindToggles {
    #[must_use]
    #[inline]
    pub fn is_enabled(&self, kind: BindKind) -> bool {
        !self.disabled.contains(&kind)
    }

    pub fn set(&mut self, kind: BindKind, enable: bool) {
        if enable {
            self.disabled.remove(&kind);
        } else {
            self.disabled.insert(kind);
        }
    }
}

/// Everything the configuration file selects.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BinderConfig {
    toggles: BindToggles,
    included_modules: BTreeSet<String>,
    excluded_modules: BTreeSet<String>,
    excluded_headers: BTreeSet<String>,
    excluded: BTreeMap<BindKind, BTreeSet<String>>,
    instantiations: Vec<Instantiation>,
}

impl BinderConfig {
    /// Read and parse a configuration file.
    ///
    /// # Return errors
    /// A missing file, a syntax error (with pest's position message) or a
    /// duplicate template alias.
    pub fn parse(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(ParserError::MissingFile(path.display().to_string()));
        }
        let unparsed = fs::read_to_string(path)?;
        let config = Self::from_source(&unparsed, &path.display().to_string())?;
        info!(
            "Loaded configuration {}: {} instantiations, {} excluded declarations",
            path.display(),
            config.instantiations.len(),
            config.excluded.values().map(BTreeSet::len).sum::<usize>()
        );
        Ok(config)
    }

    /// Parse configuration text; `origin` names the source in error messages.
    pub fn from_source(src: &str, origin: &str) -> Result<Self> {
        let parsed = ConfigParser::parse(Rule::main_grammar, src)
            .map_err(|e| ParserError::Syntax {
                file: origin.to_string(),
                message: e.to_string(),
            })?
            .next()
            .ok_or_else(|| ParserError::Syntax {
                file: origin.to_string(),
                message: "empty parse tree".to_string(),
            })?;
        Self::from_parsed_rule(parsed)
    }

    /// Apply one directive. Later directives override earlier toggles.
    pub fn apply(&mut self, directive: Directive) -> Result<()> {
        debug!("Configuration directive: {:?}", directive);
        match directive {
            Directive::Bind { enable, kind } => self.toggles.set(kind, enable),
            Directive::Module { include: true, name } => {
                self.included_modules.insert(name);
            }
            Directive::Module {
                include: false,
                name,
            } => {
                self.excluded_modules.insert(name);
            }
            Directive::Header(file) => {
                self.excluded_headers.insert(file);
            }
            Directive::Exclude { kind, name } => {
                self.excluded.entry(kind).or_default().insert(name);
            }
            Directive::Template(inst) => {
                if self.instantiations.iter().any(|i| i.alias() == inst.alias()) {
                    return Err(ParserError::DuplicateAlias(inst.alias().to_string()));
                }
                self.instantiations.push(inst);
            }
        }
        Ok(())
    }

    #[must_use]
    #[inline]
    pub fn toggles(&self) -> &BindToggles {
        &self.toggles
    }

    #[must_use]
    #[inline]
    pub fn is_enabled(&self, kind: BindKind) -> bool {
        self.toggles.is_enabled(kind)
    }

    /// Whether declarations of `module` are bound. With any `+module`
    /// present, only whitelisted modules are selected.
    #[must_use]
    pub fn selects_module(&self, module: &str) -> bool {
        if self.excluded_modules.contains(module) {
            return false;
        }
        self.included_modules.is_empty() || self.included_modules.contains(module)
    }

    /// Whether the declaration `name` of `kind` was excluded by name.
    #[must_use]
    pub fn is_excluded(&self, kind: BindKind, name: &str) -> bool {
        self.excluded
            .get(&kind)
            .is_some_and(|names| names.contains(name.trim_start_matches("::")))
    }

    /// Headers added to every source's ignore list.
    #[must_use]
    #[inline]
    pub fn excluded_headers(&self) -> &BTreeSet<String> {
        &self.excluded_headers
    }

    #[must_use]
    #[inline]
    pub fn instantiations(&self) -> &[Instantiation] {
        &self.instantiations
    }
}

impl Lexeme for BinderConfig {
    fn from_parsed_rule(parsed_rule: Pair<Rule>) -> Result<Self> {
        let mut config = Self::default();
        for pair in parsed_rule.into_inner() {
            if pair.as_rule() == Rule::EOI {
                continue;
            }
            config.apply(Directive::from_parsed_rule(pair)?)?;
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn defaults_bind_everything() {
        let config = BinderConfig::from_source("", "config.txt").unwrap();
        assert!(BindKind::ALL.iter().all(|k| config.is_enabled(*k)));
        assert!(config.selects_module("gp"));
        assert!(config.instantiations().is_empty());
    }

    #[test]
    fn later_toggle_wins() {
        let config =
            BinderConfig::from_source("-bind typedefs\n+bind typedefs\n-bind enums\n", "t").unwrap();
        assert!(config.is_enabled(BindKind::Typedefs));
        assert!(!config.is_enabled(BindKind::Enums));
    }

    #[test]
    fn module_whitelist_and_exclusion() {
        let config = BinderConfig::from_source("+module SMDS\n+module SMESH\n-module SMESH\n", "t")
            .unwrap();
        assert!(config.selects_module("SMDS"));
        assert!(!config.selects_module("SMESH"));
        assert!(!config.selects_module("gp"));
    }

    #[test]
    fn exclusions_by_kind() {
        let src = "-class SMESH_Gen::TAlgoStateError  # nested\n-function ::Foo\n";
        let config = BinderConfig::from_source(src, "t").unwrap();
        assert!(config.is_excluded(BindKind::Classes, "SMESH_Gen::TAlgoStateError"));
        assert!(config.is_excluded(BindKind::Functions, "Foo"));
        assert!(config.is_excluded(BindKind::Functions, "::Foo"));
        assert!(!config.is_excluded(BindKind::Enums, "Foo"));
    }

    #[test]
    fn duplicate_alias_is_rejected() {
        let src = "+template A<int> as X\n+template B<int> as X\n";
        assert_eq!(
            BinderConfig::from_source(src, "t"),
            Err(ParserError::DuplicateAlias("X".into()))
        );
    }

    #[test]
    fn syntax_error_names_file() {
        let err = BinderConfig::from_source("+bind structs\n", "config.txt").unwrap_err();
        match err {
            ParserError::Syntax { file, message } => {
                assert_eq!(file, "config.txt");
                assert!(message.contains("1:"));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn parse_reads_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "# comment only").unwrap();
        writeln!(file, "-header OSD_Parallel.hxx").unwrap();
        let config = BinderConfig::parse(file.path()).unwrap();
        assert!(config.excluded_headers().contains("OSD_Parallel.hxx"));
    }

    #[test]
    fn missing_file_is_reported() {
        let err = BinderConfig::parse(Path::new("/nonexistent/config.txt")).unwrap_err();
        assert_eq!(err.to_string(), "Configuration file not found: /nonexistent/config.txt");
    }
}
