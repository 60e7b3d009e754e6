//! Header aggregation across all located sources.
//!
//! Each source root is listed one level deep: files directly in the root and
//! files inside its immediate subdirectories. Subdirectories are added to the
//! include path so nested headers resolve with a plain `#include <name>`.

use crate::{
    locate::LocatedSource,
    sources::{HeaderRules, ModuleRule},
    LocatorError, Result,
};
use common::{case_insensitive_key, sort_case_insensitive};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// One discovered header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    file: String,
    module: String,
    package: String,
    dir: PathBuf,
}

impl Header {
    #[must_use]
    pub fn new(file: String, module: String, package: String, dir: PathBuf) -> Self {
        Self {
            file,
            module,
            package,
            dir,
        }
    }

    /// File name as it appears in `#include <...>`.
    #[must_use]
    #[inline]
    pub fn file(&self) -> &str {
        &self.file
    }

    #[must_use]
    #[inline]
    pub fn module(&self) -> &str {
        &self.module
    }

    #[must_use]
    #[inline]
    pub fn package(&self) -> &str {
        &self.package
    }

    /// Directory the header was found in.
    #[must_use]
    #[inline]
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

/// Union of all discovered headers, minus ignored ones.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IncludeSet {
    /// package -> module names, each list case-insensitively sorted.
    packages: BTreeMap<String, Vec<String>>,
    /// Headers case-insensitively sorted by file name.
    headers: Vec<Header>,
    /// Include directories in discovery order, deduplicated.
    include_dirs: Vec<PathBuf>,
}

impl IncludeSet {
    /// Module names of every package, case-insensitively sorted.
    #[must_use]
    pub fn module_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .packages
            .values()
            .flatten()
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        sort_case_insensitive(&mut names);
        names
    }

    /// Module names grouped by package.
    #[must_use]
    #[inline]
    pub fn packages(&self) -> &BTreeMap<String, Vec<String>> {
        &self.packages
    }

    #[must_use]
    #[inline]
    pub fn headers(&self) -> &[Header] {
        &self.headers
    }

    /// Header file names in umbrella order.
    #[must_use]
    pub fn header_files(&self) -> Vec<&str> {
        self.headers.iter().map(Header::file).collect()
    }

    #[must_use]
    #[inline]
    pub fn include_dirs(&self) -> &[PathBuf] {
        &self.include_dirs
    }

    /// Headers whose module differs from the name derived from the file name
    /// (fixed-module sources). The declaration model needs these explicitly.
    #[must_use]
    pub fn module_overrides(&self) -> BTreeMap<String, (String, String)> {
        self.headers
            .iter()
            .filter(|h| module_of(h.file()) != h.module())
            .map(|h| (h.file.clone(), (h.package.clone(), h.module.clone())))
            .collect()
    }

    /// Append a directory to the include path unless already listed.
    pub fn push_include_dir(&mut self, dir: PathBuf) {
        if !self.include_dirs.contains(&dir) {
            self.include_dirs.push(dir);
        }
    }
}

/// Module a header belongs to by the target libraries' naming convention:
/// the text before the first underscore, or the extension-stripped stem.
#[must_use]
pub fn module_of(file: &str) -> String {
    match file.split_once('_') {
        Some((prefix, _)) => prefix.to_string(),
        None => file.split('.').next().unwrap_or(file).to_string(),
    }
}

/// Collect the headers of every located source.
///
/// `extra_ignored` extends every source's ignore list (configuration file
/// `-header` entries). Sources without header rules only contribute their
/// root to the include path. A header name found in two sources keeps its
/// first occurrence.
pub fn collect_includes(
    sources: &[LocatedSource],
    extra_ignored: &BTreeSet<String>,
) -> Result<IncludeSet> {
    let mut set = IncludeSet::default();
    let mut seen: HashSet<String> = HashSet::new();

    for source in sources {
        set.push_include_dir(source.root().to_path_buf());

        let Some(rules) = source.spec().headers else {
            continue;
        };

        let (files, subdirs) = list_headers(source.root(), &rules, extra_ignored)?;
        if files.is_empty() && source.spec().required {
            return Err(LocatorError::EmptyHeaderSet {
                name: source.spec().name.to_string(),
                path: source.root().to_path_buf(),
            });
        }
        for dir in subdirs {
            set.push_include_dir(dir);
        }

        let package = source.spec().package.to_string();
        let mut modules: BTreeSet<String> = BTreeSet::new();
        if let ModuleRule::Fixed(fixed) = rules.modules {
            modules.extend(fixed.iter().map(|m| m.to_string()));
        }

        let mut accepted = 0usize;
        for (file, dir) in files {
            if !seen.insert(file.clone()) {
                debug!("Skipping duplicate header {} in {}", file, dir.display());
                continue;
            }
            let module = assign_module(&file, rules.modules);
            if rules.modules == ModuleRule::Derived {
                modules.insert(module.clone());
            }
            set.headers
                .push(Header::new(file, module, package.clone(), dir));
            accepted += 1;
        }

        let mut modules: Vec<String> = modules.into_iter().collect();
        sort_case_insensitive(&mut modules);
        info!(
            "\t{}: {} headers, {} modules",
            source.spec().name,
            accepted,
            modules.len()
        );
        set.packages.entry(package).or_default().extend(modules);
    }

    set.headers
        .sort_by_cached_key(|h| case_insensitive_key(h.file()));
    Ok(set)
}

fn assign_module(file: &str, rule: ModuleRule) -> String {
    let derived = module_of(file);
    match rule {
        ModuleRule::Derived => derived,
        ModuleRule::Fixed(fixed) => {
            if fixed.contains(&derived.as_str()) {
                derived
            } else {
                fixed.first().map(|m| m.to_string()).unwrap_or(derived)
            }
        }
    }
}

/// List accepted header files of one source root and its immediate
/// subdirectories. Returns `(file, dir)` pairs and the subdirectories.
fn list_headers(
    root: &Path,
    rules: &HeaderRules,
    extra_ignored: &BTreeSet<String>,
) -> Result<(Vec<(String, PathBuf)>, Vec<PathBuf>)> {
    let mut files = Vec::new();
    let mut subdirs = Vec::new();

    for entry in sorted_entries(root)? {
        if entry.is_dir() {
            for nested in sorted_entries(&entry)? {
                if nested.is_file() {
                    if let Some(file) = accepted_file(&nested, rules, extra_ignored) {
                        files.push((file, entry.clone()));
                    }
                }
            }
            subdirs.push(entry);
        } else if let Some(file) = accepted_file(&entry, rules, extra_ignored) {
            files.push((file, root.to_path_buf()));
        }
    }

    Ok((files, subdirs))
}

fn accepted_file(
    path: &Path,
    rules: &HeaderRules,
    extra_ignored: &BTreeSet<String>,
) -> Option<String> {
    let name = path.file_name()?.to_str()?;
    let keep = rules.accepts_extension(name)
        && !rules.is_ignored(name)
        && !extra_ignored.contains(name);
    keep.then(|| name.to_string())
}

fn sorted_entries(dir: &Path) -> Result<Vec<PathBuf>> {
    let read_dir = fs::read_dir(dir).map_err(|e| LocatorError::ReadDir {
        path: dir.to_path_buf(),
        message: e.to_string(),
    })?;
    let mut entries: Vec<PathBuf> = read_dir.flatten().map(|e| e.path()).collect();
    entries.sort();
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::{Platform, SearchBase, SourceSpec, SOURCES};
    use tempfile::TempDir;

    fn touch(dir: &Path, name: &str) {
        fs::create_dir_all(dir).unwrap();
        fs::write(dir.join(name), "").unwrap();
    }

    fn source(name: &str, root: &Path) -> LocatedSource {
        let spec = *SOURCES.iter().find(|s| s.name == name).unwrap();
        LocatedSource::new(spec, root.to_path_buf())
    }

    #[test]
    fn module_name_from_underscore_or_stem() {
        assert_eq!(module_of("Foo_Bar.hxx"), "Foo");
        assert_eq!(module_of("Foo_Bar_Baz.hxx"), "Foo");
        assert_eq!(module_of("Standard.hxx"), "Standard");
        assert_eq!(module_of("mystdlib.h"), "mystdlib");
    }

    #[test]
    fn ignored_header_is_excluded_and_rest_sorted() {
        let tmp = TempDir::new().unwrap();
        for name in ["step.tab.hxx", "gp_Pnt.hxx", "BRep_Builder.hxx", "Adaptor3d_Curve.hxx"] {
            touch(tmp.path(), name);
        }

        let set = collect_includes(&[source("OCCT", tmp.path())], &BTreeSet::new()).unwrap();
        assert_eq!(
            set.header_files(),
            vec!["Adaptor3d_Curve.hxx", "BRep_Builder.hxx", "gp_Pnt.hxx"]
        );
        assert_eq!(set.module_names(), vec!["Adaptor3d", "BRep", "gp"]);
    }

    #[test]
    fn nested_headers_are_collected_one_level_deep() {
        let tmp = TempDir::new().unwrap();
        touch(&tmp.path().join("SMESH"), "SMESH_Mesh.hxx");
        touch(&tmp.path().join("SMDS"), "SMDS_Mesh.hxx");
        touch(&tmp.path().join("SMDS"), "memoire.h");
        touch(&tmp.path().join("SMDS/deeper"), "SMDS_Deep.hxx");

        let set = collect_includes(&[source("SMESH", tmp.path())], &BTreeSet::new()).unwrap();
        assert_eq!(set.header_files(), vec!["SMDS_Mesh.hxx", "SMESH_Mesh.hxx"]);
        assert!(set.include_dirs().contains(&tmp.path().join("SMDS")));
        assert!(set.include_dirs().contains(&tmp.path().join("SMESH")));
        assert_eq!(set.headers()[0].dir(), tmp.path().join("SMDS"));
    }

    #[test]
    fn fixed_modules_assign_first_module() {
        let tmp = TempDir::new().unwrap();
        touch(&tmp.path().join("core"), "ngcore.hpp");
        touch(&tmp.path().join("meshing"), "Mesh.hpp");

        let set = collect_includes(&[source("NETGEN", tmp.path())], &BTreeSet::new()).unwrap();
        assert_eq!(set.packages()["netgen"], vec!["Mesh", "OCCGeometry"]);
        let modules: Vec<_> = set.headers().iter().map(|h| (h.file(), h.module())).collect();
        assert_eq!(modules, vec![("Mesh.hpp", "Mesh"), ("ngcore.hpp", "OCCGeometry")]);
        assert!(set.module_overrides().contains_key("ngcore.hpp"));
        assert!(!set.module_overrides().contains_key("Mesh.hpp"));
    }

    #[test]
    fn extra_ignored_headers_apply_to_every_source() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "gp_Pnt.hxx");
        touch(tmp.path(), "OSD_Parallel.hxx");
        let extra: BTreeSet<String> = ["OSD_Parallel.hxx".to_string()].into();

        let set = collect_includes(&[source("OCCT", tmp.path())], &extra).unwrap();
        assert_eq!(set.header_files(), vec!["gp_Pnt.hxx"]);
    }

    #[test]
    fn empty_required_source_is_fatal() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "README.txt");
        let err = collect_includes(&[source("NETGEN", tmp.path())], &BTreeSet::new()).unwrap_err();
        assert!(matches!(err, LocatorError::EmptyHeaderSet { ref name, .. } if name == "NETGEN"));
    }

    #[test]
    fn include_only_sources_extend_search_path() {
        let tmp = TempDir::new().unwrap();
        let spec = SourceSpec {
            name: "TBB",
            package: "TBB",
            signature: "tbb.h",
            return_parent: false,
            required: false,
            platform: Platform::Any,
            base: SearchBase::Prefix,
            headers: None,
        };
        let set = collect_includes(
            &[LocatedSource::new(spec, tmp.path().to_path_buf())],
            &BTreeSet::new(),
        )
        .unwrap();
        assert!(set.headers().is_empty());
        assert_eq!(set.include_dirs(), [tmp.path().to_path_buf()]);
    }

    #[test]
    fn extra_include_dirs_are_appended_once() {
        let mut set = IncludeSet::default();
        set.push_include_dir(PathBuf::from("/repo/extra_includes"));
        set.push_include_dir(PathBuf::from("/repo/extra_includes"));
        assert_eq!(set.include_dirs(), [PathBuf::from("/repo/extra_includes")]);
    }

    #[test]
    fn ordering_is_case_insensitive_and_repeatable() {
        let tmp = TempDir::new().unwrap();
        for name in ["gp.hxx", "GeomAPI.hxx", "BRep_Tool.hxx", "bnd_Box.hxx", "Geom_Line.hxx"] {
            touch(tmp.path(), name);
        }
        let first = collect_includes(&[source("OCCT", tmp.path())], &BTreeSet::new()).unwrap();
        let second = collect_includes(&[source("OCCT", tmp.path())], &BTreeSet::new()).unwrap();

        assert_eq!(first, second);
        assert_eq!(
            first.header_files(),
            vec!["bnd_Box.hxx", "BRep_Tool.hxx", "Geom_Line.hxx", "GeomAPI.hxx", "gp.hxx"]
        );
        assert_eq!(first.module_names(), vec!["bnd", "BRep", "Geom", "GeomAPI", "gp"]);
    }
}
