//! Include directory discovery.

use crate::{
    sources::{SearchBase, SourceSpec},
    LocatorError, Result,
};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use walkdir::WalkDir;

/// Find the directory holding `signature`, searching `search_root` depth-first.
///
/// Directories are visited in file-name order and a directory's own files are
/// checked before its subdirectories. With `return_parent` the parent of the
/// matching directory is returned instead. Returns `None` when the signature
/// file does not occur anywhere below `search_root`.
#[must_use]
pub fn find_include_root(signature: &str, search_root: &Path, return_parent: bool) -> Option<PathBuf> {
    let dir = WalkDir::new(search_root)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_dir())
        .find(|e| e.path().join(signature).is_file())?
        .into_path();

    debug!("Found {} in {}", signature, dir.display());
    if return_parent {
        dir.parent().map(Path::to_path_buf)
    } else {
        Some(dir)
    }
}

/// Directories the sources are searched in, one per [`SearchBase`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRoots {
    pub prefix: PathBuf,
    pub bindings: PathBuf,
}

impl SearchRoots {
    #[must_use]
    pub fn new(prefix: impl Into<PathBuf>, bindings: impl Into<PathBuf>) -> Self {
        Self {
            prefix: prefix.into(),
            bindings: bindings.into(),
        }
    }

    #[must_use]
    pub fn get(&self, base: SearchBase) -> &Path {
        match base {
            SearchBase::Prefix => &self.prefix,
            SearchBase::Bindings => &self.bindings,
        }
    }
}

/// A source whose include root was found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocatedSource {
    spec: SourceSpec,
    root: PathBuf,
}

impl LocatedSource {
    #[must_use]
    pub fn new(spec: SourceSpec, root: PathBuf) -> Self {
        Self { spec, root }
    }

    #[must_use]
    #[inline]
    pub fn spec(&self) -> &SourceSpec {
        &self.spec
    }

    #[must_use]
    #[inline]
    pub fn root(&self) -> &Path {
        &self.root
    }
}

/// Locate every source that applies to the current platform.
///
/// Optional sources that are not found are skipped. A required source that is
/// not found is a fatal configuration error naming the source.
pub fn locate_sources(roots: &SearchRoots, specs: &[SourceSpec]) -> Result<Vec<LocatedSource>> {
    let mut located = Vec::new();

    info!("Include directories:");
    for spec in specs.iter().filter(|s| s.platform.is_current()) {
        let root = find_include_root(spec.signature, roots.get(spec.base), spec.return_parent);
        match root {
            Some(root) if root.exists() => {
                info!("\t{}: {}", spec.name, root.display());
                located.push(LocatedSource::new(*spec, root));
            }
            root if spec.required => {
                return Err(LocatorError::MissingIncludePath {
                    name: spec.name.to_string(),
                    path: root
                        .map(|p| p.display().to_string())
                        .unwrap_or_else(|| "None".to_string()),
                });
            }
            _ => info!("\t{}: None", spec.name),
        }
    }

    Ok(located)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::{Platform, SOURCES};
    use std::fs;
    use tempfile::TempDir;

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "").unwrap();
    }

    #[test]
    fn finds_directory_of_signature() {
        let tmp = TempDir::new().unwrap();
        touch(&tmp.path().join("include/opencascade/Standard.hxx"));

        let found = find_include_root("Standard.hxx", tmp.path(), false);
        assert_eq!(found, Some(tmp.path().join("include/opencascade")));
    }

    #[test]
    fn returns_parent_when_requested() {
        let tmp = TempDir::new().unwrap();
        touch(&tmp.path().join("include/smesh/SMESH/SMESH_SMESH.hxx"));

        let found = find_include_root("SMESH_SMESH.hxx", tmp.path(), true);
        assert_eq!(found, Some(tmp.path().join("include/smesh")));
    }

    #[test]
    fn first_match_in_name_order_wins() {
        let tmp = TempDir::new().unwrap();
        touch(&tmp.path().join("b/tbb.h"));
        touch(&tmp.path().join("a/nested/tbb.h"));

        let found = find_include_root("tbb.h", tmp.path(), false);
        assert_eq!(found, Some(tmp.path().join("a/nested")));
    }

    #[test]
    fn missing_signature_is_absent() {
        let tmp = TempDir::new().unwrap();
        touch(&tmp.path().join("include/other.hxx"));
        assert_eq!(find_include_root("Standard.hxx", tmp.path(), false), None);
    }

    #[test]
    fn missing_kernel_names_the_source() {
        let tmp = TempDir::new().unwrap();
        let err = locate_sources(&SearchRoots::new(tmp.path(), tmp.path()), SOURCES).unwrap_err();
        assert_eq!(
            err,
            LocatorError::MissingIncludePath {
                name: "OCCT".into(),
                path: "None".into()
            }
        );
        assert!(err.to_string().starts_with("OCCT include path does not exist"));
    }

    #[test]
    fn optional_sources_are_skipped() {
        let tmp = TempDir::new().unwrap();
        touch(&tmp.path().join("occt/Standard.hxx"));
        let specs: Vec<SourceSpec> = SOURCES
            .iter()
            .filter(|s| s.name == "OCCT" || !s.required)
            .copied()
            .filter(|s| s.platform == Platform::Any)
            .collect();

        let located = locate_sources(&SearchRoots::new(tmp.path(), tmp.path()), &specs).unwrap();
        assert_eq!(located.len(), 1);
        assert_eq!(located[0].spec().name, "OCCT");
        assert_eq!(located[0].root(), tmp.path().join("occt"));
    }

    #[test]
    fn bindings_are_found_under_their_own_root() {
        let tmp = TempDir::new().unwrap();
        let prefix = tmp.path().join("prefix");
        let checkout = tmp.path().join("pyOCCT");
        touch(&prefix.join("include/opencascade/Standard.hxx"));
        touch(&checkout.join("inc/pyOCCT_Common.hxx"));
        let specs: Vec<SourceSpec> = SOURCES
            .iter()
            .filter(|s| s.name == "OCCT" || s.name == "pyOCCT")
            .copied()
            .collect();

        let located = locate_sources(&SearchRoots::new(&prefix, &checkout), &specs).unwrap();
        assert_eq!(located[1].root(), checkout.join("inc"));

        let err = locate_sources(&SearchRoots::new(&prefix, &prefix), &specs).unwrap_err();
        assert_eq!(
            err,
            LocatorError::MissingIncludePath {
                name: "pyOCCT".into(),
                path: "None".into()
            }
        );
    }
}
