//! Umbrella header listing every aggregated header.

use crate::{aggregate::IncludeSet, LocatorError, Result};
use std::fmt::Write as _;
use std::fs;
use std::path::Path;
use tracing::info;

const PLATFORM_GUARD: &str = "#ifdef _WIN32\n    #include <Windows.h>\n#endif\n";

/// Render the umbrella file: platform guard first, then one include per
/// header in aggregation order.
#[must_use]
pub fn render_umbrella(includes: &IncludeSet) -> String {
    let mut out = String::from(PLATFORM_GUARD);
    for file in includes.header_files() {
        let _ = writeln!(out, "#include <{file}>");
    }
    out
}

/// Write the umbrella file to `path`, replacing any previous contents.
pub fn write_umbrella(path: &Path, includes: &IncludeSet) -> Result<()> {
    let write_err = |e: std::io::Error| LocatorError::WriteUmbrella {
        path: path.to_path_buf(),
        message: e.to_string(),
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(write_err)?;
    }
    fs::write(path, render_umbrella(includes)).map_err(write_err)?;
    info!(
        "Wrote {} headers to {}",
        includes.headers().len(),
        path.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{collect_includes, LocatedSource, SOURCES};
    use std::collections::BTreeSet;
    use tempfile::TempDir;

    fn occt_includes(tmp: &TempDir, names: &[&str]) -> IncludeSet {
        for name in names {
            fs::write(tmp.path().join(name), "").unwrap();
        }
        let spec = SOURCES[0];
        collect_includes(
            &[LocatedSource::new(spec, tmp.path().to_path_buf())],
            &BTreeSet::new(),
        )
        .unwrap()
    }

    #[test]
    fn guard_precedes_includes() {
        let tmp = TempDir::new().unwrap();
        let set = occt_includes(&tmp, &["gp_Pnt.hxx", "Adaptor3d_Curve.hxx"]);
        assert_eq!(
            render_umbrella(&set),
            "#ifdef _WIN32\n    #include <Windows.h>\n#endif\n\
             #include <Adaptor3d_Curve.hxx>\n\
             #include <gp_Pnt.hxx>\n"
        );
    }

    #[test]
    fn empty_set_renders_only_guard() {
        assert_eq!(render_umbrella(&IncludeSet::default()), PLATFORM_GUARD);
    }

    #[test]
    fn write_replaces_previous_file() {
        let tmp = TempDir::new().unwrap();
        let set = occt_includes(&tmp, &["gp_Pnt.hxx"]);
        let out = tmp.path().join("out/all_includes.h");
        fs::create_dir_all(out.parent().unwrap()).unwrap();
        fs::write(&out, "stale").unwrap();

        write_umbrella(&out, &set).unwrap();
        let text = fs::read_to_string(&out).unwrap();
        assert!(text.ends_with("#include <gp_Pnt.hxx>\n"));
        assert!(!text.contains("stale"));
    }
}
