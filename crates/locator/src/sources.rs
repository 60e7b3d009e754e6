//! Dependency sources searched for headers.
//!
//! Every entry names the signature header used to find the source's include
//! root. Sources carrying [`HeaderRules`] also contribute headers to the
//! umbrella file; the others only extend the include path.

/// Platform restriction for a source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Any,
    Linux,
}

impl Platform {
    /// Whether the source is searched on the platform the binder runs on.
    #[must_use]
    pub fn is_current(self) -> bool {
        match self {
            Self::Any => true,
            Self::Linux => cfg!(target_os = "linux"),
        }
    }
}

/// Directory tree a source is searched in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchBase {
    /// The environment prefix holding the native libraries.
    Prefix,
    /// The pyOCCT checkout whose bindings the generated modules import.
    Bindings,
}

/// How headers of a source are mapped to modules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleRule {
    /// `Foo_Bar.hxx` belongs to module `Foo`; `Foo.hxx` to `Foo`.
    Derived,
    /// The source exposes a fixed list of modules. Headers whose derived name
    /// is not listed belong to the first module.
    Fixed(&'static [&'static str]),
}

/// Which files of a source are headers and which of them to skip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeaderRules {
    pub extensions: &'static [&'static str],
    pub ignored: &'static [&'static str],
    pub modules: ModuleRule,
}

impl HeaderRules {
    #[must_use]
    pub fn accepts_extension(&self, file: &str) -> bool {
        self.extensions.iter().any(|ext| file.ends_with(ext))
    }

    #[must_use]
    pub fn is_ignored(&self, file: &str) -> bool {
        self.ignored.contains(&file)
    }
}

/// One dependency searched under the environment prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceSpec {
    /// Name used in messages (`OCCT`, `SMESH`, ...).
    pub name: &'static str,
    /// Package the source's modules are grouped under in the generated bindings.
    pub package: &'static str,
    /// Header whose directory marks the include root.
    pub signature: &'static str,
    /// The include root is the parent of the directory holding `signature`.
    pub return_parent: bool,
    /// Absence is a fatal configuration error.
    pub required: bool,
    pub platform: Platform,
    pub base: SearchBase,
    /// `None` for sources that only extend the include path.
    pub headers: Option<HeaderRules>,
}

/// Sources searched by the binder, in include-path order.
pub const SOURCES: &[SourceSpec] = &[
    SourceSpec {
        name: "OCCT",
        package: "OCCT",
        signature: "Standard.hxx",
        return_parent: false,
        required: true,
        platform: Platform::Any,
        base: SearchBase::Prefix,
        headers: Some(HeaderRules {
            extensions: &[".hxx"],
            ignored: &["step.tab.hxx"],
            modules: ModuleRule::Derived,
        }),
    },
    SourceSpec {
        name: "pyOCCT",
        package: "OCCT",
        signature: "pyOCCT_Common.hxx",
        return_parent: false,
        required: true,
        platform: Platform::Any,
        base: SearchBase::Bindings,
        headers: None,
    },
    SourceSpec {
        name: "SMESH",
        package: "SMESH",
        signature: "SMESH_SMESH.hxx",
        return_parent: true,
        required: true,
        platform: Platform::Any,
        base: SearchBase::Prefix,
        headers: Some(HeaderRules {
            extensions: &[".hxx", ".h"],
            ignored: &[
                "libmesh5.h",
                "gzstream.h",
                "memoire.h",
                "nginterface.h",
                "nglib.h",
            ],
            modules: ModuleRule::Derived,
        }),
    },
    SourceSpec {
        name: "NETGEN",
        package: "netgen",
        signature: "ngcore.hpp",
        return_parent: true,
        required: true,
        platform: Platform::Any,
        base: SearchBase::Prefix,
        headers: Some(HeaderRules {
            extensions: &[".hpp"],
            ignored: &[],
            modules: ModuleRule::Fixed(&["OCCGeometry", "Mesh"]),
        }),
    },
    SourceSpec {
        name: "VTK",
        package: "VTK",
        signature: "vtk_doubleconversion.h",
        return_parent: false,
        required: false,
        platform: Platform::Any,
        base: SearchBase::Prefix,
        headers: None,
    },
    SourceSpec {
        name: "TBB",
        package: "TBB",
        signature: "tbb.h",
        return_parent: true,
        required: false,
        platform: Platform::Any,
        base: SearchBase::Prefix,
        headers: None,
    },
    SourceSpec {
        name: "clangdev",
        package: "clang",
        signature: "__stddef_max_align_t.h",
        return_parent: false,
        required: true,
        platform: Platform::Linux,
        base: SearchBase::Prefix,
        headers: None,
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kernel_is_first_and_required() {
        let kernel = &SOURCES[0];
        assert_eq!(kernel.name, "OCCT");
        assert_eq!(kernel.signature, "Standard.hxx");
        assert!(kernel.required);
        assert!(kernel.headers.is_some_and(|h| h.is_ignored("step.tab.hxx")));
    }

    #[test]
    fn bindings_are_searched_outside_the_prefix() {
        let bindings: Vec<_> = SOURCES.iter().filter(|s| s.base == SearchBase::Bindings).collect();
        assert_eq!(bindings.len(), 1);
        assert_eq!(bindings[0].name, "pyOCCT");
        assert_eq!(bindings[0].signature, "pyOCCT_Common.hxx");
        assert!(bindings[0].required);
        assert!(bindings[0].headers.is_none());
    }

    #[test]
    fn header_rules_filter_by_extension() {
        let smesh = SOURCES.iter().find(|s| s.name == "SMESH").unwrap();
        let rules = smesh.headers.unwrap();
        assert!(rules.accepts_extension("SMDS_Mesh.hxx"));
        assert!(rules.accepts_extension("memoire.h"));
        assert!(rules.is_ignored("memoire.h"));
        assert!(!rules.accepts_extension("SMDS_Mesh.cxx"));
    }
}
