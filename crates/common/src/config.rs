//! Command line configuration for the SMESH binder.

use clap::Parser;
use std::path::{Path, PathBuf};

/// Environment variable naming the toolchain/runtime prefix that is searched
/// for dependency include directories.
pub const PREFIX_ENV_VAR: &str = "CONDA_PREFIX";

/// File name of the synthesized umbrella header.
pub const UMBRELLA_FILE: &str = "all_includes.h";

/// Directory below the root holding stand-in headers for ones the
/// libraries reference but do not ship.
pub const EXTRA_INCLUDES_DIR: &str = "extra_includes";

/// pyOCCT checkout searched when `--pyocct` is not given, next to the root.
pub const DEFAULT_PYOCCT_DIR: &str = "pyOCCT";

/// Output subdirectory used when `-o` is not given.
pub const DEFAULT_OUTPUT_DIR: &str = "output";

/// Command line arguments of a generation run.
#[derive(Parser, Debug, Clone)]
#[command(version, about = "Generate pybind11 bindings for SMESH, NETGEN and OCCT", long_about = None)]
pub struct Config {
    /// Root path of the pySMESH repository; the umbrella header is written here
    #[arg(short = 'r', long = "root", value_name = "DIR", default_value = ".")]
    pub root: PathBuf,

    /// Path to the binder configuration file
    #[arg(short = 'c', long = "config", value_name = "FILE", default_value = "config.txt")]
    pub config_path: PathBuf,

    /// Output path for the generated bindings (defaults to <ROOT>/output)
    #[arg(short = 'o', long = "output", value_name = "DIR")]
    pub output_path: Option<PathBuf>,

    /// pyOCCT checkout providing pyOCCT_Common.hxx (defaults to <ROOT>/../pyOCCT)
    #[arg(long = "pyocct", value_name = "DIR")]
    pub pyocct_path: Option<PathBuf>,

    /// Name of the generated Python package
    #[arg(long, value_name = "NAME", default_value = "SMESH")]
    pub package: String,
}

impl Config {
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Output directory, falling back to `<root>/output`.
    pub fn output_path(&self) -> PathBuf {
        self.output_path
            .clone()
            .unwrap_or_else(|| self.root.join(DEFAULT_OUTPUT_DIR))
    }

    /// pyOCCT checkout, falling back to a `pyOCCT` sibling of the root.
    pub fn pyocct_path(&self) -> PathBuf {
        self.pyocct_path
            .clone()
            .unwrap_or_else(|| self.root.join("..").join(DEFAULT_PYOCCT_DIR))
    }

    pub fn extra_includes_path(&self) -> PathBuf {
        self.root.join(EXTRA_INCLUDES_DIR)
    }

    /// Location of the umbrella header (tool root, never the output tree).
    pub fn umbrella_path(&self) -> PathBuf {
        self.root.join(UMBRELLA_FILE)
    }

    pub fn package(&self) -> &str {
        &self.package
    }
}
