pub mod registry_store;

pub use registry_store::FileRegistryRepository;

use std::env;
use std::path::{Path, PathBuf};

pub const DATA_DIR_ENV: &str = "DEVFLEET_DATA_DIR";
pub const REGISTRY_FILE: &str = "devfleet-config.json";
const RUNS_DIR: &str = "runs";

/// Where the registry file and attached-run logs live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataPaths {
    root: PathBuf,
}

impl DataPaths {
    /// `--data-dir`, then `DEVFLEET_DATA_DIR`, then the platform data dir.
    pub fn resolve(cli_override: Option<&Path>) -> Self {
        if let Some(dir) = cli_override {
            return Self::at(dir);
        }
        if let Some(dir) = env::var_os(DATA_DIR_ENV).filter(|v| !v.is_empty()) {
            return Self::at(PathBuf::from(dir));
        }
        let root = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("devfleet");
        Self { root }
    }

    pub fn at(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn registry_file(&self) -> PathBuf {
        self.root.join(REGISTRY_FILE)
    }

    pub fn runs_dir(&self) -> PathBuf {
        self.root.join(RUNS_DIR)
    }
}
