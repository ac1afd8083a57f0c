use crate::domains::registry::{ProjectConfig, RegistryRepository};
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

pub struct FileRegistryRepository {
    config_path: PathBuf,
}

impl FileRegistryRepository {
    pub fn new(config_path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: config_path.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.config_path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .config_path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.config_path.with_file_name(name)
    }
}

impl RegistryRepository for FileRegistryRepository {
    fn load(&self) -> Result<Option<ProjectConfig>> {
        if !self.config_path.exists() {
            log::debug!("No registry at {}", self.config_path.display());
            return Ok(None);
        }

        let contents = fs::read_to_string(&self.config_path)
            .with_context(|| format!("Failed to read {}", self.config_path.display()))?;
        let config = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse {}", self.config_path.display()))?;
        Ok(Some(config))
    }

    /// Writes a sibling temp file and renames it over the target, so a
    /// failed write leaves the previous document intact.
    fn save(&self, config: &ProjectConfig) -> Result<()> {
        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        let contents =
            serde_json::to_string_pretty(config).context("Failed to serialize project registry")?;
        let temp = self.temp_path();
        fs::write(&temp, &contents)
            .with_context(|| format!("Failed to write {}", temp.display()))?;
        fs::rename(&temp, &self.config_path).with_context(|| {
            format!(
                "Failed to replace {} with {}",
                self.config_path.display(),
                temp.display()
            )
        })?;

        log::debug!(
            "Saved {} project(s) to {} ({} bytes)",
            config.projects.len(),
            self.config_path.display(),
            contents.len()
        );
        Ok(())
    }
}
