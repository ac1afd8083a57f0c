use super::types::{AppSettings, ProjectConfig};
use crate::domains::projects::{inspector, package_manager, Project};
use chrono::Utc;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("project not found: {0}")]
    NotFound(String),
    #[error("Not a valid project directory (package.json not found): {0}")]
    InvalidProject(String),
    #[error("script '{script}' is not defined in {project}")]
    UnknownScript { project: String, script: String },
    #[error("failed to persist registry: {0}")]
    Persistence(String),
}

/// Storage of the registry document. `Ok(None)` means nothing stored yet.
pub trait RegistryRepository: Send + Sync {
    fn load(&self) -> anyhow::Result<Option<ProjectConfig>>;
    fn save(&self, config: &ProjectConfig) -> anyhow::Result<()>;
}

pub struct RegistryService {
    repository: Box<dyn RegistryRepository>,
    config: ProjectConfig,
}

impl RegistryService {
    pub fn new(repository: Box<dyn RegistryRepository>) -> Self {
        let mut service = Self {
            repository,
            config: ProjectConfig::default(),
        };
        service.load();
        service
    }

    /// Re-reads the stored document and refreshes every project from disk.
    ///
    /// Refreshed fields stay in memory until the next save.
    pub fn load(&mut self) -> &ProjectConfig {
        let stored = match self.repository.load() {
            Ok(Some(config)) => config,
            Ok(None) => ProjectConfig::default(),
            Err(e) => {
                log::warn!("Project registry unreadable, starting empty: {e:#}");
                ProjectConfig::default()
            }
        };

        self.config = refresh(stored);
        &self.config
    }

    pub fn config(&self) -> &ProjectConfig {
        &self.config
    }

    pub fn settings(&self) -> AppSettings {
        self.config.settings
    }

    pub fn get(&self, id: &str) -> Result<&Project, RegistryError> {
        self.config
            .find(id)
            .ok_or_else(|| RegistryError::NotFound(id.to_string()))
    }

    /// Replaces the whole document. Settings the caller left out were
    /// already defaulted when the document was deserialized.
    pub fn save(&mut self, mut config: ProjectConfig) -> Result<(), RegistryError> {
        for project in &mut config.projects {
            project.path = absolute_path(&project.path).to_string_lossy().to_string();
        }
        collapse_duplicate_paths(&mut config.projects);
        self.commit(config)
    }

    /// Stores `next` and only then makes it the in-memory document, so a
    /// failed write leaves the registry as it was.
    fn commit(&mut self, mut next: ProjectConfig) -> Result<(), RegistryError> {
        next.last_updated = Some(Utc::now());
        self.repository
            .save(&next)
            .map_err(|e| RegistryError::Persistence(format!("{e:#}")))?;
        self.config = next;
        Ok(())
    }

    /// Tracks the project at `path`. Invalid directories yield `None`, an
    /// already tracked path yields the existing entry unchanged.
    pub fn add(&mut self, path: &str) -> Result<Option<Project>, RegistryError> {
        let dir = absolute_path(path);
        if !inspector::is_valid_project(&dir) {
            log::info!("Refusing to add {path}: no manifest");
            return Ok(None);
        }

        let key = dir.to_string_lossy().to_string();
        if let Some(existing) = self.config.find_by_path(&key) {
            return Ok(Some(existing.clone()));
        }

        let scripts = inspector::read_scripts(&dir);
        let project = Project {
            id: Uuid::now_v7().to_string(),
            name: inspector::read_name(&dir),
            path: key,
            selected_script: scripts.first().map(|s| s.name.clone()),
            scripts,
            package_manager: Some(package_manager::resolve(&dir)),
            node_version: inspector::read_version_hint(&dir),
            is_running: false,
            last_run_time: None,
        };
        log::info!("Added project {} ({})", project.name, project.path);

        let mut next = self.config.clone();
        next.projects.push(project.clone());
        self.commit(next)?;
        Ok(Some(project))
    }

    pub fn remove(&mut self, id: &str) -> Result<bool, RegistryError> {
        if self.config.find(id).is_none() {
            return Ok(false);
        }
        let mut next = self.config.clone();
        next.projects.retain(|p| p.id != id);
        self.commit(next)?;
        Ok(true)
    }

    pub fn select_script(&mut self, id: &str, script: &str) -> Result<Project, RegistryError> {
        self.update(id, |project| {
            if !project.has_script(script) {
                return Err(RegistryError::UnknownScript {
                    project: project.name.clone(),
                    script: script.to_string(),
                });
            }
            project.selected_script = Some(script.to_string());
            Ok(())
        })
    }

    pub fn set_node_version(
        &mut self,
        id: &str,
        version: Option<&str>,
    ) -> Result<Project, RegistryError> {
        let version = version
            .map(|v| inspector::strip_version_prefix(v).to_string())
            .filter(|v| !v.is_empty());
        self.update(id, |project| {
            project.node_version = version;
            Ok(())
        })
    }

    pub fn mark_run_started(&mut self, id: &str, tracked: bool) -> Result<Project, RegistryError> {
        self.update(id, |project| {
            project.last_run_time = Some(Utc::now());
            project.is_running = tracked;
            Ok(())
        })
    }

    pub fn mark_stopped(&mut self, id: &str) -> Result<Project, RegistryError> {
        self.update(id, |project| {
            project.is_running = false;
            Ok(())
        })
    }

    pub fn update_settings(&mut self, settings: AppSettings) -> Result<(), RegistryError> {
        let mut next = self.config.clone();
        next.settings = settings;
        self.commit(next)
    }

    /// Overlays live run state without persisting it.
    pub fn sync_running(&mut self, mut is_running: impl FnMut(&str) -> bool) {
        for project in &mut self.config.projects {
            project.is_running = is_running(&project.id);
        }
    }

    fn update<F>(&mut self, id: &str, apply: F) -> Result<Project, RegistryError>
    where
        F: FnOnce(&mut Project) -> Result<(), RegistryError>,
    {
        let mut next = self.config.clone();
        let project = next
            .find_mut(id)
            .ok_or_else(|| RegistryError::NotFound(id.to_string()))?;
        apply(project)?;
        let updated = project.clone();
        self.commit(next)?;
        Ok(updated)
    }
}

/// Absolute form of `path` with trailing separators and `.` segments
/// removed, so `/work/app/` and `/work/app` compare equal.
fn absolute_path(path: &str) -> PathBuf {
    let trimmed = path.trim();
    std::path::absolute(trimmed)
        .unwrap_or_else(|_| PathBuf::from(trimmed))
        .components()
        .collect()
}

/// Keeps the first entry for each path.
fn collapse_duplicate_paths(projects: &mut Vec<Project>) {
    let mut seen = HashSet::new();
    projects.retain(|project| {
        let fresh = seen.insert(project.path.clone());
        if !fresh {
            log::debug!("Dropping duplicate entry {} for {}", project.id, project.path);
        }
        fresh
    });
}

/// Drops vanished projects and duplicate paths, then re-reads each
/// project's directory.
fn refresh(mut config: ProjectConfig) -> ProjectConfig {
    config.projects.retain(|project| {
        let valid = inspector::is_valid_project(Path::new(&project.path));
        if !valid {
            log::info!("Dropping {} from registry: {} is gone", project.name, project.path);
        }
        valid
    });
    collapse_duplicate_paths(&mut config.projects);

    for project in &mut config.projects {
        let dir = Path::new(&project.path);
        project.scripts = inspector::read_scripts(dir);

        if let Some(selected) = &project.selected_script {
            if !project.has_script(selected) {
                log::debug!("Clearing stale script selection {selected} for {}", project.name);
                project.selected_script = None;
            }
        }
        if project.package_manager.is_none() {
            project.package_manager = Some(package_manager::resolve(dir));
        }
        if project.node_version.is_none() {
            project.node_version = inspector::read_version_hint(dir);
        }
    }
    config
}
