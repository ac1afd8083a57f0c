use crate::domains::projects::{inspector, package_manager, PackageManager, Project, Script};
use crate::domains::registry::{
    AppSettings, ProjectConfig, RegistryError, RegistryRepository, RegistryService,
};
use crate::domains::runtime::detection::switch_command;
use crate::domains::runtime::pin_file::set_pin_file;
use crate::domains::runtime::{RuntimeBridge, RuntimeVersionManagerInfo, VersionManagerKind};
use crate::domains::terminal::{ExternalLauncher, LaunchError, ProcessRegistry, RunOutcome};
use crate::infrastructure::config::{DataPaths, FileRegistryRepository};
use crate::open_apps::{EditorAvailability, EditorBridge, EditorKind};
use crate::shared::{CommandRunner, HostPlatform, SystemCommandRunner};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FleetError {
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error(transparent)]
    Launch(#[from] LaunchError),
}

pub type FleetResult<T> = Result<T, FleetError>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FolderSelection {
    pub path: String,
    pub is_valid: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunRequest {
    pub project_id: String,
    pub path: String,
    pub script_name: String,
    #[serde(default)]
    pub package_manager: Option<String>,
    #[serde(default)]
    pub node_version: Option<String>,
}

/// Owns every piece of mutable state: the registry document and the
/// attached runs. One instance serves all requests of a process.
pub struct FleetCore {
    registry: RegistryService,
    processes: ProcessRegistry,
    runtime: RuntimeBridge,
    editors: EditorBridge,
    launcher: ExternalLauncher,
}

impl FleetCore {
    pub fn open(paths: &DataPaths) -> Self {
        let repository = FileRegistryRepository::new(paths.registry_file());
        log::debug!("Registry file: {}", repository.path().display());
        Self::with_parts(
            Box::new(repository),
            Arc::new(SystemCommandRunner),
            HostPlatform::current(),
            Some(paths.runs_dir()),
        )
    }

    pub fn with_parts(
        repository: Box<dyn RegistryRepository>,
        runner: Arc<dyn CommandRunner>,
        platform: HostPlatform,
        runs_dir: Option<PathBuf>,
    ) -> Self {
        Self {
            registry: RegistryService::new(repository),
            processes: ProcessRegistry::new(runs_dir, platform),
            runtime: RuntimeBridge::new(runner.clone(), platform),
            editors: EditorBridge::new(runner.clone(), platform),
            launcher: ExternalLauncher::new(runner, platform),
        }
    }

    /// `None` means the user cancelled.
    pub fn select_project_folder(&self, chosen: Option<&str>) -> Option<FolderSelection> {
        let path = chosen.map(str::trim).filter(|p| !p.is_empty())?;
        Some(FolderSelection {
            path: path.to_string(),
            is_valid: inspector::is_valid_project(Path::new(path)),
        })
    }

    pub fn list_scripts(&self, path: &str) -> FleetResult<Vec<Script>> {
        let dir = require_project(path)?;
        Ok(inspector::read_scripts(dir))
    }

    pub fn detect_package_manager(&self, path: &str) -> FleetResult<PackageManager> {
        let dir = require_project(path)?;
        Ok(package_manager::resolve(dir))
    }

    pub fn run(&mut self, request: &RunRequest) -> FleetResult<RunOutcome> {
        let dir = require_project(&request.path)?;

        let scripts = inspector::read_scripts(dir);
        if !scripts.iter().any(|s| s.name == request.script_name) {
            return Err(RegistryError::UnknownScript {
                project: request.path.clone(),
                script: request.script_name.clone(),
            }
            .into());
        }

        let manager = self.package_manager_for(request, dir);
        let command = package_manager::build_run_command(manager, &request.script_name);
        let switch = self.switch_prefix(request.node_version.as_deref());

        let outcome = if self.registry.settings().run_in_external_terminal {
            RunOutcome::Detached(self.launcher.launch(
                &request.path,
                &command,
                switch.as_deref(),
            )?)
        } else {
            RunOutcome::Supervised(self.processes.start(
                &request.project_id,
                &request.path,
                &command,
                switch.as_deref(),
            )?)
        };

        match self
            .registry
            .mark_run_started(&request.project_id, outcome.is_tracked())
        {
            Ok(_) => {}
            Err(RegistryError::NotFound(id)) => log::debug!("Ran untracked project {id}"),
            Err(e) => log::warn!("Run started but registry update failed: {e}"),
        }
        Ok(outcome)
    }

    /// Explicit override, then the registry's cached kind, then the disk.
    fn package_manager_for(&self, request: &RunRequest, dir: &Path) -> PackageManager {
        if let Some(raw) = request.package_manager.as_deref() {
            match raw.parse() {
                Ok(kind) => return kind,
                Err(e) => log::warn!("{e}; resolving from lockfiles"),
            }
        }
        self.registry
            .get(&request.project_id)
            .ok()
            .and_then(|p| p.package_manager)
            .unwrap_or_else(|| package_manager::resolve(dir))
    }

    fn switch_prefix(&self, node_version: Option<&str>) -> Option<String> {
        let version = node_version.map(str::trim).filter(|v| !v.is_empty())?;
        let kind = self.runtime.detect_manager();
        let prefix = switch_command(kind, version);
        if prefix.is_none() && kind == VersionManagerKind::None {
            log::warn!("Node {version} requested but no version manager is installed");
        }
        prefix
    }

    pub fn stop(&mut self, project_id: &str) -> bool {
        let stopped = self.processes.stop(project_id);
        if stopped {
            if let Err(e) = self.registry.mark_stopped(project_id) {
                log::warn!("Stopped {project_id} but registry update failed: {e}");
            }
        }
        stopped
    }

    pub fn check_running(&mut self, project_id: &str) -> bool {
        let running = self.processes.is_running(project_id);
        let recorded = self
            .registry
            .get(project_id)
            .map(|p| p.is_running)
            .unwrap_or(false);
        if recorded && !running {
            if let Err(e) = self.registry.mark_stopped(project_id) {
                log::warn!("Could not record exit of {project_id}: {e}");
            }
        }
        running
    }

    pub fn detect_editors(&self) -> EditorAvailability {
        self.editors.detect()
    }

    pub fn open_in_editor(&self, editor: EditorKind, path: &str) -> bool {
        self.editors.open(editor, path)
    }

    pub fn load_registry(&mut self) -> ProjectConfig {
        self.registry.load();
        let processes = &mut self.processes;
        self.registry.sync_running(|id| processes.is_running(id));
        self.registry.config().clone()
    }

    pub fn save_registry(&mut self, config: ProjectConfig) -> FleetResult<()> {
        Ok(self.registry.save(config)?)
    }

    pub fn add_project(&mut self, path: &str) -> FleetResult<Project> {
        self.registry
            .add(path)?
            .ok_or_else(|| RegistryError::InvalidProject(path.to_string()).into())
    }

    pub fn remove_project(&mut self, project_id: &str) -> FleetResult<bool> {
        if self.processes.stop(project_id) {
            log::info!("Stopped {project_id} before removing it");
        }
        Ok(self.registry.remove(project_id)?)
    }

    pub fn select_script(&mut self, project_id: &str, script: &str) -> FleetResult<Project> {
        Ok(self.registry.select_script(project_id, script)?)
    }

    pub fn runtime_manager_info(&self) -> RuntimeVersionManagerInfo {
        self.runtime.manager_info()
    }

    pub fn detect_project_runtime_version(&self, path: &str) -> Option<String> {
        inspector::read_version_hint(Path::new(path))
    }

    /// Writes (or removes) the pin file of the installed manager, then
    /// mirrors the value into the registry.
    pub fn set_project_runtime_version(
        &mut self,
        project_id: &str,
        version: Option<&str>,
    ) -> FleetResult<Project> {
        let path = self.registry.get(project_id)?.path.clone();
        let kind = self.runtime.detect_manager();

        set_pin_file(Path::new(&path), version, kind).map_err(|e| {
            RegistryError::Persistence(format!("Failed to update pin file in {path}: {e}"))
        })?;
        Ok(self.registry.set_node_version(project_id, version)?)
    }

    pub fn settings(&self) -> AppSettings {
        self.registry.settings()
    }

    pub fn update_settings(&mut self, settings: AppSettings) -> FleetResult<()> {
        Ok(self.registry.update_settings(settings)?)
    }

    /// Takes down every attached run.
    pub fn shutdown(&mut self) {
        self.processes.stop_all();
    }
}

fn require_project(path: &str) -> Result<&Path, RegistryError> {
    let dir = Path::new(path);
    if inspector::is_valid_project(dir) {
        Ok(dir)
    } else {
        Err(RegistryError::InvalidProject(path.to_string()))
    }
}


#[cfg(test)]
mod tests {
    use super::testing::core_with;
    use super::*;
    use crate::shared::binary_utils::testing::FakeRunner;
    use crate::shared::CommandOutput;
    use std::fs;
    use tempfile::TempDir;

    fn project(manifest: &str) -> (TempDir, String) {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("package.json"), manifest).unwrap();
        let path = dir.path().to_string_lossy().to_string();
        (dir, path)
    }

    fn request(id: &str, path: &str, script: &str) -> RunRequest {
        RunRequest {
            project_id: id.into(),
            path: path.into(),
            script_name: script.into(),
            ..RunRequest::default()
        }
    }

    #[test]
    fn select_folder_reports_validity_or_cancel() {
        let (_, core) = core_with(FakeRunner::new(), HostPlatform::Linux);
        let (_dir, path) = project("{}");

        assert_eq!(
            core.select_project_folder(Some(&path)),
            Some(FolderSelection {
                path: path.clone(),
                is_valid: true
            })
        );
        assert!(!core.select_project_folder(Some("/nonexistent")).unwrap().is_valid);
        assert_eq!(core.select_project_folder(Some("  ")), None);
        assert_eq!(core.select_project_folder(None), None);
    }

    #[test]
    fn invalid_path_is_invalid_project_error() {
        let (_, core) = core_with(FakeRunner::new(), HostPlatform::Linux);
        let err = core.list_scripts("/nonexistent").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Not a valid project directory (package.json not found): /nonexistent"
        );
    }

    #[test]
    fn run_opens_external_terminal_with_resolved_manager() {
        let (runner, mut core) = core_with(FakeRunner::new().with_binary("xterm"), HostPlatform::Linux);
        let (dir, path) = project(r#"{"scripts":{"build":"tsc"}}"#);
        fs::write(dir.path().join("bun.lockb"), "").unwrap();
        fs::write(dir.path().join("package-lock.json"), "{}").unwrap();
        let added = core.add_project(&path).unwrap();

        let outcome = core.run(&request(&added.id, &path, "build")).unwrap();
        match outcome {
            RunOutcome::Detached(launch) => {
                assert_eq!(launch.terminal, "xterm");
                assert_eq!(launch.command, "bun build");
            }
            other => panic!("expected detached launch, got {other:?}"),
        }
        assert_eq!(runner.spawns().len(), 1);

        let stored = core.load_registry();
        assert!(stored.projects[0].last_run_time.is_some());
        assert!(!stored.projects[0].is_running);
        assert!(!core.check_running(&added.id));
        assert!(!core.stop(&added.id));
    }

    #[test]
    fn run_honours_override_and_version_switch() {
        let (_, mut core) = core_with(
            FakeRunner::new()
                .with_binary("xterm")
                .respond("nvs --version", CommandOutput::ok("1.7.1")),
            HostPlatform::Linux,
        );
        let (_dir, path) = project(r#"{"scripts":{"dev":"vite"}}"#);

        let mut req = request("adhoc", &path, "dev");
        req.package_manager = Some("pnpm".into());
        req.node_version = Some("v18.18.0".into());

        let RunOutcome::Detached(launch) = core.run(&req).unwrap() else {
            panic!("expected detached launch");
        };
        assert_eq!(launch.command, "nvs use 18.18.0 && pnpm dev");
    }

    #[test]
    fn run_rejects_unknown_script() {
        let (_, mut core) = core_with(FakeRunner::new().with_binary("xterm"), HostPlatform::Linux);
        let (_dir, path) = project(r#"{"scripts":{"dev":"vite"}}"#);
        let err = core.run(&request("p", &path, "deploy")).unwrap_err();
        assert!(matches!(
            err,
            FleetError::Registry(RegistryError::UnknownScript { .. })
        ));
    }

    #[cfg(unix)]
    #[test]
    fn attached_mode_tracks_and_stops() {
        let (_, mut core) = core_with(FakeRunner::new(), HostPlatform::Linux);
        core.update_settings(AppSettings {
            run_in_external_terminal: false,
        })
        .unwrap();
        let (_dir, path) = project(r#"{"scripts":{"serve":"sleep 5"}}"#);
        let added = core.add_project(&path).unwrap();

        let RunOutcome::Supervised(launch) = core.run(&request(&added.id, &path, "serve")).unwrap()
        else {
            panic!("expected supervised launch");
        };
        assert_eq!(launch.command, "npm run serve");

        assert!(core.stop(&added.id));
        assert!(!core.check_running(&added.id));
        assert!(!core.load_registry().projects[0].is_running);
    }

    #[test]
    fn add_invalid_project_is_error() {
        let (_, mut core) = core_with(FakeRunner::new(), HostPlatform::Linux);
        let err = core.add_project("/nonexistent/devfleet").unwrap_err();
        assert!(err.to_string().starts_with("Not a valid project directory"));
    }

    #[test]
    fn setting_runtime_version_writes_manager_pin_file() {
        let (_, mut core) = core_with(
            FakeRunner::new().respond("nvmd --version", CommandOutput::ok("4.0.0")),
            HostPlatform::MacOs,
        );
        let (dir, path) = project(r#"{"scripts":{"dev":"vite"}}"#);
        let added = core.add_project(&path).unwrap();

        let updated = core
            .set_project_runtime_version(&added.id, Some("v20.5.1"))
            .unwrap();
        assert_eq!(updated.node_version.as_deref(), Some("20.5.1"));
        assert_eq!(
            fs::read_to_string(dir.path().join(".nvmdrc")).unwrap(),
            "20.5.1"
        );
        assert_eq!(
            core.detect_project_runtime_version(&path).as_deref(),
            Some("20.5.1")
        );

        let cleared = core.set_project_runtime_version(&added.id, None).unwrap();
        assert_eq!(cleared.node_version, None);
        assert!(!dir.path().join(".nvmdrc").exists());

        assert!(matches!(
            core.set_project_runtime_version("missing", Some("18")),
            Err(FleetError::Registry(RegistryError::NotFound(_)))
        ));
    }

    #[test]
    fn remove_and_select_script() {
        let (_, mut core) = core_with(FakeRunner::new(), HostPlatform::Linux);
        let (_dir, path) = project(r#"{"scripts":{"dev":"vite","lint":"eslint ."}}"#);
        let added = core.add_project(&path).unwrap();
        assert_eq!(added.selected_script.as_deref(), Some("dev"));

        let selected = core.select_script(&added.id, "lint").unwrap();
        assert_eq!(selected.selected_script.as_deref(), Some("lint"));

        assert!(core.remove_project(&added.id).unwrap());
        assert!(!core.remove_project(&added.id).unwrap());
    }
}
