use super::CommandResponse;
use crate::domains::projects::{PackageManager, Project, Script};
use crate::domains::registry::{AppSettings, ProjectConfig};
use crate::fleet::{FleetCore, FolderSelection};

pub fn select_project_folder(
    core: &FleetCore,
    chosen: Option<&str>,
) -> CommandResponse<FolderSelection> {
    match core.select_project_folder(chosen) {
        Some(selection) => CommandResponse::ok(selection),
        None => {
            log::debug!("Folder selection cancelled");
            CommandResponse::cancelled()
        }
    }
}

pub fn list_scripts(core: &FleetCore, path: &str) -> CommandResponse<Vec<Script>> {
    core.list_scripts(path).into()
}

pub fn detect_package_manager(core: &FleetCore, path: &str) -> CommandResponse<PackageManager> {
    core.detect_package_manager(path).into()
}

pub fn load_registry(core: &mut FleetCore) -> CommandResponse<ProjectConfig> {
    CommandResponse::ok(core.load_registry())
}

pub fn save_registry(core: &mut FleetCore, config: ProjectConfig) -> CommandResponse<bool> {
    core.save_registry(config).map(|()| true).into()
}

pub fn add_project(core: &mut FleetCore, path: &str) -> CommandResponse<Project> {
    core.add_project(path).into()
}

pub fn remove_project(core: &mut FleetCore, project_id: &str) -> CommandResponse<bool> {
    core.remove_project(project_id).into()
}

pub fn select_script(
    core: &mut FleetCore,
    project_id: &str,
    script_name: &str,
) -> CommandResponse<Project> {
    core.select_script(project_id, script_name).into()
}

pub fn update_settings(core: &mut FleetCore, settings: AppSettings) -> CommandResponse<AppSettings> {
    core.update_settings(settings).map(|()| core.settings()).into()
}
