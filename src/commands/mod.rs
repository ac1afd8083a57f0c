pub mod editor;
pub mod process;
pub mod project;
pub mod runtime;

use crate::domains::registry::{AppSettings, ProjectConfig};
use crate::fleet::{FleetCore, FleetResult, RunRequest};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Uniform reply for every operation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommandResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> CommandResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
        }
    }

    /// Failure without a message, read by callers as a silent no-op.
    pub fn cancelled() -> Self {
        Self {
            success: false,
            data: None,
            error: None,
        }
    }
}

impl<T> From<FleetResult<T>> for CommandResponse<T> {
    fn from(result: FleetResult<T>) -> Self {
        match result {
            Ok(data) => Self::ok(data),
            Err(e) => {
                log::warn!("Command failed: {e}");
                Self::err(e.to_string())
            }
        }
    }
}

impl<T: Serialize> CommandResponse<T> {
    pub fn into_json(self) -> CommandResponse<Value> {
        let Some(data) = self.data else {
            return CommandResponse {
                success: self.success,
                data: None,
                error: self.error,
            };
        };
        match serde_json::to_value(data) {
            Ok(value) => CommandResponse {
                success: self.success,
                data: Some(value),
                error: self.error,
            },
            Err(e) => CommandResponse::err(format!("Failed to serialize response: {e}")),
        }
    }
}

/// One boundary operation with its parameters, as read from a request line
/// (`{"op": "list-scripts", "path": "..."}`) or built from CLI arguments.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "op", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum Request {
    SelectProjectFolder {
        #[serde(default)]
        path: Option<String>,
    },
    ListScripts {
        path: String,
    },
    DetectPackageManager {
        path: String,
    },
    Run(RunRequest),
    Stop {
        project_id: String,
    },
    CheckRunning {
        project_id: String,
    },
    DetectEditors,
    OpenInEditor {
        editor: String,
        path: String,
    },
    LoadRegistry,
    SaveRegistry {
        config: ProjectConfig,
    },
    AddProject {
        path: String,
    },
    RemoveProject {
        project_id: String,
    },
    GetRuntimeManagerInfo,
    DetectProjectRuntimeVersion {
        path: String,
    },
    SetProjectRuntimeVersion {
        project_id: String,
        #[serde(default)]
        version: Option<String>,
    },
    SelectScript {
        project_id: String,
        script_name: String,
    },
    UpdateSettings {
        settings: AppSettings,
    },
}

pub fn dispatch(core: &mut FleetCore, request: Request) -> CommandResponse<Value> {
    log::debug!("Dispatching {request:?}");
    match request {
        Request::SelectProjectFolder { path } => {
            project::select_project_folder(core, path.as_deref()).into_json()
        }
        Request::ListScripts { path } => project::list_scripts(core, &path).into_json(),
        Request::DetectPackageManager { path } => {
            project::detect_package_manager(core, &path).into_json()
        }
        Request::Run(run) => process::run_script(core, &run).into_json(),
        Request::Stop { project_id } => process::stop_script(core, &project_id).into_json(),
        Request::CheckRunning { project_id } => {
            process::check_running(core, &project_id).into_json()
        }
        Request::DetectEditors => editor::detect_editors(core).into_json(),
        Request::OpenInEditor { editor, path } => {
            editor::open_in_editor(core, &editor, &path).into_json()
        }
        Request::LoadRegistry => project::load_registry(core).into_json(),
        Request::SaveRegistry { config } => project::save_registry(core, config).into_json(),
        Request::AddProject { path } => project::add_project(core, &path).into_json(),
        Request::RemoveProject { project_id } => {
            project::remove_project(core, &project_id).into_json()
        }
        Request::GetRuntimeManagerInfo => runtime::get_runtime_manager_info(core).into_json(),
        Request::DetectProjectRuntimeVersion { path } => {
            runtime::detect_project_runtime_version(core, &path).into_json()
        }
        Request::SetProjectRuntimeVersion {
            project_id,
            version,
        } => runtime::set_project_runtime_version(core, &project_id, version.as_deref())
            .into_json(),
        Request::SelectScript {
            project_id,
            script_name,
        } => project::select_script(core, &project_id, &script_name).into_json(),
        Request::UpdateSettings { settings } => {
            project::update_settings(core, settings).into_json()
        }
    }
}

/// Parses and runs one request line. Malformed input becomes an error reply.
pub fn handle_line(core: &mut FleetCore, line: &str) -> CommandResponse<Value> {
    match serde_json::from_str::<Request>(line) {
        Ok(request) => dispatch(core, request),
        Err(e) => CommandResponse::err(format!("Invalid request: {e}")),
    }
}
