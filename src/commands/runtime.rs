use super::CommandResponse;
use crate::domains::projects::Project;
use crate::domains::runtime::RuntimeVersionManagerInfo;
use crate::fleet::FleetCore;

pub fn get_runtime_manager_info(core: &FleetCore) -> CommandResponse<RuntimeVersionManagerInfo> {
    CommandResponse::ok(core.runtime_manager_info())
}

/// `data` is `null` when the project pins nothing.
pub fn detect_project_runtime_version(
    core: &FleetCore,
    path: &str,
) -> CommandResponse<Option<String>> {
    CommandResponse::ok(core.detect_project_runtime_version(path))
}

pub fn set_project_runtime_version(
    core: &mut FleetCore,
    project_id: &str,
    version: Option<&str>,
) -> CommandResponse<Project> {
    core.set_project_runtime_version(project_id, version).into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fleet::testing::core_with;
    use crate::shared::binary_utils::testing::FakeRunner;
    use crate::shared::{CommandOutput, HostPlatform};
    use serde_json::json;

    #[test]
    fn manager_info_serializes_camel_case() {
        let (_, core) = core_with(
            FakeRunner::new()
                .respond("nvs --version", CommandOutput::ok("1.7.1"))
                .respond("node --version", CommandOutput::ok("v20.5.1"))
                .respond(
                    "nvs ls",
                    CommandOutput::ok(">node/20.5.1/x64\n node/18.18.0/x64\n"),
                ),
            HostPlatform::Linux,
        );

        let info = serde_json::to_value(get_runtime_manager_info(&core)).unwrap();
        assert_eq!(info["data"]["isInstalled"], true);
        assert_eq!(info["data"]["manager"], "nvs");
        assert_eq!(info["data"]["currentVersion"], "20.5.1");
        assert_eq!(info["data"]["availableVersions"][0]["fullVersion"], "v20.5.1");
        assert_eq!(info["data"]["availableVersions"][0]["isCurrent"], true);
    }

    #[test]
    fn missing_pin_is_null_data() {
        let (_, core) = core_with(FakeRunner::new(), HostPlatform::Linux);
        let dir = tempfile::TempDir::new().unwrap();
        let reply = detect_project_runtime_version(&core, dir.path().to_str().unwrap());
        assert_eq!(
            serde_json::to_value(reply.into_json()).unwrap(),
            json!({"success": true, "data": null})
        );
    }
}
