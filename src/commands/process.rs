use super::CommandResponse;
use crate::domains::terminal::RunOutcome;
use crate::fleet::{FleetCore, RunRequest};

pub fn run_script(core: &mut FleetCore, request: &RunRequest) -> CommandResponse<RunOutcome> {
    log::info!(
        "Run requested: {} in {} ({})",
        request.script_name,
        request.path,
        request.project_id
    );
    core.run(request).into()
}

/// `true` only when an attached run was tracked and has been killed.
pub fn stop_script(core: &mut FleetCore, project_id: &str) -> CommandResponse<bool> {
    CommandResponse::ok(core.stop(project_id))
}

pub fn check_running(core: &mut FleetCore, project_id: &str) -> CommandResponse<bool> {
    CommandResponse::ok(core.check_running(project_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fleet::testing::core_with;
    use crate::shared::binary_utils::testing::FakeRunner;
    use crate::shared::HostPlatform;

    #[test]
    fn detached_projects_are_never_running() {
        let (_, mut core) = core_with(FakeRunner::new(), HostPlatform::Linux);
        assert_eq!(check_running(&mut core, "p1").data, Some(false));
        assert_eq!(stop_script(&mut core, "p1").data, Some(false));
    }

    #[test]
    fn run_without_terminal_is_error_reply() {
        let (_, mut core) = core_with(FakeRunner::new(), HostPlatform::Linux);
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::write(dir.path().join("package.json"), r#"{"scripts":{"dev":"vite"}}"#).unwrap();

        let reply = run_script(
            &mut core,
            &RunRequest {
                project_id: "p1".into(),
                path: dir.path().to_string_lossy().to_string(),
                script_name: "dev".into(),
                ..RunRequest::default()
            },
        );
        assert!(!reply.success);
        assert_eq!(reply.error.as_deref(), Some("no usable terminal emulator found"));
    }
}
