pub mod detection;
pub mod parsing;
pub mod pin_file;
pub mod types;

pub use parsing::parse_version_list;
pub use types::{RuntimeVersion, RuntimeVersionManagerInfo, VersionManagerKind};

use crate::shared::{CommandRunner, HostPlatform};
use std::sync::Arc;

/// Host-facing side of runtime version management. Nothing is cached: every
/// call re-probes, since tools can be installed or switched between calls.
#[derive(Clone)]
pub struct RuntimeBridge {
    runner: Arc<dyn CommandRunner>,
    platform: HostPlatform,
}

impl RuntimeBridge {
    pub fn new(runner: Arc<dyn CommandRunner>, platform: HostPlatform) -> Self {
        Self { runner, platform }
    }

    pub fn detect_manager(&self) -> VersionManagerKind {
        detection::detect_manager(self.runner.as_ref(), self.platform)
    }

    pub fn current_version(&self) -> Option<String> {
        detection::current_version(self.runner.as_ref())
    }

    pub fn list_versions(&self, kind: VersionManagerKind) -> Vec<RuntimeVersion> {
        let current = self.current_version();
        self.list_versions_with_current(kind, current.as_deref())
    }

    fn list_versions_with_current(
        &self,
        kind: VersionManagerKind,
        current: Option<&str>,
    ) -> Vec<RuntimeVersion> {
        let Some(invocation) = detection::list_invocation(kind) else {
            return Vec::new();
        };

        match invocation.run(self.runner.as_ref()) {
            Some(output) if output.success => parse_version_list(kind, &output.stdout, current),
            Some(output) => {
                log::warn!(
                    "Listing versions with {kind} failed: {}",
                    output.stderr.trim()
                );
                Vec::new()
            }
            None => Vec::new(),
        }
    }

    pub fn manager_info(&self) -> RuntimeVersionManagerInfo {
        let manager = self.detect_manager();
        let current_version = self.current_version();
        let available_versions = self.list_versions_with_current(manager, current_version.as_deref());

        log::info!(
            "Runtime manager: {manager}, current: {}, {} versions",
            current_version.as_deref().unwrap_or("unknown"),
            available_versions.len()
        );

        RuntimeVersionManagerInfo {
            is_installed: manager.is_installed(),
            manager,
            current_version,
            available_versions,
        }
    }
}
