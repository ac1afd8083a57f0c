use crate::domains::terminal::external::TERMINAL_GRACE;
use crate::shared::{CommandRunner, HostPlatform};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EditorKind {
    Vscode,
    Cursor,
    Webstorm,
}

impl EditorKind {
    pub const ALL: [EditorKind; 3] = [EditorKind::Vscode, EditorKind::Cursor, EditorKind::Webstorm];

    pub fn id(self) -> &'static str {
        match self {
            EditorKind::Vscode => "vscode",
            EditorKind::Cursor => "cursor",
            EditorKind::Webstorm => "webstorm",
        }
    }

    /// Application name as macOS knows it.
    pub fn display_name(self) -> &'static str {
        match self {
            EditorKind::Vscode => "Visual Studio Code",
            EditorKind::Cursor => "Cursor",
            EditorKind::Webstorm => "WebStorm",
        }
    }

    /// Command-line launchers, tried in order.
    pub fn cli_candidates(self) -> &'static [&'static str] {
        match self {
            EditorKind::Vscode => &["code"],
            EditorKind::Cursor => &["cursor"],
            EditorKind::Webstorm => &["webstorm", "webstorm64", "webstorm.sh"],
        }
    }
}

impl FromStr for EditorKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "vscode" | "code" => Ok(EditorKind::Vscode),
            "cursor" => Ok(EditorKind::Cursor),
            "webstorm" => Ok(EditorKind::Webstorm),
            other => Err(format!("Unsupported editor: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditorAvailability {
    pub vscode: bool,
    pub cursor: bool,
    pub webstorm: bool,
}

impl EditorAvailability {
    fn set(&mut self, kind: EditorKind, available: bool) {
        match kind {
            EditorKind::Vscode => self.vscode = available,
            EditorKind::Cursor => self.cursor = available,
            EditorKind::Webstorm => self.webstorm = available,
        }
    }

    pub fn get(&self, kind: EditorKind) -> bool {
        match kind {
            EditorKind::Vscode => self.vscode,
            EditorKind::Cursor => self.cursor,
            EditorKind::Webstorm => self.webstorm,
        }
    }
}

#[derive(Clone)]
pub struct EditorBridge {
    runner: Arc<dyn CommandRunner>,
    platform: HostPlatform,
}

impl EditorBridge {
    pub fn new(runner: Arc<dyn CommandRunner>, platform: HostPlatform) -> Self {
        Self { runner, platform }
    }

    pub fn detect(&self) -> EditorAvailability {
        let mut available = EditorAvailability::default();
        for kind in EditorKind::ALL {
            let found = self.is_installed(kind);
            log::debug!("Editor {}: {}", kind.id(), found);
            available.set(kind, found);
        }
        available
    }

    fn is_installed(&self, kind: EditorKind) -> bool {
        if self.platform.is_bundle_aware() && self.has_application_bundle(kind) {
            return true;
        }
        self.cli_launcher(kind).is_some()
    }

    fn has_application_bundle(&self, kind: EditorKind) -> bool {
        let name = kind.display_name();
        let query = format!("id of application \"{name}\"");
        self.runner.succeeds("osascript", &["-e", query.as_str()])
            || Path::new("/Applications")
                .join(format!("{name}.app"))
                .exists()
    }

    fn cli_launcher(&self, kind: EditorKind) -> Option<&'static str> {
        kind.cli_candidates()
            .iter()
            .copied()
            .find(|candidate| self.runner.exists(candidate))
    }

    /// Launches the editor on `path`; any failure is reported as `false`.
    pub fn open(&self, kind: EditorKind, path: &str) -> bool {
        match self.open_path_in(kind, path) {
            Ok(()) => {
                log::info!("Opened {path} in {}", kind.display_name());
                true
            }
            Err(e) => {
                log::warn!("Failed to open {path} in {}: {e}", kind.display_name());
                false
            }
        }
    }

    fn open_path_in(&self, kind: EditorKind, path: &str) -> Result<(), String> {
        let working_dir = resolve_working_directory(path)?;

        if self.platform.is_bundle_aware() {
            return self.runner.spawn_detached(
                "open",
                &["-a", kind.display_name(), working_dir.as_str()],
                Some(TERMINAL_GRACE),
            );
        }

        let launcher = self.cli_launcher(kind).ok_or_else(|| {
            format!(
                "{} is not installed or not in PATH",
                kind.display_name()
            )
        })?;
        self.runner
            .spawn_detached(launcher, &[working_dir.as_str()], None)
    }
}

fn resolve_working_directory(path: &str) -> Result<String, String> {
    let candidate = Path::new(path);
    if candidate.is_absolute() {
        return candidate
            .to_str()
            .map(|s| s.to_string())
            .ok_or_else(|| "Working directory path contains invalid UTF-8".to_string());
    }

    let cwd = env::current_dir()
        .map_err(|e| format!("Failed to resolve current working directory: {e}"))?;
    let joined = cwd.join(candidate);
    joined
        .to_str()
        .map(|s| s.to_string())
        .ok_or_else(|| "Working directory path contains invalid UTF-8".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::binary_utils::testing::FakeRunner;
    use crate::shared::CommandOutput;

    fn bridge(runner: FakeRunner, platform: HostPlatform) -> (Arc<FakeRunner>, EditorBridge) {
        let runner = Arc::new(runner);
        let bridge = EditorBridge::new(runner.clone(), platform);
        (runner, bridge)
    }

    #[test]
    fn linux_detection_uses_cli_probes_only() {
        let (runner, bridge) = bridge(
            FakeRunner::new().with_binary("code").with_binary("webstorm.sh"),
            HostPlatform::Linux,
        );

        let found = bridge.detect();
        assert_eq!(
            found,
            EditorAvailability {
                vscode: true,
                cursor: false,
                webstorm: true
            }
        );
        assert!(runner.recorded().is_empty(), "no osascript off macOS");
    }

    #[test]
    fn macos_prefers_application_query() {
        let (_, bridge) = bridge(
            FakeRunner::new().respond(
                "osascript -e id of application \"Cursor\"",
                CommandOutput::ok("com.todesktop.230313mzl4w4u92"),
            ),
            HostPlatform::MacOs,
        );
        assert!(bridge.detect().cursor);
    }

    #[test]
    fn macos_falls_back_to_cli() {
        let (_, bridge) = bridge(
            FakeRunner::new()
                .respond(
                    "osascript -e id of application \"WebStorm\"",
                    CommandOutput::failed("Can't get application"),
                )
                .with_binary("webstorm"),
            HostPlatform::MacOs,
        );
        assert!(bridge.detect().webstorm);
    }

    #[test]
    fn webstorm_candidates_in_order() {
        let (runner, bridge) = bridge(
            FakeRunner::new().with_binary("webstorm64").with_binary("webstorm.sh"),
            HostPlatform::Linux,
        );
        assert!(bridge.open(EditorKind::Webstorm, "/work/app"));
        assert_eq!(runner.spawns(), vec![vec!["webstorm64", "/work/app"]]);
    }

    #[test]
    fn macos_opens_by_application_name() {
        let (runner, bridge) = bridge(FakeRunner::new(), HostPlatform::MacOs);
        assert!(bridge.open(EditorKind::Vscode, "/work/app"));
        assert_eq!(
            runner.spawns(),
            vec![vec!["open", "-a", "Visual Studio Code", "/work/app"]]
        );
        assert_eq!(runner.graces(), vec![Some(TERMINAL_GRACE)]);
    }

    #[test]
    fn macos_open_failure_is_false() {
        let (_, bridge) = bridge(FakeRunner::new().fail_spawn("open"), HostPlatform::MacOs);
        assert!(!bridge.open(EditorKind::Webstorm, "/work/app"));
    }

    #[test]
    fn missing_editor_or_failed_spawn_is_false() {
        let (_, missing) = bridge(FakeRunner::new(), HostPlatform::Linux);
        assert!(!missing.open(EditorKind::Cursor, "/work/app"));

        let (_, failing) = bridge(
            FakeRunner::new().with_binary("cursor").fail_spawn("cursor"),
            HostPlatform::Windows,
        );
        assert!(!failing.open(EditorKind::Cursor, "/work/app"));
    }

    #[test]
    fn parses_editor_ids() {
        assert_eq!("VSCode".parse::<EditorKind>().unwrap(), EditorKind::Vscode);
        assert_eq!("webstorm".parse::<EditorKind>().unwrap(), EditorKind::Webstorm);
        assert!("sublime".parse::<EditorKind>().is_err());
    }

    #[test]
    fn relative_paths_resolve_against_cwd() {
        let resolved = resolve_working_directory("some/dir").unwrap();
        assert!(Path::new(&resolved).is_absolute());
        assert!(resolved.ends_with("dir"));
    }
}
