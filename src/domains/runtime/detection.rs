use super::types::VersionManagerKind;
use crate::domains::projects::inspector::strip_version_prefix;
use crate::shared::binary_utils::first_output_line;
use crate::shared::{CommandRunner, HostPlatform};

/// Loads the nvm shell function; nvm has no binary of its own.
pub const NVM_SOURCE: &str =
    r#"export NVM_DIR="${NVM_DIR:-$HOME/.nvm}"; [ -s "$NVM_DIR/nvm.sh" ] && . "$NVM_DIR/nvm.sh""#;

pub fn nvm_shell_script(command: &str) -> String {
    format!("{NVM_SOURCE}; {command}")
}

/// A program plus its arguments, as handed to a [`CommandRunner`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolInvocation {
    pub program: &'static str,
    pub args: Vec<String>,
}

impl ToolInvocation {
    fn new(program: &'static str, args: &[&str]) -> Self {
        Self {
            program,
            args: args.iter().map(|a| a.to_string()).collect(),
        }
    }

    fn nvm_shell(command: &str) -> Self {
        Self {
            program: "bash",
            args: vec!["-c".to_string(), nvm_shell_script(command)],
        }
    }

    pub fn run(&self, runner: &dyn CommandRunner) -> Option<crate::shared::CommandOutput> {
        let args: Vec<&str> = self.args.iter().map(String::as_str).collect();
        runner.output(self.program, &args)
    }
}

pub fn probe_invocation(kind: VersionManagerKind) -> Option<ToolInvocation> {
    match kind {
        VersionManagerKind::Nvmd => Some(ToolInvocation::new("nvmd", &["--version"])),
        VersionManagerKind::Nvs => Some(ToolInvocation::new("nvs", &["--version"])),
        VersionManagerKind::NvmWindows => Some(ToolInvocation::new("nvm", &["version"])),
        VersionManagerKind::Nvm => Some(ToolInvocation::nvm_shell("command -v nvm")),
        VersionManagerKind::None => None,
    }
}

pub fn list_invocation(kind: VersionManagerKind) -> Option<ToolInvocation> {
    match kind {
        VersionManagerKind::Nvmd => Some(ToolInvocation::new("nvmd", &["ls"])),
        VersionManagerKind::Nvs => Some(ToolInvocation::new("nvs", &["ls"])),
        VersionManagerKind::NvmWindows => Some(ToolInvocation::new("nvm", &["list"])),
        VersionManagerKind::Nvm => Some(ToolInvocation::nvm_shell("nvm ls --no-colors")),
        VersionManagerKind::None => None,
    }
}

fn probe(runner: &dyn CommandRunner, kind: VersionManagerKind) -> bool {
    let detected = probe_invocation(kind)
        .and_then(|invocation| invocation.run(runner))
        .map(|output| output.success)
        .unwrap_or(false);
    log::debug!("Version manager probe {kind}: {detected}");
    detected
}

/// Ordered and short-circuiting: nvmd, nvs, then the OS-specific nvm.
pub fn detect_manager(runner: &dyn CommandRunner, platform: HostPlatform) -> VersionManagerKind {
    let platform_nvm = if platform.is_windows() {
        VersionManagerKind::NvmWindows
    } else {
        VersionManagerKind::Nvm
    };

    [VersionManagerKind::Nvmd, VersionManagerKind::Nvs, platform_nvm]
        .into_iter()
        .find(|kind| probe(runner, *kind))
        .unwrap_or(VersionManagerKind::None)
}

/// The runtime's own report (`node --version`), without the `v`.
pub fn current_version(runner: &dyn CommandRunner) -> Option<String> {
    let output = runner.output("node", &["--version"])?;
    if !output.success {
        return None;
    }
    let line = first_output_line(&output)?;
    let version = strip_version_prefix(&line);
    (!version.is_empty()).then(|| version.to_string())
}

/// Shell fragment that switches the active runtime before a run.
///
/// nvmd switches from its pin file on directory entry and needs nothing.
pub fn switch_command(kind: VersionManagerKind, version: &str) -> Option<String> {
    let version = strip_version_prefix(version);
    if version.is_empty() {
        return None;
    }
    match kind {
        VersionManagerKind::Nvm => Some(format!("{NVM_SOURCE} && nvm use {version}")),
        VersionManagerKind::NvmWindows => Some(format!("nvm use {version}")),
        VersionManagerKind::Nvs => Some(format!("nvs use {version}")),
        VersionManagerKind::Nvmd | VersionManagerKind::None => None,
    }
}
