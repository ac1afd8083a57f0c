use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

pub mod external;
pub mod shell_invocation;
pub mod supervised;

pub use external::ExternalLauncher;
pub use shell_invocation::{build_login_shell_invocation, ShellInvocation};
pub use supervised::ProcessRegistry;

#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("project is already running: {0}")]
    AlreadyRunning(String),
    #[error("no usable terminal emulator found")]
    NoTerminal,
    #[error("failed to start process: {0}")]
    Spawn(String),
}

impl From<std::io::Error> for LaunchError {
    fn from(err: std::io::Error) -> Self {
        LaunchError::Spawn(err.to_string())
    }
}

/// Fire-and-forget run in a separate terminal window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DetachedLaunch {
    pub terminal: String,
    pub command: String,
}

/// Run owned by the core's process registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SupervisedLaunch {
    pub pid: u32,
    pub command: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_file: Option<String>,
    pub started_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum RunOutcome {
    Detached(DetachedLaunch),
    Supervised(SupervisedLaunch),
}

impl RunOutcome {
    pub fn is_tracked(&self) -> bool {
        matches!(self, RunOutcome::Supervised(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcome_is_tagged_by_mode() {
        let outcome = RunOutcome::Detached(DetachedLaunch {
            terminal: "gnome-terminal".into(),
            command: "npm run dev".into(),
        });
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["mode"], "detached");
        assert_eq!(json["terminal"], "gnome-terminal");
        assert!(!outcome.is_tracked());
    }

    #[test]
    fn supervised_outcome_uses_camel_case() {
        let outcome = RunOutcome::Supervised(SupervisedLaunch {
            pid: 42,
            command: "bun dev".into(),
            log_file: None,
            started_at: Utc::now(),
        });
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["mode"], "supervised");
        assert_eq!(json["pid"], 42);
        assert!(json.get("startedAt").is_some());
        assert!(json.get("logFile").is_none());
        assert!(outcome.is_tracked());
    }

    #[test]
    fn no_terminal_message() {
        assert_eq!(
            LaunchError::NoTerminal.to_string(),
            "no usable terminal emulator found"
        );
    }
}
