use super::{DetachedLaunch, LaunchError};
use crate::shared::{CommandRunner, HostPlatform};
use std::sync::Arc;
use std::time::Duration;

/// How long a freshly spawned terminal gets to fail before it counts as open.
pub const TERMINAL_GRACE: Duration = Duration::from_millis(150);

/// Linux terminal emulators in preference order, with the flags that keep
/// the window open and hand the rest of the argv to the program.
const LINUX_TERMINALS: &[(&str, &[&str])] = &[
    ("x-terminal-emulator", &["-e"]),
    ("gnome-terminal", &["--"]),
    ("konsole", &["--noclose", "-e"]),
    ("xfce4-terminal", &["--hold", "-x"]),
    ("kitty", &["--hold"]),
    ("alacritty", &["--hold", "-e"]),
    ("xterm", &["-hold", "-e"]),
];

#[derive(Clone)]
pub struct ExternalLauncher {
    runner: Arc<dyn CommandRunner>,
    platform: HostPlatform,
}

impl ExternalLauncher {
    pub fn new(runner: Arc<dyn CommandRunner>, platform: HostPlatform) -> Self {
        Self { runner, platform }
    }

    /// Opens a new terminal window in `path` running `command`, optionally
    /// preceded by a runtime switch. Nothing is tracked after the spawn.
    pub fn launch(
        &self,
        path: &str,
        command: &str,
        switch: Option<&str>,
    ) -> Result<DetachedLaunch, LaunchError> {
        let line = self.chain(switch, command);
        log::info!("Launching `{line}` in {path} ({:?})", self.platform);

        match self.platform {
            HostPlatform::Windows => self.launch_windows(path, &line),
            HostPlatform::MacOs => self.launch_macos(path, &line),
            HostPlatform::Linux => self.launch_linux(path, &line),
        }
    }

    fn chain(&self, switch: Option<&str>, command: &str) -> String {
        match switch {
            Some(prefix) if self.platform.is_windows() => format!("{prefix}; {command}"),
            Some(prefix) => format!("{prefix} && {command}"),
            None => command.to_string(),
        }
    }

    fn launch_windows(&self, path: &str, line: &str) -> Result<DetachedLaunch, LaunchError> {
        let script = windows_script(path, line);
        self.runner
            .spawn_detached(
                "cmd",
                &["/C", "start", "", "powershell", "-NoExit", "-Command", script.as_str()],
                None,
            )
            .map_err(LaunchError::Spawn)?;

        Ok(DetachedLaunch {
            terminal: "powershell".to_string(),
            command: line.to_string(),
        })
    }

    fn launch_macos(&self, path: &str, line: &str) -> Result<DetachedLaunch, LaunchError> {
        let do_script = format!("do script \"{}\"", applescript_escape(&macos_line(path, line)));
        self.runner
            .spawn_detached(
                "osascript",
                &[
                    "-e",
                    "tell application \"Terminal\"",
                    "-e",
                    "activate",
                    "-e",
                    do_script.as_str(),
                    "-e",
                    "end tell",
                ],
                Some(TERMINAL_GRACE),
            )
            .map_err(LaunchError::Spawn)?;

        Ok(DetachedLaunch {
            terminal: "Terminal".to_string(),
            command: line.to_string(),
        })
    }

    fn launch_linux(&self, path: &str, line: &str) -> Result<DetachedLaunch, LaunchError> {
        let script = linux_line(path, line);

        for (terminal, hold_flags) in LINUX_TERMINALS {
            if !self.runner.exists(terminal) {
                continue;
            }

            let mut args: Vec<&str> = hold_flags.to_vec();
            args.extend(["bash", "-c", script.as_str()]);

            match self.runner.spawn_detached(terminal, &args, Some(TERMINAL_GRACE)) {
                Ok(()) => {
                    return Ok(DetachedLaunch {
                        terminal: terminal.to_string(),
                        command: line.to_string(),
                    })
                }
                Err(e) => log::warn!("Terminal {terminal} failed, trying next: {e}"),
            }
        }

        Err(LaunchError::NoTerminal)
    }
}

fn windows_script(path: &str, line: &str) -> String {
    format!(
        "Set-Location -LiteralPath '{}'; {line}",
        path.replace('\'', "''")
    )
}

fn macos_line(path: &str, line: &str) -> String {
    format!("cd \"{}\" && {line}", path.replace('"', "\\\""))
}

fn linux_line(path: &str, line: &str) -> String {
    format!("cd {} && {line}; exec bash", shell_words::quote(path))
}

fn applescript_escape(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}
