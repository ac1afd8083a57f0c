use log::debug;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::thread;
use std::time::Duration;

/// Captured result of a finished external program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            success: true,
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    pub fn failed(stderr: impl Into<String>) -> Self {
        Self {
            success: false,
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }
}

/// Seam for every blocking probe of an external tool.
///
/// Implementations must never panic: a missing binary or a spawn error is
/// reported as `None`, a non-zero exit as `success == false`.
pub trait CommandRunner: Send + Sync {
    fn output(&self, program: &str, args: &[&str]) -> Option<CommandOutput>;

    /// True when `program` resolves on `PATH`.
    fn exists(&self, program: &str) -> bool;

    /// Starts `program` without waiting for it. With a `grace` period the
    /// child is given that long to fail; exiting non-zero inside it is an
    /// error, still running or exiting cleanly is success.
    fn spawn_detached(
        &self,
        program: &str,
        args: &[&str],
        grace: Option<Duration>,
    ) -> Result<(), String>;

    /// Runs a probe and reports only whether it exited successfully.
    fn succeeds(&self, program: &str, args: &[&str]) -> bool {
        self.output(program, args)
            .map(|out| out.success)
            .unwrap_or(false)
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemCommandRunner;

impl CommandRunner for SystemCommandRunner {
    fn output(&self, program: &str, args: &[&str]) -> Option<CommandOutput> {
        let resolved = resolve_program(program);
        match Command::new(&resolved).args(args).output() {
            Ok(output) => {
                let result = CommandOutput {
                    success: output.status.success(),
                    stdout: String::from_utf8_lossy(&output.stdout).to_string(),
                    stderr: String::from_utf8_lossy(&output.stderr).to_string(),
                };
                debug!(
                    "Probe `{program} {}` exited with {} ({} bytes stdout)",
                    args.join(" "),
                    output.status,
                    result.stdout.len()
                );
                Some(result)
            }
            Err(e) => {
                debug!("Probe `{program}` could not be started: {e}");
                None
            }
        }
    }

    fn exists(&self, program: &str) -> bool {
        which::which(program).is_ok()
    }

    fn spawn_detached(
        &self,
        program: &str,
        args: &[&str],
        grace: Option<Duration>,
    ) -> Result<(), String> {
        let mut child = Command::new(resolve_program(program))
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| format!("Failed to start {program}: {e}"))?;

        if let Some(grace) = grace {
            thread::sleep(grace);
            match child.try_wait() {
                Ok(Some(status)) if !status.success() => {
                    return Err(format!("{program} exited with status: {status}"));
                }
                Ok(_) => {}
                Err(e) => debug!("Could not poll {program} after spawn: {e}"),
            }
        }

        debug!("Spawned detached `{program}` (pid {})", child.id());
        // Reap in the background so a long-lived core does not collect zombies.
        thread::spawn(move || {
            let _ = child.wait();
        });
        Ok(())
    }
}

/// Prefers the `PATH`-resolved location so Windows `.cmd` shims are found.
pub fn resolve_program(program: &str) -> PathBuf {
    which::which(program).unwrap_or_else(|_| PathBuf::from(program))
}

/// First version-looking line of a tool's `--version` output.
pub fn first_output_line(output: &CommandOutput) -> Option<String> {
    let text = if output.stdout.trim().is_empty() {
        &output.stderr
    } else {
        &output.stdout
    };
    text.lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
pub mod testing {
    use super::*;
    use std::collections::{HashMap, HashSet};
    use std::sync::Mutex;

    /// Scripted runner: answers from a table keyed by the full command line.
    #[derive(Default)]
    pub struct FakeRunner {
        responses: HashMap<String, CommandOutput>,
        on_path: HashSet<String>,
        failing_spawns: HashSet<String>,
        pub calls: Mutex<Vec<String>>,
        pub spawned: Mutex<Vec<Vec<String>>>,
        pub grace_periods: Mutex<Vec<Option<Duration>>>,
    }

    impl FakeRunner {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn respond(mut self, command_line: &str, output: CommandOutput) -> Self {
            self.responses.insert(command_line.to_string(), output);
            self
        }

        pub fn with_binary(mut self, program: &str) -> Self {
            self.on_path.insert(program.to_string());
            self
        }

        pub fn fail_spawn(mut self, program: &str) -> Self {
            self.failing_spawns.insert(program.to_string());
            self
        }

        pub fn recorded(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        /// Every attempted spawn as `[program, args...]`, failed ones included.
        pub fn spawns(&self) -> Vec<Vec<String>> {
            self.spawned.lock().unwrap().clone()
        }

        /// Grace period passed with each spawn, in spawn order.
        pub fn graces(&self) -> Vec<Option<Duration>> {
            self.grace_periods.lock().unwrap().clone()
        }
    }

    impl CommandRunner for FakeRunner {
        fn output(&self, program: &str, args: &[&str]) -> Option<CommandOutput> {
            let line = if args.is_empty() {
                program.to_string()
            } else {
                format!("{program} {}", args.join(" "))
            };
            self.calls.lock().unwrap().push(line.clone());
            self.responses.get(&line).cloned()
        }

        fn exists(&self, program: &str) -> bool {
            self.on_path.contains(program)
        }

        fn spawn_detached(
            &self,
            program: &str,
            args: &[&str],
            grace: Option<Duration>,
        ) -> Result<(), String> {
            self.grace_periods.lock().unwrap().push(grace);
            let mut call = vec![program.to_string()];
            call.extend(args.iter().map(|a| a.to_string()));
            self.spawned.lock().unwrap().push(call);
            if self.failing_spawns.contains(program) {
                Err(format!("Failed to start {program}: not found"))
            } else {
                Ok(())
            }
        }
    }
}
