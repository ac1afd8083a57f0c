use super::shell_invocation::{
    build_login_shell_invocation, build_login_shell_invocation_with_shell,
};
use super::{LaunchError, SupervisedLaunch};
use crate::shared::HostPlatform;
use chrono::Utc;
use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
#[cfg(unix)]
use std::thread;
#[cfg(unix)]
use std::time::{Duration, Instant};

#[cfg(unix)]
const TERM_TIMEOUT: Duration = Duration::from_millis(1500);
#[cfg(unix)]
const POLL_SLICE: Duration = Duration::from_millis(100);

struct TrackedRun {
    child: Child,
    launch: SupervisedLaunch,
}

/// Children started in attached mode, keyed by project id. Each child
/// leads its own process group so stopping it also takes down whatever
/// the script spawned.
///
/// Dropping the registry leaves children running; call [`stop_all`] on
/// shutdown to take them down.
///
/// [`stop_all`]: ProcessRegistry::stop_all
pub struct ProcessRegistry {
    runs: HashMap<String, TrackedRun>,
    log_dir: Option<PathBuf>,
    platform: HostPlatform,
    shell: Option<String>,
}

impl ProcessRegistry {
    pub fn new(log_dir: Option<PathBuf>, platform: HostPlatform) -> Self {
        Self {
            runs: HashMap::new(),
            log_dir,
            platform,
            shell: None,
        }
    }

    /// Runs commands through `shell` instead of the detected login shell.
    pub fn with_shell(mut self, shell: impl Into<String>) -> Self {
        self.shell = Some(shell.into());
        self
    }

    pub fn start(
        &mut self,
        project_id: &str,
        path: &str,
        command: &str,
        switch: Option<&str>,
    ) -> Result<SupervisedLaunch, LaunchError> {
        if self.is_running(project_id) {
            return Err(LaunchError::AlreadyRunning(project_id.to_string()));
        }

        if !Path::new(path).is_dir() {
            return Err(LaunchError::Spawn(format!("{path} is not a directory")));
        }

        let line = match switch {
            Some(prefix) => format!("{prefix} && {command}"),
            None => command.to_string(),
        };
        let invocation = match &self.shell {
            Some(shell) => build_login_shell_invocation_with_shell(shell, &line),
            None => build_login_shell_invocation(self.platform, &line),
        };

        let mut cmd = Command::new(&invocation.program);
        cmd.args(&invocation.args)
            .current_dir(path)
            .stdin(Stdio::null());
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            cmd.process_group(0);
        }

        let started_at = Utc::now();
        let log_file = match self.open_log(project_id, &line, started_at)? {
            Some((file, log_path)) => {
                cmd.stdout(file.try_clone()?).stderr(file);
                Some(log_path)
            }
            None => {
                cmd.stdout(Stdio::null()).stderr(Stdio::null());
                None
            }
        };

        let child = cmd
            .spawn()
            .map_err(|e| LaunchError::Spawn(format!("{}: {e}", invocation.program)))?;

        let launch = SupervisedLaunch {
            pid: child.id(),
            command: line,
            log_file: log_file.map(|p| p.display().to_string()),
            started_at,
        };
        log::info!(
            "Started {project_id} as pid {} in {path}: {}",
            launch.pid,
            launch.command
        );

        self.runs.insert(
            project_id.to_string(),
            TrackedRun {
                child,
                launch: launch.clone(),
            },
        );
        Ok(launch)
    }

    fn open_log(
        &self,
        project_id: &str,
        line: &str,
        started_at: chrono::DateTime<Utc>,
    ) -> Result<Option<(File, PathBuf)>, LaunchError> {
        let Some(dir) = &self.log_dir else {
            return Ok(None);
        };
        fs::create_dir_all(dir)?;

        let log_path = dir.join(format!("{project_id}.log"));
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_path)?;
        writeln!(file, "--- {} $ {line}", started_at.to_rfc3339())?;
        Ok(Some((file, log_path)))
    }

    /// Polls the tracked child; an exited child is reaped and forgotten.
    pub fn is_running(&mut self, project_id: &str) -> bool {
        let Some(run) = self.runs.get_mut(project_id) else {
            return false;
        };

        match run.child.try_wait() {
            Ok(None) => true,
            Ok(Some(status)) => {
                log::info!("{project_id} (pid {}) exited: {status}", run.launch.pid);
                self.runs.remove(project_id);
                false
            }
            Err(e) => {
                log::warn!("Could not poll {project_id}: {e}");
                self.runs.remove(project_id);
                false
            }
        }
    }

    /// Kills the tracked child with its descendants and reaps it. `false`
    /// when nothing was tracked.
    pub fn stop(&mut self, project_id: &str) -> bool {
        let Some(mut run) = self.runs.remove(project_id) else {
            return false;
        };

        terminate_tree(&mut run.child);
        if let Err(e) = run.child.kill() {
            log::debug!("Kill of {project_id} (pid {}) failed: {e}", run.launch.pid);
        }
        match run.child.wait() {
            Ok(status) => log::info!("Stopped {project_id}: {status}"),
            Err(e) => log::warn!("Failed to reap {project_id}: {e}"),
        }
        true
    }

    pub fn stop_all(&mut self) {
        let ids: Vec<String> = self.runs.keys().cloned().collect();
        if !ids.is_empty() {
            log::info!("Stopping {} tracked run(s)", ids.len());
        }
        for id in ids {
            self.stop(&id);
        }
    }

    pub fn running_ids(&mut self) -> Vec<String> {
        let ids: Vec<String> = self.runs.keys().cloned().collect();
        ids.into_iter().filter(|id| self.is_running(id)).collect()
    }
}

/// SIGTERM to the child's process group, then SIGKILL once
/// [`TERM_TIMEOUT`] passes with members still alive.
#[cfg(unix)]
fn terminate_tree(child: &mut Child) {
    let group = -(child.id() as libc::pid_t);

    if !signal_group(group, libc::SIGTERM) {
        return;
    }

    let deadline = Instant::now() + TERM_TIMEOUT;
    while Instant::now() < deadline {
        // Reaping the leader keeps a zombie from counting as a live member.
        let _ = child.try_wait();
        if !group_alive(group) {
            return;
        }
        thread::sleep(POLL_SLICE);
    }

    log::debug!("Escalating to SIGKILL for process group {}", -group);
    signal_group(group, libc::SIGKILL);
}

/// `false` when the group no longer exists.
#[cfg(unix)]
fn signal_group(group: libc::pid_t, signal: libc::c_int) -> bool {
    let result = unsafe { libc::kill(group, signal) };
    if result == -1 {
        let err = std::io::Error::last_os_error();
        match err.raw_os_error() {
            Some(libc::ESRCH) => return false,
            Some(libc::EPERM) => {
                log::warn!("Insufficient permissions to signal process group {}", -group);
            }
            _ => log::warn!("Failed to signal process group {}: {err}", -group),
        }
    }
    true
}

#[cfg(unix)]
fn group_alive(group: libc::pid_t) -> bool {
    unsafe { libc::kill(group, 0) == 0 }
}

#[cfg(windows)]
fn terminate_tree(child: &mut Child) {
    let pid = child.id().to_string();
    match Command::new("taskkill")
        .args(["/T", "/F", "/PID", &pid])
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
    {
        Ok(status) if status.success() => {}
        Ok(status) => log::debug!("taskkill for pid {pid} exited with {status}"),
        Err(e) => log::warn!("Failed to run taskkill for pid {pid}: {e}"),
    }
}

#[cfg(not(any(unix, windows)))]
fn terminate_tree(_child: &mut Child) {}
