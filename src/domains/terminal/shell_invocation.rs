use crate::shared::HostPlatform;
use std::env;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellInvocation {
    pub program: String,
    pub args: Vec<String>,
}

/// Wraps `command` in the user's login shell (`cmd /C` on Windows).
pub fn build_login_shell_invocation(platform: HostPlatform, command: &str) -> ShellInvocation {
    if platform.is_windows() {
        return ShellInvocation {
            program: "cmd".to_string(),
            args: vec!["/C".to_string(), command.to_string()],
        };
    }
    build_login_shell_invocation_with_shell(&get_effective_shell(), command)
}

pub fn build_login_shell_invocation_with_shell(shell: &str, command: &str) -> ShellInvocation {
    let kind = classify_shell(shell);
    let mut args: Vec<String> = login_flags(kind).iter().map(|f| f.to_string()).collect();
    args.push(command_flag(kind).to_string());
    args.push(command.to_string());

    ShellInvocation {
        program: shell.to_string(),
        args,
    }
}

/// `$SHELL` when it resolves, else the first available fallback.
pub fn get_effective_shell() -> String {
    if let Ok(env_shell) = env::var("SHELL") {
        if which::which(&env_shell).is_ok() {
            return env_shell;
        }
        log::warn!("Environment variable SHELL={env_shell:?} is unavailable; falling back to defaults");
    }

    ["/bin/zsh", "/bin/bash", "/bin/sh"]
        .into_iter()
        .find(|candidate| Path::new(candidate).exists())
        .unwrap_or("sh")
        .to_string()
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ShellKind {
    BashLike,
    Fish,
    Nu,
    Tcsh,
    PowerShell,
    Unknown,
}

fn classify_shell(shell: &str) -> ShellKind {
    use ShellKind::*;
    let name = Path::new(shell)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(shell)
        .to_ascii_lowercase();

    match name.as_str() {
        "bash" | "zsh" | "ksh" | "sh" | "dash" | "ash" => BashLike,
        "fish" => Fish,
        "nu" | "nushell" => Nu,
        "tcsh" | "csh" => Tcsh,
        "pwsh" | "powershell" => PowerShell,
        _ => Unknown,
    }
}

fn login_flags(kind: ShellKind) -> &'static [&'static str] {
    use ShellKind::*;
    match kind {
        Nu => &["--login"],
        PowerShell => &["-Login"],
        BashLike | Fish | Tcsh | Unknown => &["-l"],
    }
}

fn command_flag(kind: ShellKind) -> &'static str {
    match kind {
        ShellKind::PowerShell => "-Command",
        _ => "-c",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn to_vec(args: &[&str]) -> Vec<String> {
        args.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn adds_login_flags_for_bash_like_shells() {
        let invocation = build_login_shell_invocation_with_shell("/bin/zsh", "npm run dev");
        assert_eq!(invocation.program, "/bin/zsh");
        assert_eq!(invocation.args, to_vec(&["-l", "-c", "npm run dev"]));
    }

    #[test]
    fn uses_nu_specific_flags() {
        let invocation = build_login_shell_invocation_with_shell("/usr/local/bin/nu", "pnpm dev");
        assert_eq!(invocation.args, to_vec(&["--login", "-c", "pnpm dev"]));
    }

    #[test]
    fn uses_powershell_flags() {
        let invocation = build_login_shell_invocation_with_shell("pwsh", "yarn build");
        assert_eq!(invocation.args, to_vec(&["-Login", "-Command", "yarn build"]));
    }

    #[test]
    fn windows_goes_through_cmd() {
        let invocation = build_login_shell_invocation(HostPlatform::Windows, "npm run dev");
        assert_eq!(invocation.program, "cmd");
        assert_eq!(invocation.args, to_vec(&["/C", "npm run dev"]));
    }

    #[cfg(unix)]
    #[test]
    #[serial]
    fn unavailable_shell_env_falls_back() {
        let prev = env::var("SHELL").ok();
        env::set_var("SHELL", "/nonexistent/devfleet-shell");

        let shell = get_effective_shell();
        assert_ne!(shell, "/nonexistent/devfleet-shell");

        if let Some(p) = prev {
            env::set_var("SHELL", p);
        } else {
            env::remove_var("SHELL");
        }
    }
}
