use super::inspector::read_manifest;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PackageManager {
    #[default]
    Npm,
    Yarn,
    Pnpm,
    Bun,
}

/// Lockfiles in resolution priority; the first present one decides.
const LOCKFILES: &[(&str, PackageManager)] = &[
    ("bun.lockb", PackageManager::Bun),
    ("bun.lock", PackageManager::Bun),
    ("pnpm-lock.yaml", PackageManager::Pnpm),
    ("yarn.lock", PackageManager::Yarn),
    ("package-lock.json", PackageManager::Npm),
];

impl PackageManager {
    pub fn as_str(self) -> &'static str {
        match self {
            PackageManager::Npm => "npm",
            PackageManager::Yarn => "yarn",
            PackageManager::Pnpm => "pnpm",
            PackageManager::Bun => "bun",
        }
    }

    /// Only npm needs the explicit `run` keyword.
    pub fn run_command(self, script: &str) -> String {
        match self {
            PackageManager::Npm => format!("npm run {script}"),
            other => format!("{} {script}", other.as_str()),
        }
    }
}

impl fmt::Display for PackageManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PackageManager {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "npm" => Ok(PackageManager::Npm),
            "yarn" => Ok(PackageManager::Yarn),
            "pnpm" => Ok(PackageManager::Pnpm),
            "bun" => Ok(PackageManager::Bun),
            other => Err(format!("Unknown package manager: {other}")),
        }
    }
}

/// Never fails: unknown or corrupt input resolves to npm.
pub fn resolve(path: &Path) -> PackageManager {
    if let Some((lockfile, manager)) = LOCKFILES
        .iter()
        .find(|(lockfile, _)| path.join(lockfile).is_file())
    {
        log::debug!(
            "Resolved {manager} for {} from {lockfile}",
            path.display()
        );
        return *manager;
    }

    let declared = read_manifest(path).and_then(|manifest| {
        manifest
            .get("packageManager")
            .and_then(|value| value.as_str())
            .map(str::to_string)
    });

    match declared {
        Some(spec) => {
            let kind = spec.split('@').next().unwrap_or_default();
            kind.parse().unwrap_or_else(|_| {
                log::debug!("Ignoring unrecognised packageManager field '{spec}'");
                PackageManager::default()
            })
        }
        None => PackageManager::default(),
    }
}

pub fn build_run_command(kind: PackageManager, script: &str) -> String {
    kind.run_command(script)
}
