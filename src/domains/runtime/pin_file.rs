use super::types::VersionManagerKind;
use crate::domains::projects::inspector::strip_version_prefix;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

pub const NVMD_PIN_FILE: &str = ".nvmdrc";
pub const GENERIC_PIN_FILE: &str = ".node-version";
pub const NVM_PIN_FILE: &str = ".nvmrc";

/// Lookup order used when reading a project's version hint.
pub const PIN_FILE_PRIORITY: [&str; 3] = [NVMD_PIN_FILE, GENERIC_PIN_FILE, NVM_PIN_FILE];

/// Fixed per manager kind, independent of the host OS.
pub fn pin_file_name(kind: VersionManagerKind) -> &'static str {
    match kind {
        VersionManagerKind::Nvmd => NVMD_PIN_FILE,
        VersionManagerKind::Nvs => GENERIC_PIN_FILE,
        VersionManagerKind::NvmWindows | VersionManagerKind::Nvm | VersionManagerKind::None => {
            NVM_PIN_FILE
        }
    }
}

pub fn pin_file_path(project_path: &Path, kind: VersionManagerKind) -> PathBuf {
    project_path.join(pin_file_name(kind))
}

/// Trimmed, `v`-stripped content; `None` for missing or blank files.
pub fn read_pin_file(path: &Path) -> Option<String> {
    let contents = fs::read_to_string(path).ok()?;
    let version = strip_version_prefix(&contents);
    if version.is_empty() {
        None
    } else {
        Some(version.to_string())
    }
}

/// Writes `version` as the whole pin file, or deletes the file when the
/// version is `None` or blank. Deleting a missing file succeeds.
pub fn set_pin_file(
    project_path: &Path,
    version: Option<&str>,
    kind: VersionManagerKind,
) -> io::Result<()> {
    let path = pin_file_path(project_path, kind);
    let version = version.map(strip_version_prefix).filter(|v| !v.is_empty());

    match version {
        Some(version) => {
            fs::write(&path, version)?;
            log::info!("Pinned {} to {version}", path.display());
            Ok(())
        }
        None => match fs::remove_file(&path) {
            Ok(()) => {
                log::info!("Removed pin file {}", path.display());
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        },
    }
}
