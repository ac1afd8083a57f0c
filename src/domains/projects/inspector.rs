use super::types::Script;
use crate::domains::runtime::pin_file;
use regex::Regex;
use serde_json::Value;
use std::fs;
use std::path::Path;
use std::sync::LazyLock;

pub const MANIFEST_FILE: &str = "package.json";

static TRIPLE_VERSION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)\.(\d+)\.(\d+)").expect("valid triple regex"));
static MAJOR_VERSION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+").expect("valid major regex"));

/// A directory with a `package.json` at its root. Never errors.
pub fn is_valid_project(path: &Path) -> bool {
    path.is_dir() && path.join(MANIFEST_FILE).is_file()
}

/// Parsed manifest, or `None` when it is missing or not valid JSON.
pub fn read_manifest(path: &Path) -> Option<Value> {
    let manifest_path = path.join(MANIFEST_FILE);
    let contents = fs::read_to_string(&manifest_path).ok()?;
    match serde_json::from_str(&contents) {
        Ok(value) => Some(value),
        Err(e) => {
            log::warn!("Malformed manifest {}: {e}", manifest_path.display());
            None
        }
    }
}

/// Scripts in manifest order; empty when anything about the manifest is off.
pub fn read_scripts(path: &Path) -> Vec<Script> {
    let Some(manifest) = read_manifest(path) else {
        return Vec::new();
    };

    match manifest.get("scripts") {
        Some(Value::Object(scripts)) => scripts
            .iter()
            .filter_map(|(name, command)| {
                command
                    .as_str()
                    .map(|command| Script::new(name.clone(), command))
            })
            .collect(),
        _ => Vec::new(),
    }
}

/// Folder basename; stays stable when the manifest `name` changes.
pub fn read_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().to_string())
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| path.to_string_lossy().to_string())
}

pub fn read_manifest_name(path: &Path) -> Option<String> {
    read_manifest(path)?
        .get("name")?
        .as_str()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
}

/// Pin files first (nvmd, generic, nvm), then `engines.node`.
pub fn read_version_hint(path: &Path) -> Option<String> {
    for file_name in pin_file::PIN_FILE_PRIORITY {
        if let Some(version) = pin_file::read_pin_file(&path.join(file_name)) {
            log::debug!("Version hint {version} from {file_name} in {}", path.display());
            return Some(version);
        }
    }

    let manifest = read_manifest(path)?;
    let range = manifest.get("engines")?.get("node")?.as_str()?;
    version_from_engine_range(range)
}

/// `">=18.17.0 <21"` -> `18.17.0`, `"^20 || ^22"` -> `20`.
pub fn version_from_engine_range(range: &str) -> Option<String> {
    if let Some(caps) = TRIPLE_VERSION.captures(range) {
        return Some(format!("{}.{}.{}", &caps[1], &caps[2], &caps[3]));
    }
    MAJOR_VERSION
        .find(range)
        .map(|major| major.as_str().to_string())
}

pub fn strip_version_prefix(version: &str) -> &str {
    let trimmed = version.trim();
    trimmed
        .strip_prefix('v')
        .or_else(|| trimmed.strip_prefix('V'))
        .unwrap_or(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn project(manifest: &str) -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(MANIFEST_FILE), manifest).unwrap();
        dir
    }

    #[test]
    fn invalid_paths_are_false_not_errors() {
        assert!(!is_valid_project(Path::new("/nonexistent")));

        let dir = TempDir::new().unwrap();
        assert!(!is_valid_project(dir.path()));

        let file = dir.path().join("file.txt");
        fs::write(&file, "x").unwrap();
        assert!(!is_valid_project(&file));
    }

    #[test]
    fn manifest_only_at_root_counts() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("nested")).unwrap();
        fs::write(dir.path().join("nested").join(MANIFEST_FILE), "{}").unwrap();
        assert!(!is_valid_project(dir.path()));

        fs::write(dir.path().join(MANIFEST_FILE), "{}").unwrap();
        assert!(is_valid_project(dir.path()));
    }

    #[test]
    fn reads_single_script() {
        let dir = project(r#"{"scripts":{"dev":"vite"}}"#);
        assert_eq!(read_scripts(dir.path()), vec![Script::new("dev", "vite")]);
    }

    #[test]
    fn preserves_manifest_key_order() {
        let dir = project(
            r#"{"scripts":{"zeta":"z","build":"tsc","alpha":"a","dev":"vite"}}"#,
        );
        let names: Vec<_> = read_scripts(dir.path()).into_iter().map(|s| s.name).collect();
        assert_eq!(names, vec!["zeta", "build", "alpha", "dev"]);
    }

    #[test]
    fn malformed_manifests_yield_empty_scripts() {
        assert!(read_scripts(project("{ nope").path()).is_empty());
        assert!(read_scripts(project(r#"{"scripts":"dev"}"#).path()).is_empty());
        assert!(read_scripts(project(r#"{"name":"x"}"#).path()).is_empty());
        assert!(read_scripts(Path::new("/nonexistent")).is_empty());

        let dir = project(r#"{"scripts":{"ok":"run","bad":42}}"#);
        assert_eq!(read_scripts(dir.path()), vec![Script::new("ok", "run")]);
    }

    #[test]
    fn name_is_folder_basename() {
        let root = TempDir::new().unwrap();
        let dir = root.path().join("my-app");
        fs::create_dir(&dir).unwrap();
        fs::write(dir.join(MANIFEST_FILE), r#"{"name":"@scope/other"}"#).unwrap();

        assert_eq!(read_name(&dir), "my-app");
        assert_eq!(read_manifest_name(&dir).as_deref(), Some("@scope/other"));
    }

    #[test]
    fn version_hint_priority_order() {
        let dir = project(r#"{"engines":{"node":">=16.0.0"}}"#);
        assert_eq!(read_version_hint(dir.path()).as_deref(), Some("16.0.0"));

        fs::write(dir.path().join(".nvmrc"), "v18.1.0\n").unwrap();
        assert_eq!(read_version_hint(dir.path()).as_deref(), Some("18.1.0"));

        fs::write(dir.path().join(".node-version"), "19.0.0").unwrap();
        assert_eq!(read_version_hint(dir.path()).as_deref(), Some("19.0.0"));

        fs::write(dir.path().join(".nvmdrc"), "v20.5.1").unwrap();
        assert_eq!(read_version_hint(dir.path()).as_deref(), Some("20.5.1"));
    }

    #[test]
    fn blank_pin_file_falls_through() {
        let dir = project(r#"{"engines":{"node":"^20"}}"#);
        fs::write(dir.path().join(".nvmdrc"), "  \n").unwrap();
        assert_eq!(read_version_hint(dir.path()).as_deref(), Some("20"));
    }

    #[test]
    fn no_hint_at_all() {
        let dir = project("{}");
        assert_eq!(read_version_hint(dir.path()), None);
    }

    #[test]
    fn engine_range_extraction() {
        assert_eq!(version_from_engine_range(">=18.17.0 <21").as_deref(), Some("18.17.0"));
        assert_eq!(version_from_engine_range("^16 || >=18.2.1").as_deref(), Some("18.2.1"));
        assert_eq!(version_from_engine_range(">= 20").as_deref(), Some("20"));
        assert_eq!(version_from_engine_range("lts"), None);
    }

    #[test]
    fn strips_prefix() {
        assert_eq!(strip_version_prefix("v18.0.0"), "18.0.0");
        assert_eq!(strip_version_prefix(" 18.0.0 "), "18.0.0");
    }
}
