use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum VersionManagerKind {
    /// Cross-platform, probed first.
    Nvmd,
    /// Cross-platform, probed second.
    Nvs,
    NvmWindows,
    Nvm,
    None,
}

impl VersionManagerKind {
    pub fn as_str(self) -> &'static str {
        match self {
            VersionManagerKind::Nvmd => "nvmd",
            VersionManagerKind::Nvs => "nvs",
            VersionManagerKind::NvmWindows => "nvm-windows",
            VersionManagerKind::Nvm => "nvm",
            VersionManagerKind::None => "none",
        }
    }

    pub fn is_installed(self) -> bool {
        self != VersionManagerKind::None
    }
}

impl fmt::Display for VersionManagerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuntimeVersion {
    /// Bare `major.minor.patch`.
    pub version: String,
    /// `v`-prefixed form.
    pub full_version: String,
    pub is_current: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl RuntimeVersion {
    pub fn new(version: impl Into<String>, is_current: bool) -> Self {
        let version = version.into();
        Self {
            full_version: format!("v{version}"),
            version,
            is_current,
            path: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuntimeVersionManagerInfo {
    pub is_installed: bool,
    pub manager: VersionManagerKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_version: Option<String>,
    pub available_versions: Vec<RuntimeVersion>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_serialize_kebab_case() {
        assert_eq!(
            serde_json::to_value(VersionManagerKind::NvmWindows).unwrap(),
            "nvm-windows"
        );
        assert_eq!(serde_json::to_value(VersionManagerKind::None).unwrap(), "none");
        assert!(!VersionManagerKind::None.is_installed());
        assert!(VersionManagerKind::Nvs.is_installed());
    }

    #[test]
    fn runtime_version_full_form() {
        let v = RuntimeVersion::new("18.18.0", true);
        assert_eq!(v.full_version, "v18.18.0");
        let json = serde_json::to_value(&v).unwrap();
        assert_eq!(json["isCurrent"], true);
        assert!(json.get("path").is_none());
    }
}
