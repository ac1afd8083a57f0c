use serde::Serialize;

/// Host OS family; every OS-dependent branch in the crate matches on this
/// instead of `cfg!` so the branches stay testable on any host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HostPlatform {
    Windows,
    MacOs,
    Linux,
}

impl HostPlatform {
    pub fn current() -> Self {
        if cfg!(target_os = "windows") {
            HostPlatform::Windows
        } else if cfg!(target_os = "macos") {
            HostPlatform::MacOs
        } else {
            HostPlatform::Linux
        }
    }

    pub fn is_windows(self) -> bool {
        self == HostPlatform::Windows
    }

    /// The platform with application bundles and `open -a`.
    pub fn is_bundle_aware(self) -> bool {
        self == HostPlatform::MacOs
    }
}
