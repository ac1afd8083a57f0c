//! Parsers for the free-form `ls` output of each version manager.

use super::types::{RuntimeVersion, VersionManagerKind};
use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;

static VERSION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"v?(\d+)\.(\d+)\.(\d+)").expect("valid version regex"));
static NVS_PATH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(node/v?(\d+)\.(\d+)\.(\d+)(?:/[\w.-]+)?)").expect("valid nvs regex")
});
static NVM_ENTRY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:->|\*)?\s*v?(\d+)\.(\d+)\.(\d+)").expect("valid nvm regex")
});

/// Numeric sort key; lexical comparison would put 9.x above 18.x.
pub type VersionKey = (u64, u64, u64);

pub fn version_key(version: &str) -> VersionKey {
    let mut parts = version
        .trim()
        .trim_start_matches('v')
        .split('.')
        .map(|part| part.parse::<u64>().unwrap_or(0));
    (
        parts.next().unwrap_or(0),
        parts.next().unwrap_or(0),
        parts.next().unwrap_or(0),
    )
}

#[derive(Debug, PartialEq, Eq)]
struct LineMatch {
    version: String,
    path: Option<String>,
    marked_current: bool,
}

/// Parses a manager's list output into versions, newest first.
///
/// A line is current when it carries the manager's own marker or when its
/// version equals `current` (the runtime's self-reported version).
pub fn parse_version_list(
    kind: VersionManagerKind,
    raw: &str,
    current: Option<&str>,
) -> Vec<RuntimeVersion> {
    let current = current.map(|v| v.trim().trim_start_matches('v').to_string());
    let mut by_version: HashMap<String, RuntimeVersion> = HashMap::new();

    for line in raw.lines() {
        let Some(found) = parse_line(kind, line) else {
            continue;
        };
        let is_current =
            found.marked_current || current.as_deref() == Some(found.version.as_str());
        let mut entry = RuntimeVersion::new(found.version.clone(), is_current);
        entry.path = found.path;
        // Later lines replace earlier ones for the same version.
        by_version.insert(found.version, entry);
    }

    let mut versions: Vec<RuntimeVersion> = by_version.into_values().collect();
    versions.sort_by(|a, b| version_key(&b.version).cmp(&version_key(&a.version)));
    versions
}

fn parse_line(kind: VersionManagerKind, line: &str) -> Option<LineMatch> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return None;
    }

    match kind {
        VersionManagerKind::Nvmd => {
            let version = capture_version(&VERSION, trimmed, 1)?;
            Some(LineMatch {
                version,
                path: None,
                marked_current: trimmed.to_ascii_lowercase().contains("(currently)"),
            })
        }
        VersionManagerKind::Nvs => {
            let marked_current = trimmed.starts_with('>');
            if let Some(caps) = NVS_PATH.captures(trimmed) {
                return Some(LineMatch {
                    version: format!("{}.{}.{}", &caps[2], &caps[3], &caps[4]),
                    path: Some(caps[1].to_string()),
                    marked_current,
                });
            }
            Some(LineMatch {
                version: capture_version(&VERSION, trimmed, 1)?,
                path: None,
                marked_current,
            })
        }
        VersionManagerKind::NvmWindows => Some(LineMatch {
            version: capture_version(&VERSION, trimmed, 1)?,
            path: None,
            marked_current: trimmed.starts_with('*') || trimmed.contains("(Currently using"),
        }),
        VersionManagerKind::Nvm => {
            // Alias lines ("default -> 18 (-> v18.18.0)") do not start with a
            // version and are skipped.
            Some(LineMatch {
                version: capture_version(&NVM_ENTRY, trimmed, 1)?,
                path: None,
                marked_current: trimmed.starts_with("->") || trimmed.starts_with('*'),
            })
        }
        VersionManagerKind::None => None,
    }
}

fn capture_version(pattern: &Regex, text: &str, first_group: usize) -> Option<String> {
    let caps = pattern.captures(text)?;
    Some(format!(
        "{}.{}.{}",
        &caps[first_group],
        &caps[first_group + 1],
        &caps[first_group + 2]
    ))
}
