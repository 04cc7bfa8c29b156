pub mod bukkit;
pub mod spigot;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::Result;

pub use bukkit::BukkitCatalog;
pub use spigot::SpigotCatalog;

/// The remote catalog a manifest entry is resolved against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CatalogKind {
    Bukkit,
    Spigot,
}

impl fmt::Display for CatalogKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CatalogKind::Bukkit => f.write_str("Bukkit"),
            CatalogKind::Spigot => f.write_str("Spigot"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionRequest {
    Exact(String),
    Latest,
}

impl VersionRequest {
    /// `latest` (any case) selects the newest version.
    pub fn parse(version: &str) -> Self {
        if version.eq_ignore_ascii_case("latest") {
            VersionRequest::Latest
        } else {
            VersionRequest::Exact(version.to_string())
        }
    }
}

impl fmt::Display for VersionRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VersionRequest::Exact(v) => f.write_str(v),
            VersionRequest::Latest => f.write_str("latest"),
        }
    }
}

/// A catalog's answer for one package at one concrete version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceHandle {
    pub catalog: CatalogKind,
    pub identifier: String,
    pub name: String,
    pub available_versions: Vec<String>,
    pub version: String,
    pub download_url: String,
    /// Extension including the dot, e.g. `.jar`.
    pub file_type: String,
}

impl ResourceHandle {
    /// File name the artifact is saved under.
    pub fn file_name(&self, display_name: &str) -> String {
        let sanitize = |s: &str| s.replace(['/', '\\'], "_").replace("..", "_");
        format!(
            "{}-{}{}",
            sanitize(display_name),
            sanitize(&self.version),
            self.file_type
        )
    }
}

pub trait Catalog {
    fn kind(&self) -> CatalogKind;

    /// Look up a package by name or id at the requested version.
    ///
    /// An unknown package or version is `ResourceUnavailable`.
    fn resolve(&self, name_or_id: &str, version: &VersionRequest) -> Result<ResourceHandle>;
}

/// Extension of a file name or URL path, with the dot; `.jar` when absent.
pub(crate) fn file_type_of(name: &str) -> String {
    let last = name.rsplit('/').next().unwrap_or(name);
    match last.rfind('.') {
        Some(idx) if idx + 1 < last.len() => last[idx..].to_string(),
        _ => ".jar".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("latest", VersionRequest::Latest)]
    #[case("LATEST", VersionRequest::Latest)]
    #[case("1.7.3", VersionRequest::Exact("1.7.3".into()))]
    fn parses_version_requests(#[case] input: &str, #[case] expected: VersionRequest) {
        assert_eq!(VersionRequest::parse(input), expected);
    }

    #[rstest]
    #[case("Vault.jar", ".jar")]
    #[case("https://dev.bukkit.org/files/worldedit-6.1.zip", ".zip")]
    #[case("noextension", ".jar")]
    fn file_types(#[case] name: &str, #[case] expected: &str) {
        assert_eq!(file_type_of(name), expected);
    }

    #[test]
    fn file_name_is_sanitized() {
        let handle = ResourceHandle {
            catalog: CatalogKind::Spigot,
            identifier: "15290".into(),
            name: "Commons".into(),
            available_versions: vec!["1.8.8-3".into()],
            version: "1.8.8-3".into(),
            download_url: "https://example.com/d".into(),
            file_type: ".jar".into(),
        };
        assert_eq!(handle.file_name("Commons"), "Commons-1.8.8-3.jar");
        assert_eq!(handle.file_name("../evil/name"), "__evil_name-1.8.8-3.jar");
    }
}
