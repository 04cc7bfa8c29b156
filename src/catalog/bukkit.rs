//! Bukkit plugins via the BukGet v3 API.

use serde::Deserialize;

use crate::catalog::{file_type_of, Catalog, CatalogKind, ResourceHandle, VersionRequest};
use crate::error::{ResolverError, Result};
use crate::net::Fetcher;

pub const DEFAULT_API: &str = "https://api.bukget.org/3";

#[derive(Debug, Deserialize)]
pub(crate) struct BukgetPlugin {
    pub slug: String,
    #[serde(default)]
    pub plugin_name: Option<String>,
    #[serde(default)]
    pub versions: Vec<BukgetVersion>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct BukgetVersion {
    pub version: String,
    pub download: String,
    #[serde(default)]
    pub filename: Option<String>,
}

pub struct BukkitCatalog {
    fetcher: Fetcher,
    api: String,
}

impl BukkitCatalog {
    pub fn new(fetcher: Fetcher, api: impl Into<String>) -> Self {
        Self {
            fetcher,
            api: api.into().trim_end_matches('/').to_string(),
        }
    }
}

impl Catalog for BukkitCatalog {
    fn kind(&self) -> CatalogKind {
        CatalogKind::Bukkit
    }

    fn resolve(&self, name_or_id: &str, version: &VersionRequest) -> Result<ResourceHandle> {
        let slug = name_or_id.trim().to_lowercase();
        if slug.is_empty() || slug.chars().all(|c| c.is_ascii_digit()) {
            return Err(ResolverError::InvalidPackage {
                package: name_or_id.to_string(),
                reason: "Bukkit plugins are looked up by name or slug, not by number".into(),
            });
        }

        let plugin: BukgetPlugin = self
            .fetcher
            .get_json(&format!("{}/plugins/bukkit/{slug}", self.api))
            .map_err(|e| match e {
                ResolverError::Download { .. } => ResolverError::ResourceUnavailable {
                    catalog: CatalogKind::Bukkit.to_string(),
                    package: name_or_id.to_string(),
                    version: version.to_string(),
                },
                other => other,
            })?;

        build_handle(plugin, version)
    }
}

/// BukGet lists versions newest first.
pub(crate) fn build_handle(plugin: BukgetPlugin, request: &VersionRequest) -> Result<ResourceHandle> {
    let selected = match request {
        VersionRequest::Exact(wanted) => plugin.versions.iter().find(|v| &v.version == wanted),
        VersionRequest::Latest => plugin.versions.first(),
    };
    let Some(selected) = selected else {
        return Err(ResolverError::ResourceUnavailable {
            catalog: CatalogKind::Bukkit.to_string(),
            package: plugin.slug,
            version: request.to_string(),
        });
    };

    let file_type = file_type_of(selected.filename.as_deref().unwrap_or(&selected.download));

    Ok(ResourceHandle {
        catalog: CatalogKind::Bukkit,
        name: plugin.plugin_name.clone().unwrap_or_else(|| plugin.slug.clone()),
        identifier: plugin.slug.clone(),
        version: selected.version.clone(),
        download_url: selected.download.clone(),
        file_type,
        available_versions: plugin.versions.iter().map(|v| v.version.clone()).collect(),
    })
}
