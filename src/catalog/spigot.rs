//! Spigot resources via the Spiget v2 API.

use serde::Deserialize;

use crate::catalog::{Catalog, CatalogKind, ResourceHandle, VersionRequest};
use crate::error::{ResolverError, Result};
use crate::net::Fetcher;

pub const DEFAULT_API: &str = "https://api.spiget.org/v2";

#[derive(Debug, Deserialize)]
pub(crate) struct SpigetResource {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub file: Option<SpigetFile>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SpigetFile {
    #[serde(rename = "type", default)]
    pub file_type: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SpigetVersion {
    pub id: u64,
    pub name: String,
}

pub struct SpigotCatalog {
    fetcher: Fetcher,
    api: String,
}

impl SpigotCatalog {
    pub fn new(fetcher: Fetcher, api: impl Into<String>) -> Self {
        Self {
            fetcher,
            api: api.into().trim_end_matches('/').to_string(),
        }
    }
}

impl Catalog for SpigotCatalog {
    fn kind(&self) -> CatalogKind {
        CatalogKind::Spigot
    }

    fn resolve(&self, name_or_id: &str, version: &VersionRequest) -> Result<ResourceHandle> {
        let id: u64 = name_or_id
            .trim()
            .parse()
            .map_err(|_| ResolverError::InvalidPackage {
                package: name_or_id.to_string(),
                reason: "Spigot resources are looked up by numeric id".into(),
            })?;

        let unavailable = || ResolverError::ResourceUnavailable {
            catalog: CatalogKind::Spigot.to_string(),
            package: name_or_id.to_string(),
            version: version.to_string(),
        };

        let resource: SpigetResource = self
            .fetcher
            .get_json(&format!("{}/resources/{id}", self.api))
            .map_err(|e| match e {
                ResolverError::Download { .. } => unavailable(),
                other => other,
            })?;
        let versions: Vec<SpigetVersion> = self.fetcher.get_json(&format!(
            "{}/resources/{id}/versions?size=1000",
            self.api
        ))?;

        build_handle(&self.api, resource, versions, version)
    }
}

pub(crate) fn build_handle(
    api: &str,
    resource: SpigetResource,
    versions: Vec<SpigetVersion>,
    request: &VersionRequest,
) -> Result<ResourceHandle> {
    let selected = match request {
        VersionRequest::Exact(wanted) => versions.iter().find(|v| &v.name == wanted),
        VersionRequest::Latest => versions.iter().max_by_key(|v| v.id),
    };
    let Some(selected) = selected else {
        return Err(ResolverError::ResourceUnavailable {
            catalog: CatalogKind::Spigot.to_string(),
            package: resource.id.to_string(),
            version: request.to_string(),
        });
    };

    let file_type = resource
        .file
        .as_ref()
        .and_then(|f| f.file_type.as_deref())
        .filter(|t| t.starts_with('.'))
        .map(str::to_string)
        .unwrap_or_else(|| ".jar".to_string());

    Ok(ResourceHandle {
        catalog: CatalogKind::Spigot,
        identifier: resource.id.to_string(),
        name: resource.name,
        download_url: format!(
            "{api}/resources/{}/versions/{}/download",
            resource.id, selected.id
        ),
        version: selected.name.clone(),
        available_versions: versions.into_iter().map(|v| v.name).collect(),
        file_type,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture() -> (SpigetResource, Vec<SpigetVersion>) {
        let resource: SpigetResource = serde_json::from_str(
            r#"{"id": 15290, "name": "Commons", "tag": "library",
                "file": {"type": ".jar", "size": 1.2, "sizeUnit": "MB", "url": "resources/commons.15290/download?version=1"}}"#,
        )
        .unwrap();
        let versions: Vec<SpigetVersion> = serde_json::from_str(
            r#"[{"id": 100, "name": "1.8.8-2", "releaseDate": 1},
                {"id": 120, "name": "1.8.8-3", "releaseDate": 2},
                {"id": 110, "name": "1.8.8-2b", "releaseDate": 3}]"#,
        )
        .unwrap();
        (resource, versions)
    }

    #[test]
    fn resolves_exact_version() {
        let (resource, versions) = fixture();
        let handle = build_handle(
            DEFAULT_API,
            resource,
            versions,
            &VersionRequest::Exact("1.8.8-2".into()),
        )
        .unwrap();
        assert_eq!(handle.version, "1.8.8-2");
        assert_eq!(
            handle.download_url,
            "https://api.spiget.org/v2/resources/15290/versions/100/download"
        );
        assert_eq!(handle.file_type, ".jar");
        assert_eq!(handle.available_versions.len(), 3);
    }

    #[test]
    fn latest_is_the_highest_version_id() {
        let (resource, versions) = fixture();
        let handle = build_handle(DEFAULT_API, resource, versions, &VersionRequest::Latest).unwrap();
        assert_eq!(handle.version, "1.8.8-3");
    }

    #[test]
    fn unknown_version_is_unavailable() {
        let (resource, versions) = fixture();
        let err = build_handle(
            DEFAULT_API,
            resource,
            versions,
            &VersionRequest::Exact("9.9".into()),
        )
        .unwrap_err();
        assert!(matches!(err, ResolverError::ResourceUnavailable { ref version, .. } if version == "9.9"));
    }

    #[test]
    fn external_file_type_defaults_to_jar() {
        let resource: SpigetResource =
            serde_json::from_str(r#"{"id": 1, "name": "X", "file": {"type": "external"}}"#).unwrap();
        let versions = vec![SpigetVersion {
            id: 1,
            name: "1.0".into(),
        }];
        let handle = build_handle(DEFAULT_API, resource, versions, &VersionRequest::Latest).unwrap();
        assert_eq!(handle.file_type, ".jar");
    }

    #[test]
    fn non_numeric_id_is_rejected_without_network() {
        let fetcher = Fetcher::new(crate::net::DEFAULT_TIMEOUT, crate::net::DEFAULT_USER_AGENT).unwrap();
        let catalog = SpigotCatalog::new(fetcher, DEFAULT_API);
        let err = catalog.resolve("Commons", &VersionRequest::Latest).unwrap_err();
        assert!(matches!(err, ResolverError::InvalidPackage { .. }));
    }
}
