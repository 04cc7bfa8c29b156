use std::path::Path;

use indexmap::IndexMap;
use serde::Deserialize;
use serde_yaml::{Mapping, Value};

use crate::catalog::CatalogKind;
use crate::error::{ResolverError, Result};
use crate::render::options::{options_from_yaml, Options};
use crate::template::flatten::key_text;

const DEFAULT_CONFIG_FILE: &str = "config.yml";

#[derive(Debug, Deserialize, Default)]
struct RawManifest {
    #[serde(rename = "Bukkit", default)]
    bukkit: Option<IndexMap<Value, Option<RawEntry>>>,
    #[serde(rename = "Spigot", default)]
    spigot: Option<IndexMap<Value, Option<RawEntry>>>,
}

#[derive(Debug, Deserialize, Default)]
struct RawEntry {
    #[serde(default)]
    version: Option<Value>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    configure: Option<RawConfigure>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
struct RawConfigure {
    #[serde(default)]
    options: Option<Mapping>,
    #[serde(default)]
    args: Option<Mapping>,
    #[serde(default)]
    script: Option<String>,
    #[serde(default)]
    template: Option<String>,
    #[serde(default)]
    defaults: Option<String>,
    #[serde(default)]
    plugin_data_folder: Option<String>,
    #[serde(default)]
    config_file: Option<String>,
}

/// Render a template with defaults into `<plugins>/<plugin_data_folder>/<config_file>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateDirective {
    pub template: String,
    pub defaults: String,
    pub plugin_data_folder: String,
    pub config_file: String,
}

/// How a package is configured after download.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ConfigureDirective {
    #[default]
    None,
    /// Options for whichever configurator matches the package.
    InlineOptions,
    /// A configurator script at a path or URL.
    Script(String),
    Template(TemplateDirective),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ManifestEntry {
    pub catalog: CatalogKind,
    /// Bukkit slug or Spigot resource id.
    pub identifier: String,
    pub name: String,
    pub version: String,
    pub options: Options,
    pub args: Options,
    pub configure: ConfigureDirective,
}

#[derive(Debug, Default)]
pub struct Manifest {
    pub entries: Vec<ManifestEntry>,
    pub warnings: Vec<String>,
}

impl Manifest {
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(ResolverError::ManifestNotFound {
                path: path.to_path_buf(),
            });
        }
        let content = std::fs::read_to_string(path).map_err(|e| ResolverError::Io {
            context: format!("reading manifest {}", path.display()),
            source: e,
        })?;
        Self::parse(&content).map_err(|e| match e {
            ResolverError::DocumentParse { source, .. } => ResolverError::ManifestParse {
                path: path.to_path_buf(),
                source,
            },
            other => other,
        })
    }

    pub fn parse(content: &str) -> Result<Self> {
        let raw: Option<RawManifest> =
            serde_yaml::from_str(content).map_err(|e| ResolverError::DocumentParse {
                origin: "manifest".into(),
                source: e,
            })?;
        let raw = raw.unwrap_or_default();

        let mut manifest = Manifest::default();
        for (kind, section) in [
            (CatalogKind::Bukkit, raw.bukkit),
            (CatalogKind::Spigot, raw.spigot),
        ] {
            for (key, entry) in section.unwrap_or_default() {
                let identifier = key_text(&key);
                match manifest.entry(kind, &identifier, entry.unwrap_or_default()) {
                    Ok(Some(entry)) => manifest.entries.push(entry),
                    Ok(None) => {}
                    Err(e) => manifest.warnings.push(e.to_string()),
                }
            }
        }
        Ok(manifest)
    }

    fn entry(
        &mut self,
        catalog: CatalogKind,
        identifier: &str,
        raw: RawEntry,
    ) -> Result<Option<ManifestEntry>> {
        let is_numeric = !identifier.is_empty() && identifier.chars().all(|c| c.is_ascii_digit());
        match catalog {
            CatalogKind::Bukkit if is_numeric => {
                return Err(ResolverError::InvalidPackage {
                    package: identifier.to_string(),
                    reason: "Bukkit plugins need a name or slug (as in the plugin's url)".into(),
                })
            }
            CatalogKind::Spigot if !is_numeric => {
                return Err(ResolverError::InvalidPackage {
                    package: identifier.to_string(),
                    reason: "Spigot resources must be listed by their numeric id".into(),
                })
            }
            _ => {}
        }

        let version = raw
            .version
            .as_ref()
            .filter(|v| !v.is_null())
            .map(key_text)
            .unwrap_or_else(|| "latest".to_string());
        let name = raw.name.unwrap_or_else(|| identifier.to_string());
        let origin = format!("{catalog}.{identifier}.configure");

        let Some(configure) = raw.configure else {
            return Ok(Some(ManifestEntry {
                catalog,
                identifier: identifier.to_string(),
                name,
                version,
                options: Options::new(),
                args: Options::new(),
                configure: ConfigureDirective::None,
            }));
        };

        let options = match &configure.options {
            Some(map) => options_from_yaml(map, &format!("{origin}.options"))?,
            None => Options::new(),
        };
        let args = match &configure.args {
            Some(map) => options_from_yaml(map, &format!("{origin}.args"))?,
            None => Options::new(),
        };
        let directive = self.directive(identifier, configure);

        Ok(Some(ManifestEntry {
            catalog,
            identifier: identifier.to_string(),
            name,
            version,
            options,
            args,
            configure: directive,
        }))
    }

    fn directive(&mut self, identifier: &str, configure: RawConfigure) -> ConfigureDirective {
        let triple = [
            &configure.template,
            &configure.defaults,
            &configure.plugin_data_folder,
        ];
        let given = triple.iter().filter(|part| part.is_some()).count();

        if let Some(script) = configure.script {
            if given > 0 {
                self.warnings.push(format!(
                    "{identifier}: 'script' takes precedence over template/defaults/plugin-data-folder"
                ));
            }
            return ConfigureDirective::Script(script);
        }

        match (
            configure.template,
            configure.defaults,
            configure.plugin_data_folder,
        ) {
            (Some(template), Some(defaults), Some(plugin_data_folder)) => {
                ConfigureDirective::Template(TemplateDirective {
                    template,
                    defaults,
                    plugin_data_folder,
                    config_file: configure
                        .config_file
                        .unwrap_or_else(|| DEFAULT_CONFIG_FILE.to_string()),
                })
            }
            _ if given > 0 => {
                self.warnings.push(format!(
                    "{identifier}: template, defaults and plugin-data-folder must be given together; configuration disabled"
                ));
                ConfigureDirective::None
            }
            _ if configure.options.is_some() || configure.args.is_some() => {
                ConfigureDirective::InlineOptions
            }
            _ => ConfigureDirective::None,
        }
    }
}
