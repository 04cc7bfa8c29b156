use std::path::Path;

use crate::error::{ResolverError, Result};
use crate::net::Fetcher;
use crate::render::options::{merge, DefaultsSource, Options};

use super::template_based::render_into;
use super::Configurator;

const TEMPLATE_BASE: &str =
    "https://raw.githubusercontent.com/TechnicalBro/minecraft-plugin-config-templates/master";
const CONFIG_TYPE_ARG: &str = "config_type";
const DEFAULT_CONFIG_TYPE: &str = "yml";

/// Where a built-in takes its default options from.
#[derive(Debug)]
enum BuiltinDefaults {
    Inline(&'static [(&'static str, &'static str)]),
    Url(&'static str),
}

/// Static description of a built-in configurator. `{config_type}` in the
/// template path and output file is replaced by the `config_type` argument.
#[derive(Debug)]
struct BuiltinSpec {
    name: &'static str,
    package_id: &'static str,
    versions: &'static [&'static str],
    template: &'static str,
    defaults: BuiltinDefaults,
    data_folder: &'static str,
    config_file: &'static str,
}

static BUILTINS: &[BuiltinSpec] = &[
    BuiltinSpec {
        name: "Vault",
        package_id: "vault",
        versions: &["all"],
        template: "Vault/config.yml",
        defaults: BuiltinDefaults::Inline(&[("update_check", "true")]),
        data_folder: "Vault",
        config_file: "config.yml",
    },
    BuiltinSpec {
        name: "Commons",
        package_id: "15290",
        versions: &["1.8.8-3"],
        template: "Commons/1.8.8-3/config.{config_type}",
        defaults: BuiltinDefaults::Url("Commons/1.8.8-3/defaults.yml"),
        data_folder: "Commons",
        config_file: "config.{config_type}",
    },
];

/// A configurator compiled into the binary.
#[derive(Debug)]
pub struct BuiltinConfigurator {
    spec: &'static BuiltinSpec,
    versions: Vec<String>,
    fetcher: Fetcher,
}

/// The built-in registration list, in matching order.
pub fn builtin_configurators(fetcher: &Fetcher) -> Vec<Box<dyn Configurator>> {
    BUILTINS
        .iter()
        .map(|spec| {
            Box::new(BuiltinConfigurator {
                spec,
                versions: spec.versions.iter().map(|v| v.to_string()).collect(),
                fetcher: fetcher.clone(),
            }) as Box<dyn Configurator>
        })
        .collect()
}

fn hosted(path: &str) -> String {
    format!("{TEMPLATE_BASE}/{path}")
}

/// The `config_type` argument, restricted to a plain file extension.
fn config_type(extra: &Options) -> Result<String> {
    let value = match extra.get(CONFIG_TYPE_ARG) {
        None | Some(tera::Value::Null) => return Ok(DEFAULT_CONFIG_TYPE.to_string()),
        Some(tera::Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    };
    if value.is_empty() || !value.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(ResolverError::InvalidPackage {
            package: CONFIG_TYPE_ARG.into(),
            reason: format!("'{value}' is not a file extension"),
        });
    }
    Ok(value)
}

impl BuiltinConfigurator {
    fn defaults(&self) -> Result<Options> {
        match &self.spec.defaults {
            BuiltinDefaults::Inline(pairs) => Ok(pairs
                .iter()
                .map(|(k, v)| (k.to_string(), tera::Value::String(v.to_string())))
                .collect()),
            BuiltinDefaults::Url(path) => DefaultsSource::Url(hosted(path)).load(&self.fetcher),
        }
    }
}

impl Configurator for BuiltinConfigurator {
    fn package_id(&self) -> &str {
        self.spec.package_id
    }

    fn supported_versions(&self) -> &[String] {
        &self.versions
    }

    fn describe(&self) -> String {
        format!("built-in {} configurator", self.spec.name)
    }

    fn configure(&self, output_dir: &Path, options: &Options, extra: &Options) -> Result<()> {
        let config_type = config_type(extra)?;
        let merged = merge(options, &self.defaults()?);
        let template = self
            .fetcher
            .get_text(&hosted(&self.spec.template.replace("{config_type}", &config_type)))?;
        render_into(
            output_dir,
            self.spec.data_folder,
            &self.spec.config_file.replace("{config_type}", &config_type),
            &template,
            &merged,
        )?;
        Ok(())
    }
}
