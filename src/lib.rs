pub mod catalog;
pub mod check;
pub mod config;
pub mod configurator;
pub mod error;
pub mod net;
pub mod render;
pub mod report;
pub mod resolver;
pub mod script;
pub mod template;

use std::path::{Path, PathBuf};

use crate::error::{ResolverError, Result};
use crate::render::file::{read_text_file, write_output};
use crate::template::{synthesize_document, SynthesizedTemplate};

pub use crate::resolver::{ResolutionPlan, ResolutionReport, ResolvedPackage, Resolver};

/// Template and defaults generated from one plugin configuration, held in
/// memory until [`write_templates`] is called.
#[derive(Debug)]
pub struct TemplateArtifacts {
    pub plugin: String,
    pub template: String,
    pub defaults: String,
    pub variable_count: usize,
}

impl TemplateArtifacts {
    pub fn template_path(&self, output_dir: &Path) -> PathBuf {
        output_dir.join(format!("{}-template.yml", self.plugin))
    }

    pub fn defaults_path(&self, output_dir: &Path) -> PathBuf {
        output_dir.join(format!("{}-defaults.yml", self.plugin))
    }
}

fn check_plugin_name(plugin: &str) -> Result<()> {
    let valid = !plugin.is_empty()
        && plugin != "."
        && plugin != ".."
        && !plugin.contains(['/', '\\']);
    if valid {
        Ok(())
    } else {
        Err(ResolverError::InvalidPackage {
            package: plugin.to_string(),
            reason: "plugin names are used as file names and may not contain path separators"
                .into(),
        })
    }
}

/// Build both artifacts for `config_file` without writing anything.
pub fn plan_templates(config_file: &Path, plugin: &str) -> Result<TemplateArtifacts> {
    check_plugin_name(plugin)?;
    let text = read_text_file(config_file)?;
    let synthesized: SynthesizedTemplate =
        synthesize_document(&text, &config_file.display().to_string())?;
    let defaults = synthesized.defaults_yaml()?;

    Ok(TemplateArtifacts {
        plugin: plugin.to_string(),
        variable_count: synthesized.defaults.len(),
        template: synthesized.template,
        defaults,
    })
}

/// Write planned artifacts to `output_dir`, returning the template and
/// defaults paths.
pub fn write_templates(artifacts: &TemplateArtifacts, output_dir: &Path) -> Result<(PathBuf, PathBuf)> {
    let template_path = artifacts.template_path(output_dir);
    let defaults_path = artifacts.defaults_path(output_dir);
    write_output(&template_path, &artifacts.template)?;
    write_output(&defaults_path, &artifacts.defaults)?;
    Ok((template_path, defaults_path))
}

/// Generate `<plugin>-template.yml` and `<plugin>-defaults.yml` in
/// `output_dir` from an existing plugin configuration.
pub fn generate_templates(
    config_file: &Path,
    plugin: &str,
    output_dir: &Path,
) -> Result<(PathBuf, PathBuf)> {
    let artifacts = plan_templates(config_file, plugin)?;
    write_templates(&artifacts, output_dir)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn generates_both_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let config = dir.path().join("config.yml");
        std::fs::write(&config, "# Vault\nVault:\n  update-check: true\n").unwrap();
        let out = dir.path().join("out");

        let (template, defaults) = generate_templates(&config, "vault", &out).unwrap();
        assert_eq!(template, out.join("vault-template.yml"));
        assert_eq!(
            std::fs::read_to_string(template).unwrap(),
            "# Vault\nVault:\n  update-check: {{ vault_update_check }}\n"
        );
        assert_eq!(
            std::fs::read_to_string(defaults).unwrap(),
            "vault_update_check: 'true'\n"
        );
    }

    #[test]
    fn parse_failure_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let config = dir.path().join("config.yml");
        std::fs::write(&config, "a: [unclosed\n").unwrap();
        let out = dir.path().join("out");

        assert!(generate_templates(&config, "broken", &out).is_err());
        assert!(!out.exists());
    }

    #[rstest]
    #[case("vault", true)]
    #[case("Essentials-X", true)]
    #[case("", false)]
    #[case("..", false)]
    #[case("a/b", false)]
    fn plugin_names(#[case] name: &str, #[case] ok: bool) {
        assert_eq!(check_plugin_name(name).is_ok(), ok);
    }
}
