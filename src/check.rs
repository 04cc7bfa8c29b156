use std::path::{Path, PathBuf};

use crate::configurator::discover::unit_files;
use crate::configurator::{builtin_configurators, version_matches, Configurator};
use crate::error::{ResolverError, Result};
use crate::net::{self, Fetcher};
use crate::script::ScriptConfigurator;

/// A unit that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckedUnit {
    pub path: PathBuf,
    pub package_id: String,
    pub versions: Vec<String>,
}

/// Result of validating a registry directory.
#[derive(Debug, Default)]
pub struct CheckResult {
    pub units: Vec<CheckedUnit>,
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
}

impl CheckResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

fn overlaps(a: &[String], b: &[String]) -> bool {
    a.iter().any(|v| version_matches(b, v)) || b.iter().any(|v| version_matches(a, v))
}

/// Validate every configurator script in `registry`.
pub fn check_registry(registry: &Path) -> Result<CheckResult> {
    let fetcher = Fetcher::new(net::DEFAULT_TIMEOUT, net::DEFAULT_USER_AGENT)?;
    let mut result = CheckResult::default();

    for path in unit_files(registry)? {
        let rel = path.strip_prefix(registry).unwrap_or(&path).display().to_string();
        match ScriptConfigurator::load(&path, &fetcher) {
            Ok(unit) => result.units.push(CheckedUnit {
                path,
                package_id: unit.package_id().to_string(),
                versions: unit.supported_versions().to_vec(),
            }),
            Err(ResolverError::InvalidConfigurator { reason, .. }) => {
                result.errors.push(format!("{rel}: {reason}"));
            }
            Err(e) => result.errors.push(format!("{rel}: {e}")),
        }
    }

    if result.units.is_empty() && result.errors.is_empty() {
        result
            .warnings
            .push("No configurator scripts (*.rhai) found".into());
    }

    // Discovery takes the first match, so a later unit for the same
    // package and version never runs.
    for (idx, later) in result.units.iter().enumerate() {
        if let Some(earlier) = result.units[..idx].iter().find(|u| {
            u.package_id.eq_ignore_ascii_case(&later.package_id)
                && overlaps(&u.versions, &later.versions)
        }) {
            result.warnings.push(format!(
                "{} is shadowed by {} for package {}",
                later.path.display(),
                earlier.path.display(),
                later.package_id
            ));
        }
    }

    for builtin in builtin_configurators(&fetcher) {
        if let Some(unit) = result.units.iter().find(|u| {
            u.package_id.eq_ignore_ascii_case(builtin.package_id())
                && overlaps(&u.versions, builtin.supported_versions())
        }) {
            result.warnings.push(format!(
                "{} overrides the {}",
                unit.path.display(),
                builtin.describe()
            ));
        }
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(dir: &Path, name: &str, id: &str, versions: &str) {
        std::fs::write(
            dir.join(name),
            format!(
                "let plugin_id = \"{id}\";\nlet plugin_versions = [{versions}];\nfn configure(out, options, extra) {{}}\n"
            ),
        )
        .unwrap();
    }

    #[test]
    fn valid_registry() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "essentials.rhai", "essentials", "\"2.0\"");
        std::fs::write(dir.path().join("init.rhai"), "").unwrap();

        let result = check_registry(dir.path()).unwrap();
        assert!(result.is_valid());
        assert!(result.warnings.is_empty());
        assert_eq!(result.units.len(), 1);
        assert_eq!(result.units[0].package_id, "essentials");
    }

    #[test]
    fn broken_units_are_errors() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("broken.rhai"), "fn configure(").unwrap();
        let result = check_registry(dir.path()).unwrap();
        assert!(!result.is_valid());
        assert!(result.errors[0].starts_with("broken.rhai:"));
    }

    #[test]
    fn shadowed_and_overriding_units_warn() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "a.rhai", "essentials", "\"all\"");
        write(dir.path(), "b.rhai", "Essentials", "\"2.0\"");
        write(dir.path(), "c.rhai", "vault", "\"1.7\"");

        let result = check_registry(dir.path()).unwrap();
        assert!(result.is_valid());
        assert_eq!(result.warnings.len(), 2, "{:?}", result.warnings);
        assert!(result.warnings[0].contains("shadowed"));
        assert!(result.warnings[1].contains("built-in Vault"));
    }

    #[test]
    fn empty_registry_warns() {
        let dir = tempfile::tempdir().unwrap();
        let result = check_registry(dir.path()).unwrap();
        assert!(result.is_valid());
        assert_eq!(result.warnings.len(), 1);
    }
}
