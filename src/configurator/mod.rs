pub mod builtin;
pub mod discover;
pub mod template_based;

use std::path::Path;

use crate::error::{ResolverError, Result};
use crate::net::Fetcher;
use crate::render::options::Options;
use crate::script::{ScratchCache, ScriptConfigurator, ScriptLocation};

pub use builtin::{builtin_configurators, BuiltinConfigurator};
pub use discover::{scan_registry, ScanReport};
pub use template_based::configure_from_template;

/// Renders the configuration of one package.
pub trait Configurator {
    /// Bukkit slug or Spigot resource id this unit configures.
    fn package_id(&self) -> &str;

    /// Version specifiers, or `all`.
    fn supported_versions(&self) -> &[String];

    /// Write configuration files under `output_dir`.
    fn configure(&self, output_dir: &Path, options: &Options, extra: &Options) -> Result<()>;

    /// Short human-readable origin, for console output.
    fn describe(&self) -> String {
        format!("configurator for {}", self.package_id())
    }

    fn matches(&self, package_id: &str, version: &str) -> bool {
        self.package_id().eq_ignore_ascii_case(package_id)
            && version_matches(self.supported_versions(), version)
    }
}

/// A declared version set matches when it contains `all`, or when the
/// requested version appears inside any declared specifier (ignoring case).
pub fn version_matches(declared: &[String], version: &str) -> bool {
    let version = version.to_lowercase();
    declared.iter().any(|spec| {
        let spec = spec.to_lowercase();
        spec == "all" || spec.contains(&version)
    })
}

/// First unit in `units` matching the package and version.
pub fn find_configurator<'a>(
    units: &'a [Box<dyn Configurator>],
    package_id: &str,
    version: &str,
) -> Option<&'a dyn Configurator> {
    units
        .iter()
        .find(|unit| unit.matches(package_id, version))
        .map(|unit| unit.as_ref())
}

/// Registry script units followed by the built-in configurators.
pub struct ConfiguratorRegistry {
    units: Vec<Box<dyn Configurator>>,
}

impl ConfiguratorRegistry {
    pub fn new(units: Vec<Box<dyn Configurator>>) -> Self {
        Self { units }
    }

    /// Scan `registry` (if given) and append the built-ins.
    pub fn load(registry: Option<&Path>, fetcher: &Fetcher) -> Result<(Self, ScanReport)> {
        let mut units: Vec<Box<dyn Configurator>> = Vec::new();
        let mut report = ScanReport::default();

        if let Some(root) = registry {
            let (scanned, scan_report) = scan_registry(root, fetcher)?;
            units.extend(
                scanned
                    .into_iter()
                    .map(|unit| Box::new(unit) as Box<dyn Configurator>),
            );
            report = scan_report;
        }

        units.extend(builtin_configurators(fetcher));
        Ok((Self { units }, report))
    }

    pub fn find(&self, package_id: &str, version: &str) -> Option<&dyn Configurator> {
        find_configurator(&self.units, package_id, version)
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }
}

/// Load an explicitly named script unit, bypassing discovery.
///
/// URLs are first saved into the scratch cache. The unit must still declare
/// the package and version it is used for.
pub fn load_explicit(
    location: &ScriptLocation,
    package_id: &str,
    version: &str,
    cache: &ScratchCache,
    fetcher: &Fetcher,
) -> Result<ScriptConfigurator> {
    let path = match location {
        ScriptLocation::Local(path) => path.clone(),
        ScriptLocation::Url(url) => cache.materialize(url, fetcher)?,
    };

    let unit = ScriptConfigurator::load(&path, fetcher)?;
    if !unit.matches(package_id, version) {
        return Err(ResolverError::InvalidConfigurator {
            path,
            reason: format!(
                "declares {} ({}), not {package_id} (v. {version})",
                unit.package_id(),
                unit.supported_versions().join(", ")
            ),
        });
    }
    Ok(unit)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::cell::RefCell;

    struct Fake {
        id: String,
        versions: Vec<String>,
        calls: RefCell<usize>,
    }

    impl Fake {
        fn boxed(id: &str, versions: &[&str]) -> Box<dyn Configurator> {
            Box::new(Self {
                id: id.into(),
                versions: versions.iter().map(|v| v.to_string()).collect(),
                calls: RefCell::new(0),
            })
        }
    }

    impl Configurator for Fake {
        fn package_id(&self) -> &str {
            &self.id
        }
        fn supported_versions(&self) -> &[String] {
            &self.versions
        }
        fn describe(&self) -> String {
            format!("fake {} {:?}", self.id, self.versions)
        }
        fn configure(&self, _: &Path, _: &Options, _: &Options) -> Result<()> {
            *self.calls.borrow_mut() += 1;
            Ok(())
        }
    }

    fn specs(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[rstest]
    #[case(&["all"], "1.0", true)]
    #[case(&["ALL"], "anything", true)]
    #[case(&["1.8.8-3"], "1.8.8-3", true)]
    #[case(&["1.8.8-3"], "1.9", false)]
    #[case(&["1.8.x"], "1.8", true)]
    #[case(&["2.0-Beta"], "2.0-beta", true)]
    #[case(&[], "1.0", false)]
    fn matches_versions(#[case] declared: &[&str], #[case] version: &str, #[case] expected: bool) {
        assert_eq!(version_matches(&specs(declared), version), expected);
    }

    #[test]
    fn package_ids_ignore_case() {
        let unit = Fake::boxed("Vault", &["all"]);
        assert!(unit.matches("vault", "1.5.6"));
        assert!(unit.matches("VAULT", "1.5.6"));
        assert!(!unit.matches("vaulted", "1.5.6"));
    }

    #[test]
    fn first_match_wins() {
        let units = vec![
            Fake::boxed("other", &["all"]),
            Fake::boxed("vault", &["1.5"]),
            Fake::boxed("vault", &["all"]),
        ];
        let found = find_configurator(&units, "vault", "1.5.6").unwrap();
        assert_eq!(found.describe(), "fake vault [\"all\"]");

        let found = find_configurator(&units, "vault", "1.5").unwrap();
        assert_eq!(found.describe(), "fake vault [\"1.5\"]");

        assert!(find_configurator(&units, "essentials", "2.0").is_none());
    }

    #[test]
    fn registry_puts_scanned_units_before_builtins() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("vault.rhai"),
            "let plugin_id = \"vault\";\nlet plugin_versions = [\"all\"];\nfn configure(out, options, extra) {}\n",
        )
        .unwrap();
        let fetcher = Fetcher::new(crate::net::DEFAULT_TIMEOUT, crate::net::DEFAULT_USER_AGENT).unwrap();

        let (registry, report) = ConfiguratorRegistry::load(Some(dir.path()), &fetcher).unwrap();
        assert_eq!(report.loaded.len(), 1);
        assert_eq!(registry.len(), 1 + builtin_configurators(&fetcher).len());
        assert!(registry.find("vault", "1.5.6").unwrap().describe().starts_with("script "));

        let (builtins_only, _) = ConfiguratorRegistry::load(None, &fetcher).unwrap();
        assert!(builtins_only.find("vault", "1.5.6").unwrap().describe().starts_with("built-in "));
        assert!(builtins_only.find("15290", "1.8.8-3").is_some());
        assert!(builtins_only.find("15290", "1.9").is_none());
    }

    #[test]
    fn explicit_unit_must_match_package() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vault.rhai");
        std::fs::write(
            &path,
            "let plugin_id = \"vault\";\nlet plugin_versions = [\"1.5\"];\nfn configure(out, options, extra) {}\n",
        )
        .unwrap();
        let fetcher = Fetcher::new(crate::net::DEFAULT_TIMEOUT, crate::net::DEFAULT_USER_AGENT).unwrap();
        let app = tempfile::tempdir().unwrap();
        let cache = ScratchCache::open(app.path()).unwrap();
        let location = ScriptLocation::Local(path);

        assert!(load_explicit(&location, "vault", "1.5.6", &cache, &fetcher).is_ok());
        assert!(matches!(
            load_explicit(&location, "vault", "2.0", &cache, &fetcher),
            Err(ResolverError::InvalidConfigurator { .. })
        ));
        assert!(matches!(
            load_explicit(&location, "essentials", "1.5", &cache, &fetcher),
            Err(ResolverError::InvalidConfigurator { .. })
        ));
    }

    #[test]
    fn fake_configure_is_invoked_through_the_trait() {
        let units = vec![Fake::boxed("vault", &["all"])];
        let registry = ConfiguratorRegistry::new(units);
        let unit = registry.find("vault", "1.0").unwrap();
        unit.configure(Path::new("."), &Options::new(), &Options::new())
            .unwrap();
        assert!(!registry.is_empty());
    }
}
