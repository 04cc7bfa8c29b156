use std::path::{Path, PathBuf};

use crate::catalog::{
    BukkitCatalog, Catalog, CatalogKind, ResourceHandle, SpigotCatalog, VersionRequest,
};
use crate::config::{ConfigureDirective, Manifest, ManifestEntry, ResolverConfig};
use crate::configurator::{
    configure_from_template, load_explicit, Configurator, ConfiguratorRegistry,
};
use crate::error::{ResolverError, Result};
use crate::net::Fetcher;
use crate::render::options::Options;
use crate::report;
use crate::script::{resolve_location, ScratchCache};

const PLUGINS_DIR: &str = "plugins";

/// A manifest entry matched to a concrete catalog release.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedPackage {
    pub catalog: CatalogKind,
    pub identifier: String,
    pub name: String,
    /// The version as written in the manifest.
    pub requested: String,
    pub handle: ResourceHandle,
    pub fell_back_to_latest: bool,
    pub options: Options,
    pub args: Options,
    pub configure: ConfigureDirective,
}

impl ResolvedPackage {
    pub fn label(&self) -> String {
        format!("{} (v. {})", self.name, self.handle.version)
    }

    pub fn file_name(&self) -> String {
        self.handle.file_name(&self.name)
    }
}

/// Everything a run will do, worked out before anything is written.
#[derive(Debug, Default)]
pub struct ResolutionPlan {
    pub packages: Vec<ResolvedPackage>,
    /// Entries that could not be resolved, with the reason.
    pub failures: Vec<(String, ResolverError)>,
    pub warnings: Vec<String>,
}

#[derive(Debug, Default)]
pub struct ResolutionReport {
    pub downloaded: Vec<PathBuf>,
    /// Packages configured, with the unit that did it.
    pub configured: Vec<(String, String)>,
    /// Packages that asked for configuration but had no matching unit.
    pub unconfigured: Vec<String>,
    pub failures: Vec<(String, ResolverError)>,
}

impl ResolutionReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

pub struct Resolver {
    config: ResolverConfig,
    fetcher: Fetcher,
    catalogs: Vec<Box<dyn Catalog>>,
}

impl Resolver {
    /// A resolver backed by the Spiget and BukGet APIs.
    pub fn new(config: ResolverConfig) -> Result<Self> {
        let fetcher = Fetcher::new(config.timeout, &config.user_agent)?;
        let catalogs: Vec<Box<dyn Catalog>> = vec![
            Box::new(BukkitCatalog::new(fetcher.clone(), config.bukget_api.clone())),
            Box::new(SpigotCatalog::new(fetcher.clone(), config.spigot_api.clone())),
        ];
        Ok(Self {
            config,
            fetcher,
            catalogs,
        })
    }

    pub fn with_catalogs(config: ResolverConfig, catalogs: Vec<Box<dyn Catalog>>) -> Result<Self> {
        let fetcher = Fetcher::new(config.timeout, &config.user_agent)?;
        Ok(Self {
            config,
            fetcher,
            catalogs,
        })
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    fn catalog(&self, kind: CatalogKind) -> Option<&dyn Catalog> {
        self.catalogs
            .iter()
            .find(|c| c.kind() == kind)
            .map(|c| c.as_ref())
    }

    /// Look up every manifest entry. Entries that fail are recorded and
    /// left out of the plan.
    pub fn plan(&self, manifest: &Manifest) -> ResolutionPlan {
        let mut plan = ResolutionPlan {
            warnings: manifest.warnings.clone(),
            ..ResolutionPlan::default()
        };

        for entry in &manifest.entries {
            match self.resolve_entry(entry) {
                Ok((handle, fell_back_to_latest)) => {
                    if fell_back_to_latest {
                        plan.warnings.push(format!(
                            "{} (v. {}) is not available; using latest {}",
                            entry.name, entry.version, handle.version
                        ));
                    }
                    plan.packages.push(ResolvedPackage {
                        catalog: entry.catalog,
                        identifier: entry.identifier.clone(),
                        name: display_name(entry, &handle),
                        requested: entry.version.clone(),
                        handle,
                        fell_back_to_latest,
                        options: entry.options.clone(),
                        args: entry.args.clone(),
                        configure: entry.configure.clone(),
                    });
                }
                Err(e) => plan.failures.push((entry.name.clone(), e)),
            }
        }
        plan
    }

    fn resolve_entry(&self, entry: &ManifestEntry) -> Result<(ResourceHandle, bool)> {
        let catalog = self
            .catalog(entry.catalog)
            .ok_or_else(|| ResolverError::InvalidPackage {
                package: entry.identifier.clone(),
                reason: format!("no {} catalog is configured", entry.catalog),
            })?;

        let request = VersionRequest::parse(&entry.version);
        match catalog.resolve(&entry.identifier, &request) {
            Err(ResolverError::ResourceUnavailable { .. })
                if self.config.latest && request != VersionRequest::Latest =>
            {
                let handle = catalog.resolve(&entry.identifier, &VersionRequest::Latest)?;
                Ok((handle, true))
            }
            other => other.map(|handle| (handle, false)),
        }
    }

    /// Download every planned package into `output`, then configure the
    /// downloaded ones under `<output>/plugins`.
    pub fn execute(&self, plan: &ResolutionPlan, output: &Path) -> Result<ResolutionReport> {
        create_dir(output, "output directory")?;

        let mut report = ResolutionReport::default();
        let mut downloaded = Vec::new();
        for package in &plan.packages {
            report::step(format!("Downloading {}", package.label()));
            match self
                .fetcher
                .download(&package.handle.download_url, output, &package.file_name())
            {
                Ok(path) => {
                    report::success(format!("Saved {}", report::path(&path)));
                    report.downloaded.push(path);
                    downloaded.push(package);
                }
                Err(e) => {
                    report::failure(format!("Unable to download {}: {e}", package.label()));
                    report.failures.push((package.name.clone(), e));
                }
            }
        }

        if !self.config.no_configure {
            self.configure_packages(&downloaded, &output.join(PLUGINS_DIR), &mut report)?;
        }
        Ok(report)
    }

    /// Run the configuration phase for `packages`.
    ///
    /// Only failing to set up the plugins directory or the scratch cache is
    /// an error; each package's own failure is recorded in `report`.
    pub fn configure_packages(
        &self,
        packages: &[&ResolvedPackage],
        plugins_dir: &Path,
        report: &mut ResolutionReport,
    ) -> Result<()> {
        let pending: Vec<&ResolvedPackage> = packages
            .iter()
            .copied()
            .filter(|p| p.configure != ConfigureDirective::None)
            .collect();
        if pending.is_empty() {
            return Ok(());
        }
        create_dir(plugins_dir, "plugins directory")?;

        let registry = self.load_registry()?;
        let needs_cache = pending
            .iter()
            .any(|p| matches!(p.configure, ConfigureDirective::Script(_)));
        let cache = match needs_cache {
            true => Some(ScratchCache::open(&self.config.app_dir)?),
            false => None,
        };

        for package in pending {
            match self.configure_one(package, plugins_dir, &registry, cache.as_ref()) {
                Ok(Some(unit)) => {
                    report::success(format!("Configured {} with {unit}", package.label()));
                    report.configured.push((package.name.clone(), unit));
                }
                Ok(None) => {
                    report::warn(format!(
                        "No configurator found for {}; skipping configuration",
                        package.label()
                    ));
                    report.unconfigured.push(package.name.clone());
                }
                Err(e) => {
                    report::failure(format!("Unable to configure {}: {e}", package.label()));
                    report.failures.push((package.name.clone(), e));
                }
            }
        }

        if let Some(cache) = cache {
            cache.cleanup()?;
        }
        Ok(())
    }

    fn load_registry(&self) -> Result<ConfiguratorRegistry> {
        let registry_dir = self.config.registry.as_deref();
        let (registry, scan) = match ConfiguratorRegistry::load(registry_dir, &self.fetcher) {
            Ok(loaded) => loaded,
            Err(e) => {
                report::warn(format!("{e}; using built-in configurators only"));
                ConfiguratorRegistry::load(None, &self.fetcher)?
            }
        };
        for (path, reason) in &scan.rejected {
            report::warn(format!(
                "Ignoring configurator {}: {reason}",
                report::path(path)
            ));
        }
        Ok(registry)
    }

    /// Configure one package. `Ok(None)` means no unit matched.
    fn configure_one(
        &self,
        package: &ResolvedPackage,
        plugins_dir: &Path,
        registry: &ConfiguratorRegistry,
        cache: Option<&ScratchCache>,
    ) -> Result<Option<String>> {
        let version = &package.handle.version;
        match &package.configure {
            ConfigureDirective::None => Ok(None),
            ConfigureDirective::InlineOptions => {
                let Some(unit) = registry.find(&package.identifier, version) else {
                    return Ok(None);
                };
                unit.configure(plugins_dir, &package.options, &package.args)?;
                Ok(Some(unit.describe()))
            }
            ConfigureDirective::Script(location) => {
                let cache = cache.ok_or_else(|| ResolverError::Io {
                    context: "script cache was not opened".into(),
                    source: std::io::Error::other("missing scratch cache"),
                })?;
                let unit = load_explicit(
                    &resolve_location(location),
                    &package.identifier,
                    version,
                    cache,
                    &self.fetcher,
                )?;
                unit.configure(plugins_dir, &package.options, &package.args)?;
                Ok(Some(unit.describe()))
            }
            ConfigureDirective::Template(directive) => {
                let path =
                    configure_from_template(directive, plugins_dir, &package.options, &self.fetcher)?;
                Ok(Some(format!("template -> {}", path.display())))
            }
        }
    }
}

fn display_name(entry: &ManifestEntry, handle: &ResourceHandle) -> String {
    if entry.name != entry.identifier || handle.name.is_empty() {
        entry.name.clone()
    } else {
        handle.name.clone()
    }
}

fn create_dir(path: &Path, what: &str) -> Result<()> {
    std::fs::create_dir_all(path).map_err(|e| ResolverError::Io {
        context: format!("creating {what} {}", path.display()),
        source: e,
    })
}
