use std::path::{Path, PathBuf};

use globset::{Glob, GlobSet, GlobSetBuilder};

use crate::error::{ResolverError, Result};
use crate::net::Fetcher;
use crate::script::source::is_initializer;
use crate::script::ScriptConfigurator;

const UNIT_PATTERN: &str = "*.rhai";

/// Outcome of scanning a registry directory.
#[derive(Debug, Default)]
pub struct ScanReport {
    pub loaded: Vec<PathBuf>,
    /// Units that were found but could not be used, with the reason.
    pub rejected: Vec<(PathBuf, String)>,
}

fn unit_glob() -> Result<GlobSet> {
    let glob = Glob::new(UNIT_PATTERN).map_err(|e| ResolverError::GlobPattern {
        pattern: UNIT_PATTERN.into(),
        source: e,
    })?;
    GlobSetBuilder::new()
        .add(glob)
        .build()
        .map_err(|e| ResolverError::GlobPattern {
            pattern: UNIT_PATTERN.into(),
            source: e,
        })
}

/// Candidate unit files directly inside `root`, sorted by file name.
pub fn unit_files(root: &Path) -> Result<Vec<PathBuf>> {
    if !root.is_dir() {
        return Err(ResolverError::Io {
            context: format!("reading registry {}", root.display()),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "not a directory"),
        });
    }

    let glob = unit_glob()?;
    let walker = walkdir::WalkDir::new(root)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok());

    Ok(walker
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| path.file_name().is_some_and(|name| glob.is_match(name)))
        .filter(|path| !is_initializer(path))
        .collect())
}

/// Load every script unit in `root`. Units that fail validation are
/// reported, not loaded.
pub fn scan_registry(root: &Path, fetcher: &Fetcher) -> Result<(Vec<ScriptConfigurator>, ScanReport)> {
    let mut units = Vec::new();
    let mut report = ScanReport::default();

    for path in unit_files(root)? {
        match ScriptConfigurator::load(&path, fetcher) {
            Ok(unit) => {
                report.loaded.push(path);
                units.push(unit);
            }
            Err(ResolverError::InvalidConfigurator { reason, .. }) => {
                report.rejected.push((path, reason));
            }
            Err(e) => report.rejected.push((path, e.to_string())),
        }
    }

    Ok((units, report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::configurator::Configurator;

    fn fetcher() -> Fetcher {
        Fetcher::new(crate::net::DEFAULT_TIMEOUT, crate::net::DEFAULT_USER_AGENT).unwrap()
    }

    fn unit(id: &str) -> String {
        format!(
            "let plugin_id = \"{id}\";\nlet plugin_versions = [\"all\"];\nfn configure(out, options, extra) {{}}\n"
        )
    }

    #[test]
    fn scans_one_level_in_name_order() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.rhai"), unit("worldedit")).unwrap();
        std::fs::write(dir.path().join("a.rhai"), unit("vault")).unwrap();
        std::fs::write(dir.path().join("init.rhai"), "// registry setup\n").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();
        std::fs::create_dir(dir.path().join("nested")).unwrap();
        std::fs::write(dir.path().join("nested/c.rhai"), unit("essentials")).unwrap();

        let (units, report) = scan_registry(dir.path(), &fetcher()).unwrap();
        let ids: Vec<&str> = units.iter().map(|u| u.package_id()).collect();
        assert_eq!(ids, vec!["vault", "worldedit"]);
        assert_eq!(report.loaded.len(), 2);
        assert!(report.rejected.is_empty());
    }

    #[test]
    fn invalid_units_are_reported() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("good.rhai"), unit("vault")).unwrap();
        std::fs::write(dir.path().join("broken.rhai"), "let plugin_id = ").unwrap();
        std::fs::write(
            dir.path().join("no_versions.rhai"),
            "let plugin_id = \"x\";\nfn configure(a, b, c) {}\n",
        )
        .unwrap();

        let (units, report) = scan_registry(dir.path(), &fetcher()).unwrap();
        assert_eq!(units.len(), 1);
        let rejected: Vec<String> = report
            .rejected
            .iter()
            .map(|(p, _)| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(rejected, vec!["broken.rhai", "no_versions.rhai"]);
    }

    #[test]
    fn missing_registry_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            scan_registry(&dir.path().join("missing"), &fetcher()),
            Err(ResolverError::Io { .. })
        ));
    }
}
