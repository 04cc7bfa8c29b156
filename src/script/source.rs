use std::path::{Path, PathBuf};

use crate::net;

/// Where an explicitly named configurator script lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptLocation {
    Local(PathBuf),
    Url(String),
}

/// Resolve a manifest `script` value. URLs are kept as-is; local paths get
/// `~` expanded.
pub fn resolve_location(location: &str) -> ScriptLocation {
    let location = location.trim();
    if net::is_url(location) {
        return ScriptLocation::Url(location.to_string());
    }
    ScriptLocation::Local(expand_home(location))
}

/// Expand a leading `~` to the home directory.
pub fn expand_home(path: &str) -> PathBuf {
    let rest = match path.strip_prefix("~/") {
        Some(rest) => rest,
        None if path == "~" => "",
        None => return PathBuf::from(path),
    };
    match dirs::home_dir() {
        Some(home) => home.join(rest),
        None => PathBuf::from(path),
    }
}

/// Whether a file is the registry's own initializer, which never defines a
/// configurator.
pub fn is_initializer(path: &Path) -> bool {
    path.file_name().is_some_and(|name| name == "init.rhai")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn urls_are_kept() {
        assert_eq!(
            resolve_location("https://example.com/vault.rhai"),
            ScriptLocation::Url("https://example.com/vault.rhai".into())
        );
    }

    #[test]
    fn home_is_expanded() {
        let resolved = resolve_location("~/scripts/vault.rhai");
        match (resolved, dirs::home_dir()) {
            (ScriptLocation::Local(path), Some(home)) => {
                assert_eq!(path, home.join("scripts/vault.rhai"));
            }
            (ScriptLocation::Local(path), None) => {
                assert_eq!(path, PathBuf::from("~/scripts/vault.rhai"));
            }
            (other, _) => panic!("expected a local path, got {other:?}"),
        }
    }

    #[test]
    fn relative_paths_are_local() {
        assert_eq!(
            resolve_location("configurators/vault.rhai"),
            ScriptLocation::Local(PathBuf::from("configurators/vault.rhai"))
        );
    }

    #[rstest]
    #[case("registry/init.rhai", true)]
    #[case("registry/vault.rhai", false)]
    #[case("init.rhai.bak", false)]
    fn detects_initializer(#[case] path: &str, #[case] expected: bool) {
        assert_eq!(is_initializer(Path::new(path)), expected);
    }
}
