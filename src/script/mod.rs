pub mod cache;
pub mod rhai_runtime;
pub mod source;

use std::path::{Path, PathBuf};

use rhai::{Dynamic, Scope, AST};

use crate::configurator::Configurator;
use crate::error::{ResolverError, Result};
use crate::net::Fetcher;
use crate::render::options::Options;

pub use cache::ScratchCache;
pub use source::{resolve_location, ScriptLocation};

const ENTRY_POINT: &str = "configure";

/// A configurator defined by a Rhai script.
///
/// The script declares `let plugin_id`, `let plugin_versions` and
/// `fn configure(output_dir, options, extra)`.
pub struct ScriptConfigurator {
    path: PathBuf,
    ast: AST,
    plugin_id: String,
    plugin_versions: Vec<String>,
    fetcher: Fetcher,
}

impl std::fmt::Debug for ScriptConfigurator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScriptConfigurator")
            .field("path", &self.path)
            .field("plugin_id", &self.plugin_id)
            .field("plugin_versions", &self.plugin_versions)
            .finish()
    }
}

impl ScriptConfigurator {
    /// Compile and validate a script unit.
    pub fn load(path: &Path, fetcher: &Fetcher) -> Result<Self> {
        let invalid = |reason: String| ResolverError::InvalidConfigurator {
            path: path.to_path_buf(),
            reason,
        };

        if source::is_initializer(path) {
            return Err(invalid("init.rhai is the registry initializer".into()));
        }

        let script = std::fs::read_to_string(path).map_err(|e| ResolverError::Io {
            context: format!("reading configurator {}", path.display()),
            source: e,
        })?;

        let engine = rhai_runtime::create_engine();
        let ast = engine
            .compile(&script)
            .map_err(|e| invalid(format!("does not compile: {e}")))?;

        let mut scope = Scope::new();
        engine
            .run_ast_with_scope(&mut scope, &ast)
            .map_err(|e| invalid(format!("failed to evaluate: {e}")))?;

        let has_entry_point = ast
            .iter_functions()
            .any(|f| f.name == ENTRY_POINT && f.params.len() == 3);
        if !has_entry_point {
            return Err(invalid(
                "missing fn configure(output_dir, options, extra)".into(),
            ));
        }

        let plugin_id = scope
            .get("plugin_id")
            .filter(|v| v.is_string() || v.is_int())
            .map(|v| v.to_string())
            .ok_or_else(|| invalid("missing `plugin_id` string".into()))?;

        let plugin_versions = scope
            .get("plugin_versions")
            .and_then(|v| v.clone().try_cast::<rhai::Array>())
            .ok_or_else(|| invalid("missing `plugin_versions` array".into()))?
            .iter()
            .map(Dynamic::to_string)
            .collect();

        Ok(Self {
            path: path.to_path_buf(),
            ast,
            plugin_id,
            plugin_versions,
            fetcher: fetcher.clone(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Configurator for ScriptConfigurator {
    fn package_id(&self) -> &str {
        &self.plugin_id
    }

    fn supported_versions(&self) -> &[String] {
        &self.plugin_versions
    }

    fn describe(&self) -> String {
        format!("script {}", self.path.display())
    }

    fn configure(&self, output_dir: &Path, options: &Options, extra: &Options) -> Result<()> {
        let engine = rhai_runtime::create_configure_engine(output_dir, &self.fetcher);
        let mut scope = Scope::new();
        let _returned: Dynamic = engine
            .call_fn(
                &mut scope,
                &self.ast,
                ENTRY_POINT,
                (
                    output_dir.to_string_lossy().to_string(),
                    rhai_runtime::options_to_map(options),
                    rhai_runtime::options_to_map(extra),
                ),
            )
            .map_err(|e| ResolverError::Script {
                unit: self.path.display().to_string(),
                message: e.to_string(),
            })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fetcher() -> Fetcher {
        Fetcher::new(crate::net::DEFAULT_TIMEOUT, crate::net::DEFAULT_USER_AGENT).unwrap()
    }

    fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, body).unwrap();
        path
    }

    const VALID: &str = r#"
let plugin_id = "Essentials";
let plugin_versions = ["2.0", "2.1.x"];

fn configure(output_dir, options, extra) {
    let merged = merge_options(options, #{ motd: "Welcome" });
    let ext = if "config_type" in extra { extra.config_type } else { "yml" };
    write_file(join_path("Essentials", "config." + ext), render_template("motd: '{{ motd }}'\n", merged));
}
"#;

    #[test]
    fn loads_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_script(dir.path(), "essentials.rhai", VALID);
        let unit = ScriptConfigurator::load(&path, &fetcher()).unwrap();
        assert_eq!(unit.package_id(), "Essentials");
        assert_eq!(unit.supported_versions(), ["2.0", "2.1.x"]);
    }

    #[test]
    fn runs_configure_inside_output_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_script(dir.path(), "essentials.rhai", VALID);
        let unit = ScriptConfigurator::load(&path, &fetcher()).unwrap();

        let out = tempfile::tempdir().unwrap();
        let mut extra = Options::new();
        extra.insert("config_type".into(), json!("yaml"));
        unit.configure(out.path(), &Options::new(), &extra).unwrap();

        let written = std::fs::read_to_string(out.path().join("Essentials/config.yaml")).unwrap();
        assert_eq!(written, "motd: 'Welcome'\n");
    }

    #[test]
    fn numeric_plugin_id_is_accepted() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_script(
            dir.path(),
            "commons.rhai",
            "let plugin_id = 15290;\nlet plugin_versions = [\"all\"];\nfn configure(a, b, c) {}\n",
        );
        let unit = ScriptConfigurator::load(&path, &fetcher()).unwrap();
        assert_eq!(unit.package_id(), "15290");
    }

    #[test]
    fn rejects_incomplete_units() {
        let dir = tempfile::tempdir().unwrap();
        let cases = [
            ("no_fn.rhai", "let plugin_id = \"x\"; let plugin_versions = [\"all\"];", "configure"),
            ("wrong_arity.rhai", "let plugin_id = \"x\"; let plugin_versions = [\"all\"]; fn configure(a) {}", "configure"),
            ("no_id.rhai", "let plugin_versions = [\"all\"]; fn configure(a, b, c) {}", "plugin_id"),
            ("no_versions.rhai", "let plugin_id = \"x\"; fn configure(a, b, c) {}", "plugin_versions"),
            ("broken.rhai", "let plugin_id = ", "compile"),
            ("init.rhai", VALID, "initializer"),
        ];
        for (name, body, expected) in cases {
            let path = write_script(dir.path(), name, body);
            match ScriptConfigurator::load(&path, &fetcher()) {
                Err(ResolverError::InvalidConfigurator { reason, .. }) => {
                    assert!(reason.contains(expected), "{name}: {reason}");
                }
                other => panic!("{name}: expected InvalidConfigurator, got {other:?}"),
            }
        }
    }

    #[test]
    fn script_failures_name_the_unit() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_script(
            dir.path(),
            "escape.rhai",
            "let plugin_id = \"x\"; let plugin_versions = [\"all\"];\nfn configure(out, options, extra) { write_file(\"../x\", \"y\"); }\n",
        );
        let unit = ScriptConfigurator::load(&path, &fetcher()).unwrap();
        let out = tempfile::tempdir().unwrap();
        let err = unit
            .configure(out.path(), &Options::new(), &Options::new())
            .unwrap_err();
        assert!(matches!(err, ResolverError::Script { ref unit, .. } if unit.ends_with("escape.rhai")));
    }
}
