use std::path::{Path, PathBuf};
use std::sync::Arc;

use rhai::{Dynamic, Engine, EvalAltResult};
use tera::Value;

use crate::error::ResolverError;
use crate::net::Fetcher;
use crate::render::file::{confine, read_text_file, render_str, write_output};
use crate::render::options::{merge, DefaultsSource, Options};

type ScriptResult<T> = std::result::Result<T, Box<EvalAltResult>>;

/// Create a sandboxed Rhai engine with no host functions.
pub fn create_engine() -> Engine {
    let mut engine = Engine::new();

    // Limit recursion and operations for safety
    engine.set_max_call_levels(32);
    engine.set_max_operations(1_000_000);
    engine.set_max_string_size(10 * 1024 * 1024); // 10MB

    engine
}

struct Host {
    output_dir: PathBuf,
    fetcher: Fetcher,
}

fn script_error(e: ResolverError) -> Box<EvalAltResult> {
    e.to_string().into()
}

/// Create an engine whose host functions render templates and write files
/// inside `output_dir` only.
pub fn create_configure_engine(output_dir: &Path, fetcher: &Fetcher) -> Engine {
    let mut engine = create_engine();
    let host = Arc::new(Host {
        output_dir: output_dir.to_path_buf(),
        fetcher: fetcher.clone(),
    });

    engine.register_fn(
        "render_template",
        |text: &str, options: rhai::Map| -> ScriptResult<String> {
            render_str("inline", text, &map_to_options(&options)).map_err(script_error)
        },
    );

    engine.register_fn(
        "render_template_file",
        |path: &str, options: rhai::Map| -> ScriptResult<String> {
            let text = read_text_file(Path::new(path)).map_err(script_error)?;
            render_str(path, &text, &map_to_options(&options)).map_err(script_error)
        },
    );

    let h = Arc::clone(&host);
    engine.register_fn(
        "render_template_url",
        move |url: &str, options: rhai::Map| -> ScriptResult<String> {
            let text = h.fetcher.get_text(url).map_err(script_error)?;
            render_str(url, &text, &map_to_options(&options)).map_err(script_error)
        },
    );

    let h = Arc::clone(&host);
    engine.register_fn("load_defaults_file", move |path: &str| -> ScriptResult<rhai::Map> {
        DefaultsSource::File(PathBuf::from(path))
            .load(&h.fetcher)
            .map(|defaults| options_to_map(&defaults))
            .map_err(script_error)
    });

    let h = Arc::clone(&host);
    engine.register_fn("load_defaults_url", move |url: &str| -> ScriptResult<rhai::Map> {
        DefaultsSource::Url(url.to_string())
            .load(&h.fetcher)
            .map(|defaults| options_to_map(&defaults))
            .map_err(script_error)
    });

    engine.register_fn("merge_options", |options: rhai::Map, defaults: rhai::Map| {
        options_to_map(&merge(&map_to_options(&options), &map_to_options(&defaults)))
    });

    let h = Arc::clone(&host);
    engine.register_fn(
        "write_file",
        move |path: &str, contents: &str| -> ScriptResult<()> {
            let target = confine(&h.output_dir, path).map_err(script_error)?;
            write_output(&target, contents).map_err(script_error)
        },
    );

    let h = Arc::clone(&host);
    engine.register_fn("create_dir", move |path: &str| -> ScriptResult<()> {
        let target = confine(&h.output_dir, path).map_err(script_error)?;
        std::fs::create_dir_all(&target).map_err(|e| {
            script_error(ResolverError::Io {
                context: format!("creating directory {}", target.display()),
                source: e,
            })
        })
    });

    engine.register_fn("join_path", |base: &str, child: &str| -> String {
        Path::new(base).join(child).to_string_lossy().to_string()
    });

    engine
}

pub fn to_dynamic(value: &Value) -> Dynamic {
    match value {
        Value::Null => Dynamic::UNIT,
        Value::Bool(b) => Dynamic::from(*b),
        Value::Number(n) => match n.as_i64() {
            Some(i) => Dynamic::from(i),
            None => Dynamic::from(n.as_f64().unwrap_or_default()),
        },
        Value::String(s) => Dynamic::from(s.clone()),
        Value::Array(items) => Dynamic::from_array(items.iter().map(to_dynamic).collect()),
        Value::Object(map) => Dynamic::from_map(
            map.iter()
                .map(|(k, v)| (k.as_str().into(), to_dynamic(v)))
                .collect(),
        ),
    }
}

pub fn from_dynamic(value: &Dynamic) -> Value {
    if value.is_unit() {
        return Value::Null;
    }
    if let Ok(b) = value.as_bool() {
        return Value::Bool(b);
    }
    if let Ok(i) = value.as_int() {
        return Value::from(i);
    }
    if let Ok(f) = value.as_float() {
        return Value::from(f);
    }
    if value.is_string() {
        return Value::String(value.to_string());
    }
    if let Some(items) = value.clone().try_cast::<rhai::Array>() {
        return Value::Array(items.iter().map(from_dynamic).collect());
    }
    if let Some(map) = value.clone().try_cast::<rhai::Map>() {
        return Value::Object(
            map.iter()
                .map(|(k, v)| (k.to_string(), from_dynamic(v)))
                .collect(),
        );
    }
    Value::String(value.to_string())
}

pub fn options_to_map(options: &Options) -> rhai::Map {
    options
        .iter()
        .map(|(k, v)| (k.as_str().into(), to_dynamic(v)))
        .collect()
}

pub fn map_to_options(map: &rhai::Map) -> Options {
    map.iter()
        .map(|(k, v)| (k.to_string(), from_dynamic(v)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fetcher() -> Fetcher {
        Fetcher::new(crate::net::DEFAULT_TIMEOUT, crate::net::DEFAULT_USER_AGENT).unwrap()
    }

    #[test]
    fn test_create_engine() {
        let engine = create_engine();
        let result: i64 = engine.eval("1 + 2").unwrap();
        assert_eq!(result, 3);
    }

    #[test]
    fn test_engine_max_operations() {
        let engine = create_engine();
        let result = engine.run("let x = 0; while true { x += 1; }");
        assert!(result.is_err());
    }

    #[test]
    fn values_survive_conversion() {
        let value = json!({
            "name": "Vault",
            "enabled": true,
            "port": 25565,
            "ratio": 0.5,
            "kits": ["tools", "food"],
            "nested": {"a": null}
        });
        assert_eq!(from_dynamic(&to_dynamic(&value)), value);
    }

    #[test]
    fn host_functions_render_and_write() {
        let dir = tempfile::tempdir().unwrap();
        let engine = create_configure_engine(dir.path(), &fetcher());

        engine
            .run(
                r#"
                let options = merge_options(#{ update_check: false }, #{ update_check: "true", motd: "hi" });
                let text = render_template("update-check: {{ update_check }}\nmotd: {{ motd }}\n", options);
                create_dir("Vault");
                write_file(join_path("Vault", "config.yml"), text);
                "#,
            )
            .unwrap();

        let written = std::fs::read_to_string(dir.path().join("Vault/config.yml")).unwrap();
        assert_eq!(written, "update-check: false\nmotd: hi\n");
    }

    #[test]
    fn host_writes_outside_output_fail() {
        let dir = tempfile::tempdir().unwrap();
        let engine = create_configure_engine(dir.path(), &fetcher());
        let err = engine.run(r#"write_file("../escape.yml", "x");"#).unwrap_err();
        assert!(err.to_string().contains("escapes the output directory"));
    }

    #[test]
    fn defaults_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let defaults = dir.path().join("defaults.yml");
        std::fs::write(&defaults, "update_check: 'true'\n").unwrap();

        let engine = create_configure_engine(dir.path(), &fetcher());
        let script = format!(
            r#"let d = load_defaults_file("{}"); d.update_check"#,
            defaults.display().to_string().replace('\\', "\\\\")
        );
        let value: String = engine.eval(&script).unwrap();
        assert_eq!(value, "true");
    }
}
