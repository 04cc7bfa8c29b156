use indexmap::IndexMap;
use serde_yaml::Value;

use crate::config::variable::TypeTag;
use crate::error::{ResolverError, Result};
use crate::template::comments::reattach_comments;
use crate::template::emit::to_yaml_text;
use crate::template::flatten::{flatten, unflatten, FlatPath, FlatValue};
use crate::template::naming::derive_variable_names;

/// A variable's original value and type, as found in the source document.
#[derive(Debug, Clone, PartialEq)]
pub struct TypedDefault {
    pub name: String,
    pub path: FlatPath,
    pub value: Value,
    pub type_tag: TypeTag,
    /// Item indentation for list variables.
    pub depth: Option<usize>,
}

impl TypedDefault {
    /// Value as written to the defaults artifact. Booleans become lowercase
    /// strings so YAML readers do not coerce them.
    pub fn artifact_value(&self) -> Value {
        match &self.value {
            Value::Bool(b) => Value::String(b.to_string()),
            other => other.clone(),
        }
    }
}

/// A generated template together with its defaults.
#[derive(Debug)]
pub struct SynthesizedTemplate {
    pub template: String,
    pub defaults: IndexMap<String, TypedDefault>,
}

impl SynthesizedTemplate {
    /// The defaults artifact: variable name to original value.
    pub fn defaults_yaml(&self) -> Result<String> {
        defaults_to_yaml(&self.defaults)
    }
}

/// Tera placeholder for a variable.
pub fn placeholder(name: &str) -> String {
    format!("{{{{ {name} }}}}")
}

/// Replace every leaf of `doc` with a placeholder and collect the defaults.
///
/// Returns the template text (without comments) and the defaults keyed by
/// variable name, in document order.
pub fn synthesize(doc: &Value) -> Result<(String, IndexMap<String, TypedDefault>)> {
    let flat = flatten(doc)?;

    let leaf_paths: Vec<&FlatPath> = flat
        .iter()
        .filter(|(_, value)| !matches!(value, FlatValue::EmptyMapping))
        .map(|(path, _)| path)
        .collect();
    let mut names = derive_variable_names(&leaf_paths)?.into_iter();

    let mut defaults = IndexMap::new();
    let mut template_flat = IndexMap::new();

    for (path, value) in &flat {
        let (original, depth) = match value {
            FlatValue::EmptyMapping => {
                template_flat.insert(path.clone(), FlatValue::EmptyMapping);
                continue;
            }
            FlatValue::Scalar(v) => (v.clone(), None),
            FlatValue::List { items, depth } => (Value::Sequence(items.clone()), Some(*depth)),
        };

        let Some(name) = names.next() else {
            return Err(ResolverError::DocumentShape {
                path: path.to_string(),
                reason: "no variable name derived".into(),
            });
        };

        template_flat.insert(
            path.clone(),
            FlatValue::Scalar(Value::String(placeholder(&name))),
        );
        defaults.insert(
            name.clone(),
            TypedDefault {
                type_tag: TypeTag::of(&original),
                name,
                path: path.clone(),
                value: original,
                depth,
            },
        );
    }

    let template_doc = unflatten(&template_flat)?;
    let text = to_yaml_text(&template_doc)?;
    Ok((apply_type_tags(&text, &defaults), defaults))
}

/// Parse a source document and synthesize a commented template from it.
pub fn synthesize_document(original_text: &str, origin: &str) -> Result<SynthesizedTemplate> {
    let doc: Value =
        serde_yaml::from_str(original_text).map_err(|e| ResolverError::DocumentParse {
            origin: origin.to_string(),
            source: e,
        })?;

    let (text, defaults) = synthesize(&doc)?;

    Ok(SynthesizedTemplate {
        template: reattach_comments(&text, original_text),
        defaults,
    })
}

/// Rewrite the emitted placeholders according to each variable's type.
///
/// The emitter quotes every placeholder; typed scalars lose the quotes,
/// strings are escaped when rendered and list variables become a loop
/// emitting one item per line.
fn apply_type_tags(text: &str, defaults: &IndexMap<String, TypedDefault>) -> String {
    let mut out = text.to_string();
    for (name, default) in defaults {
        let bare = placeholder(name);
        let quoted = format!("'{bare}'");
        match default.type_tag {
            tag if tag.is_unquoted() => {
                out = out.replace(&quoted, &bare);
            }
            TypeTag::List => {
                let depth = default.depth.unwrap_or(2);
                out = out.replace(&format!(": {quoted}"), &list_loop(name, depth));
            }
            TypeTag::String => {
                let multiline = default
                    .value
                    .as_str()
                    .is_some_and(|s| s.chars().any(char::is_control));
                out = out.replace(&quoted, &string_placeholder(name, multiline));
            }
            _ => {}
        }
    }
    out
}

/// Placeholder for a string variable.
///
/// Single-line strings stay single-quoted with `'` doubled at render time.
/// Strings holding newlines or other control characters render as a JSON
/// string, which YAML reads as a double-quoted scalar.
pub fn string_placeholder(name: &str, multiline: bool) -> String {
    if multiline {
        format!("{{{{ {name} | as_str | json_encode() }}}}")
    } else {
        format!("'{{{{ {name} | as_str | replace(from=\"'\", to=\"''\") }}}}'")
    }
}

/// Loop construct replacing `: '{{ name }}'` on a list variable's key line.
///
/// Items are JSON-encoded so each reads back with its original scalar type.
pub fn list_loop(name: &str, depth: usize) -> String {
    let pad = " ".repeat(depth);
    format!(
        ":{{% for {name}_item in {name} %}}\n{pad}- {{{{ {name}_item | json_encode() }}}}{{% endfor %}}{{% if {name} | length == 0 %}} []{{% endif %}}"
    )
}

fn defaults_to_yaml(defaults: &IndexMap<String, TypedDefault>) -> Result<String> {
    let values: IndexMap<&str, Value> = defaults
        .iter()
        .map(|(name, default)| (name.as_str(), default.artifact_value()))
        .collect();

    let text = serde_yaml::to_string(&values).map_err(|e| ResolverError::Io {
        context: "serializing template defaults".into(),
        source: std::io::Error::other(e),
    })?;

    // A bare `null` would read back fine, but an empty value is what users
    // are expected to fill in.
    let mut out = String::with_capacity(text.len());
    for line in text.lines() {
        match line.strip_suffix(": null") {
            Some(key) if !line.starts_with(' ') && !line.starts_with('-') => {
                out.push_str(key);
                out.push(':');
            }
            _ => out.push_str(line),
        }
        out.push('\n');
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn synth(text: &str) -> SynthesizedTemplate {
        synthesize_document(text, "test.yml").unwrap()
    }

    #[test]
    fn scalars_become_placeholders() {
        let out = synth("Vault:\n  update-check: true\n");
        assert_eq!(out.template, "Vault:\n  update-check: {{ vault_update_check }}\n");
        let default = &out.defaults["vault_update_check"];
        assert_eq!(default.type_tag, TypeTag::Bool);
        assert_eq!(default.value, Value::Bool(true));
        assert_eq!(default.path.to_string(), "Vault.update-check");
    }

    #[test]
    fn typed_placeholders_are_unquoted_strings_quoted() {
        let out = synth("name: Server\nport: 25565\nratio: 1.5\nflag: false\nempty: ~\n");
        assert!(out
            .template
            .contains(r#"name: '{{ name | as_str | replace(from="'", to="''") }}'"#));
        assert!(out.template.contains("port: {{ port }}"));
        assert!(out.template.contains("ratio: {{ ratio }}"));
        assert!(out.template.contains("flag: {{ flag }}"));
        assert!(out.template.contains("empty: {{ empty }}"));
        assert!(!out.template.contains("'{{ port }}'"));
    }

    fn render_back(text: &str) -> Value {
        let out = synth(text);
        let defaults =
            crate::render::options::parse_defaults(&out.defaults_yaml().unwrap(), "defaults")
                .unwrap();
        let rendered = crate::render::render_str("template", &out.template, &defaults).unwrap();
        serde_yaml::from_str(&rendered)
            .unwrap_or_else(|e| panic!("rendered template is not YAML: {e}\n{rendered}"))
    }

    #[test]
    fn apostrophes_survive_rendering() {
        let source = "msg: \"You don't have permission\"\nplain: it's fine\n";
        assert_eq!(render_back(source), serde_yaml::from_str::<Value>(source).unwrap());
    }

    #[test]
    fn multiline_strings_keep_their_newlines() {
        let source = "motd: |\n  line one\n  line two\ntab: \"a\\tb\"\n";
        let out = synth(source);
        assert!(out.template.contains("motd: {{ motd | as_str | json_encode() }}"));
        assert_eq!(render_back(source), serde_yaml::from_str::<Value>(source).unwrap());
    }

    #[test]
    fn list_items_keep_their_types() {
        let source = "perms: ['*', 'true', 'a: b', \"it's\", 7, true, 1.5, ~]\n";
        let rendered = render_back(source);
        assert_eq!(rendered, serde_yaml::from_str::<Value>(source).unwrap());
    }

    #[test]
    fn overrides_of_another_type_render_as_strings() {
        let out = synth("name: Server\n");
        let mut options = crate::render::options::Options::new();
        options.insert("name".into(), serde_json::json!(25565));
        let rendered = crate::render::render_str("template", &out.template, &options).unwrap();
        assert_eq!(rendered, "name: '25565'\n");
    }

    #[test]
    fn list_item_indentation_matches_depth() {
        let out = synth("top: [a]\nouter:\n  inner:\n    items:\n      - x\n      - y\n");
        assert!(out
            .template
            .contains("top:{% for top_item in top %}\n  - {{ top_item | json_encode() }}{% endfor %}"));
        assert!(out.template.contains(
            "    items:{% for inner_items_item in inner_items %}\n      - {{ inner_items_item | json_encode() }}{% endfor %}"
        ));
        assert_eq!(out.defaults["inner_items"].depth, Some(6));
        assert!(!out.template.contains("'{{ inner_items }}'"));
    }

    #[test]
    fn empty_mapping_is_kept_literal() {
        let out = synth("worlds: {}\nname: x\n");
        assert!(out.template.starts_with("worlds: {}\n"));
        assert_eq!(out.defaults.len(), 1);
    }

    #[test]
    fn defaults_artifact_stringifies_bools_and_blanks_nulls() {
        let out = synth("a:\n  enabled: true\nmotd: hi\nspawn: ~\nlist: [1, 2]\n");
        let yaml = out.defaults_yaml().unwrap();
        assert!(yaml.contains("spawn:\n"), "null should be blank: {yaml}");
        assert!(!yaml.contains("null"));

        let parsed: IndexMap<String, Value> = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed["a_enabled"], Value::String("true".into()));
        assert_eq!(parsed["motd"], Value::String("hi".into()));
        assert_eq!(parsed["spawn"], Value::Null);
        assert_eq!(
            parsed["list"],
            Value::Sequence(vec![Value::from(1), Value::from(2)])
        );
        let keys: Vec<&String> = parsed.keys().collect();
        assert_eq!(keys, vec!["a_enabled", "motd", "spawn", "list"]);
    }

    #[test]
    fn unparseable_source_is_a_document_error() {
        let err = synthesize_document("a: [unclosed\n", "bad.yml").unwrap_err();
        assert!(matches!(err, ResolverError::DocumentParse { ref origin, .. } if origin == "bad.yml"));
    }

    #[test]
    fn collisions_are_lengthened() {
        let out = synth("chat:\n  format:\n    enabled: true\nkits:\n  format:\n    enabled: false\n");
        let names: Vec<&String> = out.defaults.keys().collect();
        assert_eq!(names, vec!["chat_format_enabled", "kits_format_enabled"]);
    }
}
