use serde_yaml::{Mapping, Value};

use crate::error::{ResolverError, Result};
use crate::template::flatten::key_text;

const INDENT: usize = 2;

/// Serialize a document as block-style YAML with two-space indentation.
///
/// List items are indented one level under their key, and any string that
/// would not read back as the same string is single-quoted.
pub fn to_yaml_text(doc: &Value) -> Result<String> {
    let mut out = String::new();
    match doc {
        Value::Null => {}
        Value::Mapping(map) => emit_mapping(map, 0, &mut out)?,
        _ => {
            return Err(ResolverError::DocumentShape {
                path: "<root>".into(),
                reason: "only mappings can be emitted".into(),
            })
        }
    }
    Ok(out)
}

fn emit_mapping(map: &Mapping, indent: usize, out: &mut String) -> Result<()> {
    let pad = " ".repeat(indent);
    for (key, value) in map {
        let key = scalar_text(key);
        match value {
            Value::Mapping(child) if child.is_empty() => {
                out.push_str(&format!("{pad}{key}: {{}}\n"));
            }
            Value::Mapping(child) => {
                out.push_str(&format!("{pad}{key}:\n"));
                emit_mapping(child, indent + INDENT, out)?;
            }
            Value::Sequence(items) if items.is_empty() => {
                out.push_str(&format!("{pad}{key}: []\n"));
            }
            Value::Sequence(items) => {
                out.push_str(&format!("{pad}{key}:\n"));
                let item_pad = " ".repeat(indent + INDENT);
                for item in items {
                    if matches!(item, Value::Mapping(_) | Value::Sequence(_) | Value::Tagged(_)) {
                        return Err(ResolverError::DocumentShape {
                            path: key.clone(),
                            reason: "lists may only contain scalars".into(),
                        });
                    }
                    out.push_str(&format!("{item_pad}- {}\n", scalar_text(item)));
                }
            }
            Value::Tagged(_) => {
                return Err(ResolverError::DocumentShape {
                    path: key,
                    reason: "tagged values are not supported".into(),
                })
            }
            scalar => {
                out.push_str(&format!("{pad}{key}: {}\n", scalar_text(scalar)));
            }
        }
    }
    Ok(())
}

/// Text for a scalar, quoted when the plain form would change its meaning.
pub fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => quote_if_needed(s),
        other => key_text(other),
    }
}

fn quote_if_needed(s: &str) -> String {
    if s.chars().any(char::is_control) {
        // JSON string syntax is valid YAML double-quoted syntax.
        return serde_json::to_string(s).unwrap_or_else(|_| single_quoted(s));
    }
    if reads_back_as(s) {
        s.to_string()
    } else {
        single_quoted(s)
    }
}

fn reads_back_as(s: &str) -> bool {
    if s.is_empty() || s.trim() != s {
        return false;
    }
    matches!(serde_yaml::from_str::<Value>(s), Ok(Value::String(ref parsed)) if parsed == s)
}

fn single_quoted(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}
