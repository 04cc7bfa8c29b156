use std::fmt;

use indexmap::IndexMap;
use serde_yaml::{Mapping, Value};

use crate::error::{ResolverError, Result};

/// Address of a leaf inside a nested document.
///
/// Segments are kept as YAML keys rather than a dot-joined string so keys
/// that contain `.` (or are not strings at all) survive unflattening.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FlatPath {
    segments: Vec<Value>,
}

impl FlatPath {
    pub fn new(segments: Vec<Value>) -> Self {
        Self { segments }
    }

    pub fn segments(&self) -> &[Value] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Segment texts, in path order.
    pub fn segment_names(&self) -> Vec<String> {
        self.segments.iter().map(key_text).collect()
    }

    fn child(&self, key: &Value) -> Self {
        let mut segments = self.segments.clone();
        segments.push(key.clone());
        Self { segments }
    }
}

impl fmt::Display for FlatPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segment_names().join("."))
    }
}

/// A flattened leaf.
#[derive(Debug, Clone, PartialEq)]
pub enum FlatValue {
    Scalar(Value),
    /// `depth` is the indentation (in spaces) of the list's item markers:
    /// two per key on the path.
    List { items: Vec<Value>, depth: usize },
    EmptyMapping,
}

/// Textual form of a mapping key or scalar, as it would read in the source.
pub fn key_text(key: &Value) -> String {
    match key {
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Null => "null".to_string(),
        other => serde_yaml::to_string(other)
            .map(|s| s.trim_end().to_string())
            .unwrap_or_default(),
    }
}

/// Flatten a document into an ordered map of leaf paths.
///
/// The top level must be a mapping; a YAML null (empty document) flattens
/// to an empty map.
pub fn flatten(doc: &Value) -> Result<IndexMap<FlatPath, FlatValue>> {
    let mut flat = IndexMap::new();
    match doc {
        Value::Null => {}
        Value::Mapping(map) => collect(map, &FlatPath::new(Vec::new()), &mut flat)?,
        other => {
            return Err(ResolverError::DocumentShape {
                path: "<root>".into(),
                reason: format!("expected a mapping at the top level, found {}", kind(other)),
            })
        }
    }
    Ok(flat)
}

fn collect(
    map: &Mapping,
    parent: &FlatPath,
    flat: &mut IndexMap<FlatPath, FlatValue>,
) -> Result<()> {
    for (key, value) in map {
        if !is_scalar(key) {
            return Err(ResolverError::DocumentShape {
                path: parent.to_string(),
                reason: "mapping keys must be scalars".into(),
            });
        }
        let path = parent.child(key);
        match value {
            Value::Mapping(child) if child.is_empty() => {
                flat.insert(path, FlatValue::EmptyMapping);
            }
            Value::Mapping(child) => collect(child, &path, flat)?,
            Value::Sequence(items) => {
                if let Some(bad) = items.iter().find(|item| !is_scalar(item)) {
                    return Err(ResolverError::DocumentShape {
                        path: path.to_string(),
                        reason: format!("lists may only contain scalars, found {}", kind(bad)),
                    });
                }
                let depth = path.len() * 2;
                flat.insert(
                    path,
                    FlatValue::List {
                        items: items.clone(),
                        depth,
                    },
                );
            }
            Value::Tagged(_) => {
                return Err(ResolverError::DocumentShape {
                    path: path.to_string(),
                    reason: "tagged values are not supported".into(),
                })
            }
            scalar => {
                flat.insert(path, FlatValue::Scalar(scalar.clone()));
            }
        }
    }
    Ok(())
}

/// Rebuild the nested document from flattened leaves.
pub fn unflatten(flat: &IndexMap<FlatPath, FlatValue>) -> Result<Value> {
    let mut root = Mapping::new();

    for (path, value) in flat {
        let Some((last, parents)) = path.segments().split_last() else {
            return Err(ResolverError::DocumentShape {
                path: "<root>".into(),
                reason: "empty path".into(),
            });
        };

        let mut node = &mut root;
        for segment in parents {
            if !node.contains_key(segment) {
                node.insert(segment.clone(), Value::Mapping(Mapping::new()));
            }
            node = match node.get_mut(segment) {
                Some(Value::Mapping(child)) => child,
                _ => {
                    return Err(ResolverError::DocumentShape {
                        path: path.to_string(),
                        reason: format!("'{}' is a leaf and cannot hold children", key_text(segment)),
                    })
                }
            };
        }

        let leaf = match value {
            FlatValue::Scalar(v) => v.clone(),
            FlatValue::List { items, .. } => Value::Sequence(items.clone()),
            FlatValue::EmptyMapping => Value::Mapping(Mapping::new()),
        };
        node.insert(last.clone(), leaf);
    }

    Ok(Value::Mapping(root))
}

fn is_scalar(value: &Value) -> bool {
    matches!(
        value,
        Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_)
    )
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Sequence(_) => "a list",
        Value::Mapping(_) => "a mapping",
        Value::Tagged(_) => "a tagged value",
    }
}
