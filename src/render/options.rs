use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use tera::Value;

use crate::error::{ResolverError, Result};
use crate::net::{self, Fetcher};
use crate::render::file::read_text_file;

/// Ordered option values handed to templates and configurators.
pub type Options = IndexMap<String, Value>;

/// Fill in every default that `explicit` does not already set.
///
/// Explicit values always win; defaults are appended after them in their own
/// order.
pub fn merge(explicit: &Options, defaults: &Options) -> Options {
    let mut merged = explicit.clone();
    for (key, value) in defaults {
        if !merged.contains_key(key) {
            merged.insert(key.clone(), value.clone());
        }
    }
    merged
}

pub fn yaml_to_value(value: &serde_yaml::Value, origin: &str) -> Result<Value> {
    serde_json::to_value(value).map_err(|e| ResolverError::DocumentShape {
        path: origin.to_string(),
        reason: format!("value cannot be used as an option: {e}"),
    })
}

/// Convert a YAML mapping into options, stringifying non-string keys.
pub fn options_from_yaml(mapping: &serde_yaml::Mapping, origin: &str) -> Result<Options> {
    mapping
        .iter()
        .map(|(key, value)| {
            let key = crate::template::flatten::key_text(key);
            let value = yaml_to_value(value, &format!("{origin}.{key}"))?;
            Ok((key, value))
        })
        .collect()
}

/// Parse a defaults document: a YAML mapping of variable name to value.
/// An empty document yields no defaults.
pub fn parse_defaults(text: &str, origin: &str) -> Result<Options> {
    let doc: serde_yaml::Value =
        serde_yaml::from_str(text).map_err(|e| ResolverError::DocumentParse {
            origin: origin.to_string(),
            source: e,
        })?;
    match doc {
        serde_yaml::Value::Null => Ok(Options::new()),
        serde_yaml::Value::Mapping(map) => options_from_yaml(&map, origin),
        _ => Err(ResolverError::DocumentShape {
            path: origin.to_string(),
            reason: "defaults must be a mapping of variable names to values".into(),
        }),
    }
}

/// Where template defaults are loaded from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DefaultsSource {
    Url(String),
    File(PathBuf),
}

impl DefaultsSource {
    /// Exactly one of `url` and `file` must be given.
    pub fn from_parts(url: Option<&str>, file: Option<&Path>) -> Result<Self> {
        match (url, file) {
            (Some(url), None) => Ok(Self::Url(url.to_string())),
            (None, Some(file)) => Ok(Self::File(file.to_path_buf())),
            (None, None) => Err(ResolverError::ConfigurationSource {
                reason: "neither a url nor a file was given".into(),
            }),
            (Some(_), Some(_)) => Err(ResolverError::ConfigurationSource {
                reason: "both a url and a file were given".into(),
            }),
        }
    }

    /// A manifest location: URLs are fetched, anything else is a file path.
    pub fn from_location(location: &str) -> Self {
        if net::is_url(location) {
            Self::Url(location.to_string())
        } else {
            Self::File(PathBuf::from(location))
        }
    }

    pub fn load(&self, fetcher: &Fetcher) -> Result<Options> {
        match self {
            Self::Url(url) => parse_defaults(&fetcher.get_text(url)?, url),
            Self::File(path) => {
                let text = read_text_file(path)?;
                parse_defaults(&text, &path.display().to_string())
            }
        }
    }
}
