#![allow(unused_assignments)]

use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum ResolverError {
    #[error("Manifest not found at {path}")]
    #[diagnostic(help("Pass the requirements manifest with -r <file>"))]
    ManifestNotFound { path: PathBuf },

    #[error("Failed to parse manifest {path}")]
    #[diagnostic(help("Check the YAML syntax; top-level keys must be 'Bukkit' and/or 'Spigot'"))]
    ManifestParse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Failed to parse user config")]
    #[diagnostic(help("Check the TOML syntax in your mcresolver config.toml"))]
    ConfigParse {
        #[source]
        source: toml::de::Error,
    },

    #[error("Failed to parse configuration document {origin}")]
    #[diagnostic(help("The document must be well-formed YAML"))]
    DocumentParse {
        origin: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Unsupported document structure at '{path}': {reason}")]
    #[diagnostic(help(
        "Documents must be nested mappings whose leaves are scalars or lists of scalars"
    ))]
    DocumentShape { path: String, reason: String },

    #[error("Variable name '{name}' is produced by more than one path: {}", .paths.join(", "))]
    #[diagnostic(help("Rename one of the keys so their normalized names differ"))]
    VariableCollision { name: String, paths: Vec<String> },

    #[error("Invalid defaults source: {reason}")]
    #[diagnostic(help("Supply exactly one of a defaults URL or a defaults file"))]
    ConfigurationSource { reason: String },

    #[error("{package} (v. {version}) is not available in the {catalog} catalog")]
    #[diagnostic(help("Check the version in your manifest, or pass --latest to fall back"))]
    ResourceUnavailable {
        catalog: String,
        package: String,
        version: String,
    },

    #[error("Invalid package entry '{package}': {reason}")]
    InvalidPackage { package: String, reason: String },

    #[error("Unable to download {url}: {reason}")]
    Download { url: String, reason: String },

    #[error("HTTP request to {url} failed")]
    #[diagnostic(help("Check the URL and your network connection"))]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Expected text from {url} but received binary content")]
    BinaryContent { url: String },

    #[error("Unsafe URL scheme in '{url}': {reason}")]
    #[diagnostic(help("Use https:// URLs for remote templates and scripts"))]
    UnsafeUrl { url: String, reason: String },

    #[error("Template rendering failed for {name}")]
    #[diagnostic(help("Check your template syntax and that every variable has a value"))]
    Render {
        name: String,
        #[source]
        source: tera::Error,
    },

    #[error("Invalid configurator {path}: {reason}")]
    #[diagnostic(help(
        "A configurator script must define `plugin_id`, `plugin_versions` and fn configure(output_dir, options, extra)"
    ))]
    InvalidConfigurator { path: PathBuf, reason: String },

    #[error("Configurator '{unit}' failed: {message}")]
    Script { unit: String, message: String },

    #[error("Path '{path}' escapes the output directory")]
    #[diagnostic(help("Configurator scripts may only write relative paths inside their output directory"))]
    UnsafeScriptPath { path: String },

    #[error("Glob pattern error: {pattern}")]
    GlobPattern {
        pattern: String,
        #[source]
        source: globset::Error,
    },

    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, ResolverError>;
