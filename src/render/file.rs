use std::path::{Component, Path, PathBuf};

use tera::Tera;

use crate::error::{ResolverError, Result};
use crate::render::context::build_context;
use crate::render::options::Options;

/// Render template text with the given options.
///
/// Autoescaping is off: configuration files are not HTML.
pub fn render_str(name: &str, text: &str, options: &Options) -> Result<String> {
    let mut tera = Tera::default();
    tera.autoescape_on(vec![]);
    tera.add_raw_template(name, text)
        .map_err(|e| ResolverError::Render {
            name: name.to_string(),
            source: e,
        })?;

    tera.render(name, &build_context(options))
        .map_err(|e| ResolverError::Render {
            name: name.to_string(),
            source: e,
        })
}

/// Detect binary files using content_inspector (BOM-aware, null-byte scanning).
///
/// Reads only the first 8KB to avoid unnecessary allocation for large files.
pub fn is_binary_file(path: &Path) -> bool {
    use std::io::Read;

    let Ok(file) = std::fs::File::open(path) else {
        return false;
    };

    let mut buf = [0u8; 8192];
    let Ok(n) = file.take(8192).read(&mut buf) else {
        return false;
    };

    !content_inspector::inspect(&buf[..n]).is_text()
}

/// Read a template or defaults file, refusing binary content.
pub fn read_text_file(path: &Path) -> Result<String> {
    if is_binary_file(path) {
        return Err(ResolverError::BinaryContent {
            url: path.display().to_string(),
        });
    }
    std::fs::read_to_string(path).map_err(|e| ResolverError::Io {
        context: format!("reading {}", path.display()),
        source: e,
    })
}

/// Write rendered output, creating parent directories as needed.
pub fn write_output(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| ResolverError::Io {
            context: format!("creating directory {}", parent.display()),
            source: e,
        })?;
    }
    std::fs::write(path, contents).map_err(|e| ResolverError::Io {
        context: format!("writing {}", path.display()),
        source: e,
    })
}

/// Resolve a user- or script-supplied path inside `output_dir`.
///
/// Relative paths are joined onto `output_dir`; absolute paths must already
/// lie under it. `..` is never allowed.
pub fn confine(output_dir: &Path, path: &str) -> Result<PathBuf> {
    let requested = Path::new(path);
    let relative = if requested.is_absolute() {
        requested
            .strip_prefix(output_dir)
            .map_err(|_| ResolverError::UnsafeScriptPath {
                path: path.to_string(),
            })?
    } else {
        requested
    };

    if relative
        .components()
        .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir))
    {
        return Err(ResolverError::UnsafeScriptPath {
            path: path.to_string(),
        });
    }
    Ok(output_dir.join(relative))
}
