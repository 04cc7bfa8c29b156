use std::path::{Path, PathBuf};

use crate::config::manifest::TemplateDirective;
use crate::error::Result;
use crate::net::{self, Fetcher};
use crate::render::file::{confine, read_text_file, render_str, write_output};
use crate::render::options::{merge, DefaultsSource, Options};
use crate::script::source::expand_home;

/// Render `template` with `options` and write it to
/// `<output_dir>/<data_folder>/<file_name>`.
pub fn render_into(
    output_dir: &Path,
    data_folder: &str,
    file_name: &str,
    template: &str,
    options: &Options,
) -> Result<PathBuf> {
    let relative = format!("{data_folder}/{file_name}");
    let target = confine(output_dir, &relative)?;
    let rendered = render_str(&relative, template, options)?;
    write_output(&target, &rendered)?;
    Ok(target)
}

fn defaults_source(location: &str) -> DefaultsSource {
    if net::is_url(location) {
        DefaultsSource::Url(location.to_string())
    } else {
        DefaultsSource::File(expand_home(location))
    }
}

fn template_text(location: &str, fetcher: &Fetcher) -> Result<String> {
    if net::is_url(location) {
        fetcher.get_text(location)
    } else {
        read_text_file(&expand_home(location))
    }
}

/// Configure a package from a manifest `template` directive.
///
/// Defaults are loaded first, so a missing defaults document fails before
/// the template is fetched.
pub fn configure_from_template(
    directive: &TemplateDirective,
    plugins_dir: &Path,
    options: &Options,
    fetcher: &Fetcher,
) -> Result<PathBuf> {
    let defaults = defaults_source(&directive.defaults).load(fetcher)?;
    let merged = merge(options, &defaults);
    let template = template_text(&directive.template, fetcher)?;
    render_into(
        plugins_dir,
        &directive.plugin_data_folder,
        &directive.config_file,
        &template,
        &merged,
    )
}
