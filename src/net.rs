use std::path::{Path, PathBuf};
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use reqwest::blocking::{Client, Response};
use serde::de::DeserializeOwned;
use tempfile::NamedTempFile;

use crate::error::{ResolverError, Result};
use crate::report;

pub const DEFAULT_USER_AGENT: &str = concat!("mcresolver/", env!("CARGO_PKG_VERSION"));
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Whether `location` should be fetched rather than read from disk.
pub fn is_url(location: &str) -> bool {
    location.contains("://")
}

/// Only `https://` and `http://` are fetched; plain http is allowed with a
/// warning.
pub fn check_url(url: &str) -> Result<()> {
    if url.starts_with("https://") {
        return Ok(());
    }
    if url.starts_with("http://") {
        report::warn(format!("fetching {url} over plain http"));
        return Ok(());
    }
    let scheme = url.split("://").next().unwrap_or(url);
    Err(ResolverError::UnsafeUrl {
        url: url.to_string(),
        reason: format!("scheme '{scheme}' is not supported"),
    })
}

/// Blocking HTTP client with a fixed user agent and request timeout.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
}

impl Fetcher {
    pub fn new(timeout: Duration, user_agent: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .map_err(|e| ResolverError::Http {
                url: "<client>".into(),
                source: e,
            })?;
        Ok(Self { client })
    }

    fn get(&self, url: &str) -> Result<Response> {
        check_url(url)?;
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|e| ResolverError::Http {
                url: url.to_string(),
                source: e,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ResolverError::Download {
                url: url.to_string(),
                reason: format!("server responded with {status}"),
            });
        }
        Ok(response)
    }

    /// Fetch a text document. Binary bodies are rejected.
    pub fn get_text(&self, url: &str) -> Result<String> {
        let bytes = self
            .get(url)?
            .bytes()
            .map_err(|e| ResolverError::Http {
                url: url.to_string(),
                source: e,
            })?;

        if content_inspector::inspect(&bytes).is_binary() {
            return Err(ResolverError::BinaryContent {
                url: url.to_string(),
            });
        }
        String::from_utf8(bytes.to_vec()).map_err(|_| ResolverError::BinaryContent {
            url: url.to_string(),
        })
    }

    pub fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        self.get(url)?.json().map_err(|e| ResolverError::Http {
            url: url.to_string(),
            source: e,
        })
    }

    /// Stream `url` into `dest_dir/file_name`, showing progress.
    ///
    /// The body is written to a temporary file in `dest_dir` and only moved
    /// into place once complete, so failed downloads leave nothing behind.
    pub fn download(&self, url: &str, dest_dir: &Path, file_name: &str) -> Result<PathBuf> {
        let response = self.get(url)?;

        let bar = match response.content_length() {
            Some(len) => ProgressBar::new(len),
            None => ProgressBar::new_spinner(),
        };
        let bar_style = ProgressStyle::with_template(
            "{spinner:.green} {msg} [{bar:30.cyan/blue}] {bytes}/{total_bytes}",
        )
        .map(|s| s.progress_chars("=> "))
        .unwrap_or_else(|_| ProgressStyle::default_bar());
        bar.set_style(bar_style);
        bar.set_message(file_name.to_string());

        let mut tmp = NamedTempFile::new_in(dest_dir).map_err(|e| ResolverError::Io {
            context: format!("creating temporary file in {}", dest_dir.display()),
            source: e,
        })?;

        let mut reader = bar.wrap_read(response);
        std::io::copy(&mut reader, &mut tmp).map_err(|e| ResolverError::Download {
            url: url.to_string(),
            reason: e.to_string(),
        })?;
        bar.finish_and_clear();

        let dest = dest_dir.join(file_name);
        tmp.persist(&dest).map_err(|e| ResolverError::Io {
            context: format!("writing {}", dest.display()),
            source: e.error,
        })?;
        Ok(dest)
    }
}
