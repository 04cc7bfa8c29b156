use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use fs4::fs_std::FileExt;
use sha2::{Digest, Sha256};

use crate::error::{ResolverError, Result};
use crate::net::Fetcher;

const SCRIPTS_DIR: &str = "scripts";
const LOCK_FILE: &str = "scripts.lock";

/// Per-run directory of configurator scripts fetched from URLs.
///
/// Holding a `ScratchCache` holds an exclusive lock on the app directory, so
/// a second run sharing it waits until this one calls [`ScratchCache::cleanup`]
/// or drops the cache.
#[derive(Debug)]
pub struct ScratchCache {
    dir: PathBuf,
    lock: File,
}

impl ScratchCache {
    pub fn open(app_dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(app_dir).map_err(|e| ResolverError::Io {
            context: format!("creating application directory {}", app_dir.display()),
            source: e,
        })?;

        let lock_path = app_dir.join(LOCK_FILE);
        let lock = OpenOptions::new()
            .create(true)
            .truncate(false)
            .read(true)
            .write(true)
            .open(&lock_path)
            .map_err(|e| ResolverError::Io {
                context: format!("opening lock file {}", lock_path.display()),
                source: e,
            })?;
        FileExt::lock_exclusive(&lock).map_err(|e| ResolverError::Io {
            context: format!("locking {}", lock_path.display()),
            source: e,
        })?;

        let dir = app_dir.join(SCRIPTS_DIR);
        std::fs::create_dir_all(&dir).map_err(|e| ResolverError::Io {
            context: format!("creating script cache {}", dir.display()),
            source: e,
        })?;

        Ok(Self { dir, lock })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Download `url` into the cache, reusing an earlier copy from this run.
    pub fn materialize(&self, url: &str, fetcher: &Fetcher) -> Result<PathBuf> {
        let path = self.dir.join(cache_key(url));
        if path.exists() {
            return Ok(path);
        }
        let contents = fetcher.get_text(url)?;
        self.store(url, &contents)
    }

    pub fn store(&self, url: &str, contents: &str) -> Result<PathBuf> {
        let path = self.dir.join(cache_key(url));
        std::fs::write(&path, contents).map_err(|e| ResolverError::Io {
            context: format!("caching script {}", path.display()),
            source: e,
        })?;
        Ok(path)
    }

    /// Remove the cache directory and release the lock.
    pub fn cleanup(self) -> Result<()> {
        if self.dir.exists() {
            std::fs::remove_dir_all(&self.dir).map_err(|e| ResolverError::Io {
                context: format!("removing script cache {}", self.dir.display()),
                source: e,
            })?;
        }
        Ok(())
    }
}

impl Drop for ScratchCache {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.lock);
    }
}

/// Deterministic file name for a cached script URL.
pub(crate) fn cache_key(url: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(url.trim_end_matches('/').as_bytes());
    let digest = hasher.finalize();
    let hash: String = digest.iter().take(8).map(|b| format!("{b:02x}")).collect();

    let name = url
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or("script")
        .split(['?', '#'])
        .next()
        .unwrap_or("script")
        .replace(['\\', ':'], "_")
        .replace("..", "_");
    let name = if name.is_empty() { "script".to_string() } else { name };

    format!("{hash}-{name}")
}
