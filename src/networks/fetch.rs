use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::networks::NetworkError;

pub fn is_url(source: &str) -> bool {
    source.starts_with("http://") || source.starts_with("https://")
}

/// Maps a configured source to a local file, downloading URLs into `cache_dir`
/// once. A cached copy is reused on later runs.
pub fn resolve_source(source: &str, cache_dir: &Path) -> Result<PathBuf, NetworkError> {
    if !is_url(source) {
        let path = PathBuf::from(source);
        if !path.exists() {
            return Err(NetworkError::Input(crate::input::InputError::MissingInput(
                format!("network file {} does not exist", path.display()),
            )));
        }
        return Ok(path);
    }

    let cached = cache_path_for(source, cache_dir);
    if cached.exists() {
        tracing::info!("using cached network {} for {}", cached.display(), source);
        return Ok(cached);
    }

    fs::create_dir_all(cache_dir)?;
    tracing::info!("downloading {}", source);
    let download_err = |message: String| NetworkError::Download {
        url: source.to_string(),
        message,
    };
    let response = reqwest::blocking::get(source).map_err(|e| download_err(e.to_string()))?;
    if !response.status().is_success() {
        return Err(download_err(format!("HTTP status {}", response.status())));
    }
    let body = response.bytes().map_err(|e| download_err(e.to_string()))?;

    let partial = cached.with_extension("part");
    {
        let mut file = File::create(&partial)?;
        file.write_all(&body)?;
        file.sync_all()?;
    }
    fs::rename(&partial, &cached)?;
    tracing::info!("cached {} bytes at {}", body.len(), cached.display());
    Ok(cached)
}

/// `<fnv64 of url>-<last path segment>`; the segment keeps `.csv.gz` style
/// extensions intact for delimiter detection.
pub fn cache_path_for(url: &str, cache_dir: &Path) -> PathBuf {
    let without_query = url.split(['?', '#']).next().unwrap_or(url);
    let segment = without_query
        .rsplit('/')
        .find(|s| !s.is_empty())
        .unwrap_or("network");
    cache_dir.join(format!("{:016x}-{}", hash_bytes(url.as_bytes()), segment))
}

pub fn hash_bytes(data: &[u8]) -> u64 {
    let mut hasher = Fnv64::new();
    hasher.update(data);
    hasher.finish()
}

struct Fnv64 {
    hash: u64,
}

impl Fnv64 {
    fn new() -> Self {
        Self {
            hash: 0xcbf29ce484222325,
        }
    }

    fn update(&mut self, data: &[u8]) {
        let mut h = self.hash;
        for &b in data {
            h ^= b as u64;
            h = h.wrapping_mul(0x100000001b3);
        }
        self.hash = h;
    }

    fn finish(&self) -> u64 {
        self.hash
    }
}
