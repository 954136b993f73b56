//! Acquisition of raw wiktextract dumps.
//!
//! [`fetch_cached`] implements a cached-or-fetch contract: when the
//! destination file already exists it is returned untouched, otherwise the
//! dump is downloaded to a temporary file next to it and persisted
//! atomically, so an interrupted download never leaves a partial dump
//! behind. Download progress is reported through a caller-supplied
//! callback; this crate does not decide how to display it.
//!
//! Any failure here is fatal to a dictionary build and surfaced as a
//! [`FetchError`]; nothing is retried.

use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::info;

/// French entries extracted from English Wiktionary, all senses (~484 MB).
pub const KAIKKI_FRENCH_URL: &str =
    "https://kaikki.org/dictionary/French/kaikki.org-dictionary-French.jsonl";

/// Filename the dump is cached under.
pub const CACHE_FILE_NAME: &str = "kaikki-french.jsonl";

const CHUNK_SIZE: usize = 64 * 1024;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("server answered {status} for {url}")]
    HttpStatus {
        url: String,
        status: reqwest::StatusCode,
    },
    #[error("downloading {url}: {source}")]
    Download {
        url: String,
        #[source]
        source: std::io::Error,
    },
    #[error("writing download to {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Byte-level progress of an in-flight download.
///
/// `total` is taken from the `Content-Length` header and absent when the
/// server does not announce one.
#[derive(Clone, Copy, Debug)]
pub struct Progress {
    pub downloaded: u64,
    pub total: Option<u64>,
}

/// Return a local copy of `url`, downloading it only when `dest` is absent.
///
/// A cache hit never touches the network. On a miss the response body is
/// streamed to a temporary file in `dest`'s directory, reporting progress
/// after every chunk, and renamed into place once complete.
pub fn fetch_cached(
    url: &str,
    dest: &Path,
    mut on_progress: impl FnMut(Progress),
) -> Result<PathBuf, FetchError> {
    if dest.exists() {
        let size = fs::metadata(dest).map(|m| m.len()).unwrap_or(0);
        info!(
            "using cached {} ({:.1} MB)",
            dest.display(),
            size as f64 / (1024.0 * 1024.0)
        );
        return Ok(dest.to_path_buf());
    }

    let dir = match dest.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir).map_err(|source| FetchError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    info!("downloading {url}");
    let mut response = reqwest::blocking::get(url).map_err(|source| FetchError::Request {
        url: url.to_string(),
        source,
    })?;
    if !response.status().is_success() {
        return Err(FetchError::HttpStatus {
            url: url.to_string(),
            status: response.status(),
        });
    }

    let total = response.content_length();
    let mut temp = NamedTempFile::new_in(dir).map_err(|source| FetchError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut buf = [0u8; CHUNK_SIZE];
    let mut downloaded = 0u64;
    loop {
        let read = response.read(&mut buf).map_err(|source| FetchError::Download {
            url: url.to_string(),
            source,
        })?;
        if read == 0 {
            break;
        }
        temp.write_all(&buf[..read]).map_err(|source| FetchError::Io {
            path: dest.to_path_buf(),
            source,
        })?;
        downloaded += read as u64;
        on_progress(Progress { downloaded, total });
    }

    temp.persist(dest).map_err(|err| FetchError::Io {
        path: dest.to_path_buf(),
        source: err.error,
    })?;

    info!(
        "downloaded {} ({:.1} MB)",
        dest.display(),
        downloaded as f64 / (1024.0 * 1024.0)
    );
    Ok(dest.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_hit_short_circuits_before_any_request() {
        let dir = tempfile::tempdir().expect("temp dir");
        let dest = dir.path().join(CACHE_FILE_NAME);
        let mut file = fs::File::create(&dest).expect("create cache file");
        writeln!(file, r#"{{"word":"chat"}}"#).expect("write cache file");

        // The URL is unresolvable; reaching the network would fail loudly.
        let mut calls = 0;
        let path = fetch_cached("http://invalid.invalid/dump.jsonl", &dest, |_| calls += 1)
            .expect("cache hit");
        assert_eq!(path, dest);
        assert_eq!(calls, 0);
    }

    #[test]
    fn errors_name_the_offending_url() {
        let err = FetchError::HttpStatus {
            url: KAIKKI_FRENCH_URL.to_string(),
            status: reqwest::StatusCode::NOT_FOUND,
        };
        let message = err.to_string();
        assert!(message.contains("404"));
        assert!(message.contains("kaikki.org"));
    }
}
