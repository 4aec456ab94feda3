//! Filename derivation, sanitization, and collision-safe file reservation.
//!
//! Names come from the last URL path segment. The destination file is
//! created exclusively (`create_new`); when the plain name is taken the
//! current Unix timestamp is prepended, and a counter follows it if that
//! name is taken too. Exclusive creation makes the check-and-create atomic,
//! so two transfers can never be handed the same path.

use std::io;
use std::path::{Component, Path, PathBuf};

use tokio::fs::{File, OpenOptions};
use tracing::debug;
use url::Url;

/// Name used when the URL has no usable last path segment.
pub(crate) const FALLBACK_FILENAME: &str = "download.bin";

/// Upper bound on renamed candidates tried before giving up.
const MAX_COLLISION_ATTEMPTS: u32 = 1000;

/// A destination file that has been created exclusively for one transfer.
#[derive(Debug)]
pub(crate) struct ReservedFile {
    /// Full path of the created file.
    pub(crate) path: PathBuf,
    /// File name relative to the destination directory.
    pub(crate) file_name: String,
    /// Open, empty handle.
    pub(crate) file: File,
}

/// Derives a safe filename from the URL's last path segment.
pub(crate) fn filename_from_url(url: &Url) -> String {
    if let Some(mut segments) = url.path_segments()
        && let Some(last) = segments.next_back()
        && !last.is_empty()
    {
        let decoded = urlencoding::decode(last).unwrap_or_else(|e| {
            debug!(segment = %last, error = %e, "URL decoding failed, using raw segment");
            last.into()
        });
        let sanitized = sanitize_filename(&decoded);
        if !sanitized.trim_matches('_').is_empty() {
            return sanitized;
        }
    }
    FALLBACK_FILENAME.to_string()
}

/// Sanitizes filename for filesystem safety.
///
/// Replaces characters that are invalid on common filesystems:
/// / \ : * ? " < > |
pub(crate) fn sanitize_filename(name: &str) -> String {
    let sanitized: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    if sanitized.is_empty() {
        return "_".to_string();
    }

    if is_safe_filename_segment(&sanitized) {
        sanitized
    } else {
        sanitized
            .chars()
            .map(|c| if c == '.' { '_' } else { c })
            .collect()
    }
}

fn is_safe_filename_segment(name: &str) -> bool {
    !Path::new(name).components().any(|component| {
        matches!(
            component,
            Component::CurDir | Component::ParentDir | Component::RootDir | Component::Prefix(_)
        )
    })
}

/// Candidate name for the `attempt`-th collision: `{secs}_{name}`, then
/// `{secs}_{attempt}_{name}`.
pub(crate) fn collision_name(filename: &str, unix_secs: u64, attempt: u32) -> String {
    if attempt == 0 {
        format!("{unix_secs}_{filename}")
    } else {
        format!("{unix_secs}_{attempt}_{filename}")
    }
}

pub(crate) fn unix_timestamp_secs() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Exclusively creates a file for `filename` in `dir`, renaming on conflict.
///
/// # Errors
///
/// Returns the IO error from file creation, or `AlreadyExists` once every
/// candidate name is taken.
pub(crate) async fn reserve_destination(dir: &Path, filename: &str) -> io::Result<ReservedFile> {
    reserve_destination_at(dir, filename, unix_timestamp_secs()).await
}

pub(crate) async fn reserve_destination_at(
    dir: &Path,
    filename: &str,
    unix_secs: u64,
) -> io::Result<ReservedFile> {
    let candidates = std::iter::once(filename.to_string())
        .chain((0..MAX_COLLISION_ATTEMPTS).map(|attempt| collision_name(filename, unix_secs, attempt)));

    for file_name in candidates {
        let path = dir.join(&file_name);
        match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
        {
            Ok(file) => {
                return Ok(ReservedFile {
                    path,
                    file_name,
                    file,
                });
            }
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                debug!(path = %path.display(), "destination exists, trying next name");
            }
            Err(e) => return Err(e),
        }
    }

    Err(io::Error::new(
        io::ErrorKind::AlreadyExists,
        format!("no free name for {filename} after {MAX_COLLISION_ATTEMPTS} attempts"),
    ))
}
