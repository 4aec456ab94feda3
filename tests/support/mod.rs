#[allow(dead_code)]
pub mod in_flight_server;
pub mod socket_guard;

use std::path::Path;

/// Sorted file names in `dir`.
#[allow(dead_code)]
pub fn file_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .expect("read dest dir")
        .map(|entry| {
            entry
                .expect("dir entry")
                .file_name()
                .to_string_lossy()
                .into_owned()
        })
        .collect();
    names.sort();
    names
}

/// True for `{digits}_{name}` or `{digits}_{digits}_{name}`.
#[allow(dead_code)]
pub fn is_timestamp_renamed(candidate: &str, name: &str) -> bool {
    let Some(prefix) = candidate.strip_suffix(&format!("_{name}")) else {
        return false;
    };
    let parts: Vec<&str> = prefix.split('_').collect();
    (1..=2).contains(&parts.len())
        && parts
            .iter()
            .all(|p| !p.is_empty() && p.chars().all(|c| c.is_ascii_digit()))
}
