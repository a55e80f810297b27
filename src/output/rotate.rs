//! Rotation of artifacts left over from a previous run

use chrono::Utc;
use std::fs;
use std::io;
use std::path::Path;

/// Checks if a file name matches a wildcard pattern
///
/// `*` matches any run of characters (including none) and `?` matches exactly
/// one character; everything else must match literally.
///
/// # Examples
///
/// ```
/// use trace_watch::output::matches_pattern;
///
/// assert!(matches_pattern("*.json", "laststart.json"));
/// assert!(matches_pattern("log_update_*.json", "log_update_4_7.json"));
/// assert!(!matches_pattern("*.json", "notes.txt"));
/// ```
pub fn matches_pattern(pattern: &str, candidate: &str) -> bool {
    let pattern: Vec<char> = pattern.chars().collect();
    let candidate: Vec<char> = candidate.chars().collect();

    let (mut p, mut c) = (0, 0);
    // Position of the last `*` seen and the candidate index it currently covers up to
    let mut backtrack: Option<(usize, usize)> = None;

    while c < candidate.len() {
        if p < pattern.len() && (pattern[p] == '?' || pattern[p] == candidate[c]) {
            p += 1;
            c += 1;
        } else if p < pattern.len() && pattern[p] == '*' {
            backtrack = Some((p, c));
            p += 1;
        } else if let Some((star, covered)) = backtrack {
            backtrack = Some((star, covered + 1));
            p = star + 1;
            c = covered + 1;
        } else {
            return false;
        }
    }

    pattern[p..].iter().all(|&ch| ch == '*')
}

/// Moves top-level files of `root` matching `pattern` into `root/cache_dir`
///
/// Each moved file is renamed `<name>_<unix-nanos>` so repeated rotations
/// never collide. Directories are left alone.
///
/// # Returns
///
/// The number of files moved
pub fn rotate_files(root: &Path, pattern: &str, cache_dir: &Path) -> io::Result<usize> {
    let target = root.join(cache_dir);
    fs::create_dir_all(&target)?;

    let mut moved = 0;
    for entry in fs::read_dir(root)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }

        let file_name = entry.file_name();
        let Some(name) = file_name.to_str() else {
            continue;
        };
        if !matches_pattern(pattern, name) {
            continue;
        }

        let stamp = Utc::now().timestamp_nanos_opt().unwrap_or_default();
        let destination = target.join(format!("{}_{}", name, stamp));
        fs::rename(entry.path(), &destination)?;
        tracing::debug!("Rotated {} to {}", name, destination.display());
        moved += 1;
    }

    Ok(moved)
}
