//! Save-file path resolution.

use std::path::Path;
use std::path::PathBuf;

use chrono::Local;

/// Resolve a unique save path under `dir` for the given base name and
/// extension: `<base>-<timestamp>.<ext>`, with a numeric infix when a
/// capture in the same second already produced that name.
pub fn resolve_save_file(dir: &Path, base: &str, extension: &str) -> PathBuf {
    let timestamp = Local::now().format("%Y-%m-%d_%H.%M.%S").to_string();

    let candidate = dir.join(format!("{base}-{timestamp}.{extension}"));
    if !candidate.exists() {
        return candidate;
    }

    let mut n = 1u32;
    loop {
        let candidate = dir.join(format!("{base}-{timestamp}.{n}.{extension}"));
        if !candidate.exists() {
            return candidate;
        }
        n += 1;
    }
}
