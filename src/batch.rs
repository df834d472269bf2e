//! Batch planning: which files to convert and where the results go.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// Normalise a user-supplied extension (`".txt"` and `"txt"` are the same).
pub fn normalize_extension(ext: &str) -> &str {
    ext.trim_start_matches('.')
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.depth() > 0 && entry.file_name().to_string_lossy().starts_with('.')
}

fn has_extension(path: &Path, ext: &str) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    name.len() > ext.len() + 1
        && name.ends_with(ext)
        && name[..name.len() - ext.len()].ends_with('.')
}

/// Collect files under `dir` whose name ends in `.ext`, sorted by path.
///
/// Hidden files and directories are skipped. Without `recursive` only `dir`
/// itself is searched. Unreadable entries are ignored.
pub fn collect_files(dir: &Path, ext: &str, recursive: bool) -> Vec<PathBuf> {
    let ext = normalize_extension(ext);
    let walker = if recursive {
        WalkDir::new(dir).follow_links(true)
    } else {
        WalkDir::new(dir).max_depth(1)
    };

    let mut files: Vec<PathBuf> = walker
        .into_iter()
        .filter_entry(|e| !is_hidden(e))
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| has_extension(e.path(), ext))
        .map(|e| e.into_path())
        .collect();
    files.sort();
    files
}

/// Output path for `input`: `<stem>_<suffix><.ext>` in the same directory.
pub fn output_path(input: &Path, suffix: &str) -> PathBuf {
    let mut name: OsString = input.file_stem().unwrap_or_default().to_os_string();
    name.push("_");
    name.push(suffix);
    if let Some(ext) = input.extension() {
        name.push(".");
        name.push(ext);
    }
    input.with_file_name(name)
}

/// One planned conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    pub input: PathBuf,
    pub output: PathBuf,
}

/// Pair every input with its output path.
pub fn plan_batch(files: Vec<PathBuf>, suffix: &str) -> Vec<Job> {
    files
        .into_iter()
        .map(|input| {
            let output = output_path(&input, suffix);
            Job { input, output }
        })
        .collect()
}

/// Output paths in `plan` that already exist.
pub fn conflicts(plan: &[Job]) -> Vec<&Path> {
    plan.iter()
        .map(|job| job.output.as_path())
        .filter(|output| output.exists())
        .collect()
}
