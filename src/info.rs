//! Per-file encoding and size listings.

use chrono::{DateTime, Local};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::convert::Converter;
use crate::detector::{Detect, Detection};
use crate::error::Result;

const SIZE_UNITS: [&str; 9] = ["B", "KB", "MB", "GB", "TB", "PB", "EB", "ZB", "YB"];

/// Human-readable size with base-1024 units and at most two decimals.
///
/// ```
/// assert_eq!(txtconv::format_size(0), "0 B");
/// assert_eq!(txtconv::format_size(1536), "1.5 KB");
/// ```
pub fn format_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0 B".to_string();
    }
    let mut unit = 0;
    let mut scaled = bytes as f64;
    while scaled >= 1024.0 && unit < SIZE_UNITS.len() - 1 {
        scaled /= 1024.0;
        unit += 1;
    }
    let mut number = format!("{scaled:.2}");
    while number.ends_with('0') {
        number.pop();
    }
    if number.ends_with('.') {
        number.push('0');
    }
    format!("{number} {}", SIZE_UNITS[unit])
}

/// Size and creation time of a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stats {
    Available { size: u64, created: DateTime<Local> },
    Unavailable,
}

impl Stats {
    fn read(path: &Path) -> Self {
        let Ok(metadata) = fs::metadata(path) else {
            return Stats::Unavailable;
        };
        match metadata.created().or_else(|_| metadata.modified()) {
            Ok(time) => Stats::Available {
                size: metadata.len(),
                created: DateTime::<Local>::from(time),
            },
            Err(_) => Stats::Unavailable,
        }
    }
}

/// What is known about one listed file.
#[derive(Debug)]
pub struct FileInfo {
    pub path: PathBuf,
    pub detection: Result<Detection>,
    /// `None` unless statistics were requested.
    pub stats: Option<Stats>,
}

impl FileInfo {
    pub fn gather<D: Detect>(converter: &Converter<D>, path: PathBuf, with_stats: bool) -> Self {
        let detection = converter.detect_path(&path);
        let stats = with_stats.then(|| Stats::read(&path));
        Self {
            path,
            detection,
            stats,
        }
    }

    pub fn name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }

    /// `"label (xx.x%)"`, or the read error with zero confidence.
    pub fn encoding_column(&self) -> String {
        match &self.detection {
            Ok(detection) => detection.to_string(),
            Err(err) => format!("Error: {err} (0.0%)"),
        }
    }

    pub fn size_column(&self) -> Option<String> {
        match self.stats {
            Some(Stats::Available { size, .. }) => Some(format_size(size)),
            _ => None,
        }
    }

    pub fn date_column(&self) -> Option<String> {
        match &self.stats {
            Some(Stats::Available { created, .. }) => {
                Some(created.format("%Y-%m-%d %H:%M:%S").to_string())
            }
            _ => None,
        }
    }

    fn size(&self) -> Option<u64> {
        match self.stats {
            Some(Stats::Available { size, .. }) => Some(size),
            _ => None,
        }
    }
}

/// Column widths for aligned output, measured in characters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ColumnWidths {
    pub name: usize,
    pub encoding: usize,
    pub size: usize,
}

/// File count and cumulative size of the files whose stats were readable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Totals {
    pub files: usize,
    pub size: u64,
}

impl Totals {
    pub fn add(&mut self, other: Totals) {
        self.files += other.files;
        self.size += other.size;
    }
}

/// Files of one directory.
#[derive(Debug)]
pub struct DirectoryListing {
    pub dir: PathBuf,
    pub files: Vec<FileInfo>,
}

impl DirectoryListing {
    pub fn widths(&self) -> ColumnWidths {
        self.files.iter().fold(ColumnWidths::default(), |w, f| ColumnWidths {
            name: w.name.max(f.name().chars().count()),
            encoding: w.encoding.max(f.encoding_column().chars().count()),
            size: w.size.max(f.size_column().map_or(0, |s| s.chars().count())),
        })
    }

    pub fn totals(&self) -> Totals {
        let sizes = self.files.iter().filter_map(FileInfo::size);
        Totals {
            files: sizes.clone().count(),
            size: sizes.sum(),
        }
    }
}

/// Group `files` by parent directory, directories in sorted order.
pub fn group_by_directory(files: Vec<PathBuf>) -> Vec<(PathBuf, Vec<PathBuf>)> {
    let mut groups: BTreeMap<PathBuf, Vec<PathBuf>> = BTreeMap::new();
    for file in files {
        let dir = match file.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        groups.entry(dir).or_default().push(file);
    }
    groups.into_iter().collect()
}

/// Detect (and optionally stat) every file, grouped by directory.
pub fn list_files<D: Detect>(
    converter: &Converter<D>,
    files: Vec<PathBuf>,
    with_stats: bool,
) -> Vec<DirectoryListing> {
    group_by_directory(files)
        .into_iter()
        .map(|(dir, paths)| DirectoryListing {
            dir,
            files: paths
                .into_iter()
                .map(|path| FileInfo::gather(converter, path, with_stats))
                .collect(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(0), "0 B");
        assert_eq!(format_size(1), "1.0 B");
        assert_eq!(format_size(1023), "1023.0 B");
        assert_eq!(format_size(1024), "1.0 KB");
        assert_eq!(format_size(1536), "1.5 KB");
        assert_eq!(format_size(1_234_567), "1.18 MB");
        assert_eq!(format_size(5 * 1024 * 1024 * 1024), "5.0 GB");
    }

    #[test]
    fn test_group_by_directory() {
        let groups = group_by_directory(vec![
            PathBuf::from("b/x.txt"),
            PathBuf::from("a/y.txt"),
            PathBuf::from("a/z.txt"),
            PathBuf::from("top.txt"),
        ]);
        let dirs: Vec<_> = groups.iter().map(|(d, _)| d.clone()).collect();
        assert_eq!(dirs, [PathBuf::from("."), PathBuf::from("a"), PathBuf::from("b")]);
        assert_eq!(groups[1].1.len(), 2);
    }

    #[test]
    fn test_listing_with_stats() {
        let dir = tempfile::tempdir().unwrap();
        let utf8 = dir.path().join("utf8.txt");
        let empty = dir.path().join("empty.txt");
        fs::write(&utf8, "zażółć").unwrap();
        fs::write(&empty, "").unwrap();

        let listings = list_files(&Converter::new(), vec![utf8, empty], true);
        assert_eq!(listings.len(), 1);
        let listing = &listings[0];
        assert_eq!(listing.files[0].encoding_column(), "UTF-8 (99.0%)");
        assert_eq!(listing.files[1].encoding_column(), "empty (100.0%)");
        assert_eq!(
            listing.totals(),
            Totals {
                files: 2,
                size: "zażółć".len() as u64
            }
        );
        assert!(listing.files[0].date_column().is_some());
        assert_eq!(
            listing.widths(),
            ColumnWidths {
                name: "empty.txt".len(),
                encoding: "empty (100.0%)".len(),
                size: "10.0 B".len(),
            }
        );
    }

    #[test]
    fn test_unreadable_file() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.txt");
        let info = FileInfo::gather(&Converter::new(), missing, true);
        assert!(info.detection.is_err());
        assert!(info.encoding_column().starts_with("Error: "));
        assert_eq!(info.stats, Some(Stats::Unavailable));
        assert_eq!(info.size_column(), None);
    }
}
