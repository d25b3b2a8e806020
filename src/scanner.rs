use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// One station's observation file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StationFile {
    pub station_id: String,
    pub path: PathBuf,
}

/// Station identifier for a file: its name without directory or extension
pub fn station_id_from_path(path: &Path) -> Option<String> {
    path.file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// List the station files in `dir` whose extension is `suffix`.
///
/// Entries are sorted by path so every run visits files in the same order.
/// Listing has no side effects and can be repeated.
pub fn scan_station_files(
    dir: &Path,
    suffix: &str,
) -> Result<std::vec::IntoIter<StationFile>> {
    let mut files = Vec::new();

    for entry in fs::read_dir(dir)
        .with_context(|| format!("Failed to read data directory {:?}", dir))?
    {
        let path = entry?.path();

        if !path.is_file() {
            continue;
        }
        if path.extension().and_then(|e| e.to_str()) != Some(suffix) {
            continue;
        }

        if let Some(station_id) = station_id_from_path(&path) {
            files.push(StationFile { station_id, path });
        }
    }

    files.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(files.into_iter())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_station_id_from_path() {
        assert_eq!(
            station_id_from_path(Path::new("/app/wx_data/USC00110072.txt")).as_deref(),
            Some("USC00110072")
        );
        assert_eq!(station_id_from_path(Path::new("S1")).as_deref(), Some("S1"));
    }

    #[test]
    fn test_scan_filters_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["USC00339312.txt", "USC00110072.txt", "notes.md", "USC00257715.txt"] {
            fs::write(dir.path().join(name), "").unwrap();
        }
        fs::create_dir(dir.path().join("nested.txt")).unwrap();

        let ids: Vec<_> = scan_station_files(dir.path(), "txt")
            .unwrap()
            .map(|f| f.station_id)
            .collect();
        assert_eq!(ids, vec!["USC00110072", "USC00257715", "USC00339312"]);

        // Restartable: a second listing gives the same sequence
        let again: Vec<_> = scan_station_files(dir.path(), "txt")
            .unwrap()
            .map(|f| f.station_id)
            .collect();
        assert_eq!(ids, again);
    }

    #[test]
    fn test_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        assert!(scan_station_files(&dir.path().join("absent"), "txt").is_err());
    }
}
