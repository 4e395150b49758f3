use std::path::{Path, PathBuf};

/// Markdown files in the export directory, newest filename first (the
/// exporter prefixes filenames with the date, so name order is date order).
/// The directory is created on first use.
pub fn list_exports(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir)?;
    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.is_file() && path.extension().and_then(|ext| ext.to_str()) == Some("md")
        })
        .collect();
    files.sort_by(|a, b| b.file_name().cmp(&a.file_name()));
    Ok(files)
}

pub fn read_export(path: &Path) -> std::io::Result<String> {
    std::fs::read_to_string(path)
}
