use anyhow::{bail, Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VideoFile {
    pub path: PathBuf,
    pub name: String,
}

/// True when `path` has one of `extensions` (lowercase, no dot), ignoring case.
pub fn has_video_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
        .map(|ext| extensions.iter().any(|known| *known == ext))
        .unwrap_or(false)
}

/// Lists the regular files directly inside `video_dir` with a recognized
/// extension, in the order the directory listing yields them.
pub fn scan_video_files(video_dir: &Path, extensions: &[String]) -> Result<Vec<VideoFile>> {
    if !video_dir.exists() {
        bail!("Video directory does not exist: {}", video_dir.display());
    }

    let entries = fs::read_dir(video_dir)
        .with_context(|| format!("Failed to read directory {}", video_dir.display()))?;

    let mut files = Vec::new();
    for entry in entries {
        let entry =
            entry.with_context(|| format!("Failed to read entry in {}", video_dir.display()))?;
        let path_buf = entry.path();
        if path_buf.is_file() && has_video_extension(&path_buf, extensions) {
            let name = entry.file_name().to_string_lossy().to_string();
            files.push(VideoFile {
                path: path_buf,
                name,
            });
        }
    }

    Ok(files)
}
