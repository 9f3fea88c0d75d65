use anyhow::Result;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use crate::file_scanner::{scan_video_files, VideoFile};

/// The directory being worked on, its videos in concatenation order and the
/// current multi-selection.
#[derive(Debug, Default)]
pub struct Session {
    directory: Option<PathBuf>,
    files: Vec<VideoFile>,
    selected: BTreeSet<usize>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn directory(&self) -> Option<&Path> {
        self.directory.as_deref()
    }

    pub fn files(&self) -> &[VideoFile] {
        &self.files
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Scans `dir` and replaces the whole list with its videos. On error the
    /// session is left untouched.
    pub fn load_directory(&mut self, dir: &Path, extensions: &[String]) -> Result<usize> {
        let files = scan_video_files(dir, extensions)?;
        let count = files.len();
        self.directory = Some(dir.to_path_buf());
        self.files = files;
        self.selected.clear();
        Ok(count)
    }

    pub fn is_selected(&self, index: usize) -> bool {
        self.selected.contains(&index)
    }

    pub fn selected_indices(&self) -> Vec<usize> {
        self.selected.iter().copied().collect()
    }

    pub fn selected_count(&self) -> usize {
        self.selected.len()
    }

    pub fn toggle(&mut self, index: usize) {
        if index >= self.files.len() {
            return;
        }
        if !self.selected.remove(&index) {
            self.selected.insert(index);
        }
    }

    pub fn select_all(&mut self) {
        self.selected = (0..self.files.len()).collect();
    }

    pub fn clear_selection(&mut self) {
        self.selected.clear();
    }

    /// Selected entries in list order.
    pub fn selected_entries(&self) -> Vec<&VideoFile> {
        self.selected.iter().map(|&i| &self.files[i]).collect()
    }

    /// Moves every selected entry one slot earlier. Entries at the top, or
    /// blocked by a selected entry that could not move, stay where they are.
    /// Returns whether anything moved.
    pub fn move_up(&mut self) -> bool {
        let mut moved = false;
        let mut selected = BTreeSet::new();
        for index in self.selected.iter().copied() {
            if index > 0 && !selected.contains(&(index - 1)) {
                self.files.swap(index - 1, index);
                selected.insert(index - 1);
                moved = true;
            } else {
                selected.insert(index);
            }
        }
        self.selected = selected;
        moved
    }

    /// Mirror of [`Session::move_up`] towards the end of the list.
    pub fn move_down(&mut self) -> bool {
        let last = match self.files.len().checked_sub(1) {
            Some(last) => last,
            None => return false,
        };
        let mut moved = false;
        let mut selected = BTreeSet::new();
        for index in self.selected.iter().rev().copied() {
            if index < last && !selected.contains(&(index + 1)) {
                self.files.swap(index, index + 1);
                selected.insert(index + 1);
                moved = true;
            } else {
                selected.insert(index);
            }
        }
        self.selected = selected;
        moved
    }
}

#[cfg(test)]
impl Session {
    pub(crate) fn with_names(names: &[&str]) -> Self {
        Self {
            directory: Some(PathBuf::from("/videos")),
            files: names
                .iter()
                .map(|name| VideoFile {
                    path: PathBuf::from("/videos").join(name),
                    name: name.to_string(),
                })
                .collect(),
            selected: BTreeSet::new(),
        }
    }
}
