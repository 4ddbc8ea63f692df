use std::path::{Path, PathBuf};

/// A user-selected local video file.
///
/// `id` increases with every selection, so two picks of the same file are
/// still distinct sources.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VideoSource {
    id: u64,
    path: PathBuf,
}

impl VideoSource {
    pub fn new(id: u64, path: PathBuf) -> Self {
        Self { id, path }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File name for display, falling back to the full path.
    pub fn display_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }
}
