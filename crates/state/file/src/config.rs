use std::path::PathBuf;

/// Configuration for the JSON file state store.
#[derive(Debug, Clone)]
pub struct FileConfig {
    /// Path of the JSON document holding every entry.
    pub path: PathBuf,

    /// Write the document with indentation.
    pub pretty: bool,
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("leadline-drafts.json"),
            pretty: false,
        }
    }
}

impl FileConfig {
    /// Create a config pointing at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    /// Path of the scratch file used for atomic replacement.
    pub(crate) fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(std::ffi::OsStr::to_os_string)
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}
