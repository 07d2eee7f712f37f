use super::FileSystem;
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

/// In-memory file tree. Directories are implied by the files added under them.
pub struct MockFileSystem {
    files: RwLock<HashMap<PathBuf, Option<String>>>,
    root: PathBuf,
}

impl MockFileSystem {
    pub fn new() -> Self {
        Self::with_root(PathBuf::from("/mock"))
    }

    pub fn with_root(root: PathBuf) -> Self {
        Self {
            files: RwLock::new(HashMap::new()),
            root,
        }
    }

    pub fn add_file(&self, path: impl AsRef<Path>, content: &str) {
        let path = self.normalize_path(path.as_ref());
        let mut files = self.files.write().unwrap_or_else(|e| e.into_inner());

        if let Some(parent) = path.parent() {
            let mut current = PathBuf::new();
            for component in parent.components() {
                current.push(component);
                files.entry(current.clone()).or_insert(None);
            }
        }

        files.insert(path, Some(content.to_string()));
    }

    fn normalize_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }

    fn lookup(&self, path: &Path) -> Option<Option<String>> {
        let path = self.normalize_path(path);
        self.files
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(&path)
            .cloned()
    }
}

impl Default for MockFileSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl FileSystem for MockFileSystem {
    fn is_dir(&self, path: &Path) -> bool {
        matches!(self.lookup(path), Some(None))
    }

    fn is_file(&self, path: &Path) -> bool {
        matches!(self.lookup(path), Some(Some(_)))
    }

    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        match self.lookup(path) {
            Some(Some(content)) => Ok(content),
            Some(None) => Err(io::Error::new(
                io::ErrorKind::Other,
                format!("Not a file: {:?}", path),
            )),
            None => Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("File not found: {:?}", path),
            )),
        }
    }
}
