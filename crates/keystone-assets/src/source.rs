use crate::types::AssetError;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub trait AssetSource: Send + Sync + 'static {
    fn exists(&self, logical_path: &Path) -> bool;
    fn read(&self, logical_path: &Path) -> Result<Vec<u8>, AssetError>;
}

#[derive(Debug, Clone)]
pub struct FileSystemSource {
    root: PathBuf,
}

impl FileSystemSource {
    #[inline]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[inline]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[inline]
    fn resolve(&self, logical_path: &Path) -> PathBuf {
        let mut p = self.root.clone();
        p.push(logical_path);
        p
    }
}

impl AssetSource for FileSystemSource {
    #[inline]
    fn exists(&self, logical_path: &Path) -> bool {
        self.resolve(logical_path).is_file()
    }

    fn read(&self, logical_path: &Path) -> Result<Vec<u8>, AssetError> {
        let p = self.resolve(logical_path);
        std::fs::read(&p).map_err(|e| AssetError::Read {
            path: p.to_string_lossy().into_owned(),
            message: Arc::from(e.to_string()),
        })
    }
}

/// In-memory source. Useful for embedded assets and tests.
#[derive(Default)]
pub struct MemorySource {
    files: RwLock<HashMap<String, Arc<[u8]>>>,
}

impl MemorySource {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(self, logical_path: impl AsRef<Path>, bytes: impl Into<Vec<u8>>) -> Self {
        self.insert(logical_path, bytes);
        self
    }

    pub fn insert(&self, logical_path: impl AsRef<Path>, bytes: impl Into<Vec<u8>>) {
        let bytes: Vec<u8> = bytes.into();
        self.files
            .write()
            .insert(normalize(logical_path.as_ref()), Arc::from(bytes));
    }

    pub fn remove(&self, logical_path: impl AsRef<Path>) -> bool {
        self.files
            .write()
            .remove(&normalize(logical_path.as_ref()))
            .is_some()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.files.read().len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.files.read().is_empty()
    }
}

impl AssetSource for MemorySource {
    #[inline]
    fn exists(&self, logical_path: &Path) -> bool {
        self.files.read().contains_key(&normalize(logical_path))
    }

    fn read(&self, logical_path: &Path) -> Result<Vec<u8>, AssetError> {
        let key = normalize(logical_path);
        self.files
            .read()
            .get(&key)
            .map(|b| b.to_vec())
            .ok_or(AssetError::NotFound(key))
    }
}

#[inline]
fn normalize(p: &Path) -> String {
    p.to_string_lossy().replace('\\', "/")
}
