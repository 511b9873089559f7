use crate::id::AssetId;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Asset lookup key: logical path relative to the asset roots.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AssetKey {
    pub logical_path: PathBuf,
}

impl AssetKey {
    #[inline]
    pub fn new(logical_path: impl Into<PathBuf>) -> Self {
        Self {
            logical_path: logical_path.into(),
        }
    }

    #[inline]
    pub fn id(&self) -> AssetId {
        AssetId::from_key(self)
    }

    #[inline]
    pub fn path(&self) -> &Path {
        &self.logical_path
    }
}

impl From<&str> for AssetKey {
    #[inline]
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for AssetKey {
    #[inline]
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl fmt::Display for AssetKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.logical_path.to_string_lossy())
    }
}

/// Ticket returned by the store for every load request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestId(pub(crate) u64);

impl RequestId {
    #[inline]
    pub fn to_u64(self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AssetState {
    Unloaded,
    Loading,
    Ready,
    Failed(Arc<str>),
}

impl AssetState {
    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            AssetState::Unloaded => "unloaded",
            AssetState::Loading => "loading",
            AssetState::Ready => "ready",
            AssetState::Failed(_) => "failed",
        }
    }
}

/// Raw asset payload shared between the store cache and consumers.
#[derive(Debug, Clone)]
pub struct LoadedAsset {
    pub key: AssetKey,
    pub id: AssetId,
    pub bytes: Arc<[u8]>,
}

impl LoadedAsset {
    #[inline]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn as_str(&self) -> Result<&str, AssetError> {
        std::str::from_utf8(&self.bytes).map_err(|_| AssetError::Utf8 {
            path: self.key.to_string(),
        })
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum AssetError {
    #[error("no asset sources registered")]
    NoSources,

    #[error("asset not found in any source: '{0}'")]
    NotFound(String),

    #[error("failed to read '{path}': {message}")]
    Read { path: String, message: Arc<str> },

    #[error("unknown asset label: '{0}'")]
    UnknownLabel(String),

    #[error("label '{label}' failed: {cause}")]
    Batch {
        label: String,
        cause: Box<AssetError>,
    },

    #[error("invalid catalog '{path}': {message}")]
    Catalog { path: String, message: Arc<str> },

    #[error("asset '{path}' is not valid utf-8")]
    Utf8 { path: String },

    #[error("{0}")]
    Other(Arc<str>),
}

impl AssetError {
    #[inline]
    pub fn other(msg: impl Into<Arc<str>>) -> Self {
        Self::Other(msg.into())
    }
}
