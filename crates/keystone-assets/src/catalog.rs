use crate::types::{AssetError, AssetKey};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

/// Label -> ordered list of logical paths.
///
/// On disk:
/// ```json
/// { "labels": { "views": ["views/main_menu.view.json"] } }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssetCatalog {
    #[serde(default)]
    labels: BTreeMap<String, Vec<PathBuf>>,
}

impl AssetCatalog {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `path` to `label`. Duplicates within a label are ignored.
    pub fn tag(&mut self, label: impl Into<String>, path: impl Into<PathBuf>) -> &mut Self {
        let path = path.into();
        let entries = self.labels.entry(label.into()).or_default();
        if !entries.contains(&path) {
            entries.push(path);
        }
        self
    }

    /// Builder form of [`AssetCatalog::tag`].
    pub fn with(mut self, label: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        self.tag(label, path);
        self
    }

    #[inline]
    pub fn contains_label(&self, label: &str) -> bool {
        self.labels.contains_key(label)
    }

    pub fn keys(&self, label: &str) -> Option<Vec<AssetKey>> {
        self.labels
            .get(label)
            .map(|paths| paths.iter().cloned().map(AssetKey::new).collect())
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.labels.keys().map(String::as_str)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Merges `other` into `self`, appending paths label by label.
    pub fn merge(&mut self, other: AssetCatalog) {
        for (label, paths) in other.labels {
            for p in paths {
                self.tag(label.clone(), p);
            }
        }
    }

    pub fn from_json(bytes: &[u8], origin: &str) -> Result<Self, AssetError> {
        serde_json::from_slice(bytes).map_err(|e| AssetError::Catalog {
            path: origin.to_owned(),
            message: Arc::from(e.to_string()),
        })
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| "{}".to_owned())
    }
}
