use crate::animator::AnimatorConfig;
use keystone_assets::LoadedAsset;
use keystone_core::EngineError;
use serde::{Deserialize, Serialize};

/// JSON description of a view instance, loaded from the view label.
///
/// ```json
/// { "name": "MainMenu", "component": "MainMenuView", "transition_secs": 0.25 }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewPrefab {
    pub name: String,

    /// View behaviour type name. A prefab without one is not a view.
    #[serde(default)]
    pub component: Option<String>,

    #[serde(default)]
    pub animator: AnimatorConfig,

    #[serde(default = "default_transition_secs")]
    pub transition_secs: f32,

    /// Free-form data handed to the behaviour's `configure`.
    #[serde(default)]
    pub properties: serde_json::Value,
}

fn default_transition_secs() -> f32 {
    0.25
}

impl ViewPrefab {
    pub fn new(name: impl Into<String>, component: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            component: Some(component.into()),
            animator: AnimatorConfig::default(),
            transition_secs: default_transition_secs(),
            properties: serde_json::Value::Null,
        }
    }

    pub fn from_asset(asset: &LoadedAsset) -> Result<Self, EngineError> {
        serde_json::from_slice(&asset.bytes)
            .map_err(|e| EngineError::Other(format!("invalid view prefab '{}': {e}", asset.key)))
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| "{}".to_owned())
    }

    /// Instance name with any trailing "(Clone)" marker removed.
    pub fn instance_name(&self) -> &str {
        self.name.trim_end_matches("(Clone)").trim_end()
    }

    /// String property lookup.
    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key)?.as_str()
    }
}
