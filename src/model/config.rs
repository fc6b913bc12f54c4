use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Configuration from mention.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MentionConfig {
    #[serde(default)]
    pub directory: DirectoryConfig,
    #[serde(default)]
    pub ui: UiConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectoryConfig {
    /// Id of the authoring user; never offered as a suggestion.
    #[serde(default)]
    pub current_user: Option<String>,
    /// JSON file holding the staff list (bare array or `{"data": [...]}`).
    #[serde(default)]
    pub staff_file: Option<PathBuf>,
    /// Role label shown for records without a role.
    #[serde(default = "default_fallback_role")]
    pub fallback_role: String,
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        DirectoryConfig {
            current_user: None,
            staff_file: None,
            fallback_role: default_fallback_role(),
        }
    }
}

fn default_fallback_role() -> String {
    "STAFF".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    /// Maximum number of suggestion rows drawn at once.
    #[serde(default = "default_max_visible")]
    pub max_visible: usize,
    #[serde(default)]
    pub colors: HashMap<String, String>,
}

impl Default for UiConfig {
    fn default() -> Self {
        UiConfig {
            max_visible: default_max_visible(),
            colors: HashMap::new(),
        }
    }
}

fn default_max_visible() -> usize {
    8
}
