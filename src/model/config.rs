use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Configuration from beam.toml
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    pub project: ProjectInfo,
    #[serde(default)]
    pub schedule: ScheduleConfig,
    #[serde(default)]
    pub ui: UiConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectInfo {
    pub name: String,
    /// Repository-side project id (defaults to the name)
    #[serde(default)]
    pub id: Option<String>,
}

impl ProjectConfig {
    pub fn project_id(&self) -> &str {
        self.project.id.as_deref().unwrap_or(&self.project.name)
    }
}

/// How Level1 weights combine into project progress.
///
/// Weights are supposed to sum to 100 but the system tolerates
/// violations: `Normalize` divides by the actual sum, `Literal` divides
/// by 100 and lets the rollup read over (or under) the true share.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeightMode {
    #[default]
    Normalize,
    Literal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleConfig {
    #[serde(default)]
    pub weight_mode: WeightMode,
    /// Initial timeline zoom: "day", "week", or "month"
    #[serde(default = "default_zoom")]
    pub zoom: String,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        ScheduleConfig {
            weight_mode: WeightMode::Normalize,
            zoom: default_zoom(),
        }
    }
}

fn default_zoom() -> String {
    "week".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    #[serde(default)]
    pub colors: HashMap<String, String>,
    #[serde(default = "default_true")]
    pub show_key_hints: bool,
}

impl Default for UiConfig {
    fn default() -> Self {
        UiConfig {
            colors: HashMap::new(),
            show_key_hints: true,
        }
    }
}

fn default_true() -> bool {
    true
}
