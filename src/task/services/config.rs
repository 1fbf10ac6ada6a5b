//! Configuration for daily automation.

use crate::task::domain::{ScoringConfig, SelectionConfig};
use serde::{Deserialize, Serialize};

/// Tunables for [`DailyAutomationService`](super::DailyAutomationService).
///
/// Deserializes from any serde format; omitted fields take their defaults.
///
/// # Examples
///
/// ```
/// use tasker::task::services::AutomationConfig;
///
/// let config: AutomationConfig =
///     serde_json::from_str(r#"{"daily_pick_count": 5}"#).expect("valid config");
/// assert_eq!(config.daily_pick_count, 5);
/// assert_eq!(config.scoring.base_score, 30);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutomationConfig {
    /// Maximum backlog tasks promoted into an empty day.
    pub daily_pick_count: usize,
    /// Weights for the default urgency scorer.
    pub scoring: ScoringConfig,
    /// Weights for the default candidate selector.
    pub selection: SelectionConfig,
    /// Seed for the default selector's random source (`None` uses entropy).
    pub selection_seed: Option<u64>,
}

impl Default for AutomationConfig {
    fn default() -> Self {
        Self {
            daily_pick_count: 3,
            scoring: ScoringConfig::default(),
            selection: SelectionConfig::default(),
            selection_seed: None,
        }
    }
}

impl AutomationConfig {
    /// Creates a configuration whose selector is reproducible.
    #[must_use]
    pub fn seeded(seed: u64) -> Self {
        Self {
            selection_seed: Some(seed),
            ..Self::default()
        }
    }
}
