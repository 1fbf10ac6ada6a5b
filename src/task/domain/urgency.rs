//! Urgency scoring for tasks that overspill their planned day.
//!
//! The score is an annotation for downstream prioritisation. The default
//! strategy is keyword based; [`UrgencyScorer`] lets hosts substitute a
//! different policy without touching the automation service.

use super::{Priority, Task, TaskDomainError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Urgency annotation in `0..=100`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub struct UrgencyScore(u8);

impl UrgencyScore {
    /// Highest representable urgency.
    pub const MAX: Self = Self(100);

    /// Creates a validated score.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::UrgencyOutOfRange`] above 100.
    pub fn new(value: u16) -> Result<Self, TaskDomainError> {
        u8::try_from(value)
            .ok()
            .filter(|score| *score <= Self::MAX.0)
            .map(Self)
            .ok_or(TaskDomainError::UrgencyOutOfRange(value))
    }

    /// Creates a score, clamping anything above 100 to 100.
    #[must_use]
    pub fn saturating(value: u32) -> Self {
        u8::try_from(value.min(u32::from(Self::MAX.0))).map_or(Self::MAX, Self)
    }

    /// Returns the numeric value.
    #[must_use]
    pub const fn value(self) -> u8 {
        self.0
    }
}

impl TryFrom<u16> for UrgencyScore {
    type Error = TaskDomainError;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<UrgencyScore> for u16 {
    fn from(score: UrgencyScore) -> Self {
        Self::from(score.0)
    }
}

impl fmt::Display for UrgencyScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Strategy that rates how urgent a task is.
pub trait UrgencyScorer: Send + Sync {
    /// Scores a task. Implementations must be deterministic and free of I/O.
    fn score(&self, task: &Task) -> UrgencyScore;
}

/// Weights for [`KeywordUrgencyScorer`].
///
/// # Examples
///
/// ```
/// use tasker::task::domain::ScoringConfig;
///
/// let config = ScoringConfig::default();
/// assert_eq!(config.base_score, 30);
/// assert!(config.keywords.iter().any(|keyword| keyword == "asap"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Score every task starts from.
    pub base_score: u32,
    /// Added once per keyword found in the title or description.
    pub keyword_bonus: u32,
    /// Added for [`Priority::High`] tasks.
    pub high_priority_bonus: u32,
    /// Lower-case keywords that signal urgency.
    pub keywords: Vec<String>,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            base_score: 30,
            keyword_bonus: 15,
            high_priority_bonus: 20,
            keywords: ["urgent", "important", "deadline", "asap", "client", "fix"]
                .into_iter()
                .map(str::to_owned)
                .collect(),
        }
    }
}

/// Scores tasks by keyword hits in their text plus a high-priority boost.
///
/// Each keyword contributes at most once, hits stack, and the total is
/// clamped to 100.
#[derive(Debug, Clone, Default)]
pub struct KeywordUrgencyScorer {
    config: ScoringConfig,
}

impl KeywordUrgencyScorer {
    /// Creates a scorer with the given weights.
    #[must_use]
    pub const fn new(config: ScoringConfig) -> Self {
        Self { config }
    }

    /// Returns the active weights.
    #[must_use]
    pub const fn config(&self) -> &ScoringConfig {
        &self.config
    }

    fn keyword_hits(&self, text: &str) -> u32 {
        let matched = self
            .config
            .keywords
            .iter()
            .filter(|keyword| !keyword.is_empty() && text.contains(keyword.to_lowercase().as_str()))
            .count();
        u32::try_from(matched).unwrap_or(u32::MAX)
    }
}

impl UrgencyScorer for KeywordUrgencyScorer {
    fn score(&self, task: &Task) -> UrgencyScore {
        let text = format!("{} {}", task.title().as_str(), task.description()).to_lowercase();
        let priority_bonus = match task.priority() {
            Priority::High => self.config.high_priority_bonus,
            Priority::Medium | Priority::Low => 0,
        };
        let raw = self
            .config
            .base_score
            .saturating_add(self.keyword_hits(&text).saturating_mul(self.config.keyword_bonus))
            .saturating_add(priority_bonus);
        UrgencyScore::saturating(raw)
    }
}
