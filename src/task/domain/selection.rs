//! Selection of backlog tasks to promote into the active day.

use super::{Priority, Task, TaskId};
use rand::{Rng, SeedableRng};
use rand_pcg::Mcg128Xsl64;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::{Mutex, PoisonError};

/// Weights are kept in thousandths of a point so jitter stays fine-grained
/// without floating point.
const POINT_SCALE: u32 = 1_000;

/// Strategy that picks which backlog tasks to promote.
///
/// Implementations return at most `count` unique identifiers, all drawn from
/// `backlog`, in promotion order.
pub trait CandidateSelector: Send + Sync {
    /// Picks up to `count` tasks from `backlog`.
    fn select_top_candidates(&self, backlog: &[Task], count: usize) -> Vec<TaskId>;
}

/// Weights for [`PriorityJitterSelector`], in points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionConfig {
    /// Width of the uniform jitter range `[0, jitter_points)`.
    pub jitter_points: u32,
    /// Added for [`Priority::High`] tasks.
    pub high_priority_bonus: u32,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            jitter_points: 100,
            high_priority_bonus: 50,
        }
    }
}

/// Ranks backlog tasks by random jitter plus a high-priority bonus.
///
/// The jitter keeps same-priority tasks from being starved by a fixed
/// tie-break, while the bonus strongly favours high priority. The random
/// source is owned by the selector so tests can seed it.
#[derive(Debug)]
pub struct PriorityJitterSelector<R = Mcg128Xsl64> {
    rng: Mutex<R>,
    config: SelectionConfig,
}

impl PriorityJitterSelector<Mcg128Xsl64> {
    /// Creates a selector seeded from operating-system entropy.
    #[must_use]
    pub fn from_entropy(config: SelectionConfig) -> Self {
        Self::with_rng(Mcg128Xsl64::from_entropy(), config)
    }

    /// Creates a reproducible selector from a fixed seed.
    #[must_use]
    pub fn seeded(seed: u64, config: SelectionConfig) -> Self {
        Self::with_rng(Mcg128Xsl64::seed_from_u64(seed), config)
    }
}

impl<R> PriorityJitterSelector<R>
where
    R: Rng + Send,
{
    /// Creates a selector drawing jitter from `rng`.
    #[must_use]
    pub const fn with_rng(rng: R, config: SelectionConfig) -> Self {
        Self {
            rng: Mutex::new(rng),
            config,
        }
    }

    fn weight(&self, rng: &mut R, priority: Priority) -> u64 {
        let span = self.config.jitter_points.saturating_mul(POINT_SCALE);
        let jitter = if span == 0 { 0 } else { rng.gen_range(0..span) };
        let bonus = match priority {
            Priority::High => self.config.high_priority_bonus.saturating_mul(POINT_SCALE),
            Priority::Medium | Priority::Low => 0,
        };
        u64::from(jitter) + u64::from(bonus)
    }
}

impl<R> CandidateSelector for PriorityJitterSelector<R>
where
    R: Rng + Send,
{
    fn select_top_candidates(&self, backlog: &[Task], count: usize) -> Vec<TaskId> {
        let mut seen = HashSet::new();
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        let mut weighted: Vec<(u64, TaskId)> = backlog
            .iter()
            .filter(|task| seen.insert(task.id()))
            .map(|task| (self.weight(&mut *rng, task.priority()), task.id()))
            .collect();
        drop(rng);

        weighted.sort_by(|left, right| right.0.cmp(&left.0));
        weighted
            .into_iter()
            .take(count)
            .map(|(_, id)| id)
            .collect()
    }
}
