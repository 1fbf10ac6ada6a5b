//! Session lifecycle hook that triggers daily automation.

use super::{AutomationContext, AutomationOutcome, DailyAutomationService};
use crate::task::{
    domain::{GroupId, UserId, UserPatch},
    ports::{TaskStore, TaskStoreResult},
};
use mockable::Clock;
use std::sync::Arc;
use tracing::warn;

/// Entry point called when a user's session or group becomes active.
///
/// Automation is background enrichment of the user's board: failures are
/// logged and swallowed, and the next activation retries.
pub struct SessionActivation<S, C>
where
    S: TaskStore,
    C: Clock + Send + Sync,
{
    store: Arc<S>,
    automation: DailyAutomationService<S, C>,
}

impl<S, C> Clone for SessionActivation<S, C>
where
    S: TaskStore,
    C: Clock + Send + Sync,
{
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            automation: self.automation.clone(),
        }
    }
}

impl<S, C> SessionActivation<S, C>
where
    S: TaskStore,
    C: Clock + Send + Sync,
{
    /// Creates a hook around an automation service sharing `store`.
    #[must_use]
    pub const fn new(store: Arc<S>, automation: DailyAutomationService<S, C>) -> Self {
        Self { store, automation }
    }

    /// Runs automation for an explicit user and group.
    ///
    /// Returns `None` when the run failed; the failure has been logged.
    pub async fn activate(&self, context: &AutomationContext) -> Option<AutomationOutcome> {
        match self.automation.run_daily_automation(context).await {
            Ok(outcome) => Some(outcome),
            Err(err) => {
                warn!(
                    user_id = %context.user_id(),
                    error = %err,
                    "daily automation failed, will retry on next activation"
                );
                None
            }
        }
    }

    /// Runs automation for a returning user in their stored active group.
    ///
    /// Returns `None` when the user could not be loaded or the run failed.
    pub async fn resume(&self, user_id: &UserId) -> Option<AutomationOutcome> {
        let user = match self.store.get_user(user_id).await {
            Ok(Some(user)) => user,
            Ok(None) => {
                warn!(%user_id, "session user not found, skipping daily automation");
                return None;
            }
            Err(err) => {
                warn!(%user_id, error = %err, "could not load session user");
                return None;
            }
        };
        let context = AutomationContext::new(user_id.clone(), user.group_id().cloned());
        self.activate(&context).await
    }

    /// Makes `group_id` the user's active group, then runs automation in it.
    ///
    /// # Errors
    ///
    /// Returns the store error when the group switch itself fails. A failed
    /// automation run is logged and reported as `Ok(None)`.
    pub async fn switch_group(
        &self,
        user_id: &UserId,
        group_id: GroupId,
    ) -> TaskStoreResult<Option<AutomationOutcome>> {
        self.store
            .update_user(user_id, UserPatch::activate_group(group_id.clone()))
            .await?;
        let context = AutomationContext::new(user_id.clone(), Some(group_id));
        Ok(self.activate(&context).await)
    }
}
