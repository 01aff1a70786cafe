use super::plan::Plan;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Length of the free trial window, in whole days.
pub const TRIAL_LENGTH_DAYS: i64 = 5;

/// Workouts visible without full access.
pub const FREE_WORKOUT_CAP: usize = 3;
/// Meal-plan entries visible without full access.
pub const FREE_MEAL_CAP: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionStatus {
    #[default]
    Free,
    Trial,
    Active,
}

/// The persisted subscription state.
///
/// `trial_used` is the permanent trial-history marker: it survives expiry
/// and cancellation so a trial cannot be claimed twice by clearing only the
/// status. All transitions take `now` explicitly; nothing here reads the
/// wall clock.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SubscriptionRecord {
    pub status: SubscriptionStatus,
    pub plan: Option<Plan>,
    pub trial_started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub trial_used: bool,
    pub last_transaction_id: Option<String>,
}

impl SubscriptionRecord {
    /// Starts the trial window. Legal only when no subscription is active
    /// and no trial was ever consumed; otherwise a rejected no-op that
    /// leaves the record untouched. Returns whether the claim took effect.
    pub fn claim_trial(&mut self, now: DateTime<Utc>) -> bool {
        if self.status != SubscriptionStatus::Free || self.trial_used {
            return false;
        }
        self.status = SubscriptionStatus::Trial;
        self.trial_started_at = Some(now);
        self.trial_used = true;
        true
    }

    /// Activates the subscription after an approved authorization.
    pub fn record_approval(&mut self, transaction_id: &str, plan: Plan) {
        self.status = SubscriptionStatus::Active;
        self.plan = Some(plan);
        self.trial_started_at = None;
        self.last_transaction_id = Some(transaction_id.to_string());
    }

    /// Clears plan, trial window and transaction unconditionally.
    /// `trial_used` survives: cancelling does not earn a second trial.
    pub fn cancel(&mut self) {
        self.status = SubscriptionStatus::Free;
        self.plan = None;
        self.trial_started_at = None;
        self.last_transaction_id = None;
    }

    /// Lazy trial expiry: reverts an elapsed trial to the free tier.
    /// Returns whether the record changed, so the caller knows to persist.
    /// Applying it twice yields the same record.
    pub fn expire_trial_if_due(&mut self, now: DateTime<Utc>) -> bool {
        if self.status != SubscriptionStatus::Trial {
            return false;
        }
        match self.trial_elapsed_days(now) {
            Some(elapsed) if elapsed < TRIAL_LENGTH_DAYS => false,
            // Elapsed window, or a trial status without a start timestamp
            _ => {
                self.status = SubscriptionStatus::Free;
                self.trial_started_at = None;
                true
            }
        }
    }

    /// Whole days remaining in the trial window, never negative.
    pub fn trial_days_left(&self, now: DateTime<Utc>) -> i64 {
        match (self.status, self.trial_elapsed_days(now)) {
            (SubscriptionStatus::Trial, Some(elapsed)) => {
                (TRIAL_LENGTH_DAYS - elapsed).max(0)
            }
            _ => 0,
        }
    }

    /// The single entitlement gate: active, or inside the trial window.
    pub fn has_full_access(&self, now: DateTime<Utc>) -> bool {
        match self.status {
            SubscriptionStatus::Active => true,
            SubscriptionStatus::Trial => self
                .trial_elapsed_days(now)
                .is_some_and(|elapsed| elapsed < TRIAL_LENGTH_DAYS),
            SubscriptionStatus::Free => false,
        }
    }

    /// A consumed trial with no access left means the upgrade prompt.
    pub fn needs_upgrade(&self, now: DateTime<Utc>) -> bool {
        self.trial_used && !self.has_full_access(now)
    }

    fn trial_elapsed_days(&self, now: DateTime<Utc>) -> Option<i64> {
        self.trial_started_at.map(|start| (now - start).num_days())
    }
}

/// Derived content gates the rest of the application consults before
/// rendering premium content. `None` caps mean unlimited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Entitlements {
    pub full_access: bool,
    pub workout_cap: Option<usize>,
    pub meal_cap: Option<usize>,
}

impl Entitlements {
    pub fn for_access(full_access: bool) -> Self {
        if full_access {
            Self {
                full_access: true,
                workout_cap: None,
                meal_cap: None,
            }
        } else {
            Self {
                full_access: false,
                workout_cap: Some(FREE_WORKOUT_CAP),
                meal_cap: Some(FREE_MEAL_CAP),
            }
        }
    }

    pub fn visible_workouts(&self, total: usize) -> usize {
        self.workout_cap.map_or(total, |cap| total.min(cap))
    }

    pub fn visible_meals(&self, total: usize) -> usize {
        self.meal_cap.map_or(total, |cap| total.min(cap))
    }
}
