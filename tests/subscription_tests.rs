mod common;

use common::clock_at_june;
use fithome::application::manager::SubscriptionManager;
use fithome::domain::plan::Plan;
use fithome::domain::subscription::{SubscriptionStatus, TRIAL_LENGTH_DAYS};
use fithome::infrastructure::clock::FixedClock;
use fithome::infrastructure::in_memory::{InMemoryReceiptStore, InMemorySubscriptionStore};
use std::sync::Arc;

fn manager(clock: Arc<FixedClock>) -> SubscriptionManager {
    SubscriptionManager::new(
        Box::new(InMemorySubscriptionStore::new()),
        Box::new(InMemoryReceiptStore::new()),
        clock,
    )
}

#[tokio::test]
async fn test_trial_expires_after_window() {
    let clock = clock_at_june(1);
    let manager = manager(clock.clone());

    manager.claim_trial().await.unwrap();
    for day in 1..TRIAL_LENGTH_DAYS {
        clock.advance_days(1);
        assert!(
            manager.has_full_access().await.unwrap(),
            "day {} should still be inside the window",
            day
        );
    }

    clock.advance_days(1);
    assert!(!manager.has_full_access().await.unwrap());
    assert_eq!(manager.status().await.unwrap(), SubscriptionStatus::Free);
    assert!(manager.needs_upgrade().await.unwrap());
}

#[tokio::test]
async fn test_expired_trial_stays_expired_across_reads() {
    let clock = clock_at_june(1);
    let manager = manager(clock.clone());

    manager.claim_trial().await.unwrap();
    clock.advance_days(TRIAL_LENGTH_DAYS);

    let first = (
        manager.trial_days_left().await.unwrap(),
        manager.has_full_access().await.unwrap(),
    );
    let second = (
        manager.trial_days_left().await.unwrap(),
        manager.has_full_access().await.unwrap(),
    );
    assert_eq!(first, (0, false));
    assert_eq!(second, first);
}

#[tokio::test]
async fn test_expired_trial_record_keeps_history() {
    let clock = clock_at_june(1);
    let manager = manager(clock.clone());

    manager.claim_trial().await.unwrap();
    clock.advance_days(TRIAL_LENGTH_DAYS + 2);

    let record = manager.record().await.unwrap();
    assert_eq!(record.status, SubscriptionStatus::Free);
    assert_eq!(record.trial_started_at, None);
    assert!(record.trial_used);
    assert!(!manager.claim_trial().await.unwrap());
}

#[tokio::test]
async fn test_claim_after_direct_activation_is_rejected() {
    let clock = clock_at_june(1);
    let manager = manager(clock);

    manager.record_approval("MP1", Plan::Monthly).await.unwrap();
    // An active subscriber has no use for a trial
    assert!(!manager.claim_trial().await.unwrap());
    assert_eq!(manager.status().await.unwrap(), SubscriptionStatus::Active);
}

#[tokio::test]
async fn test_plan_change_keeps_subscription_active() {
    let clock = clock_at_june(1);
    let manager = manager(clock);

    manager.record_approval("MP1", Plan::Monthly).await.unwrap();
    manager.record_approval("MP2", Plan::Annual).await.unwrap();

    let record = manager.record().await.unwrap();
    assert_eq!(record.status, SubscriptionStatus::Active);
    assert_eq!(record.plan, Some(Plan::Annual));
    assert_eq!(record.last_transaction_id, Some("MP2".to_string()));

    let receipt = manager.latest_receipt().await.unwrap().unwrap();
    assert_eq!(receipt.transaction_id, "MP2");
}
