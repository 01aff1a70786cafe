use chrono::{TimeZone, Utc};
use fithome::application::checkout::CheckoutService;
use fithome::application::gateway::AuthorizationGateway;
use fithome::application::manager::SubscriptionManager;
use fithome::infrastructure::clock::FixedClock;
use fithome::infrastructure::in_memory::{InMemoryReceiptStore, InMemorySubscriptionStore};
use fithome::infrastructure::random::FixedRandom;
use std::fs::File;
use std::io::{Error, Write};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

pub const VALID_CARD: &str = "4532015112830366";
pub const INVALID_CARD: &str = "4532015112830367";
pub const VALID_NATIONAL_ID: &str = "52998224725";

pub const ATTEMPTS_HEADER: &str =
    "plan, card_number, cardholder_name, expiry, security_code, national_id";

/// Clock pinned to noon on a given day of June 2024.
pub fn clock_at_june(day: u32) -> Arc<FixedClock> {
    Arc::new(FixedClock::at(
        Utc.with_ymd_and_hms(2024, 6, day, 12, 0, 0).unwrap(),
    ))
}

/// In-memory checkout service with a forced randomness draw.
pub fn test_service(draw: f64, clock: Arc<FixedClock>) -> CheckoutService {
    let gateway = AuthorizationGateway::new(Arc::new(FixedRandom(draw)), clock.clone())
        .with_latency(Duration::ZERO);
    let manager = SubscriptionManager::new(
        Box::new(InMemorySubscriptionStore::new()),
        Box::new(InMemoryReceiptStore::new()),
        clock.clone(),
    );
    CheckoutService::new(gateway, manager, clock)
}

pub fn paid_row(plan: &str, card: &str) -> String {
    format!(
        "{}, {}, Maria Silva, 12/30, 123, {}",
        plan, card, VALID_NATIONAL_ID
    )
}

pub fn trial_row() -> String {
    "trial, , , , ,".to_string()
}

pub fn write_attempts_csv(path: &Path, rows: &[String]) -> Result<(), Error> {
    let mut file = File::create(path)?;
    writeln!(file, "{}", ATTEMPTS_HEADER)?;
    for row in rows {
        writeln!(file, "{}", row)?;
    }
    Ok(())
}
