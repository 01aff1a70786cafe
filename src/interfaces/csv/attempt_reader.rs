use crate::application::checkout::CheckoutForm;
use crate::domain::plan::Plan;
use crate::error::{CheckoutError, Result};
use serde::Deserialize;
use std::io::Read;

/// What a simulation row asks for: the free trial, or a paid plan.
#[derive(Debug, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum PlanChoice {
    Trial,
    Monthly,
    Annual,
}

impl PlanChoice {
    pub fn plan(&self) -> Option<Plan> {
        match self {
            PlanChoice::Trial => None,
            PlanChoice::Monthly => Some(Plan::Monthly),
            PlanChoice::Annual => Some(Plan::Annual),
        }
    }
}

/// One checkout attempt from the simulation input. Card fields may be
/// empty for trial rows.
#[derive(Debug, Deserialize, PartialEq, Clone)]
pub struct CheckoutAttempt {
    pub plan: PlanChoice,
    #[serde(default)]
    pub card_number: String,
    #[serde(default)]
    pub cardholder_name: String,
    #[serde(default)]
    pub expiry: String,
    #[serde(default)]
    pub security_code: String,
    #[serde(default)]
    pub national_id: String,
}

impl CheckoutAttempt {
    pub fn form(&self) -> CheckoutForm {
        CheckoutForm {
            card_number: self.card_number.clone(),
            cardholder_name: self.cardholder_name.clone(),
            expiry: self.expiry.clone(),
            security_code: self.security_code.clone(),
            national_id: self.national_id.clone(),
        }
    }
}

/// Reads checkout attempts from a CSV source.
///
/// This reader wraps `csv::Reader` and provides an iterator over
/// `Result<CheckoutAttempt>`. It handles whitespace trimming and flexible
/// record lengths automatically.
pub struct AttemptReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> AttemptReader<R> {
    /// Creates a new `AttemptReader` from any `Read` source (e.g., File, Stdin).
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(source);
        Self { reader }
    }

    /// Returns an iterator that lazily reads and deserializes attempts.
    pub fn attempts(self) -> impl Iterator<Item = Result<CheckoutAttempt>> {
        self.reader
            .into_deserialize()
            .map(|result| result.map_err(CheckoutError::from))
    }
}
