use crate::domain::subscription::SubscriptionStatus;
use crate::error::Result;
use serde::Serialize;
use std::io::Write;

/// One line of the simulation report.
#[derive(Debug, Serialize, PartialEq)]
pub struct OutcomeRow {
    pub row: usize,
    pub plan: String,
    pub outcome: &'static str,
    pub transaction_id: String,
    pub detail: String,
    pub status_after: SubscriptionStatus,
    pub full_access: bool,
}

/// Writes the per-attempt outcome report as CSV.
pub struct OutcomeWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> OutcomeWriter<W> {
    pub fn new(dest: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(dest),
        }
    }

    pub fn write_row(&mut self, outcome: &OutcomeRow) -> Result<()> {
        self.writer.serialize(outcome)?;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}
