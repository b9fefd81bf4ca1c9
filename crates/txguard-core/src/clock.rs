//! Processing-date source for the date rule.
//!
//! The evaluator never reads wall-clock time directly; it asks a [`Clock`].

use chrono::{Local, NaiveDate};

/// Supplies the current processing date.
pub trait Clock: Send + Sync {
    /// The date evaluations are judged against.
    fn today(&self) -> NaiveDate;
}

/// Local wall-clock date.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// A clock pinned to one date. Used for replays and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}
