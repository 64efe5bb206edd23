use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// An inclusive stay range: both `start` and `end` count as booked days.
///
/// Two ranges overlap iff they share at least one day, i.e.
/// `s1 <= e2 && s2 <= e1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// Reasons a date range is rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DateRangeError {
    /// `end` precedes `start`.
    EndBeforeStart,
    /// `start` precedes the given reference day.
    StartInPast,
}

impl std::fmt::Display for DateRangeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DateRangeError::EndBeforeStart => f.write_str("end date cannot be before start date"),
            DateRangeError::StartInPast => f.write_str("start date cannot be in the past"),
        }
    }
}

impl std::error::Error for DateRangeError {}

impl DateRange {
    /// Creates a range, rejecting `end < start`.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, DateRangeError> {
        if end < start {
            return Err(DateRangeError::EndBeforeStart);
        }
        Ok(Self { start, end })
    }

    /// Full validation as applied at the service boundary: well-ordered
    /// and not starting before `today`.
    pub fn validate(&self, today: NaiveDate) -> Result<(), DateRangeError> {
        if self.end < self.start {
            return Err(DateRangeError::EndBeforeStart);
        }
        if self.start < today {
            return Err(DateRangeError::StartInPast);
        }
        Ok(())
    }

    /// Inclusive-both-ends overlap test.
    pub fn overlaps(&self, other: &DateRange) -> bool {
        self.start <= other.end && other.start <= self.end
    }
}

impl std::fmt::Display for DateRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} - {}", self.start, self.end)
    }
}
