//! Booking model and the date range value type

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::{Spot, SpotImage};

/// Rejected `DateRange` construction
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("endDate cannot be on or before startDate")]
pub struct InvalidDateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// A `[start, end]` pair of calendar dates with `start < end`.
///
/// The only way to build one is [`DateRange::new`], so holding a value
/// means the invariant holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, InvalidDateRange> {
        if start < end {
            Ok(Self { start, end })
        } else {
            Err(InvalidDateRange { start, end })
        }
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// Whether `date` lies within the range, both ends included
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

/// A reserved date range for a spot by a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: i64,
    pub spot_id: i64,
    pub user_id: i64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Booking {
    /// Build an unsaved booking for `range`
    pub fn new(spot_id: i64, user_id: i64, range: DateRange) -> Self {
        let now = Utc::now();
        Self {
            id: 0, // Will be set by the database
            spot_id,
            user_id,
            start_date: range.start(),
            end_date: range.end(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether `date` falls within this booking, both ends included
    pub fn covers(&self, date: NaiveDate) -> bool {
        self.start_date <= date && date <= self.end_date
    }
}

/// A booking joined with its spot and the spot's images
#[derive(Debug, Clone)]
pub struct BookingWithSpot {
    pub booking: Booking,
    pub spot: Spot,
    pub spot_images: Vec<SpotImage>,
}
