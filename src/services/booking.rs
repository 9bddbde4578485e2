//! Booking service
//!
//! Loads the records a booking decision needs, asks `policy` for a permit,
//! then persists what the permit allows. The availability check and the
//! write are separate statements, so two concurrent requests for the same
//! dates can both pass the check.

use crate::db::repositories::{BookingRepository, SpotRepository};
use crate::models::{Booking, BookingWithSpot, DateRange};
use crate::policy::{self, ConflictScope, Mutation, Permit, RequestContext};
use crate::services::error::{FieldErrors, ServiceError};
use anyhow::Context;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::Deserialize;
use std::sync::Arc;

/// `{startDate, endDate}` request body
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingDates {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

impl BookingDates {
    pub fn new(start: &str, end: &str) -> Self {
        Self {
            start_date: Some(start.to_string()),
            end_date: Some(end.to_string()),
        }
    }

    /// Parse both dates and check their order
    pub fn validate(&self) -> Result<DateRange, ServiceError> {
        let mut errors = FieldErrors::new();
        let start = parse_date(self.start_date.as_deref(), "startDate", &mut errors);
        let end = parse_date(self.end_date.as_deref(), "endDate", &mut errors);

        let (Some(start), Some(end)) = (start, end) else {
            return Err(ServiceError::Validation(errors));
        };
        DateRange::new(start, end).map_err(|e| ServiceError::invalid("endDate", &e.to_string()))
    }
}

fn parse_date(value: Option<&str>, field: &str, errors: &mut FieldErrors) -> Option<NaiveDate> {
    let Some(value) = value.filter(|v| !v.trim().is_empty()) else {
        errors.insert(field.to_string(), format!("{} is required", field));
        return None;
    };
    match parse_calendar_date(value.trim()) {
        Some(date) => Some(date),
        None => {
            errors.insert(field.to_string(), format!("{} must be a valid date", field));
            None
        }
    }
}

/// A plain `YYYY-MM-DD` date, or the calendar date of a full timestamp as
/// written (RFC 3339 with offset, or a naive `YYYY-MM-DDTHH:MM:SS`).
/// Anything else, trailing text included, is rejected.
fn parse_calendar_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(value).ok().map(|dt| dt.date_naive()))
        .or_else(|| {
            NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
                .ok()
                .map(|dt| dt.date())
        })
}

pub struct BookingService {
    bookings: Arc<dyn BookingRepository>,
    spots: Arc<dyn SpotRepository>,
    scope: ConflictScope,
}

impl BookingService {
    pub fn new(
        bookings: Arc<dyn BookingRepository>,
        spots: Arc<dyn SpotRepository>,
        scope: ConflictScope,
    ) -> Self {
        Self {
            bookings,
            spots,
            scope,
        }
    }

    /// The requester's bookings with their spots
    pub async fn current(&self, ctx: &RequestContext) -> Result<Vec<BookingWithSpot>, ServiceError> {
        Ok(self
            .bookings
            .list_for_user(ctx.user_id)
            .await
            .context("Failed to list user bookings")?)
    }

    /// Book `spot_id` for the requester
    pub async fn create(
        &self,
        ctx: &RequestContext,
        spot_id: i64,
        dates: &BookingDates,
    ) -> Result<Booking, ServiceError> {
        let range = dates.validate()?;
        let spot = self.spots.get_by_id(spot_id).await.context("Failed to load spot")?;
        let existing = self.conflict_set(spot_id, None).await?;

        if let Err(denial) = policy::authorize_booking_creation(spot.as_ref(), ctx, &range, &existing) {
            tracing::info!(spot_id, user_id = ctx.user_id, %range, "Booking refused: {}", denial);
            return Err(denial.into());
        }

        let booking = self
            .bookings
            .create(&Booking::new(spot_id, ctx.user_id, range))
            .await
            .context("Failed to create booking")?;
        tracing::info!(booking_id = booking.id, spot_id, %range, "Booking created");
        Ok(booking)
    }

    /// Move a booking to new dates
    pub async fn update(
        &self,
        ctx: &RequestContext,
        booking_id: i64,
        dates: &BookingDates,
        now: DateTime<Utc>,
    ) -> Result<Booking, ServiceError> {
        let range = dates.validate()?;
        let booking = self.load(booking_id).await?;
        let existing = match &booking {
            Some(b) => self.conflict_set(b.spot_id, Some(b.id)).await?,
            None => Vec::new(),
        };

        let kind = Mutation::Update {
            range,
            existing: &existing,
        };
        let permit = policy::authorize_mutation(kind, booking.as_ref(), ctx, now).map_err(|denial| {
            tracing::warn!(booking_id, user_id = ctx.user_id, "Booking update denied: {}", denial);
            ServiceError::from(denial)
        })?;

        let Permit::Reschedule(range) = permit else {
            return Err(anyhow::anyhow!("unexpected permit {:?} for update", permit).into());
        };
        let updated = self
            .bookings
            .update_dates(booking_id, range)
            .await
            .context("Failed to update booking")?;
        tracing::info!(booking_id, %range, "Booking rescheduled");
        Ok(updated)
    }

    /// Cancel a booking that has not started yet
    pub async fn delete(
        &self,
        ctx: &RequestContext,
        booking_id: i64,
        now: DateTime<Utc>,
    ) -> Result<(), ServiceError> {
        let booking = self.load(booking_id).await?;

        let permit = policy::authorize_mutation(Mutation::Delete, booking.as_ref(), ctx, now)
            .map_err(|denial| {
                tracing::warn!(booking_id, user_id = ctx.user_id, "Booking delete denied: {}", denial);
                ServiceError::from(denial)
            })?;

        if permit == Permit::Remove {
            self.bookings
                .delete(booking_id)
                .await
                .context("Failed to delete booking")?;
            tracing::info!(booking_id, "Booking deleted");
        }
        Ok(())
    }

    async fn load(&self, booking_id: i64) -> Result<Option<Booking>, ServiceError> {
        Ok(self
            .bookings
            .get_by_id(booking_id)
            .await
            .context("Failed to load booking")?)
    }

    /// Bookings a range on `spot_id` must not overlap
    async fn conflict_set(
        &self,
        spot_id: i64,
        exclude_id: Option<i64>,
    ) -> Result<Vec<Booking>, ServiceError> {
        let all = match self.scope {
            ConflictScope::Spot => self.bookings.list_for_spot(spot_id).await,
            ConflictScope::Global => self.bookings.list_all().await,
        }
        .context("Failed to load bookings")?;

        Ok(policy::conflict_candidates(&all, spot_id, exclude_id, self.scope)
            .cloned()
            .collect())
    }
}
