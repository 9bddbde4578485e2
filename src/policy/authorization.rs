//! Permit/deny decisions for booking and review mutations
//!
//! Checks always run in the same order: existence, ownership, temporal
//! state, then availability. The first failure is returned.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};

use super::{check_conflict, Denial, RequestContext};
use crate::models::{Booking, DateRange, Review, Spot, MAX_REVIEW_IMAGES};

/// A requested change to an existing booking
#[derive(Debug, Clone, Copy)]
pub enum Mutation<'a> {
    /// Move the booking to `range`. `existing` holds the bookings it must
    /// not overlap, already narrowed to the right scope.
    Update {
        range: DateRange,
        existing: &'a [Booking],
    },
    Delete,
}

/// What the caller may now persist
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permit {
    Reschedule(DateRange),
    Remove,
}

/// Decide whether `ctx` may apply `kind` to `booking` at `now`
pub fn authorize_mutation(
    kind: Mutation<'_>,
    booking: Option<&Booking>,
    ctx: &RequestContext,
    now: DateTime<Utc>,
) -> Result<Permit, Denial> {
    let booking = booking.ok_or(Denial::NotFound("Booking"))?;
    if booking.user_id != ctx.user_id {
        return Err(Denial::Forbidden);
    }

    match kind {
        Mutation::Update { range, existing } => {
            if now > midnight_utc(booking.end_date) {
                return Err(Denial::PastBooking);
            }
            if let Some(conflict) = check_conflict(&range, existing) {
                return Err(Denial::Conflict(conflict.clone()));
            }
            Ok(Permit::Reschedule(range))
        }
        Mutation::Delete => {
            if midnight_utc(booking.start_date) < now {
                return Err(Denial::AlreadyStarted);
            }
            Ok(Permit::Remove)
        }
    }
}

/// Decide whether `ctx` may book `spot` for `range`.
///
/// Owners cannot book their own spot.
pub fn authorize_booking_creation(
    spot: Option<&Spot>,
    ctx: &RequestContext,
    range: &DateRange,
    existing: &[Booking],
) -> Result<(), Denial> {
    let spot = spot.ok_or(Denial::NotFound("Spot"))?;
    if spot.is_owned_by(ctx.user_id) {
        return Err(Denial::Forbidden);
    }
    match check_conflict(range, existing) {
        Some(conflict) => Err(Denial::Conflict(conflict.clone())),
        None => Ok(()),
    }
}

/// Decide whether `ctx` may attach another image to `review`, which already
/// carries `attached` images
pub fn authorize_review_image(
    review: Option<&Review>,
    ctx: &RequestContext,
    attached: usize,
) -> Result<(), Denial> {
    let review = review.ok_or(Denial::NotFound("Review"))?;
    if review.user_id != ctx.user_id {
        return Err(Denial::Forbidden);
    }
    if attached >= MAX_REVIEW_IMAGES {
        return Err(Denial::ImageLimitReached);
    }
    Ok(())
}

fn midnight_utc(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}
