//! Overlap detection between a candidate range and existing bookings

use super::ConflictScope;
use crate::models::{Booking, DateRange};

/// Return the first booking in `existing` that overlaps `candidate`.
///
/// Boundaries are inclusive, so a stay ending on the day another begins
/// counts as a conflict. The test is run from both sides: a candidate
/// endpoint inside the booking, or a booking endpoint inside the candidate.
pub fn check_conflict<'a, I>(candidate: &DateRange, existing: I) -> Option<&'a Booking>
where
    I: IntoIterator<Item = &'a Booking>,
{
    existing.into_iter().find(|booking| overlaps(candidate, booking))
}

fn overlaps(candidate: &DateRange, booking: &Booking) -> bool {
    booking.covers(candidate.start())
        || booking.covers(candidate.end())
        || candidate.contains(booking.start_date)
        || candidate.contains(booking.end_date)
}

/// Narrow `bookings` to the ones a range for `spot_id` must not overlap.
///
/// `exclude_id` drops the booking being rescheduled so it never conflicts
/// with itself.
pub fn conflict_candidates<'a>(
    bookings: &'a [Booking],
    spot_id: i64,
    exclude_id: Option<i64>,
    scope: ConflictScope,
) -> impl Iterator<Item = &'a Booking> + 'a {
    bookings.iter().filter(move |b| {
        let in_scope = match scope {
            ConflictScope::Spot => b.spot_id == spot_id,
            ConflictScope::Global => true,
        };
        in_scope && Some(b.id) != exclude_id
    })
}
