//! Booking and ownership policy
//!
//! Pure decisions with no database or HTTP knowledge. Callers load the
//! records, pass them in with a [`RequestContext`], and persist whatever the
//! returned permit allows.

mod authorization;
mod availability;
mod preview;

pub use authorization::{
    authorize_booking_creation, authorize_mutation, authorize_review_image, Mutation, Permit,
};
pub use availability::{check_conflict, conflict_candidates};
pub use preview::select_preview;

use crate::models::Booking;

/// The authenticated user behind one request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestContext {
    pub user_id: i64,
}

impl RequestContext {
    pub fn new(user_id: i64) -> Self {
        Self { user_id }
    }
}

/// Which existing bookings a candidate range is checked against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConflictScope {
    /// Bookings of the same spot only
    #[default]
    Spot,
    /// Every booking, whatever the spot
    Global,
}

impl ConflictScope {
    pub fn from_global_flag(global: bool) -> Self {
        if global {
            Self::Global
        } else {
            Self::Spot
        }
    }
}

/// Why a policy check refused a request
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Denial {
    #[error("{0} couldn't be found")]
    NotFound(&'static str),

    #[error("Forbidden")]
    Forbidden,

    #[error("Past bookings can't be modified")]
    PastBooking,

    #[error("Sorry, this spot is already booked for the specified dates")]
    Conflict(Booking),

    #[error("Bookings that have been started can't be deleted")]
    AlreadyStarted,

    #[error("Maximum number of images for this resource was reached")]
    ImageLimitReached,
}
