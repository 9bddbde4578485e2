//! Data models
//!
//! Entities stored in the database, the `DateRange` value type, and the
//! joined row shapes that repositories hand to the API layer for reshaping.

mod booking;
mod review;
mod session;
mod spot;
mod user;

pub use booking::{Booking, BookingWithSpot, DateRange, InvalidDateRange};
pub use review::{Review, ReviewImage, ReviewWithDetails, MAX_REVIEW_IMAGES};
pub use session::Session;
pub use spot::{CreateSpotInput, Spot, SpotDetails, SpotImage, SpotSummary, UserSummary};
pub use user::{CreateUserInput, User};
