//! Services layer
//!
//! Each service validates request input, loads what a decision needs from
//! the repositories, defers permit/deny to `policy`, and persists the
//! outcome. All of them report failures as [`ServiceError`].

pub mod booking;
pub mod error;
pub mod password;
pub mod review;
pub mod spot;
pub mod user;

pub use booking::{BookingDates, BookingService};
pub use error::{FieldErrors, ServiceError};
pub use password::{hash_password, verify_password};
pub use review::{ReviewImageInput, ReviewInput, ReviewService};
pub use spot::{SpotImageInput, SpotInput, SpotService};
pub use user::{LoginInput, SignupInput, UserService};
