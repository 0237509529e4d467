//! Database schemas for Beacon
//!
//! Defines MongoDB document structures for alerts, users, community posts,
//! counselling bookings, and location pings.

mod alert;
mod booking;
mod location;
mod metadata;
mod post;
mod user;

pub use alert::{AlertDoc, AlertKind, AlertStatus, GeoPoint, ALERT_COLLECTION};
pub use booking::{BookingDoc, BookingStatus, BOOKING_COLLECTION};
pub use location::{LocationPingDoc, LOCATION_COLLECTION};
pub use metadata::Metadata;
pub use post::{PostComment, PostDoc, PostLike, POST_COLLECTION};
pub use user::{EmergencyContact, Role, UserDoc, UserSummary, USER_COLLECTION};
