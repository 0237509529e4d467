//! Counselling booking document schema
//!
//! Bookings are owned by the counselling subsystem; Beacon only reads them
//! for the per-status 30-day breakdown and the recent-activity feed.

use bson::{doc, oid::ObjectId, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::db::mongo::{IntoIndexes, Timestamped};
use crate::db::schemas::Metadata;

/// Collection name for counselling bookings
pub const BOOKING_COLLECTION: &str = "bookings";

/// Booking workflow status
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BookingStatus {
    #[default]
    Pending,
    Confirmed,
    Completed,
    Cancelled,
}

impl BookingStatus {
    /// Wire literal for this status
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Confirmed => "Confirmed",
            Self::Completed => "Completed",
            Self::Cancelled => "Cancelled",
        }
    }
}

/// Booking document stored in MongoDB
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct BookingDoc {
    /// MongoDB document ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,

    /// Common metadata (created_at, updated_at)
    #[serde(default)]
    pub metadata: Metadata,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<ObjectId>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doctor: Option<ObjectId>,

    #[serde(default)]
    pub status: BookingStatus,
}

impl IntoIndexes for BookingDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![
            (
                doc! { "user": 1 },
                Some(IndexOptions::builder().name("user_index".to_string()).build()),
            ),
            (
                doc! { "status": 1 },
                Some(IndexOptions::builder().name("status_index".to_string()).build()),
            ),
        ]
    }
}

impl Timestamped for BookingDoc {
    fn metadata_mut(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}
