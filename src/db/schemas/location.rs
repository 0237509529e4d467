//! Location ping document schema
//!
//! Live-location pings are owned by the location subsystem; Beacon only
//! counts them for the 30-day report.

use bson::{doc, oid::ObjectId, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::db::mongo::{IntoIndexes, Timestamped};
use crate::db::schemas::Metadata;

/// Collection name for location pings
pub const LOCATION_COLLECTION: &str = "locations";

/// Location ping document stored in MongoDB
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct LocationPingDoc {
    /// MongoDB document ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,

    /// Common metadata (created_at, updated_at)
    #[serde(default)]
    pub metadata: Metadata,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<ObjectId>,

    #[serde(default)]
    pub latitude: f64,

    #[serde(default)]
    pub longitude: f64,

    #[serde(default)]
    pub address: String,
}

impl IntoIndexes for LocationPingDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![(
            doc! { "metadata.created_at": -1 },
            Some(
                IndexOptions::builder()
                    .name("created_at_desc".to_string())
                    .build(),
            ),
        )]
    }
}

impl Timestamped for LocationPingDoc {
    fn metadata_mut(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}
