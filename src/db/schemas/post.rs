//! Community post document schema
//!
//! Posts are owned by the community subsystem; Beacon only reads them for
//! engagement counts and the recent-activity feed.

use bson::{doc, oid::ObjectId, DateTime, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::db::mongo::{IntoIndexes, Timestamped};
use crate::db::schemas::Metadata;

/// Collection name for community posts
pub const POST_COLLECTION: &str = "posts";

/// A like on a post
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct PostLike {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<ObjectId>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,
}

/// A comment on a post
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct PostComment {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<ObjectId>,

    pub user_name: String,

    pub text: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime>,
}

/// Community post document stored in MongoDB
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct PostDoc {
    /// MongoDB document ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,

    /// Common metadata (created_at, updated_at)
    #[serde(default)]
    pub metadata: Metadata,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<ObjectId>,

    /// Denormalized author name, used in activity descriptions
    #[serde(default)]
    pub user_name: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub likes: Vec<PostLike>,

    #[serde(default)]
    pub comments: Vec<PostComment>,

    #[serde(default)]
    pub tags: Vec<String>,
}

impl IntoIndexes for PostDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![
            (
                doc! { "metadata.created_at": -1 },
                Some(
                    IndexOptions::builder()
                        .name("created_at_desc".to_string())
                        .build(),
                ),
            ),
            (
                doc! { "user": 1 },
                Some(IndexOptions::builder().name("user_index".to_string()).build()),
            ),
        ]
    }
}

impl Timestamped for PostDoc {
    fn metadata_mut(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}
