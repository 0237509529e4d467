//! User document schema
//!
//! Users are owned by the (external) account subsystem; Beacon reads them
//! for identity resolution and mutates only the trusted-IP registry.

use bson::{doc, oid::ObjectId, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::db::mongo::{IntoIndexes, Timestamped};
use crate::db::schemas::Metadata;

/// Collection name for users
pub const USER_COLLECTION: &str = "users";

/// Caller role
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
}

/// Emergency contact attached to a user profile.
///
/// Shared between storage and the alert-enrichment wire shape, so fields
/// carry their camelCase wire names.
#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct EmergencyContact {
    pub name: String,
    pub phone_number: String,
    pub relation: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// User document stored in MongoDB
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct UserDoc {
    /// MongoDB document ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,

    /// Common metadata (created_at, updated_at)
    #[serde(default)]
    pub metadata: Metadata,

    /// Display name
    pub name: String,

    /// Login identifier
    pub email: String,

    #[serde(default)]
    pub role: Role,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub home_address: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blood_group: Option<String>,

    #[serde(default)]
    pub emergency_contacts: Vec<EmergencyContact>,

    /// Trusted device IPs. Invariant: at most three entries, enforced by
    /// the device registry at every mutation point.
    #[serde(default)]
    pub ip_addresses: Vec<String>,
}

/// Minimal user projection attached to alerts for immediate display
#[derive(Serialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub home_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blood_group: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub emergency_contacts: Vec<EmergencyContact>,
}

impl From<&UserDoc> for UserSummary {
    fn from(user: &UserDoc) -> Self {
        Self {
            id: user
                ._id
                .map(|id| id.to_hex())
                .unwrap_or_default(),
            name: user.name.clone(),
            email: user.email.clone(),
            phone_number: user.phone_number.clone(),
            home_address: user.home_address.clone(),
            blood_group: user.blood_group.clone(),
            emergency_contacts: user.emergency_contacts.clone(),
        }
    }
}

impl IntoIndexes for UserDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![
            // Unique index on email
            (
                doc! { "email": 1 },
                Some(
                    IndexOptions::builder()
                        .unique(true)
                        .name("email_unique".to_string())
                        .build(),
                ),
            ),
            // Newest-first admin listings
            (
                doc! { "metadata.created_at": -1 },
                Some(
                    IndexOptions::builder()
                        .name("created_at_desc".to_string())
                        .build(),
                ),
            ),
        ]
    }
}

impl Timestamped for UserDoc {
    fn metadata_mut(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_wire_literals() {
        assert_eq!(serde_json::to_string(&Role::User).unwrap(), "\"user\"");
        assert_eq!(serde_json::to_string(&Role::Admin).unwrap(), "\"admin\"");
    }

    #[test]
    fn test_summary_projection() {
        let id = ObjectId::new();
        let user = UserDoc {
            _id: Some(id),
            name: "Asha".into(),
            email: "asha@example.com".into(),
            phone_number: Some("555-0101".into()),
            ip_addresses: vec!["9.9.9.9".into()],
            ..Default::default()
        };

        let summary = UserSummary::from(&user);
        assert_eq!(summary.id, id.to_hex());
        assert_eq!(summary.name, "Asha");
        assert_eq!(summary.phone_number.as_deref(), Some("555-0101"));

        // The registry itself never leaks through the projection
        let json = serde_json::to_value(&summary).unwrap();
        assert!(json.get("ipAddresses").is_none());
    }
}
