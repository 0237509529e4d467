//! Alert document schema
//!
//! An alert is the permanent record of a user-triggered emergency signal:
//! submission IP, optional location, device-trust verdict, and resolution
//! status. Anonymous alerts carry no user reference.

use bson::{doc, oid::ObjectId, DateTime, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::db::mongo::{IntoIndexes, Timestamped};
use crate::db::schemas::Metadata;

/// Collection name for alerts
pub const ALERT_COLLECTION: &str = "alerts";

/// Alert kind. Only SOS exists today; the enum keeps the wire literal fixed.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AlertKind {
    #[default]
    #[serde(rename = "SOS")]
    Sos,
}

/// Alert resolution status
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AlertStatus {
    #[default]
    Active,
    Resolved,
    #[serde(rename = "False Alarm")]
    FalseAlarm,
}

impl AlertStatus {
    /// Parse the wire literal. Total over the three statuses, `None` for
    /// anything else.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Active" => Some(Self::Active),
            "Resolved" => Some(Self::Resolved),
            "False Alarm" => Some(Self::FalseAlarm),
            _ => None,
        }
    }

    /// Wire literal for this status
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "Active",
            Self::Resolved => "Resolved",
            Self::FalseAlarm => "False Alarm",
        }
    }
}

impl fmt::Display for AlertStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Submitted location, every field independently optional
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct GeoPoint {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

/// Alert document stored in MongoDB
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct AlertDoc {
    /// MongoDB document ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,

    /// Common metadata (created_at, updated_at)
    #[serde(default)]
    pub metadata: Metadata,

    /// Submitting user; absent for anonymous alerts, permanently
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<ObjectId>,

    /// Alert kind (wire name `type`)
    #[serde(rename = "type", default)]
    pub kind: AlertKind,

    /// Location submitted with the alert
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<GeoPoint>,

    /// IP the alert was submitted from
    pub ip_address: String,

    /// Whether the submitting IP was in the user's trusted registry at
    /// creation time. Never recomputed.
    #[serde(default)]
    pub ip_matched: bool,

    /// Resolution status, mutated only via the status transition operation
    #[serde(default)]
    pub status: AlertStatus,

    /// Trigger time, distinct from metadata.created_at
    pub timestamp: DateTime,
}

impl AlertDoc {
    /// Create a new Active alert
    pub fn new(
        user: Option<ObjectId>,
        ip_address: String,
        location: Option<GeoPoint>,
        ip_matched: bool,
    ) -> Self {
        Self {
            _id: None,
            metadata: Metadata::new(),
            user,
            kind: AlertKind::Sos,
            location,
            ip_address,
            ip_matched,
            status: AlertStatus::Active,
            timestamp: DateTime::now(),
        }
    }
}

impl IntoIndexes for AlertDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![
            // Per-user alert history
            (
                doc! { "user": 1 },
                Some(IndexOptions::builder().name("user_index".to_string()).build()),
            ),
            // Admin console filters on status
            (
                doc! { "status": 1 },
                Some(IndexOptions::builder().name("status_index".to_string()).build()),
            ),
            // Newest-first listings and 30-day windows
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

impl Timestamped for AlertDoc {
    fn metadata_mut(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_parse_is_total_over_literals() {
        assert_eq!(AlertStatus::parse("Active"), Some(AlertStatus::Active));
        assert_eq!(AlertStatus::parse("Resolved"), Some(AlertStatus::Resolved));
        assert_eq!(
            AlertStatus::parse("False Alarm"),
            Some(AlertStatus::FalseAlarm)
        );
        assert_eq!(AlertStatus::parse("false alarm"), None);
        assert_eq!(AlertStatus::parse("Closed"), None);
        assert_eq!(AlertStatus::parse(""), None);
    }

    #[test]
    fn test_status_wire_literals() {
        let json = serde_json::to_string(&AlertStatus::FalseAlarm).unwrap();
        assert_eq!(json, "\"False Alarm\"");
        let json = serde_json::to_string(&AlertKind::Sos).unwrap();
        assert_eq!(json, "\"SOS\"");
    }

    #[test]
    fn test_new_alert_defaults() {
        let alert = AlertDoc::new(None, "1.2.3.4".into(), None, false);
        assert_eq!(alert.status, AlertStatus::Active);
        assert_eq!(alert.kind, AlertKind::Sos);
        assert!(alert.user.is_none());
        assert!(!alert.ip_matched);
        assert!(alert.metadata.created_at.is_some());
    }

    #[test]
    fn test_status_defaults_when_missing() {
        // Older documents without a status field decode as Active
        let doc = doc! {
            "ip_address": "1.2.3.4",
            "timestamp": DateTime::now(),
        };
        let alert: AlertDoc = bson::from_document(doc).unwrap();
        assert_eq!(alert.status, AlertStatus::Active);
        assert_eq!(alert.kind, AlertKind::Sos);
    }
}
