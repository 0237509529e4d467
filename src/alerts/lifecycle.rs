//! Alert lifecycle: creation, status transitions, and queries
//!
//! Status machine: Active -> Resolved | False Alarm. The transition
//! operation accepts any of the three literals unconditionally; nothing
//! re-opens an alert today, but nothing forbids it either. Alerts are
//! never deleted.

use bson::{doc, oid::ObjectId, DateTime};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::info;

use crate::alerts::verifier::{self, Submitter};
use crate::db::schemas::{
    AlertDoc, AlertKind, AlertStatus, GeoPoint, UserDoc, UserSummary, ALERT_COLLECTION,
    USER_COLLECTION,
};
use crate::db::{MongoClient, MongoCollection};
use crate::types::{BeaconError, Result};

/// Input for alert creation, as submitted by the client
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct CreateAlert {
    /// Optional caller identity; unresolvable values degrade to anonymous
    #[serde(default)]
    pub user_id: Option<String>,

    /// IP the alert is being submitted from. The one required field.
    #[serde(default)]
    pub ip_address: Option<String>,

    #[serde(default)]
    pub location: Option<GeoPoint>,
}

/// Wire shape of an alert
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertView {
    pub id: String,

    /// Minimal user projection, present when identity resolved and
    /// enrichment was requested
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<UserSummary>,

    /// Raw user reference for non-enriched listings
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,

    #[serde(rename = "type")]
    pub kind: AlertKind,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<GeoPoint>,

    pub ip_address: String,
    pub ip_matched: bool,
    pub status: AlertStatus,

    /// Trigger time (RFC 3339)
    pub timestamp: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl AlertView {
    /// Build the wire shape from a stored document
    pub fn from_doc(alert: &AlertDoc, user: Option<UserSummary>) -> Self {
        Self {
            id: alert._id.map(|id| id.to_hex()).unwrap_or_default(),
            user,
            user_id: alert.user.map(|id| id.to_hex()),
            kind: alert.kind,
            location: alert.location.clone(),
            ip_address: alert.ip_address.clone(),
            ip_matched: alert.ip_matched,
            status: alert.status,
            timestamp: fmt_time(alert.timestamp),
            created_at: alert.metadata.created_at.map(fmt_time),
            updated_at: alert.metadata.updated_at.map(fmt_time),
        }
    }
}

fn fmt_time(dt: DateTime) -> String {
    dt.try_to_rfc3339_string().unwrap_or_default()
}

/// Validate a creation request before touching the store
fn validate_create(input: &CreateAlert) -> Result<&str> {
    match input.ip_address.as_deref() {
        Some(ip) if !ip.trim().is_empty() => Ok(ip),
        _ => Err(BeaconError::BadRequest("IP Address is required".into())),
    }
}

/// Alert creation, status transitions, and queries
#[derive(Clone)]
pub struct AlertService {
    alerts: MongoCollection<AlertDoc>,
    users: MongoCollection<UserDoc>,
}

impl AlertService {
    pub async fn new(mongo: &MongoClient) -> Result<Self> {
        Ok(Self {
            alerts: mongo.collection::<AlertDoc>(ALERT_COLLECTION).await?,
            users: mongo.collection::<UserDoc>(USER_COLLECTION).await?,
        })
    }

    /// Record a new SOS alert.
    ///
    /// The device-trust verdict is computed once, here, against the
    /// registry as it stands at this moment; it is never re-derived.
    /// Identity problems degrade to an anonymous alert rather than an
    /// error, so an emergency signal is recorded even when the caller's
    /// identity is ambiguous.
    pub async fn create(&self, input: CreateAlert) -> Result<AlertView> {
        let ip_address = validate_create(&input)?.to_string();

        let submitter = verifier::resolve_submitter(&self.users, input.user_id.as_deref()).await;
        let matched = verifier::ip_matched(&submitter, &ip_address);

        let (user_oid, summary) = match &submitter {
            Submitter::Known(user) => {
                info!(
                    "IP verification for user {}: {}",
                    user.name,
                    if matched { "MATCH" } else { "NO MATCH" }
                );
                (user._id, Some(UserSummary::from(user.as_ref())))
            }
            Submitter::Anonymous => {
                info!("Recording anonymous SOS alert");
                (None, None)
            }
        };

        let mut alert = AlertDoc::new(user_oid, ip_address, input.location, matched);
        let id = self.alerts.insert_one(alert.clone()).await?;
        alert._id = Some(id);

        info!("Alert {} saved (ip_matched={})", id.to_hex(), matched);

        Ok(AlertView::from_doc(&alert, summary))
    }

    /// Every alert, newest first, with user projections attached.
    ///
    /// Projections are resolved with one batched `$in` lookup rather than
    /// per-alert reads; alerts whose user no longer resolves simply carry
    /// no projection.
    pub async fn list_all(&self) -> Result<Vec<AlertView>> {
        let alerts = self
            .alerts
            .find_sorted(doc! {}, doc! { "metadata.created_at": -1 }, None)
            .await?;

        let user_ids: Vec<ObjectId> = alerts.iter().filter_map(|a| a.user).collect();
        let summaries = self.load_summaries(&user_ids).await?;

        Ok(alerts
            .iter()
            .map(|alert| {
                let summary = alert.user.and_then(|id| summaries.get(&id).cloned());
                AlertView::from_doc(alert, summary)
            })
            .collect())
    }

    /// One user's alerts, newest first. No enrichment: the caller already
    /// knows who they are.
    pub async fn list_for_user(&self, user_id: &str) -> Result<Vec<AlertView>> {
        let oid = ObjectId::parse_str(user_id)
            .map_err(|_| BeaconError::NotFound("User not found".into()))?;

        let alerts = self
            .alerts
            .find_sorted(doc! { "user": oid }, doc! { "metadata.created_at": -1 }, None)
            .await?;

        Ok(alerts
            .iter()
            .map(|alert| AlertView::from_doc(alert, None))
            .collect())
    }

    /// Transition an alert's status and return the updated record.
    ///
    /// The literal is validated before anything touches the store, so an
    /// invalid status can never mutate a record.
    pub async fn set_status(&self, alert_id: &str, status_literal: &str) -> Result<AlertView> {
        let status = AlertStatus::parse(status_literal)
            .ok_or_else(|| BeaconError::BadRequest("Invalid Status".into()))?;

        let oid = ObjectId::parse_str(alert_id)
            .map_err(|_| BeaconError::NotFound("Alert not found".into()))?;

        let updated = self
            .alerts
            .find_one_and_update(
                doc! { "_id": oid },
                doc! {
                    "$set": {
                        "status": status.as_str(),
                        "metadata.updated_at": DateTime::now(),
                    }
                },
            )
            .await?
            .ok_or_else(|| BeaconError::NotFound("Alert not found".into()))?;

        info!("Alert {} status set to {}", alert_id, status);

        Ok(AlertView::from_doc(&updated, None))
    }

    async fn load_summaries(
        &self,
        user_ids: &[ObjectId],
    ) -> Result<HashMap<ObjectId, UserSummary>> {
        if user_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let users = self
            .users
            .find_many(doc! { "_id": { "$in": user_ids.to_vec() } })
            .await?;

        Ok(users
            .iter()
            .filter_map(|user| user._id.map(|id| (id, UserSummary::from(user))))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_requires_ip() {
        let missing = CreateAlert::default();
        assert!(matches!(
            validate_create(&missing),
            Err(BeaconError::BadRequest(_))
        ));

        let blank = CreateAlert {
            ip_address: Some("   ".into()),
            ..Default::default()
        };
        assert!(validate_create(&blank).is_err());

        let ok = CreateAlert {
            ip_address: Some("1.2.3.4".into()),
            ..Default::default()
        };
        assert_eq!(validate_create(&ok).unwrap(), "1.2.3.4");
    }

    #[test]
    fn test_create_request_parses_camel_case() {
        let input: CreateAlert = serde_json::from_str(
            r#"{"userId":"abc","ipAddress":"1.2.3.4","location":{"latitude":12.5,"address":"Pier 7"}}"#,
        )
        .unwrap();
        assert_eq!(input.user_id.as_deref(), Some("abc"));
        assert_eq!(input.ip_address.as_deref(), Some("1.2.3.4"));
        let location = input.location.unwrap();
        assert_eq!(location.latitude, Some(12.5));
        assert!(location.longitude.is_none());
    }

    #[test]
    fn test_view_from_doc() {
        let user_oid = ObjectId::new();
        let mut alert = AlertDoc::new(Some(user_oid), "9.9.9.9".into(), None, true);
        let alert_oid = ObjectId::new();
        alert._id = Some(alert_oid);

        let view = AlertView::from_doc(&alert, None);
        assert_eq!(view.id, alert_oid.to_hex());
        assert_eq!(view.user_id.as_deref(), Some(user_oid.to_hex().as_str()));
        assert!(view.user.is_none());
        assert!(view.ip_matched);
        assert_eq!(view.status, AlertStatus::Active);
        assert!(!view.timestamp.is_empty());

        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["type"], "SOS");
        assert_eq!(json["ipAddress"], "9.9.9.9");
        assert_eq!(json["status"], "Active");
    }
}
