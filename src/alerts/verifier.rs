//! Device-trust verification for new alerts
//!
//! Decides the `ip_matched` flag recorded on an alert. Identity resolution
//! can only ever downgrade to anonymous: an SOS is never rejected because
//! the submitted user id was missing, malformed, or unknown.

use bson::{doc, oid::ObjectId};
use tracing::warn;

use crate::db::schemas::UserDoc;
use crate::db::MongoCollection;

/// Who submitted the alert, as far as we could establish.
///
/// The distinction is carried in the type so downstream code cannot forget
/// that resolution failure is an expected outcome, not an error.
#[derive(Debug, Clone)]
pub enum Submitter {
    /// The supplied id resolved to a user record
    Known(Box<UserDoc>),
    /// No id supplied, or it did not resolve
    Anonymous,
}

impl Submitter {
    pub fn is_anonymous(&self) -> bool {
        matches!(self, Submitter::Anonymous)
    }
}

/// Resolve an optional submitted user id to a [`Submitter`].
///
/// Every failure path degrades to `Anonymous`: absent id, the literal
/// `"null"` some clients send, a malformed ObjectId, a store error, or an
/// id that matches no user. Store errors are logged; nothing propagates.
pub async fn resolve_submitter(
    users: &MongoCollection<UserDoc>,
    user_id: Option<&str>,
) -> Submitter {
    let raw = match user_id {
        Some(id) if !id.is_empty() && id != "null" => id,
        _ => return Submitter::Anonymous,
    };

    let oid = match ObjectId::parse_str(raw) {
        Ok(oid) => oid,
        Err(_) => {
            warn!("Invalid user id on alert submission: {}", raw);
            return Submitter::Anonymous;
        }
    };

    match users.find_one(doc! { "_id": oid }).await {
        Ok(Some(user)) => Submitter::Known(Box::new(user)),
        Ok(None) => {
            warn!("Unknown user id on alert submission: {}", raw);
            Submitter::Anonymous
        }
        Err(e) => {
            // Degrade rather than fail: the alert must still be recorded
            warn!("User lookup failed during alert verification: {}", e);
            Submitter::Anonymous
        }
    }
}

/// Membership check against a trusted-IP registry.
///
/// An empty registry trusts nothing; an anonymous submitter never matches.
pub fn ip_matched(submitter: &Submitter, candidate_ip: &str) -> bool {
    match submitter {
        Submitter::Known(user) => user.ip_addresses.iter().any(|ip| ip == candidate_ip),
        Submitter::Anonymous => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn known_with_ips(ips: &[&str]) -> Submitter {
        Submitter::Known(Box::new(UserDoc {
            name: "Asha".into(),
            email: "asha@example.com".into(),
            ip_addresses: ips.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        }))
    }

    #[test]
    fn test_registered_ip_matches() {
        let submitter = known_with_ips(&["9.9.9.9", "1.1.1.1"]);
        assert!(ip_matched(&submitter, "9.9.9.9"));
        assert!(ip_matched(&submitter, "1.1.1.1"));
    }

    #[test]
    fn test_unregistered_ip_does_not_match() {
        let submitter = known_with_ips(&["9.9.9.9"]);
        assert!(!ip_matched(&submitter, "8.8.8.8"));
    }

    #[test]
    fn test_empty_registry_trusts_nothing() {
        let submitter = known_with_ips(&[]);
        assert!(!ip_matched(&submitter, "9.9.9.9"));
    }

    #[test]
    fn test_anonymous_never_matches() {
        assert!(!ip_matched(&Submitter::Anonymous, "9.9.9.9"));
        assert!(Submitter::Anonymous.is_anonymous());
    }
}
