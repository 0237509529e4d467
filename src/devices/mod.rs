//! Trusted-device (IP) registry
//!
//! Each user may register up to three device IPs. The quota is enforced in
//! exactly one place: every mutation path goes through [`DeviceRegistry`].
//! The registry never silently evicts an entry; once full, a new device can
//! only join through the explicit replace path.

use bson::{doc, oid::ObjectId, DateTime};
use tracing::info;

use crate::db::schemas::{UserDoc, USER_COLLECTION};
use crate::db::{MongoClient, MongoCollection};
use crate::types::{BeaconError, Result};

/// Maximum number of trusted device IPs per user
pub const MAX_TRUSTED_DEVICES: usize = 3;

/// A user's validated set of trusted device IPs
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceRegistry {
    ips: Vec<String>,
}

impl DeviceRegistry {
    /// Wrap the registry stored on a user record.
    ///
    /// Oversized stored sets are accepted as-is; the invariant is enforced
    /// on mutation, not on read, so a bad record cannot make its owner
    /// unreadable.
    pub fn from_existing(ips: Vec<String>) -> Self {
        Self { ips }
    }

    /// Whether `candidate` is a trusted device IP
    pub fn contains(&self, candidate: &str) -> bool {
        self.ips.iter().any(|ip| ip == candidate)
    }

    pub fn len(&self) -> usize {
        self.ips.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ips.is_empty()
    }

    /// Register a device IP, or confirm one already present.
    ///
    /// Idempotent: a known IP is a no-op returning `false`. A new IP is
    /// appended when the registry has room, returning `true`. A new IP
    /// against a full registry fails with `DeviceQuota` and leaves the set
    /// unchanged.
    pub fn add_or_confirm(&mut self, candidate: &str) -> Result<bool> {
        if self.contains(candidate) {
            return Ok(false);
        }

        if self.ips.len() >= MAX_TRUSTED_DEVICES {
            return Err(BeaconError::DeviceQuota(format!(
                "Maximum device limit reached ({} devices)",
                MAX_TRUSTED_DEVICES
            )));
        }

        self.ips.push(candidate.to_string());
        Ok(true)
    }

    /// Replace the full set (explicit profile-edit path).
    ///
    /// Unlike `add_or_confirm` this is an overwrite, not a merge, and so
    /// supports intentional pruning. Fails with `BadRequest` when more than
    /// three IPs are supplied, leaving the existing set untouched.
    pub fn replace_with(&mut self, ips: Vec<String>) -> Result<()> {
        if ips.len() > MAX_TRUSTED_DEVICES {
            return Err(BeaconError::BadRequest(format!(
                "You can only have up to {} authorized IP addresses",
                MAX_TRUSTED_DEVICES
            )));
        }

        self.ips = ips;
        Ok(())
    }

    /// The registered IPs
    pub fn as_slice(&self) -> &[String] {
        &self.ips
    }

    pub fn into_inner(self) -> Vec<String> {
        self.ips
    }
}

/// Persists device-registry changes to user records
#[derive(Clone)]
pub struct DeviceStore {
    users: MongoCollection<UserDoc>,
}

impl DeviceStore {
    pub async fn new(mongo: &MongoClient) -> Result<Self> {
        Ok(Self {
            users: mongo.collection::<UserDoc>(USER_COLLECTION).await?,
        })
    }

    /// The registered device IPs for a user
    pub async fn list(&self, user_id: &str) -> Result<Vec<String>> {
        let user = self.load_user(user_id).await?;
        Ok(user.ip_addresses)
    }

    /// Register a device IP for a user, or confirm one already present.
    /// Returns the (possibly unchanged) registry.
    pub async fn add_or_confirm_device(&self, user_id: &str, ip: &str) -> Result<Vec<String>> {
        let user = self.load_user(user_id).await?;
        let user_oid = user._id.ok_or_else(|| missing_id(&user))?;

        let mut registry = DeviceRegistry::from_existing(user.ip_addresses);
        let added = registry.add_or_confirm(ip)?;

        if added {
            info!("Registered device {} for user {}", ip, user_id);
            self.persist(user_oid, registry.as_slice()).await?;
        }

        Ok(registry.into_inner())
    }

    /// Replace a user's full device set. Returns the new registry.
    pub async fn set_devices(&self, user_id: &str, ips: Vec<String>) -> Result<Vec<String>> {
        let user = self.load_user(user_id).await?;
        let user_oid = user._id.ok_or_else(|| missing_id(&user))?;

        let mut registry = DeviceRegistry::from_existing(user.ip_addresses);
        registry.replace_with(ips)?;

        self.persist(user_oid, registry.as_slice()).await?;

        Ok(registry.into_inner())
    }

    async fn load_user(&self, user_id: &str) -> Result<UserDoc> {
        let oid = ObjectId::parse_str(user_id)
            .map_err(|_| BeaconError::NotFound("User not found".into()))?;

        self.users
            .find_one(doc! { "_id": oid })
            .await?
            .ok_or_else(|| BeaconError::NotFound("User not found".into()))
    }

    async fn persist(&self, user_oid: ObjectId, ips: &[String]) -> Result<()> {
        self.users
            .update_one(
                doc! { "_id": user_oid },
                doc! {
                    "$set": {
                        "ip_addresses": ips.to_vec(),
                        "metadata.updated_at": DateTime::now(),
                    }
                },
            )
            .await?;
        Ok(())
    }
}

fn missing_id(user: &UserDoc) -> BeaconError {
    BeaconError::Internal(format!("User record for {} has no _id", user.email))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_is_idempotent() {
        let mut registry = DeviceRegistry::from_existing(vec!["1.1.1.1".into()]);

        assert!(!registry.add_or_confirm("1.1.1.1").unwrap());
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.as_slice(), &["1.1.1.1".to_string()]);
    }

    #[test]
    fn test_add_appends_below_capacity() {
        let mut registry = DeviceRegistry::default();

        assert!(registry.add_or_confirm("1.1.1.1").unwrap());
        assert!(registry.add_or_confirm("2.2.2.2").unwrap());
        assert!(registry.add_or_confirm("3.3.3.3").unwrap());
        assert_eq!(registry.len(), MAX_TRUSTED_DEVICES);
    }

    #[test]
    fn test_add_fails_at_capacity_without_mutating() {
        let ips: Vec<String> = vec!["1.1.1.1".into(), "2.2.2.2".into(), "3.3.3.3".into()];
        let mut registry = DeviceRegistry::from_existing(ips.clone());

        let err = registry.add_or_confirm("4.4.4.4").unwrap_err();
        assert!(matches!(err, BeaconError::DeviceQuota(_)));
        assert_eq!(registry.as_slice(), ips.as_slice());

        // A known IP still confirms fine at capacity
        assert!(!registry.add_or_confirm("2.2.2.2").unwrap());
    }

    #[test]
    fn test_replace_rejects_oversized_set_without_mutating() {
        let original: Vec<String> = vec!["1.1.1.1".into()];
        let mut registry = DeviceRegistry::from_existing(original.clone());

        let err = registry
            .replace_with(vec![
                "1.1.1.1".into(),
                "2.2.2.2".into(),
                "3.3.3.3".into(),
                "4.4.4.4".into(),
            ])
            .unwrap_err();
        assert!(matches!(err, BeaconError::BadRequest(_)));
        assert_eq!(registry.as_slice(), original.as_slice());
    }

    #[test]
    fn test_replace_supports_pruning() {
        let mut registry = DeviceRegistry::from_existing(vec![
            "1.1.1.1".into(),
            "2.2.2.2".into(),
            "3.3.3.3".into(),
        ]);

        registry.replace_with(vec!["5.5.5.5".into()]).unwrap();
        assert_eq!(registry.as_slice(), &["5.5.5.5".to_string()]);

        registry.replace_with(Vec::new()).unwrap();
        assert!(registry.is_empty());
    }
}
