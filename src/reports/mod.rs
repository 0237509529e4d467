//! Rolling 30-day activity aggregation for the admin console
//!
//! Every invocation recomputes the trailing window from the caller-supplied
//! clock; there is no cache and no incremental maintenance. The report is
//! all-or-nothing: a single failed collection read fails the whole request.

use bson::{doc, oid::ObjectId};
use chrono::{DateTime, Duration, NaiveTime, Utc};
use serde::Serialize;
use std::collections::HashMap;

use crate::db::schemas::{
    AlertDoc, AlertStatus, BookingDoc, BookingStatus, LocationPingDoc, PostDoc, UserDoc,
    ALERT_COLLECTION, BOOKING_COLLECTION, LOCATION_COLLECTION, POST_COLLECTION, USER_COLLECTION,
};
use crate::db::{MongoClient, MongoCollection};
use crate::types::{BeaconError, Result};

/// Length of the reporting window in days
pub const WINDOW_DAYS: i64 = 30;

/// Items fetched per category for the recent-activity feed
const RECENT_ALERTS: i64 = 3;
const RECENT_PER_CATEGORY: i64 = 2;

/// Maximum entries in the merged activity feed
const FEED_LIMIT: usize = 10;

/// Start of the trailing window ending at `now`
pub fn window_start(now: DateTime<Utc>) -> DateTime<Utc> {
    now - Duration::days(WINDOW_DAYS)
}

/// Category tag for a feed entry
#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ActivityKind {
    Sos,
    Resolved,
    User,
    Post,
    Booking,
}

/// One entry in the merged recent-activity feed
#[derive(Serialize, Clone, Debug)]
pub struct ActivityItem {
    #[serde(rename = "type")]
    pub kind: ActivityKind,
    pub title: String,
    pub description: String,
    pub time: DateTime<Utc>,
}

/// Merge category feeds into one list: newest first, stable on ties
/// (insertion order wins), truncated to the feed limit.
pub fn merge_recent(mut items: Vec<ActivityItem>) -> Vec<ActivityItem> {
    items.sort_by(|a, b| b.time.cmp(&a.time));
    items.truncate(FEED_LIMIT);
    items
}

/// The full admin report payload
#[derive(Serialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ActivityReport {
    pub new_sos_alerts: u64,
    pub new_users: u64,
    pub cases_resolved: u64,
    pub false_alarms: u64,
    /// Live gauge, not bounded by the window
    pub active_alerts: u64,
    pub new_community_posts: u64,
    pub total_likes: u64,
    pub total_comments: u64,
    pub total_counselling_bookings: u64,
    pub completed_bookings: u64,
    pub cancelled_bookings: u64,
    pub pending_bookings: u64,
    pub confirmed_bookings: u64,
    pub location_updates: u64,
    pub recent_activity: Vec<ActivityItem>,
}

/// Quick dashboard stats (all-time users, live alerts, today's SOS count)
#[derive(Serialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct QuickStats {
    pub total_users: u64,
    pub active_alerts: u64,
    pub sos_today: u64,
}

/// Newest-registered user, name/email projection
#[derive(Serialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct RecentUser {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Read-only aggregator over the alert, user, post, booking, and location
/// collections
#[derive(Clone)]
pub struct ActivityAggregator {
    alerts: MongoCollection<AlertDoc>,
    users: MongoCollection<UserDoc>,
    posts: MongoCollection<PostDoc>,
    bookings: MongoCollection<BookingDoc>,
    locations: MongoCollection<LocationPingDoc>,
}

impl ActivityAggregator {
    pub async fn new(mongo: &MongoClient) -> Result<Self> {
        Ok(Self {
            alerts: mongo.collection::<AlertDoc>(ALERT_COLLECTION).await?,
            users: mongo.collection::<UserDoc>(USER_COLLECTION).await?,
            posts: mongo.collection::<PostDoc>(POST_COLLECTION).await?,
            bookings: mongo.collection::<BookingDoc>(BOOKING_COLLECTION).await?,
            locations: mongo.collection::<LocationPingDoc>(LOCATION_COLLECTION).await?,
        })
    }

    /// Build the full report for the window ending at `now`
    pub async fn report(&self, now: DateTime<Utc>) -> Result<ActivityReport> {
        self.build_report(now).await.map_err(|e| match e {
            BeaconError::Database(msg) => BeaconError::Aggregation(msg),
            other => other,
        })
    }

    async fn build_report(&self, now: DateTime<Utc>) -> Result<ActivityReport> {
        let since = bson::DateTime::from_chrono(window_start(now));
        let in_window = doc! { "metadata.created_at": { "$gte": since } };

        // -- SOS alerts --
        let new_sos_alerts = self.alerts.count(in_window.clone()).await?;

        let cases_resolved = self
            .alerts
            .count(doc! {
                "status": AlertStatus::Resolved.as_str(),
                "metadata.updated_at": { "$gte": since },
            })
            .await?;

        let false_alarms = self
            .alerts
            .count(doc! {
                "status": AlertStatus::FalseAlarm.as_str(),
                "metadata.updated_at": { "$gte": since },
            })
            .await?;

        let active_alerts = self
            .alerts
            .count(doc! { "status": AlertStatus::Active.as_str() })
            .await?;

        // -- Users --
        let new_users = self
            .users
            .count(doc! {
                "role": { "$ne": "admin" },
                "metadata.created_at": { "$gte": since },
            })
            .await?;

        // -- Community posts --
        let new_community_posts = self.posts.count(in_window.clone()).await?;

        let recent_posts = self.posts.find_many(in_window.clone()).await?;
        let total_likes = recent_posts.iter().map(|p| p.likes.len() as u64).sum();
        let total_comments = recent_posts.iter().map(|p| p.comments.len() as u64).sum();

        // -- Counselling bookings --
        let total_counselling_bookings = self.bookings.count(in_window.clone()).await?;
        let completed_bookings = self.count_bookings(BookingStatus::Completed, since).await?;
        let cancelled_bookings = self.count_bookings(BookingStatus::Cancelled, since).await?;
        let pending_bookings = self.count_bookings(BookingStatus::Pending, since).await?;
        let confirmed_bookings = self.count_bookings(BookingStatus::Confirmed, since).await?;

        // -- Location updates --
        let location_updates = self.locations.count(in_window).await?;

        let recent_activity = self.recent_activity(now, since).await?;

        Ok(ActivityReport {
            new_sos_alerts,
            new_users,
            cases_resolved,
            false_alarms,
            active_alerts,
            new_community_posts,
            total_likes,
            total_comments,
            total_counselling_bookings,
            completed_bookings,
            cancelled_bookings,
            pending_bookings,
            confirmed_bookings,
            location_updates,
            recent_activity,
        })
    }

    async fn count_bookings(
        &self,
        status: BookingStatus,
        since: bson::DateTime,
    ) -> Result<u64> {
        self.bookings
            .count(doc! {
                "status": status.as_str(),
                "metadata.created_at": { "$gte": since },
            })
            .await
    }

    /// Fetch a fixed handful of newest items per category, tag them, and
    /// merge into the top-ten feed
    async fn recent_activity(
        &self,
        now: DateTime<Utc>,
        since: bson::DateTime,
    ) -> Result<Vec<ActivityItem>> {
        let created_desc = doc! { "metadata.created_at": -1 };

        let recent_sos = self
            .alerts
            .find_sorted(
                doc! { "metadata.created_at": { "$gte": since } },
                created_desc.clone(),
                Some(RECENT_ALERTS),
            )
            .await?;

        let recent_resolved = self
            .alerts
            .find_sorted(
                doc! {
                    "status": AlertStatus::Resolved.as_str(),
                    "metadata.updated_at": { "$gte": since },
                },
                doc! { "metadata.updated_at": -1 },
                Some(RECENT_PER_CATEGORY),
            )
            .await?;

        let latest_users = self
            .users
            .find_sorted(
                doc! {
                    "role": { "$ne": "admin" },
                    "metadata.created_at": { "$gte": since },
                },
                created_desc.clone(),
                Some(RECENT_PER_CATEGORY),
            )
            .await?;

        let latest_posts = self
            .posts
            .find_sorted(
                doc! { "metadata.created_at": { "$gte": since } },
                created_desc.clone(),
                Some(RECENT_PER_CATEGORY),
            )
            .await?;

        let latest_bookings = self
            .bookings
            .find_sorted(
                doc! { "metadata.created_at": { "$gte": since } },
                created_desc,
                Some(RECENT_PER_CATEGORY),
            )
            .await?;

        // One batched lookup for the user names the descriptions need
        let mut name_ids: Vec<ObjectId> = Vec::new();
        name_ids.extend(recent_sos.iter().filter_map(|a| a.user));
        name_ids.extend(recent_resolved.iter().filter_map(|a| a.user));
        name_ids.extend(latest_bookings.iter().filter_map(|b| b.user));
        let names = self.load_names(&name_ids).await?;
        let name_of = |id: Option<ObjectId>, fallback: &str| -> String {
            id.and_then(|id| names.get(&id).cloned())
                .unwrap_or_else(|| fallback.to_string())
        };

        let mut items = Vec::new();

        for alert in &recent_sos {
            items.push(ActivityItem {
                kind: ActivityKind::Sos,
                title: "SOS Alert Triggered".into(),
                description: format!(
                    "{} triggered an SOS alert - Status: {}",
                    name_of(alert.user, "Unknown user"),
                    alert.status
                ),
                time: event_time(alert.metadata.created_at, alert.timestamp),
            });
        }

        for alert in &recent_resolved {
            items.push(ActivityItem {
                kind: ActivityKind::Resolved,
                title: "Case Resolved".into(),
                description: format!(
                    "Alert for {} was resolved",
                    name_of(alert.user, "Unknown user")
                ),
                time: event_time(alert.metadata.updated_at, alert.timestamp),
            });
        }

        for user in &latest_users {
            items.push(ActivityItem {
                kind: ActivityKind::User,
                title: "New User Registered".into(),
                description: format!("{} joined Beacon", user.name),
                time: user
                    .metadata
                    .created_at
                    .map(|d| d.to_chrono())
                    .unwrap_or(now),
            });
        }

        for post in &latest_posts {
            items.push(ActivityItem {
                kind: ActivityKind::Post,
                title: "New Community Post".into(),
                description: format!("{} shared a new post", post.user_name),
                time: post
                    .metadata
                    .created_at
                    .map(|d| d.to_chrono())
                    .unwrap_or(now),
            });
        }

        for booking in &latest_bookings {
            items.push(ActivityItem {
                kind: ActivityKind::Booking,
                title: "Counselling Booked".into(),
                description: format!(
                    "{} booked a counselling session - {}",
                    name_of(booking.user, "User"),
                    booking.status.as_str()
                ),
                time: booking
                    .metadata
                    .created_at
                    .map(|d| d.to_chrono())
                    .unwrap_or(now),
            });
        }

        Ok(merge_recent(items))
    }

    /// Quick dashboard stats: all-time non-admin users, live Active gauge,
    /// and alerts since UTC midnight
    pub async fn quick_stats(&self, now: DateTime<Utc>) -> Result<QuickStats> {
        let midnight = bson::DateTime::from_chrono(
            now.date_naive().and_time(NaiveTime::MIN).and_utc(),
        );

        let total_users = self.users.count(doc! { "role": { "$ne": "admin" } }).await?;
        let active_alerts = self
            .alerts
            .count(doc! { "status": AlertStatus::Active.as_str() })
            .await?;
        let sos_today = self
            .alerts
            .count(doc! { "metadata.created_at": { "$gte": midnight } })
            .await?;

        Ok(QuickStats {
            total_users,
            active_alerts,
            sos_today,
        })
    }

    /// Newest non-admin users for the admin dashboard
    pub async fn recent_users(&self, limit: i64) -> Result<Vec<RecentUser>> {
        let users = self
            .users
            .find_sorted(
                doc! { "role": { "$ne": "admin" } },
                doc! { "metadata.created_at": -1 },
                Some(limit),
            )
            .await?;

        Ok(users
            .iter()
            .map(|user| RecentUser {
                id: user._id.map(|id| id.to_hex()).unwrap_or_default(),
                name: user.name.clone(),
                email: user.email.clone(),
                created_at: user.metadata.created_at.map(|d| d.to_chrono()),
            })
            .collect())
    }

    async fn load_names(&self, ids: &[ObjectId]) -> Result<HashMap<ObjectId, String>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let users = self
            .users
            .find_many(doc! { "_id": { "$in": ids.to_vec() } })
            .await?;

        Ok(users
            .iter()
            .filter_map(|user| user._id.map(|id| (id, user.name.clone())))
            .collect())
    }
}

/// Event time with fallback: mongoose-era documents may miss metadata
fn event_time(stamp: Option<bson::DateTime>, fallback: bson::DateTime) -> DateTime<Utc> {
    stamp.unwrap_or(fallback).to_chrono()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 7, day, hour, 0, 0).unwrap()
    }

    fn item(kind: ActivityKind, description: &str, time: DateTime<Utc>) -> ActivityItem {
        ActivityItem {
            kind,
            title: String::new(),
            description: description.to_string(),
            time,
        }
    }

    #[test]
    fn test_window_boundaries() {
        let now = Utc.with_ymd_and_hms(2025, 7, 31, 12, 0, 0).unwrap();
        let start = window_start(now);

        let twenty_nine_days_ago = now - Duration::days(29);
        let thirty_one_days_ago = now - Duration::days(31);

        assert!(twenty_nine_days_ago >= start);
        assert!(thirty_one_days_ago < start);
    }

    #[test]
    fn test_merge_sorts_newest_first() {
        let merged = merge_recent(vec![
            item(ActivityKind::Sos, "oldest", at(1, 0)),
            item(ActivityKind::User, "newest", at(20, 0)),
            item(ActivityKind::Post, "middle", at(10, 0)),
        ]);

        let order: Vec<&str> = merged.iter().map(|i| i.description.as_str()).collect();
        assert_eq!(order, vec!["newest", "middle", "oldest"]);
    }

    #[test]
    fn test_merge_is_stable_on_ties() {
        // Two categories sharing a timestamp keep their insertion order
        let tied = at(15, 0);
        let merged = merge_recent(vec![
            item(ActivityKind::Sos, "first-inserted", tied),
            item(ActivityKind::Booking, "second-inserted", tied),
        ]);

        assert_eq!(merged[0].description, "first-inserted");
        assert_eq!(merged[1].description, "second-inserted");
    }

    #[test]
    fn test_merge_truncates_to_ten() {
        let items: Vec<ActivityItem> = (1..=14)
            .map(|day| item(ActivityKind::Sos, &format!("day-{day}"), at(day, 0)))
            .collect();

        let merged = merge_recent(items);
        assert_eq!(merged.len(), 10);
        // The four oldest fell off
        assert_eq!(merged.first().unwrap().description, "day-14");
        assert_eq!(merged.last().unwrap().description, "day-5");
    }

    #[test]
    fn test_activity_item_wire_shape() {
        let entry = item(ActivityKind::Resolved, "Alert for Asha was resolved", at(2, 9));
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["type"], "resolved");
        assert!(json["time"].as_str().unwrap().starts_with("2025-07-02T09:00:00"));
    }
}
