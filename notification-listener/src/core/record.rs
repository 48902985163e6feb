/*!
Notification data model: raw platform events and canonical records
*/

use std::fmt;
use serde::{Deserialize, Serialize};

/// Identity used for dedupe and delete lookups
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NotificationKey {
    pub id: i32,
    pub post_time: i64,
}

impl NotificationKey {
    pub fn new(id: i32, post_time: i64) -> Self {
        Self { id, post_time }
    }
}

impl fmt::Display for NotificationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.post_time, self.id)
    }
}

/// Kind of event carried by a record. Removal tracking is disabled, so only
/// posts ever reach the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventType {
    Posted,
}

/// One observed notification, in the shape streamed to subscribers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationRecord {
    pub id: i32,
    pub key: String,
    pub title: String,
    pub text: String,
    #[serde(rename = "packageName")]
    pub source_id: String,
    #[serde(rename = "appName")]
    pub source_name: String,
    #[serde(rename = "postTime")]
    pub post_time: i64,
    #[serde(rename = "isClearable")]
    pub dismissible: bool,
    /// Wall-clock capture time in epoch milliseconds
    #[serde(rename = "timestamp")]
    pub observed_at: i64,
    #[serde(rename = "eventType")]
    pub event_type: EventType,
}

impl NotificationRecord {
    pub fn identity(&self) -> NotificationKey {
        NotificationKey::new(self.id, self.post_time)
    }

    pub fn matches(&self, key: NotificationKey) -> bool {
        self.id == key.id && self.post_time == key.post_time
    }
}

/// What the platform feed reported for a raw event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RawEventKind {
    #[default]
    Posted,
    Removed,
}

/// A notification as delivered by the platform, before normalization.
/// Every field is optional on the wire; the normalizer decides what is fatal.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawNotification {
    pub id: Option<i32>,
    pub post_time: Option<i64>,
    pub package_name: Option<String>,
    pub title: Option<String>,
    pub text: Option<String>,
    pub is_clearable: Option<bool>,
    #[serde(default)]
    pub event_type: RawEventKind,
}

impl RawNotification {
    pub fn posted(id: i32, post_time: i64, package_name: impl Into<String>) -> Self {
        Self {
            id: Some(id),
            post_time: Some(post_time),
            package_name: Some(package_name.into()),
            ..Default::default()
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_is_post_time_then_id() {
        assert_eq!(NotificationKey::new(1, 1000).to_string(), "1000_1");
    }

    #[test]
    fn record_uses_external_field_names() {
        let record = NotificationRecord {
            id: 7,
            key: "42_7".to_string(),
            title: "Hello".to_string(),
            text: String::new(),
            source_id: "org.example.Mail".to_string(),
            source_name: "Mail".to_string(),
            post_time: 42,
            dismissible: true,
            observed_at: 99,
            event_type: EventType::Posted,
        };

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["packageName"], "org.example.Mail");
        assert_eq!(value["appName"], "Mail");
        assert_eq!(value["postTime"], 42);
        assert_eq!(value["isClearable"], true);
        assert_eq!(value["timestamp"], 99);
        assert_eq!(value["eventType"], "posted");
        assert_eq!(value["key"], "42_7");
    }

    #[test]
    fn raw_notification_accepts_sparse_lines() {
        let raw: RawNotification =
            serde_json::from_str(r#"{"id":3,"postTime":5,"packageName":"a.b"}"#).unwrap();
        assert_eq!(raw.id, Some(3));
        assert!(raw.title.is_none());
        assert_eq!(raw.event_type, RawEventKind::Posted);

        let removed: RawNotification =
            serde_json::from_str(r#"{"id":3,"packageName":"a.b","eventType":"removed"}"#).unwrap();
        assert_eq!(removed.event_type, RawEventKind::Removed);
    }
}
