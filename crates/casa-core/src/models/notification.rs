use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use uuid::Uuid;

/// Who receives a broadcast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Audience {
    /// Every registered device
    All,
    /// Devices whose owner was active within the last `within_days` days
    RecentlyActive { within_days: u32 },
}

impl Audience {
    /// Earliest `last_active_at` that still qualifies, if the audience is time-bound.
    pub fn active_since(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self {
            Audience::All => None,
            Audience::RecentlyActive { within_days } => {
                Some(now - chrono::Duration::days(i64::from(*within_days)))
            }
        }
    }
}

impl Display for Audience {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Audience::All => write!(f, "all"),
            Audience::RecentlyActive { within_days } => write!(f, "active_{}d", within_days),
        }
    }
}

/// A row of the device token table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceToken {
    pub token: String,
    #[serde(default)]
    pub user_id: Option<Uuid>,
    #[serde(default)]
    pub platform: Option<String>,
    #[serde(default)]
    pub last_active_at: Option<DateTime<Utc>>,
}

/// Title/body/data of a broadcast, independent of the recipients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notice {
    pub title: String,
    pub body: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

/// One message in a push gateway batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PushMessage {
    pub to: String,
    pub title: String,
    pub body: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sound: Option<String>,
}

impl PushMessage {
    pub fn for_token(notice: &Notice, token: impl Into<String>) -> Self {
        Self {
            to: token.into(),
            title: notice.title.clone(),
            body: notice.body.clone(),
            data: notice.data.clone(),
            sound: Some("default".to_string()),
        }
    }
}

/// Per-recipient result returned by the push gateway.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PushTicket {
    pub status: String,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub details: Option<serde_json::Value>,
}

impl PushTicket {
    pub fn is_ok(&self) -> bool {
        self.status == "ok"
    }

    /// Gateway reports the device token as no longer registered.
    pub fn is_device_not_registered(&self) -> bool {
        self.details
            .as_ref()
            .and_then(|d| d.get("error"))
            .and_then(|e| e.as_str())
            == Some("DeviceNotRegistered")
    }
}

/// Aggregate outcome of a broadcast.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BroadcastReport {
    pub total: usize,
    pub success: usize,
    pub failure: usize,
}

/// Row persisted in the notification history table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationRecord {
    pub title: String,
    pub body: String,
    pub audience: String,
    pub total_recipients: usize,
    pub success_count: usize,
    pub failure_count: usize,
    pub sent_at: DateTime<Utc>,
}

impl NotificationRecord {
    pub fn from_report(
        notice: &Notice,
        audience: Audience,
        report: BroadcastReport,
        sent_at: DateTime<Utc>,
    ) -> Self {
        Self {
            title: notice.title.clone(),
            body: notice.body.clone(),
            audience: audience.to_string(),
            total_recipients: report.total,
            success_count: report.success,
            failure_count: report.failure,
            sent_at,
        }
    }
}
