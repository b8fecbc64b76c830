//! In-memory fakes for the notification services.
//!
//! No network access is needed, so fan-out and context logic can be tested
//! in isolation.

use crate::error::{GatewayError, RepositoryError};
use crate::gateway::PushGateway;
use crate::repository::{DeviceTokenRepository, NotificationHistoryRepository};
use async_trait::async_trait;
use casa_core::models::{Audience, DeviceToken, NotificationRecord, PushMessage, PushTicket};
use std::collections::{HashSet, VecDeque};
use std::sync::Mutex;

pub fn device(token: &str) -> DeviceToken {
    DeviceToken {
        token: token.to_string(),
        user_id: None,
        platform: Some("ios".to_string()),
        last_active_at: None,
    }
}

pub fn ok_ticket() -> PushTicket {
    PushTicket {
        status: "ok".to_string(),
        id: Some("ticket".to_string()),
        message: None,
        details: None,
    }
}

pub fn unregistered_ticket() -> PushTicket {
    PushTicket {
        status: "error".to_string(),
        id: None,
        message: Some("not a registered push notification recipient".to_string()),
        details: Some(serde_json::json!({ "error": "DeviceNotRegistered" })),
    }
}

/// Token table held in memory.
#[derive(Default)]
pub struct MockTokenRepository {
    pub tokens: Mutex<Vec<DeviceToken>>,
    pub deleted: Mutex<Vec<String>>,
    pub queried: Mutex<Vec<Audience>>,
    pub fail_reads: bool,
}

impl MockTokenRepository {
    pub fn with_tokens(tokens: &[&str]) -> Self {
        Self {
            tokens: Mutex::new(tokens.iter().map(|t| device(t)).collect()),
            ..Self::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            fail_reads: true,
            ..Self::default()
        }
    }
}

#[async_trait]
impl DeviceTokenRepository for MockTokenRepository {
    async fn find_tokens(&self, audience: Audience) -> Result<Vec<DeviceToken>, RepositoryError> {
        self.queried.lock().unwrap().push(audience);
        if self.fail_reads {
            return Err(RepositoryError::Status {
                table: "push_tokens",
                status: 503,
                body: "unavailable".to_string(),
            });
        }
        Ok(self.tokens.lock().unwrap().clone())
    }

    async fn upsert_token(&self, token: &DeviceToken) -> Result<(), RepositoryError> {
        let mut tokens = self.tokens.lock().unwrap();
        tokens.retain(|t| t.token != token.token);
        tokens.push(token.clone());
        Ok(())
    }

    async fn delete_token(&self, token: &str) -> Result<(), RepositoryError> {
        self.tokens.lock().unwrap().retain(|t| t.token != token);
        self.deleted.lock().unwrap().push(token.to_string());
        Ok(())
    }
}

#[derive(Default)]
pub struct MockHistoryRepository {
    pub records: Mutex<Vec<NotificationRecord>>,
    pub fail: bool,
}

#[async_trait]
impl NotificationHistoryRepository for MockHistoryRepository {
    async fn record(&self, record: &NotificationRecord) -> Result<(), RepositoryError> {
        if self.fail {
            return Err(RepositoryError::Config("history unavailable".to_string()));
        }
        self.records.lock().unwrap().push(record.clone());
        Ok(())
    }
}

/// Gateway that answers from a script, one entry per batch.
///
/// `None` entries make the whole batch fail; when the script runs out every
/// message gets an `ok` ticket. Tokens in `unregistered` get a
/// `DeviceNotRegistered` ticket.
#[derive(Default)]
pub struct ScriptedGateway {
    pub batches: Mutex<Vec<Vec<PushMessage>>>,
    pub script: Mutex<VecDeque<Option<usize>>>,
    pub unregistered: HashSet<String>,
}

impl ScriptedGateway {
    /// Fail the batches whose (0-based) index is in `failing`.
    pub fn failing_batches(failing: &[usize], total: usize) -> Self {
        let script = (0..total)
            .map(|i| if failing.contains(&i) { None } else { Some(usize::MAX) })
            .collect();
        Self {
            script: Mutex::new(script),
            ..Self::default()
        }
    }

    /// Return only `tickets` tickets for the next batch.
    pub fn truncating(tickets: usize) -> Self {
        Self {
            script: Mutex::new(VecDeque::from([Some(tickets)])),
            ..Self::default()
        }
    }

    pub fn batch_sizes(&self) -> Vec<usize> {
        self.batches.lock().unwrap().iter().map(Vec::len).collect()
    }
}

#[async_trait]
impl PushGateway for ScriptedGateway {
    async fn send_batch(&self, messages: &[PushMessage]) -> Result<Vec<PushTicket>, GatewayError> {
        self.batches.lock().unwrap().push(messages.to_vec());
        let step = self.script.lock().unwrap().pop_front().unwrap_or(Some(usize::MAX));

        let Some(limit) = step else {
            return Err(GatewayError::Status {
                status: 500,
                body: "gateway down".to_string(),
            });
        };

        Ok(messages
            .iter()
            .take(limit)
            .map(|m| {
                if self.unregistered.contains(&m.to) {
                    unregistered_ticket()
                } else {
                    ok_ticket()
                }
            })
            .collect())
    }
}
