//! Bulk notification fan-out.
//!
//! Tokens are de-duplicated, split into gateway-sized batches and sent one
//! batch at a time. A failed batch counts every recipient in it as failed;
//! nothing is retried.

use crate::error::BroadcastError;
use crate::gateway::{is_push_token, PushGateway};
use crate::repository::{DeviceTokenRepository, NotificationHistoryRepository};
use casa_core::constants::PUSH_GATEWAY_BATCH_LIMIT;
use casa_core::models::{Audience, BroadcastReport, Notice, NotificationRecord, PushMessage};
use std::collections::HashSet;
use std::sync::Arc;

pub struct BroadcastService {
    tokens: Arc<dyn DeviceTokenRepository>,
    history: Arc<dyn NotificationHistoryRepository>,
    gateway: Arc<dyn PushGateway>,
    batch_size: usize,
}

impl BroadcastService {
    pub fn new(
        tokens: Arc<dyn DeviceTokenRepository>,
        history: Arc<dyn NotificationHistoryRepository>,
        gateway: Arc<dyn PushGateway>,
    ) -> Self {
        Self {
            tokens,
            history,
            gateway,
            batch_size: PUSH_GATEWAY_BATCH_LIMIT,
        }
    }

    /// Batch size, clamped to `1..=100`.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.clamp(1, PUSH_GATEWAY_BATCH_LIMIT);
        self
    }

    #[tracing::instrument(skip(self, notice), fields(audience = %audience, title = %notice.title))]
    pub async fn broadcast(
        &self,
        notice: &Notice,
        audience: Audience,
    ) -> Result<BroadcastReport, BroadcastError> {
        if notice.title.trim().is_empty() || notice.body.trim().is_empty() {
            return Err(BroadcastError::InvalidNotice(
                "Title and message are both required".to_string(),
            ));
        }

        let records = self
            .tokens
            .find_tokens(audience)
            .await
            .map_err(BroadcastError::Audience)?;

        let mut seen = HashSet::new();
        let unique: Vec<String> = records
            .into_iter()
            .map(|r| r.token)
            .filter(|t| seen.insert(t.clone()))
            .collect();

        let mut report = BroadcastReport {
            total: unique.len(),
            ..BroadcastReport::default()
        };

        if unique.is_empty() {
            tracing::info!("No recipients for broadcast");
            return Ok(report);
        }

        let (valid, invalid): (Vec<String>, Vec<String>) =
            unique.into_iter().partition(|t| is_push_token(t));
        if !invalid.is_empty() {
            tracing::warn!(count = invalid.len(), "Skipping malformed device tokens");
            report.failure += invalid.len();
        }

        let mut stale = Vec::new();
        for (index, chunk) in valid.chunks(self.batch_size).enumerate() {
            let messages: Vec<PushMessage> = chunk
                .iter()
                .map(|token| PushMessage::for_token(notice, token.as_str()))
                .collect();

            match self.gateway.send_batch(&messages).await {
                Ok(tickets) => {
                    if tickets.len() != chunk.len() {
                        tracing::warn!(
                            batch = index,
                            expected = chunk.len(),
                            received = tickets.len(),
                            "Ticket count does not match batch size"
                        );
                    }
                    for (i, token) in chunk.iter().enumerate() {
                        match tickets.get(i) {
                            Some(ticket) if ticket.is_ok() => report.success += 1,
                            Some(ticket) => {
                                report.failure += 1;
                                if ticket.is_device_not_registered() {
                                    stale.push(token.clone());
                                }
                            }
                            None => report.failure += 1,
                        }
                    }
                }
                Err(e) => {
                    tracing::warn!(
                        batch = index,
                        size = chunk.len(),
                        error = %e,
                        "Push batch failed"
                    );
                    report.failure += chunk.len();
                }
            }
        }

        self.prune_stale_tokens(&stale).await;

        let record = NotificationRecord::from_report(notice, audience, report, chrono::Utc::now());
        if let Err(e) = self.history.record(&record).await {
            tracing::error!(error = %e, "Failed to record notification history");
        }

        tracing::info!(
            total = report.total,
            success = report.success,
            failure = report.failure,
            "Broadcast finished"
        );
        Ok(report)
    }

    async fn prune_stale_tokens(&self, stale: &[String]) {
        for token in stale {
            if let Err(e) = self.tokens.delete_token(token).await {
                tracing::warn!(error = %e, "Failed to delete unregistered device token");
            }
        }
        if !stale.is_empty() {
            tracing::info!(count = stale.len(), "Removed unregistered device tokens");
        }
    }
}
