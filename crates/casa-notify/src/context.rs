//! Per-session push registration.
//!
//! The owner constructs a [`NotificationContext`], calls
//! [`NotificationContext::initialize`] once the user is known and
//! [`NotificationContext::teardown`] on sign-out.

use crate::error::{GatewayError, RepositoryError};
use crate::repository::DeviceTokenRepository;
use async_trait::async_trait;
use casa_core::models::DeviceToken;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

/// Source of this device's push token.
#[async_trait]
pub trait PushTokenProvider: Send + Sync {
    /// `Ok(None)` when the user declined notifications.
    async fn obtain_token(&self) -> Result<Option<String>, GatewayError>;
}

pub struct NotificationContext {
    provider: Arc<dyn PushTokenProvider>,
    tokens: Arc<dyn DeviceTokenRepository>,
    token: Mutex<Option<String>>,
}

impl NotificationContext {
    pub fn new(provider: Arc<dyn PushTokenProvider>, tokens: Arc<dyn DeviceTokenRepository>) -> Self {
        Self {
            provider,
            tokens,
            token: Mutex::new(None),
        }
    }

    /// Obtain and register the device token.
    ///
    /// A provider failure leaves the context without a token; only the
    /// registration write is reported as an error.
    #[tracing::instrument(skip(self, platform))]
    pub async fn initialize(
        &self,
        user_id: Option<Uuid>,
        platform: Option<String>,
    ) -> Result<Option<String>, RepositoryError> {
        let token = match self.provider.obtain_token().await {
            Ok(Some(token)) => token,
            Ok(None) => {
                tracing::info!("Push notifications not granted");
                return Ok(None);
            }
            Err(e) => {
                tracing::warn!(error = %e, "Could not obtain push token");
                return Ok(None);
            }
        };

        self.tokens
            .upsert_token(&DeviceToken {
                token: token.clone(),
                user_id,
                platform,
                last_active_at: Some(chrono::Utc::now()),
            })
            .await?;

        if let Ok(mut slot) = self.token.lock() {
            *slot = Some(token.clone());
        }
        tracing::info!("Registered push token");
        Ok(Some(token))
    }

    pub fn push_token(&self) -> Option<String> {
        self.token.lock().ok().and_then(|slot| slot.clone())
    }

    /// Forget the token and unregister it. Never fails.
    pub async fn teardown(&self) {
        let token = self.token.lock().ok().and_then(|mut slot| slot.take());
        let Some(token) = token else {
            return;
        };
        if let Err(e) = self.tokens.delete_token(&token).await {
            tracing::warn!(error = %e, "Failed to unregister push token");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::MockTokenRepository;

    struct FixedProvider(Result<Option<String>, u16>);

    #[async_trait]
    impl PushTokenProvider for FixedProvider {
        async fn obtain_token(&self) -> Result<Option<String>, GatewayError> {
            self.0.clone().map_err(|status| GatewayError::Status {
                status,
                body: String::new(),
            })
        }
    }

    fn context(
        provider: FixedProvider,
        repo: Arc<MockTokenRepository>,
    ) -> NotificationContext {
        NotificationContext::new(Arc::new(provider), repo)
    }

    #[tokio::test]
    async fn test_initialize_registers_and_teardown_unregisters() {
        let repo = Arc::new(MockTokenRepository::default());
        let ctx = context(
            FixedProvider(Ok(Some("ExpoPushToken[me]".to_string()))),
            repo.clone(),
        );
        let user = Uuid::new_v4();

        let token = ctx
            .initialize(Some(user), Some("android".to_string()))
            .await
            .unwrap();
        assert_eq!(token.as_deref(), Some("ExpoPushToken[me]"));
        assert_eq!(ctx.push_token().as_deref(), Some("ExpoPushToken[me]"));

        {
            let stored = repo.tokens.lock().unwrap();
            assert_eq!(stored.len(), 1);
            assert_eq!(stored[0].user_id, Some(user));
            assert!(stored[0].last_active_at.is_some());
        }

        ctx.teardown().await;
        assert!(ctx.push_token().is_none());
        assert_eq!(*repo.deleted.lock().unwrap(), vec!["ExpoPushToken[me]"]);

        // Second teardown is a no-op.
        ctx.teardown().await;
        assert_eq!(repo.deleted.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_declined_or_failing_provider_yields_none() {
        for provider in [FixedProvider(Ok(None)), FixedProvider(Err(503))] {
            let repo = Arc::new(MockTokenRepository::default());
            let ctx = context(provider, repo.clone());
            assert_eq!(ctx.initialize(None, None).await.unwrap(), None);
            assert!(ctx.push_token().is_none());
            assert!(repo.tokens.lock().unwrap().is_empty());
        }
    }
}
