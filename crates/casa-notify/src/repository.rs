//! Device token and notification history tables.
//!
//! [`RestRepository`] talks to the hosted backend's PostgREST endpoint
//! (`{url}/rest/v1/{table}`).

use crate::error::RepositoryError;
use async_trait::async_trait;
use casa_core::models::{Audience, DeviceToken, NotificationRecord};
use casa_core::Config;
use chrono::{SecondsFormat, Utc};
use reqwest::{Client, RequestBuilder, Response};
use std::time::Duration;

const PUSH_TOKENS_TABLE: &str = "push_tokens";
/// Rows requested per page; the backend may cap pages lower (`max-rows`).
const TOKEN_PAGE_SIZE: usize = 1000;
const NOTIFICATION_HISTORY_TABLE: &str = "notification_history";

#[async_trait]
pub trait DeviceTokenRepository: Send + Sync {
    async fn find_tokens(&self, audience: Audience) -> Result<Vec<DeviceToken>, RepositoryError>;

    /// Insert a token, or refresh the existing row for the same token.
    async fn upsert_token(&self, token: &DeviceToken) -> Result<(), RepositoryError>;

    async fn delete_token(&self, token: &str) -> Result<(), RepositoryError>;
}

#[async_trait]
pub trait NotificationHistoryRepository: Send + Sync {
    async fn record(&self, record: &NotificationRecord) -> Result<(), RepositoryError>;
}

#[derive(Clone)]
pub struct RestRepository {
    client: Client,
    base_url: String,
    api_key: String,
    bearer: String,
}

impl RestRepository {
    pub fn new(
        base_url: String,
        api_key: String,
        bearer: String,
        timeout: Duration,
    ) -> Result<Self, RepositoryError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            bearer,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, RepositoryError> {
        let url = config
            .supabase_url
            .clone()
            .ok_or_else(|| RepositoryError::Config("SUPABASE_URL not configured".to_string()))?;
        let api_key = config
            .supabase_anon_key
            .clone()
            .ok_or_else(|| RepositoryError::Config("SUPABASE_ANON_KEY not configured".to_string()))?;
        let bearer = config
            .supabase_bearer()
            .map(String::from)
            .unwrap_or_else(|| api_key.clone());

        Self::new(
            url,
            api_key,
            bearer,
            Duration::from_secs(config.http_timeout_secs),
        )
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("apikey", self.api_key.as_str())
            .bearer_auth(&self.bearer)
    }

    /// Total row count from a `Content-Range: 0-999/2500` header, if known.
    fn content_range_total(response: &Response) -> Option<usize> {
        response
            .headers()
            .get(reqwest::header::CONTENT_RANGE)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.rsplit_once('/'))
            .and_then(|(_, total)| total.parse().ok())
    }

    async fn check(table: &'static str, response: Response) -> Result<Response, RepositoryError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(RepositoryError::Status {
            table,
            status: status.as_u16(),
            body,
        })
    }
}

#[async_trait]
impl DeviceTokenRepository for RestRepository {
    /// Every matching row, fetched page by page until the reported total
    /// (or a short page, when the total is unknown) is reached.
    async fn find_tokens(&self, audience: Audience) -> Result<Vec<DeviceToken>, RepositoryError> {
        let mut query = vec![
            (
                "select".to_string(),
                "token,user_id,platform,last_active_at".to_string(),
            ),
            ("order".to_string(), "token.asc".to_string()),
        ];
        if let Some(since) = audience.active_since(Utc::now()) {
            query.push((
                "last_active_at".to_string(),
                format!("gte.{}", since.to_rfc3339_opts(SecondsFormat::Secs, true)),
            ));
        }

        let mut tokens: Vec<DeviceToken> = Vec::new();
        let mut pages = 0;
        loop {
            let offset = tokens.len();
            let request = self
                .client
                .get(self.table_url(PUSH_TOKENS_TABLE))
                .query(&query)
                .query(&[("limit", TOKEN_PAGE_SIZE), ("offset", offset)])
                .header("Prefer", "count=exact");
            let response = self.authorize(request).send().await?;
            let response = Self::check(PUSH_TOKENS_TABLE, response).await?;
            let total = Self::content_range_total(&response);
            let page: Vec<DeviceToken> = response.json().await?;
            pages += 1;

            let fetched = page.len();
            tokens.extend(page);

            let done = match total {
                _ if fetched == 0 => true,
                Some(total) => tokens.len() >= total,
                None => fetched < TOKEN_PAGE_SIZE,
            };
            if done {
                break;
            }
        }

        tracing::debug!(
            audience = %audience,
            count = tokens.len(),
            pages,
            "Loaded device tokens"
        );
        Ok(tokens)
    }

    async fn upsert_token(&self, token: &DeviceToken) -> Result<(), RepositoryError> {
        let request = self
            .client
            .post(self.table_url(PUSH_TOKENS_TABLE))
            .query(&[("on_conflict", "token")])
            .header("Prefer", "resolution=merge-duplicates,return=minimal")
            .json(token);
        let response = self.authorize(request).send().await?;
        Self::check(PUSH_TOKENS_TABLE, response).await?;
        Ok(())
    }

    async fn delete_token(&self, token: &str) -> Result<(), RepositoryError> {
        let request = self
            .client
            .delete(self.table_url(PUSH_TOKENS_TABLE))
            .query(&[("token", format!("eq.{}", token))]);
        let response = self.authorize(request).send().await?;
        Self::check(PUSH_TOKENS_TABLE, response).await?;
        Ok(())
    }
}

#[async_trait]
impl NotificationHistoryRepository for RestRepository {
    async fn record(&self, record: &NotificationRecord) -> Result<(), RepositoryError> {
        let request = self
            .client
            .post(self.table_url(NOTIFICATION_HISTORY_TABLE))
            .header("Prefer", "return=minimal")
            .json(record);
        let response = self.authorize(request).send().await?;
        Self::check(NOTIFICATION_HISTORY_TABLE, response).await?;
        Ok(())
    }
}
