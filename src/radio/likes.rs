use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use tokio::{sync::Mutex, time::sleep};

use crate::{
    management::TokenManager,
    types::{AddLikeRequest, LikeOperation},
};

/// Extra attempts made inside one delivery when the gateway answers 502.
const BAD_GATEWAY_RETRIES: u32 = 2;
const BAD_GATEWAY_DELAY: Duration = Duration::from_secs(2);

/// How a failed delivery should be treated by the sync worker.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    /// Network trouble, timeouts, 5xx and rate limiting. Worth another try.
    #[error("temporary failure: {0}")]
    Transient(String),
    /// The server rejected the request itself. Retrying will not help.
    #[error("rejected: {0}")]
    Permanent(String),
    /// The token is missing, expired or lacks the scope.
    #[error("not authorized: {0}")]
    Unauthorized(String),
}

impl ApiError {
    /// Maps a non-success status onto an error class. Success statuses
    /// return `None`.
    pub fn from_status(status: StatusCode, body: &str) -> Option<Self> {
        if status.is_success() {
            return None;
        }

        let message = if body.is_empty() {
            status.to_string()
        } else {
            format!("{status}: {body}")
        };

        Some(match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ApiError::Unauthorized(message),
            StatusCode::TOO_MANY_REQUESTS | StatusCode::REQUEST_TIMEOUT => {
                ApiError::Transient(message)
            }
            s if s.is_server_error() => ApiError::Transient(message),
            _ => ApiError::Permanent(message),
        })
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) => ApiError::from_status(status, "")
                .unwrap_or_else(|| ApiError::Transient(err.to_string())),
            // connect, timeout, body and decode errors never reached a verdict
            None => ApiError::Transient(err.to_string()),
        }
    }
}

/// Remote side of the likes queue.
#[async_trait]
pub trait LikesApi: Send + Sync {
    async fn add_like(&self, operation: &LikeOperation) -> Result<(), ApiError>;
    async fn remove_like(&self, operation: &LikeOperation) -> Result<(), ApiError>;
}

/// Station API client authenticated with the signed-in user's token.
pub struct HttpLikesApi {
    client: Client,
    base_url: String,
    tokens: Mutex<TokenManager>,
    retry_delay: Duration,
}

impl HttpLikesApi {
    pub fn new(base_url: String, tokens: TokenManager) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            tokens: Mutex::new(tokens),
            retry_delay: BAD_GATEWAY_DELAY,
        }
    }

    /// Pause between attempts after a 502.
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    async fn send(&self, build: impl Fn(&str) -> RequestBuilder) -> Result<(), ApiError> {
        let mut attempt = 0;

        loop {
            let token = self.tokens.lock().await.get_valid_token().await;
            let response = build(&token).send().await?;
            let status = response.status();

            if status == StatusCode::BAD_GATEWAY && attempt < BAD_GATEWAY_RETRIES {
                attempt += 1;
                sleep(self.retry_delay).await;
                continue; // retry
            }

            if status == StatusCode::TOO_MANY_REQUESTS {
                if let Some(retry_after) = response.headers().get("retry-after") {
                    log::info!(
                        "likes API rate limited, retry after {}s",
                        retry_after.to_str().unwrap_or("?")
                    );
                }
            }

            if status.is_success() {
                return Ok(());
            }

            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::from_status(status, body.trim())
                .unwrap_or_else(|| ApiError::Transient(status.to_string())));
        }
    }
}

#[async_trait]
impl LikesApi for HttpLikesApi {
    async fn add_like(&self, operation: &LikeOperation) -> Result<(), ApiError> {
        let url = format!("{base}/likes", base = self.base_url);
        let body = AddLikeRequest {
            audio_block_id: operation.audio_block.id,
            spin_id: operation.spin_id.clone(),
        };

        self.send(|token| self.client.post(&url).bearer_auth(token).json(&body))
            .await
    }

    async fn remove_like(&self, operation: &LikeOperation) -> Result<(), ApiError> {
        let url = format!(
            "{base}/likes/{id}",
            base = self.base_url,
            id = operation.audio_block.id
        );
        let query: Vec<(&str, &str)> = operation
            .spin_id
            .as_deref()
            .map(|spin| vec![("spinId", spin)])
            .unwrap_or_default();

        self.send(|token| self.client.delete(&url).bearer_auth(token).query(&query))
            .await
    }
}
