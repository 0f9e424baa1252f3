use async_trait::async_trait;

use pulsewatch_common::types::{Alert, AlertRule};

#[derive(Debug)]
pub enum BackendError {
    Transport(String),
    Rejected(u16),
    Decode(String),
}

impl std::fmt::Display for BackendError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Transport(e) => write!(f, "transport: {e}"),
            Self::Rejected(code) => write!(f, "rejected with status {code}"),
            Self::Decode(e) => write!(f, "decode: {e}"),
        }
    }
}

impl std::error::Error for BackendError {}

/// Optional analytics backend. Everything it serves is advisory: the engine
/// degrades to defaults / local-only alerts when a call fails, and no
/// failure here ever reaches consumers.
#[async_trait]
pub trait AlertBackend: Send + Sync {
    async fn fetch_alerts(&self, channel_id: &str) -> Result<Vec<Alert>, BackendError>;
    async fn fetch_rules(&self, channel_id: &str) -> Result<Vec<AlertRule>, BackendError>;
}

pub struct HttpAlertBackend {
    base_url: String,
    http: reqwest::Client,
}

impl HttpAlertBackend {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http: reqwest::Client::new(),
        }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        url: String,
    ) -> Result<T, BackendError> {
        let resp = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| BackendError::Transport(e.to_string()))?;

        let status = resp.status().as_u16();
        if !(200..300).contains(&status) {
            return Err(BackendError::Rejected(status));
        }

        resp.json()
            .await
            .map_err(|e| BackendError::Decode(e.to_string()))
    }
}

#[async_trait]
impl AlertBackend for HttpAlertBackend {
    async fn fetch_alerts(&self, channel_id: &str) -> Result<Vec<Alert>, BackendError> {
        self.get_json(format!("{}/v1/channels/{channel_id}/alerts", self.base_url))
            .await
    }

    async fn fetch_rules(&self, channel_id: &str) -> Result<Vec<AlertRule>, BackendError> {
        self.get_json(format!("{}/v1/channels/{channel_id}/rules", self.base_url))
            .await
    }
}
