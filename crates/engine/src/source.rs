use async_trait::async_trait;
use rand::Rng;

use pulsewatch_common::types::MetricSnapshot;

#[derive(Debug)]
pub enum SourceError {
    Transport(String),
    Rejected(u16),
    Decode(String),
}

impl std::fmt::Display for SourceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Transport(e) => write!(f, "transport: {e}"),
            Self::Rejected(code) => write!(f, "rejected with status {code}"),
            Self::Decode(e) => write!(f, "decode: {e}"),
        }
    }
}

impl std::error::Error for SourceError {}

/// Supplies one snapshot of current channel metrics per tick.
#[async_trait]
pub trait MetricSource: Send + Sync {
    async fn fetch(&self, channel_id: &str) -> Result<MetricSnapshot, SourceError>;
}

pub struct HttpMetricSource {
    base_url: String,
    http: reqwest::Client,
}

impl HttpMetricSource {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl MetricSource for HttpMetricSource {
    async fn fetch(&self, channel_id: &str) -> Result<MetricSnapshot, SourceError> {
        let url = format!("{}/v1/channels/{channel_id}/metrics", self.base_url);

        let resp = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| SourceError::Transport(e.to_string()))?;

        let status = resp.status().as_u16();
        if !(200..300).contains(&status) {
            return Err(SourceError::Rejected(status));
        }

        let mut snapshot: MetricSnapshot = resp
            .json()
            .await
            .map_err(|e| SourceError::Decode(e.to_string()))?;
        snapshot.is_fallback = false;
        Ok(snapshot)
    }
}

/// Fallback source used when no live endpoint is configured or a fetch
/// fails: plausible values in dashboard-typical ranges, always flagged.
pub struct SimulatedSource;

#[async_trait]
impl MetricSource for SimulatedSource {
    async fn fetch(&self, _channel_id: &str) -> Result<MetricSnapshot, SourceError> {
        Ok(simulated_snapshot())
    }
}

pub fn simulated_snapshot() -> MetricSnapshot {
    let mut rng = rand::thread_rng();
    MetricSnapshot {
        growth_rate: rng.gen_range(0.0..25.0),
        engagement_rate: rng.gen_range(0.5..8.0),
        subscribers: rng.gen_range(800..5_000),
        views: rng.gen_range(10_000..120_000),
        is_fallback: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simulated_snapshot_is_flagged_and_in_range() {
        for _ in 0..50 {
            let snap = simulated_snapshot();
            assert!(snap.is_fallback);
            assert!((0.0..25.0).contains(&snap.growth_rate));
            assert!((0.5..8.0).contains(&snap.engagement_rate));
            assert!((800u64..5_000).contains(&snap.subscribers));
            assert!((10_000u64..120_000).contains(&snap.views));
        }
    }

    #[tokio::test]
    async fn simulated_source_never_fails() {
        let snap = SimulatedSource.fetch("any-channel").await.unwrap();
        assert!(snap.is_fallback);
    }

    #[test]
    fn error_display() {
        assert!(SourceError::Rejected(503).to_string().contains("503"));
        assert!(SourceError::Transport("refused".into())
            .to_string()
            .contains("refused"));
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let source = HttpMetricSource::new("https://api.example.com/");
        assert_eq!(source.base_url, "https://api.example.com");
    }
}
