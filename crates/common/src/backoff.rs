use std::future::Future;
use std::time::Duration;

/// Bounded retry with exponential backoff for best-effort collaborator
/// calls. Exhaustion returns the last error; the caller decides how to
/// degrade.
#[derive(Debug, Clone)]
pub struct Backoff {
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub factor: f64,
}

impl Default for Backoff {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(200),
            factor: 2.0,
        }
    }
}

impl Backoff {
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    pub async fn run<F, Fut, T, E>(&self, mut op: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: std::fmt::Display,
    {
        let mut delay = self.initial_delay;
        let mut last_err = None;

        for attempt in 1..=self.max_attempts {
            match op().await {
                Ok(v) => return Ok(v),
                Err(e) => {
                    tracing::warn!(
                        attempt,
                        max_attempts = self.max_attempts,
                        error = %e,
                        "attempt failed"
                    );
                    last_err = Some(e);
                    if attempt < self.max_attempts {
                        tokio::time::sleep(delay).await;
                        delay = Duration::from_secs_f64(delay.as_secs_f64() * self.factor);
                    }
                }
            }
        }

        Err(last_err.expect("at least one attempt runs"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast() -> Backoff {
        Backoff {
            max_attempts: 3,
            initial_delay: Duration::from_millis(1),
            factor: 1.0,
        }
    }

    #[tokio::test]
    async fn first_success_short_circuits() {
        let result = fast().run(|| async { Ok::<_, String>(7) }).await;
        assert_eq!(result.unwrap(), 7);
    }

    #[tokio::test]
    async fn recovers_within_budget() {
        let calls = AtomicU32::new(0);
        let result: Result<u32, String> = fast()
            .run(|| {
                let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                async move {
                    if n < 3 {
                        Err("not yet".to_string())
                    } else {
                        Ok(n)
                    }
                }
            })
            .await;
        assert_eq!(result.unwrap(), 3);
    }

    #[tokio::test]
    async fn exhaustion_returns_last_error() {
        let result: Result<(), String> = fast()
            .run(|| async { Err("backend unreachable".to_string()) })
            .await;
        assert_eq!(result.unwrap_err(), "backend unreachable");
    }
}
