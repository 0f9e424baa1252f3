use std::sync::{Arc, RwLock};
use std::time::Duration;

use chrono::Utc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use pulsewatch_common::backoff::Backoff;
use pulsewatch_common::types::{Alert, AlertRule};

use crate::backend::{AlertBackend, HttpAlertBackend};
use crate::config::WatcherConfig;
use crate::evaluator::{self, Candidate, RandomSurge, SurgeDetector};
use crate::gate;
use crate::reconciler;
use crate::ruleset::{NewRule, RuleError, RuleSet};
use crate::source::{simulated_snapshot, HttpMetricSource, MetricSource, SimulatedSource};

pub struct TaskHandle {
    handle: JoinHandle<()>,
}

impl TaskHandle {
    pub fn abort(&self) {
        self.handle.abort();
    }
}

/// Everything one polling cycle needs, shared with the spawned loop.
struct TickCtx {
    channel_id: String,
    config: WatcherConfig,
    source: Arc<dyn MetricSource>,
    backend: Option<Arc<dyn AlertBackend>>,
    detector: Arc<dyn SurgeDetector>,
    rules: Arc<RwLock<RuleSet>>,
    alerts: Arc<watch::Sender<Arc<[Alert]>>>,
}

/// The alerting session for one channel.
///
/// Two states: idle (no rules, no timer) and polling (a single spawned
/// loop driving fetch → evaluate → gate → merge → publish). Ticks run one
/// at a time by construction: the loop awaits each cycle before asking the
/// interval for the next, so a slow fetch can never overlap the following
/// tick. The published collection is an immutable `Arc<[Alert]>` replaced
/// wholesale on every change; readers never observe a partial update.
pub struct AlertWatcher {
    channel_id: String,
    config: WatcherConfig,
    source: Arc<dyn MetricSource>,
    backend: Option<Arc<dyn AlertBackend>>,
    detector: Arc<dyn SurgeDetector>,
    rules: Arc<RwLock<RuleSet>>,
    alerts_tx: Arc<watch::Sender<Arc<[Alert]>>>,
    task: Option<TaskHandle>,
}

impl AlertWatcher {
    /// Wire the watcher from configuration: HTTP collaborators when
    /// endpoints are configured, the simulated source otherwise.
    pub fn new(config: WatcherConfig, channel_id: impl Into<String>) -> Self {
        let source: Arc<dyn MetricSource> = match config.metrics_url.as_deref() {
            Some(url) => Arc::new(HttpMetricSource::new(url)),
            None => Arc::new(SimulatedSource),
        };
        let backend = config
            .backend_url
            .as_deref()
            .map(|url| Arc::new(HttpAlertBackend::new(url)) as Arc<dyn AlertBackend>);
        Self::with_parts(
            config,
            channel_id,
            source,
            backend,
            Arc::new(RandomSurge::default()),
        )
    }

    pub fn with_parts(
        config: WatcherConfig,
        channel_id: impl Into<String>,
        source: Arc<dyn MetricSource>,
        backend: Option<Arc<dyn AlertBackend>>,
        detector: Arc<dyn SurgeDetector>,
    ) -> Self {
        let (alerts_tx, _) = watch::channel::<Arc<[Alert]>>(Arc::from(Vec::new()));
        Self {
            channel_id: channel_id.into(),
            config,
            source,
            backend,
            detector,
            rules: Arc::new(RwLock::new(RuleSet::default())),
            alerts_tx: Arc::new(alerts_tx),
            task: None,
        }
    }

    /// Ask the backend for server-known rules and alerts. Unreachable or
    /// empty responses keep the built-in defaults and an empty collection.
    pub async fn seed(&self) {
        let Some(backend) = &self.backend else {
            return;
        };

        let rule_fetch = Backoff::default()
            .run(|| backend.fetch_rules(&self.channel_id))
            .await;
        match rule_fetch {
            Ok(rules) if !rules.is_empty() => {
                tracing::info!(count = rules.len(), "installed server rule set");
                *write_rules(&self.rules) = RuleSet::new(rules);
            }
            Ok(_) => tracing::debug!("backend has no rules, keeping defaults"),
            Err(e) => tracing::warn!(error = %e, "rule fetch failed, keeping defaults"),
        }

        match backend.fetch_alerts(&self.channel_id).await {
            Ok(alerts) if !alerts.is_empty() => {
                let merged = reconciler::merge(&alerts, &[], self.config.max_alerts);
                tracing::info!(count = merged.len(), "seeded alerts from backend");
                self.alerts_tx.send_replace(merged.into());
            }
            Ok(_) => {}
            Err(e) => tracing::warn!(error = %e, "alert fetch failed, starting empty"),
        }
    }

    /// Enter the polling state. The first tick fires immediately; later
    /// ticks follow `check_interval_ms`. No-op when already polling or when
    /// there is no rule row to evaluate against.
    pub fn start(&mut self) {
        if self.task.is_some() {
            return;
        }
        if read_rules(&self.rules).is_empty() {
            tracing::debug!("no rules configured, staying idle");
            return;
        }

        let ctx = TickCtx {
            channel_id: self.channel_id.clone(),
            config: self.config.clone(),
            source: self.source.clone(),
            backend: self.backend.clone(),
            detector: self.detector.clone(),
            rules: self.rules.clone(),
            alerts: self.alerts_tx.clone(),
        };
        let interval = Duration::from_millis(self.config.check_interval_ms);

        let handle = tokio::spawn(async move {
            let mut tick = tokio::time::interval(interval);
            tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tick.tick().await;
                run_tick(&ctx).await;
            }
        });

        tracing::info!(
            channel_id = %self.channel_id,
            interval_ms = self.config.check_interval_ms,
            "polling started"
        );
        self.task = Some(TaskHandle { handle });
    }

    /// Leave the polling state. The loop is aborted, so no further tick
    /// begins; an in-flight fetch is cancelled at its next await point.
    pub fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            tracing::info!(channel_id = %self.channel_id, "polling stopped");
        }
    }

    pub fn is_polling(&self) -> bool {
        self.task.is_some()
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<[Alert]>> {
        self.alerts_tx.subscribe()
    }

    pub fn alerts(&self) -> Arc<[Alert]> {
        self.alerts_tx.borrow().clone()
    }

    pub fn unread_count(&self) -> usize {
        reconciler::unread_count(&self.alerts())
    }

    pub fn rules(&self) -> Vec<AlertRule> {
        read_rules(&self.rules).rules().to_vec()
    }

    pub fn toggle_rule(&mut self, rule_id: &str) -> bool {
        write_rules(&self.rules).toggle(rule_id)
    }

    pub fn add_rule(&mut self, draft: NewRule) -> Result<AlertRule, RuleError> {
        let added = write_rules(&self.rules).add(draft)?;
        self.sync_lifecycle();
        Ok(added)
    }

    pub fn remove_rule(&mut self, rule_id: &str) -> bool {
        let removed = write_rules(&self.rules).remove(rule_id);
        self.sync_lifecycle();
        removed
    }

    pub fn delete_alert(&self, alert_id: &str) {
        let next = reconciler::delete(&self.alerts(), alert_id);
        self.alerts_tx.send_replace(next.into());
    }

    pub fn mark_read(&self, alert_id: &str) {
        let next = reconciler::mark_read(&self.alerts(), alert_id);
        self.alerts_tx.send_replace(next.into());
    }

    pub fn mark_all_read(&self) {
        let next = reconciler::mark_all_read(&self.alerts());
        self.alerts_tx.send_replace(next.into());
    }

    /// Polling follows rule-list emptiness: the last removal stops the
    /// timer, the first add after that restarts it.
    fn sync_lifecycle(&mut self) {
        if read_rules(&self.rules).is_empty() {
            self.stop();
        } else if self.task.is_none() {
            self.start();
        }
    }
}

impl Drop for AlertWatcher {
    fn drop(&mut self) {
        self.stop();
    }
}

fn read_rules(rules: &RwLock<RuleSet>) -> std::sync::RwLockReadGuard<'_, RuleSet> {
    rules.read().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn write_rules(rules: &RwLock<RuleSet>) -> std::sync::RwLockWriteGuard<'_, RuleSet> {
    rules
        .write()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// One polling cycle. Every failure inside folds into the fallback path;
/// nothing escapes to the caller.
async fn run_tick(ctx: &TickCtx) {
    let timeout = Duration::from_millis(ctx.config.fetch_timeout_ms);
    let snapshot = match tokio::time::timeout(timeout, ctx.source.fetch(&ctx.channel_id)).await {
        Ok(Ok(snapshot)) => snapshot,
        Ok(Err(e)) => {
            tracing::warn!(error = %e, "metric fetch failed, using simulated snapshot");
            simulated_snapshot()
        }
        Err(_) => {
            tracing::warn!(timeout_ms = ctx.config.fetch_timeout_ms, "metric fetch timed out");
            simulated_snapshot()
        }
    };

    let now = Utc::now();
    let candidates = {
        let rules = ctx
            .rules
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        evaluator::evaluate(&snapshot, rules.rules(), ctx.detector.as_ref(), now)
    };
    let candidate_count = candidates.len();

    let current: Arc<[Alert]> = ctx.alerts.borrow().clone();
    let fresh = gate::filter(candidates, &current, ctx.config.cooldown_ms);
    let suppressed = candidate_count - fresh.len();

    let server_alerts = match &ctx.backend {
        Some(backend) => match backend.fetch_alerts(&ctx.channel_id).await {
            Ok(alerts) => alerts,
            Err(e) => {
                tracing::debug!(error = %e, "backend alert fetch failed, merging local only");
                Vec::new()
            }
        },
        None => Vec::new(),
    };

    let mut local: Vec<Alert> = current.to_vec();
    local.extend(fresh.into_iter().map(Candidate::into_alert));
    let merged = reconciler::merge(&server_alerts, &local, ctx.config.max_alerts);

    tracing::debug!(
        fallback = snapshot.is_fallback,
        candidates = candidate_count,
        suppressed,
        published = merged.len(),
        "tick complete"
    );

    if merged[..] != current[..] {
        ctx.alerts.send_replace(merged.into());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use pulsewatch_common::types::MetricSnapshot;
    use crate::source::SourceError;

    struct FixedSource(MetricSnapshot);

    #[async_trait]
    impl MetricSource for FixedSource {
        async fn fetch(&self, _channel_id: &str) -> Result<MetricSnapshot, SourceError> {
            Ok(self.0)
        }
    }

    struct FailingSource;

    #[async_trait]
    impl MetricSource for FailingSource {
        async fn fetch(&self, _channel_id: &str) -> Result<MetricSnapshot, SourceError> {
            Err(SourceError::Transport("connection refused".into()))
        }
    }

    struct Never;

    impl SurgeDetector for Never {
        fn is_surging(&self, _: &MetricSnapshot) -> bool {
            false
        }
    }

    fn hot_snapshot() -> MetricSnapshot {
        MetricSnapshot {
            growth_rate: 50.0,
            engagement_rate: 9.0,
            subscribers: 100,
            views: 1000,
            is_fallback: false,
        }
    }

    fn fast_config() -> WatcherConfig {
        WatcherConfig {
            check_interval_ms: 25,
            cooldown_ms: 300_000,
            max_alerts: 50,
            fetch_timeout_ms: 1_000,
            metrics_url: None,
            backend_url: None,
        }
    }

    fn watcher_with(source: Arc<dyn MetricSource>) -> AlertWatcher {
        AlertWatcher::with_parts(fast_config(), "chan-1", source, None, Arc::new(Never))
    }

    #[tokio::test]
    async fn first_tick_fires_without_waiting_a_full_interval() {
        let mut config = fast_config();
        config.check_interval_ms = 60_000;
        let mut watcher = AlertWatcher::with_parts(
            config,
            "chan-1",
            Arc::new(FixedSource(hot_snapshot())),
            None,
            Arc::new(Never),
        );
        let mut rx = watcher.subscribe();
        watcher.start();

        tokio::time::timeout(Duration::from_secs(2), rx.changed())
            .await
            .expect("first tick should publish promptly")
            .unwrap();
        let alerts = rx.borrow_and_update().clone();
        assert!(!alerts.is_empty());
        assert!(alerts.iter().any(|a| a.rule_id == "default-growth"));
    }

    #[tokio::test]
    async fn cooldown_holds_across_consecutive_ticks() {
        let mut watcher = watcher_with(Arc::new(FixedSource(hot_snapshot())));
        let mut rx = watcher.subscribe();
        watcher.start();

        tokio::time::timeout(Duration::from_secs(2), rx.changed())
            .await
            .expect("first publish")
            .unwrap();
        let first = rx.borrow_and_update().clone();

        // Several intervals later the same conditions are still true, but
        // every repeat firing sits inside the cooldown window.
        tokio::time::sleep(Duration::from_millis(150)).await;
        let later = watcher.alerts();
        assert_eq!(first.len(), later.len());
        watcher.stop();
    }

    #[tokio::test]
    async fn failing_source_falls_back_and_still_evaluates() {
        let mut watcher = watcher_with(Arc::new(FailingSource));
        let mut rx = watcher.subscribe();
        watcher.start();

        // The fallback snapshot keeps ticks alive; the subscriber milestone
        // rule (>= 1000) can fire against simulated values, but whether any
        // rule fires depends on the draw. Wait for a publish or until a few
        // intervals pass, then only assert the watcher is still polling.
        let _ = tokio::time::timeout(Duration::from_millis(300), rx.changed()).await;
        assert!(watcher.is_polling());
        for alert in watcher.alerts().iter() {
            assert!(!alert.id.is_empty());
        }
        watcher.stop();
    }

    #[tokio::test]
    async fn empty_rule_set_stays_idle() {
        let mut watcher = watcher_with(Arc::new(FixedSource(hot_snapshot())));
        while let Some(rule) = watcher.rules().first().map(|r| r.id.clone()) {
            watcher.remove_rule(&rule);
        }
        watcher.start();
        assert!(!watcher.is_polling());
    }

    #[tokio::test]
    async fn removing_the_last_rule_stops_polling() {
        let mut watcher = watcher_with(Arc::new(FixedSource(hot_snapshot())));
        watcher.start();
        assert!(watcher.is_polling());

        for rule in watcher.rules() {
            watcher.remove_rule(&rule.id);
        }
        assert!(!watcher.is_polling());

        let add = watcher.add_rule(NewRule {
            name: "Back Again".into(),
            kind: pulsewatch_common::types::MetricKind::Growth,
            condition: pulsewatch_common::types::Condition::GreaterThan,
            threshold: 10.0,
            color: String::new(),
            icon: String::new(),
        });
        assert!(add.is_ok());
        assert!(watcher.is_polling());
        watcher.stop();
    }

    #[tokio::test]
    async fn stop_halts_publication() {
        let mut watcher = watcher_with(Arc::new(FixedSource(hot_snapshot())));
        let mut rx = watcher.subscribe();
        watcher.start();
        tokio::time::timeout(Duration::from_secs(2), rx.changed())
            .await
            .expect("first publish")
            .unwrap();

        watcher.stop();
        assert!(!watcher.is_polling());
        rx.borrow_and_update();

        // Delete everything so a tick, if one were still alive, would
        // repopulate and flip the watch channel.
        for alert in watcher.alerts().iter() {
            watcher.delete_alert(&alert.id);
        }
        rx.borrow_and_update();
        tokio::time::sleep(Duration::from_millis(120)).await;
        assert!(!rx.has_changed().unwrap());
    }

    #[tokio::test]
    async fn read_state_ops_publish_copy_on_write() {
        let mut watcher = watcher_with(Arc::new(FixedSource(hot_snapshot())));
        let mut rx = watcher.subscribe();
        watcher.start();
        tokio::time::timeout(Duration::from_secs(2), rx.changed())
            .await
            .expect("first publish")
            .unwrap();
        watcher.stop();

        let before = watcher.alerts();
        let unread = watcher.unread_count();
        assert!(unread > 0);

        watcher.mark_all_read();
        assert_eq!(watcher.unread_count(), 0);
        // The pre-publish value is untouched.
        assert!(before.iter().all(|a| !a.read));

        let victim = watcher.alerts()[0].id.clone();
        watcher.delete_alert(&victim);
        assert!(watcher.alerts().iter().all(|a| a.id != victim));
    }
}
