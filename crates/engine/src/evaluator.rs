use chrono::{DateTime, Utc};
use rand::Rng;

use pulsewatch_common::clock::alert_id;
use pulsewatch_common::types::{Alert, AlertRule, Condition, MetricKind, MetricSnapshot};

/// An alert produced by evaluation, before the cooldown gate has seen it.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub rule_id: String,
    pub title: String,
    pub message: String,
    pub value: f64,
    pub triggered_at: DateTime<Utc>,
}

impl Candidate {
    pub fn into_alert(self) -> Alert {
        Alert {
            id: alert_id(&self.rule_id, self.triggered_at),
            rule_id: self.rule_id,
            title: self.title,
            message: self.message,
            timestamp: self.triggered_at,
            read: false,
        }
    }
}

/// Signal for the `views`/`surge` rule. The production implementation is a
/// stochastic stand-in; a real statistical surge test slots in here without
/// touching the evaluation contract.
pub trait SurgeDetector: Send + Sync {
    fn is_surging(&self, snapshot: &MetricSnapshot) -> bool;
}

/// Placeholder surge signal: fires on roughly 30% of ticks. TODO: replace
/// with a rolling-baseline deviation test once the backend exposes hourly
/// view series.
pub struct RandomSurge {
    probability: f64,
}

impl RandomSurge {
    pub fn new(probability: f64) -> Self {
        Self {
            probability: probability.clamp(0.0, 1.0),
        }
    }
}

impl Default for RandomSurge {
    fn default() -> Self {
        Self::new(0.3)
    }
}

impl SurgeDetector for RandomSurge {
    fn is_surging(&self, _snapshot: &MetricSnapshot) -> bool {
        rand::thread_rng().gen_bool(self.probability)
    }
}

/// Evaluate one snapshot against the rule set. Pure apart from the injected
/// surge signal: disabled rules are skipped, each triggering rule yields
/// exactly one candidate, and a (kind, condition) pairing outside the table
/// below never fires. The open default arm keeps the rule schema extensible
/// without an exhaustive-match failure.
pub fn evaluate(
    snapshot: &MetricSnapshot,
    rules: &[AlertRule],
    detector: &dyn SurgeDetector,
    now: DateTime<Utc>,
) -> Vec<Candidate> {
    let mut candidates = Vec::new();

    for rule in rules.iter().filter(|r| r.enabled) {
        let fired = match (rule.kind, rule.condition) {
            (MetricKind::Growth, Condition::GreaterThan)
                if snapshot.growth_rate > rule.threshold =>
            {
                Some((
                    snapshot.growth_rate,
                    format!(
                        "Growth rate reached {:.1}% (threshold: {}%)",
                        snapshot.growth_rate, rule.threshold
                    ),
                ))
            }
            (MetricKind::Engagement, Condition::LessThan)
                if snapshot.engagement_rate < rule.threshold =>
            {
                Some((
                    snapshot.engagement_rate,
                    format!(
                        "Engagement rate dropped to {:.1}% (threshold: {}%)",
                        snapshot.engagement_rate, rule.threshold
                    ),
                ))
            }
            (MetricKind::Subscribers, Condition::Milestone)
                if snapshot.subscribers as f64 >= rule.threshold =>
            {
                Some((
                    snapshot.subscribers as f64,
                    format!("Reached {} subscribers!", snapshot.subscribers),
                ))
            }
            (MetricKind::Views, Condition::Surge) if detector.is_surging(snapshot) => Some((
                snapshot.views as f64,
                format!("View surge detected: {} views in last hour", snapshot.views),
            )),
            _ => None,
        };

        if let Some((value, message)) = fired {
            candidates.push(Candidate {
                rule_id: rule.id.clone(),
                title: rule.name.clone(),
                message,
                value,
                triggered_at: now,
            });
        }
    }

    candidates
}
