use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Which channel metric a rule watches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    Growth,
    Engagement,
    Subscribers,
    Views,
}

impl std::fmt::Display for MetricKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Growth => write!(f, "growth"),
            Self::Engagement => write!(f, "engagement"),
            Self::Subscribers => write!(f, "subscribers"),
            Self::Views => write!(f, "views"),
        }
    }
}

impl std::str::FromStr for MetricKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "growth" => Ok(Self::Growth),
            "engagement" => Ok(Self::Engagement),
            "subscribers" => Ok(Self::Subscribers),
            "views" => Ok(Self::Views),
            _ => Err(format!("unknown metric kind: {s}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Condition {
    GreaterThan,
    LessThan,
    Milestone,
    Surge,
}

impl std::fmt::Display for Condition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::GreaterThan => write!(f, "greater_than"),
            Self::LessThan => write!(f, "less_than"),
            Self::Milestone => write!(f, "milestone"),
            Self::Surge => write!(f, "surge"),
        }
    }
}

impl std::str::FromStr for Condition {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "greater_than" | "gt" => Ok(Self::GreaterThan),
            "less_than" | "lt" => Ok(Self::LessThan),
            "milestone" => Ok(Self::Milestone),
            "surge" => Ok(Self::Surge),
            _ => Err(format!("unknown condition: {s}")),
        }
    }
}

/// A configurable alert rule. `color` and `icon` are presentation metadata
/// carried through for the dashboard; the engine never interprets them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertRule {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: MetricKind,
    pub condition: Condition,
    pub threshold: f64,
    pub enabled: bool,
    #[serde(default)]
    pub color: String,
    #[serde(default)]
    pub icon: String,
}

/// A fired alert. `id` is `"{rule_id}-{timestamp_ms}"`, which is unique
/// because a rule yields at most one alert per polling tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    pub id: String,
    pub rule_id: String,
    pub title: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub read: bool,
}

/// One sample of channel metrics. Produced fresh on every tick and never
/// retained past it; only the alerts derived from it persist.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricSnapshot {
    pub growth_rate: f64,
    pub engagement_rate: f64,
    pub subscribers: u64,
    pub views: u64,
    #[serde(default)]
    pub is_fallback: bool,
}
