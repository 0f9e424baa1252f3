use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};

static RULE_SEQ: AtomicU64 = AtomicU64::new(0);

pub fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

/// Deterministic alert id. A rule fires at most once per tick, so the
/// (rule, timestamp) pair is collision-free.
pub fn alert_id(rule_id: &str, timestamp: DateTime<Utc>) -> String {
    format!("{rule_id}-{}", timestamp.timestamp_millis())
}

/// Fresh rule id derived from the clock, with an atomic counter so two adds
/// landing in the same millisecond still get distinct ids.
pub fn next_rule_id() -> String {
    let seq = RULE_SEQ.fetch_add(1, Ordering::SeqCst);
    format!("rule-{}-{seq}", now_ms())
}
