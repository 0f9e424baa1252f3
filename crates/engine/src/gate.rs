use chrono::Duration;

use pulsewatch_common::types::Alert;

use crate::evaluator::Candidate;

/// Drop candidates whose rule already fired inside the cooldown window.
///
/// A candidate is suppressed when any existing alert shares its `rule_id`
/// and sits strictly less than `cooldown_ms` before the candidate's
/// generation time. `cooldown_ms == 0` suppresses nothing. Deltas are
/// wall-clock: a system clock jump (sleep/resume) can re-fire early or
/// suppress late, which is accepted.
pub fn filter(candidates: Vec<Candidate>, existing: &[Alert], cooldown_ms: i64) -> Vec<Candidate> {
    if cooldown_ms <= 0 {
        return candidates;
    }
    let window = Duration::milliseconds(cooldown_ms);

    candidates
        .into_iter()
        .filter(|candidate| {
            let suppressed = existing.iter().any(|alert| {
                alert.rule_id == candidate.rule_id
                    && candidate.triggered_at - alert.timestamp < window
            });
            if suppressed {
                tracing::debug!(rule_id = %candidate.rule_id, "candidate suppressed (cooldown)");
            }
            !suppressed
        })
        .collect()
}
