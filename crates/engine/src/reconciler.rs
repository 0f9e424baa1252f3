use std::collections::HashSet;

use pulsewatch_common::types::Alert;

/// Merge server-known and locally-known alerts into one collection.
///
/// Alerts are unique by id and the server version wins a conflict (the
/// server is authoritative once it has observed an alert, including its
/// read flag). Local alerts the server has not seen yet are retained. The
/// result is most-recent-first, ties broken by id so the order is total,
/// and truncated to `max_alerts`. Merging the same inputs twice yields the
/// same collection.
pub fn merge(server: &[Alert], local: &[Alert], max_alerts: usize) -> Vec<Alert> {
    let server_ids: HashSet<&str> = server.iter().map(|a| a.id.as_str()).collect();

    let mut merged: Vec<Alert> = Vec::with_capacity(server.len() + local.len());
    merged.extend(server.iter().cloned());
    merged.extend(
        local
            .iter()
            .filter(|a| !server_ids.contains(a.id.as_str()))
            .cloned(),
    );

    merged.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then_with(|| b.id.cmp(&a.id)));
    merged.truncate(max_alerts);
    merged
}

/// Remove one alert from the working set, whatever its origin. Client-side
/// only; propagating the deletion to the backend is a collaborator concern.
pub fn delete(alerts: &[Alert], alert_id: &str) -> Vec<Alert> {
    alerts
        .iter()
        .filter(|a| a.id != alert_id)
        .cloned()
        .collect()
}

pub fn mark_read(alerts: &[Alert], alert_id: &str) -> Vec<Alert> {
    alerts
        .iter()
        .map(|a| {
            if a.id == alert_id {
                let mut a = a.clone();
                a.read = true;
                a
            } else {
                a.clone()
            }
        })
        .collect()
}

pub fn mark_all_read(alerts: &[Alert]) -> Vec<Alert> {
    alerts
        .iter()
        .map(|a| {
            let mut a = a.clone();
            a.read = true;
            a
        })
        .collect()
}

/// Derived, never stored.
pub fn unread_count(alerts: &[Alert]) -> usize {
    alerts.iter().filter(|a| !a.read).count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn alert(id: &str, ms: i64, read: bool) -> Alert {
        Alert {
            id: id.into(),
            rule_id: "r-1".into(),
            title: "t".into(),
            message: "m".into(),
            timestamp: Utc.timestamp_millis_opt(ms).unwrap(),
            read,
        }
    }

    #[test]
    fn server_version_wins_on_shared_id() {
        let server = vec![alert("a1", 1000, true)];
        let local = vec![alert("a1", 1000, false)];
        let merged = merge(&server, &local, 50);
        assert_eq!(merged.len(), 1);
        assert!(merged[0].read);
    }

    #[test]
    fn local_only_alerts_are_retained() {
        let server = vec![alert("a1", 2000, false)];
        let local = vec![alert("a2", 1000, false)];
        let merged = merge(&server, &local, 50);
        let ids: Vec<_> = merged.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["a1", "a2"]);
    }

    #[test]
    fn merged_collection_is_most_recent_first() {
        let server = vec![alert("old", 1000, false)];
        let local = vec![alert("new", 3000, false), alert("mid", 2000, false)];
        let merged = merge(&server, &local, 50);
        let ids: Vec<_> = merged.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["new", "mid", "old"]);
    }

    #[test]
    fn merge_is_idempotent() {
        let server = vec![alert("a1", 5000, true), alert("a2", 4000, false)];
        let local: Vec<Alert> = (0..10).map(|i| alert(&format!("l{i}"), i, false)).collect();
        let once = merge(&server, &local, 8);
        let twice = merge(&server, &once, 8);
        assert_eq!(once, twice);
    }

    #[test]
    fn overflow_keeps_the_most_recent_cap() {
        let local: Vec<Alert> = (0..60)
            .map(|i| alert(&format!("a{i}"), i * 1000, false))
            .collect();
        let merged = merge(&[], &local, 50);
        assert_eq!(merged.len(), 50);
        assert_eq!(merged[0].id, "a59");
        assert_eq!(merged[49].id, "a10");
    }

    #[test]
    fn equal_timestamps_order_deterministically() {
        let a = vec![alert("a1", 1000, false), alert("a2", 1000, false)];
        let b = vec![alert("a2", 1000, false), alert("a1", 1000, false)];
        assert_eq!(merge(&a, &[], 50), merge(&b, &[], 50));
    }

    #[test]
    fn delete_removes_regardless_of_origin() {
        let alerts = vec![alert("a1", 1000, false), alert("a2", 2000, false)];
        let out = delete(&alerts, "a1");
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].id, "a2");
        assert_eq!(delete(&out, "missing").len(), 1);
    }

    #[test]
    fn read_state_and_unread_count() {
        let alerts = vec![alert("a1", 1000, false), alert("a2", 2000, false)];
        assert_eq!(unread_count(&alerts), 2);

        let one = mark_read(&alerts, "a1");
        assert_eq!(unread_count(&one), 1);
        assert!(one.iter().find(|a| a.id == "a1").unwrap().read);

        let all = mark_all_read(&alerts);
        assert_eq!(unread_count(&all), 0);
    }
}
