//! Director-level report calculations.

use serde::Serialize;

use crate::status::FindingStatus;

/// Findings that count as resolved for closure-rate purposes: closed ones,
/// and archived ones that were closed first. A finding archived after the
/// witness disagreed was never remediated.
pub fn is_resolved(status: FindingStatus, was_closed: bool) -> bool {
    match status {
        FindingStatus::Closed => true,
        FindingStatus::Archived => was_closed,
        _ => false,
    }
}

/// Percentage of findings resolved, rounded to one decimal. `0.0` when there are none.
pub fn closure_rate(resolved: i64, total: i64) -> f64 {
    if total <= 0 {
        return 0.0;
    }
    let rate = resolved as f64 * 100.0 / total as f64;
    (rate * 10.0).round() / 10.0
}

/// A `(label, count)` pair in a report breakdown.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CountBy {
    pub label: String,
    pub count: i64,
}

/// Expand sparse `(key, count)` rows into one entry per known label, in
/// label order, filling missing labels with zero.
pub fn fill_counts<K, F>(labels: &[K], rows: &[(K, i64)], name: F) -> Vec<CountBy>
where
    K: PartialEq + Copy,
    F: Fn(K) -> String,
{
    labels
        .iter()
        .map(|label| CountBy {
            label: name(*label),
            count: rows
                .iter()
                .filter(|(k, _)| k == label)
                .map(|(_, c)| *c)
                .sum(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::ActionStatus;

    #[test]
    fn closure_rate_handles_empty_and_rounds() {
        assert_eq!(closure_rate(0, 0), 0.0);
        assert_eq!(closure_rate(1, 3), 33.3);
        assert_eq!(closure_rate(3, 3), 100.0);
    }

    #[test]
    fn resolved_statuses() {
        assert!(is_resolved(FindingStatus::Closed, true));
        assert!(is_resolved(FindingStatus::Archived, true));
        assert!(!is_resolved(FindingStatus::Received, false));
    }

    #[test]
    fn archived_without_closure_is_not_resolved() {
        assert!(!is_resolved(FindingStatus::Archived, false));
        assert!(!is_resolved(FindingStatus::WitnessDisagreed, false));
    }

    #[test]
    fn fill_counts_includes_zero_rows() {
        let rows = [(ActionStatus::Open, 4), (ActionStatus::Approved, 2)];
        let counts = fill_counts(ActionStatus::ALL, &rows, |s| s.to_string());
        assert_eq!(counts.len(), ActionStatus::ALL.len());
        assert_eq!(counts[0], CountBy { label: "Open".into(), count: 4 });
        assert_eq!(counts[1].count, 0);
        assert_eq!(counts[2], CountBy { label: "Approved".into(), count: 2 });
    }
}
