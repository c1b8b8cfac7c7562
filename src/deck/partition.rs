//! Session capacity partitioning
//!
//! Failed items come first, then overdue ones; together they are capped at
//! the session capacity and the rest is deferred. An overflow of exactly one
//! item is folded back so a session never ends one item short of clearing
//! the backlog. Pending items only take capacity that is left over.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Partition<T> {
    pub admitted: Vec<T>,
    /// Deferred to a later session
    pub overflow: Vec<T>,
}

pub fn partition<T: Clone>(failed: &[T], overdue: &[T], pending: &[T], cap: usize) -> Partition<T> {
    let mut admitted: Vec<T> = failed.iter().chain(overdue).cloned().collect();

    let mut overflow = if admitted.len() > cap {
        admitted.split_off(cap)
    } else {
        Vec::new()
    };

    if overflow.len() == 1 {
        admitted.append(&mut overflow);
    }

    let spare = cap.saturating_sub(admitted.len());
    admitted.extend(pending.iter().take(spare).cloned());

    Partition { admitted, overflow }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overflow_is_deferred() {
        let p = partition(&["a", "b"], &["c", "d", "e"], &[], 3);
        assert_eq!(p.admitted, vec!["a", "b", "c"]);
        assert_eq!(p.overflow, vec!["d", "e"]);
    }

    #[test]
    fn test_singleton_overflow_folds_back() {
        let p = partition(&["a", "b"], &["c", "d", "e"], &[], 4);
        assert_eq!(p.admitted, vec!["a", "b", "c", "d", "e"]);
        assert!(p.overflow.is_empty());
    }

    #[test]
    fn test_under_capacity_keeps_order() {
        let p = partition(&["b", "a"], &["d", "c"], &[], 10);
        assert_eq!(p.admitted, vec!["b", "a", "d", "c"]);
        assert!(p.overflow.is_empty());
    }

    #[test]
    fn test_pending_fills_spare_capacity() {
        let p = partition(&["a"], &["b"], &["x", "y", "z"], 4);
        assert_eq!(p.admitted, vec!["a", "b", "x", "y"]);
        assert!(p.overflow.is_empty());

        let p = partition(&["a", "b"], &["c", "d", "e"], &["x"], 4);
        assert_eq!(p.admitted, vec!["a", "b", "c", "d", "e"]);
    }

    #[test]
    fn test_zero_capacity() {
        let p = partition(&["a", "b"], &["c"], &["x"], 0);
        assert!(p.admitted.is_empty());
        assert_eq!(p.overflow, vec!["a", "b", "c"]);

        let p = partition(&["a"], &[], &[], 0);
        assert_eq!(p.admitted, vec!["a"]);
        assert!(p.overflow.is_empty());
    }
}
