//! Order-preserving deduplication

use std::collections::HashSet;
use std::hash::Hash;

/// Remove later duplicates, keeping each item at its first position.
///
/// Survivors keep their relative order, and applying this twice is the same
/// as applying it once.
pub fn dedup_first<T>(items: Vec<T>) -> Vec<T>
where
    T: Eq + Hash + Clone,
{
    let mut seen = HashSet::with_capacity(items.len());
    items
        .into_iter()
        .filter(|item| seen.insert(item.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keeps_first_occurrence() {
        let items = vec!["b", "a", "b", "c", "a"];
        assert_eq!(dedup_first(items), vec!["b", "a", "c"]);
    }

    #[test]
    fn test_idempotent() {
        let once = dedup_first(vec![3, 1, 3, 2, 1, 1]);
        let twice = dedup_first(once.clone());
        assert_eq!(once, vec![3, 1, 2]);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_empty() {
        assert!(dedup_first(Vec::<String>::new()).is_empty());
    }
}
