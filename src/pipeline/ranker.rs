//! Leaderboard ranking

use super::types::{ActivityEntry, Leaderboard};

/// Default number of authors kept on the leaderboard
pub const DEFAULT_LIMIT: usize = 100;

/// Sort by count descending and keep the first `limit` entries
///
/// The sort is stable, so equal counts keep their input (first-seen) order.
pub fn rank(mut entries: Vec<ActivityEntry>, limit: usize) -> Leaderboard {
    entries.sort_by(|a, b| b.count.cmp(&a.count));
    entries.truncate(limit);
    Leaderboard::from_ranked(entries)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(author_id: u64, count: u64) -> ActivityEntry {
        ActivityEntry {
            author_id,
            display_name: format!("user{}", author_id),
            avatar_url: String::new(),
            count,
        }
    }

    #[test]
    fn test_sorted_descending() {
        let board = rank(vec![entry(1, 2), entry(2, 9), entry(3, 5)], 10);
        let counts: Vec<u64> = board.entries().iter().map(|e| e.count).collect();
        assert_eq!(counts, vec![9, 5, 2]);
    }

    #[test]
    fn test_ties_keep_input_order() {
        let board = rank(vec![entry(4, 1), entry(2, 3), entry(9, 3), entry(1, 3)], 10);
        let ids: Vec<u64> = board.entries().iter().map(|e| e.author_id).collect();
        assert_eq!(ids, vec![2, 9, 1, 4]);
    }

    #[test]
    fn test_truncates_to_top_limit() {
        let entries: Vec<ActivityEntry> = (1..=250).map(|id| entry(id, id % 17)).collect();
        let board = rank(entries.clone(), DEFAULT_LIMIT);

        assert_eq!(board.len(), DEFAULT_LIMIT);
        for pair in board.entries().windows(2) {
            assert!(pair[0].count >= pair[1].count);
        }

        // Nothing left out beats the last kept entry
        let cutoff = board.entries().last().unwrap().count;
        let kept: std::collections::HashSet<u64> =
            board.entries().iter().map(|e| e.author_id).collect();
        assert!(entries
            .iter()
            .filter(|e| !kept.contains(&e.author_id))
            .all(|e| e.count <= cutoff));
    }

    #[test]
    fn test_ranking_is_deterministic() {
        let entries: Vec<ActivityEntry> = (1..=50).map(|id| entry(id, id % 4)).collect();
        assert_eq!(rank(entries.clone(), 20), rank(entries, 20));
    }

    #[test]
    fn test_empty_and_zero_limit() {
        assert!(rank(Vec::new(), 10).is_empty());
        assert!(rank(vec![entry(1, 1)], 0).is_empty());
    }
}
