//! Cursor-window selection over a time-ordered candidate set.
//!
//! Pagination boundaries are timestamp cursors, not offsets: offsets shift
//! under concurrent writes, timestamps do not. Instead of a plain LIMIT the
//! paginator peeks one row past the limit to find the boundary timestamp and
//! cuts the window there, so consecutive pages driven by `before`/`after`
//! cursors neither skip nor duplicate items.
//!
//! Tombstones participate in the candidate set (their timestamps keep old
//! boundaries stable) but are never part of a result set.

use chrono::{DateTime, Utc};
use std::cmp::Ordering;

/// One pagination candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub url: String,
    pub published: Option<DateTime<Utc>>,
    pub deleted: bool,
}

impl Candidate {
    pub fn new(url: impl Into<String>, published: Option<DateTime<Utc>>, deleted: bool) -> Self {
        Self {
            url: url.into(),
            published,
            deleted,
        }
    }
}

/// Descending by published, nulls last, URL as the deterministic tie-break.
fn newest_first(a: &Candidate, b: &Candidate) -> Ordering {
    match (a.published, b.published) {
        (Some(pa), Some(pb)) => pb.cmp(&pa).then_with(|| a.url.cmp(&b.url)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.url.cmp(&b.url),
    }
}

/// Select one page of candidate URLs, newest first.
///
/// With `before` set, the window is `published < before`, floored at the
/// timestamp of the row one past the limit among non-deleted candidates;
/// rows passing the `after` bound are kept regardless of the floor when
/// both cursors are present. With only `after` set the selection is the
/// ascending mirror image. With neither, the first `limit` non-deleted
/// candidates win. A missing probe-ahead row means no boundary, not an
/// error.
pub fn page(
    mut candidates: Vec<Candidate>,
    limit: usize,
    before: Option<DateTime<Utc>>,
    after: Option<DateTime<Utc>>,
) -> Vec<String> {
    candidates.sort_by(newest_first);

    match (before, after) {
        (Some(before), after) => {
            // Null timestamps fail the comparison and fall out of the window.
            let window: Vec<&Candidate> = candidates
                .iter()
                .filter(|c| c.published.is_some_and(|p| p < before))
                .collect();

            let floor = window
                .iter()
                .filter(|c| !c.deleted)
                .nth(limit)
                .and_then(|c| c.published);

            window
                .iter()
                .filter(|c| !c.deleted)
                .filter(|c| match floor {
                    None => true,
                    Some(floor) => {
                        let above_floor = c.published.is_some_and(|p| p > floor);
                        let passes_after =
                            after.is_some_and(|a| c.published.is_some_and(|p| p > a));
                        above_floor || passes_after
                    }
                })
                .map(|c| c.url.clone())
                .collect()
        }
        (None, Some(after)) => {
            // Scan forward (ascending) from the cursor to find the ceiling.
            let mut window: Vec<&Candidate> = candidates
                .iter()
                .filter(|c| c.published.is_some_and(|p| p > after))
                .collect();
            window.reverse();

            let ceiling = window
                .iter()
                .filter(|c| !c.deleted)
                .nth(limit)
                .and_then(|c| c.published);

            let mut urls: Vec<String> = window
                .iter()
                .filter(|c| !c.deleted)
                .filter(|c| match ceiling {
                    None => true,
                    Some(ceiling) => c.published.is_some_and(|p| p < ceiling),
                })
                .map(|c| c.url.clone())
                .collect();
            urls.reverse();
            urls
        }
        (None, None) => candidates
            .iter()
            .filter(|c| !c.deleted)
            .take(limit)
            .map(|c| c.url.clone())
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    /// Candidate at day `n` of a fixed month, url derived from `n`.
    fn at(n: u32, deleted: bool) -> Candidate {
        Candidate::new(
            format!("https://a.example/{n}"),
            Some(Utc.with_ymd_and_hms(2024, 3, n, 12, 0, 0).unwrap()),
            deleted,
        )
    }

    fn ts(n: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, n, 12, 0, 0).unwrap()
    }

    fn urls(ns: &[u32]) -> Vec<String> {
        ns.iter().map(|n| format!("https://a.example/{n}")).collect()
    }

    #[test]
    fn test_first_page_newest_first() {
        let candidates = (1..=10).map(|n| at(n, false)).collect();
        assert_eq!(page(candidates, 3, None, None), urls(&[10, 9, 8]));
    }

    #[test]
    fn test_before_cursor_pages_without_gap_or_overlap() {
        let candidates: Vec<_> = (1..=10).map(|n| at(n, false)).collect();

        let first = page(candidates.clone(), 3, None, None);
        assert_eq!(first, urls(&[10, 9, 8]));

        // Cursor = timestamp of the oldest item on the first page
        let second = page(candidates.clone(), 3, Some(ts(8)), None);
        assert_eq!(second, urls(&[7, 6, 5]));

        let third = page(candidates, 3, Some(ts(5)), None);
        assert_eq!(third, urls(&[4, 3, 2]));
    }

    #[test]
    fn test_after_cursor_is_ascending_mirror() {
        let candidates: Vec<_> = (1..=10).map(|n| at(n, false)).collect();

        // The 3 oldest items newer than day 2, still returned newest first
        let page_up = page(candidates, 3, None, Some(ts(2)));
        assert_eq!(page_up, urls(&[5, 4, 3]));
    }

    #[test]
    fn test_tombstones_shape_boundary_but_not_results() {
        // Days 10..1; day 8 is a tombstone.
        let candidates: Vec<_> = (1..=10).map(|n| at(n, n == 8)).collect();

        // Tombstone drops from the result and the window extends one deeper,
        // because the floor ranks over non-deleted candidates only.
        let first = page(candidates.clone(), 3, Some(ts(11)), None);
        assert_eq!(first, urls(&[10, 9, 7]));

        let second = page(candidates, 3, Some(ts(7)), None);
        assert_eq!(second, urls(&[6, 5, 4]));
    }

    #[test]
    fn test_short_tail_has_no_boundary() {
        let candidates: Vec<_> = (1..=4).map(|n| at(n, false)).collect();
        // Only 2 candidates older than day 3 and no probe-ahead row: no
        // boundary, both returned.
        assert_eq!(page(candidates, 3, Some(ts(3)), None), urls(&[2, 1]));
    }

    #[test]
    fn test_nulls_sort_last_and_fail_cursor_windows() {
        let mut candidates: Vec<_> = (1..=2).map(|n| at(n, false)).collect();
        candidates.push(Candidate::new("https://a.example/undated", None, false));

        // Unbounded page includes the undated item at the end
        assert_eq!(
            page(candidates.clone(), 5, None, None),
            vec![
                "https://a.example/2".to_string(),
                "https://a.example/1".to_string(),
                "https://a.example/undated".to_string(),
            ]
        );

        // Cursor windows exclude it: null fails every comparison
        assert_eq!(page(candidates.clone(), 5, Some(ts(5)), None), urls(&[2, 1]));
        let dawn = Utc.with_ymd_and_hms(2024, 2, 28, 0, 0, 0).unwrap();
        assert_eq!(page(candidates, 5, None, Some(dawn)), urls(&[2, 1]));
    }

    #[test]
    fn test_ties_break_by_url() {
        let same = ts(5);
        let candidates = vec![
            Candidate::new("https://a.example/b", Some(same), false),
            Candidate::new("https://a.example/a", Some(same), false),
        ];
        assert_eq!(
            page(candidates, 2, None, None),
            vec!["https://a.example/a".to_string(), "https://a.example/b".to_string()]
        );
    }

    #[test]
    fn test_both_cursors_keep_items_passing_after() {
        let candidates: Vec<_> = (1..=10).map(|n| at(n, false)).collect();
        // Floor alone would cut at day 5, but the after bound keeps
        // everything newer than day 3.
        let window = page(candidates, 3, Some(ts(9)), Some(ts(3)));
        assert_eq!(window, urls(&[8, 7, 6, 5, 4]));
    }
}
