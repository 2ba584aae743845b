//! Test an interval-merging set built on the tree.
//!
//! The set stores each maximal half-open interval `[start, end)` as the entry
//! `start -> end` and touches the tree only through `insert`, `find_left`,
//! `remove` by key and chain iteration.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::btree::BPlusTree;
use crate::config::TreeConfig;

struct IntervalSet {
    bounds: BPlusTree<u64, u64>,
}

impl IntervalSet {
    fn new() -> Self {
        Self {
            bounds: BPlusTree::with_config(TreeConfig::new(4).expect("valid fanout")),
        }
    }

    /// Add `[start, end)`, merging with every interval it touches or overlaps.
    fn add(&mut self, mut start: u64, mut end: u64) {
        if start >= end {
            return;
        }
        let floor = self
            .bounds
            .entry(self.bounds.find_left(&start))
            .map(|(&s, &e)| (s, e));
        if let Some((s, e)) = floor.filter(|&(_, e)| e >= start) {
            start = s;
            end = end.max(e);
            self.bounds.remove(&s);
        }
        loop {
            let Some((&s, &e)) = self.bounds.entry(self.bounds.find_left(&end)) else {
                break;
            };
            if s < start {
                break;
            }
            end = end.max(e);
            self.bounds.remove(&s);
        }
        self.bounds.insert(start, end);
    }

    fn contains(&self, point: u64) -> bool {
        self.bounds
            .entry(self.bounds.find_left(&point))
            .is_some_and(|(_, &end)| point < end)
    }

    fn intervals(&self) -> Vec<(u64, u64)> {
        self.bounds.iter().map(|(s, e)| (*s, *e)).collect()
    }
}

#[test]
fn test_adjacent_and_overlapping_intervals_merge() {
    let mut set = IntervalSet::new();
    set.add(10, 20);
    set.add(30, 40);
    set.add(50, 60);
    assert_eq!(set.intervals(), vec![(10, 20), (30, 40), (50, 60)]);

    set.add(20, 30);
    assert_eq!(set.intervals(), vec![(10, 40), (50, 60)]);

    set.add(5, 55);
    assert_eq!(set.intervals(), vec![(5, 60)]);

    assert!(set.contains(5));
    assert!(set.contains(59));
    assert!(!set.contains(60));
    assert!(!set.contains(4));
}

#[test]
fn test_random_intervals_match_bitmap() {
    const SPACE: u64 = 2000;
    let mut rng = StdRng::seed_from_u64(2024);
    let mut set = IntervalSet::new();
    let mut covered = vec![false; usize::try_from(SPACE).expect("fits")];

    for _ in 0..400 {
        let start = rng.random_range(0..SPACE);
        let len = rng.random_range(1..30);
        let end = (start + len).min(SPACE);
        set.add(start, end);
        for point in start..end {
            covered[usize::try_from(point).expect("fits")] = true;
        }
    }

    for point in 0..SPACE {
        assert_eq!(
            set.contains(point),
            covered[usize::try_from(point).expect("fits")],
            "point {point}"
        );
    }

    // Stored intervals are disjoint, non-adjacent and ordered.
    let intervals = set.intervals();
    for pair in intervals.windows(2) {
        assert!(pair[0].1 < pair[1].0, "{pair:?}");
    }
    set.bounds.check_invariants().expect("valid tree");
}
