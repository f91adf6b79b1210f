//! Rotation policy properties
//!
//! Checks, across many seeds and playlist sizes:
//! - No entry repeats before every other entry has been played
//! - Exactly one cycle restart per full pass
//! - Rejected candidates never reach the played set

use ftv_player::rotation::{select_next, CandidatePool, PlayedSet};
use ftv_player::ItemId;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::HashSet;

fn playlist(n: usize) -> Vec<ItemId> {
    (0..n).map(|i| ItemId::new(format!("v{}", i))).collect()
}

#[test]
fn test_no_repeat_until_exhaustion() {
    for n in 1..=12 {
        for seed in 0..25 {
            let items = playlist(n);
            let mut played = PlayedSet::new();
            let mut rng = StdRng::seed_from_u64(seed);

            // Three full cycles
            let picks: Vec<usize> = (0..3 * n)
                .map(|_| {
                    let selection = select_next(&items, &played, &mut rng).unwrap();
                    played.apply(&selection);
                    selection.index
                })
                .collect();

            for cycle in picks.chunks(n) {
                let unique: HashSet<_> = cycle.iter().collect();
                assert_eq!(unique.len(), n, "n={} seed={} picks={:?}", n, seed, picks);
            }
        }
    }
}

#[test]
fn test_exactly_one_reset_per_cycle() {
    for n in 1..=10 {
        let items = playlist(n);
        let mut played = PlayedSet::new();
        let mut rng = StdRng::seed_from_u64(n as u64);

        let resets: Vec<bool> = (0..4 * n)
            .map(|_| {
                let selection = select_next(&items, &played, &mut rng).unwrap();
                played.apply(&selection);
                selection.reset
            })
            .collect();

        // The first cycle starts empty, every later one starts with a reset
        assert!(resets[..n].iter().all(|r| !r));
        for window in resets[n..].chunks(n) {
            assert_eq!(window.iter().filter(|r| **r).count(), 1);
            assert!(window[0], "reset must happen at the point of exhaustion");
        }
    }
}

#[test]
fn test_played_set_stays_within_playlist() {
    let items = playlist(5);
    let mut played = PlayedSet::new();
    let mut rng = StdRng::seed_from_u64(11);

    for _ in 0..50 {
        let selection = select_next(&items, &played, &mut rng).unwrap();
        played.apply(&selection);
        assert!(played.positions().all(|i| i < items.len()));
        assert!(played.len() <= items.len());
    }
}

#[test]
fn test_rejected_candidates_do_not_pollute_played_set() {
    let items = playlist(3);
    let mut played = PlayedSet::new();
    let mut rng = StdRng::seed_from_u64(5);
    let mut pool = CandidatePool::new(items.len(), &played).unwrap();

    // Reject two candidates, accept the third
    let first = pool.pick(&mut rng).unwrap();
    pool.discard(first);
    let second = pool.pick(&mut rng).unwrap();
    pool.discard(second);
    let third = pool.pick(&mut rng).unwrap();

    assert_eq!(pool.len(), 1);
    let selection = pool.selection(&items, third).unwrap();
    played.apply(&selection);

    assert_eq!(played.len(), 1);
    assert!(played.contains(third));
    assert!(!played.contains(first));
    assert!(!played.contains(second));
}

#[test]
fn test_full_played_set_reset_on_next_call() {
    let items: Vec<ItemId> = ["A", "B", "C"].iter().map(|s| ItemId::from(*s)).collect();
    let mut played = PlayedSet::new();
    for i in 0..3 {
        played.commit(i);
    }

    let mut rng = StdRng::seed_from_u64(0);
    let pool = CandidatePool::new(3, &played).unwrap();
    assert!(pool.is_reset());
    assert_eq!(pool.len(), 3);

    let selection = select_next(&items, &played, &mut rng).unwrap();
    assert!(selection.reset);
    assert!(["A", "B", "C"].contains(&selection.item_id.as_str()));
}
