//! Playlist rotation
//!
//! Picks playlist positions uniformly at random, never repeating one until
//! every position has been played once in the current cycle. When nothing
//! is left the cycle restarts from the full playlist.
//!
//! Positions rather than ids are tracked, so a playlist that lists the same
//! entry twice plays it twice per cycle.
//!
//! Selection and commit are separate steps: [`select_next`] (or a
//! [`CandidatePool`]) only proposes, [`PlayedSet::apply`] records. A
//! proposal that is never committed leaves no trace and can be picked again.

use crate::player::ItemId;
use rand::Rng;
use std::collections::BTreeSet;

/// Positions already committed in the current rotation cycle
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlayedSet {
    positions: BTreeSet<usize>,
}

impl PlayedSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, index: usize) -> bool {
        self.positions.contains(&index)
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Committed positions in ascending order
    pub fn positions(&self) -> impl Iterator<Item = usize> + '_ {
        self.positions.iter().copied()
    }

    /// Every position of a playlist of `playlist_len` has been played
    pub fn is_exhausted(&self, playlist_len: usize) -> bool {
        playlist_len > 0 && (0..playlist_len).all(|i| self.contains(i))
    }

    pub fn commit(&mut self, index: usize) {
        self.positions.insert(index);
    }

    pub fn clear(&mut self) {
        self.positions.clear();
    }

    /// Drop positions past the end of a playlist that shrank
    pub fn retain_within(&mut self, playlist_len: usize) {
        self.positions.retain(|&i| i < playlist_len);
    }

    /// Record an accepted selection, restarting the cycle first if it asked to
    pub fn apply(&mut self, selection: &Selection) {
        if selection.reset {
            self.clear();
        }
        self.commit(selection.index);
    }
}

/// A proposed playlist position
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub index: usize,
    pub item_id: ItemId,
    /// The played set must be cleared before this selection is committed
    pub reset: bool,
}

/// Positions eligible for the current selection attempt
///
/// Discarding a candidate only shrinks this pool, never the played set.
/// A pool of unplayed positions that runs dry can restart the cycle once
/// through [`CandidatePool::restart_cycle`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidatePool {
    playlist_len: usize,
    positions: Vec<usize>,
    discarded: BTreeSet<usize>,
    reset: bool,
}

impl CandidatePool {
    /// Build the pool for a playlist of `playlist_len` entries
    ///
    /// Returns None for an empty playlist: there is nothing to select.
    pub fn new(playlist_len: usize, played: &PlayedSet) -> Option<Self> {
        if playlist_len == 0 {
            return None;
        }

        let positions: Vec<usize> = (0..playlist_len).filter(|&i| !played.contains(i)).collect();
        let reset = positions.is_empty();
        Some(Self {
            playlist_len,
            positions: if reset { (0..playlist_len).collect() } else { positions },
            discarded: BTreeSet::new(),
            reset,
        })
    }

    /// Pool was rebuilt from the whole playlist because nothing was left
    pub fn is_reset(&self) -> bool {
        self.reset
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn contains(&self, index: usize) -> bool {
        self.positions.contains(&index)
    }

    /// Uniformly random candidate, or None once the pool is empty
    pub fn pick<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<usize> {
        if self.positions.is_empty() {
            return None;
        }
        Some(self.positions[rng.gen_range(0..self.positions.len())])
    }

    /// Remove a candidate from this attempt
    pub fn discard(&mut self, index: usize) {
        self.positions.retain(|&i| i != index);
        self.discarded.insert(index);
    }

    /// Refill an emptied pool with every position not discarded so far
    ///
    /// Only a pool that has not already restarted can do this; selections
    /// from the refilled pool carry `reset`. Returns false when there is
    /// nothing left to try.
    pub fn restart_cycle(&mut self) -> bool {
        if self.reset || !self.positions.is_empty() {
            return false;
        }
        self.positions = (0..self.playlist_len)
            .filter(|i| !self.discarded.contains(i))
            .collect();
        self.reset = true;
        !self.positions.is_empty()
    }

    /// Turn a picked position into a selection for `playlist`
    pub fn selection(&self, playlist: &[ItemId], index: usize) -> Option<Selection> {
        playlist.get(index).map(|item_id| Selection {
            index,
            item_id: item_id.clone(),
            reset: self.reset,
        })
    }
}

/// Propose the next playlist position
///
/// Returns None for an empty playlist. The caller commits the result with
/// [`PlayedSet::apply`] once it has been accepted.
pub fn select_next<R: Rng + ?Sized>(
    playlist: &[ItemId],
    played: &PlayedSet,
    rng: &mut R,
) -> Option<Selection> {
    let pool = CandidatePool::new(playlist.len(), played)?;
    let index = pool.pick(rng)?;
    pool.selection(playlist, index)
}
