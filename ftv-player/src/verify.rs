//! Playability verification
//!
//! Some entries refuse to play when embedded. The verifier starts a
//! candidate, waits for the widget to settle, and reads the state back. A
//! candidate stuck in `Unstarted` or `Error` is dropped from the attempt
//! pool (never from the played set) and another one is tried. When every
//! unplayed entry fails, the pool restarts the cycle once with the entries
//! not yet tried. Nothing is tried twice, so the loop ends after at most one
//! try per playlist entry.

use crate::player::{ItemId, PlayerHandle};
use crate::rotation::{CandidatePool, Selection};
use rand::rngs::StdRng;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Result of one verification run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerifyOutcome {
    /// A candidate played; commit it
    Accepted {
        selection: Selection,
        /// Candidates tried, including the accepted one
        attempts: usize,
    },
    /// Every candidate failed
    Exhausted { attempts: usize },
    /// A newer request superseded this one; commit nothing
    Cancelled,
}

/// One verification request, owned by the task running it
pub struct VerifyRequest {
    pub handle: Arc<dyn PlayerHandle>,
    pub playlist: Vec<ItemId>,
    pub pool: CandidatePool,
    pub rng: StdRng,
    pub settle_delay: Duration,
    pub token: CancellationToken,
}

impl VerifyRequest {
    /// Try candidates until one plays, the pool empties, or the token fires
    pub async fn run(mut self) -> VerifyOutcome {
        let mut attempts = 0;

        loop {
            if self.token.is_cancelled() {
                debug!("Verification cancelled after {} attempts", attempts);
                return VerifyOutcome::Cancelled;
            }

            let index = match self.pool.pick(&mut self.rng) {
                Some(index) => index,
                None if self.pool.restart_cycle() => {
                    info!(
                        "Unplayed entries exhausted, restarting the cycle with {} candidates",
                        self.pool.len()
                    );
                    continue;
                }
                None => return VerifyOutcome::Exhausted { attempts },
            };
            attempts += 1;

            self.handle.play_item_at(index);

            tokio::select! {
                _ = self.token.cancelled() => {
                    debug!("Verification cancelled while settling on position {}", index);
                    return VerifyOutcome::Cancelled;
                }
                _ = tokio::time::sleep(self.settle_delay) => {}
            }

            let state = self.handle.state();
            if state.is_unplayable() {
                info!(
                    "Position {} not playable (state {}), {} candidates left",
                    index,
                    state,
                    self.pool.len() - 1
                );
                self.pool.discard(index);
                continue;
            }

            if self.token.is_cancelled() {
                return VerifyOutcome::Cancelled;
            }

            match self.pool.selection(&self.playlist, index) {
                Some(selection) => return VerifyOutcome::Accepted { selection, attempts },
                // Widget playlist and snapshot disagree; treat the position as unusable
                None => self.pool.discard(index),
            }
        }
    }
}
