//! Rotation requests for the controller
//!
//! Each request supersedes the previous one. Unverified selections commit
//! right after `play_item_at`; verified ones run on their own task and
//! commit when the outcome comes back, provided the request is still the
//! active one of the current generation.

use super::{ActiveRequest, Controller, Internal};
use crate::rotation::{select_next, CandidatePool, Selection};
use crate::verify::{VerifyOutcome, VerifyRequest};
use ftv_common::events::{FtvEvent, SelectionTrigger};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

impl Controller {
    fn verification_enabled(&self, trigger: SelectionTrigger) -> bool {
        let policy = &self.config.verification;
        match trigger {
            SelectionTrigger::Initial => policy.initial,
            SelectionTrigger::Skip => policy.skip,
            SelectionTrigger::AutoAdvance => policy.auto_advance,
        }
    }

    /// Pick and start the next item
    pub(super) fn start_selection(&mut self, trigger: SelectionTrigger) {
        let Some(handle) = self.ready_handle() else {
            debug!("Selection ({}) ignored: no ready player", trigger);
            return;
        };

        let playlist = match handle.playlist() {
            Some(playlist) if !playlist.is_empty() => playlist,
            _ => {
                warn!("Nothing to play: playlist is empty or not loaded");
                return;
            }
        };

        self.cancel_active();
        self.state.played.retain_within(playlist.len());

        if !self.verification_enabled(trigger) {
            let Some(selection) = select_next(&playlist, &self.state.played, &mut self.rng) else {
                return;
            };
            handle.play_item_at(selection.index);
            self.commit_selection(selection, trigger, playlist.len());
            return;
        }

        let Some(pool) = CandidatePool::new(playlist.len(), &self.state.played) else {
            return;
        };

        self.next_request_id += 1;
        let request_id = self.next_request_id;
        let token = CancellationToken::new();
        self.active = Some(ActiveRequest {
            id: request_id,
            token: token.clone(),
        });

        debug!(
            "Verifying selection request {} ({}) over {} candidates",
            request_id,
            trigger,
            pool.len()
        );

        let request = VerifyRequest {
            handle,
            playlist,
            pool,
            rng: StdRng::seed_from_u64(self.rng.gen()),
            settle_delay: self.config.player.settle_delay(),
            token,
        };
        let generation = self.state.generation;
        let tx = self.internal_tx.clone();

        tokio::spawn(async move {
            let outcome = request.run().await;
            let _ = tx.send(Internal::Verified {
                generation,
                request_id,
                trigger,
                outcome,
            });
        });
    }

    pub(super) fn finish_verification(
        &mut self,
        generation: u64,
        request_id: u64,
        trigger: SelectionTrigger,
        outcome: VerifyOutcome,
    ) {
        let is_current = generation == self.state.generation
            && self
                .active
                .as_ref()
                .is_some_and(|a| a.id == request_id && !a.token.is_cancelled());
        if !is_current {
            debug!(
                "Dropping outcome of superseded request {} (generation {})",
                request_id, generation
            );
            return;
        }
        self.active = None;

        match outcome {
            VerifyOutcome::Accepted { selection, attempts } => {
                debug!("Request {} accepted after {} attempts", request_id, attempts);
                let playlist_len = self
                    .handle
                    .as_ref()
                    .and_then(|h| h.playlist())
                    .map_or(0, |p| p.len());
                self.commit_selection(selection, trigger, playlist_len);
            }
            VerifyOutcome::Exhausted { attempts } => {
                warn!(
                    "No playable item found ({} candidates tried); leaving playback as it was",
                    attempts
                );
                self.restore_current();
                self.events.emit_lossy(FtvEvent::SelectionExhausted {
                    trigger,
                    attempts,
                    timestamp: chrono::Utc::now(),
                });
            }
            VerifyOutcome::Cancelled => {
                debug!("Request {} cancelled", request_id);
            }
        }
    }

    /// Put the widget back on the committed item after failed attempts moved it
    fn restore_current(&self) {
        let (Some(current), Some(handle)) = (&self.state.current, self.ready_handle()) else {
            return;
        };

        debug!("Returning to position {} ({})", current.index, current.item_id);
        handle.play_item_at(current.index);
        if !self.state.playing {
            handle.pause();
        }
    }

    fn commit_selection(&mut self, selection: Selection, trigger: SelectionTrigger, playlist_len: usize) {
        if selection.reset {
            info!("All {} items played, starting a new rotation", playlist_len);
            self.events.emit_lossy(FtvEvent::RotationReset {
                playlist_len,
                timestamp: chrono::Utc::now(),
            });
        }

        info!(
            "Selected {} (position {}, {})",
            selection.item_id, selection.index, trigger
        );
        let item_id = selection.item_id.to_string();
        let index = selection.index;
        self.state.commit(selection);

        self.events.emit_lossy(FtvEvent::ItemSelected {
            item_id,
            index,
            trigger,
            played_count: self.state.played.len(),
            playlist_len,
            timestamp: chrono::Utc::now(),
        });
        self.publish();
    }
}
