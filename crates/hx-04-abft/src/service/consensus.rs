//! Decided frames: cheater detection, confirmation walk and epoch sealing.

use tracing::{info, warn};

use hx_03_election::Decision;
use shared_types::{BranchIdx, Event, EventId, EventSource, Frame, ValidatorId, Validators};

use super::Lachesis;
use crate::domain::{ApplyEventFn, Block, BlockCallbacks, EpochState, LastDecidedState};
use crate::errors::{AbftError, AbftResult};
use crate::ports::outbound::DagIndexer;

impl<S: EventSource, D: DagIndexer> Lachesis<S, D> {
    /// Applies the decided frame. Returns whether the epoch got sealed.
    pub(super) fn on_frame_decided(&mut self, decision: Decision) -> AbftResult<bool> {
        let Decision { frame, atropos } = decision;
        let last_decided = self.store.get_last_decided_frame()?;
        if frame <= last_decided {
            return Err(AbftError::FrameAlreadyDecided {
                frame,
                last_decided,
            });
        }

        let new_validators = self.apply_atropos(frame, &atropos)?;
        info!(
            epoch = self.store.get_epoch()?,
            frame,
            atropos = %atropos,
            "frame decided"
        );

        match new_validators {
            Some(validators) => {
                self.seal_epoch(validators)?;
                Ok(true)
            }
            None => {
                self.store.set_last_decided_state(LastDecidedState {
                    last_decided_frame: frame,
                })?;
                let validators = self.store.get_validators()?;
                self.election_mut()?.reset(validators, frame + 1);
                Ok(false)
            }
        }
    }

    /// Hands the block to the application. Returns the validators of the
    /// next epoch if the application seals this one.
    fn apply_atropos(&mut self, frame: Frame, atropos: &EventId) -> AbftResult<Option<Validators>> {
        let block = Block {
            atropos: *atropos,
            frame,
            cheaters: self.cheaters_seen_by(atropos)?,
        };

        let BlockCallbacks {
            mut apply_event,
            end_block,
        } = match self.callbacks.begin_block.as_mut() {
            Some(begin_block) => begin_block(&block),
            None => BlockCallbacks::default(),
        };
        self.confirm_subgraph(frame, atropos, &mut apply_event)?;
        Ok(end_block.and_then(|end| end()))
    }

    /// Validators whose fork the Atropos observes, in canonical order.
    fn cheaters_seen_by(&self, atropos: &EventId) -> AbftResult<Vec<ValidatorId>> {
        let merged = self.dag_index.merged_highest_before(atropos)?;
        let validators = self.store.get_validators()?;
        let mut cheaters = Vec::new();
        for (idx, &validator) in validators.sorted_ids().iter().enumerate() {
            if merged.is_fork_detected(idx as BranchIdx) {
                warn!(validator, atropos = %atropos, "cheater detected");
                cheaters.push(validator);
            }
        }
        Ok(cheaters)
    }

    /// Marks every not yet confirmed event reachable from the Atropos.
    fn confirm_subgraph(
        &self,
        frame: Frame,
        atropos: &EventId,
        apply_event: &mut Option<ApplyEventFn<S::Event>>,
    ) -> AbftResult<()> {
        let mut stack = vec![*atropos];
        while let Some(id) = stack.pop() {
            if self.store.get_event_confirmed_on(&id)? != 0 {
                continue;
            }
            let e = self
                .input
                .get_event(&id)
                .ok_or(AbftError::EventNotFound(id))?;
            self.store.set_event_confirmed_on(&id, frame)?;
            if let Some(apply) = apply_event.as_mut() {
                apply(&e);
            }
            stack.extend_from_slice(e.parents());
        }
        Ok(())
    }

    fn seal_epoch(&mut self, validators: Validators) -> AbftResult<()> {
        let epoch = self.store.get_epoch()? + 1;
        self.store.set_epoch_state(EpochState {
            epoch,
            validators: validators.clone(),
        })?;
        self.store
            .set_last_decided_state(LastDecidedState::default())?;
        self.start_epoch(epoch, validators.clone())?;
        info!(epoch, validators = validators.len(), "epoch sealed");
        Ok(())
    }
}
