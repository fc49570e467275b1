//! Frame classification and election feeding.

use tracing::{debug, trace, warn};

use hx_03_election::{Decision, ElectionSource, RootAndSlot};
use shared_types::{Event, EventId, EventSource, Frame, MutableEvent, FIRST_FRAME};

use super::Lachesis;
use crate::errors::{AbftError, AbftResult};
use crate::ports::outbound::DagIndexer;
use crate::store::Store;

/// Election view over the stored roots and the DAG index.
struct DagView<'a, D> {
    store: &'a Store,
    dag_index: &'a D,
}

impl<D: DagIndexer> ElectionSource for DagView<'_, D> {
    type Error = AbftError;

    fn forkless_cause(&self, a: &EventId, b: &EventId) -> AbftResult<bool> {
        self.dag_index.forkless_cause(a, b)
    }

    fn frame_roots(&self, frame: Frame) -> AbftResult<Vec<RootAndSlot>> {
        self.store.get_frame_roots(frame)
    }
}

/// Frame of an event and of its self-parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Framing {
    frame: Frame,
    self_parent_frame: Frame,
}

impl Framing {
    fn is_root(&self) -> bool {
        self.frame > self.self_parent_frame
    }
}

impl<S: EventSource, D: DagIndexer> Lachesis<S, D> {
    /// Indexes `e`, stores it as a root if it is one and advances the
    /// election. Index writes are flushed on success; on error they are
    /// dropped and the root slots of `e` removed.
    pub fn process<E: Event>(&mut self, e: &E) -> AbftResult<()> {
        self.check_event(e)?;
        match self.process_indexed(e) {
            Ok(()) => self.dag_index.flush(),
            Err(err) => {
                self.dag_index.drop_not_flushed()?;
                Err(err)
            }
        }
    }

    /// Stamps `frame` and `is_root` on `e`. Nothing is persisted.
    pub fn build<E: MutableEvent>(&mut self, e: &mut E) -> AbftResult<()> {
        self.check_event(&*e)?;
        let res = match self.dag_index.add(&*e) {
            Ok(()) => self.calc_frame(&*e),
            Err(err) => Err(err),
        };
        self.dag_index.drop_not_flushed()?;
        let framing = res?;
        e.set_frame(framing.frame);
        e.set_is_root(framing.is_root());
        Ok(())
    }

    fn check_event<E: Event>(&self, e: &E) -> AbftResult<()> {
        if self.election.is_none() {
            return Err(AbftError::NotBootstrapped);
        }
        let state = self.store.get_epoch_state()?;
        if e.epoch() != state.epoch {
            return Err(AbftError::NotRelevant {
                event: e.id(),
                event_epoch: e.epoch(),
                epoch: state.epoch,
            });
        }
        if !state.validators.exists(e.creator()) {
            return Err(AbftError::Auth {
                event: e.id(),
                creator: e.creator(),
            });
        }
        Ok(())
    }

    fn process_indexed<E: Event>(&mut self, e: &E) -> AbftResult<()> {
        self.dag_index.add(e)?;
        let framing = self.calc_frame(e)?;
        if !self.config.suppress_frame_check
            && (e.frame() != framing.frame || e.is_root() != framing.is_root())
        {
            return Err(AbftError::WrongFrame {
                event: e.id(),
                claimed_frame: e.frame(),
                claimed_root: e.is_root(),
                frame: framing.frame,
                is_root: framing.is_root(),
            });
        }
        if !framing.is_root() {
            return Ok(());
        }

        let id = e.id();
        let slots: Vec<RootAndSlot> = (framing.self_parent_frame + 1..=framing.frame)
            .map(|f| RootAndSlot::new(id, f, e.creator()))
            .collect();
        for (i, root) in slots.iter().enumerate() {
            if let Err(err) = self
                .store
                .add_root(root.slot.frame, root.slot.validator, &root.id)
            {
                self.remove_roots(&slots[..i]);
                return Err(err);
            }
            debug!(root = %root, "root added");
        }
        self.handle_election(&slots).inspect_err(|_| self.remove_roots(&slots))
    }

    fn remove_roots(&self, slots: &[RootAndSlot]) {
        for root in slots {
            // failures were reported to crit
            if let Err(err) = self
                .store
                .remove_root(root.slot.frame, root.slot.validator, &root.id)
            {
                warn!(root = %root, %err, "root not removed");
            }
        }
    }

    /// Frame of `e`: one above the highest parent frame when the roots of
    /// that frame observing `e` have quorum weight.
    fn calc_frame<E: Event>(&self, e: &E) -> AbftResult<Framing> {
        if e.parents().is_empty() {
            return Ok(Framing {
                frame: FIRST_FRAME,
                self_parent_frame: 0,
            });
        }

        let mut self_parent_frame = 0;
        let mut max_parent_frame = 0;
        for p in e.parents() {
            let parent = self
                .input
                .get_event(p)
                .ok_or(AbftError::EventNotFound(*p))?;
            if e.is_self_parent(p) {
                self_parent_frame = parent.frame();
            }
            max_parent_frame = max_parent_frame.max(parent.frame());
        }

        let id = e.id();
        let mut observed = self.store.get_validators()?.new_counter();
        for root in self.store.get_frame_roots(max_parent_frame)? {
            if self.dag_index.forkless_cause(&root.id, &id)? {
                observed.count(root.slot.validator);
            }
        }
        let frame = if observed.has_quorum() {
            max_parent_frame + 1
        } else {
            max_parent_frame
        };
        trace!(event = %id, frame, self_parent_frame, "frame calculated");
        Ok(Framing {
            frame,
            self_parent_frame,
        })
    }

    /// Feeds new root slots to the election in frame order.
    fn handle_election(&mut self, slots: &[RootAndSlot]) -> AbftResult<()> {
        for root in slots {
            if let Some(decision) = self.feed_root(*root)? {
                if !self.on_frame_decided(decision)? {
                    // the remaining slots are stored and get replayed
                    self.process_known_roots()?;
                }
                return Ok(());
            }
        }
        Ok(())
    }

    /// Replays stored roots from the first undecided frame up, deciding as
    /// many frames as they allow.
    pub(super) fn process_known_roots(&mut self) -> AbftResult<()> {
        'restart: loop {
            let mut frame = self.store.get_last_decided_frame()? + 1;
            loop {
                let roots = self.store.get_frame_roots(frame)?;
                if roots.is_empty() {
                    return Ok(());
                }
                for root in roots {
                    if let Some(decision) = self.feed_root(root)? {
                        if self.on_frame_decided(decision)? {
                            return Ok(());
                        }
                        continue 'restart;
                    }
                }
                frame += 1;
            }
        }
    }

    fn feed_root(&mut self, root: RootAndSlot) -> AbftResult<Option<Decision>> {
        let election = self.election.as_mut().ok_or(AbftError::NotBootstrapped)?;
        let view = DagView {
            store: &self.store,
            dag_index: &self.dag_index,
        };
        // store and index failures were reported on read
        election.process_root(root, &view).inspect_err(|err| {
            if let AbftError::Election(inner) = err {
                self.crit.report(inner);
            }
        })
    }
}
