//! # Election Service
//!
//! Elects the Atropos of `frame_to_decide`. Every validator is a subject;
//! its candidate is its root at `frame_to_decide`. Roots of later frames
//! vote on every subject:
//!
//! ```text
//! round 1 (frame_to_decide + 1):
//!     YES(root) if the voter observes the subject's root, else NO
//! round n ≥ 2:
//!     observers = roots of the previous frame forkless-causing the voter
//!     yes, no   = weight of observers voting YES / NO
//!     vote      = yes >= no
//!     decided   = yes or no reaches quorum
//! ```
//!
//! Once every subject is decided, the Atropos is the YES-bound root with the
//! lowest id.

use std::collections::{BTreeMap, HashMap};
use tracing::{debug, warn};

use shared_types::{EventId, Frame, ValidatorId, Validators};

use crate::domain::{Decision, RootAndSlot, Vote, VoteValue};
use crate::errors::{ElectionError, ElectionResult};
use crate::ports::outbound::ElectionSource;

/// Atropos election of a single frame.
#[derive(Debug, Clone)]
pub struct Election {
    validators: Validators,
    frame_to_decide: Frame,
    votes: HashMap<(RootAndSlot, ValidatorId), Vote>,
    decided: BTreeMap<ValidatorId, VoteValue>,
}

impl Election {
    pub fn new(validators: Validators, frame_to_decide: Frame) -> Self {
        Self {
            validators,
            frame_to_decide,
            votes: HashMap::new(),
            decided: BTreeMap::new(),
        }
    }

    /// Drops all votes and starts electing `frame_to_decide`.
    pub fn reset(&mut self, validators: Validators, frame_to_decide: Frame) {
        self.validators = validators;
        self.frame_to_decide = frame_to_decide;
        self.votes.clear();
        self.decided.clear();
    }

    pub fn frame_to_decide(&self) -> Frame {
        self.frame_to_decide
    }

    pub fn validators(&self) -> &Validators {
        &self.validators
    }

    /// Number of subjects decided so far.
    pub fn num_decided(&self) -> usize {
        self.decided.len()
    }

    /// Casts the votes of `root`. Returns the decision once every subject
    /// is decided and at least one is decided YES.
    pub fn process_root<S: ElectionSource>(
        &mut self,
        root: RootAndSlot,
        source: &S,
    ) -> Result<Option<Decision>, S::Error> {
        if let Some(decision) = self.choose_atropos() {
            return Ok(Some(decision));
        }
        if root.slot.frame <= self.frame_to_decide {
            return Ok(None);
        }
        let round = root.slot.frame - self.frame_to_decide;
        let prev_frame = root.slot.frame - 1;

        let mut observed = Vec::new();
        for r in source.frame_roots(prev_frame)? {
            if source.forkless_cause(&r.id, &root.id)? {
                observed.push(r);
            }
        }

        for &subject in self.validators.sorted_ids() {
            let vote = if round == 1 {
                let candidate = observed.iter().find(|r| r.slot.validator == subject);
                Vote::Undecided(match candidate {
                    Some(r) => VoteValue::Yes(r.id),
                    None => VoteValue::No,
                })
            } else {
                self.aggregate(&root, subject, prev_frame, &observed)?
            };

            if vote.is_decided() && !self.decided.contains_key(&subject) {
                debug!(
                    frame = self.frame_to_decide,
                    subject,
                    yes = vote.value().is_yes(),
                    root = %root,
                    "election subject decided"
                );
                self.decided.insert(subject, vote.value());
            }
            self.votes.insert((root, subject), vote);
        }

        if self.decided.len() < self.validators.len() {
            return Ok(None);
        }
        Ok(self.choose_atropos())
    }

    /// Weighted majority of the previous round's observed voters.
    fn aggregate(
        &self,
        root: &RootAndSlot,
        subject: ValidatorId,
        prev_frame: Frame,
        observed: &[RootAndSlot],
    ) -> ElectionResult<Vote> {
        let mut yes = self.validators.new_counter();
        let mut no = self.validators.new_counter();
        let mut all = self.validators.new_counter();
        let mut bound: Option<EventId> = None;

        for observer in observed {
            let vote = self
                .votes
                .get(&(*observer, subject))
                .ok_or(ElectionError::MissingVote {
                    root: root.id,
                    observer: observer.id,
                    subject,
                })?;
            match vote.value() {
                VoteValue::Yes(candidate) => {
                    if bound.is_some_and(|b| b != candidate) {
                        return Err(ElectionError::ForkedRoots {
                            frame: self.frame_to_decide,
                            validator: subject,
                        });
                    }
                    bound = Some(candidate);
                    yes.count(observer.slot.validator);
                }
                VoteValue::No => {
                    no.count(observer.slot.validator);
                }
            }
            if !all.count(observer.slot.validator) {
                return Err(ElectionError::ForkedRoots {
                    frame: prev_frame,
                    validator: observer.slot.validator,
                });
            }
        }

        if !all.has_quorum() {
            return Err(ElectionError::NoQuorum {
                root: root.id,
                frame: prev_frame,
            });
        }

        let value = match bound {
            Some(candidate) if yes.sum() >= no.sum() => VoteValue::Yes(candidate),
            _ => VoteValue::No,
        };
        if yes.has_quorum() || no.has_quorum() {
            Ok(Vote::Decided(value))
        } else {
            Ok(Vote::Undecided(value))
        }
    }

    /// The lowest YES-bound root once every subject is decided. With no YES
    /// at all the decisions are discarded and voting continues.
    fn choose_atropos(&mut self) -> Option<Decision> {
        if self.decided.is_empty() || self.decided.len() < self.validators.len() {
            return None;
        }
        let atropos = self
            .decided
            .values()
            .filter_map(|v| match v {
                VoteValue::Yes(id) => Some(*id),
                VoteValue::No => None,
            })
            .min();
        match atropos {
            Some(atropos) => Some(Decision {
                frame: self.frame_to_decide,
                atropos,
            }),
            None => {
                warn!(
                    frame = self.frame_to_decide,
                    "all election subjects decided NO, frame stays undecided"
                );
                self.decided.clear();
                None
            }
        }
    }
}
