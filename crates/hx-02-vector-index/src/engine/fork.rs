//! Branch assignment and fork marking.

use tracing::warn;

use shared_types::{BranchIdx, Event, EventSource, ValidatorIdx};

use super::VectorEngine;
use crate::domain::HighestBeforeSeq;
use crate::errors::{VectorError, VectorResult};

impl<S: EventSource> VectorEngine<S> {
    /// Picks the branch of `e`: the self-parent's branch if `e` extends its
    /// tip, the creator's first branch for its first event, a new branch
    /// otherwise.
    pub(crate) fn assign_branch<E: Event>(
        &mut self,
        e: &E,
        me_idx: ValidatorIdx,
    ) -> VectorResult<BranchIdx> {
        let extend = match e.self_parent() {
            None => {
                let first = me_idx as BranchIdx;
                (self.branches.last_seq(first) == Some(0)).then_some(first)
            }
            Some(sp) => {
                let sp_branch = self
                    .get_event_branch(&sp)?
                    .ok_or(VectorError::OutOfOrder {
                        event: e.id(),
                        parent: sp,
                    })?;
                let last = self.branches.last_seq(sp_branch).ok_or_else(|| {
                    VectorError::InconsistentDb {
                        message: format!("event {sp} on unknown branch {sp_branch}"),
                    }
                })?;
                (last + 1 == e.seq()).then_some(sp_branch)
            }
        };

        let branch = match extend {
            Some(branch) => {
                self.branches.set_last_seq(branch, e.seq());
                branch
            }
            None => {
                let branch = self.branches.add_branch(me_idx, e.seq());
                warn!(
                    event = %e.id(),
                    creator = e.creator(),
                    seq = e.seq(),
                    branch,
                    "fork detected, new branch"
                );
                branch
            }
        };
        Ok(branch)
    }

    /// Marks every branch of a creator as forked once `before` observes
    /// two of its branches with overlapping seq ranges, or a fork marker
    /// on any of them.
    pub(crate) fn detect_forks(&self, before: &mut HighestBeforeSeq) {
        for branches in &self.branches.by_creator {
            if branches.len() <= 1 {
                continue;
            }
            if !Self::creator_forked(before, branches) {
                continue;
            }
            for &branch in branches {
                before.set_fork_detected(branch);
            }
        }
    }

    fn creator_forked(before: &HighestBeforeSeq, branches: &[BranchIdx]) -> bool {
        if branches.iter().any(|&b| before.is_fork_detected(b)) {
            return true;
        }
        for (i, &a) in branches.iter().enumerate() {
            let a_seq = before.get(a);
            if a_seq.is_empty() {
                continue;
            }
            for &b in &branches[i + 1..] {
                let b_seq = before.get(b);
                if b_seq.is_empty() {
                    continue;
                }
                if a_seq.min_seq <= b_seq.seq && b_seq.min_seq <= a_seq.seq {
                    return true;
                }
            }
        }
        false
    }
}
