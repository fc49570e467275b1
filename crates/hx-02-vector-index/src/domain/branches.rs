//! Branch bookkeeping.
//!
//! Branch `i < num_validators` is the first branch of the validator with
//! index `i`. Every fork observed later appends one branch for its creator.

use serde::{Deserialize, Serialize};

use shared_types::{BranchIdx, Seq, ValidatorIdx};

/// A single branch of a creator's event chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchMeta {
    pub creator: ValidatorIdx,
    /// Seq of the last event assigned to the branch, 0 while unused.
    pub last_seq: Seq,
}

/// All branches known within an epoch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchesInfo {
    pub branches: Vec<BranchMeta>,
    pub by_creator: Vec<Vec<BranchIdx>>,
}

impl BranchesInfo {
    /// One unused branch per validator.
    pub fn new(num_validators: usize) -> Self {
        Self {
            branches: (0..num_validators)
                .map(|i| BranchMeta {
                    creator: i as ValidatorIdx,
                    last_seq: 0,
                })
                .collect(),
            by_creator: (0..num_validators).map(|i| vec![i as BranchIdx]).collect(),
        }
    }

    pub fn num_branches(&self) -> usize {
        self.branches.len()
    }

    pub fn num_validators(&self) -> usize {
        self.by_creator.len()
    }

    /// True once any creator has more than one branch.
    pub fn at_least_one_fork(&self) -> bool {
        self.branches.len() > self.by_creator.len()
    }

    pub fn creator_of(&self, branch: BranchIdx) -> Option<ValidatorIdx> {
        self.branches.get(branch as usize).map(|b| b.creator)
    }

    pub fn last_seq(&self, branch: BranchIdx) -> Option<Seq> {
        self.branches.get(branch as usize).map(|b| b.last_seq)
    }

    pub fn branches_of(&self, creator: ValidatorIdx) -> &[BranchIdx] {
        self.by_creator
            .get(creator as usize)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub(crate) fn set_last_seq(&mut self, branch: BranchIdx, seq: Seq) {
        if let Some(meta) = self.branches.get_mut(branch as usize) {
            meta.last_seq = seq;
        }
    }

    /// Appends a branch for `creator` starting at `seq`.
    pub(crate) fn add_branch(&mut self, creator: ValidatorIdx, seq: Seq) -> BranchIdx {
        let branch = self.branches.len() as BranchIdx;
        self.branches.push(BranchMeta {
            creator,
            last_seq: seq,
        });
        if let Some(list) = self.by_creator.get_mut(creator as usize) {
            list.push(branch);
        }
        branch
    }
}
