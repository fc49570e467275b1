//! # Sequence Vectors
//!
//! Flat byte vectors indexed by branch:
//!
//! ```text
//! LowestAfterSeq   [ seq u32 LE ] × branches
//! HighestBeforeSeq [ seq u32 LE | min_seq u32 LE ] × branches
//! ```
//!
//! Reads past the end return zero, writes past the end zero-extend, so a
//! vector stored before a new branch appeared stays valid.

use shared_types::endian::littleendian;
use shared_types::{BranchIdx, Event, Seq};

const LA_ENTRY: usize = 4;
const HB_ENTRY: usize = 8;

/// `(seq, min_seq)` of the events of one branch observed by an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BranchSeq {
    /// Highest observed seq on the branch.
    pub seq: Seq,
    /// Lowest observed seq on the branch.
    pub min_seq: Seq,
}

impl BranchSeq {
    /// Marker for a branch whose creator was observed forking.
    pub const FORK_DETECTED: BranchSeq = BranchSeq {
        seq: 0,
        min_seq: i32::MAX as Seq,
    };

    pub fn new(seq: Seq, min_seq: Seq) -> Self {
        Self { seq, min_seq }
    }

    /// Nothing observed on this branch (fork markers included).
    pub fn is_empty(&self) -> bool {
        self.seq == 0
    }

    pub fn is_fork_detected(&self) -> bool {
        *self == Self::FORK_DETECTED
    }
}

fn set_bytes(buf: &mut Vec<u8>, offset: usize, bytes: &[u8]) {
    let end = offset + bytes.len();
    if buf.len() < end {
        buf.resize(end, 0);
    }
    buf[offset..end].copy_from_slice(bytes);
}

fn get_u32(buf: &[u8], offset: usize) -> u32 {
    match buf.get(offset..offset + 4) {
        Some(b) => littleendian::bytes_to_u32(b),
        None => 0,
    }
}

/// Per branch, the lowest seq of a descendant created on that branch.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LowestAfterSeq(Vec<u8>);

impl LowestAfterSeq {
    pub fn with_size(branches: usize) -> Self {
        Self(vec![0; branches * LA_ENTRY])
    }

    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Number of branch entries stored.
    pub fn len(&self) -> usize {
        self.0.len() / LA_ENTRY
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, branch: BranchIdx) -> Seq {
        get_u32(&self.0, branch as usize * LA_ENTRY)
    }

    pub fn set(&mut self, branch: BranchIdx, seq: Seq) {
        set_bytes(
            &mut self.0,
            branch as usize * LA_ENTRY,
            &littleendian::u32_to_bytes(seq),
        );
    }

    pub fn init_with_event(&mut self, branch: BranchIdx, e: &impl Event) {
        self.set(branch, e.seq());
    }

    /// Records `e` as a descendant on `branch` unless one is recorded
    /// already. Returns whether the vector changed.
    pub fn visit(&mut self, branch: BranchIdx, e: &impl Event) -> bool {
        if self.get(branch) != 0 {
            return false;
        }
        self.set(branch, e.seq());
        true
    }
}

/// Per branch, the range of seqs observed by an event.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HighestBeforeSeq(Vec<u8>);

impl HighestBeforeSeq {
    pub fn with_size(branches: usize) -> Self {
        Self(vec![0; branches * HB_ENTRY])
    }

    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len() / HB_ENTRY
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, branch: BranchIdx) -> BranchSeq {
        let offset = branch as usize * HB_ENTRY;
        BranchSeq {
            seq: get_u32(&self.0, offset),
            min_seq: get_u32(&self.0, offset + 4),
        }
    }

    pub fn set(&mut self, branch: BranchIdx, value: BranchSeq) {
        let offset = branch as usize * HB_ENTRY;
        set_bytes(&mut self.0, offset, &littleendian::u32_to_bytes(value.seq));
        set_bytes(&mut self.0, offset + 4, &littleendian::u32_to_bytes(value.min_seq));
    }

    pub fn seq(&self, branch: BranchIdx) -> Seq {
        self.get(branch).seq
    }

    pub fn min_seq(&self, branch: BranchIdx) -> Seq {
        self.get(branch).min_seq
    }

    pub fn is_branch_empty(&self, branch: BranchIdx) -> bool {
        self.get(branch).is_empty()
    }

    pub fn is_fork_detected(&self, branch: BranchIdx) -> bool {
        self.get(branch).is_fork_detected()
    }

    pub fn set_fork_detected(&mut self, branch: BranchIdx) {
        self.set(branch, BranchSeq::FORK_DETECTED);
    }

    pub fn init_with_event(&mut self, branch: BranchIdx, e: &impl Event) {
        self.set(branch, BranchSeq::new(e.seq(), e.seq()));
    }

    /// Folds a parent's vector into this one over the first `num` branches.
    pub fn collect_from(&mut self, other: &HighestBeforeSeq, num: usize) {
        for branch in 0..num as BranchIdx {
            let his = other.get(branch);
            if his.is_empty() && !his.is_fork_detected() {
                continue;
            }
            let mut mine = self.get(branch);
            if mine.is_fork_detected() {
                continue;
            }
            if his.is_fork_detected() {
                self.set_fork_detected(branch);
                continue;
            }
            if mine.seq == 0 || mine.min_seq > his.min_seq {
                mine.min_seq = his.min_seq;
            }
            if mine.seq < his.seq {
                mine.seq = his.seq;
            }
            self.set(branch, mine);
        }
    }

    /// Sets entry `to` from the highest of `other`'s `from` branches; a
    /// fork marker on any of them wins.
    pub fn gather_from(&mut self, to: BranchIdx, other: &HighestBeforeSeq, from: &[BranchIdx]) {
        let mut highest = BranchSeq::default();
        for &branch in from {
            let seq = other.get(branch);
            if seq.is_fork_detected() {
                highest = seq;
                break;
            }
            if seq.seq > highest.seq {
                highest = seq;
            }
        }
        self.set(to, highest);
    }
}
