//! # Validator Sets
//!
//! A weighted validator set with a canonical order: weight descending, then
//! id ascending. A validator's [`ValidatorIdx`] is its position in that order
//! and is stable for the lifetime of the set (one epoch).
//!
//! Sets are immutable once built and cheap to clone.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use crate::entities::{ValidatorId, ValidatorIdx, Weight};
use crate::errors::{TypesError, TypesResult};

#[derive(Debug)]
struct Inner {
    ids: Vec<ValidatorId>,
    weights: Vec<Weight>,
    lookup: HashMap<ValidatorId, ValidatorIdx>,
    total: Weight,
    quorum: Weight,
}

/// Immutable weighted validator set.
#[derive(Clone, Serialize, Deserialize)]
#[serde(
    try_from = "Vec<(ValidatorId, Weight)>",
    into = "Vec<(ValidatorId, Weight)>"
)]
pub struct Validators {
    inner: Arc<Inner>,
}

impl Validators {
    /// Builds a set from `(id, weight)` pairs. Zero weights are dropped,
    /// a repeated id keeps its last weight.
    pub fn new(pairs: impl IntoIterator<Item = (ValidatorId, Weight)>) -> TypesResult<Self> {
        let mut builder = ValidatorsBuilder::new();
        for (id, weight) in pairs {
            builder.set(id, weight);
        }
        builder.build()
    }

    /// Equal-weight set over the given ids.
    pub fn equal(ids: &[ValidatorId]) -> TypesResult<Self> {
        Self::new(ids.iter().map(|&id| (id, 1)))
    }

    pub fn len(&self) -> usize {
        self.inner.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.ids.is_empty()
    }

    pub fn exists(&self, id: ValidatorId) -> bool {
        self.inner.lookup.contains_key(&id)
    }

    pub fn get_idx(&self, id: ValidatorId) -> Option<ValidatorIdx> {
        self.inner.lookup.get(&id).copied()
    }

    pub fn get_id(&self, idx: ValidatorIdx) -> Option<ValidatorId> {
        self.inner.ids.get(idx as usize).copied()
    }

    /// Weight of a validator, 0 if it is not in the set.
    pub fn get_weight(&self, id: ValidatorId) -> Weight {
        self.get_idx(id)
            .map(|idx| self.get_weight_by_idx(idx))
            .unwrap_or(0)
    }

    pub fn get_weight_by_idx(&self, idx: ValidatorIdx) -> Weight {
        self.inner.weights.get(idx as usize).copied().unwrap_or(0)
    }

    pub fn total_weight(&self) -> Weight {
        self.inner.total
    }

    /// Minimal weight strictly above two thirds of the total.
    pub fn quorum(&self) -> Weight {
        self.inner.quorum
    }

    /// Ids in canonical order.
    pub fn sorted_ids(&self) -> &[ValidatorId] {
        &self.inner.ids
    }

    /// Weights in canonical order.
    pub fn sorted_weights(&self) -> &[Weight] {
        &self.inner.weights
    }

    /// `(id, weight)` pairs in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = (ValidatorId, Weight)> + '_ {
        self.inner
            .ids
            .iter()
            .copied()
            .zip(self.inner.weights.iter().copied())
    }

    pub fn new_counter(&self) -> WeightCounter {
        WeightCounter::new(self.clone())
    }

    /// Builder pre-filled with this set, for deriving the next epoch's set.
    pub fn builder(&self) -> ValidatorsBuilder {
        let mut builder = ValidatorsBuilder::new();
        for (id, weight) in self.iter() {
            builder.set(id, weight);
        }
        builder
    }
}

impl Default for Validators {
    /// The empty set.
    fn default() -> Self {
        Validators {
            inner: Arc::new(Inner {
                ids: Vec::new(),
                weights: Vec::new(),
                lookup: HashMap::new(),
                total: 0,
                quorum: 1,
            }),
        }
    }
}

impl PartialEq for Validators {
    fn eq(&self, other: &Self) -> bool {
        self.inner.ids == other.inner.ids && self.inner.weights == other.inner.weights
    }
}

impl Eq for Validators {}

impl fmt::Debug for Validators {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl TryFrom<Vec<(ValidatorId, Weight)>> for Validators {
    type Error = TypesError;

    fn try_from(pairs: Vec<(ValidatorId, Weight)>) -> TypesResult<Self> {
        Validators::new(pairs)
    }
}

impl From<Validators> for Vec<(ValidatorId, Weight)> {
    fn from(validators: Validators) -> Self {
        validators.iter().collect()
    }
}

/// Mutable accumulator for a [`Validators`] set.
#[derive(Debug, Clone, Default)]
pub struct ValidatorsBuilder {
    weights: BTreeMap<ValidatorId, Weight>,
}

impl ValidatorsBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a validator's weight; a zero weight removes it.
    pub fn set(&mut self, id: ValidatorId, weight: Weight) -> &mut Self {
        if weight == 0 {
            self.weights.remove(&id);
        } else {
            self.weights.insert(id, weight);
        }
        self
    }

    pub fn build(&self) -> TypesResult<Validators> {
        let mut pairs: Vec<(ValidatorId, Weight)> =
            self.weights.iter().map(|(&id, &w)| (id, w)).collect();
        // weight desc, id asc
        pairs.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));

        let total: u64 = pairs.iter().map(|&(_, w)| u64::from(w)).sum();
        let total = Weight::try_from(total).map_err(|_| TypesError::WeightOverflow {
            max: Weight::MAX,
        })?;
        let quorum = (u64::from(total) * 2 / 3 + 1) as Weight;

        let lookup = pairs
            .iter()
            .enumerate()
            .map(|(idx, &(id, _))| (id, idx as ValidatorIdx))
            .collect();

        Ok(Validators {
            inner: Arc::new(Inner {
                ids: pairs.iter().map(|&(id, _)| id).collect(),
                weights: pairs.iter().map(|&(_, w)| w).collect(),
                lookup,
                total,
                quorum,
            }),
        })
    }
}

/// Sums the weight of distinct validators until quorum.
#[derive(Debug, Clone)]
pub struct WeightCounter {
    validators: Validators,
    already: Vec<bool>,
    sum: Weight,
    counted: usize,
}

impl WeightCounter {
    pub fn new(validators: Validators) -> Self {
        let n = validators.len();
        Self {
            validators,
            already: vec![false; n],
            sum: 0,
            counted: 0,
        }
    }

    /// Counts a validator by id. Returns `false` if it is unknown, was
    /// already counted, or its weight would overflow the sum.
    pub fn count(&mut self, id: ValidatorId) -> bool {
        match self.validators.get_idx(id) {
            Some(idx) => self.count_by_idx(idx),
            None => false,
        }
    }

    pub fn count_by_idx(&mut self, idx: ValidatorIdx) -> bool {
        let i = idx as usize;
        if i >= self.already.len() || self.already[i] {
            return false;
        }
        let Some(sum) = self
            .sum
            .checked_add(self.validators.get_weight_by_idx(idx))
        else {
            return false;
        };
        self.already[i] = true;
        self.sum = sum;
        self.counted += 1;
        true
    }

    pub fn has_quorum(&self) -> bool {
        self.sum >= self.validators.quorum()
    }

    pub fn sum(&self) -> Weight {
        self.sum
    }

    pub fn num_counted(&self) -> usize {
        self.counted
    }
}
