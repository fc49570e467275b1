//! # Tables
//!
//! A [`Table`] is a keyed view over a shared backend: every key is stored
//! with a fixed prefix (optionally followed by a separator). Tables sharing
//! a backend must use disjoint prefixes.

use std::sync::Arc;

use crate::errors::KvResult;
use crate::ports::outbound::{BatchOperation, KeyValueStore, KvIter};

/// `prefix ‖ key`.
pub fn prefixed(key: &[u8], prefix: &[u8]) -> Vec<u8> {
    [prefix, key].concat()
}

/// Strips `prefix` from a stored key.
pub fn no_prefix(key: &[u8], prefix: &[u8]) -> Vec<u8> {
    key.get(prefix.len()..).map(<[u8]>::to_vec).unwrap_or_default()
}

/// Smallest byte string greater than every key starting with `prefix`.
///
/// Returns `None` when no such bound exists (empty or all-`0xFF` prefix).
pub fn inc_prefix(prefix: &[u8]) -> Option<Vec<u8>> {
    let last = prefix.iter().rposition(|&b| b != 0xFF)?;
    let mut limit = prefix[..=last].to_vec();
    limit[last] += 1;
    Some(limit)
}

/// Prefixed view over a backend.
#[derive(Clone)]
pub struct Table {
    underlying: Arc<dyn KeyValueStore>,
    prefix: Vec<u8>,
}

impl Table {
    pub fn new(underlying: Arc<dyn KeyValueStore>, prefix: &[u8]) -> Self {
        Self::with_separator(underlying, prefix, &[])
    }

    pub fn with_separator(underlying: Arc<dyn KeyValueStore>, prefix: &[u8], separator: &[u8]) -> Self {
        Self {
            underlying,
            prefix: [prefix, separator].concat(),
        }
    }

    /// Table nested inside this one.
    pub fn sub_table(&self, prefix: &[u8]) -> Table {
        Table {
            underlying: self.underlying.clone(),
            prefix: prefixed(prefix, &self.prefix),
        }
    }

    pub fn prefix(&self) -> &[u8] {
        &self.prefix
    }

    pub fn underlying(&self) -> &Arc<dyn KeyValueStore> {
        &self.underlying
    }
}

impl KeyValueStore for Table {
    fn get(&self, key: &[u8]) -> KvResult<Option<Vec<u8>>> {
        self.underlying.get(&prefixed(key, &self.prefix))
    }

    fn has(&self, key: &[u8]) -> KvResult<bool> {
        self.underlying.has(&prefixed(key, &self.prefix))
    }

    fn put(&self, key: &[u8], value: &[u8]) -> KvResult<()> {
        self.underlying.put(&prefixed(key, &self.prefix), value)
    }

    fn delete(&self, key: &[u8]) -> KvResult<()> {
        self.underlying.delete(&prefixed(key, &self.prefix))
    }

    fn atomic_batch_write(&self, operations: Vec<BatchOperation>) -> KvResult<()> {
        let operations = operations
            .into_iter()
            .map(|op| match op {
                BatchOperation::Put { key, value } => BatchOperation::Put {
                    key: prefixed(&key, &self.prefix),
                    value,
                },
                BatchOperation::Delete { key } => BatchOperation::Delete {
                    key: prefixed(&key, &self.prefix),
                },
            })
            .collect();
        self.underlying.atomic_batch_write(operations)
    }

    fn iter(&self, prefix: &[u8], start: &[u8]) -> KvResult<KvIter<'_>> {
        let full = prefixed(prefix, &self.prefix);
        let strip = self.prefix.len();
        let iter = self
            .underlying
            .iter(&full, start)?
            .map(move |item| item.map(|(k, v)| (k[strip..].to_vec(), v)));
        Ok(Box::new(iter))
    }

    fn compact(&self, start: &[u8], limit: Option<&[u8]>) -> KvResult<()> {
        let start = prefixed(start, &self.prefix);
        let limit = match limit {
            Some(limit) => Some(prefixed(limit, &self.prefix)),
            None => inc_prefix(&self.prefix),
        };
        self.underlying.compact(&start, limit.as_deref())
    }
}
