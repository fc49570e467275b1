//! Merge of a cached snapshot with a backend iterator.

use std::cmp::Ordering;
use std::iter::Peekable;

use crate::errors::KvResult;
use crate::ports::outbound::{KvIter, KvPair};

pub(super) struct MergedIter<'a> {
    cached: Peekable<std::vec::IntoIter<(Vec<u8>, Option<Vec<u8>>)>>,
    parent: Peekable<KvIter<'a>>,
}

impl<'a> MergedIter<'a> {
    pub(super) fn new(cached: Vec<(Vec<u8>, Option<Vec<u8>>)>, parent: KvIter<'a>) -> Self {
        Self {
            cached: cached.into_iter().peekable(),
            parent: parent.peekable(),
        }
    }
}

impl Iterator for MergedIter<'_> {
    type Item = KvResult<KvPair>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let order = match (self.cached.peek(), self.parent.peek()) {
                (None, None) => return None,
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                // surface backend errors immediately
                (Some(_), Some(Err(_))) => Ordering::Greater,
                (Some((ck, _)), Some(Ok((pk, _)))) => ck.cmp(pk),
            };
            match order {
                Ordering::Greater => return self.parent.next(),
                Ordering::Equal => {
                    self.parent.next();
                }
                Ordering::Less => {}
            }
            match self.cached.next() {
                Some((key, Some(value))) => return Some(Ok((key, value))),
                Some((_, None)) => continue,
                None => return None,
            }
        }
    }
}
