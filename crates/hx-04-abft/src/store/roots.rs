//! Roots by frame.

use shared_types::endian::bigendian;
use shared_types::{EventId, Frame, ValidatorId, EVENT_ID_LEN};

use hx_01_flushable_kv::KeyValueStore;
use hx_03_election::RootAndSlot;

use super::Store;
use crate::errors::{AbftError, AbftResult};

const ROOT_KEY_LEN: usize = 4 + 4 + EVENT_ID_LEN;

fn root_key(frame: Frame, validator: ValidatorId, id: &EventId) -> Vec<u8> {
    let mut key = Vec::with_capacity(ROOT_KEY_LEN);
    key.extend_from_slice(&bigendian::u32_to_bytes(frame));
    key.extend_from_slice(&bigendian::u32_to_bytes(validator));
    key.extend_from_slice(id.as_bytes());
    key
}

fn parse_root_key(key: &[u8]) -> AbftResult<RootAndSlot> {
    if key.len() != ROOT_KEY_LEN {
        return Err(AbftError::Serialization {
            message: format!("root key of {} bytes", key.len()),
        });
    }
    let frame = bigendian::bytes_to_u32(&key[0..4]);
    let validator = bigendian::bytes_to_u32(&key[4..8]);
    let id = EventId::from_slice(&key[8..]).ok_or_else(|| AbftError::Serialization {
        message: "root key event id".to_string(),
    })?;
    Ok(RootAndSlot::new(id, frame, validator))
}

impl Store {
    /// Records `id` as a root of `validator` at `frame`.
    pub fn add_root(&self, frame: Frame, validator: ValidatorId, id: &EventId) -> AbftResult<()> {
        let res = self
            .epoch_db()?
            .roots
            .put(&root_key(frame, validator, id), &[])
            .map_err(AbftError::from);
        self.check(res)?;
        self.cache.lock().frame_roots.pop(&frame);
        Ok(())
    }

    /// Forgets a root recorded by [`Store::add_root`].
    pub fn remove_root(&self, frame: Frame, validator: ValidatorId, id: &EventId) -> AbftResult<()> {
        let res = self
            .epoch_db()?
            .roots
            .delete(&root_key(frame, validator, id))
            .map_err(AbftError::from);
        self.check(res)?;
        self.cache.lock().frame_roots.pop(&frame);
        Ok(())
    }

    /// Roots of `frame` ordered by validator id, then event id.
    pub fn get_frame_roots(&self, frame: Frame) -> AbftResult<Vec<RootAndSlot>> {
        if let Some(roots) = self.cache.lock().frame_roots.get(&frame) {
            return Ok(roots.clone());
        }
        let roots = self.check(self.read_frame_roots(frame))?;
        self.cache.lock().frame_roots.put(frame, roots.clone());
        Ok(roots)
    }

    fn read_frame_roots(&self, frame: Frame) -> AbftResult<Vec<RootAndSlot>> {
        let epoch_db = self.epoch_db()?;
        let prefix = bigendian::u32_to_bytes(frame);
        // drained before returning: iterators may hold a read lock
        let mut roots = Vec::new();
        for item in epoch_db.roots.iter(&prefix, &[])? {
            let (key, _) = item?;
            roots.push(parse_root_key(&key)?);
        }
        Ok(roots)
    }
}
