//! Confirmation records.

use shared_types::endian::bigendian;
use shared_types::{EventId, Frame};

use hx_01_flushable_kv::KeyValueStore;

use super::Store;
use crate::errors::{AbftError, AbftResult};

impl Store {
    /// Frame that confirmed `id`, 0 if it is not confirmed yet.
    pub fn get_event_confirmed_on(&self, id: &EventId) -> AbftResult<Frame> {
        let res = self
            .epoch_db()?
            .confirmed
            .get(id.as_bytes())
            .map_err(AbftError::from);
        let raw = self.check(res)?;
        Ok(raw.map_or(0, |b| bigendian::bytes_to_u32(&b)))
    }

    pub fn set_event_confirmed_on(&self, id: &EventId, frame: Frame) -> AbftResult<()> {
        let res = self
            .epoch_db()?
            .confirmed
            .put(id.as_bytes(), &bigendian::u32_to_bytes(frame))
            .map_err(AbftError::from);
        self.check(res)
    }
}
