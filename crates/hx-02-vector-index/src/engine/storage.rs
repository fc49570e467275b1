//! Cached reads and write-through writes of the vector tables.

use shared_types::endian::bigendian;
use shared_types::{BranchIdx, EventId, EventSource};

use hx_01_flushable_kv::KeyValueStore;

use super::{VectorEngine, BRANCHES_INFO_KEY};
use crate::domain::{BranchesInfo, HighestBeforeSeq, LowestAfterSeq};
use crate::errors::{VectorError, VectorResult};

impl<S: EventSource> VectorEngine<S> {
    /// Reports storage and decode failures to the crit hook.
    pub(crate) fn check<T>(&self, res: VectorResult<T>) -> VectorResult<T> {
        if let Err(err @ (VectorError::Kv(_) | VectorError::Serialization { .. })) = &res {
            self.crit.report(err);
        }
        res
    }

    pub(crate) fn get_highest_before(&self, id: &EventId) -> VectorResult<Option<HighestBeforeSeq>> {
        if let Some(hb) = self.cache.lock().highest_before.get(id) {
            return Ok(Some(hb.clone()));
        }
        let raw = self.check(self.tables.highest_before.get(id.as_bytes()).map_err(Into::into))?;
        let Some(raw) = raw else {
            return Ok(None);
        };
        let hb = HighestBeforeSeq::from_bytes(raw);
        self.cache.lock().highest_before.put(*id, hb.clone());
        Ok(Some(hb))
    }

    pub(crate) fn get_lowest_after(&self, id: &EventId) -> VectorResult<Option<LowestAfterSeq>> {
        if let Some(la) = self.cache.lock().lowest_after.get(id) {
            return Ok(Some(la.clone()));
        }
        let raw = self.check(self.tables.lowest_after.get(id.as_bytes()).map_err(Into::into))?;
        let Some(raw) = raw else {
            return Ok(None);
        };
        let la = LowestAfterSeq::from_bytes(raw);
        self.cache.lock().lowest_after.put(*id, la.clone());
        Ok(Some(la))
    }

    pub(crate) fn get_event_branch(&self, id: &EventId) -> VectorResult<Option<BranchIdx>> {
        if let Some(branch) = self.cache.lock().event_branch.get(id) {
            return Ok(Some(*branch));
        }
        let raw = self.check(self.tables.event_branch.get(id.as_bytes()).map_err(Into::into))?;
        let Some(raw) = raw else {
            return Ok(None);
        };
        if raw.len() != 4 {
            return self.check(Err(VectorError::Serialization {
                message: format!("event branch of {id}: {} bytes", raw.len()),
            }));
        }
        let branch = bigendian::bytes_to_u32(&raw);
        self.cache.lock().event_branch.put(*id, branch);
        Ok(Some(branch))
    }

    pub(crate) fn set_highest_before(&self, id: &EventId, hb: HighestBeforeSeq) -> VectorResult<()> {
        self.check(
            self.tables
                .highest_before
                .put(id.as_bytes(), hb.as_bytes())
                .map_err(Into::into),
        )?;
        self.cache.lock().highest_before.put(*id, hb);
        Ok(())
    }

    pub(crate) fn set_lowest_after(&self, id: &EventId, la: LowestAfterSeq) -> VectorResult<()> {
        self.check(
            self.tables
                .lowest_after
                .put(id.as_bytes(), la.as_bytes())
                .map_err(Into::into),
        )?;
        self.cache.lock().lowest_after.put(*id, la);
        Ok(())
    }

    pub(crate) fn set_event_branch(&self, id: &EventId, branch: BranchIdx) -> VectorResult<()> {
        self.check(
            self.tables
                .event_branch
                .put(id.as_bytes(), &bigendian::u32_to_bytes(branch))
                .map_err(Into::into),
        )?;
        self.cache.lock().event_branch.put(*id, branch);
        Ok(())
    }

    /// Stored branch table, or one branch per validator for a fresh epoch.
    pub(crate) fn load_or_init_branches(&self) -> VectorResult<BranchesInfo> {
        let raw = self.check(self.tables.branches_info.get(BRANCHES_INFO_KEY).map_err(Into::into))?;
        match raw {
            Some(raw) => {
                let info: BranchesInfo =
                    self.check(bincode::deserialize(&raw).map_err(VectorError::from))?;
                if info.num_validators() != self.validators.len() {
                    return Err(VectorError::InconsistentDb {
                        message: format!(
                            "branches stored for {} validators, epoch has {}",
                            info.num_validators(),
                            self.validators.len()
                        ),
                    });
                }
                Ok(info)
            }
            None => Ok(BranchesInfo::new(self.validators.len())),
        }
    }

    pub(crate) fn save_branches(&self) -> VectorResult<()> {
        let raw = self.check(bincode::serialize(&self.branches).map_err(VectorError::from))?;
        self.check(
            self.tables
                .branches_info
                .put(BRANCHES_INFO_KEY, &raw)
                .map_err(Into::into),
        )
    }
}
