use crate::domain::model::PackageId;
use crate::utils::error::{MailroomError, Result};
use chrono::{DateTime, Utc};

/// Issues package IDs that read as `yyyyMMddHHmmss` check-in timestamps.
///
/// IDs are strictly increasing within a generator: when two packages arrive in
/// the same second the later one gets the next free number instead of the
/// timestamp, and any ID the ledger already holds is skipped.
#[derive(Debug, Clone, Default)]
pub struct PackageIdGenerator {
    last_issued: Option<PackageId>,
}

impl PackageIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resume after the highest ID already in use.
    pub fn resume_after(last: Option<PackageId>) -> Self {
        Self { last_issued: last }
    }

    pub fn timestamp_id(at: DateTime<Utc>) -> PackageId {
        let digits = at.format("%Y%m%d%H%M%S").to_string();
        // 14 ASCII digits always fit in u64
        PackageId(digits.parse().unwrap_or_default())
    }

    /// Fails with [`MailroomError::Corrupt`] once the ID space above the last
    /// issued ID is used up; the generator is left unchanged in that case.
    pub fn next_id(&mut self, at: DateTime<Utc>, is_taken: impl Fn(PackageId) -> bool) -> Result<PackageId> {
        let mut candidate = Self::timestamp_id(at);
        if let Some(last) = self.last_issued {
            if candidate <= last {
                candidate = successor(last)?;
            }
        }
        while is_taken(candidate) {
            tracing::debug!("Package ID {} already taken, retrying", candidate);
            candidate = successor(candidate)?;
        }
        self.last_issued = Some(candidate);
        Ok(candidate)
    }
}

fn successor(id: PackageId) -> Result<PackageId> {
    id.0.checked_add(1).map(PackageId).ok_or_else(|| MailroomError::Corrupt {
        message: format!("no package ID left after {}", id),
    })
}
