use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::utils::error::{MailroomError, Result};

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PersonId(String);

impl PersonId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into().trim().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PersonId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PersonId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PackageId(pub u64);

impl fmt::Display for PackageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for PackageId {
    type Err = MailroomError;

    fn from_str(s: &str) -> Result<Self> {
        s.trim()
            .parse::<u64>()
            .map(PackageId)
            .map_err(|_| MailroomError::invalid_record("package_id", format!("'{}' is not a package ID", s)))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    pub person_id: PersonId,
    pub first_name: String,
    pub last_name: String,
    pub email_address: String,
}

impl Person {
    pub fn new(
        person_id: impl Into<PersonId>,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        email_address: impl Into<String>,
    ) -> Self {
        Self {
            person_id: person_id.into(),
            first_name: first_name.into(),
            last_name: last_name.into(),
            email_address: email_address.into(),
        }
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    pub fn last_first_name(&self) -> String {
        format!("{}, {}", self.last_name, self.first_name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Package {
    pub package_id: PackageId,
    pub owner: PersonId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    pub checked_in_at: DateTime<Utc>,
    #[serde(default)]
    pub checked_out: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checked_out_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub notification_sent: bool,
}

impl Package {
    pub fn new(
        package_id: PackageId,
        owner: PersonId,
        comment: Option<String>,
        checked_in_at: DateTime<Utc>,
    ) -> Self {
        Self {
            package_id,
            owner,
            comment: comment
                .map(|c| c.trim().to_string())
                .filter(|c| !c.is_empty()),
            checked_in_at,
            checked_out: false,
            checked_out_at: None,
            notification_sent: false,
        }
    }

    pub fn is_active(&self) -> bool {
        !self.checked_out
    }
}

/// A package joined with its owner. Derived on demand, never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Association {
    pub person: Person,
    pub package: Package,
}

/// One person's outstanding packages, in encounter order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Batch {
    pub person: Person,
    pub packages: Vec<Package>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Label {
    pub package_id: PackageId,
    pub owner_name: String,
}

/// A person row as produced by an importer, before validation.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PersonRecord {
    pub person_id: String,
    pub first_name: String,
    pub last_name: String,
    pub email_address: String,
}

impl From<PersonRecord> for Person {
    fn from(record: PersonRecord) -> Self {
        Person::new(
            record.person_id.as_str(),
            record.first_name.trim(),
            record.last_name.trim(),
            record.email_address.trim(),
        )
    }
}

/// One imported row: the parsed record, or why the row could not be read.
pub type PersonRow = std::result::Result<PersonRecord, String>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordFailure {
    /// 1-based position in the imported batch.
    pub row: usize,
    pub person_id: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    pub imported: Vec<PersonId>,
    pub failures: Vec<RecordFailure>,
}

impl ImportReport {
    pub fn total(&self) -> usize {
        self.imported.len() + self.failures.len()
    }

    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn into_result(self) -> Result<Self> {
        if self.is_complete() {
            return Ok(self);
        }
        Err(MailroomError::PartialBatchFailure {
            failed: self.failures.len(),
            total: self.total(),
            details: self
                .failures
                .iter()
                .map(|f| format!("row {} ({}): {}", f.row, f.person_id, f.reason))
                .collect(),
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReminderReport {
    pub reminded: Vec<PersonId>,
    pub packages: usize,
}
