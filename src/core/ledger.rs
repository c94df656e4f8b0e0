use crate::core::id_gen::PackageIdGenerator;
use crate::domain::model::{
    Association, ImportReport, Package, PackageId, Person, PersonId, PersonRow, RecordFailure,
};
use crate::utils::error::{EntityKind, MailroomError, Result};
use crate::utils::validation::validate_person_field;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Serialized form of the ledger, as written to `ledger.json`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    #[serde(default)]
    pub persons: Vec<Person>,
    #[serde(default)]
    pub packages: Vec<Package>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_reminder_at: Option<DateTime<Utc>>,
}

/// Authoritative store of persons and packages.
///
/// Every mutation goes through a method here; callers only ever receive clones.
/// A package's `checked_out` and `notification_sent` flags only move from
/// false to true, and every package's owner is present in the person map.
#[derive(Debug, Clone, Default)]
pub struct Ledger {
    persons: BTreeMap<PersonId, Person>,
    packages: BTreeMap<PackageId, Package>,
    id_gen: PackageIdGenerator,
    last_reminder_at: Option<DateTime<Utc>>,
}

fn validate_person(person: &Person) -> Result<()> {
    validate_person_field("person_id", person.person_id.as_str())?;
    validate_person_field("first_name", &person.first_name)?;
    validate_person_field("last_name", &person.last_name)?;
    validate_person_field("email_address", &person.email_address)?;
    Ok(())
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_snapshot(snapshot: LedgerSnapshot) -> Result<Self> {
        let mut ledger = Ledger::new();
        for person in snapshot.persons {
            if ledger.persons.contains_key(&person.person_id) {
                return Err(MailroomError::Corrupt {
                    message: format!("person {} appears twice", person.person_id),
                });
            }
            ledger.persons.insert(person.person_id.clone(), person);
        }
        for package in snapshot.packages {
            if !ledger.persons.contains_key(&package.owner) {
                return Err(MailroomError::Corrupt {
                    message: format!(
                        "package {} is owned by unknown person {}",
                        package.package_id, package.owner
                    ),
                });
            }
            if ledger.packages.contains_key(&package.package_id) {
                return Err(MailroomError::Corrupt {
                    message: format!("package {} appears twice", package.package_id),
                });
            }
            ledger.packages.insert(package.package_id, package);
        }
        let highest = ledger.packages.keys().next_back().copied();
        ledger.id_gen = PackageIdGenerator::resume_after(highest);
        ledger.last_reminder_at = snapshot.last_reminder_at;
        Ok(ledger)
    }

    pub fn snapshot(&self) -> LedgerSnapshot {
        LedgerSnapshot {
            persons: self.persons.values().cloned().collect(),
            packages: self.packages.values().cloned().collect(),
            last_reminder_at: self.last_reminder_at,
        }
    }

    pub fn person_count(&self) -> usize {
        self.persons.len()
    }

    pub fn package_count(&self) -> usize {
        self.packages.len()
    }

    // Persons

    pub fn add_person(&mut self, person: Person) -> Result<()> {
        validate_person(&person)?;
        if self.persons.contains_key(&person.person_id) {
            return Err(MailroomError::duplicate(EntityKind::Person, &person.person_id));
        }
        tracing::debug!("Adding person {}", person.person_id);
        self.persons.insert(person.person_id.clone(), person);
        Ok(())
    }

    pub fn edit_person(&mut self, person: Person) -> Result<()> {
        validate_person(&person)?;
        let existing = self
            .persons
            .get_mut(&person.person_id)
            .ok_or_else(|| MailroomError::not_found(EntityKind::Person, &person.person_id))?;
        existing.first_name = person.first_name;
        existing.last_name = person.last_name;
        existing.email_address = person.email_address;
        Ok(())
    }

    /// Removes a person together with their checked-out package history.
    /// Refused while the person still has packages waiting in the mail room.
    pub fn delete_person(&mut self, person_id: &PersonId) -> Result<Person> {
        if !self.persons.contains_key(person_id) {
            return Err(MailroomError::not_found(EntityKind::Person, person_id));
        }
        let active = self
            .packages
            .values()
            .filter(|p| &p.owner == person_id && p.is_active())
            .count();
        if active > 0 {
            return Err(MailroomError::InvalidTransition {
                message: format!(
                    "person {} still has {} package(s) checked in",
                    person_id, active
                ),
            });
        }
        self.packages.retain(|_, p| &p.owner != person_id);
        self.persons
            .remove(person_id)
            .ok_or_else(|| MailroomError::not_found(EntityKind::Person, person_id))
    }

    pub fn person(&self, person_id: &PersonId) -> Result<Person> {
        self.persons
            .get(person_id)
            .cloned()
            .ok_or_else(|| MailroomError::not_found(EntityKind::Person, person_id))
    }

    /// Case-insensitive substring match on ID, first, last and full name.
    pub fn person_list(&self, search: &str) -> Vec<Person> {
        let needle = search.trim().to_lowercase();
        let mut persons: Vec<Person> = self
            .persons
            .values()
            .filter(|p| {
                needle.is_empty()
                    || p.person_id.as_str().to_lowercase().contains(&needle)
                    || p.full_name().to_lowercase().contains(&needle)
                    || p.last_first_name().to_lowercase().contains(&needle)
            })
            .cloned()
            .collect();
        persons.sort_by(|a, b| {
            (&a.last_name, &a.first_name, &a.person_id).cmp(&(&b.last_name, &b.first_name, &b.person_id))
        });
        persons
    }

    /// Adds each row independently; a bad row never aborts the rest.
    pub fn import_persons(&mut self, rows: Vec<PersonRow>) -> ImportReport {
        let mut report = ImportReport::default();
        for (index, row) in rows.into_iter().enumerate() {
            let record = match row {
                Ok(record) => record,
                Err(reason) => {
                    tracing::warn!("Import row {} unreadable: {}", index + 1, reason);
                    report.failures.push(RecordFailure {
                        row: index + 1,
                        person_id: String::new(),
                        reason,
                    });
                    continue;
                }
            };
            let raw_id = record.person_id.clone();
            let person = Person::from(record);
            let person_id = person.person_id.clone();
            match self.add_person(person) {
                Ok(()) => report.imported.push(person_id),
                Err(e) => {
                    tracing::warn!("Import row {} ({}) rejected: {}", index + 1, raw_id, e);
                    report.failures.push(RecordFailure {
                        row: index + 1,
                        person_id: raw_id,
                        reason: e.to_string(),
                    });
                }
            }
        }
        tracing::info!(
            "Imported {} of {} person records",
            report.imported.len(),
            report.total()
        );
        report
    }

    // Packages

    pub fn check_in_package(&mut self, person_id: &PersonId, comment: Option<String>) -> Result<PackageId> {
        self.check_in_package_at(person_id, comment, Utc::now())
    }

    pub fn check_in_package_at(
        &mut self,
        person_id: &PersonId,
        comment: Option<String>,
        at: DateTime<Utc>,
    ) -> Result<PackageId> {
        if !self.persons.contains_key(person_id) {
            return Err(MailroomError::not_found(EntityKind::Person, person_id));
        }
        let packages = &self.packages;
        let package_id = self.id_gen.next_id(at, |id| packages.contains_key(&id))?;
        let package = Package::new(package_id, person_id.clone(), comment, at);
        self.packages.insert(package_id, package);
        tracing::info!("Checked in package {} for {}", package_id, person_id);
        Ok(package_id)
    }

    pub fn check_out_package(&mut self, package_id: PackageId) -> Result<()> {
        self.check_out_package_at(package_id, Utc::now())
    }

    pub fn check_out_package_at(&mut self, package_id: PackageId, at: DateTime<Utc>) -> Result<()> {
        let package = self
            .packages
            .get_mut(&package_id)
            .ok_or_else(|| MailroomError::not_found(EntityKind::Package, package_id))?;
        if package.checked_out {
            return Err(MailroomError::AlreadyCheckedOut {
                package_id: package_id.to_string(),
            });
        }
        package.checked_out = true;
        package.checked_out_at = Some(at);
        tracing::info!("Checked out package {}", package_id);
        Ok(())
    }

    pub fn package(&self, package_id: PackageId) -> Result<Package> {
        self.packages
            .get(&package_id)
            .cloned()
            .ok_or_else(|| MailroomError::not_found(EntityKind::Package, package_id))
    }

    pub fn is_checked_out(&self, package_id: PackageId) -> Result<bool> {
        self.packages
            .get(&package_id)
            .map(|p| p.checked_out)
            .ok_or_else(|| MailroomError::not_found(EntityKind::Package, package_id))
    }

    pub fn owner(&self, package_id: PackageId) -> Result<Person> {
        let package = self
            .packages
            .get(&package_id)
            .ok_or_else(|| MailroomError::not_found(EntityKind::Package, package_id))?;
        self.person(&package.owner)
    }

    pub fn mark_notification_sent(&mut self, package_id: PackageId) -> Result<()> {
        let package = self
            .packages
            .get_mut(&package_id)
            .ok_or_else(|| MailroomError::not_found(EntityKind::Package, package_id))?;
        package.notification_sent = true;
        Ok(())
    }

    /// Every package joined with its owner, in package ID order.
    pub fn associations(&self) -> Vec<Association> {
        self.packages
            .values()
            .filter_map(|package| {
                self.persons.get(&package.owner).map(|person| Association {
                    person: person.clone(),
                    package: package.clone(),
                })
            })
            .collect()
    }

    pub fn record_reminder_run(&mut self, at: DateTime<Utc>) {
        self.last_reminder_at = Some(at);
    }

    pub fn last_reminder_at(&self) -> Option<DateTime<Utc>> {
        self.last_reminder_at
    }
}
