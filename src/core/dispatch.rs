use crate::core::batcher::batch_by_owner;
use crate::core::ledger::{Ledger, LedgerSnapshot};
use crate::core::query::Query;
use crate::domain::model::{
    Association, ImportReport, Label, Package, PackageId, Person, PersonId, ReminderReport,
};
use crate::domain::ports::{LabelPrinter, Notifier, PersonSource, Storage};
use crate::utils::error::{MailroomError, Result};
use chrono::Utc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailroomSettings {
    /// Path of the ledger snapshot inside the storage backend.
    pub ledger_file: String,
    /// Send the new-package notification straight after check-in.
    pub notify_on_check_in: bool,
}

impl Default for MailroomSettings {
    fn default() -> Self {
        Self {
            ledger_file: "ledger.json".to_string(),
            notify_on_check_in: false,
        }
    }
}

/// Use cases exposed to the CLI and any other front end.
///
/// Owns the only writable [`Ledger`]; every successful mutation is written
/// back to storage before returning. A mutation whose write fails is rolled
/// back in memory, so retrying it starts from what storage holds.
pub struct Mailroom<S: Storage> {
    ledger: Ledger,
    storage: S,
    notifier: Box<dyn Notifier>,
    printer: Box<dyn LabelPrinter>,
    settings: MailroomSettings,
}

impl<S: Storage> Mailroom<S> {
    pub async fn open(
        storage: S,
        notifier: Box<dyn Notifier>,
        printer: Box<dyn LabelPrinter>,
        settings: MailroomSettings,
    ) -> Result<Self> {
        let ledger = match storage.read_file(&settings.ledger_file).await {
            Ok(bytes) => {
                let snapshot: LedgerSnapshot = serde_json::from_slice(&bytes)?;
                Ledger::from_snapshot(snapshot)?
            }
            Err(MailroomError::IoError(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("No ledger at {}, starting empty", settings.ledger_file);
                Ledger::new()
            }
            Err(e) => return Err(e),
        };
        tracing::debug!(
            "Ledger loaded: {} persons, {} packages",
            ledger.person_count(),
            ledger.package_count()
        );
        Ok(Self {
            ledger,
            storage,
            notifier,
            printer,
            settings,
        })
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    async fn persist(&self) -> Result<()> {
        let data = serde_json::to_vec_pretty(&self.ledger.snapshot())?;
        self.storage.write_file(&self.settings.ledger_file, &data).await
    }

    async fn commit(&mut self, before: Ledger) -> Result<()> {
        if let Err(e) = self.persist().await {
            tracing::warn!("Ledger write failed, rolling back: {}", e);
            self.ledger = before;
            return Err(e);
        }
        Ok(())
    }

    // Packages

    pub async fn check_in(&mut self, person_id: &PersonId, comment: Option<String>) -> Result<PackageId> {
        let before = self.ledger.clone();
        let package_id = self.ledger.check_in_package(person_id, comment)?;
        self.commit(before).await?;

        if self.settings.notify_on_check_in {
            // the package is in the ledger either way; a failed email can be resent
            if let Err(e) = self.send_notification(package_id).await {
                tracing::warn!("Notification for package {} not sent: {}", package_id, e);
            }
        }
        Ok(package_id)
    }

    pub async fn check_out(&mut self, package_id: PackageId) -> Result<()> {
        let before = self.ledger.clone();
        self.ledger.check_out_package(package_id)?;
        self.commit(before).await
    }

    pub fn package(&self, package_id: PackageId) -> Result<Package> {
        self.ledger.package(package_id)
    }

    pub fn owner(&self, package_id: PackageId) -> Result<Person> {
        self.ledger.owner(package_id)
    }

    pub fn list_packages(&self, query: &Query) -> Vec<Association> {
        query.run(self.ledger.associations())
    }

    pub fn list_packages_str(&self, filter: &str, sort: &str) -> Result<Vec<Association>> {
        let query = Query::parse(filter, sort)?;
        tracing::debug!("Listing packages where {}", query.filter);
        Ok(self.list_packages(&query))
    }

    // Notifications

    pub async fn send_notification(&mut self, package_id: PackageId) -> Result<()> {
        let package = self.ledger.package(package_id)?;
        let person = self.ledger.owner(package_id)?;

        self.notifier.send_one(&person, &package).await?;
        let before = self.ledger.clone();
        self.ledger.mark_notification_sent(package_id)?;
        self.commit(before).await?;
        tracing::info!("Notified {} about package {}", person.person_id, package_id);
        Ok(())
    }

    /// One reminder per person with packages still checked in.
    ///
    /// Every batch is attempted even after a failure; any failure turns the
    /// whole run into [`MailroomError::PartialBatchFailure`] and the run is
    /// not recorded as the last reminder.
    pub async fn send_all_reminders(&mut self) -> Result<ReminderReport> {
        let entries = self.list_packages(&Query::active_by_person());
        let batches = batch_by_owner(entries)?;
        let total = batches.len();
        tracing::info!("Sending {} reminder(s)", total);

        let mut report = ReminderReport::default();
        let mut details = Vec::new();
        for batch in &batches {
            match self.notifier.send_batch(&batch.person, &batch.packages).await {
                Ok(()) => {
                    report.reminded.push(batch.person.person_id.clone());
                    report.packages += batch.packages.len();
                }
                Err(e) => {
                    tracing::warn!("Reminder to {} failed: {}", batch.person.person_id, e);
                    details.push(format!("{}: {}", batch.person.person_id, e));
                }
            }
        }

        if !details.is_empty() {
            return Err(MailroomError::PartialBatchFailure {
                failed: details.len(),
                total,
                details,
            });
        }

        let before = self.ledger.clone();
        self.ledger.record_reminder_run(Utc::now());
        self.commit(before).await?;
        Ok(report)
    }

    pub async fn print_label(&self, package_id: PackageId) -> Result<Label> {
        let package = self.ledger.package(package_id)?;
        let owner = self.ledger.owner(package_id)?;
        let label = Label::for_package(&package, &owner);
        self.printer.print_label(&label).await?;
        Ok(label)
    }

    // Persons

    pub fn person(&self, person_id: &PersonId) -> Result<Person> {
        self.ledger.person(person_id)
    }

    pub fn person_list(&self, search: &str) -> Vec<Person> {
        self.ledger.person_list(search)
    }

    pub async fn add_person(&mut self, person: Person) -> Result<()> {
        let before = self.ledger.clone();
        self.ledger.add_person(person)?;
        self.commit(before).await
    }

    pub async fn edit_person(&mut self, person: Person) -> Result<()> {
        let before = self.ledger.clone();
        self.ledger.edit_person(person)?;
        self.commit(before).await
    }

    pub async fn delete_person(&mut self, person_id: &PersonId) -> Result<Person> {
        let before = self.ledger.clone();
        let removed = self.ledger.delete_person(person_id)?;
        self.commit(before).await?;
        Ok(removed)
    }

    /// Bulk add from an importer. Rejected rows are listed in the report;
    /// use [`ImportReport::into_result`] to treat them as an error.
    pub async fn import_persons(&mut self, source: &impl PersonSource) -> Result<ImportReport> {
        let rows = source.read_persons()?;
        let before = self.ledger.clone();
        let report = self.ledger.import_persons(rows);
        if !report.imported.is_empty() {
            self.commit(before).await?;
        }
        Ok(report)
    }
}
