pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use adapters::{CsvPersonSource, FileLabelPrinter, LogNotifier, WebhookNotifier};
pub use config::{cli::LocalStorage, toml_config::MailroomConfig};
pub use crate::core::{
    dispatch::{Mailroom, MailroomSettings},
    ledger::Ledger,
    query::{Filter, Query, Sort, SortKey, SortOrder},
};
pub use domain::model::{Association, Batch, ImportReport, Package, PackageId, Person, PersonId};
pub use utils::error::{MailroomError, Result};
