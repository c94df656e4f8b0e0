pub mod batcher;
pub mod dispatch;
pub mod id_gen;
pub mod ledger;
pub mod message;
pub mod query;

pub use crate::domain::model::{Association, Batch, Package, PackageId, Person, PersonId};
pub use crate::domain::ports::{LabelPrinter, Notifier, PersonSource, Storage};
pub use crate::utils::error::Result;
