use crate::domain::model::{Label, Package, Person, PersonRow};
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

/// Outbound notification channel. Implementations own message transport;
/// a returned error means nothing was delivered.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send_one(&self, person: &Person, package: &Package) -> Result<()>;
    async fn send_batch(&self, person: &Person, packages: &[Package]) -> Result<()>;
}

#[async_trait]
pub trait LabelPrinter: Send + Sync {
    async fn print_label(&self, label: &Label) -> Result<()>;
}

/// Source of raw person rows for bulk import (CSV files and the like).
/// The outer error means the source itself could not be read.
pub trait PersonSource {
    fn read_persons(&self) -> Result<Vec<PersonRow>>;
}
