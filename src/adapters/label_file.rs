use crate::domain::model::Label;
use crate::domain::ports::{LabelPrinter, Storage};
use crate::utils::error::Result;
use async_trait::async_trait;

/// Renders labels to `label-<package id>.txt` files for a print spooler to pick up.
pub struct FileLabelPrinter<S: Storage> {
    storage: S,
    printer_name: Option<String>,
}

impl<S: Storage> FileLabelPrinter<S> {
    pub fn new(storage: S, printer_name: Option<String>) -> Self {
        Self {
            storage,
            printer_name,
        }
    }

    pub fn file_name(label: &Label) -> String {
        format!("label-{}.txt", label.package_id)
    }
}

#[async_trait]
impl<S: Storage> LabelPrinter for FileLabelPrinter<S> {
    async fn print_label(&self, label: &Label) -> Result<()> {
        let file_name = Self::file_name(label);
        self.storage
            .write_file(&file_name, label.render().as_bytes())
            .await?;
        tracing::info!(
            "🏷️ Label {} queued for {}",
            file_name,
            self.printer_name.as_deref().unwrap_or("default printer")
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::cli::LocalStorage;
    use crate::domain::model::PackageId;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_writes_label_file() {
        let dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(dir.path().to_str().unwrap().to_string());
        let printer = FileLabelPrinter::new(storage, Some("Zebra".to_string()));
        let label = Label {
            package_id: PackageId(20240101120000),
            owner_name: "Pathak, Navin".to_string(),
        };

        printer.print_label(&label).await.unwrap();

        let written = std::fs::read_to_string(dir.path().join("label-20240101120000.txt")).unwrap();
        assert_eq!(written, "Pathak, Navin\n20240101120000\n");
    }
}
