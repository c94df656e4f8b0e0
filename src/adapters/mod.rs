// Adapters layer: concrete implementations of the domain ports.

pub mod csv_import;
pub mod label_file;
pub mod log_notifier;
pub mod webhook;

pub use csv_import::CsvPersonSource;
pub use label_file::FileLabelPrinter;
pub use log_notifier::LogNotifier;
pub use webhook::WebhookNotifier;
