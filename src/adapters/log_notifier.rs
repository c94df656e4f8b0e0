use crate::core::message::{Message, MessageSettings};
use crate::domain::model::{Package, Person};
use crate::domain::ports::Notifier;
use crate::utils::error::Result;
use async_trait::async_trait;
use std::sync::Mutex;

/// Dry-run notifier: composes every message, logs it and keeps a copy.
pub struct LogNotifier {
    settings: MessageSettings,
    sent: Mutex<Vec<Message>>,
}

impl LogNotifier {
    pub fn new(settings: MessageSettings) -> Self {
        Self {
            settings,
            sent: Mutex::new(Vec::new()),
        }
    }

    pub fn sent_messages(&self) -> Vec<Message> {
        self.sent.lock().map(|sent| sent.clone()).unwrap_or_default()
    }

    fn record(&self, message: Message) {
        tracing::info!("📧 {} -> {} <{}>", message.subject, message.to_alias, message.to);
        tracing::debug!("{}", message.body);
        if let Ok(mut sent) = self.sent.lock() {
            sent.push(message);
        }
    }
}

#[async_trait]
impl Notifier for LogNotifier {
    async fn send_one(&self, person: &Person, package: &Package) -> Result<()> {
        self.record(Message::package_notice(&self.settings, person, package));
        Ok(())
    }

    async fn send_batch(&self, person: &Person, packages: &[Package]) -> Result<()> {
        self.record(Message::reminder(&self.settings, person, packages));
        Ok(())
    }
}
