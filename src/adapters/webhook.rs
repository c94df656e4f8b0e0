use crate::core::message::{Message, MessageSettings};
use crate::domain::model::{Package, PackageId, Person};
use crate::domain::ports::Notifier;
use crate::utils::error::{MailroomError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;

#[derive(Debug, Serialize)]
struct Envelope<'a> {
    kind: &'a str,
    package_ids: Vec<PackageId>,
    #[serde(flatten)]
    message: &'a Message,
}

/// Hands composed messages to a mail relay as JSON over HTTP.
///
/// The relay owns SMTP delivery; a non-2xx answer counts as not delivered.
pub struct WebhookNotifier {
    client: Client,
    endpoint: String,
    token: Option<String>,
    settings: MessageSettings,
}

impl WebhookNotifier {
    pub fn new(
        endpoint: impl Into<String>,
        timeout: Duration,
        token: Option<String>,
        settings: MessageSettings,
    ) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            token,
            settings,
        })
    }

    async fn post(&self, envelope: &Envelope<'_>) -> Result<()> {
        tracing::debug!(
            "Posting {} for {} to {}",
            envelope.kind,
            envelope.message.to,
            self.endpoint
        );
        let mut request = self.client.post(&self.endpoint).json(envelope);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MailroomError::delivery(format!(
                "relay answered {} {}",
                status,
                body.trim()
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn send_one(&self, person: &Person, package: &Package) -> Result<()> {
        let message = Message::package_notice(&self.settings, person, package);
        self.post(&Envelope {
            kind: "notification",
            package_ids: vec![package.package_id],
            message: &message,
        })
        .await
    }

    async fn send_batch(&self, person: &Person, packages: &[Package]) -> Result<()> {
        let message = Message::reminder(&self.settings, person, packages);
        self.post(&Envelope {
            kind: "reminder",
            package_ids: packages.iter().map(|p| p.package_id).collect(),
            message: &message,
        })
        .await
    }
}
