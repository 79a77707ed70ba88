//! Dry-run side effects
//!
//! Log what would have happened instead of stopping, publishing or mailing.

use async_trait::async_trait;
use netquota_common::ActionError;
use tracing::info;

use crate::collaborators::{Ack, Mailer, Notifier, ResourceController};

#[derive(Debug, Clone, Copy, Default)]
pub struct DryRunController;

#[async_trait]
impl ResourceController for DryRunController {
    async fn stop(&self, resource_id: &str) -> Result<Ack, ActionError> {
        info!(resource_id, "[dry-run] would stop instance");
        Ok(Ack::default())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DryRunNotifier;

#[async_trait]
impl Notifier for DryRunNotifier {
    async fn publish(
        &self,
        channel: &str,
        subject: &str,
        message: &str,
    ) -> Result<Ack, ActionError> {
        info!(channel, subject, bytes = message.len(), "[dry-run] would publish notification");
        Ok(Ack::default())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DryRunMailer;

#[async_trait]
impl Mailer for DryRunMailer {
    async fn send(&self, subject: &str, body: &str, recipient: &str) -> Result<Ack, ActionError> {
        info!(recipient, subject, "[dry-run] would send email");
        tracing::debug!(body, "Email body");
        Ok(Ack::default())
    }
}
