//! Logging notification gateway with an inspectable outbox.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use doorwatch_app::ports::Notifier;
use doorwatch_domain::error::DoorwatchError;
use doorwatch_domain::subscription::Recipient;

/// A message handed to the gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    pub message: String,
    pub recipients: Vec<Recipient>,
}

/// [`Notifier`] that logs every message instead of delivering it.
#[derive(Debug, Default)]
pub struct VirtualGateway {
    outbox: Mutex<Vec<SentMessage>>,
    offline: AtomicBool,
}

impl VirtualGateway {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// While offline, every send fails and nothing reaches the outbox.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::Relaxed);
    }

    /// Messages sent so far, oldest first.
    #[must_use]
    pub fn sent(&self) -> Vec<SentMessage> {
        self.lock().clone()
    }

    /// Messages addressed to `recipient`, oldest first.
    #[must_use]
    pub fn sent_to(&self, recipient: &Recipient) -> Vec<String> {
        self.lock()
            .iter()
            .filter(|sent| sent.recipients.contains(recipient))
            .map(|sent| sent.message.clone())
            .collect()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<SentMessage>> {
        self.outbox.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Notifier for VirtualGateway {
    fn send(
        &self,
        message: &str,
        recipients: &[Recipient],
    ) -> impl Future<Output = Result<(), DoorwatchError>> + Send {
        let result = if self.offline.load(Ordering::Relaxed) {
            Err(DoorwatchError::Notification("virtual gateway is offline".into()))
        } else {
            let to: Vec<&str> = recipients.iter().map(Recipient::as_str).collect();
            tracing::info!(to = ?to, text = message, "notification");
            self.lock().push(SentMessage {
                message: message.to_string(),
                recipients: recipients.to_vec(),
            });
            Ok(())
        };
        async { result }
    }
}
