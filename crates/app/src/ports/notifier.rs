//! Notification gateway port — best-effort text delivery.

use std::future::Future;
use std::sync::Arc;

use doorwatch_domain::error::DoorwatchError;
use doorwatch_domain::subscription::Recipient;

/// Delivers a text message to a list of recipients (SMS, chat, …).
pub trait Notifier: Send + Sync {
    /// Send `message` to every recipient.
    ///
    /// Delivery is best-effort: callers log a returned error and carry on.
    fn send(
        &self,
        message: &str,
        recipients: &[Recipient],
    ) -> impl Future<Output = Result<(), DoorwatchError>> + Send;
}

impl<T: Notifier> Notifier for Arc<T> {
    fn send(
        &self,
        message: &str,
        recipients: &[Recipient],
    ) -> impl Future<Output = Result<(), DoorwatchError>> + Send {
        (**self).send(message, recipients)
    }
}
