//! Command loop — consumes inbound commands from a transport and replies.
//!
//! The loop waits on a bounded channel with a timeout so that the
//! [`Liveness`] port is signalled even when no commands arrive. Commands
//! from origins outside the allow-list never reach the doors; admins are
//! alerted instead.

use std::collections::BTreeSet;
use std::time::Duration;

use tokio::sync::mpsc;

use doorwatch_domain::subscription::Recipient;

use crate::ports::{DoorActuator, DoorRepository, DoorSensor, Liveness, Notifier};
use crate::services::command_service::CommandService;

/// One message received by a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundCommand {
    pub origin: Recipient,
    pub text: String,
}

/// Who may send commands and who hears about everyone else.
#[derive(Debug, Clone, Default)]
pub struct CommandPolicy {
    pub allowed: BTreeSet<Recipient>,
    pub admins: Vec<Recipient>,
}

/// Outcome of handling a single inbound command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Handled {
    Replied(String),
    Rejected,
}

pub struct CommandLoop<S, A, N, R, G, L> {
    service: CommandService<S, A, N, R>,
    gateway: G,
    liveness: L,
    policy: CommandPolicy,
    poll: Duration,
}

impl<S, A, N, R, G, L> CommandLoop<S, A, N, R, G, L>
where
    S: DoorSensor + 'static,
    A: DoorActuator + 'static,
    N: Notifier + 'static,
    R: DoorRepository + 'static,
    G: Notifier,
    L: Liveness,
{
    #[must_use]
    pub fn new(
        service: CommandService<S, A, N, R>,
        gateway: G,
        liveness: L,
        policy: CommandPolicy,
        poll: Duration,
    ) -> Self {
        Self {
            service,
            gateway,
            liveness,
            policy,
            poll,
        }
    }

    /// Process commands until every sender of `commands` is dropped.
    #[tracing::instrument(skip_all)]
    pub async fn run(self, mut commands: mpsc::Receiver<InboundCommand>) {
        tracing::info!(poll_secs = self.poll.as_secs(), "command loop started");
        loop {
            self.liveness.beat();
            match tokio::time::timeout(self.poll, commands.recv()).await {
                Err(_) => tracing::trace!("no command received within poll interval"),
                Ok(None) => {
                    tracing::info!("command channel closed, stopping command loop");
                    break;
                }
                Ok(Some(inbound)) => {
                    self.handle(inbound).await;
                }
            }
        }
    }

    /// Authorize, execute and reply to one command.
    #[tracing::instrument(skip(self, inbound), fields(origin = %inbound.origin))]
    pub async fn handle(&self, inbound: InboundCommand) -> Handled {
        if !self.policy.allowed.contains(&inbound.origin) {
            tracing::warn!(text = %inbound.text, "command from unauthorized origin");
            self.alert_admins(&inbound.origin).await;
            return Handled::Rejected;
        }

        tracing::info!(text = %inbound.text, "command received");
        let reply = self.service.handle_text(&inbound.origin, &inbound.text).await;
        if let Err(err) = self
            .gateway
            .send(&reply, std::slice::from_ref(&inbound.origin))
            .await
        {
            tracing::warn!(error = ?err, "failed to send reply");
        }
        Handled::Replied(reply)
    }

    async fn alert_admins(&self, origin: &Recipient) {
        if self.policy.admins.is_empty() {
            return;
        }
        let alert = format!("Got msg from invalid number {origin}");
        if let Err(err) = self.gateway.send(&alert, &self.policy.admins).await {
            tracing::warn!(error = ?err, "failed to alert admins");
        }
    }
}
