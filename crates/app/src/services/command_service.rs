//! Command service — executes parsed commands against the registered doors.

use std::collections::HashSet;
use std::fmt::Write as _;
use std::time::Duration;

use doorwatch_domain::command::{Command, CommandError, HELP_TEXT, RESERVED_WORDS};
use doorwatch_domain::door::DoorState;
use doorwatch_domain::error::{DoorwatchError, ValidationError};
use doorwatch_domain::event::Category;
use doorwatch_domain::subscription::Recipient;

use crate::door_controller::{DoorController, ToggleOutcome};
use crate::ports::{DoorActuator, DoorRepository, DoorSensor, Notifier};

/// A controller plus the short word users type to address it.
pub struct RegisteredDoor<S, A, N, R> {
    pub abbreviation: String,
    pub controller: DoorController<S, A, N, R>,
}

/// Application service turning command text into door operations and a
/// reply for the sender.
pub struct CommandService<S, A, N, R> {
    doors: Vec<RegisteredDoor<S, A, N, R>>,
}

impl<S, A, N, R> CommandService<S, A, N, R>
where
    S: DoorSensor + 'static,
    A: DoorActuator + 'static,
    N: Notifier + 'static,
    R: DoorRepository + 'static,
{
    /// Register the doors, normalising abbreviations to lowercase.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidAbbreviation`] for an abbreviation
    /// that is blank, contains whitespace, is a command word, would make its
    /// `s<abbreviation>` snooze shorthand a command word, or is `s` followed
    /// by another door's abbreviation, and
    /// [`ValidationError::DuplicateDoor`] when two doors share a name or an
    /// abbreviation.
    pub fn new(doors: Vec<RegisteredDoor<S, A, N, R>>) -> Result<Self, DoorwatchError> {
        let mut doors = doors;
        for door in &mut doors {
            door.abbreviation = door.abbreviation.trim().to_lowercase();
        }

        let mut names = HashSet::new();
        let mut abbreviations = HashSet::new();
        for door in &doors {
            let abbreviation = door.abbreviation.as_str();
            if abbreviation.is_empty()
                || abbreviation.contains(char::is_whitespace)
                || RESERVED_WORDS.contains(&abbreviation)
                || RESERVED_WORDS.contains(&format!("s{abbreviation}").as_str())
            {
                return Err(ValidationError::InvalidAbbreviation(abbreviation.to_string()).into());
            }
            if !names.insert(door.controller.name().as_str().to_lowercase()) {
                return Err(
                    ValidationError::DuplicateDoor(door.controller.name().to_string()).into(),
                );
            }
            if !abbreviations.insert(abbreviation) {
                return Err(ValidationError::DuplicateDoor(abbreviation.to_string()).into());
            }
        }
        for door in &doors {
            if let Some(rest) = door.abbreviation.strip_prefix('s')
                && abbreviations.contains(rest)
            {
                return Err(ValidationError::InvalidAbbreviation(door.abbreviation.clone()).into());
            }
        }

        Ok(Self { doors })
    }

    pub fn controllers(&self) -> impl Iterator<Item = &DoorController<S, A, N, R>> {
        self.doors.iter().map(|door| &door.controller)
    }

    /// Parse `text` against the registered abbreviations.
    ///
    /// # Errors
    ///
    /// See [`Command::parse`].
    pub fn parse(&self, text: &str) -> Result<Command, CommandError> {
        let abbreviations: Vec<&str> = self
            .doors
            .iter()
            .map(|door| door.abbreviation.as_str())
            .collect();
        Command::parse(text, &abbreviations)
    }

    /// Parse and execute `text` on behalf of `origin`. Always produces a
    /// reply; errors are rendered as their user-facing message.
    pub async fn handle_text(&self, origin: &Recipient, text: &str) -> String {
        let result = match self.parse(text) {
            Ok(command) => self.execute(origin, command).await,
            Err(err) => Err(err),
        };
        result.unwrap_or_else(|err| {
            tracing::info!(%origin, text, error = %err, "command rejected");
            err.to_string()
        })
    }

    /// Execute a parsed command and return the reply for `origin`.
    ///
    /// Button presses run in the background; their outcome reaches
    /// subscribers as events.
    ///
    /// # Errors
    ///
    /// Returns [`CommandError::UnknownDoor`] when the command names a door
    /// that is not registered.
    #[tracing::instrument(skip(self, origin), fields(origin = %origin))]
    pub async fn execute(
        &self,
        origin: &Recipient,
        command: Command,
    ) -> Result<String, CommandError> {
        match command {
            Command::Status => Ok(self.status().await),
            Command::Help => Ok(HELP_TEXT.to_string()),
            Command::List => Ok(self.list(origin).await),
            Command::Subscribe { door, category } => {
                let door = self.door(&door)?;
                for event in category.event_types() {
                    door.subscribe(*event, origin.clone()).await;
                }
                Ok(format!(
                    "Subscribe to {category} events for {}'s door confirmed!",
                    door.name()
                ))
            }
            Command::Unsubscribe { door, category } => {
                let door = self.door(&door)?;
                for event in category.event_types() {
                    door.unsubscribe(*event, origin).await;
                }
                Ok(format!(
                    "Unsubscribe to {category} events for {}'s door confirmed!",
                    door.name()
                ))
            }
            Command::History { door, count } => {
                let door = self.door(&door)?;
                Ok(door.open_history(count).await.to_string())
            }
            Command::Snooze { door, minutes } => {
                let door = self.door(&door)?;
                if let Some(minutes) = minutes {
                    door.snooze(Some(Duration::from_secs(minutes.saturating_mul(60))))
                        .await;
                    Ok(format!(
                        "Reminders for {}'s door snoozed for {minutes} minutes.",
                        door.name()
                    ))
                } else {
                    door.snooze(None).await;
                    Ok(format!(
                        "Reminders for {}'s door are off until it opens again.",
                        door.name()
                    ))
                }
            }
            Command::Open { door } => {
                let door = self.door(&door)?;
                if door.confirmed_state().await == DoorState::Open {
                    return Ok(format!("{}'s door is already open.", door.name()));
                }
                spawn_toggle(door.clone(), Toggle::Open);
                Ok(format!("Opening {}'s door.", door.name()))
            }
            Command::Close { door } => {
                let door = self.door(&door)?;
                if door.confirmed_state().await == DoorState::Closed {
                    return Ok(format!("{}'s door is already closed.", door.name()));
                }
                spawn_toggle(door.clone(), Toggle::Close);
                Ok(format!("Closing {}'s door.", door.name()))
            }
            Command::Press { door } => {
                let door = self.door(&door)?;
                spawn_toggle(door.clone(), Toggle::Press);
                Ok(format!("Pressing the button for {}'s door.", door.name()))
            }
        }
    }

    fn door(&self, abbreviation: &str) -> Result<&DoorController<S, A, N, R>, CommandError> {
        self.doors
            .iter()
            .find(|door| door.abbreviation == abbreviation)
            .map(|door| &door.controller)
            .ok_or_else(|| CommandError::UnknownDoor(abbreviation.to_string()))
    }

    async fn status(&self) -> String {
        let mut lines = Vec::with_capacity(self.doors.len());
        for door in &self.doors {
            let status = door.controller.status().await;
            let mut line = format!("{}'s door is {}.", status.name, status.state);
            if status.durability_degraded {
                line.push_str(" Changes are not being saved.");
            }
            lines.push(line);
        }
        lines.join("\n")
    }

    async fn list(&self, origin: &Recipient) -> String {
        let mut reply = String::from("You'll be notified of the following events:");
        for door in &self.doors {
            let events = door.controller.subscriptions_for(origin).await;
            let categories: Vec<Category> = Category::ALL
                .into_iter()
                .filter(|category| {
                    category
                        .event_types()
                        .iter()
                        .any(|event| events.contains(event))
                })
                .collect();
            let name = door.controller.name();
            if categories.is_empty() {
                let _ = write!(reply, "\nNothing for {name}'s door.");
            } else {
                let _ = write!(reply, "\n{name}'s door:");
                for category in categories {
                    let _ = write!(reply, "\n - {}", category.describe());
                }
            }
        }
        reply
    }
}

#[derive(Debug, Clone, Copy)]
enum Toggle {
    Open,
    Close,
    Press,
}

fn spawn_toggle<S, A, N, R>(door: DoorController<S, A, N, R>, toggle: Toggle)
where
    S: DoorSensor + 'static,
    A: DoorActuator + 'static,
    N: Notifier + 'static,
    R: DoorRepository + 'static,
{
    tokio::spawn(async move {
        let outcome = match toggle {
            Toggle::Open => door.open().await,
            Toggle::Close => door.close().await,
            Toggle::Press => door.press().await,
        };
        match outcome {
            ToggleOutcome::NotNeeded => {
                tracing::info!(door = %door.name(), ?toggle, "door already in position");
            }
            ToggleOutcome::Completed(event) => {
                tracing::debug!(door = %door.name(), ?toggle, ?event, "toggle finished");
            }
            ToggleOutcome::SensorUnavailable => {
                tracing::warn!(door = %door.name(), ?toggle, "toggle outcome unknown");
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use doorwatch_domain::door::{DoorName, SensorReading};
    use doorwatch_domain::event::EventType;

    use super::*;
    use crate::bus::HardwareBus;
    use crate::door_controller::{DoorPorts, DoorTimings};
    use crate::testing::{FakeDoor, InMemoryDoorRepo, RecordingNotifier, TestController};

    type TestService =
        CommandService<Arc<FakeDoor>, Arc<FakeDoor>, Arc<RecordingNotifier>, Arc<InMemoryDoorRepo>>;

    struct Harness {
        ivan: Arc<FakeDoor>,
        heather: Arc<FakeDoor>,
        notifier: Arc<RecordingNotifier>,
        service: TestService,
    }

    fn alice() -> Recipient {
        Recipient::new("+15551234567").unwrap()
    }

    async fn controller(
        name: &str,
        door: &Arc<FakeDoor>,
        notifier: &Arc<RecordingNotifier>,
    ) -> TestController {
        DoorController::start(
            DoorName::new(name).unwrap(),
            DoorPorts {
                sensor: Arc::clone(door),
                actuator: Arc::clone(door),
                notifier: Arc::clone(notifier),
                repository: Arc::new(InMemoryDoorRepo::default()),
            },
            HardwareBus::new(),
            DoorTimings::default(),
        )
        .await
        .unwrap()
    }

    async fn harness() -> Harness {
        let ivan = Arc::new(FakeDoor::new(SensorReading::Closed));
        let heather = Arc::new(FakeDoor::new(SensorReading::Open));
        let notifier = Arc::new(RecordingNotifier::default());
        let service = CommandService::new(vec![
            RegisteredDoor {
                abbreviation: "I".to_string(),
                controller: controller("Ivan", &ivan, &notifier).await,
            },
            RegisteredDoor {
                abbreviation: "h".to_string(),
                controller: controller("Heather", &heather, &notifier).await,
            },
        ])
        .unwrap();
        Harness {
            ivan,
            heather,
            notifier,
            service,
        }
    }

    #[tokio::test]
    async fn should_report_status_of_every_door() {
        let h = harness().await;
        let reply = h.service.handle_text(&alice(), "status").await;
        assert_eq!(reply, "Ivan's door is closed.\nHeather's door is open.");
    }

    #[tokio::test]
    async fn should_return_help_text() {
        let h = harness().await;
        assert_eq!(h.service.handle_text(&alice(), "?").await, HELP_TEXT);
    }

    #[tokio::test]
    async fn should_subscribe_origin_to_every_event_of_category() {
        let h = harness().await;

        let reply = h.service.handle_text(&alice(), "sub i error").await;

        assert_eq!(reply, "Subscribe to error events for Ivan's door confirmed!");
        let ivan = h.service.door("i").unwrap();
        assert!(ivan.is_subscribed(EventType::ToggleFailedOpen, &alice()).await);
        assert!(ivan.is_subscribed(EventType::ToggleFailedClosed, &alice()).await);
        assert!(!ivan.is_subscribed(EventType::Opened, &alice()).await);
    }

    #[tokio::test]
    async fn should_unsubscribe_origin() {
        let h = harness().await;
        h.service.handle_text(&alice(), "sub h timer").await;

        let reply = h.service.handle_text(&alice(), "unsub h timer").await;

        assert_eq!(reply, "Unsubscribe to timer events for Heather's door confirmed!");
        let heather = h.service.door("h").unwrap();
        assert!(
            !heather
                .is_subscribed(EventType::StillOpenReminder, &alice())
                .await
        );
    }

    #[tokio::test]
    async fn should_list_subscriptions_per_door() {
        let h = harness().await;
        h.service.handle_text(&alice(), "sub i open").await;
        h.service.handle_text(&alice(), "sub i timer").await;

        let reply = h.service.handle_text(&alice(), "list").await;

        assert_eq!(
            reply,
            "You'll be notified of the following events:\n\
             Ivan's door:\n - When door opens\n - When door is left open\n\
             Nothing for Heather's door."
        );
    }

    #[tokio::test]
    async fn should_render_empty_history() {
        let h = harness().await;
        assert_eq!(
            h.service.handle_text(&alice(), "hist h 3").await,
            "Heather's door was opened:\n - never"
        );
    }

    #[tokio::test]
    async fn should_reject_unknown_door() {
        let h = harness().await;
        assert_eq!(
            h.service.handle_text(&alice(), "hist x").await,
            "Invalid door name 'x'."
        );
    }

    #[tokio::test]
    async fn should_reply_to_unknown_command() {
        let h = harness().await;
        assert_eq!(
            h.service.handle_text(&alice(), "dance").await,
            "I don't know that command. Sorry."
        );
    }

    #[tokio::test(start_paused = true)]
    async fn should_open_in_background_and_reply_immediately() {
        let h = harness().await;
        let ivan = h.service.door("i").unwrap().clone();
        ivan.subscribe(EventType::ToggleConfirmedOpen, alice()).await;

        let reply = h.service.handle_text(&alice(), "open i").await;
        assert_eq!(reply, "Opening Ivan's door.");

        tokio::time::sleep(Duration::from_secs(31)).await;
        assert_eq!(h.ivan.pulses(), 1);
        assert_eq!(ivan.confirmed_state().await, DoorState::Open);
        assert_eq!(h.notifier.count_containing("opened as requested"), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn should_not_press_when_already_in_position() {
        let h = harness().await;

        assert_eq!(
            h.service.handle_text(&alice(), "close i").await,
            "Ivan's door is already closed."
        );
        assert_eq!(
            h.service.handle_text(&alice(), "open h").await,
            "Heather's door is already open."
        );

        tokio::time::sleep(Duration::from_secs(31)).await;
        assert_eq!(h.ivan.pulses(), 0);
        assert_eq!(h.heather.pulses(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn should_press_on_bare_abbreviation() {
        let h = harness().await;

        assert_eq!(
            h.service.handle_text(&alice(), "h").await,
            "Pressing the button for Heather's door."
        );
        tokio::time::sleep(Duration::from_secs(31)).await;

        assert_eq!(h.heather.pulses(), 1);
        assert_eq!(
            h.service.door("h").unwrap().confirmed_state().await,
            DoorState::Closed
        );
    }

    #[tokio::test(start_paused = true)]
    async fn should_snooze_with_and_without_minutes() {
        let h = harness().await;

        assert_eq!(
            h.service.handle_text(&alice(), "sh 15").await,
            "Reminders for Heather's door snoozed for 15 minutes."
        );
        assert!(h.service.door("h").unwrap().status().await.timer_armed);

        assert_eq!(
            h.service.handle_text(&alice(), "snooze h").await,
            "Reminders for Heather's door are off until it opens again."
        );
        assert!(!h.service.door("h").unwrap().status().await.timer_armed);
    }

    #[tokio::test]
    async fn should_reject_duplicate_abbreviations() {
        let notifier = Arc::new(RecordingNotifier::default());
        let door = Arc::new(FakeDoor::new(SensorReading::Closed));
        let result = CommandService::new(vec![
            RegisteredDoor {
                abbreviation: "i".to_string(),
                controller: controller("Ivan", &door, &notifier).await,
            },
            RegisteredDoor {
                abbreviation: "I".to_string(),
                controller: controller("Isla", &door, &notifier).await,
            },
        ]);
        assert!(matches!(
            result,
            Err(DoorwatchError::Validation(ValidationError::DuplicateDoor(_)))
        ));
    }

    #[tokio::test]
    async fn should_reject_abbreviations_that_shadow_commands() {
        let notifier = Arc::new(RecordingNotifier::default());
        let door = Arc::new(FakeDoor::new(SensorReading::Closed));
        for (first, second) in [("list", "h"), ("i", "si")] {
            let result = CommandService::new(vec![
                RegisteredDoor {
                    abbreviation: first.to_string(),
                    controller: controller("Ivan", &door, &notifier).await,
                },
                RegisteredDoor {
                    abbreviation: second.to_string(),
                    controller: controller("Heather", &door, &notifier).await,
                },
            ]);
            assert!(matches!(
                result,
                Err(DoorwatchError::Validation(
                    ValidationError::InvalidAbbreviation(_)
                ))
            ));
        }
    }

    #[tokio::test]
    async fn should_reject_abbreviation_whose_snooze_shorthand_is_a_command() {
        let notifier = Arc::new(RecordingNotifier::default());
        let door = Arc::new(FakeDoor::new(SensorReading::Closed));
        for abbreviation in ["ub", "tatus", "NOOZE"] {
            let result = CommandService::new(vec![RegisteredDoor {
                abbreviation: abbreviation.to_string(),
                controller: controller("Ivan", &door, &notifier).await,
            }]);
            assert!(matches!(
                result,
                Err(DoorwatchError::Validation(
                    ValidationError::InvalidAbbreviation(_)
                ))
            ));
        }
    }
}
