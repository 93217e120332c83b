//! In-memory port implementations shared by the application-layer tests.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use doorwatch_domain::door::{DoorName, SensorReading};
use doorwatch_domain::error::DoorwatchError;
use doorwatch_domain::record::DoorRecord;
use doorwatch_domain::subscription::Recipient;

use crate::door_controller::DoorController;
use crate::ports::{DoorActuator, DoorRepository, DoorSensor, Liveness, Notifier};

pub type TestController =
    DoorController<Arc<FakeDoor>, Arc<FakeDoor>, Arc<RecordingNotifier>, Arc<InMemoryDoorRepo>>;

/// A door whose button flips the sensor unless jammed.
pub struct FakeDoor {
    position: Mutex<SensorReading>,
    jammed: AtomicBool,
    pulses: AtomicUsize,
}

impl FakeDoor {
    pub fn new(initial: SensorReading) -> Self {
        Self {
            position: Mutex::new(initial),
            jammed: AtomicBool::new(false),
            pulses: AtomicUsize::new(0),
        }
    }

    pub fn set(&self, reading: SensorReading) {
        *self.position.lock().unwrap() = reading;
    }

    pub fn jam(&self) {
        self.jammed.store(true, Ordering::SeqCst);
    }

    pub fn pulses(&self) -> usize {
        self.pulses.load(Ordering::SeqCst)
    }
}

impl DoorSensor for FakeDoor {
    fn read(&self, _door: &DoorName) -> impl Future<Output = SensorReading> + Send {
        let reading = *self.position.lock().unwrap();
        async move { reading }
    }
}

impl DoorActuator for FakeDoor {
    fn pulse(&self, _door: &DoorName) -> impl Future<Output = ()> + Send {
        self.pulses.fetch_add(1, Ordering::SeqCst);
        if !self.jammed.load(Ordering::SeqCst) {
            let mut position = self.position.lock().unwrap();
            if let Some(state) = position.state() {
                *position = state.toggled().into();
            }
        }
        async {}
    }
}

/// Records every message it is asked to send.
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<(String, Vec<Recipient>)>>,
    failing: AtomicBool,
}

impl RecordingNotifier {
    pub fn fail(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn messages(&self) -> Vec<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .map(|(message, _)| message.clone())
            .collect()
    }

    pub fn count_containing(&self, needle: &str) -> usize {
        self.messages()
            .iter()
            .filter(|message| message.contains(needle))
            .count()
    }

    pub fn recipients_of_last(&self) -> Vec<Recipient> {
        self.sent
            .lock()
            .unwrap()
            .last()
            .map(|(_, recipients)| recipients.clone())
            .unwrap_or_default()
    }
}

impl Notifier for RecordingNotifier {
    fn send(
        &self,
        message: &str,
        recipients: &[Recipient],
    ) -> impl Future<Output = Result<(), DoorwatchError>> + Send {
        let result = if self.failing.load(Ordering::SeqCst) {
            Err(DoorwatchError::Notification("gateway unavailable".into()))
        } else {
            self.sent
                .lock()
                .unwrap()
                .push((message.to_string(), recipients.to_vec()));
            Ok(())
        };
        async { result }
    }
}

#[derive(Default)]
pub struct InMemoryDoorRepo {
    store: Mutex<HashMap<DoorName, DoorRecord>>,
    failing: AtomicBool,
    saves: AtomicUsize,
}

impl InMemoryDoorRepo {
    pub fn fail_saves(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn saves(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    pub fn stored(&self, door: &DoorName) -> Option<DoorRecord> {
        self.store.lock().unwrap().get(door).cloned()
    }
}

impl DoorRepository for InMemoryDoorRepo {
    fn load(
        &self,
        door: &DoorName,
    ) -> impl Future<Output = Result<Option<DoorRecord>, DoorwatchError>> + Send {
        let result = self.store.lock().unwrap().get(door).cloned();
        async { Ok(result) }
    }

    fn save(
        &self,
        door: &DoorName,
        record: &DoorRecord,
    ) -> impl Future<Output = Result<(), DoorwatchError>> + Send {
        let result = if self.failing.load(Ordering::SeqCst) {
            Err(DoorwatchError::Storage("disk full".into()))
        } else {
            self.saves.fetch_add(1, Ordering::SeqCst);
            self.store
                .lock()
                .unwrap()
                .insert(door.clone(), record.clone());
            Ok(())
        };
        async { result }
    }
}

#[derive(Default)]
pub struct CountingLiveness {
    beats: AtomicUsize,
}

impl CountingLiveness {
    pub fn beats(&self) -> usize {
        self.beats.load(Ordering::SeqCst)
    }
}

impl Liveness for CountingLiveness {
    fn beat(&self) {
        self.beats.fetch_add(1, Ordering::SeqCst);
    }
}
