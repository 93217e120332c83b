//! # doorwatchd — doorwatch daemon
//!
//! Composition root that wires all adapters together and runs the doors.
//!
//! ## Responsibilities
//! - Parse configuration (`doorwatch.toml`, env vars)
//! - Initialize tracing
//! - Initialize the `SQLite` connection pool and run migrations
//! - Construct the hardware backend (virtual or Raspberry Pi GPIO)
//! - Start one `DoorController` per configured door, sharing one
//!   `HardwareBus`, plus a `SensorWatch` per door (woken by sensor
//!   interrupts on GPIO) and the `NightlyCheck`
//! - Feed `<origin> <command>` lines from stdin to the `CommandLoop`
//! - Shut down on SIGINT
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer — no domain logic belongs here.

mod config;
mod heartbeat;
mod transport;

use std::collections::HashMap;
use std::error::Error;
use std::sync::Arc;

use tokio::sync::{Notify, mpsc};
use tokio::task::JoinSet;
use tracing_subscriber::EnvFilter;

use doorwatch_adapter_gpio_rppal::{DoorPins, RppalDoors};
use doorwatch_adapter_storage_sqlite_sqlx::SqliteDoorRepository;
use doorwatch_adapter_virtual::{VirtualDoorHardware, VirtualGateway};
use doorwatch_app::bus::HardwareBus;
use doorwatch_app::command_loop::CommandLoop;
use doorwatch_app::door_controller::{DoorController, DoorPorts};
use doorwatch_app::nightly::NightlyCheck;
use doorwatch_app::ports::{DoorActuator, DoorSensor};
use doorwatch_app::sensor_watch::SensorWatch;
use doorwatch_app::services::command_service::{CommandService, RegisteredDoor};
use doorwatch_domain::door::{DoorName, DoorState};

use crate::config::{Backend, Config};
use crate::heartbeat::Heartbeat;

const COMMAND_QUEUE: usize = 64;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let config = Config::load()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_new(&config.logging.filter).unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Database
    let db = doorwatch_adapter_storage_sqlite_sqlx::Config {
        database_url: config.database.url.clone(),
    }
    .build()
    .await?;
    let repository = SqliteDoorRepository::new(db.pool().clone());

    // Hardware
    match config.hardware.backend {
        Backend::Virtual => {
            let hardware = Arc::new(VirtualDoorHardware::new());
            for door in &config.doors {
                hardware.add(DoorName::new(door.name.clone())?, DoorState::Closed);
            }
            tracing::info!(doors = config.doors.len(), "using virtual door hardware");
            serve(&config, hardware, repository, &HashMap::new()).await?;
        }
        Backend::Gpio => {
            let mut pins = HashMap::new();
            for door in &config.doors {
                if let (Some(sensor), Some(actuator)) = (door.sensor_pin, door.actuator_pin) {
                    pins.insert(
                        DoorName::new(door.name.clone())?,
                        DoorPins { sensor, actuator },
                    );
                }
            }
            let gpio = RppalDoors::open(config.hardware.gpio.clone(), pins)?;
            let mut wakeups = HashMap::new();
            for door in gpio.doors() {
                let edges = Arc::new(Notify::new());
                gpio.notify_edges(door, Arc::clone(&edges))?;
                wakeups.insert(door.clone(), edges);
            }
            tracing::info!(doors = wakeups.len(), "using GPIO header");
            serve(&config, Arc::new(gpio), repository, &wakeups).await?;
        }
    }

    db.close().await;
    tracing::info!("doorwatchd stopped");
    Ok(())
}

/// Start every door on `hardware` and run until SIGINT. Doors listed in
/// `wakeups` are sampled early whenever their notifier fires.
async fn serve<H>(
    config: &Config,
    hardware: Arc<H>,
    repository: SqliteDoorRepository,
    wakeups: &HashMap<DoorName, Arc<Notify>>,
) -> Result<(), Box<dyn Error>>
where
    H: DoorSensor + DoorActuator + 'static,
{
    let gateway = Arc::new(VirtualGateway::new());
    let bus = HardwareBus::new();
    let timings = config.door_timings();

    let mut doors = Vec::with_capacity(config.doors.len());
    for door in &config.doors {
        let ports = DoorPorts {
            sensor: Arc::clone(&hardware),
            actuator: Arc::clone(&hardware),
            notifier: Arc::clone(&gateway),
            repository: repository.clone(),
        };
        let name = DoorName::new(door.name.clone())?;
        let controller = DoorController::start(name, ports, bus.clone(), timings).await?;
        doors.push(RegisteredDoor {
            abbreviation: door.abbreviation.clone(),
            controller,
        });
    }
    let service = CommandService::new(doors)?;

    let mut tasks = JoinSet::new();
    for controller in service.controllers() {
        let mut watch = SensorWatch::new(controller.clone(), config.sensor_poll());
        if let Some(edges) = wakeups.get(controller.name()) {
            watch = watch.wake_on(Arc::clone(edges));
        }
        tasks.spawn(watch.run());
    }
    if config.nightly.enabled {
        let doors = service.controllers().cloned().collect();
        tasks.spawn(NightlyCheck::new(doors, config.nightly_at()?).run());
    }

    let (tx, rx) = mpsc::channel(COMMAND_QUEUE);
    tasks.spawn(transport::read_commands(
        tokio::io::BufReader::new(tokio::io::stdin()),
        tx,
    ));
    let command_loop = CommandLoop::new(
        service,
        gateway,
        Heartbeat::new(config.commands.heartbeat_file.clone()),
        config.policy()?,
        config.queue_poll(),
    );
    tasks.spawn(command_loop.run(rx));

    tracing::info!(doors = config.doors.len(), "doorwatchd running");
    tokio::signal::ctrl_c().await?;
    tracing::info!("shutting down");
    tasks.shutdown().await;
    Ok(())
}
