//! Timed simulation loop.
//!
//! [`SimulationEngine`] owns the [`Farm`] for its whole lifetime, so no
//! locking is needed: ticks, the watering interval and operator commands
//! are all serviced from one `tokio::select!` loop. The watering pause is a
//! timer branch of that loop, never a blocking sleep.

use std::time::Duration;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::sync::mpsc;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use farmlink_core::error::CoreError;
use farmlink_core::event_names::EVENT_TELEMETRY_UPDATE;
use farmlink_core::protocol::Frame;
use farmlink_core::simulation::{Farm, SimCommand, TickOutcome};

/// Default seconds between simulation ticks.
pub const DEFAULT_TICK_SECS: u64 = 5;

/// Default seconds the pump runs during automatic watering.
pub const DEFAULT_WATERING_SECS: u64 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    pub tick_interval: Duration,
    pub watering_duration: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_secs(DEFAULT_TICK_SECS),
            watering_duration: Duration::from_secs(DEFAULT_WATERING_SECS),
        }
    }
}

impl EngineConfig {
    /// Load timing from the environment.
    ///
    /// | Variable            | Default |
    /// |---------------------|---------|
    /// | `SIM_TICK_SECS`     | `5`     |
    /// | `SIM_WATERING_SECS` | `3`     |
    pub fn from_env() -> Result<Self, CoreError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an explicit variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, CoreError> {
        Ok(Self {
            tick_interval: secs_from(&lookup, "SIM_TICK_SECS", DEFAULT_TICK_SECS)?,
            watering_duration: secs_from(&lookup, "SIM_WATERING_SECS", DEFAULT_WATERING_SECS)?,
        })
    }
}

fn secs_from(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &str,
    default: u64,
) -> Result<Duration, CoreError> {
    let secs = match lookup(var) {
        Some(raw) => raw
            .trim()
            .parse::<u64>()
            .map_err(|_| CoreError::Validation(format!("{var} must be a whole number of seconds")))?,
        None => default,
    };
    if secs == 0 {
        return Err(CoreError::Validation(format!("{var} must be greater than zero")));
    }
    Ok(Duration::from_secs(secs))
}

pub struct SimulationEngine {
    farm: Farm,
    rng: StdRng,
    config: EngineConfig,
}

impl SimulationEngine {
    /// Engine over the default farm with a randomly seeded RNG.
    pub fn new(config: EngineConfig) -> Self {
        Self::with_farm(config, Farm::default(), StdRng::seed_from_u64(rand::random()))
    }

    pub fn with_farm(config: EngineConfig, farm: Farm, rng: StdRng) -> Self {
        Self { farm, rng, config }
    }

    /// Run until `cancel` fires, the command channel closes, or nobody is
    /// listening for telemetry any more.
    ///
    /// Emits a `telemetry_update` frame on every tick, at the start and end
    /// of each automatic watering interval, and after every operator
    /// command that changed the farm.
    pub async fn run(
        mut self,
        mut commands: mpsc::UnboundedReceiver<Frame>,
        telemetry: mpsc::UnboundedSender<Frame>,
        cancel: CancellationToken,
    ) {
        let mut ticker = tokio::time::interval(self.config.tick_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let watering = tokio::time::sleep(Duration::ZERO);
        tokio::pin!(watering);
        let mut watering_active = false;

        tracing::info!(
            tick_secs = self.config.tick_interval.as_secs(),
            watering_secs = self.config.watering_duration.as_secs(),
            zones = self.farm.zones().len(),
            "Simulation engine started"
        );

        loop {
            let emit = tokio::select! {
                biased;

                _ = cancel.cancelled() => {
                    tracing::info!("Simulation engine stopping");
                    break;
                }
                command = commands.recv() => {
                    let Some(frame) = command else {
                        tracing::info!("Command channel closed, simulation engine stopping");
                        break;
                    };
                    self.handle_command(&frame, &mut watering_active)
                }
                () = &mut watering, if watering_active => {
                    watering_active = false;
                    let changed = self.farm.finish_watering();
                    if changed {
                        tracing::info!("Auto watering finished, pump off");
                    }
                    changed
                }
                _ = ticker.tick() => {
                    if let TickOutcome::WateringStarted { zones } = self.farm.tick(&mut self.rng) {
                        tracing::info!(?zones, "Critical zones detected, auto watering started");
                        watering
                            .as_mut()
                            .reset(Instant::now() + self.config.watering_duration);
                        watering_active = true;
                    }
                    true
                }
            };

            if emit && !self.emit(&telemetry) {
                tracing::info!("Telemetry receiver dropped, simulation engine stopping");
                break;
            }
        }
    }

    /// Apply a relayed command. Returns `true` if a snapshot should follow.
    fn handle_command(&mut self, frame: &Frame, watering_active: &mut bool) -> bool {
        let Some(command) = SimCommand::from_frame(frame) else {
            tracing::debug!(event = %frame.event, "Ignoring non-command frame");
            return false;
        };

        if command.is_pump_override() && *watering_active {
            tracing::info!(?command, "Operator command interrupts auto watering");
            *watering_active = false;
        }

        let changed = self.farm.apply(&command);
        if changed {
            tracing::info!(?command, "Operator command applied");
        } else {
            tracing::warn!(?command, "Command did not match any zone, ignored");
        }
        changed
    }

    fn emit(&self, telemetry: &mpsc::UnboundedSender<Frame>) -> bool {
        let snapshot = self.farm.snapshot();
        tracing::debug!(
            pump = ?snapshot.pump.state,
            soil_avg = ?snapshot.soil_avg,
            status = %snapshot.status.message,
            "Emitting telemetry"
        );
        telemetry
            .send(Frame::new(EVENT_TELEMETRY_UPDATE, snapshot.to_value()))
            .is_ok()
    }
}
