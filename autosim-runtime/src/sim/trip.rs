use std::time::Duration;

use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::core::{round_fuel, DiagnosticCode, Position, Reading};
use crate::runtime::Result;
use crate::{SimConfig, VehicleConfig};

use super::{derive_rng, EngineTemperatureModel, FaultInjector, GpsNavigator};

/// Driving phase of the trip, chosen from the current road speed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TripPhase {
    Accelerating,
    Cruising,
    Decelerating,
}

impl TripPhase {
    pub fn from_speed(config: &VehicleConfig, speed: f64) -> Self {
        if speed < config.phase_low_speed {
            Self::Accelerating
        } else if speed < config.phase_high_speed {
            Self::Cruising
        } else {
            Self::Decelerating
        }
    }
}

impl std::fmt::Display for TripPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Accelerating => write!(f, "accelerating"),
            Self::Cruising => write!(f, "cruising"),
            Self::Decelerating => write!(f, "decelerating"),
        }
    }
}

/// Engine speed for a road speed.
///
/// The engine idles below the idle speed threshold. Above it the engine speed
/// scales linearly with road speed up to the maximum RPM.
pub fn engine_rpm(config: &VehicleConfig, speed: f64) -> f64 {
    if speed < config.idle_speed_threshold {
        return config.idle_rpm;
    }

    let rpm = config.idle_rpm + speed / config.max_speed * (config.max_rpm - config.idle_rpm);
    rpm.max(config.idle_rpm)
}

/// Snapshot of the vehicle state.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VehicleState {
    /// Road speed in km/h.
    pub speed: f64,
    /// Engine speed in RPM.
    pub rpm: f64,
    /// Fuel level in percent.
    pub fuel: f64,
    /// Engine temperature in degrees Celsius.
    pub engine_temperature: f64,
    /// Heading in degrees.
    pub heading: f64,
    pub position: Position,
}

/// Vehicle trip simulator.
///
/// The simulator owns the vehicle state and composes the temperature model,
/// the fault injector and the GPS navigator. All state is created when the
/// trip starts and is discarded with the simulator.
pub struct TripSimulator {
    vehicle: VehicleConfig,
    speed: f64,
    rpm: f64,
    fuel: f64,
    elapsed: Duration,
    phase: TripPhase,
    thermal: EngineTemperatureModel,
    fault: FaultInjector,
    gps: GpsNavigator,
    rng: StdRng,
}

impl TripSimulator {
    /// Construct a new trip simulator.
    ///
    /// The trip seed is taken from the configuration. A fresh seed is drawn
    /// when none is configured.
    pub fn new(config: &SimConfig, codes: Vec<DiagnosticCode>) -> Result<Self> {
        let seed = config.trip.seed.unwrap_or_else(rand::random);

        debug!("Trip seed: {}", seed);

        Self::with_rng(config, codes, StdRng::seed_from_u64(seed))
    }

    /// Construct a new trip simulator from an existing random source.
    ///
    /// Every component receives its own random source derived from `rng`.
    pub fn with_rng(
        config: &SimConfig,
        codes: Vec<DiagnosticCode>,
        mut rng: StdRng,
    ) -> Result<Self> {
        config.validate()?;

        let thermal =
            EngineTemperatureModel::new(&config.thermal, &config.vehicle, derive_rng(&mut rng))?;
        let fault = FaultInjector::new(
            &config.fault,
            config.trip.duration(),
            config.trip.interval(),
            codes,
            derive_rng(&mut rng),
        )?;
        let gps = GpsNavigator::new(&config.gps, derive_rng(&mut rng))?;

        Ok(Self {
            vehicle: config.vehicle.clone(),
            speed: 0.0,
            rpm: config.vehicle.idle_rpm,
            fuel: 100.0,
            elapsed: Duration::ZERO,
            phase: TripPhase::Accelerating,
            thermal,
            fault,
            gps,
            rng,
        })
    }

    /// Advance the trip by `dt` and return the reading for this tick.
    ///
    /// The reading offset is the elapsed trip time at the start of the tick.
    pub fn tick(&mut self, dt: Duration) -> Reading {
        let now = self.elapsed;
        let seconds = dt.as_secs_f64();

        self.phase = TripPhase::from_speed(&self.vehicle, self.speed);

        let delta = match self.phase {
            TripPhase::Accelerating => self
                .rng
                .gen_range(self.vehicle.acceleration_min..self.vehicle.acceleration_max),
            TripPhase::Cruising => super::symmetric(&mut self.rng, self.vehicle.cruise_jitter),
            TripPhase::Decelerating => -self
                .rng
                .gen_range(self.vehicle.deceleration_min..self.vehicle.deceleration_max),
        };

        self.speed = (self.speed + delta).clamp(0.0, self.vehicle.max_speed);
        self.rpm = engine_rpm(&self.vehicle, self.speed);

        let rate = self.speed / self.vehicle.max_speed * self.rpm / self.vehicle.max_rpm
            * self.vehicle.max_fuel_consumption;
        self.fuel = (self.fuel - rate * seconds).max(0.0);

        let engine_temperature = self.thermal.update(self.speed, self.rpm, seconds);
        let dtc = self.fault.tick(now);
        let position = self.gps.update(self.speed, seconds);

        self.elapsed += dt;

        let reading = Reading {
            offset: now,
            rpm: self.rpm.round() as u16,
            speed: self.speed.round() as u16,
            fuel: round_fuel(self.fuel),
            engine_temperature: engine_temperature.round() as i16,
            dtc,
            position,
        };

        info!("[{}] {}", self.phase, reading);

        reading
    }

    /// Snapshot of the current vehicle state.
    pub fn state(&self) -> VehicleState {
        VehicleState {
            speed: self.speed,
            rpm: self.rpm,
            fuel: self.fuel,
            engine_temperature: self.thermal.temperature(),
            heading: self.gps.heading(),
            position: self.gps.position(),
        }
    }

    /// Phase used for the last tick.
    #[inline]
    pub fn phase(&self) -> TripPhase {
        self.phase
    }

    /// Elapsed trip time.
    #[inline]
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    #[inline]
    pub fn fault_injector(&self) -> &FaultInjector {
        &self.fault
    }

    #[inline]
    pub fn fault_injector_mut(&mut self) -> &mut FaultInjector {
        &mut self.fault
    }

    #[inline]
    pub fn gps_mut(&mut self) -> &mut GpsNavigator {
        &mut self.gps
    }
}
