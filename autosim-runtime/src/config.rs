use std::time::Duration;

use serde::Deserialize;

use crate::runtime::{Error, Result};

pub trait Configurable: Clone {
    fn global(&self) -> &GlobalConfig;
}

/// Autosim global configuration.
#[derive(Clone, Debug)]
pub struct GlobalConfig {
    /// Name of the binary.
    pub bin_name: String,

    /// Whether the application runs as daemon.
    pub daemon: bool,
}

impl Configurable for GlobalConfig {
    fn global(&self) -> &GlobalConfig {
        self
    }
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            bin_name: String::new(),
            daemon: false,
        }
    }
}

fn invalid(reason: &str) -> Error {
    Error::InvalidConfig(reason.to_string())
}

/// Reject NaN and infinite values.
fn ensure_finite(section: &str, fields: &[(&str, f64)]) -> Result {
    match fields.iter().find(|(_, value)| !value.is_finite()) {
        Some((name, _)) => Err(Error::InvalidConfig(format!(
            "{} {} must be a finite number",
            section, name
        ))),
        None => Ok(()),
    }
}

/// Simulation configuration.
///
/// Every section falls back to its defaults when omitted from the
/// configuration file.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct SimConfig {
    /// Trip timing.
    pub trip: TripConfig,
    /// Vehicle constants.
    pub vehicle: VehicleConfig,
    /// Engine temperature model.
    pub thermal: ThermalConfig,
    /// Fault injection timing.
    pub fault: FaultConfig,
    /// GPS start and heading drift.
    pub gps: GpsConfig,
}

impl SimConfig {
    /// Validate all sections.
    pub fn validate(&self) -> Result {
        self.trip.validate()?;
        self.vehicle.validate()?;
        self.thermal.validate()?;
        self.fault.validate()?;
        self.gps.validate()
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct TripConfig {
    /// Tick interval in milliseconds.
    pub interval: u64,
    /// Trip duration in seconds.
    pub duration: u64,
    /// Wait for the interval between ticks. When disabled the whole trip is
    /// generated as fast as the publisher accepts readings.
    pub realtime: bool,
    /// Random seed for the trip. A fresh seed is drawn when absent.
    pub seed: Option<u64>,
}

impl TripConfig {
    #[inline]
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval)
    }

    #[inline]
    pub fn duration(&self) -> Duration {
        Duration::from_secs(self.duration)
    }

    pub fn validate(&self) -> Result {
        if self.interval == 0 {
            return Err(invalid("trip interval must be positive"));
        }
        if self.duration == 0 {
            return Err(invalid("trip duration must be positive"));
        }
        if self.interval() > self.duration() {
            return Err(invalid("trip interval exceeds trip duration"));
        }

        Ok(())
    }
}

impl Default for TripConfig {
    fn default() -> Self {
        Self {
            interval: 15_000,
            duration: 600,
            realtime: true,
            seed: None,
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct VehicleConfig {
    /// Maximum road speed in km/h.
    pub max_speed: f64,
    /// Engine idle speed in RPM.
    pub idle_rpm: f64,
    /// Engine speed at maximum road speed in RPM.
    pub max_rpm: f64,
    /// Fuel consumption in percent per second at full speed and full RPM.
    pub max_fuel_consumption: f64,
    /// Road speed in km/h below which the engine idles.
    pub idle_speed_threshold: f64,
    /// Road speed in km/h below which the vehicle accelerates.
    pub phase_low_speed: f64,
    /// Road speed in km/h from which the vehicle decelerates.
    pub phase_high_speed: f64,
    /// Lower bound of the speed gain per tick in km/h.
    pub acceleration_min: f64,
    /// Upper bound (exclusive) of the speed gain per tick in km/h.
    pub acceleration_max: f64,
    /// Maximum speed change per tick while cruising in km/h.
    pub cruise_jitter: f64,
    /// Lower bound of the speed loss per tick in km/h.
    pub deceleration_min: f64,
    /// Upper bound (exclusive) of the speed loss per tick in km/h.
    pub deceleration_max: f64,
}

impl VehicleConfig {
    pub fn validate(&self) -> Result {
        ensure_finite(
            "vehicle",
            &[
                ("max_speed", self.max_speed),
                ("idle_rpm", self.idle_rpm),
                ("max_rpm", self.max_rpm),
                ("max_fuel_consumption", self.max_fuel_consumption),
                ("idle_speed_threshold", self.idle_speed_threshold),
                ("phase_low_speed", self.phase_low_speed),
                ("phase_high_speed", self.phase_high_speed),
                ("acceleration_min", self.acceleration_min),
                ("acceleration_max", self.acceleration_max),
                ("cruise_jitter", self.cruise_jitter),
                ("deceleration_min", self.deceleration_min),
                ("deceleration_max", self.deceleration_max),
            ],
        )?;

        if self.max_speed <= 0.0 {
            return Err(invalid("vehicle max speed must be positive"));
        }
        if self.idle_rpm <= 0.0 {
            return Err(invalid("vehicle idle rpm must be positive"));
        }
        if self.max_rpm <= self.idle_rpm {
            return Err(invalid("vehicle max rpm must exceed idle rpm"));
        }
        if self.max_fuel_consumption < 0.0 {
            return Err(invalid("vehicle fuel consumption must not be negative"));
        }
        if self.idle_speed_threshold < 0.0 {
            return Err(invalid("vehicle idle speed threshold must not be negative"));
        }
        if self.phase_low_speed >= self.phase_high_speed {
            return Err(invalid("vehicle phase bands must be ascending"));
        }
        if self.acceleration_min < 0.0 || self.acceleration_min >= self.acceleration_max {
            return Err(invalid("vehicle acceleration range is empty"));
        }
        if self.deceleration_min < 0.0 || self.deceleration_min >= self.deceleration_max {
            return Err(invalid("vehicle deceleration range is empty"));
        }
        if self.cruise_jitter < 0.0 {
            return Err(invalid("vehicle cruise jitter must not be negative"));
        }

        Ok(())
    }
}

impl Default for VehicleConfig {
    fn default() -> Self {
        Self {
            max_speed: 120.0,
            idle_rpm: 800.0,
            max_rpm: 6_000.0,
            max_fuel_consumption: 0.005,
            idle_speed_threshold: 1.0,
            phase_low_speed: 30.0,
            phase_high_speed: 90.0,
            acceleration_min: 2.0,
            acceleration_max: 5.0,
            cruise_jitter: 1.0,
            deceleration_min: 2.0,
            deceleration_max: 5.0,
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct ThermalConfig {
    /// Lowest reported engine temperature in degrees Celsius.
    pub min: f64,
    /// Highest reported engine temperature in degrees Celsius.
    pub max: f64,
    /// Engine temperature at trip start in degrees Celsius.
    pub initial: f64,
    /// Thermal time constant in seconds.
    pub tau: f64,
    /// Target temperature with the engine at rest.
    pub baseline: f64,
    /// Target gain at full road speed.
    pub speed_coefficient: f64,
    /// Target gain at full engine load.
    pub load_coefficient: f64,
    /// Fraction of the maximum speed considered high speed.
    pub high_speed_ratio: f64,
    /// Seconds of high speed driving before the full bonus applies.
    pub sustain: f64,
    /// Target gain after sustained high speed driving.
    pub bonus_max: f64,
    /// Jitter magnitude per update in degrees Celsius.
    pub jitter: f64,
}

impl ThermalConfig {
    pub fn validate(&self) -> Result {
        ensure_finite(
            "thermal",
            &[
                ("min", self.min),
                ("max", self.max),
                ("initial", self.initial),
                ("tau", self.tau),
                ("baseline", self.baseline),
                ("speed_coefficient", self.speed_coefficient),
                ("load_coefficient", self.load_coefficient),
                ("high_speed_ratio", self.high_speed_ratio),
                ("sustain", self.sustain),
                ("bonus_max", self.bonus_max),
                ("jitter", self.jitter),
            ],
        )?;

        if self.min >= self.max {
            return Err(invalid("thermal range is empty"));
        }
        if self.tau <= 0.0 {
            return Err(invalid("thermal time constant must be positive"));
        }
        if self.sustain <= 0.0 {
            return Err(invalid("thermal sustain period must be positive"));
        }
        if !(0.0..=1.0).contains(&self.high_speed_ratio) {
            return Err(invalid("thermal high speed ratio must be within [0, 1]"));
        }
        if self.jitter < 0.0 {
            return Err(invalid("thermal jitter must not be negative"));
        }

        Ok(())
    }
}

impl Default for ThermalConfig {
    fn default() -> Self {
        Self {
            min: 80.0,
            max: 100.0,
            initial: 80.0,
            tau: 30.0,
            baseline: 82.0,
            speed_coefficient: 10.0,
            load_coefficient: 6.0,
            high_speed_ratio: 0.95,
            sustain: 30.0,
            bonus_max: 2.0,
            jitter: 0.2,
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct FaultConfig {
    /// Seconds a fault stays active.
    pub active_duration: u64,
    /// Seconds after a fault clears before another may start.
    pub cooldown: u64,
    /// Chance of a random fault on each idle tick.
    pub probability: f64,
    /// Plan one guaranteed fault within the trip.
    pub scheduled: bool,
    /// Seconds at the start and end of the trip kept free of the scheduled
    /// fault.
    pub schedule_margin: u64,
}

impl FaultConfig {
    #[inline]
    pub fn active_duration(&self) -> Duration {
        Duration::from_secs(self.active_duration)
    }

    #[inline]
    pub fn cooldown(&self) -> Duration {
        Duration::from_secs(self.cooldown)
    }

    #[inline]
    pub fn schedule_margin(&self) -> Duration {
        Duration::from_secs(self.schedule_margin)
    }

    pub fn validate(&self) -> Result {
        if self.active_duration == 0 {
            return Err(invalid("fault active duration must be positive"));
        }
        if !(0.0..=1.0).contains(&self.probability) {
            return Err(invalid("fault probability must be within [0, 1]"));
        }

        Ok(())
    }
}

impl Default for FaultConfig {
    fn default() -> Self {
        Self {
            active_duration: 120,
            cooldown: 60,
            probability: 0.01,
            scheduled: true,
            schedule_margin: 60,
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct GpsConfig {
    /// Start latitude in degrees.
    pub latitude: f64,
    /// Start longitude in degrees.
    pub longitude: f64,
    /// Altitude in meters.
    pub altitude: f64,
    /// Initial heading in degrees.
    pub heading: f64,
    /// Width of the heading drift per tick in degrees.
    pub heading_drift: f64,
}

impl GpsConfig {
    pub fn validate(&self) -> Result {
        ensure_finite(
            "gps",
            &[
                ("latitude", self.latitude),
                ("longitude", self.longitude),
                ("altitude", self.altitude),
                ("heading", self.heading),
                ("heading_drift", self.heading_drift),
            ],
        )?;

        if !(-90.0..=90.0).contains(&self.latitude) {
            return Err(invalid("gps latitude must be within [-90, 90]"));
        }
        if !(-180.0..=180.0).contains(&self.longitude) {
            return Err(invalid("gps longitude must be within [-180, 180]"));
        }
        if self.heading_drift < 0.0 || self.heading_drift >= 360.0 {
            return Err(invalid("gps heading drift must be within [0, 360)"));
        }

        Ok(())
    }
}

impl Default for GpsConfig {
    fn default() -> Self {
        Self {
            latitude: 59.362_893_293_655_716,
            longitude: 17.972_157_154_401_952,
            altitude: 0.0,
            heading: 90.0,
            heading_drift: 10.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(SimConfig::default().validate().is_ok());
    }

    #[test]
    fn test_zero_duration() {
        let mut config = SimConfig::default();
        config.trip.duration = 0;

        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_zero_max_speed() {
        let mut config = SimConfig::default();
        config.vehicle.max_speed = 0.0;

        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_inverted_phase_bands() {
        let mut config = SimConfig::default();
        config.vehicle.phase_low_speed = 90.0;
        config.vehicle.phase_high_speed = 30.0;

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_non_finite_values() {
        let mut config = SimConfig::default();
        config.vehicle.acceleration_max = f64::INFINITY;
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));

        let mut config = SimConfig::default();
        config.thermal.min = f64::NAN;
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));

        let mut config = SimConfig::default();
        config.thermal.max = f64::NAN;
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));

        let mut config = SimConfig::default();
        config.gps.altitude = f64::NEG_INFINITY;
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));

        let mut config = SimConfig::default();
        config.fault.probability = f64::NAN;
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_non_finite_toml() {
        let config: SimConfig = toml::from_str("[vehicle]\nmax_speed = nan").unwrap();
        assert!(config.vehicle.max_speed.is_nan());
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));

        let config: SimConfig = toml::from_str("[vehicle]\nacceleration_max = inf").unwrap();
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_partial_toml() {
        let config: SimConfig = toml::from_str(
            r#"
            [trip]
            interval = 5000
            duration = 120
            seed = 7

            [vehicle]
            max_speed = 100.0
            "#,
        )
        .unwrap();

        assert_eq!(config.trip.interval(), Duration::from_secs(5));
        assert_eq!(config.trip.duration(), Duration::from_secs(120));
        assert_eq!(config.trip.seed, Some(7));
        assert!(config.trip.realtime);
        assert_eq!(config.vehicle.max_speed, 100.0);
        assert_eq!(config.vehicle.idle_rpm, 800.0);
        assert_eq!(config.fault, FaultConfig::default());
    }
}
