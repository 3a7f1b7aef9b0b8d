use rand::rngs::StdRng;

use crate::runtime::Result;
use crate::{ThermalConfig, VehicleConfig};

/// First-order engine temperature model.
///
/// The temperature follows a target with an exponential lag. The target rises
/// with road speed and engine load, and with a bonus that builds up while the
/// vehicle is driven near its maximum speed. Each update adds a small jitter.
/// The reported temperature never leaves the configured range.
pub struct EngineTemperatureModel {
    config: ThermalConfig,
    max_speed: f64,
    idle_rpm: f64,
    max_rpm: f64,
    temperature: f64,
    target: f64,
    high_speed_accumulator: f64,
    rng: StdRng,
}

impl EngineTemperatureModel {
    pub fn new(config: &ThermalConfig, vehicle: &VehicleConfig, rng: StdRng) -> Result<Self> {
        config.validate()?;
        vehicle.validate()?;

        let temperature = config.initial.clamp(config.min, config.max);

        Ok(Self {
            config: config.clone(),
            max_speed: vehicle.max_speed,
            idle_rpm: vehicle.idle_rpm,
            max_rpm: vehicle.max_rpm,
            temperature,
            target: temperature,
            high_speed_accumulator: 0.0,
            rng,
        })
    }

    /// Advance the model by `dt` seconds and return the new temperature.
    pub fn update(&mut self, speed: f64, rpm: f64, dt: f64) -> f64 {
        let speed_frac = (speed / self.max_speed).clamp(0.0, 1.0);
        let load_frac = ((rpm - self.idle_rpm) / (self.max_rpm - self.idle_rpm)).clamp(0.0, 1.0);

        if speed_frac >= self.config.high_speed_ratio {
            self.high_speed_accumulator =
                (self.high_speed_accumulator + dt).min(self.config.sustain);
        } else {
            self.high_speed_accumulator = (self.high_speed_accumulator - dt / 2.0).max(0.0);
        }

        self.target = (self.config.baseline
            + self.config.speed_coefficient * speed_frac
            + self.config.load_coefficient * load_frac
            + self.config.bonus_max * self.high_speed_accumulator / self.config.sustain)
            .clamp(self.config.min, self.config.max);

        let alpha = 1.0 - (-dt / self.config.tau).exp();
        self.temperature += (self.target - self.temperature) * alpha;

        self.temperature += super::symmetric(&mut self.rng, self.config.jitter);
        self.temperature = self.temperature.clamp(self.config.min, self.config.max);

        self.temperature
    }

    /// Current engine temperature.
    #[inline]
    pub fn temperature(&self) -> f64 {
        self.temperature
    }

    /// Target temperature from the last update.
    #[inline]
    pub fn target(&self) -> f64 {
        self.target
    }

    /// Seconds of sustained high speed driving accounted for.
    #[inline]
    pub fn high_speed_accumulator(&self) -> f64 {
        self.high_speed_accumulator
    }
}
