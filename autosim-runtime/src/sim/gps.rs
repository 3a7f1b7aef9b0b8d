use rand::{rngs::StdRng, Rng};

use crate::core::{normalize_heading, Position};
use crate::runtime::Result;
use crate::GpsConfig;

/// Dead-reckoning GPS navigator.
///
/// The position is advanced from the road speed along a heading that drifts
/// slightly on every update.
pub struct GpsNavigator {
    position: Position,
    heading: f64,
    heading_drift: f64,
    rng: StdRng,
}

impl GpsNavigator {
    pub fn new(config: &GpsConfig, rng: StdRng) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            position: Position::new(config.latitude, config.longitude, config.altitude),
            heading: normalize_heading(config.heading),
            heading_drift: config.heading_drift,
            rng,
        })
    }

    /// Advance the position by driving `speed` km/h for `dt` seconds.
    pub fn update(&mut self, speed: f64, dt: f64) -> Position {
        let distance = speed.max(0.0) / 3.6 * dt;

        if self.heading_drift > 0.0 {
            let half = self.heading_drift / 2.0;
            self.heading = normalize_heading(self.heading + self.rng.gen_range(-half..half));
        }

        self.position = self.position.destination(distance, self.heading);
        self.position
    }

    /// Override the altitude reported from now on.
    #[inline]
    pub fn set_altitude(&mut self, altitude: f64) {
        self.position.altitude = altitude;
    }

    #[inline]
    pub fn position(&self) -> Position {
        self.position
    }

    /// Heading in degrees, within `[0, 360)`.
    #[inline]
    pub fn heading(&self) -> f64 {
        self.heading
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;

    use super::*;
    use crate::core::EARTH_RADIUS;

    fn navigator(config: GpsConfig) -> GpsNavigator {
        GpsNavigator::new(&config, StdRng::seed_from_u64(5)).unwrap()
    }

    #[test]
    fn test_straight_line() {
        let config = GpsConfig {
            heading_drift: 0.0,
            ..Default::default()
        };
        let mut navigator = navigator(config.clone());

        for _ in 0..40 {
            navigator.update(72.0, 15.0);
        }

        // 40 ticks of 15s at 20 m/s.
        let start = Position::new(config.latitude, config.longitude, config.altitude);
        let mut expected = start;
        for _ in 0..40 {
            expected = expected.destination(300.0, config.heading);
        }

        let position = navigator.position();
        assert!((position.latitude - expected.latitude).abs() < 1e-6);
        assert!((position.longitude - expected.longitude).abs() < 1e-6);
        assert_eq!(navigator.heading(), 90.0);
    }

    #[test]
    fn test_north_closed_form() {
        let mut navigator = navigator(GpsConfig {
            latitude: 10.0,
            longitude: 20.0,
            heading: 0.0,
            heading_drift: 0.0,
            ..Default::default()
        });

        for _ in 0..20 {
            navigator.update(36.0, 10.0);
        }

        // 20 ticks of 100 m along a meridian.
        let expected = 10.0 + (2_000.0 / EARTH_RADIUS).to_degrees();

        let position = navigator.position();
        assert!((position.latitude - expected).abs() < 1e-6);
        assert!((position.longitude - 20.0).abs() < 1e-6);
    }

    #[test]
    fn test_heading_drift_wraps() {
        let mut navigator = navigator(GpsConfig {
            heading: 359.0,
            heading_drift: 10.0,
            ..Default::default()
        });

        let mut previous = navigator.heading();
        for _ in 0..1_000 {
            navigator.update(50.0, 15.0);

            let heading = navigator.heading();
            assert!((0.0..360.0).contains(&heading));

            let delta = (heading - previous + 540.0).rem_euclid(360.0) - 180.0;
            assert!(delta.abs() <= 5.0 + 1e-9);
            previous = heading;
        }
    }

    #[test]
    fn test_standing_still() {
        let mut navigator = navigator(GpsConfig::default());
        let start = navigator.position();

        navigator.update(0.0, 15.0);

        let position = navigator.position();
        assert!((position.latitude - start.latitude).abs() < 1e-12);
        assert!((position.longitude - start.longitude).abs() < 1e-12);
    }

    #[test]
    fn test_altitude_override() {
        let mut navigator = navigator(GpsConfig::default());

        navigator.set_altitude(42.0);

        assert_eq!(navigator.update(30.0, 15.0).altitude, 42.0);
    }
}
