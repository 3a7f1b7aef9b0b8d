//! Vehicle models advanced once per simulation tick.
//!
//! Every model owns its own random source. All sources of a trip are derived
//! from a single trip seed so that a seeded trip is reproducible.

use rand::{rngs::StdRng, Rng, SeedableRng};

pub use self::fault::{Activation, FaultInjector, FaultState};
pub use self::gps::GpsNavigator;
pub use self::thermal::EngineTemperatureModel;
pub use self::trip::{engine_rpm, TripPhase, TripSimulator, VehicleState};

mod fault;
mod gps;
mod thermal;
mod trip;

/// Uniform draw in `[-magnitude, magnitude]`.
pub(crate) fn symmetric<R: Rng>(rng: &mut R, magnitude: f64) -> f64 {
    if magnitude <= 0.0 {
        0.0
    } else {
        rng.gen_range(-magnitude..=magnitude)
    }
}

/// Derive an independent random source from a parent source.
pub(crate) fn derive_rng(rng: &mut StdRng) -> StdRng {
    StdRng::seed_from_u64(rng.gen())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symmetric_bounds() {
        let mut rng = StdRng::seed_from_u64(3);

        for _ in 0..1_000 {
            let value = symmetric(&mut rng, 1.5);
            assert!((-1.5..=1.5).contains(&value));
        }

        assert_eq!(symmetric(&mut rng, 0.0), 0.0);
    }

    #[test]
    fn test_derive_rng_is_deterministic() {
        let mut first = StdRng::seed_from_u64(11);
        let mut second = StdRng::seed_from_u64(11);

        let a: u64 = derive_rng(&mut first).gen();
        let b: u64 = derive_rng(&mut second).gen();

        assert_eq!(a, b);
    }
}
