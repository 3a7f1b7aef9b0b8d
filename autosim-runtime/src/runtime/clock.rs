use std::time::Duration;

use tokio::sync::broadcast::{self, error::TryRecvError};
use tokio::time::{Interval, MissedTickBehavior};

use crate::TripConfig;

/// Fixed-interval simulation clock.
///
/// The clock yields a fixed number of ticks: the trip duration divided by the
/// interval, rounded up. The first tick is yielded immediately. In realtime
/// mode every following tick waits for the interval to pass, otherwise ticks
/// are yielded as fast as the caller consumes them.
pub struct SimulationClock {
    interval: Duration,
    tick_count: u64,
    ticks: u64,
    realtime: bool,
    timer: Option<Interval>,
}

impl SimulationClock {
    pub fn new(interval: Duration, duration: Duration, realtime: bool) -> Self {
        let interval_ms = interval.as_millis().max(1);
        let tick_count = ((duration.as_millis() + interval_ms - 1) / interval_ms) as u64;

        Self {
            interval,
            tick_count,
            ticks: 0,
            realtime,
            timer: None,
        }
    }

    pub fn from_config(config: &TripConfig) -> Self {
        Self::new(config.interval(), config.duration(), config.realtime)
    }

    /// Wait for the next tick.
    ///
    /// Returns the tick number, or `None` when the trip is complete or the
    /// shutdown signal was received. The shutdown sender must outlive the
    /// clock.
    pub async fn next_tick(&mut self, shutdown: &mut broadcast::Receiver<()>) -> Option<u64> {
        if self.is_finished() {
            return None;
        }

        if self.realtime {
            let period = self.interval;
            let timer = self.timer.get_or_insert_with(|| {
                let mut timer = tokio::time::interval(period);
                timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
                timer
            });

            tokio::select! {
                _ = shutdown.recv() => {
                    info!("Simulation interrupted at tick {}", self.ticks);
                    return None;
                }
                _ = timer.tick() => {}
            }
        } else {
            match shutdown.try_recv() {
                Ok(()) | Err(TryRecvError::Lagged(_)) | Err(TryRecvError::Closed) => {
                    info!("Simulation interrupted at tick {}", self.ticks);
                    return None;
                }
                Err(TryRecvError::Empty) => {}
            }

            tokio::task::yield_now().await;
        }

        let tick = self.ticks;
        self.ticks += 1;

        Some(tick)
    }

    /// Whether all ticks of the trip have been yielded.
    #[inline]
    pub fn is_finished(&self) -> bool {
        self.ticks >= self.tick_count
    }

    #[inline]
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Total number of ticks in the trip.
    #[inline]
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// Number of ticks yielded so far.
    #[inline]
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Trip offset of the next tick.
    #[inline]
    pub fn offset(&self) -> Duration {
        Duration::from_millis((self.interval.as_millis() as u64).saturating_mul(self.ticks))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tick_count() {
        let clock = SimulationClock::new(Duration::from_secs(5), Duration::from_secs(600), true);
        assert_eq!(clock.tick_count(), 120);

        let clock = SimulationClock::new(Duration::from_secs(15), Duration::from_secs(600), true);
        assert_eq!(clock.tick_count(), 40);

        let clock = SimulationClock::new(Duration::from_secs(7), Duration::from_secs(20), true);
        assert_eq!(clock.tick_count(), 3);
    }

    #[test]
    fn test_offset_beyond_u32_ticks() {
        let mut clock =
            SimulationClock::new(Duration::from_millis(5), Duration::from_secs(600), false);
        clock.ticks = u32::MAX as u64 + 2;

        assert_eq!(clock.offset(), Duration::from_millis(5 * (u32::MAX as u64 + 2)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_realtime_ticks() {
        let (_sender, mut shutdown) = broadcast::channel(1);
        let mut clock =
            SimulationClock::new(Duration::from_secs(5), Duration::from_secs(600), true);

        let start = tokio::time::Instant::now();

        let mut count = 0;
        while let Some(tick) = clock.next_tick(&mut shutdown).await {
            assert_eq!(tick, count);
            count += 1;
        }

        assert_eq!(count, 120);
        assert!(clock.is_finished());
        assert_eq!(clock.offset(), Duration::from_secs(600));
        assert_eq!(start.elapsed(), Duration::from_secs(595));
    }

    #[tokio::test]
    async fn test_fast_ticks() {
        let (_sender, mut shutdown) = broadcast::channel(1);
        let mut clock =
            SimulationClock::new(Duration::from_secs(5), Duration::from_secs(600), false);

        let mut count = 0;
        while clock.next_tick(&mut shutdown).await.is_some() {
            count += 1;
        }

        assert_eq!(count, 120);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown() {
        let (sender, mut shutdown) = broadcast::channel(1);
        let mut clock =
            SimulationClock::new(Duration::from_secs(5), Duration::from_secs(600), true);

        assert_eq!(clock.next_tick(&mut shutdown).await, Some(0));
        assert_eq!(clock.next_tick(&mut shutdown).await, Some(1));

        sender.send(()).unwrap();

        assert_eq!(clock.next_tick(&mut shutdown).await, None);
        assert!(!clock.is_finished());
    }

    #[tokio::test]
    async fn test_shutdown_fast() {
        let (sender, mut shutdown) = broadcast::channel(1);
        let mut clock =
            SimulationClock::new(Duration::from_secs(5), Duration::from_secs(600), false);

        assert_eq!(clock.next_tick(&mut shutdown).await, Some(0));

        sender.send(()).unwrap();

        assert_eq!(clock.next_tick(&mut shutdown).await, None);
        assert_eq!(clock.ticks(), 1);
    }
}
