use std::sync::Arc;

use tokio::sync::{broadcast, mpsc};

use crate::core::{CodeDescriber, DiagnosticCode, Reading, Summary};
use crate::net::Publisher;
use crate::sim::TripSimulator;
use crate::SimConfig;

mod builder;
mod clock;
mod error;

pub use self::builder::Builder;
pub use self::clock::SimulationClock;
pub use self::error::Error;

pub type Result<T = ()> = std::result::Result<T, error::Error>;

/// Construct a runtime builder from the simulation configuration.
pub fn builder(config: &SimConfig) -> Result<Builder> {
    Builder::from_config(config)
}

/// Outcome of a trip.
#[derive(Clone, Debug, Default)]
pub struct TripReport {
    /// Number of ticks simulated.
    pub ticks: u64,
    /// Whether the trip ended before its full duration.
    pub interrupted: bool,
    /// Readings accepted by the publisher.
    pub published: usize,
    /// Readings the publisher failed to accept.
    pub failed: usize,
    /// Statistics over all simulated readings.
    pub summary: Summary,
}

impl std::fmt::Display for TripReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Trip {} after {} ticks; published: {} failed: {}",
            if self.interrupted {
                "interrupted"
            } else {
                "completed"
            },
            self.ticks,
            self.published,
            self.failed
        )
    }
}

#[derive(Default)]
struct PublishCount {
    published: usize,
    failed: usize,
}

pub struct Runtime {
    /// Simulation configuration.
    config: SimConfig,
    /// Runtime shutdown signal.
    shutdown: (broadcast::Sender<()>, broadcast::Receiver<()>),
    /// Code describer for log output.
    describer: Option<Arc<dyn CodeDescriber>>,
}

impl Runtime {
    #[inline]
    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Construct a trip simulator for this runtime.
    pub fn simulator(&self, codes: Vec<DiagnosticCode>) -> Result<TripSimulator> {
        TripSimulator::new(&self.config, codes)
    }

    /// Listen for shutdown signal.
    pub fn shutdown_signal(&self) -> broadcast::Receiver<()> {
        self.shutdown.0.subscribe()
    }

    /// Request the runtime to shut down.
    pub fn shutdown(&self) {
        self.shutdown.0.send(()).ok();
    }

    fn describe(&self, reading: &Reading, last_code: &mut Option<DiagnosticCode>) {
        if reading.dtc == *last_code {
            return;
        }

        if let (Some(code), Some(describer)) = (reading.dtc, &self.describer) {
            info!("DTC {}", describer.describe(&code));
        }

        *last_code = reading.dtc;
    }

    /// Run a trip to completion or until shutdown.
    ///
    /// Every reading is handed to the publisher on a separate task through a
    /// bounded queue. The clock only waits for the publisher when the queue
    /// is full. Publish failures are logged and counted and never end the
    /// trip. On shutdown any in-flight publish is cancelled.
    pub async fn run_trip<P: Publisher + 'static>(
        &self,
        simulator: &mut TripSimulator,
        publisher: P,
    ) -> TripReport {
        let (tx, rx) = mpsc::channel(crate::consts::QUEUE_SIZE_READING);

        let publish_task = tokio::spawn(Self::publish_loop(publisher, rx, self.shutdown_signal()));

        let mut clock = SimulationClock::from_config(&self.config.trip);
        let mut shutdown = self.shutdown_signal();

        info!(
            "Trip started: {} ticks of {}ms",
            clock.tick_count(),
            clock.interval().as_millis()
        );

        let mut report = TripReport::default();
        let mut last_code = None;
        let mut interrupted = false;

        while clock.next_tick(&mut shutdown).await.is_some() {
            let reading = simulator.tick(clock.interval());

            report.ticks += 1;
            report.summary.push(&reading);

            self.describe(&reading, &mut last_code);

            tokio::select! {
                _ = shutdown.recv() => {
                    info!("Simulation interrupted at tick {}", clock.ticks());
                    interrupted = true;
                    break;
                }
                result = tx.send(reading) => {
                    if result.is_err() {
                        error!("Publisher stopped, ending trip");
                        interrupted = true;
                        break;
                    }
                }
            }
        }

        report.interrupted = interrupted || !clock.is_finished();

        drop(tx);

        match publish_task.await {
            Ok(count) => {
                report.published = count.published;
                report.failed = count.failed;
            }
            Err(e) => error!("Publisher task failed: {}", e),
        }

        info!("{}", report);

        report
    }

    async fn publish_loop<P: Publisher>(
        mut publisher: P,
        mut rx: mpsc::Receiver<Reading>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> PublishCount {
        let mut count = PublishCount::default();

        loop {
            let reading = tokio::select! {
                _ = shutdown.recv() => {
                    debug!("Publisher cancelled");
                    break;
                }
                reading = rx.recv() => match reading {
                    Some(reading) => reading,
                    None => break,
                },
            };

            tokio::select! {
                _ = shutdown.recv() => {
                    debug!("Publish of reading at T+{}s cancelled", reading.offset.as_secs());
                    break;
                }
                result = publisher.publish(&reading) => match result {
                    Ok(_) => count.published += 1,
                    Err(e) => {
                        error!("Failed to publish reading: {}", e);
                        count.failed += 1;
                    }
                },
            }
        }

        if let Err(e) = publisher.close().await {
            error!("Failed to close publisher: {}", e);
        }

        count
    }
}

#[cfg(test)]
mod tests {
    use std::io;
    use std::sync::Mutex;
    use std::time::Duration;

    use super::*;
    use crate::core::CodeInfo;

    #[derive(Clone, Default)]
    struct Recorder(Arc<Mutex<Vec<Reading>>>);

    #[async_trait::async_trait]
    impl Publisher for Recorder {
        async fn publish(&mut self, reading: &Reading) -> io::Result<()> {
            self.0.lock().unwrap().push(*reading);
            Ok(())
        }
    }

    struct Offline;

    #[async_trait::async_trait]
    impl Publisher for Offline {
        async fn publish(&mut self, _reading: &Reading) -> io::Result<()> {
            Err(io::Error::new(io::ErrorKind::ConnectionRefused, "offline"))
        }
    }

    struct Stalled;

    #[async_trait::async_trait]
    impl Publisher for Stalled {
        async fn publish(&mut self, _reading: &Reading) -> io::Result<()> {
            std::future::pending().await
        }
    }

    struct Fixed;

    impl CodeDescriber for Fixed {
        fn describe(&self, code: &DiagnosticCode) -> CodeInfo {
            CodeInfo {
                code: *code,
                title: Some("Test".to_string()),
                url: String::new(),
            }
        }
    }

    fn config(realtime: bool) -> SimConfig {
        let mut config = SimConfig::default();
        config.trip.interval = 5_000;
        config.trip.duration = 600;
        config.trip.realtime = realtime;
        config.trip.seed = Some(17);
        config
    }

    #[test]
    fn test_builder_rejects_invalid_config() {
        let mut config = config(false);
        config.trip.interval = 0;

        assert!(matches!(builder(&config), Err(Error::InvalidConfig(_))));
    }

    #[tokio::test]
    async fn test_run_trip() {
        let runtime = builder(&config(false))
            .unwrap()
            .with_describer(Fixed)
            .build();
        let mut simulator = runtime.simulator(vec![]).unwrap();

        let recorder = Recorder::default();
        let report = runtime.run_trip(&mut simulator, recorder.clone()).await;

        assert_eq!(report.ticks, 120);
        assert!(!report.interrupted);
        assert_eq!(report.published, 120);
        assert_eq!(report.failed, 0);
        assert_eq!(report.summary.count(), 120);

        let readings = recorder.0.lock().unwrap();
        assert_eq!(readings.len(), 120);
        for (i, reading) in readings.iter().enumerate() {
            assert_eq!(reading.offset, Duration::from_secs(5 * i as u64));
        }

        // The scheduled fault always fires within the trip.
        assert!(report.summary.dtc_count > 0);
    }

    #[tokio::test]
    async fn test_publish_failures_are_counted() {
        let runtime = builder(&config(false)).unwrap().build();
        let mut simulator = runtime.simulator(vec![]).unwrap();

        let report = runtime.run_trip(&mut simulator, Offline).await;

        assert_eq!(report.ticks, 120);
        assert!(!report.interrupted);
        assert_eq!(report.published, 0);
        assert_eq!(report.failed, 120);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_interrupts_trip() {
        let runtime = builder(&config(true)).unwrap().build();
        let mut simulator = runtime.simulator(vec![]).unwrap();

        let recorder = Recorder::default();

        let (report, _) = tokio::join!(
            runtime.run_trip(&mut simulator, recorder.clone()),
            async {
                tokio::time::sleep(Duration::from_secs(12)).await;
                runtime.shutdown();
            }
        );

        assert_eq!(report.ticks, 3);
        assert!(report.interrupted);
        assert!(report.published <= 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_on_last_tick() {
        let mut config = config(false);
        config.trip.interval = 1_000;
        config.trip.duration = crate::consts::QUEUE_SIZE_READING as u64 + 2;

        let runtime = builder(&config).unwrap().build();
        let mut simulator = runtime.simulator(vec![]).unwrap();

        let (report, _) = tokio::join!(runtime.run_trip(&mut simulator, Stalled), async {
            tokio::time::sleep(Duration::from_secs(1)).await;
            runtime.shutdown();
        });

        assert_eq!(report.ticks, config.trip.duration);
        assert!(report.interrupted);
        assert_eq!(report.published, 0);
    }
}
