use std::time::Duration;

use rand::{rngs::StdRng, seq::SliceRandom, Rng};

use crate::core::{DiagnosticCode, FALLBACK_CODES};
use crate::runtime::Result;
use crate::FaultConfig;

/// Fault injector state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FaultState {
    /// No fault, a new fault may activate.
    Idle,
    /// Fault asserted until the given trip offset.
    Active {
        code: DiagnosticCode,
        until: Duration,
    },
    /// Fault cleared, no new fault before the given trip offset.
    Cooldown { until: Duration },
}

/// Reason a fault was activated.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Activation {
    /// The planned fault of the trip.
    Scheduled,
    /// A random fault.
    Random,
}

impl std::fmt::Display for Activation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Scheduled => write!(f, "scheduled"),
            Self::Random => write!(f, "random"),
        }
    }
}

/// Decides when a diagnostic trouble code is asserted.
///
/// All timing is expressed as an offset into the trip. One fault is planned
/// per trip when scheduling is enabled. On top of that, every idle tick may
/// raise a random fault. A fault stays active for a fixed period, followed by
/// a cooldown during which no new fault can start.
pub struct FaultInjector {
    config: FaultConfig,
    codes: Vec<DiagnosticCode>,
    state: FaultState,
    scheduled_at: Option<Duration>,
    rng: StdRng,
}

impl FaultInjector {
    /// Construct a new fault injector.
    ///
    /// The trip duration and tick interval place the scheduled fault on a
    /// tick of the trip. The codes are the primary code source. When empty,
    /// codes are drawn from the fallback set.
    pub fn new(
        config: &FaultConfig,
        trip_duration: Duration,
        interval: Duration,
        codes: Vec<DiagnosticCode>,
        mut rng: StdRng,
    ) -> Result<Self> {
        config.validate()?;

        let scheduled_at = if config.scheduled {
            Some(Self::schedule(
                &mut rng,
                trip_duration,
                interval,
                config.schedule_margin(),
            ))
        } else {
            None
        };

        if let Some(at) = scheduled_at {
            debug!("Fault scheduled at T+{}s", at.as_secs());
        }

        Ok(Self {
            config: config.clone(),
            codes,
            state: FaultState::Idle,
            scheduled_at,
            rng,
        })
    }

    /// Place the scheduled fault on a tick drawn uniformly from the ticks
    /// inside the trip margins. Trips without such a tick get the fault on the
    /// tick closest to halfway. The result is never past the last tick.
    fn schedule(
        rng: &mut StdRng,
        trip_duration: Duration,
        interval: Duration,
        margin: Duration,
    ) -> Duration {
        let interval = (interval.as_millis() as u64).max(1);
        let duration = trip_duration.as_millis() as u64;
        let margin = margin.as_millis() as u64;

        let last = duration.saturating_sub(1) / interval;
        let first = (margin + interval - 1) / interval;
        let end = (duration.saturating_sub(margin) / interval).min(last);

        let index = if duration > margin * 2 && first <= end {
            rng.gen_range(first..=end)
        } else {
            ((duration / 2) / interval).min(last)
        };

        Duration::from_millis(index * interval)
    }

    /// Override the scheduled fault offset.
    pub fn plan(&mut self, at: Option<Duration>) {
        self.scheduled_at = at;
    }

    /// Offset of the scheduled fault, if not yet consumed.
    #[inline]
    pub fn scheduled_at(&self) -> Option<Duration> {
        self.scheduled_at
    }

    #[inline]
    pub fn state(&self) -> FaultState {
        self.state
    }

    /// Currently asserted code.
    #[inline]
    pub fn active_code(&self) -> Option<DiagnosticCode> {
        match self.state {
            FaultState::Active { code, .. } => Some(code),
            _ => None,
        }
    }

    /// Draw a code from the primary code source, or from the fallback set
    /// when the source is empty.
    pub fn pick_random_code(&mut self) -> DiagnosticCode {
        let codes = if self.codes.is_empty() {
            &FALLBACK_CODES[..]
        } else {
            &self.codes[..]
        };

        // Neither slice is ever empty here.
        *codes.choose(&mut self.rng).unwrap_or(&FALLBACK_CODES[0])
    }

    /// Advance the injector to the trip offset `now`.
    ///
    /// Returns the asserted code, if any.
    pub fn tick(&mut self, now: Duration) -> Option<DiagnosticCode> {
        let scheduled_due = match self.scheduled_at {
            Some(at) if now >= at => {
                self.scheduled_at = None;
                true
            }
            _ => false,
        };

        match self.state {
            FaultState::Active { code, until } if now < until => {
                if scheduled_due {
                    debug!("Scheduled fault skipped, {} still active", code);
                }
                return Some(code);
            }
            FaultState::Active { code, .. } => {
                info!("DTC {} cleared", code);
                if scheduled_due {
                    debug!("Scheduled fault skipped, injector cooling down");
                }
                self.state = FaultState::Cooldown {
                    until: now + self.config.cooldown(),
                };
                return None;
            }
            FaultState::Cooldown { until } if now < until => {
                if scheduled_due {
                    debug!("Scheduled fault skipped, injector cooling down");
                }
                return None;
            }
            FaultState::Cooldown { .. } => {
                self.state = FaultState::Idle;
            }
            FaultState::Idle => {}
        }

        let activation = if scheduled_due {
            Some(Activation::Scheduled)
        } else if self.rng.gen::<f64>() < self.config.probability {
            Some(Activation::Random)
        } else {
            None
        };

        activation.map(|activation| self.activate(now, activation))
    }

    fn activate(&mut self, now: Duration, activation: Activation) -> DiagnosticCode {
        let code = self.pick_random_code();

        info!("DTC {} activated ({})", code, activation);

        self.state = FaultState::Active {
            code,
            until: now + self.config.active_duration(),
        };

        code
    }
}
