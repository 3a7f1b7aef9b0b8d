use super::{DiagnosticCode, Reading};

/// Running statistic over a series of samples.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Statistic {
    count: usize,
    sum: f64,
    min: f64,
    max: f64,
}

impl Statistic {
    /// Add a sample.
    pub fn push(&mut self, value: f64) {
        if self.count == 0 {
            self.min = value;
            self.max = value;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);
        }

        self.sum += value;
        self.count += 1;
    }

    /// Number of samples.
    #[inline]
    pub fn count(&self) -> usize {
        self.count
    }

    /// Mean of all samples, if any.
    pub fn mean(&self) -> Option<f64> {
        if self.count == 0 {
            None
        } else {
            Some(self.sum / self.count as f64)
        }
    }

    /// Smallest sample, if any.
    pub fn min(&self) -> Option<f64> {
        (self.count > 0).then_some(self.min)
    }

    /// Largest sample, if any.
    pub fn max(&self) -> Option<f64> {
        (self.count > 0).then_some(self.max)
    }
}

impl std::fmt::Display for Statistic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (self.mean(), self.min(), self.max()) {
            (Some(mean), Some(min), Some(max)) => {
                write!(f, "avg {:.2} min {:.2} max {:.2}", mean, min, max)
            }
            _ => write!(f, "no samples"),
        }
    }
}

impl Extend<f64> for Statistic {
    fn extend<I: IntoIterator<Item = f64>>(&mut self, iter: I) {
        iter.into_iter().for_each(|value| self.push(value));
    }
}

impl FromIterator<f64> for Statistic {
    fn from_iter<I: IntoIterator<Item = f64>>(iter: I) -> Self {
        let mut statistic = Self::default();
        statistic.extend(iter);
        statistic
    }
}

/// Trip summary.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Summary {
    /// Engine speed in RPM.
    pub rpm: Statistic,
    /// Road speed in km/h.
    pub speed: Statistic,
    /// Fuel level in percent.
    pub fuel: Statistic,
    /// Engine temperature in degrees Celsius.
    pub engine_temperature: Statistic,
    /// Number of readings carrying a diagnostic trouble code.
    pub dtc_count: usize,
    /// Last diagnostic trouble code seen.
    pub last_dtc: Option<DiagnosticCode>,
}

impl Summary {
    /// Add a reading to the summary.
    pub fn push(&mut self, reading: &Reading) {
        self.rpm.push(reading.rpm as f64);
        self.speed.push(reading.speed as f64);
        self.fuel.push(reading.fuel);
        self.engine_temperature
            .push(reading.engine_temperature as f64);

        if let Some(code) = reading.dtc {
            self.dtc_count += 1;
            self.last_dtc = Some(code);
        }
    }

    /// Number of readings in the summary.
    #[inline]
    pub fn count(&self) -> usize {
        self.rpm.count()
    }

    /// Fuel used between the first and last reading, in percent.
    pub fn fuel_used(&self) -> f64 {
        match (self.fuel.max(), self.fuel.min()) {
            (Some(max), Some(min)) => max - min,
            _ => 0.0,
        }
    }
}

impl<'a> Extend<&'a Reading> for Summary {
    fn extend<I: IntoIterator<Item = &'a Reading>>(&mut self, iter: I) {
        iter.into_iter().for_each(|reading| self.push(reading));
    }
}

impl<'a> FromIterator<&'a Reading> for Summary {
    fn from_iter<I: IntoIterator<Item = &'a Reading>>(iter: I) -> Self {
        let mut summary = Self::default();
        summary.extend(iter);
        summary
    }
}

impl std::fmt::Display for Summary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Readings: {}", self.count())?;
        writeln!(f, "RPM: {}", self.rpm)?;
        writeln!(f, "Speed: {}", self.speed)?;
        writeln!(f, "Fuel: {} (used {:.2}%)", self.fuel, self.fuel_used())?;
        writeln!(f, "Engine temperature: {}", self.engine_temperature)?;
        match self.last_dtc {
            Some(code) => write!(f, "DTC readings: {} (last {})", self.dtc_count, code),
            None => write!(f, "DTC readings: {}", self.dtc_count),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::core::Position;

    fn reading(rpm: u16, speed: u16, fuel: f64, dtc: Option<&str>) -> Reading {
        Reading {
            offset: Duration::ZERO,
            rpm,
            speed,
            fuel,
            engine_temperature: 85,
            dtc: dtc.map(|code| code.parse().unwrap()),
            position: Position::new(0.0, 0.0, 0.0),
        }
    }

    #[test]
    fn test_statistic_empty() {
        let statistic = Statistic::default();

        assert_eq!(statistic.mean(), None);
        assert_eq!(statistic.min(), None);
        assert_eq!(statistic.max(), None);
        assert_eq!(statistic.to_string(), "no samples");
    }

    #[test]
    fn test_statistic() {
        let statistic: Statistic = [4.0, -2.0, 10.0].into_iter().collect();

        assert_eq!(statistic.count(), 3);
        assert_eq!(statistic.mean(), Some(4.0));
        assert_eq!(statistic.min(), Some(-2.0));
        assert_eq!(statistic.max(), Some(10.0));
    }

    #[test]
    fn test_summary() {
        let readings = [
            reading(800, 0, 100.0, None),
            reading(1_200, 20, 99.5, Some("P0300")),
            reading(2_000, 40, 99.0, Some("P0171")),
        ];

        let summary: Summary = readings.iter().collect();

        assert_eq!(summary.count(), 3);
        assert_eq!(summary.rpm.mean(), Some(4_000.0 / 3.0));
        assert_eq!(summary.speed.max(), Some(40.0));
        assert_eq!(summary.dtc_count, 2);
        assert_eq!(summary.last_dtc, Some("P0171".parse().unwrap()));
        assert!((summary.fuel_used() - 1.0).abs() < 1e-9);
    }
}
