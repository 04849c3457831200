//! Heater-on thermocouple noise filter.
//!
//! Driving current through the element couples noise into the
//! thermocouple, which shows up as readings that are falsely *low* for a
//! sample or two.  A falsely *high* reading would hide an over-temperature,
//! so the filter is asymmetric: rises are always trusted, drops while the
//! heater is on are treated with suspicion.
//!
//! | Heater | Raw vs. last safe       | Returned                 | Counter |
//! |--------|-------------------------|--------------------------|---------|
//! | off    | any                     | raw                      | reset   |
//! | on     | raw >= last safe        | raw                      | reset   |
//! | on     | drop >= threshold       | last safe                | +1      |
//! | on     | drop <  threshold       | last safe + \|drop\|     | +1      |
//!
//! Once the counter passes [`REREAD_AFTER_ANOMALIES`] the reading asks the
//! caller for a safe re-read: heater off, short pause, sample again.

use crate::app::ports::TemperatureSensor;
use crate::error::SensorFault;

/// Consecutive suspicious drops tolerated before a safe re-read is requested.
pub const REREAD_AFTER_ANOMALIES: u32 = 3;

/// Output of one filtered sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilteredReading {
    pub temperature: i32,
    pub needs_safe_reread: bool,
}

pub struct ThermocoupleFilter {
    noise_threshold: i32,
    last_safe: Option<i32>,
    anomalies: u32,
}

impl ThermocoupleFilter {
    pub fn new(noise_threshold: f32) -> Self {
        Self {
            noise_threshold: noise_threshold.round() as i32,
            last_safe: None,
            anomalies: 0,
        }
    }

    /// Read the sensor and filter the sample.  Sensor faults pass through
    /// untouched and leave the filter state as it was.
    pub fn filtered_read(
        &mut self,
        sensor: &mut impl TemperatureSensor,
        heater_on: bool,
    ) -> Result<FilteredReading, SensorFault> {
        let raw = sensor.raw_read()?;
        Ok(self.apply(raw, heater_on))
    }

    /// Filter an already-validated raw sample.
    pub fn apply(&mut self, raw: i32, heater_on: bool) -> FilteredReading {
        let Some(last_safe) = self.last_safe.filter(|_| heater_on) else {
            return self.trust(raw);
        };

        let delta = raw - last_safe;
        if delta >= 0 {
            return self.trust(raw);
        }

        self.anomalies = self.anomalies.saturating_add(1);
        let needs_safe_reread = self.anomalies > REREAD_AFTER_ANOMALIES;
        let drop = delta.abs();
        let temperature = if drop >= self.noise_threshold {
            last_safe
        } else {
            // Small drops nudge the estimate up by the same amount.
            last_safe + drop
        };
        FilteredReading {
            temperature,
            needs_safe_reread,
        }
    }

    fn trust(&mut self, raw: i32) -> FilteredReading {
        self.last_safe = Some(raw);
        self.anomalies = 0;
        FilteredReading {
            temperature: raw,
            needs_safe_reread: false,
        }
    }

    pub fn last_known_safe(&self) -> Option<i32> {
        self.last_safe
    }

    pub fn anomaly_count(&self) -> u32 {
        self.anomalies
    }
}
