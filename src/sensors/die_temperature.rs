//! Controller die temperature (ESP32-S3 internal sensor).
//!
//! Read by the housekeeping tick to protect the board itself, not the
//! heater.  A failed conversion reports the last good value so a single
//! driver hiccup cannot trigger or clear the overheat pause.

use log::warn;

use crate::app::ports::DieTemperatureSensor;
use crate::drivers::hw_init;

pub struct DieTemperature {
    read: fn() -> Option<f32>,
    last: f32,
}

impl DieTemperature {
    /// Sensor backed by the on-chip peripheral set up in `hw_init`.
    pub fn new() -> Self {
        Self::with_reader(hw_init::die_temperature_read)
    }

    pub fn with_reader(read: fn() -> Option<f32>) -> Self {
        Self { read, last: 25.0 }
    }
}

impl Default for DieTemperature {
    fn default() -> Self {
        Self::new()
    }
}

impl DieTemperatureSensor for DieTemperature {
    fn read_die_celsius(&mut self) -> f32 {
        match (self.read)() {
            Some(c) if c.is_finite() => {
                self.last = c;
                c
            }
            _ => {
                warn!("die temperature read failed, reusing {:.1} C", self.last);
                self.last
            }
        }
    }
}
