//! Sensor drivers that sit behind the port traits.
//!
//! - [`thermocouple`]: shared fault classification for heater probes
//! - [`supply_voltage`]: supply rail through the divider, with glitch guards
//! - [`die_temperature`]: controller chip temperature

pub mod die_temperature;
pub mod supply_voltage;
pub mod thermocouple;

pub use die_temperature::DieTemperature;
pub use supply_voltage::{AdcSampler, BoardAdc, SupplyVoltageMonitor};
