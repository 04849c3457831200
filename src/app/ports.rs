//! Port traits: the boundary between the control core and the board.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ ControlLoopEngine (domain)
//! ```
//!
//! Drivers and adapters implement these traits; the
//! [`ControlLoopEngine`](super::engine::ControlLoopEngine) consumes them
//! through generics, so the control core never touches a register and
//! runs unchanged against the test rig.

use embedded_hal::delay::DelayNs;

use crate::control::profile::TemperatureProfile;
use crate::error::SensorFault;

use super::events::{AppEvent, CycleRecord};

// ───────────────────────────────────────────────────────────────
// Heater (domain → hardware)
// ───────────────────────────────────────────────────────────────

/// Power stage driving the heater.  `power` is a percentage, 0-100.
pub trait HeaterActuator {
    /// Energise at `power`.
    fn on(&mut self, power: f32);

    /// Change the power of an already-energised heater.
    fn set_power(&mut self, power: f32);

    /// De-energise.  Must be safe to call repeatedly.
    fn off(&mut self);

    fn is_on(&self) -> bool;

    /// Last commanded power (0 when off).
    fn power(&self) -> f32;

    /// Upper bound applied to every later `on`/`set_power`.
    fn set_max_duty_cycle(&mut self, percent: f32);

    /// Periodic hook for heaters that multiplex their output across
    /// several coils.  Single-output heaters ignore it.
    fn advance_coil(&mut self) {}
}

// ───────────────────────────────────────────────────────────────
// Sensors (hardware → domain)
// ───────────────────────────────────────────────────────────────

/// Heater thermocouple.
pub trait TemperatureSensor {
    /// One classified sample in whole °C.  Implementations map their
    /// failure modes onto [`SensorFault`] and never return NaN.
    fn raw_read(&mut self) -> Result<i32, SensorFault>;
}

/// Supply voltage monitor.
pub trait VoltageSource {
    /// Supply voltage in volts.  `previous` is the last accepted value,
    /// used to smooth over converter glitches.
    fn read_volts(&mut self, previous: Option<f32>) -> f32;
}

/// Controller chip (die) temperature.
pub trait DieTemperatureSensor {
    fn read_die_celsius(&mut self) -> f32;
}

/// Free-running millisecond counter.  Wraps at `u32::MAX`.
pub trait Clock {
    fn now_ms(&self) -> u32;
}

/// Everything a control cycle touches, as one bound.
pub trait ControllerHardware:
    HeaterActuator + TemperatureSensor + VoltageSource + DieTemperatureSensor + Clock + DelayNs
{
}

impl<T> ControllerHardware for T where
    T: HeaterActuator + TemperatureSensor + VoltageSource + DieTemperatureSensor + Clock + DelayNs
{
}

// ───────────────────────────────────────────────────────────────
// Outbound (domain → logging / storage)
// ───────────────────────────────────────────────────────────────

/// Structured events from the control core.  Adapters decide where they go.
pub trait EventSink {
    fn emit(&mut self, event: &AppEvent);
}

/// Per-cycle autosession log.
pub trait CycleLogSink {
    fn record(&mut self, record: &CycleRecord);

    /// Push anything buffered to storage.
    fn flush(&mut self);
}

/// Named autosession profiles.
pub trait ProfileSource {
    /// `None` if the name is unknown.  An unparsable profile comes back
    /// as an empty (invalid) profile.
    fn load(&self, name: &str) -> Option<TemperatureProfile>;
}

/// Sink that drops every record, for builds with cycle logging off.
pub struct NullCycleLog;

impl CycleLogSink for NullCycleLog {
    fn record(&mut self, _record: &CycleRecord) {}
    fn flush(&mut self) {}
}
