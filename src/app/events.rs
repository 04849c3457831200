//! Outbound application events.
//!
//! The [`ControlLoopEngine`](super::engine::ControlLoopEngine) emits these
//! through the [`EventSink`](super::ports::EventSink) port.

use core::fmt::Write as _;

use crate::error::{ErrorCode, SensorFault};
use crate::fsm::Mode;
use crate::fsm::context::PidResetReason;

/// Structured events emitted by the control core.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// Engine started (carries the initial mode).
    Started(Mode),

    ModeChanged { from: Mode, to: Mode },

    /// A fault was latched into the error slot.
    FaultLatched(ErrorCode),

    /// The latched fault was cleared.
    FaultCleared(ErrorCode),

    /// A non-fatal sensor fault skipped this cycle.
    SensorPaused(SensorFault),

    PidReset(PidResetReason),

    SetpointReached,
    SessionExpired,
    ProfileFinished,

    /// The session entered its last-minute warning window.
    SessionNearExpiry,

    /// The control timer was paused for a hot controller die.
    DieCooling(f32),

    /// One finished control cycle.
    Cycle(CycleRecord),
}

/// Telemetry for one control cycle.  One CSV row in the autosession log.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CycleRecord {
    /// Milliseconds since the mode was entered; profile time in autosession.
    pub elapsed_ms: u32,
    pub temperature: f32,
    pub setpoint: f32,
    pub volts: f32,
    /// Heater power, percent.
    pub power: f32,
    pub watts: u32,
    pub p: f32,
    pub i: f32,
    pub d: f32,
}

impl CycleRecord {
    pub const CSV_HEADER: &'static str =
        "elapsed_s,heater_temp_c,setpoint_c,input_volts,power_percent,watts,pid_p,pid_i,pid_d";

    /// One CSV line without the trailing newline.
    pub fn to_csv(&self) -> heapless::String<96> {
        let mut line = heapless::String::new();
        // 96 bytes holds every field at its widest sane value; an overflow
        // only truncates the line.
        let _ = write!(
            line,
            "{:.1},{:.1},{:.0},{:.2},{:.1},{},{:.2},{:.2},{:.2}",
            self.elapsed_ms as f32 / 1000.0,
            self.temperature,
            self.setpoint,
            self.volts,
            self.power,
            self.watts,
            self.p,
            self.i,
            self.d
        );
        line
    }

    /// Write the record as one CSV line.
    pub fn write_csv<W: std::io::Write>(&self, out: &mut W) -> std::io::Result<()> {
        writeln!(out, "{}", self.to_csv())
    }
}
