//! Unified error types for the heater controller.
//!
//! Library code returns [`Result`], whose error side is [`ControlError`].
//! Every variant is `Copy` so faults can be passed through the control
//! cycle, the mode machine, and the event sink without allocation.
//!
//! Two different things live here:
//!
//! - **Typed errors** (`ControlError` and its sub-enums) returned from
//!   fallible calls and matched exhaustively by callers.
//! - **The latched error** ([`ErrorLatch`]): the single user-visible fault
//!   the device is currently displaying.  First fault wins; a later
//!   symptom never overwrites the root cause.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level controller error
// ---------------------------------------------------------------------------

/// Every fallible operation in the controller funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlError {
    /// The thermocouple could not be read or returned implausible data.
    Sensor(SensorFault),
    /// A safety interlock shut the heater down.
    Safety(ErrorCode),
    /// A periodic timer was misused (double start / double stop).
    Scheduler(SchedulerError),
    /// Configuration failed validation.
    Config(ConfigError),
}

impl fmt::Display for ControlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sensor(e) => write!(f, "sensor: {e}"),
            Self::Safety(code) => write!(f, "safety: {}", code.message()),
            Self::Scheduler(e) => write!(f, "scheduler: {e}"),
            Self::Config(e) => write!(f, "config: {e}"),
        }
    }
}

impl core::error::Error for ControlError {}

// ---------------------------------------------------------------------------
// Sensor faults
// ---------------------------------------------------------------------------

/// Classified thermocouple failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorFault {
    /// SPI transfer failed.
    ReadError,
    /// Probe absent or reading not a number.
    InvalidReading,
    /// Exactly zero, which indicates a wiring fault.
    ZeroReading,
    /// Negative, which indicates reversed polarity.
    BelowZero,
    /// Above the plausible ceiling, which indicates a short.
    AboveLimit,
}

impl SensorFault {
    /// Fatal faults latch the heater off and stop the control timer.
    /// Non-fatal faults only pause heating for the current cycle.
    pub const fn is_fatal(self) -> bool {
        matches!(self, Self::ReadError | Self::InvalidReading | Self::ZeroReading)
    }

    /// Error code surfaced to the user when this fault is latched.
    pub const fn code(self) -> ErrorCode {
        match self {
            Self::ReadError => ErrorCode::ThermocoupleReadError,
            Self::InvalidReading => ErrorCode::ThermocoupleInvalidReading,
            Self::ZeroReading => ErrorCode::ThermocoupleZeroReading,
            Self::BelowZero => ErrorCode::ThermocoupleBelowZero,
            Self::AboveLimit => ErrorCode::ThermocoupleAboveLimit,
        }
    }
}

impl fmt::Display for SensorFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code().message())
    }
}

impl From<SensorFault> for ControlError {
    fn from(e: SensorFault) -> Self {
        Self::Sensor(e)
    }
}

// ---------------------------------------------------------------------------
// Scheduler errors
// ---------------------------------------------------------------------------

/// Programming errors raised by [`PeriodicTimer`](crate::scheduler::PeriodicTimer).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerError {
    /// `start()` called while the timer is running (or mid-transition).
    AlreadyRunning(&'static str),
    /// `stop()` called while the timer is idle (or mid-transition).
    NotRunning(&'static str),
    /// The hardware timer refused to arm (platform error code).
    ArmFailed(&'static str, i32),
}

impl fmt::Display for SchedulerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadyRunning(name) => {
                write!(f, "{name} timer is already running, cannot start again without stopping first")
            }
            Self::NotRunning(name) => {
                write!(f, "{name} timer is not running, cannot stop without starting first")
            }
            Self::ArmFailed(name, rc) => write!(f, "{name} timer failed to arm (rc={rc})"),
        }
    }
}

impl From<SchedulerError> for ControlError {
    fn from(e: SchedulerError) -> Self {
        Self::Scheduler(e)
    }
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// JSON could not be parsed into a [`ControllerConfig`](crate::config::ControllerConfig).
    Malformed,
    /// A field failed range validation; the text names the field.
    Invalid(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Malformed => write!(f, "malformed configuration"),
            Self::Invalid(field) => write!(f, "invalid value: {field}"),
        }
    }
}

impl From<ConfigError> for ControlError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

// ---------------------------------------------------------------------------
// Error codes
// ---------------------------------------------------------------------------

/// Stable identifiers for every user-visible fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    ThermocoupleReadError,
    ThermocoupleInvalidReading,
    ThermocoupleZeroReading,
    ThermocoupleBelowZero,
    ThermocoupleAboveLimit,
    BatteryLevelTooLow,
    MainsVoltageTooHigh,
    UnknownPowerType,
    HeaterTooHot,
    ControllerTooHot,
}

/// Which interlock owns a code.  An interlock that finds its condition
/// resolved clears only errors of its own category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Thermocouple,
    SupplyVoltage,
    HeaterOverheat,
    ControllerOverheat,
}

impl ErrorCode {
    /// Short machine-readable code.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ThermocoupleReadError => "thermocouple-read_error",
            Self::ThermocoupleInvalidReading => "thermocouple-invalid_reading",
            Self::ThermocoupleZeroReading => "thermocouple-zero_reading",
            Self::ThermocoupleBelowZero => "thermocouple-below_zero",
            Self::ThermocoupleAboveLimit => "thermocouple-above_limit",
            Self::BatteryLevelTooLow => "battery_level-too-low",
            Self::MainsVoltageTooHigh => "mains-voltage-too-high",
            Self::UnknownPowerType => "unknown-power-type",
            Self::HeaterTooHot => "heater-too_hot",
            Self::ControllerTooHot => "controller-too_hot",
        }
    }

    /// Default human-readable message.
    pub const fn message(self) -> &'static str {
        match self {
            Self::ThermocoupleReadError => "Thermocouple read error, check wiring",
            Self::ThermocoupleInvalidReading => "Thermocouple reading invalid, probe absent?",
            Self::ThermocoupleZeroReading => "Thermocouple reads zero, check wiring",
            Self::ThermocoupleBelowZero => "Thermocouple below zero, polarity reversed?",
            Self::ThermocoupleAboveLimit => "Thermocouple above limit, possible short",
            Self::BatteryLevelTooLow => "Battery voltage too low",
            Self::MainsVoltageTooHigh => "Mains supply voltage too high",
            Self::UnknownPowerType => "Unknown power source type",
            Self::HeaterTooHot => "Heater too hot, cooling down",
            Self::ControllerTooHot => "Controller too hot, waiting to cool",
        }
    }

    pub const fn category(self) -> ErrorCategory {
        match self {
            Self::ThermocoupleReadError
            | Self::ThermocoupleInvalidReading
            | Self::ThermocoupleZeroReading
            | Self::ThermocoupleBelowZero
            | Self::ThermocoupleAboveLimit => ErrorCategory::Thermocouple,
            Self::BatteryLevelTooLow | Self::MainsVoltageTooHigh | Self::UnknownPowerType => {
                ErrorCategory::SupplyVoltage
            }
            Self::HeaterTooHot => ErrorCategory::HeaterOverheat,
            Self::ControllerTooHot => ErrorCategory::ControllerOverheat,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<ErrorCode> for ControlError {
    fn from(code: ErrorCode) -> Self {
        Self::Safety(code)
    }
}

// ---------------------------------------------------------------------------
// Latched error
// ---------------------------------------------------------------------------

/// The fault currently shown to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LatchedError {
    pub code: ErrorCode,
    pub message: heapless::String<64>,
    pub timestamp_ms: u32,
}

/// Single-slot, first-fault-wins error latch.
#[derive(Debug, Clone, Default)]
pub struct ErrorLatch {
    slot: Option<LatchedError>,
}

impl ErrorLatch {
    pub const fn new() -> Self {
        Self { slot: None }
    }

    /// Latch `code` unless another error is already active.
    /// Returns `true` if this call latched it.
    pub fn set(&mut self, code: ErrorCode, timestamp_ms: u32) -> bool {
        if self.slot.is_some() {
            return false;
        }
        let mut message = heapless::String::new();
        // Every default message fits the 64-byte buffer.
        let _ = message.push_str(code.message());
        self.slot = Some(LatchedError {
            code,
            message,
            timestamp_ms,
        });
        true
    }

    /// Unconditionally clear the latch.
    pub fn clear(&mut self) {
        self.slot = None;
    }

    /// Clear only if the latched error is `code`.  Returns `true` if cleared.
    pub fn clear_code(&mut self, code: ErrorCode) -> bool {
        self.clear_if(|e| e.code == code)
    }

    /// Clear only if the latched error belongs to `category`.
    pub fn clear_category(&mut self, category: ErrorCategory) -> bool {
        self.clear_if(|e| e.code.category() == category)
    }

    pub fn clear_if(&mut self, pred: impl FnOnce(&LatchedError) -> bool) -> bool {
        if self.slot.as_ref().is_some_and(pred) {
            self.slot = None;
            true
        } else {
            false
        }
    }

    pub fn current(&self) -> Option<&LatchedError> {
        self.slot.as_ref()
    }

    pub fn code(&self) -> Option<ErrorCode> {
        self.slot.as_ref().map(|e| e.code)
    }

    pub fn is_active(&self) -> bool {
        self.slot.is_some()
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Controller-wide `Result` alias.
pub type Result<T> = core::result::Result<T, ControlError>;
