//! Controller configuration parameters.
//!
//! All tunables for one heater profile.  A profile is loaded from JSON at
//! boot (or when the user picks another profile) and validated before it
//! is used; out-of-range values are rejected, never silently clamped.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// How requested power is derived each cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlKind {
    /// PID on measured temperature.
    TemperaturePid,
    /// Fixed duty cycle set by the user.
    DutyCycle,
    /// Target wattage converted to duty from live voltage.
    Watts,
}

/// Kind of supply feeding the heater.  Decides which voltage check runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PowerSource {
    Lipo,
    Lead,
    Mains,
    /// Anything the firmware does not recognise.  Always fails the check.
    #[serde(other)]
    Unknown,
}

/// Which heater driver the board is fitted with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HeaterKind {
    Element,
    Induction,
}

/// PID gains.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PidTunings {
    pub kp: f32,
    pub ki: f32,
    pub kd: f32,
}

impl Default for PidTunings {
    fn default() -> Self {
        Self {
            kp: 1.0,
            ki: 0.1,
            kd: 0.05,
        }
    }
}

/// Full per-profile configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    // --- Control ---
    pub control: ControlKind,
    pub heater: HeaterKind,
    pub pid: PidTunings,
    /// Initial temperature setpoint (°C).
    pub setpoint: i32,
    /// Upper bound for any setpoint, manual or profile-driven (°C).
    pub max_allowed_setpoint: i32,
    /// Manual duty cycle for [`ControlKind::DutyCycle`] (0-100%).
    pub set_duty_cycle: f32,
    /// Target wattage for [`ControlKind::Watts`].
    pub set_watts: f32,
    /// Requested power at or below this keeps the heater off (0-100%).
    pub power_threshold: f32,

    // --- Supply ---
    pub power_type: PowerSource,
    pub lipo_count: u8,
    pub lipo_safe_volts: f32,
    pub lead_safe_volts: f32,
    pub mains_safe_volts: f32,

    // --- Element ---
    /// Cold resistance of the heating element (Ω).
    pub heater_resistance: f32,
    /// Wattage budget that derates the duty cycle.
    pub max_watts: f32,

    // --- Thermocouple ---
    /// Largest heater-on drop still accepted as a partial correction (°C).
    pub heater_on_temperature_difference_threshold: f32,
    /// Readings above this are classified as a short (°C).
    pub thermocouple_limit: f32,
    /// Pause before a safe re-read with the heater off (ms).
    pub safe_reread_pause_ms: u32,

    // --- Session ---
    pub session_timeout_ms: u32,
    pub session_extend_ms: u32,
    /// Remaining-time window in which the near-expiry indicator is lit.
    pub session_warning_start_ms: u32,
    pub session_warning_end_ms: u32,
    /// `measured >= setpoint - margin` counts as "setpoint reached".
    pub setpoint_reached_margin: f32,
    /// `measured > setpoint + margin` forces a PID reset.
    pub pid_reset_high_temperature: f32,
    pub session_reset_pid_when_near_setpoint: bool,

    // --- Autosession ---
    pub autosession_logging: bool,
    pub autosession_time_adjustment_step_secs: u32,
    /// Lines buffered before the CSV log is flushed (1-200).
    pub log_flush_threshold: u16,

    // --- Safety ---
    pub overheat_on_c: f32,
    pub overheat_off_c: f32,
    /// Controller die temperature limit (°C).
    pub die_temperature_limit_c: f32,

    // --- Timing ---
    pub control_period_ms: u32,
    pub housekeeping_period_ms: u32,
    pub die_cooldown_poll_ms: u32,
    pub coil_switch_period_ms: u32,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            // Control
            control: ControlKind::TemperaturePid,
            heater: HeaterKind::Element,
            pid: PidTunings::default(),
            setpoint: 165,
            max_allowed_setpoint: 250,
            set_duty_cycle: 0.0,
            set_watts: 30.0,
            power_threshold: 0.0,

            // Supply
            power_type: PowerSource::Mains,
            lipo_count: 4,
            lipo_safe_volts: 3.3,
            lead_safe_volts: 12.0,
            mains_safe_volts: 28.0,

            // Element
            heater_resistance: 0.4,
            max_watts: 75.0,

            // Thermocouple
            heater_on_temperature_difference_threshold: 20.0,
            thermocouple_limit: 1000.0,
            safe_reread_pause_ms: 301,

            // Session
            session_timeout_ms: 7 * 60 * 1000,
            session_extend_ms: 60_000,
            session_warning_start_ms: 50_000,
            session_warning_end_ms: 60_000,
            setpoint_reached_margin: 8.0,
            pid_reset_high_temperature: 15.0,
            session_reset_pid_when_near_setpoint: true,

            // Autosession
            autosession_logging: false,
            autosession_time_adjustment_step_secs: 10,
            log_flush_threshold: 20,

            // Safety
            overheat_on_c: 250.0,
            overheat_off_c: 240.0,
            die_temperature_limit_c: 60.0,

            // Timing
            control_period_ms: 371,
            housekeeping_period_ms: 903,
            die_cooldown_poll_ms: 250,
            coil_switch_period_ms: 750,
        }
    }
}

impl ControllerConfig {
    /// Parse a JSON profile and validate it.  Missing fields take defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json).map_err(|_| ConfigError::Malformed)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values outside what the hardware can safely do.
    pub fn validate(&self) -> Result<(), ConfigError> {
        fn check(ok: bool, field: &'static str) -> Result<(), ConfigError> {
            if ok { Ok(()) } else { Err(ConfigError::Invalid(field)) }
        }

        check((1..=300).contains(&self.setpoint), "setpoint")?;
        check(
            (1..=300).contains(&self.max_allowed_setpoint),
            "max_allowed_setpoint",
        )?;
        check((1.0..=150.0).contains(&self.max_watts), "max_watts")?;
        check((0.0..=150.0).contains(&self.set_watts), "set_watts")?;
        check((0.0..=100.0).contains(&self.set_duty_cycle), "set_duty_cycle")?;
        check((0.0..=100.0).contains(&self.power_threshold), "power_threshold")?;
        check(
            (0.3..=2.5).contains(&self.heater_resistance),
            "heater_resistance",
        )?;
        check(self.lipo_count > 0, "lipo_count")?;
        check(self.overheat_on_c > self.overheat_off_c, "overheat_on_c")?;
        check(
            self.heater_on_temperature_difference_threshold > 0.0,
            "heater_on_temperature_difference_threshold",
        )?;
        check(self.thermocouple_limit > 0.0, "thermocouple_limit")?;
        check(
            self.session_warning_start_ms < self.session_warning_end_ms,
            "session_warning_start_ms",
        )?;
        check(
            (1..=200).contains(&self.log_flush_threshold),
            "log_flush_threshold",
        )?;
        check(self.control_period_ms > 0, "control_period_ms")?;
        check(self.housekeeping_period_ms > 0, "housekeeping_period_ms")?;
        check(self.die_cooldown_poll_ms > 0, "die_cooldown_poll_ms")?;
        Ok(())
    }

    /// Clamp a requested setpoint into `[1, max_allowed_setpoint]`.
    pub fn clamp_setpoint(&self, setpoint: i32) -> i32 {
        setpoint.clamp(1, self.max_allowed_setpoint)
    }
}

// ---------------------------------------------------------------------------
// Safety limits
// ---------------------------------------------------------------------------

/// Immutable limits derived from the active profile.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SafetyLimits {
    pub power_type: PowerSource,
    pub lipo_count: u8,
    pub lipo_safe_volts: f32,
    pub lead_safe_volts: f32,
    pub mains_safe_volts: f32,
    pub overheat_on_c: f32,
    pub overheat_off_c: f32,
    pub die_temperature_limit_c: f32,
    pub max_watts: f32,
    pub heater_resistance: f32,
}

impl From<&ControllerConfig> for SafetyLimits {
    fn from(c: &ControllerConfig) -> Self {
        Self {
            power_type: c.power_type,
            lipo_count: c.lipo_count,
            lipo_safe_volts: c.lipo_safe_volts,
            lead_safe_volts: c.lead_safe_volts,
            mains_safe_volts: c.mains_safe_volts,
            overheat_on_c: c.overheat_on_c,
            overheat_off_c: c.overheat_off_c,
            die_temperature_limit_c: c.die_temperature_limit_c,
            max_watts: c.max_watts,
            heater_resistance: c.heater_resistance,
        }
    }
}
