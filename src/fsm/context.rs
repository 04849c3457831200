//! Blackboard shared by every mode handler.
//!
//! The control engine writes `now_ms`, `measured` and `pid_integral`
//! before each tick; handlers write the setpoint, the reached flag, PID
//! reset requests and user-facing notices, which the engine picks up
//! afterwards.

use crate::config::{ControlKind, ControllerConfig};
use crate::control::profile::TemperatureProfile;
use crate::time::ticks_diff;

// ---------------------------------------------------------------------------
// Settings (copied out of the profile config once)
// ---------------------------------------------------------------------------

/// Mode-related tunables.
#[derive(Debug, Clone, Copy)]
pub struct ModeSettings {
    pub control: ControlKind,
    pub max_allowed_setpoint: i32,
    pub session_timeout_ms: u32,
    pub session_extend_ms: u32,
    pub warning_start_ms: u32,
    pub warning_end_ms: u32,
    pub reached_margin: f32,
    pub reset_high_margin: f32,
    pub reset_pid_when_reached: bool,
}

impl From<&ControllerConfig> for ModeSettings {
    fn from(c: &ControllerConfig) -> Self {
        Self {
            control: c.control,
            max_allowed_setpoint: c.max_allowed_setpoint,
            session_timeout_ms: c.session_timeout_ms,
            session_extend_ms: c.session_extend_ms,
            warning_start_ms: c.session_warning_start_ms,
            warning_end_ms: c.session_warning_end_ms,
            reached_margin: c.setpoint_reached_margin,
            reset_high_margin: c.pid_reset_high_temperature,
            reset_pid_when_reached: c.session_reset_pid_when_near_setpoint,
        }
    }
}

// ---------------------------------------------------------------------------
// Session timer
// ---------------------------------------------------------------------------

/// Session window kept as a start tick plus a length, never as an
/// absolute deadline, so it survives the millisecond counter wrapping.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionTimer {
    pub start_ms: u32,
    pub duration_ms: u32,
}

impl SessionTimer {
    pub fn start(&mut self, now_ms: u32, duration_ms: u32) {
        self.start_ms = now_ms;
        self.duration_ms = duration_ms;
    }

    /// Milliseconds since the session began; 0 if the start lies "ahead".
    pub fn elapsed(&self, now_ms: u32) -> u32 {
        ticks_diff(now_ms, self.start_ms).max(0) as u32
    }

    /// Milliseconds left; negative once overdue.
    pub fn remaining(&self, now_ms: u32) -> i64 {
        i64::from(self.duration_ms) - i64::from(self.elapsed(now_ms))
    }

    pub fn expired(&self, now_ms: u32) -> bool {
        self.remaining(now_ms) <= 0
    }

    pub fn extend(&mut self, by_ms: u32) {
        self.duration_ms = self.duration_ms.saturating_add(by_ms);
    }
}

// ---------------------------------------------------------------------------
// Outputs
// ---------------------------------------------------------------------------

/// Why a handler asked for the PID state to be cleared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PidResetReason {
    ModeChange,
    SetpointReached,
    Runaway,
    IntegralWindup,
}

/// One-shot events raised by handlers for the user interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeNotice {
    SetpointReached,
    SessionExpired,
    ProfileFinished,
}

pub const MAX_NOTICES: usize = 4;

/// Integral above which a near-setpoint autosession clears the PID.
pub const AUTOSESSION_INTEGRAL_LIMIT: f32 = 10.0;
/// Band below setpoint in which the autosession integral guard applies.
pub const AUTOSESSION_NEAR_BAND: f32 = 10.0;

// ---------------------------------------------------------------------------
// ModeContext
// ---------------------------------------------------------------------------

pub struct ModeContext {
    // -- Timing --
    pub now_ms: u32,
    /// Tick at which the current mode was entered.
    pub entered_at_ms: u32,

    // -- Inputs --
    pub measured: f32,
    pub pid_integral: f32,

    // -- Setpoint --
    /// Setpoint chosen by the user; autosession overrides `setpoint`
    /// while it runs and puts this one back on exit.
    pub user_setpoint: f32,
    /// Setpoint in force this cycle.
    pub setpoint: f32,
    pub setpoint_reached: bool,

    // -- Session / autosession --
    pub session: SessionTimer,
    pub autosession_start_ms: u32,
    pub profile: Option<TemperatureProfile>,

    pub settings: ModeSettings,

    // -- Outputs --
    pid_reset: Option<PidResetReason>,
    notices: heapless::Vec<ModeNotice, MAX_NOTICES>,
}

impl ModeContext {
    pub fn new(config: &ControllerConfig) -> Self {
        let setpoint = config.clamp_setpoint(config.setpoint) as f32;
        Self {
            now_ms: 0,
            entered_at_ms: 0,
            measured: 0.0,
            pid_integral: 0.0,
            user_setpoint: setpoint,
            setpoint,
            setpoint_reached: false,
            session: SessionTimer::default(),
            autosession_start_ms: 0,
            profile: None,
            settings: ModeSettings::from(config),
            pid_reset: None,
            notices: heapless::Vec::new(),
        }
    }

    /// Milliseconds since the current mode was entered.
    pub fn ms_in_mode(&self) -> u32 {
        ticks_diff(self.now_ms, self.entered_at_ms).max(0) as u32
    }

    /// Profile time: milliseconds since the (possibly shifted) autosession start.
    pub fn autosession_elapsed_ms(&self) -> u32 {
        ticks_diff(self.now_ms, self.autosession_start_ms).max(0) as u32
    }

    pub fn has_valid_profile(&self) -> bool {
        self.profile.as_ref().is_some_and(TemperatureProfile::is_valid)
    }

    /// Clamp into `[1, max_allowed_setpoint]`.
    pub fn clamp_setpoint(&self, setpoint: f32) -> f32 {
        setpoint.clamp(1.0, self.settings.max_allowed_setpoint as f32)
    }

    /// Change the user setpoint.  Takes effect immediately unless an
    /// autosession owns the setpoint.
    pub fn set_user_setpoint(&mut self, setpoint: f32, autosession_active: bool) {
        self.user_setpoint = self.clamp_setpoint(setpoint);
        if !autosession_active {
            self.setpoint = self.user_setpoint;
        }
    }

    pub fn request_pid_reset(&mut self, reason: PidResetReason) {
        // The first request in a cycle is the one reported.
        if self.pid_reset.is_none() {
            self.pid_reset = Some(reason);
        }
    }

    pub fn take_pid_reset(&mut self) -> Option<PidResetReason> {
        self.pid_reset.take()
    }

    pub fn notify(&mut self, notice: ModeNotice) {
        // At most one of each per cycle; a full queue drops the newest.
        if !self.notices.contains(&notice) {
            let _ = self.notices.push(notice);
        }
    }

    pub fn drain_notices(&mut self) -> heapless::Vec<ModeNotice, MAX_NOTICES> {
        core::mem::take(&mut self.notices)
    }

    /// Session time left; negative once overdue.
    pub fn session_remaining(&self) -> i64 {
        self.session.remaining(self.now_ms)
    }

    /// True while the remaining session time sits inside the warning window.
    pub fn session_near_expiry(&self) -> bool {
        let remaining = self.session_remaining();
        remaining > i64::from(self.settings.warning_start_ms)
            && remaining < i64::from(self.settings.warning_end_ms)
    }

    /// Whether `measured` is within the reached margin of the setpoint.
    pub fn near_setpoint(&self) -> bool {
        (self.measured - self.setpoint).abs() <= self.settings.reached_margin
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_timer_survives_wrap() {
        let mut t = SessionTimer::default();
        t.start(u32::MAX - 10, 100);
        assert_eq!(t.elapsed(u32::MAX), 10);
        assert_eq!(t.elapsed(20), 31);
        assert_eq!(t.remaining(20), 69);
        assert!(!t.expired(20));
        assert!(t.expired(89));
    }

    #[test]
    fn session_extend_adds_time() {
        let mut t = SessionTimer::default();
        t.start(0, 1000);
        t.extend(500);
        assert_eq!(t.remaining(1200), 300);
    }

    #[test]
    fn near_expiry_window_is_exclusive() {
        let mut ctx = ModeContext::new(&ControllerConfig::default());
        ctx.session.start(0, 420_000);
        ctx.now_ms = 420_000 - 60_000;
        assert!(!ctx.session_near_expiry());
        ctx.now_ms += 1;
        assert!(ctx.session_near_expiry());
        ctx.now_ms = 420_000 - 50_000;
        assert!(!ctx.session_near_expiry());
    }

    #[test]
    fn user_setpoint_is_clamped_and_deferred_during_autosession() {
        let mut ctx = ModeContext::new(&ControllerConfig::default());
        ctx.set_user_setpoint(400.0, false);
        assert_eq!(ctx.setpoint, 250.0);

        ctx.setpoint = 120.0;
        ctx.set_user_setpoint(180.0, true);
        assert_eq!(ctx.user_setpoint, 180.0);
        assert_eq!(ctx.setpoint, 120.0);
    }

    #[test]
    fn first_pid_reset_reason_wins() {
        let mut ctx = ModeContext::new(&ControllerConfig::default());
        ctx.request_pid_reset(PidResetReason::ModeChange);
        ctx.request_pid_reset(PidResetReason::Runaway);
        assert_eq!(ctx.take_pid_reset(), Some(PidResetReason::ModeChange));
        assert_eq!(ctx.take_pid_reset(), None);
    }
}
