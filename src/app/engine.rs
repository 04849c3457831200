//! Control loop engine: the core of the controller.
//!
//! [`ControlLoopEngine`] owns the PID regulator, the thermocouple filter,
//! the safety interlock, the mode machine and the error latch.  It is
//! the only writer of controller state; everything else sees a copied
//! [`ControllerState`] snapshot.
//!
//! ```text
//!  TemperatureSensor ──▶ ┌──────────────────────────────┐ ──▶ EventSink
//!  VoltageSource     ──▶ │       ControlLoopEngine      │ ──▶ CycleLogSink
//!                        │ filter · PID · modes · safety│
//!  HeaterActuator    ◀── └──────────────────────────────┘
//! ```
//!
//! Two entry points are driven by periodic timers:
//!
//! - [`on_control_tick`](ControlLoopEngine::on_control_tick): one full
//!   control cycle.  A fatal sensor fault stops the control timer.
//! - [`on_housekeeping_tick`](ControlLoopEngine::on_housekeeping_tick):
//!   controller die check.  Blocks while the die is too hot.

use embedded_hal::delay::DelayNs;
use heapless::HistoryBuffer;
use log::{debug, error, info, warn};

use crate::config::{ControlKind, ControllerConfig, SafetyLimits};
use crate::control::filter::{FilteredReading, ThermocoupleFilter};
use crate::control::pid::{PidComponents, PidRegulator};
use crate::error::{ConfigError, ControlError, ErrorCategory, ErrorCode, ErrorLatch, SensorFault};
use crate::fsm::context::{ModeContext, ModeNotice};
use crate::fsm::{Mode, ModeMachine};
use crate::safety::{SafetyInterlock, SupplyVerdict, heater_watts, watts_to_duty};
use crate::scheduler::ControlTimer;
use crate::time::{ticks_add, ticks_diff};

use super::commands::ControlCommand;
use super::events::{AppEvent, CycleRecord};
use super::ports::{
    Clock, ControllerHardware, CycleLogSink, DieTemperatureSensor, EventSink, HeaterActuator,
    ProfileSource, TemperatureSensor,
};

/// Samples kept per history series.
pub const HISTORY_LEN: usize = 128;

// ───────────────────────────────────────────────────────────────
// Snapshot types
// ───────────────────────────────────────────────────────────────

/// Read-only copy of the controller state for display and indicators.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControllerState {
    pub mode: Mode,
    pub measured: f32,
    pub setpoint: f32,
    /// Heater power, 0-100%.
    pub power: f32,
    pub volts: f32,
    pub watts: u32,
    pub heater_on: bool,
    pub max_duty_cycle: f32,
    pub error: Option<ErrorCode>,
    pub setpoint_reached: bool,
    pub too_hot: bool,
    /// Session time left; only meaningful in [`Mode::Session`].
    pub session_remaining_ms: i64,
    pub session_near_expiry: bool,
    setpoint_band: f32,
}

impl ControllerState {
    /// Within the "reached" band either side of the setpoint.
    pub fn near_setpoint(&self) -> bool {
        (self.measured - self.setpoint).abs() <= self.setpoint_band
    }
}

/// Bounded sample series for the graph collaborator.  Oldest samples
/// are evicted first.
pub struct SampleHistory {
    temperature: HistoryBuffer<f32, HISTORY_LEN>,
    volts: HistoryBuffer<f32, HISTORY_LEN>,
    watts: HistoryBuffer<u32, HISTORY_LEN>,
}

impl SampleHistory {
    pub fn new() -> Self {
        Self {
            temperature: HistoryBuffer::new(),
            volts: HistoryBuffer::new(),
            watts: HistoryBuffer::new(),
        }
    }

    fn push(&mut self, temperature: f32, volts: f32, watts: u32) {
        self.temperature.write(temperature);
        self.volts.write(volts);
        self.watts.write(watts);
    }

    pub fn len(&self) -> usize {
        self.temperature.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn temperatures(&self) -> impl Iterator<Item = &f32> {
        self.temperature.oldest_ordered()
    }

    pub fn volts(&self) -> impl Iterator<Item = &f32> {
        self.volts.oldest_ordered()
    }

    pub fn watts(&self) -> impl Iterator<Item = &u32> {
        self.watts.oldest_ordered()
    }
}

impl Default for SampleHistory {
    fn default() -> Self {
        Self::new()
    }
}

// ───────────────────────────────────────────────────────────────
// ControlLoopEngine
// ───────────────────────────────────────────────────────────────

pub struct ControlLoopEngine {
    config: ControllerConfig,
    pid: PidRegulator,
    filter: ThermocoupleFilter,
    interlock: SafetyInterlock,
    modes: ModeMachine,
    ctx: ModeContext,
    errors: ErrorLatch,
    history: SampleHistory,

    // -- Runtime settings (commands may change these) --
    control: ControlKind,
    duty_cycle: f32,
    set_watts: f32,
    max_watts: f32,
    selected_profile: Option<heapless::String<32>>,

    // -- Per-cycle outputs --
    measured: f32,
    volts: Option<f32>,
    power: f32,
    watts: u32,
    max_duty: f32,

    last_cycle_ms: Option<u32>,
    cycles: u32,
    /// Control timer was stopped by the die-overheat wait.
    paused_for_die: bool,
    near_expiry_reported: bool,
    /// Cycle records were written since the last flush.
    log_dirty: bool,
}

impl ControlLoopEngine {
    /// Build the engine for one profile.  The profile is validated first;
    /// call [`start`](Self::start) next.
    pub fn new(config: ControllerConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let ctx = ModeContext::new(&config);
        let mut pid = PidRegulator::new(config.pid, ctx.setpoint);
        pid.set_limits(0.0, 100.0);

        Ok(Self {
            filter: ThermocoupleFilter::new(config.heater_on_temperature_difference_threshold),
            interlock: SafetyInterlock::new(SafetyLimits::from(&config)),
            modes: ModeMachine::standard(),
            errors: ErrorLatch::new(),
            history: SampleHistory::new(),
            control: config.control,
            duty_cycle: config.set_duty_cycle,
            set_watts: config.set_watts,
            max_watts: config.max_watts,
            selected_profile: None,
            measured: 0.0,
            volts: None,
            power: 0.0,
            watts: 0,
            max_duty: 100.0,
            last_cycle_ms: None,
            cycles: 0,
            paused_for_die: false,
            near_expiry_reported: false,
            log_dirty: false,
            pid,
            ctx,
            config,
        })
    }

    // ── Lifecycle ─────────────────────────────────────────────

    pub fn start(&mut self, clock: &impl Clock, sink: &mut impl EventSink) {
        self.ctx.now_ms = clock.now_ms();
        self.modes.start(&mut self.ctx);
        sink.emit(&AppEvent::Started(self.modes.current()));
        info!(
            "Control engine started in {} ({:?} control)",
            self.modes.current_name(),
            self.control
        );
    }

    /// One read at boot.  A fatal fault means no usable thermocouple, so
    /// temperature control is swapped for plain duty-cycle control.
    pub fn probe_sensor(&mut self, sensor: &mut impl TemperatureSensor) -> Result<(), SensorFault> {
        match sensor.raw_read() {
            Err(fault) if fault.is_fatal() => {
                self.disable_temperature_control();
                Err(fault)
            }
            Err(fault) => {
                warn!("Thermocouple probe: {fault} (not fatal)");
                Ok(())
            }
            Ok(_) => Ok(()),
        }
    }

    /// Fall back to duty-cycle control.
    pub fn disable_temperature_control(&mut self) {
        if self.control == ControlKind::TemperaturePid {
            warn!("Temperature control disabled, falling back to duty cycle");
        }
        self.control = ControlKind::DutyCycle;
        self.ctx.settings.control = ControlKind::DutyCycle;
    }

    // ── Timer entry points ────────────────────────────────────

    /// Control timer callback.
    ///
    /// Transient sensor faults skip the cycle and return `Ok`.  A fatal
    /// sensor fault stops `timer` and is returned; the engine stays
    /// stopped until the timer is started again from outside.
    pub fn on_control_tick<H: ControllerHardware>(
        &mut self,
        hw: &mut H,
        timer: &impl ControlTimer,
        sink: &mut impl EventSink,
        log: &mut impl CycleLogSink,
    ) -> Result<(), ControlError> {
        match self.run_cycle(hw, sink, log) {
            Err(ControlError::Sensor(fault)) if fault.is_fatal() => {
                if timer.is_running() {
                    timer.stop()?;
                }
                error!("Control loop halted: {fault}");
                Err(fault.into())
            }
            Err(ControlError::Sensor(_)) => Ok(()),
            other => other,
        }
    }

    /// Housekeeping timer callback: controller die temperature.
    ///
    /// When the die is over its limit the control timer is stopped, the
    /// heater switched off and this call blocks, polling every
    /// `die_cooldown_poll_ms`, until the die is back under the limit.
    /// `keepalive` runs once per poll (feed the watchdog there).
    pub fn on_housekeeping_tick<H>(
        &mut self,
        hw: &mut H,
        timer: &impl ControlTimer,
        sink: &mut impl EventSink,
        keepalive: &mut impl FnMut(),
    ) -> Result<(), ControlError>
    where
        H: DieTemperatureSensor + HeaterActuator + Clock + DelayNs,
    {
        let mut die = hw.read_die_celsius();
        if !self.interlock.die_overheated(die) {
            return Ok(());
        }

        if timer.is_running() {
            timer.stop()?;
            self.paused_for_die = true;
        }
        hw.off();
        self.power = 0.0;
        self.latch(ErrorCode::ControllerTooHot, hw.now_ms(), sink);
        sink.emit(&AppEvent::DieCooling(die));
        error!("Controller die at {die:.1}\u{00b0}C, waiting to cool");

        while self.interlock.die_overheated(die) {
            hw.delay_ms(self.config.die_cooldown_poll_ms);
            keepalive();
            die = hw.read_die_celsius();
        }

        info!("Controller die cooled to {die:.1}\u{00b0}C");
        if self.errors.clear_code(ErrorCode::ControllerTooHot) {
            sink.emit(&AppEvent::FaultCleared(ErrorCode::ControllerTooHot));
        }
        if self.paused_for_die {
            self.paused_for_die = false;
            timer.start()?;
        }
        Ok(())
    }

    // ── Control cycle ─────────────────────────────────────────

    /// One control cycle.  Sensor faults come back as
    /// `Err(ControlError::Sensor(_))` with the heater already off.
    pub fn run_cycle<H: ControllerHardware>(
        &mut self,
        hw: &mut H,
        sink: &mut impl EventSink,
        log: &mut impl CycleLogSink,
    ) -> Result<(), ControlError> {
        let now = hw.now_ms();
        let dt = self.cycle_dt(now);
        self.ctx.now_ms = now;
        self.cycles = self.cycles.wrapping_add(1);

        // 1. PID follows the visible setpoint
        self.sync_pid_setpoint();

        // 2. Filtered temperature
        let heater_on = hw.is_on();
        let mut reading = self.read_filtered(hw, heater_on, sink)?;

        // 3. Supply voltage
        let volts = hw.read_volts(self.volts);
        self.volts = Some(volts);

        // 4. Duty derating
        self.max_duty = self.interlock.duty_cap(self.max_watts, volts);
        hw.set_max_duty_cycle(self.max_duty);

        // 5. Safe re-read with the heater off
        if reading.needs_safe_reread {
            debug!("Thermocouple: safe re-read");
            hw.off();
            hw.delay_ms(self.config.safe_reread_pause_ms);
            reading = self.read_filtered(hw, false, sink)?;
        }
        self.measured = reading.temperature as f32;

        // 6. History
        let watts_now = self.delivered_watts(&*hw, volts);
        self.history.push(self.measured, volts, watts_now);

        // 7. Mode rules (session timeout, reached flag, profile setpoint)
        self.ctx.measured = self.measured;
        self.ctx.pid_integral = self.pid.components().i;
        let before = self.modes.current();
        self.modes.tick(&mut self.ctx);
        self.after_mode_update(before, sink);
        self.sync_pid_setpoint();

        // 8. Requested power
        let pid_output = self.pid.compute(self.measured, dt);
        let requested = match self.control {
            ControlKind::TemperaturePid => pid_output,
            ControlKind::DutyCycle => self.duty_cycle,
            ControlKind::Watts => {
                watts_to_duty(self.set_watts, volts, self.config.heater_resistance)
            }
        }
        .clamp(0.0, 100.0);

        // 9-10. Interlocks
        let supply_ok = self.apply_supply_verdict(volts, hw, sink);
        let too_hot = self.apply_overheat(hw, sink);

        // 11. Actuate
        let mode = self.modes.current();
        if mode.is_active() && supply_ok && !too_hot && requested > self.config.power_threshold {
            if hw.is_on() {
                hw.set_power(requested);
            } else {
                hw.on(requested);
            }
            self.power = requested;
        } else {
            hw.off();
            self.power = 0.0;
        }
        self.watts = self.delivered_watts(&*hw, volts);

        // 12. Cycle record
        self.emit_record(sink, log);
        Ok(())
    }

    // ── Commands ──────────────────────────────────────────────

    /// Apply one external command between control cycles.
    pub fn handle_command<H>(
        &mut self,
        cmd: ControlCommand,
        hw: &mut H,
        profiles: &impl ProfileSource,
        sink: &mut impl EventSink,
    ) where
        H: HeaterActuator + Clock,
    {
        self.ctx.now_ms = hw.now_ms();
        let before = self.modes.current();

        match cmd {
            ControlCommand::RequestMode(mode) => {
                if mode == Mode::Autosession && !self.ctx.has_valid_profile() {
                    self.reload_selected_profile(profiles);
                }
                if let Err(e) = self.modes.request(mode, &mut self.ctx) {
                    warn!("Mode request {mode:?} refused: {e}");
                }
            }
            ControlCommand::SetSetpoint(value) => {
                let autosession = before == Mode::Autosession;
                self.ctx.set_user_setpoint(value as f32, autosession);
                info!("Setpoint set to {:.0}\u{00b0}C", self.ctx.user_setpoint);
            }
            ControlCommand::SetDutyCycle(value) => {
                self.duty_cycle = value.clamp(0.0, 100.0);
                info!("Duty cycle set to {:.1}%", self.duty_cycle);
            }
            ControlCommand::SetWatts(value) => {
                self.set_watts = value.clamp(0.0, self.max_watts);
                info!("Target power set to {:.1}W", self.set_watts);
            }
            ControlCommand::SetMaxWatts(value) => {
                self.max_watts = value.clamp(1.0, 150.0);
                self.set_watts = self.set_watts.min(self.max_watts);
                info!("Max power set to {:.1}W", self.max_watts);
            }
            ControlCommand::SelectProfile(name) => self.select_profile(name, profiles),
            ControlCommand::ExtendSession => self.extend_session(before),
            ControlCommand::StartShortSession => {
                if before == Mode::Off {
                    match self.modes.request(Mode::Session, &mut self.ctx) {
                        Ok(()) => {
                            self.ctx.session.duration_ms = self.ctx.settings.warning_end_ms;
                            info!("Short session: {}s", self.ctx.settings.warning_end_ms / 1000);
                        }
                        Err(e) => warn!("Short session refused: {e}"),
                    }
                } else {
                    debug!("Short session ignored in {before:?}");
                }
            }
            ControlCommand::ShiftAutosession(steps) => self.shift_autosession(before, steps),
        }

        self.after_mode_update(before, sink);
        if !self.modes.current().is_active() {
            hw.off();
            self.power = 0.0;
        }
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn snapshot(&self) -> ControllerState {
        let in_session = self.modes.current() == Mode::Session;
        ControllerState {
            mode: self.modes.current(),
            measured: self.measured,
            setpoint: self.ctx.setpoint,
            power: self.power,
            volts: self.volts.unwrap_or(0.0),
            watts: self.watts,
            heater_on: self.power > 0.0,
            max_duty_cycle: self.max_duty,
            error: self.errors.code(),
            setpoint_reached: self.ctx.setpoint_reached,
            too_hot: self.interlock.is_too_hot(),
            session_remaining_ms: if in_session { self.ctx.session_remaining() } else { 0 },
            session_near_expiry: in_session && self.ctx.session_near_expiry(),
            setpoint_band: self.ctx.settings.reached_margin,
        }
    }

    pub fn mode(&self) -> Mode {
        self.modes.current()
    }

    pub fn errors(&self) -> &ErrorLatch {
        &self.errors
    }

    /// Clear the latched error from outside (after a fatal fault was
    /// fixed and the user acknowledged it).
    pub fn clear_error(&mut self, sink: &mut impl EventSink) {
        if let Some(code) = self.errors.code() {
            self.errors.clear();
            sink.emit(&AppEvent::FaultCleared(code));
        }
    }

    pub fn history(&self) -> &SampleHistory {
        &self.history
    }

    pub fn pid_components(&self) -> PidComponents {
        self.pid.components()
    }

    pub fn control_kind(&self) -> ControlKind {
        self.control
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    pub fn cycles(&self) -> u32 {
        self.cycles
    }

    // ── Internal ──────────────────────────────────────────────

    /// Seconds since the previous cycle; the nominal period on the first.
    fn cycle_dt(&mut self, now: u32) -> f32 {
        let nominal = self.config.control_period_ms as f32 / 1000.0;
        let dt = match self.last_cycle_ms {
            Some(last) => match ticks_diff(now, last) {
                ms if ms > 0 => ms as f32 / 1000.0,
                _ => nominal,
            },
            None => nominal,
        };
        self.last_cycle_ms = Some(now);
        dt
    }

    fn sync_pid_setpoint(&mut self) {
        if self.pid.setpoint() != self.ctx.setpoint {
            self.pid.set_setpoint(self.ctx.setpoint);
        }
    }

    fn read_filtered<H: ControllerHardware>(
        &mut self,
        hw: &mut H,
        heater_on: bool,
        sink: &mut impl EventSink,
    ) -> Result<FilteredReading, ControlError> {
        match self.filter.filtered_read(hw, heater_on) {
            Ok(reading) => Ok(reading),
            Err(fault) => {
                hw.off();
                self.power = 0.0;
                self.watts = 0;
                if fault.is_fatal() {
                    let now = hw.now_ms();
                    self.latch(fault.code(), now, sink);
                    self.force_off(sink);
                } else {
                    warn!("Thermocouple: {fault}, skipping cycle");
                    sink.emit(&AppEvent::SensorPaused(fault));
                }
                Err(fault.into())
            }
        }
    }

    /// Returns `true` when the supply is fit to heat from.
    fn apply_supply_verdict(
        &mut self,
        volts: f32,
        hw: &mut impl HeaterActuator,
        sink: &mut impl EventSink,
    ) -> bool {
        match self.interlock.check_supply(volts) {
            SupplyVerdict::Trip(code) => {
                hw.off();
                self.latch(code, self.ctx.now_ms, sink);
                self.force_off(sink);
                false
            }
            SupplyVerdict::Safe => {
                self.clear_category(ErrorCategory::SupplyVoltage, sink);
                true
            }
        }
    }

    /// Returns `true` while the heater must stay off for overheat.
    fn apply_overheat(&mut self, hw: &mut impl HeaterActuator, sink: &mut impl EventSink) -> bool {
        if self.interlock.update_overheat(self.measured) {
            hw.off();
            self.latch(ErrorCode::HeaterTooHot, self.ctx.now_ms, sink);
            true
        } else {
            self.clear_category(ErrorCategory::HeaterOverheat, sink);
            false
        }
    }

    fn delivered_watts(&self, hw: &impl HeaterActuator, volts: f32) -> u32 {
        if hw.is_on() {
            heater_watts(volts, self.config.heater_resistance, hw.power()).max(0.0) as u32
        } else {
            0
        }
    }

    fn latch(&mut self, code: ErrorCode, now: u32, sink: &mut impl EventSink) {
        if self.errors.set(code, now) {
            error!("FAULT LATCHED: {code}");
            sink.emit(&AppEvent::FaultLatched(code));
        }
    }

    fn clear_category(&mut self, category: ErrorCategory, sink: &mut impl EventSink) {
        let code = self.errors.code();
        if self.errors.clear_category(category) {
            if let Some(code) = code {
                info!("FAULT CLEARED: {code}");
                sink.emit(&AppEvent::FaultCleared(code));
            }
        }
    }

    fn force_off(&mut self, sink: &mut impl EventSink) {
        let before = self.modes.current();
        self.modes.force_off(&mut self.ctx);
        self.after_mode_update(before, sink);
    }

    /// Publish whatever the mode handlers left on the blackboard.
    fn after_mode_update(&mut self, before: Mode, sink: &mut impl EventSink) {
        let after = self.modes.current();
        if after != before {
            sink.emit(&AppEvent::ModeChanged {
                from: before,
                to: after,
            });
        }

        if let Some(reason) = self.ctx.take_pid_reset() {
            debug!("PID reset ({reason:?})");
            self.pid.reset();
            sink.emit(&AppEvent::PidReset(reason));
        }

        for notice in self.ctx.drain_notices() {
            sink.emit(&match notice {
                ModeNotice::SetpointReached => AppEvent::SetpointReached,
                ModeNotice::SessionExpired => AppEvent::SessionExpired,
                ModeNotice::ProfileFinished => AppEvent::ProfileFinished,
            });
        }

        let near = after == Mode::Session && self.ctx.session_near_expiry();
        if near && !self.near_expiry_reported {
            sink.emit(&AppEvent::SessionNearExpiry);
        }
        self.near_expiry_reported = near;
    }

    fn emit_record(&mut self, sink: &mut impl EventSink, log: &mut impl CycleLogSink) {
        let pid = self.pid.components();
        let record = CycleRecord {
            elapsed_ms: if self.modes.current() == Mode::Autosession {
                self.ctx.autosession_elapsed_ms()
            } else {
                self.ctx.ms_in_mode()
            },
            temperature: self.measured,
            setpoint: self.ctx.setpoint,
            volts: self.volts.unwrap_or(0.0),
            power: self.power,
            watts: self.watts,
            p: pid.p,
            i: pid.i,
            d: pid.d,
        };
        sink.emit(&AppEvent::Cycle(record));

        if self.config.autosession_logging && self.modes.current() == Mode::Autosession {
            log.record(&record);
            self.log_dirty = true;
        } else if self.log_dirty {
            log.flush();
            self.log_dirty = false;
        }
    }

    fn reload_selected_profile(&mut self, profiles: &impl ProfileSource) {
        if let Some(name) = self.selected_profile.as_deref() {
            self.ctx.profile = profiles.load(name);
        }
    }

    fn select_profile(
        &mut self,
        name: heapless::String<32>,
        profiles: &impl ProfileSource,
    ) {
        let Some(profile) = profiles.load(&name) else {
            warn!("Profile {name:?} not found");
            return;
        };
        if profile.is_valid() {
            info!("Profile {name:?} selected: {profile}");
        } else {
            warn!("Profile {name:?} is empty or malformed");
        }
        self.ctx.profile = Some(profile);
        self.selected_profile = Some(name);

        // A running autosession restarts on the new curve.
        if self.modes.current() == Mode::Autosession
            && self.modes.request(Mode::Autosession, &mut self.ctx).is_err()
        {
            self.modes.force_off(&mut self.ctx);
        }
    }

    fn extend_session(&mut self, mode: Mode) {
        let remaining = self.ctx.session_remaining();
        if mode == Mode::Session && remaining < i64::from(self.ctx.settings.warning_end_ms) {
            self.ctx.session.extend(self.ctx.settings.session_extend_ms);
            info!(
                "Session extended by {}s",
                self.ctx.settings.session_extend_ms / 1000
            );
        } else {
            debug!("Session extension ignored ({mode:?}, {remaining} ms left)");
        }
    }

    fn shift_autosession(&mut self, mode: Mode, steps: i32) {
        if mode != Mode::Autosession {
            debug!("Autosession shift ignored in {mode:?}");
            return;
        }
        let step_ms = self.config.autosession_time_adjustment_step_secs.saturating_mul(1000);
        let shift = i64::from(steps) * i64::from(step_ms);

        // Keep profile time between the start and one past the end, and
        // within what a wrap-safe tick difference can represent.
        let end = self
            .ctx
            .profile
            .as_ref()
            .map_or(0, |p| i64::from(p.duration_ms()) + 1)
            .min(i64::from(i32::MAX));
        let elapsed = i64::from(self.ctx.autosession_elapsed_ms());
        let shifted = (elapsed + shift).clamp(0, end);

        // Skipping ahead means the profile "started" earlier.
        self.ctx.autosession_start_ms = ticks_add(self.ctx.now_ms, -(shifted as i32));
        info!(
            "Autosession shifted by {} step(s), profile at {}s",
            steps,
            shifted / 1000
        );
    }
}
