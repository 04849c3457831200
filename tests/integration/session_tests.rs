//! Mode-level scenarios: timed sessions, autosession profiles, and the
//! command channel feeding the engine.

use heatctl::adapters::{CsvCycleLog, StaticProfiles};
use heatctl::app::ControlLoopEngine;
use heatctl::app::commands::{self, ControlCommand};
use heatctl::app::events::{AppEvent, CycleRecord};
use heatctl::app::ports::NullCycleLog;
use heatctl::config::ControllerConfig;
use heatctl::fsm::Mode;
use heatctl::fsm::context::PidResetReason;

use crate::mock_hw::{MemoryLog, MockRig, RecordingSink};

const PERIOD_MS: u32 = 371;

fn setup(config: ControllerConfig) -> (ControlLoopEngine, MockRig, RecordingSink) {
    let mut engine = ControlLoopEngine::new(config).unwrap();
    let rig = MockRig::new();
    let mut sink = RecordingSink::new();
    engine.start(&rig, &mut sink);
    (engine, rig, sink)
}

fn send(engine: &mut ControlLoopEngine, rig: &mut MockRig, sink: &mut RecordingSink, cmd: ControlCommand) {
    engine.handle_command(cmd, rig, &StaticProfiles::builtin(), sink);
}

fn cycle(engine: &mut ControlLoopEngine, rig: &mut MockRig, sink: &mut RecordingSink) {
    rig.advance(PERIOD_MS);
    engine.run_cycle(rig, sink, &mut NullCycleLog).unwrap();
}

/// Run one cycle with the clock landing exactly `at_ms` after `t0`.
fn cycle_at(
    engine: &mut ControlLoopEngine,
    rig: &mut MockRig,
    sink: &mut RecordingSink,
    t0: u32,
    at_ms: u32,
) {
    rig.now_ms = t0 + at_ms - PERIOD_MS;
    cycle(engine, rig, sink);
}

fn profile(name: &str) -> ControlCommand {
    ControlCommand::SelectProfile(heapless::String::try_from(name).unwrap())
}

// ── Session ───────────────────────────────────────────────────

#[test]
fn session_reaches_setpoint_once_and_expires() {
    let (mut engine, mut rig, mut sink) = setup(ControllerConfig::default());
    rig.steady_temperature = Ok(160);
    send(&mut engine, &mut rig, &mut sink, ControlCommand::RequestMode(Mode::Session));
    assert!(sink.contains(&AppEvent::PidReset(PidResetReason::ModeChange)));

    cycle(&mut engine, &mut rig, &mut sink);
    cycle(&mut engine, &mut rig, &mut sink);
    assert!(engine.snapshot().setpoint_reached);
    assert_eq!(sink.count(|e| *e == AppEvent::SetpointReached), 1);
    assert!(sink.contains(&AppEvent::PidReset(PidResetReason::SetpointReached)));

    rig.advance(7 * 60 * 1000);
    cycle(&mut engine, &mut rig, &mut sink);
    assert_eq!(engine.mode(), Mode::Off);
    assert!(sink.contains(&AppEvent::SessionExpired));
    assert!(!rig.heater_on);
}

#[test]
fn runaway_above_setpoint_resets_pid() {
    let (mut engine, mut rig, mut sink) = setup(ControllerConfig::default());
    rig.script_temperatures(&[160]);
    send(&mut engine, &mut rig, &mut sink, ControlCommand::RequestMode(Mode::Session));
    cycle(&mut engine, &mut rig, &mut sink);
    assert!(engine.snapshot().setpoint_reached);

    // 165 + 15 margin; 181 is past it.
    rig.steady_temperature = Ok(181);
    sink.clear();
    cycle(&mut engine, &mut rig, &mut sink);
    assert!(sink.contains(&AppEvent::PidReset(PidResetReason::Runaway)));
}

#[test]
fn extension_only_inside_warning_window() {
    let (mut engine, mut rig, mut sink) = setup(ControllerConfig::default());
    let t0 = rig.now_ms;
    send(&mut engine, &mut rig, &mut sink, ControlCommand::RequestMode(Mode::Session));

    // Early in the session the request is ignored.
    send(&mut engine, &mut rig, &mut sink, ControlCommand::ExtendSession);
    assert_eq!(engine.snapshot().session_remaining_ms, 420_000);

    // 55 s left: inside the warning window.
    cycle_at(&mut engine, &mut rig, &mut sink, t0, 365_000);
    let s = engine.snapshot();
    assert_eq!(s.session_remaining_ms, 55_000);
    assert!(s.session_near_expiry);
    assert_eq!(sink.count(|e| *e == AppEvent::SessionNearExpiry), 1);

    send(&mut engine, &mut rig, &mut sink, ControlCommand::ExtendSession);
    assert_eq!(engine.snapshot().session_remaining_ms, 115_000);
    assert!(!engine.snapshot().session_near_expiry);

    send(&mut engine, &mut rig, &mut sink, ControlCommand::ExtendSession);
    assert_eq!(engine.snapshot().session_remaining_ms, 115_000);
}

#[test]
fn short_session_starts_inside_warning_window() {
    let (mut engine, mut rig, mut sink) = setup(ControllerConfig::default());
    send(&mut engine, &mut rig, &mut sink, ControlCommand::StartShortSession);
    assert_eq!(engine.mode(), Mode::Session);
    assert_eq!(engine.snapshot().session_remaining_ms, 60_000);

    cycle(&mut engine, &mut rig, &mut sink);
    assert!(engine.snapshot().session_near_expiry);
    assert!(sink.contains(&AppEvent::SessionNearExpiry));

    // Already running: a second request does nothing.
    send(&mut engine, &mut rig, &mut sink, ControlCommand::StartShortSession);
    assert_eq!(engine.snapshot().session_remaining_ms, 60_000 - i64::from(PERIOD_MS));
}

// ── Autosession ───────────────────────────────────────────────

#[test]
fn autosession_refused_without_profile() {
    let (mut engine, mut rig, mut sink) = setup(ControllerConfig::default());
    send(&mut engine, &mut rig, &mut sink, ControlCommand::RequestMode(Mode::Autosession));
    assert_eq!(engine.mode(), Mode::Off);

    send(&mut engine, &mut rig, &mut sink, profile("no-such-profile"));
    send(&mut engine, &mut rig, &mut sink, ControlCommand::RequestMode(Mode::Autosession));
    assert_eq!(engine.mode(), Mode::Off);
}

#[test]
fn autosession_follows_profile_logs_and_finishes() {
    let mut config = ControllerConfig::default();
    config.autosession_logging = true;
    let (mut engine, mut rig, mut sink) = setup(config);
    let mut log = CsvCycleLog::new(Vec::new(), 20);
    let t0 = rig.now_ms;

    send(&mut engine, &mut rig, &mut sink, profile("ramp"));
    send(&mut engine, &mut rig, &mut sink, ControlCommand::RequestMode(Mode::Autosession));
    assert_eq!(engine.mode(), Mode::Autosession);
    assert_eq!(engine.snapshot().setpoint, 100.0);

    rig.now_ms = t0 + 10_000;
    engine.run_cycle(&mut rig, &mut sink, &mut log).unwrap();
    assert_eq!(engine.snapshot().setpoint, 125.0);
    assert_eq!(log.pending(), 1);

    rig.now_ms = t0 + 30_001;
    engine.run_cycle(&mut rig, &mut sink, &mut log).unwrap();
    assert_eq!(engine.mode(), Mode::Off);
    assert!(sink.contains(&AppEvent::ProfileFinished));
    assert_eq!(engine.snapshot().setpoint, 165.0, "user setpoint restored");

    // Leaving autosession flushed the partial batch.
    assert_eq!(log.pending(), 0);
    let text = String::from_utf8(log.into_inner()).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines[0], CycleRecord::CSV_HEADER);
    assert!(lines[1].starts_with("10.0,150.0,125,24.00,"), "{}", lines[1]);
    assert_eq!(lines.len(), 2);
}

#[test]
fn autosession_logging_off_records_nothing() {
    let (mut engine, mut rig, mut sink) = setup(ControllerConfig::default());
    let mut log = MemoryLog::default();
    send(&mut engine, &mut rig, &mut sink, profile("ramp"));
    send(&mut engine, &mut rig, &mut sink, ControlCommand::RequestMode(Mode::Autosession));
    rig.advance(PERIOD_MS);
    engine.run_cycle(&mut rig, &mut sink, &mut log).unwrap();
    assert!(log.records.is_empty());
    assert_eq!(log.flushes, 0);
}

#[test]
fn autosession_time_shift_moves_through_profile() {
    let (mut engine, mut rig, mut sink) = setup(ControllerConfig::default());
    send(&mut engine, &mut rig, &mut sink, profile("ramp"));
    send(&mut engine, &mut rig, &mut sink, ControlCommand::RequestMode(Mode::Autosession));

    // One 10 s step ahead lands halfway up the 100 -> 150 ramp.
    send(&mut engine, &mut rig, &mut sink, ControlCommand::ShiftAutosession(1));
    engine.run_cycle(&mut rig, &mut sink, &mut NullCycleLog).unwrap();
    assert_eq!(engine.snapshot().setpoint, 125.0);

    // Going back past the start holds the first waypoint.
    send(&mut engine, &mut rig, &mut sink, ControlCommand::ShiftAutosession(-2));
    engine.run_cycle(&mut rig, &mut sink, &mut NullCycleLog).unwrap();
    assert_eq!(engine.snapshot().setpoint, 100.0);
    assert_eq!(engine.mode(), Mode::Autosession);
}

#[test]
fn autosession_extreme_shifts_stay_inside_profile() {
    let (mut engine, mut rig, mut sink) = setup(ControllerConfig::default());
    send(&mut engine, &mut rig, &mut sink, profile("ramp"));
    send(&mut engine, &mut rig, &mut sink, ControlCommand::RequestMode(Mode::Autosession));

    for steps in [-1_000_000, i32::MIN] {
        send(&mut engine, &mut rig, &mut sink, ControlCommand::ShiftAutosession(steps));
        engine.run_cycle(&mut rig, &mut sink, &mut NullCycleLog).unwrap();
        assert_eq!(engine.mode(), Mode::Autosession);
        assert_eq!(engine.snapshot().setpoint, 100.0);
    }

    // Far past the end: the profile finishes on the next cycle.
    send(&mut engine, &mut rig, &mut sink, ControlCommand::ShiftAutosession(i32::MAX));
    assert_eq!(engine.mode(), Mode::Autosession);
    engine.run_cycle(&mut rig, &mut sink, &mut NullCycleLog).unwrap();
    assert_eq!(engine.mode(), Mode::Off);
    assert!(sink.contains(&AppEvent::ProfileFinished));
}

#[test]
fn autosession_log_time_follows_shifted_profile() {
    let mut config = ControllerConfig::default();
    config.autosession_logging = true;
    let (mut engine, mut rig, mut sink) = setup(config);
    let mut log = MemoryLog::default();
    send(&mut engine, &mut rig, &mut sink, profile("ramp"));
    send(&mut engine, &mut rig, &mut sink, ControlCommand::RequestMode(Mode::Autosession));

    send(&mut engine, &mut rig, &mut sink, ControlCommand::ShiftAutosession(1));
    engine.run_cycle(&mut rig, &mut sink, &mut log).unwrap();

    assert_eq!(log.records.len(), 1);
    assert_eq!(log.records[0].elapsed_ms, 10_000);
    assert_eq!(log.records[0].setpoint, 125.0);
}

#[test]
fn setpoint_change_during_autosession_is_kept_for_later() {
    let (mut engine, mut rig, mut sink) = setup(ControllerConfig::default());
    send(&mut engine, &mut rig, &mut sink, profile("ramp"));
    send(&mut engine, &mut rig, &mut sink, ControlCommand::RequestMode(Mode::Autosession));
    send(&mut engine, &mut rig, &mut sink, ControlCommand::SetSetpoint(180));
    assert_eq!(engine.snapshot().setpoint, 100.0, "profile owns the setpoint");

    send(&mut engine, &mut rig, &mut sink, ControlCommand::RequestMode(Mode::Manual));
    assert_eq!(engine.snapshot().setpoint, 180.0);
}

// ── Command channel ───────────────────────────────────────────

#[test]
fn queued_commands_reach_the_engine_in_order() {
    let (mut engine, mut rig, mut sink) = setup(ControllerConfig::default());

    assert!(commands::submit(ControlCommand::RequestMode(Mode::Manual)));
    assert!(commands::submit(ControlCommand::SetSetpoint(400)));
    let profiles = StaticProfiles::builtin();
    let handled = commands::drain(|cmd| engine.handle_command(cmd, &mut rig, &profiles, &mut sink));

    assert_eq!(handled, 2);
    assert_eq!(engine.mode(), Mode::Manual);
    assert_eq!(engine.snapshot().setpoint, 250.0, "clamped to max allowed");
}
