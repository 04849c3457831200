//! Whole-cycle tests for the control engine: sensing, filtering,
//! derating, interlocks and the timer entry points.

use heatctl::app::ControlLoopEngine;
use heatctl::app::commands::ControlCommand;
use heatctl::app::events::AppEvent;
use heatctl::app::ports::NullCycleLog;
use heatctl::adapters::StaticProfiles;
use heatctl::config::{ControlKind, ControllerConfig};
use heatctl::drivers::hw_timer::SimTimerBackend;
use heatctl::error::{ControlError, ErrorCode, SensorFault};
use heatctl::events::TimerEvent;
use heatctl::fsm::Mode;
use heatctl::scheduler::PeriodicTimer;

use crate::mock_hw::{HeaterCall, MockRig, RecordingSink};

const PERIOD_MS: u32 = 371;

fn setup(config: ControllerConfig) -> (ControlLoopEngine, MockRig, RecordingSink) {
    let mut engine = ControlLoopEngine::new(config).unwrap();
    let rig = MockRig::new();
    let mut sink = RecordingSink::new();
    engine.start(&rig, &mut sink);
    (engine, rig, sink)
}

fn request(engine: &mut ControlLoopEngine, rig: &mut MockRig, sink: &mut RecordingSink, mode: Mode) {
    engine.handle_command(
        ControlCommand::RequestMode(mode),
        rig,
        &StaticProfiles::builtin(),
        sink,
    );
}

fn cycle(engine: &mut ControlLoopEngine, rig: &mut MockRig, sink: &mut RecordingSink) {
    rig.advance(PERIOD_MS);
    engine
        .run_cycle(rig, sink, &mut NullCycleLog)
        .expect("cycle should succeed");
}

fn control_timer() -> PeriodicTimer<SimTimerBackend> {
    let timer = PeriodicTimer::new("control", PERIOD_MS, SimTimerBackend::new(TimerEvent::ControlTick));
    timer.start().unwrap();
    timer
}

// ── Supply interlock ──────────────────────────────────────────

#[test]
fn mains_overvoltage_latches_and_forces_off_then_self_clears() {
    let (mut engine, mut rig, mut sink) = setup(ControllerConfig::default());
    request(&mut engine, &mut rig, &mut sink, Mode::Manual);
    assert_eq!(engine.mode(), Mode::Manual);

    rig.volts = 29.0;
    cycle(&mut engine, &mut rig, &mut sink);

    assert_eq!(engine.mode(), Mode::Off);
    assert_eq!(engine.errors().code(), Some(ErrorCode::MainsVoltageTooHigh));
    assert!(!rig.heater_on);
    assert!(sink.contains(&AppEvent::FaultLatched(ErrorCode::MainsVoltageTooHigh)));
    assert!(sink.contains(&AppEvent::ModeChanged {
        from: Mode::Manual,
        to: Mode::Off
    }));

    // Back in range: the latch clears itself, the mode does not come back.
    rig.volts = 27.0;
    cycle(&mut engine, &mut rig, &mut sink);

    assert_eq!(engine.errors().code(), None);
    assert_eq!(engine.mode(), Mode::Off);
    assert!(sink.contains(&AppEvent::FaultCleared(ErrorCode::MainsVoltageTooHigh)));
    assert!(!rig.heater_on);
}

#[test]
fn supply_check_runs_while_off() {
    let (mut engine, mut rig, mut sink) = setup(ControllerConfig::default());
    rig.volts = 30.0;
    cycle(&mut engine, &mut rig, &mut sink);
    assert_eq!(engine.errors().code(), Some(ErrorCode::MainsVoltageTooHigh));
}

// ── Thermocouple filter ───────────────────────────────────────

#[test]
fn heater_on_drops_are_held_then_safely_reread() {
    let (mut engine, mut rig, mut sink) = setup(ControllerConfig::default());
    request(&mut engine, &mut rig, &mut sink, Mode::Manual);

    // 150 establishes the safe value; four suspicious 20° drops follow,
    // then the sample taken during the safe re-read.
    rig.script_temperatures(&[150, 130, 130, 130, 130, 130]);

    cycle(&mut engine, &mut rig, &mut sink);
    assert!(rig.heater_on, "PID should heat below setpoint");
    assert_eq!(engine.snapshot().measured, 150.0);

    for _ in 0..3 {
        cycle(&mut engine, &mut rig, &mut sink);
        assert_eq!(engine.snapshot().measured, 150.0);
    }
    assert!(rig.delays_ms.is_empty());

    cycle(&mut engine, &mut rig, &mut sink);
    assert_eq!(engine.snapshot().measured, 130.0);
    assert_eq!(rig.delays_ms, vec![301]);
    assert_eq!(rig.reads, 6);
}

#[test]
fn fatal_sensor_fault_stops_control_timer() {
    let (mut engine, mut rig, mut sink) = setup(ControllerConfig::default());
    let timer = control_timer();
    request(&mut engine, &mut rig, &mut sink, Mode::Manual);

    rig.script_fault(SensorFault::ReadError);
    rig.advance(PERIOD_MS);
    let result = engine.on_control_tick(&mut rig, &timer, &mut sink, &mut NullCycleLog);

    assert_eq!(result, Err(ControlError::Sensor(SensorFault::ReadError)));
    assert!(!timer.is_running());
    assert!(!timer.backend().is_armed());
    assert_eq!(engine.mode(), Mode::Off);
    assert_eq!(engine.errors().code(), Some(ErrorCode::ThermocoupleReadError));
    assert!(!rig.heater_on);
}

#[test]
fn transient_sensor_fault_skips_one_cycle() {
    let (mut engine, mut rig, mut sink) = setup(ControllerConfig::default());
    let timer = control_timer();
    request(&mut engine, &mut rig, &mut sink, Mode::Manual);

    rig.script_fault(SensorFault::AboveLimit);
    rig.advance(PERIOD_MS);
    let result = engine.on_control_tick(&mut rig, &timer, &mut sink, &mut NullCycleLog);

    assert_eq!(result, Ok(()));
    assert!(timer.is_running());
    assert_eq!(engine.mode(), Mode::Manual);
    assert!(engine.errors().code().is_none());
    assert!(sink.contains(&AppEvent::SensorPaused(SensorFault::AboveLimit)));
    assert!(sink.cycles().is_empty());

    // The next good sample resumes heating.
    rig.advance(PERIOD_MS);
    engine
        .on_control_tick(&mut rig, &timer, &mut sink, &mut NullCycleLog)
        .unwrap();
    assert!(rig.heater_on);
    assert_eq!(sink.cycles().len(), 1);
}

#[test]
fn probe_without_thermocouple_falls_back_to_duty_cycle() {
    let (mut engine, mut rig, _sink) = setup(ControllerConfig::default());
    rig.script_fault(SensorFault::InvalidReading);
    assert_eq!(
        engine.probe_sensor(&mut rig),
        Err(SensorFault::InvalidReading)
    );
    assert_eq!(engine.control_kind(), ControlKind::DutyCycle);
}

// ── Overheat hysteresis ───────────────────────────────────────

#[test]
fn overheat_holds_heater_off_until_below_off_threshold() {
    let mut config = ControllerConfig::default();
    config.control = ControlKind::DutyCycle;
    config.set_duty_cycle = 50.0;
    let (mut engine, mut rig, mut sink) = setup(config);
    request(&mut engine, &mut rig, &mut sink, Mode::Manual);

    rig.script_temperatures(&[255, 245, 239]);

    cycle(&mut engine, &mut rig, &mut sink);
    assert!(!rig.heater_on);
    assert!(engine.snapshot().too_hot);
    assert_eq!(engine.errors().code(), Some(ErrorCode::HeaterTooHot));
    assert_eq!(engine.mode(), Mode::Manual, "overheat pauses, it does not end the mode");

    cycle(&mut engine, &mut rig, &mut sink);
    assert!(!rig.heater_on, "inside the hysteresis band the trip holds");
    assert!(engine.snapshot().too_hot);

    cycle(&mut engine, &mut rig, &mut sink);
    assert!(rig.heater_on);
    assert!(!engine.snapshot().too_hot);
    assert_eq!(engine.errors().code(), None);
    assert!(sink.contains(&AppEvent::FaultCleared(ErrorCode::HeaterTooHot)));
}

// ── Power computation ─────────────────────────────────────────

#[test]
fn duty_cap_follows_voltage_and_max_watts() {
    let mut config = ControllerConfig::default();
    config.control = ControlKind::DutyCycle;
    config.set_duty_cycle = 100.0;
    let (mut engine, mut rig, mut sink) = setup(config);
    request(&mut engine, &mut rig, &mut sink, Mode::Manual);

    // 24 V across 0.4 Ω is 1440 W full on; 75 W budget caps at ~5.2 %.
    cycle(&mut engine, &mut rig, &mut sink);
    let cap = engine.snapshot().max_duty_cycle;
    assert!((cap - 75.0 / 1440.0 * 100.0).abs() < 1e-3);
    assert!(rig.calls.contains(&HeaterCall::MaxDuty(cap)));
    assert!((rig.power - cap).abs() < 1e-3);

    engine.handle_command(
        ControlCommand::SetMaxWatts(150.0),
        &mut rig,
        &StaticProfiles::builtin(),
        &mut sink,
    );
    cycle(&mut engine, &mut rig, &mut sink);
    assert!((engine.snapshot().max_duty_cycle - 2.0 * cap).abs() < 1e-3);
}

#[test]
fn watts_control_converts_through_live_voltage() {
    let mut config = ControllerConfig::default();
    config.control = ControlKind::Watts;
    config.set_watts = 30.0;
    let (mut engine, mut rig, mut sink) = setup(config);
    request(&mut engine, &mut rig, &mut sink, Mode::Manual);

    cycle(&mut engine, &mut rig, &mut sink);
    let s = engine.snapshot();
    assert!(s.heater_on);
    assert!((s.power - 30.0 / 1440.0 * 100.0).abs() < 1e-3);
    assert!((29..=30).contains(&s.watts), "watts = {}", s.watts);
}

#[test]
fn off_mode_never_heats() {
    let mut config = ControllerConfig::default();
    config.control = ControlKind::DutyCycle;
    config.set_duty_cycle = 80.0;
    let (mut engine, mut rig, mut sink) = setup(config);

    for _ in 0..5 {
        cycle(&mut engine, &mut rig, &mut sink);
    }
    assert!(!rig.heater_on);
    assert!(!rig.calls.iter().any(|c| matches!(c, HeaterCall::On(_))));
    assert_eq!(sink.cycles().len(), 5);
    assert_eq!(engine.history().len(), 5);
}

// ── Die overheat ──────────────────────────────────────────────

#[test]
fn die_overheat_pauses_and_restarts_control_timer() {
    let (mut engine, mut rig, mut sink) = setup(ControllerConfig::default());
    let timer = control_timer();
    request(&mut engine, &mut rig, &mut sink, Mode::Manual);
    cycle(&mut engine, &mut rig, &mut sink);
    assert!(rig.heater_on);

    rig.script_die(&[65.0, 63.0, 55.0]);
    let mut feeds = 0;
    engine
        .on_housekeeping_tick(&mut rig, &timer, &mut sink, &mut || feeds += 1)
        .unwrap();

    assert_eq!(feeds, 2);
    assert_eq!(rig.delays_ms, vec![250, 250]);
    assert!(!rig.heater_on);
    assert!(timer.is_running());
    assert_eq!(timer.backend().arm_count(), 2);
    assert!(sink.contains(&AppEvent::DieCooling(65.0)));
    assert!(sink.contains(&AppEvent::FaultLatched(ErrorCode::ControllerTooHot)));
    assert!(sink.contains(&AppEvent::FaultCleared(ErrorCode::ControllerTooHot)));
    assert!(engine.errors().code().is_none());
}

#[test]
fn die_wait_leaves_a_stopped_timer_stopped() {
    let (mut engine, mut rig, mut sink) = setup(ControllerConfig::default());
    let timer = PeriodicTimer::new("control", PERIOD_MS, SimTimerBackend::new(TimerEvent::ControlTick));

    rig.script_die(&[70.0, 50.0]);
    engine
        .on_housekeeping_tick(&mut rig, &timer, &mut sink, &mut || {})
        .unwrap();
    assert!(!timer.is_running());
    assert_eq!(timer.backend().arm_count(), 0);
}

#[test]
fn cool_die_is_a_no_op() {
    let (mut engine, mut rig, mut sink) = setup(ControllerConfig::default());
    let timer = control_timer();
    engine
        .on_housekeeping_tick(&mut rig, &timer, &mut sink, &mut || {})
        .unwrap();
    assert!(rig.delays_ms.is_empty());
    assert!(sink.events.iter().all(|e| !matches!(e, AppEvent::DieCooling(_))));
}
