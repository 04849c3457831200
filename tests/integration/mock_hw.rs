//! Mock test rig for integration tests.
//!
//! One struct implements every hardware port.  Sensor values are
//! scripted (queued samples, then a steady default), heater calls are
//! recorded, and blocking delays advance the mock clock instead of
//! sleeping.

use std::collections::VecDeque;

use embedded_hal::delay::DelayNs;
use heatctl::app::events::{AppEvent, CycleRecord};
use heatctl::app::ports::{
    Clock, CycleLogSink, DieTemperatureSensor, EventSink, HeaterActuator, TemperatureSensor,
    VoltageSource,
};
use heatctl::error::SensorFault;

// ── Heater call record ────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum HeaterCall {
    On(f32),
    SetPower(f32),
    Off,
    MaxDuty(f32),
    AdvanceCoil,
}

// ── MockRig ───────────────────────────────────────────────────

pub struct MockRig {
    pub now_ms: u32,

    pub temperatures: VecDeque<Result<i32, SensorFault>>,
    pub steady_temperature: Result<i32, SensorFault>,
    pub volts: f32,
    pub die_temperatures: VecDeque<f32>,
    pub steady_die: f32,

    pub heater_on: bool,
    pub power: f32,
    pub max_duty: f32,

    pub calls: Vec<HeaterCall>,
    pub delays_ms: Vec<u32>,
    pub reads: u32,
}

#[allow(dead_code)]
impl MockRig {
    pub fn new() -> Self {
        Self {
            now_ms: 1_000,
            temperatures: VecDeque::new(),
            steady_temperature: Ok(150),
            volts: 24.0,
            die_temperatures: VecDeque::new(),
            steady_die: 35.0,
            heater_on: false,
            power: 0.0,
            max_duty: 100.0,
            calls: Vec::new(),
            delays_ms: Vec::new(),
            reads: 0,
        }
    }

    /// Queue thermocouple samples ahead of the steady value.
    pub fn script_temperatures(&mut self, samples: &[i32]) {
        self.temperatures.extend(samples.iter().map(|&t| Ok(t)));
    }

    pub fn script_fault(&mut self, fault: SensorFault) {
        self.temperatures.push_back(Err(fault));
    }

    pub fn script_die(&mut self, samples: &[f32]) {
        self.die_temperatures.extend(samples.iter().copied());
    }

    pub fn advance(&mut self, ms: u32) {
        self.now_ms = self.now_ms.wrapping_add(ms);
    }

    /// Index of the last `Off` call, if any.
    pub fn last_off(&self) -> Option<usize> {
        self.calls.iter().rposition(|c| *c == HeaterCall::Off)
    }
}

impl Default for MockRig {
    fn default() -> Self {
        Self::new()
    }
}

impl HeaterActuator for MockRig {
    fn on(&mut self, power: f32) {
        self.heater_on = true;
        self.power = power.min(self.max_duty);
        self.calls.push(HeaterCall::On(power));
    }

    fn set_power(&mut self, power: f32) {
        if self.heater_on {
            self.power = power.min(self.max_duty);
        }
        self.calls.push(HeaterCall::SetPower(power));
    }

    fn off(&mut self) {
        self.heater_on = false;
        self.power = 0.0;
        self.calls.push(HeaterCall::Off);
    }

    fn is_on(&self) -> bool {
        self.heater_on
    }

    fn power(&self) -> f32 {
        self.power
    }

    fn set_max_duty_cycle(&mut self, percent: f32) {
        self.max_duty = percent;
        self.power = self.power.min(percent);
        self.calls.push(HeaterCall::MaxDuty(percent));
    }

    fn advance_coil(&mut self) {
        self.calls.push(HeaterCall::AdvanceCoil);
    }
}

impl TemperatureSensor for MockRig {
    fn raw_read(&mut self) -> Result<i32, SensorFault> {
        self.reads += 1;
        self.temperatures
            .pop_front()
            .unwrap_or(self.steady_temperature)
    }
}

impl VoltageSource for MockRig {
    fn read_volts(&mut self, _previous: Option<f32>) -> f32 {
        self.volts
    }
}

impl DieTemperatureSensor for MockRig {
    fn read_die_celsius(&mut self) -> f32 {
        self.die_temperatures.pop_front().unwrap_or(self.steady_die)
    }
}

impl Clock for MockRig {
    fn now_ms(&self) -> u32 {
        self.now_ms
    }
}

impl DelayNs for MockRig {
    fn delay_ns(&mut self, ns: u32) {
        self.advance(ns / 1_000_000);
    }

    fn delay_ms(&mut self, ms: u32) {
        self.delays_ms.push(ms);
        self.advance(ms);
    }
}

// ── Event sink ────────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, event: &AppEvent) -> bool {
        self.events.contains(event)
    }

    pub fn count(&self, pred: impl Fn(&AppEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }

    pub fn cycles(&self) -> Vec<CycleRecord> {
        self.events
            .iter()
            .filter_map(|e| match e {
                AppEvent::Cycle(r) => Some(*r),
                _ => None,
            })
            .collect()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}

// ── Cycle log ─────────────────────────────────────────────────

#[derive(Default)]
pub struct MemoryLog {
    pub records: Vec<CycleRecord>,
    pub flushes: u32,
}

impl CycleLogSink for MemoryLog {
    fn record(&mut self, record: &CycleRecord) {
        self.records.push(*record);
    }

    fn flush(&mut self) {
        self.flushes += 1;
    }
}
