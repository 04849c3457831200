//! Hardware adapter: bridges the board's drivers to the port traits.
//!
//! Owns the heater power stage, thermocouple, supply monitor, die sensor,
//! clock and blocking delay, and exposes them together as one
//! [`ControllerHardware`](crate::app::ports::ControllerHardware) for the
//! control engine.  Each part is generic so the same adapter wraps the
//! ESP-IDF drivers on the board and fakes in host tests.

use embedded_hal::delay::DelayNs;

use crate::app::ports::{
    Clock, DieTemperatureSensor, HeaterActuator, TemperatureSensor, VoltageSource,
};
use crate::error::SensorFault;

pub struct HardwareAdapter<H, T, V, D, C, Dl> {
    heater: H,
    thermocouple: T,
    supply: V,
    die: D,
    clock: C,
    delay: Dl,
}

impl<H, T, V, D, C, Dl> HardwareAdapter<H, T, V, D, C, Dl>
where
    H: HeaterActuator,
    T: TemperatureSensor,
    V: VoltageSource,
    D: DieTemperatureSensor,
    C: Clock,
    Dl: DelayNs,
{
    pub fn new(heater: H, thermocouple: T, supply: V, die: D, clock: C, delay: Dl) -> Self {
        Self {
            heater,
            thermocouple,
            supply,
            die,
            clock,
            delay,
        }
    }

    pub fn heater(&self) -> &H {
        &self.heater
    }

    pub fn heater_mut(&mut self) -> &mut H {
        &mut self.heater
    }

    pub fn thermocouple_mut(&mut self) -> &mut T {
        &mut self.thermocouple
    }
}

// ── HeaterActuator ────────────────────────────────────────────

impl<H: HeaterActuator, T, V, D, C, Dl> HeaterActuator for HardwareAdapter<H, T, V, D, C, Dl> {
    fn on(&mut self, power: f32) {
        self.heater.on(power);
    }

    fn set_power(&mut self, power: f32) {
        self.heater.set_power(power);
    }

    fn off(&mut self) {
        self.heater.off();
    }

    fn is_on(&self) -> bool {
        self.heater.is_on()
    }

    fn power(&self) -> f32 {
        self.heater.power()
    }

    fn set_max_duty_cycle(&mut self, percent: f32) {
        self.heater.set_max_duty_cycle(percent);
    }

    fn advance_coil(&mut self) {
        self.heater.advance_coil();
    }
}

// ── Sensors ───────────────────────────────────────────────────

impl<H, T: TemperatureSensor, V, D, C, Dl> TemperatureSensor for HardwareAdapter<H, T, V, D, C, Dl> {
    fn raw_read(&mut self) -> Result<i32, SensorFault> {
        self.thermocouple.raw_read()
    }
}

impl<H, T, V: VoltageSource, D, C, Dl> VoltageSource for HardwareAdapter<H, T, V, D, C, Dl> {
    fn read_volts(&mut self, previous: Option<f32>) -> f32 {
        self.supply.read_volts(previous)
    }
}

impl<H, T, V, D: DieTemperatureSensor, C, Dl> DieTemperatureSensor
    for HardwareAdapter<H, T, V, D, C, Dl>
{
    fn read_die_celsius(&mut self) -> f32 {
        self.die.read_die_celsius()
    }
}

// ── Time ──────────────────────────────────────────────────────

impl<H, T, V, D, C: Clock, Dl> Clock for HardwareAdapter<H, T, V, D, C, Dl> {
    fn now_ms(&self) -> u32 {
        self.clock.now_ms()
    }
}

impl<H, T, V, D, C, Dl: DelayNs> DelayNs for HardwareAdapter<H, T, V, D, C, Dl> {
    fn delay_ns(&mut self, ns: u32) {
        self.delay.delay_ns(ns);
    }

    fn delay_ms(&mut self, ms: u32) {
        self.delay.delay_ms(ms);
    }
}
