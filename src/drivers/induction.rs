//! Induction heater with several work coils.
//!
//! Only one coil is energised at a time.  A periodic coil timer
//! (`coil_switch_period_ms`) calls [`advance_coil`](HeaterActuator::advance_coil),
//! which hands the load to the next coil so no single driver stage
//! carries it continuously.  Power is on/off only; the requested
//! percentage is kept for telemetry.

use embedded_hal::digital::OutputPin;
use log::{debug, error};

use crate::app::ports::HeaterActuator;

pub struct InductionHeater<C: OutputPin, const N: usize> {
    coils: [C; N],
    /// Index of the coil energised last.
    active: usize,
    on: bool,
    power: f32,
    max_percent: f32,
}

impl<C: OutputPin, const N: usize> InductionHeater<C, N> {
    /// Take ownership of the coil outputs and drive them all low.
    pub fn new(coils: [C; N]) -> Self {
        let mut heater = Self {
            coils,
            active: N.saturating_sub(1),
            on: false,
            power: 0.0,
            max_percent: 100.0,
        };
        heater.all_off();
        heater
    }

    /// Coil currently energised, if any.
    pub fn active_coil(&self) -> Option<usize> {
        self.on.then_some(self.active)
    }

    pub fn coil(&self, index: usize) -> Option<&C> {
        self.coils.get(index)
    }

    fn all_off(&mut self) {
        for (i, coil) in self.coils.iter_mut().enumerate() {
            if coil.set_low().is_err() {
                error!("induction heater: coil {i} off failed");
            }
        }
    }

    fn switch_to_next(&mut self) {
        if N == 0 {
            return;
        }
        self.all_off();
        self.active = (self.active + 1) % N;
        if self.coils[self.active].set_high().is_err() {
            error!("induction heater: coil {} on failed", self.active);
        }
        debug!("induction heater: coil {} energised", self.active);
    }
}

impl<C: OutputPin, const N: usize> HeaterActuator for InductionHeater<C, N> {
    fn on(&mut self, power: f32) {
        self.power = power.clamp(0.0, self.max_percent);
        if !self.on {
            self.on = true;
            self.switch_to_next();
        }
    }

    fn set_power(&mut self, power: f32) {
        if self.on {
            self.power = power.clamp(0.0, self.max_percent);
        }
    }

    fn off(&mut self) {
        self.on = false;
        self.power = 0.0;
        self.all_off();
    }

    fn is_on(&self) -> bool {
        self.on
    }

    fn power(&self) -> f32 {
        self.power
    }

    fn set_max_duty_cycle(&mut self, percent: f32) {
        self.max_percent = percent.clamp(0.0, 100.0);
        self.power = self.power.min(self.max_percent);
    }

    fn advance_coil(&mut self) {
        if self.on {
            self.switch_to_next();
        }
    }
}
