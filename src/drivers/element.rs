//! Resistive element heater on a PWM-driven MOSFET.
//!
//! Continuously variable power: the requested percentage maps straight
//! onto the PWM duty cycle, capped by the derating limit the control
//! engine pushes every cycle.
//!
//! Generic over [`embedded_hal::pwm::SetDutyCycle`]; on the board this is
//! an `esp_idf_hal::ledc::LedcDriver`, in tests any recording fake.

use embedded_hal::pwm::SetDutyCycle;
use log::error;

use crate::app::ports::HeaterActuator;

pub struct ElementHeater<P: SetDutyCycle> {
    pwm: P,
    on: bool,
    power: f32,
    max_percent: f32,
}

impl<P: SetDutyCycle> ElementHeater<P> {
    /// Wrap `pwm` and force the output low.
    pub fn new(pwm: P) -> Self {
        let mut heater = Self {
            pwm,
            on: false,
            power: 0.0,
            max_percent: 100.0,
        };
        heater.write_duty(0.0);
        heater
    }

    pub fn max_duty_cycle(&self) -> f32 {
        self.max_percent
    }

    pub fn pwm(&self) -> &P {
        &self.pwm
    }

    fn write_duty(&mut self, percent: f32) {
        let full = f32::from(self.pwm.max_duty_cycle());
        let duty = (percent.clamp(0.0, 100.0) / 100.0 * full) as u16;
        if self.pwm.set_duty_cycle(duty).is_err() {
            error!("element heater: PWM write failed");
        }
    }

    fn apply(&mut self, power: f32) {
        self.power = power.clamp(0.0, 100.0).min(self.max_percent);
        self.write_duty(self.power);
    }
}

impl<P: SetDutyCycle> HeaterActuator for ElementHeater<P> {
    fn on(&mut self, power: f32) {
        self.on = true;
        self.apply(power);
    }

    fn set_power(&mut self, power: f32) {
        if self.on {
            self.apply(power);
        }
    }

    fn off(&mut self) {
        self.on = false;
        self.power = 0.0;
        if self.pwm.set_duty_cycle_fully_off().is_err() {
            error!("element heater: PWM off failed");
        }
    }

    fn is_on(&self) -> bool {
        self.on
    }

    fn power(&self) -> f32 {
        self.power
    }

    fn set_max_duty_cycle(&mut self, percent: f32) {
        self.max_percent = percent.clamp(0.0, 100.0);
        if self.on && self.power > self.max_percent {
            self.apply(self.power);
        }
    }
}
