//! PID regulator for heater power.
//!
//! Proportional on error, derivative on measurement (no kick when the
//! setpoint moves), integral clamped to the output range.  Output is
//! always within `[output_min, output_max]`, which defaults to `[0, 100]`
//! percent heater power.

use crate::config::PidTunings;

/// The three terms of the last computed output.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PidComponents {
    pub p: f32,
    pub i: f32,
    pub d: f32,
}

/// PID regulator
pub struct PidRegulator {
    kp: f32,
    ki: f32,
    kd: f32,
    setpoint: f32,
    integral: f32,
    last_input: Option<f32>,
    components: PidComponents,
    output_min: f32,
    output_max: f32,
}

impl PidRegulator {
    pub fn new(tunings: PidTunings, setpoint: f32) -> Self {
        Self {
            kp: tunings.kp,
            ki: tunings.ki,
            kd: tunings.kd,
            setpoint,
            integral: 0.0,
            last_input: None,
            components: PidComponents::default(),
            output_min: 0.0,
            output_max: 100.0,
        }
    }

    /// Set output limits
    pub fn set_limits(&mut self, min: f32, max: f32) {
        self.output_min = min;
        self.output_max = max;
        self.integral = self.integral.clamp(min, max);
    }

    /// Change gains without touching accumulated state.
    pub fn set_tunings(&mut self, tunings: PidTunings) {
        self.kp = tunings.kp;
        self.ki = tunings.ki;
        self.kd = tunings.kd;
    }

    pub fn tunings(&self) -> PidTunings {
        PidTunings {
            kp: self.kp,
            ki: self.ki,
            kd: self.kd,
        }
    }

    /// Update setpoint
    pub fn set_setpoint(&mut self, setpoint: f32) {
        self.setpoint = setpoint;
    }

    pub fn setpoint(&self) -> f32 {
        self.setpoint
    }

    /// Compute output for `measurement`, `dt` seconds after the previous call.
    pub fn compute(&mut self, measurement: f32, dt: f32) -> f32 {
        let error = self.setpoint - measurement;

        // Proportional
        let p = self.kp * error;

        // Integral, clamped so it can never wind past the output range
        if dt > 0.0 {
            self.integral += self.ki * error * dt;
        }
        self.integral = self.integral.clamp(self.output_min, self.output_max);

        // Derivative on measurement
        let d = match self.last_input {
            Some(last) if dt > 0.0 => -self.kd * (measurement - last) / dt,
            _ => 0.0,
        };

        self.last_input = Some(measurement);
        self.components = PidComponents {
            p,
            i: self.integral,
            d,
        };

        (p + self.integral + d).clamp(self.output_min, self.output_max)
    }

    /// Terms of the most recent [`compute`](Self::compute).
    pub fn components(&self) -> PidComponents {
        self.components
    }

    /// Reset controller state.  Tunings and setpoint are kept.
    pub fn reset(&mut self) {
        self.integral = 0.0;
        self.last_input = None;
        self.components = PidComponents::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tunings(kp: f32, ki: f32, kd: f32) -> PidTunings {
        PidTunings { kp, ki, kd }
    }

    #[test]
    fn output_is_clamped() {
        let mut pid = PidRegulator::new(tunings(10.0, 0.0, 0.0), 200.0);
        assert_eq!(pid.compute(20.0, 0.371), 100.0);
        assert_eq!(pid.compute(400.0, 0.371), 0.0);
    }

    #[test]
    fn proportional_only() {
        let mut pid = PidRegulator::new(tunings(2.0, 0.0, 0.0), 100.0);
        let out = pid.compute(90.0, 1.0);
        assert!((out - 20.0).abs() < 1e-4);
        assert!((pid.components().p - 20.0).abs() < 1e-4);
    }

    #[test]
    fn integral_accumulates_and_saturates() {
        let mut pid = PidRegulator::new(tunings(0.0, 1.0, 0.0), 100.0);
        pid.compute(90.0, 1.0);
        assert!((pid.components().i - 10.0).abs() < 1e-4);
        for _ in 0..50 {
            pid.compute(0.0, 1.0);
        }
        assert_eq!(pid.components().i, 100.0);
    }

    #[test]
    fn derivative_opposes_rising_measurement() {
        let mut pid = PidRegulator::new(tunings(0.0, 0.0, 1.0), 100.0);
        pid.set_limits(-100.0, 100.0);
        pid.compute(50.0, 1.0);
        assert_eq!(pid.components().d, 0.0);
        pid.compute(55.0, 1.0);
        assert!((pid.components().d + 5.0).abs() < 1e-4);
    }

    #[test]
    fn setpoint_change_does_not_kick_derivative() {
        let mut pid = PidRegulator::new(tunings(0.0, 0.0, 1.0), 100.0);
        pid.compute(50.0, 1.0);
        pid.set_setpoint(200.0);
        pid.compute(50.0, 1.0);
        assert_eq!(pid.components().d, 0.0);
    }

    #[test]
    fn reset_keeps_tunings_and_setpoint() {
        let mut pid = PidRegulator::new(tunings(1.0, 0.5, 0.1), 150.0);
        pid.compute(20.0, 1.0);
        pid.compute(30.0, 1.0);
        pid.reset();
        assert_eq!(pid.components(), PidComponents::default());
        assert_eq!(pid.setpoint(), 150.0);
        assert_eq!(pid.tunings(), tunings(1.0, 0.5, 0.1));
        // First compute after reset has no derivative history.
        pid.compute(40.0, 1.0);
        assert_eq!(pid.components().d, 0.0);
    }

    #[test]
    fn zero_dt_skips_integral_and_derivative() {
        let mut pid = PidRegulator::new(tunings(1.0, 1.0, 1.0), 100.0);
        pid.compute(90.0, 0.0);
        pid.compute(95.0, 0.0);
        assert_eq!(pid.components().i, 0.0);
        assert_eq!(pid.components().d, 0.0);
    }
}
