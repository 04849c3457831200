//! Safety interlock.
//!
//! Evaluated by the control engine every cycle.  The interlock itself
//! only *judges*; the engine applies the verdict (heater off, mode to Off,
//! latch the error) so that every shutdown path goes through one place.
//!
//! ## Checks
//!
//! 1. **Controller die** ([`SafetyInterlock::die_overheated`]): evaluated by
//!    the housekeeping cycle, which stops the control timer and blocks
//!    until the die cools.
//! 2. **Supply voltage** ([`SafetyInterlock::check_supply`]): per power
//!    source kind.  A trip forces Off; a pass clears only supply errors.
//! 3. **Heater overheat** ([`SafetyInterlock::update_overheat`]): a
//!    hysteresis flip-flop so the heater does not chatter at the limit.
//! 4. **Duty derating** ([`max_duty_cycle_percent`]): caps the duty cycle
//!    so the wattage budget holds at the live supply voltage.

use log::{error, info};

use crate::config::{PowerSource, SafetyLimits};
use crate::error::ErrorCode;

/// Result of the supply-voltage check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupplyVerdict {
    Safe,
    Trip(ErrorCode),
}

/// Safety interlock.
pub struct SafetyInterlock {
    limits: SafetyLimits,
    /// Overheat flip-flop.
    too_hot: bool,
    /// Last supply verdict, for edge-triggered logging.
    supply_tripped: bool,
}

impl SafetyInterlock {
    pub fn new(limits: SafetyLimits) -> Self {
        Self {
            limits,
            too_hot: false,
            supply_tripped: false,
        }
    }

    pub fn limits(&self) -> &SafetyLimits {
        &self.limits
    }

    /// Judge the measured supply voltage against the configured source.
    pub fn check_supply(&mut self, volts: f32) -> SupplyVerdict {
        let l = &self.limits;
        let verdict = match l.power_type {
            PowerSource::Lipo => {
                let per_cell = volts / f32::from(l.lipo_count.max(1));
                if per_cell < l.lipo_safe_volts {
                    SupplyVerdict::Trip(ErrorCode::BatteryLevelTooLow)
                } else {
                    SupplyVerdict::Safe
                }
            }
            PowerSource::Lead => {
                if volts < l.lead_safe_volts {
                    SupplyVerdict::Trip(ErrorCode::BatteryLevelTooLow)
                } else {
                    SupplyVerdict::Safe
                }
            }
            PowerSource::Mains => {
                if volts > l.mains_safe_volts {
                    SupplyVerdict::Trip(ErrorCode::MainsVoltageTooHigh)
                } else {
                    SupplyVerdict::Safe
                }
            }
            PowerSource::Unknown => SupplyVerdict::Trip(ErrorCode::UnknownPowerType),
        };

        match verdict {
            SupplyVerdict::Trip(code) if !self.supply_tripped => {
                error!("SAFETY TRIP: {code} ({volts:.2}V)");
                self.supply_tripped = true;
            }
            SupplyVerdict::Safe if self.supply_tripped => {
                info!("SAFETY CLEARED: supply back in range ({volts:.2}V)");
                self.supply_tripped = false;
            }
            _ => {}
        }
        verdict
    }

    /// Feed the heater temperature through the overheat flip-flop.
    /// Returns `true` while the heater must stay off.
    ///
    /// Sets strictly above `overheat_on_c`, clears strictly below
    /// `overheat_off_c`, and holds its state anywhere in between.
    pub fn update_overheat(&mut self, temperature: f32) -> bool {
        if temperature > self.limits.overheat_on_c {
            if !self.too_hot {
                error!("SAFETY TRIP: heater too hot ({temperature:.0}\u{00b0}C)");
            }
            self.too_hot = true;
        } else if temperature < self.limits.overheat_off_c {
            if self.too_hot {
                info!("SAFETY CLEARED: heater cooled to {temperature:.0}\u{00b0}C");
            }
            self.too_hot = false;
        }
        self.too_hot
    }

    pub fn is_too_hot(&self) -> bool {
        self.too_hot
    }

    /// True if the controller die is above its limit.
    pub fn die_overheated(&self, die_temperature: f32) -> bool {
        die_temperature > self.limits.die_temperature_limit_c
    }

    /// Duty cap at `volts` for this element and wattage budget.
    pub fn duty_cap(&self, max_watts: f32, volts: f32) -> f32 {
        max_duty_cycle_percent(max_watts, volts, self.limits.heater_resistance)
    }
}

// ── Power arithmetic ──────────────────────────────────────────

/// Full-on element power `V²/R` in watts.
fn full_power_watts(volts: f32, resistance: f32) -> f32 {
    volts * volts / resistance
}

/// Largest duty cycle that keeps the element within `max_watts`.
///
/// `min(100, max_watts / (V²/R) * 100)`; 100 when no voltage is measured.
pub fn max_duty_cycle_percent(max_watts: f32, volts: f32, resistance: f32) -> f32 {
    if volts <= 0.0 {
        return 100.0;
    }
    (max_watts / full_power_watts(volts, resistance) * 100.0).clamp(0.0, 100.0)
}

/// Duty cycle that delivers `watts` at `volts`; 0 when no voltage.
pub fn watts_to_duty(watts: f32, volts: f32, resistance: f32) -> f32 {
    if volts <= 0.0 {
        return 0.0;
    }
    watts * resistance / (volts * volts) * 100.0
}

/// Power actually delivered at `power_percent` duty.
pub fn heater_watts(volts: f32, resistance: f32, power_percent: f32) -> f32 {
    full_power_watts(volts, resistance) * power_percent / 100.0
}
