//! Supply rail voltage through a 910 kΩ / 102 kΩ divider.
//!
//! The reading feeds the duty-cycle derating, so an under-read is worse
//! than an over-read: a low value lets the heater run at a higher duty
//! than the wattage budget allows.  Two defences follow from that:
//!
//! - a handful of ADC codes the converter is known to return spuriously
//!   are ignored and the previous reading is reused;
//! - a drop of more than 1 V versus the previous reading is re-sampled
//!   after a short pause, and if it persists the reading only steps down
//!   by 0.3 V per cycle.
//!
//! A fixed offset is subtracted per range to compensate the divider's
//! non-linearity at the low end.
//!
//! ## Dual-target design
//!
//! [`BoardAdc`] reads ADC1 through [`hw_init::adc1_read`], which on host
//! builds returns the value injected with `hw_init::sim_set_adc1`.

use embedded_hal::delay::DelayNs;
use log::{debug, warn};

use crate::app::ports::VoltageSource;
use crate::drivers::hw_init;
use crate::pins;

/// 16-bit codes the converter is known to glitch to.
const GLITCH_CODES: [u16; 4] = [512, 1536, 2560, 3584];

const ADC_FULL_SCALE: f32 = 65_535.0;
/// Drop versus the previous reading that triggers a re-sample (V).
const DROP_RETRY_VOLTS: f32 = 1.0;
/// Step applied when a drop survives the re-sample (V).
const DROP_STEP_VOLTS: f32 = 0.3;
const RETRY_PAUSE_MS: u32 = 150;

/// Source of raw 16-bit full-scale ADC codes.
pub trait AdcSampler {
    fn sample(&mut self) -> Option<u16>;
}

/// ADC1 on the supply sense channel, 12-bit conversions widened to 16-bit.
pub struct BoardAdc {
    channel: u32,
}

impl BoardAdc {
    pub fn new() -> Self {
        Self {
            channel: pins::VSENSE_ADC_CHANNEL,
        }
    }
}

impl Default for BoardAdc {
    fn default() -> Self {
        Self::new()
    }
}

impl AdcSampler for BoardAdc {
    fn sample(&mut self) -> Option<u16> {
        hw_init::adc1_read(self.channel).map(|raw| raw << 4)
    }
}

/// Divider input voltage for a 16-bit ADC code.
pub fn divider_volts(code: u16) -> f32 {
    let v_adc = f32::from(code) * (pins::VSENSE_VREF / ADC_FULL_SCALE);
    v_adc * (pins::VSENSE_R_TOP + pins::VSENSE_R_BOTTOM) / pins::VSENSE_R_BOTTOM
}

/// Range-dependent offset subtracted from the divider voltage.
pub fn correction(volts: f32) -> f32 {
    if volts < 4.0 {
        0.22
    } else if volts < 8.0 {
        0.18
    } else {
        0.14
    }
}

fn round2(v: f32) -> f32 {
    (v * 100.0).round() / 100.0
}

pub struct SupplyVoltageMonitor<S: AdcSampler, D: DelayNs> {
    sampler: S,
    delay: D,
}

impl<S: AdcSampler, D: DelayNs> SupplyVoltageMonitor<S, D> {
    pub fn new(sampler: S, delay: D) -> Self {
        Self { sampler, delay }
    }

    pub fn sampler_mut(&mut self) -> &mut S {
        &mut self.sampler
    }
}

impl<S: AdcSampler, D: DelayNs> VoltageSource for SupplyVoltageMonitor<S, D> {
    fn read_volts(&mut self, previous: Option<f32>) -> f32 {
        let Some(code) = self.sampler.sample() else {
            warn!("supply: ADC read failed");
            return previous.unwrap_or(0.0);
        };

        if GLITCH_CODES.contains(&code) {
            if let Some(prev) = previous {
                debug!("supply: glitch code {} ignored", code);
                return prev;
            }
        }

        let mut volts = divider_volts(code);
        let corr = correction(volts);
        let prev = previous.unwrap_or(volts);

        if prev - (volts - corr) > DROP_RETRY_VOLTS {
            self.delay.delay_ms(RETRY_PAUSE_MS);
            if let Some(code) = self.sampler.sample() {
                volts = divider_volts(code);
            }
            if prev - (volts - corr) > DROP_RETRY_VOLTS {
                debug!("supply: drop persisted, stepping down from {:.2} V", prev);
                volts = prev - DROP_STEP_VOLTS;
            }
        }

        round2(volts - corr)
    }
}
