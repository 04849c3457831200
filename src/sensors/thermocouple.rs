//! Thermocouple sample classification.
//!
//! Every thermocouple driver funnels its converted reading through
//! [`classify`], so the fault taxonomy is decided in one place:
//!
//! | Reading            | Result                 | Fatal |
//! |--------------------|------------------------|-------|
//! | NaN / not a number | `InvalidReading`       | yes   |
//! | exactly 0 °C       | `ZeroReading`          | yes   |
//! | below 0 °C         | `BelowZero`            | no    |
//! | above the limit    | `AboveLimit`           | no    |
//! | otherwise          | whole °C               |       |
//!
//! Bus failures are mapped to `ReadError` by the driver itself.

use crate::error::SensorFault;

/// Classify a converted reading in °C against the configured upper limit.
pub fn classify(celsius: f32, limit: f32) -> Result<i32, SensorFault> {
    if celsius.is_nan() {
        return Err(SensorFault::InvalidReading);
    }
    if celsius == 0.0 {
        return Err(SensorFault::ZeroReading);
    }
    if celsius < 0.0 {
        return Err(SensorFault::BelowZero);
    }
    if celsius > limit {
        return Err(SensorFault::AboveLimit);
    }
    Ok(celsius.round() as i32)
}
