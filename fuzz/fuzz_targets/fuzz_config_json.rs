//! Fuzz target: `ControllerConfig::from_json`
//!
//! Arbitrary bytes must either be rejected with a typed `ConfigError` or
//! yield a configuration that passes validation and clamps setpoints into
//! its allowed range.
//!
//! cargo fuzz run fuzz_config_json

#![no_main]

use heatctl::config::ControllerConfig;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(json) = core::str::from_utf8(data) else {
        return;
    };
    let Ok(config) = ControllerConfig::from_json(json) else {
        return;
    };

    assert!(config.validate().is_ok());
    for requested in [i32::MIN, -1, 0, config.setpoint, i32::MAX] {
        let clamped = config.clamp_setpoint(requested);
        assert!((1..=config.max_allowed_setpoint).contains(&clamped));
    }
});
