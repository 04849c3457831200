//! Fuzz target: `TemperatureProfile::parse`
//!
//! Feeds arbitrary text to the profile parser and checks that whatever
//! comes back is a sorted table whose interpolated values stay inside the
//! waypoint temperature range and that ends right after its last point.
//!
//! cargo fuzz run fuzz_profile_parse

#![no_main]

use heatctl::control::profile::TemperatureProfile;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = core::str::from_utf8(data) else {
        return;
    };
    let profile = TemperatureProfile::parse(text);
    let points = profile.waypoints();
    if points.is_empty() {
        assert!(profile.at(0).is_none());
        return;
    }

    assert!(points.windows(2).all(|w| w[0].time_ms <= w[1].time_ms));

    let lo = points.iter().map(|w| w.temperature).min().unwrap_or(0) as f32;
    let hi = points.iter().map(|w| w.temperature).max().unwrap_or(0) as f32;
    let end = profile.duration_ms();
    // f32 loses precision on extreme temperatures.
    let slack = 1.0 + lo.abs().max(hi.abs()) * 1e-5;

    // Probe each waypoint and the midpoints between them.
    for pair in points.windows(2) {
        let mid = pair[0].time_ms + (pair[1].time_ms - pair[0].time_ms) / 2;
        for t in [pair[0].time_ms, mid, pair[1].time_ms] {
            let v = profile.at(t).expect("inside profile");
            assert!(v >= lo - slack && v <= hi + slack, "{v} outside {lo}..={hi}");
        }
    }

    if let Some(after) = end.checked_add(1) {
        assert!(profile.at(after).is_none());
    }
});
