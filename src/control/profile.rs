//! Autosession temperature profile.
//!
//! A profile is a piecewise-linear setpoint curve over time, written as
//! `"<seconds>:<celsius>,<seconds>:<celsius>,..."`, for example
//! `"0:100,5:100,15:150,30:50"`.  Times are converted to milliseconds and
//! sorted ascending; duplicate times are kept in input order.
//!
//! ```text
//!  °C
//!  150 ┤            ●
//!  100 ┤ ●────●   ╱   ╲
//!   50 ┤     ╱         ╲ ●
//!      └─┬────┬────┬────┬── s
//!        0    5   15   30
//! ```

use core::fmt;

use log::warn;

/// Most waypoints a profile may hold.
pub const MAX_WAYPOINTS: usize = 32;

/// One `(time, temperature)` point of a profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Waypoint {
    pub time_ms: u32,
    pub temperature: i32,
}

/// Ordered waypoint table.  Empty means invalid.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemperatureProfile {
    waypoints: heapless::Vec<Waypoint, MAX_WAYPOINTS>,
}

impl TemperatureProfile {
    /// Parse the profile mini-language.  Malformed input yields an empty
    /// (invalid) profile rather than an error.
    pub fn parse(text: &str) -> Self {
        match Self::try_parse(text) {
            Some(profile) => profile,
            None => {
                warn!("profile: could not parse {:?}, ignoring", text);
                Self::default()
            }
        }
    }

    fn try_parse(text: &str) -> Option<Self> {
        let text = text.trim();
        if text.is_empty() {
            return Some(Self::default());
        }

        let mut waypoints = heapless::Vec::new();
        for pair in text.split(',') {
            let (secs, temp) = pair.split_once(':')?;
            let secs: u32 = secs.trim().parse().ok()?;
            let temperature: i32 = temp.trim().parse().ok()?;
            let time_ms = secs.checked_mul(1000)?;
            waypoints.push(Waypoint { time_ms, temperature }).ok()?;
        }
        waypoints.sort_by_key(|w: &Waypoint| w.time_ms);
        Some(Self { waypoints })
    }

    /// Build from an already-parsed table.  The table is sorted by time.
    pub fn from_waypoints(points: &[Waypoint]) -> Self {
        let mut waypoints = heapless::Vec::new();
        for &p in points.iter().take(MAX_WAYPOINTS) {
            // Capacity is bounded by `take` above.
            let _ = waypoints.push(p);
        }
        waypoints.sort_by_key(|w: &Waypoint| w.time_ms);
        Self { waypoints }
    }

    /// Setpoint at `elapsed_ms` into the profile.
    ///
    /// Holds the first temperature up to the first waypoint, interpolates
    /// linearly between waypoints, and returns `None` once `elapsed_ms`
    /// is past the last waypoint (or the profile is empty).
    pub fn at(&self, elapsed_ms: u32) -> Option<f32> {
        let first = self.waypoints.first()?;
        let last = self.waypoints.last()?;

        if elapsed_ms <= first.time_ms {
            return Some(first.temperature as f32);
        }
        if elapsed_ms > last.time_ms {
            return None;
        }

        for pair in self.waypoints.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            if a.time_ms <= elapsed_ms && elapsed_ms <= b.time_ms {
                if a.time_ms == b.time_ms {
                    return Some(a.temperature as f32);
                }
                let fraction =
                    (elapsed_ms - a.time_ms) as f32 / (b.time_ms - a.time_ms) as f32;
                // i32 difference can overflow on extreme waypoints.
                let span = (i64::from(b.temperature) - i64::from(a.temperature)) as f32;
                return Some(a.temperature as f32 + span * fraction);
            }
        }

        Some(last.temperature as f32)
    }

    /// Time of the last waypoint, or 0 when empty.
    pub fn duration_ms(&self) -> u32 {
        self.waypoints.last().map_or(0, |w| w.time_ms)
    }

    pub fn is_valid(&self) -> bool {
        !self.waypoints.is_empty()
    }

    pub fn waypoints(&self) -> &[Waypoint] {
        &self.waypoints
    }
}

impl fmt::Display for TemperatureProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("TemperatureProfile(")?;
        for (i, w) in self.waypoints.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}s:{}C", w.time_ms / 1000, w.temperature)?;
        }
        f.write_str(")")
    }
}
