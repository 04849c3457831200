//! Built-in autosession profiles.
//!
//! Profiles are named waypoint strings in the `"<seconds>:<celsius>,..."`
//! form.  The board ships with a small table compiled into flash; loading
//! parses on demand so only the active profile is held in RAM.

use log::warn;

use crate::app::ports::ProfileSource;
use crate::control::profile::TemperatureProfile;

/// Profiles bundled with the firmware.
pub const BUILTIN_PROFILES: &[(&str, &str)] = &[
    ("ramp", "0:100,5:100,15:150,30:50"),
    ("gentle", "0:160,120:170,240:180,300:185"),
    ("boost", "0:180,60:200,150:210,180:160"),
];

/// [`ProfileSource`] over a static name → waypoint-string table.
pub struct StaticProfiles {
    entries: &'static [(&'static str, &'static str)],
}

impl StaticProfiles {
    pub const fn new(entries: &'static [(&'static str, &'static str)]) -> Self {
        Self { entries }
    }

    pub const fn builtin() -> Self {
        Self::new(BUILTIN_PROFILES)
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.iter().map(|(name, _)| *name)
    }
}

impl ProfileSource for StaticProfiles {
    fn load(&self, name: &str) -> Option<TemperatureProfile> {
        let (_, text) = self.entries.iter().find(|(n, _)| *n == name)?;
        let profile = TemperatureProfile::parse(text);
        if !profile.is_valid() {
            warn!("profile '{}' is malformed", name);
        }
        Some(profile)
    }
}
