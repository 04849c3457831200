//! Application core: the control engine and its boundary.
//!
//! All interaction with hardware happens through the **port traits** in
//! [`ports`], so the engine runs unchanged against the test rig.
//! Commands come in through the static channel in [`commands`]; results
//! go out as [`events::AppEvent`]s.

pub mod commands;
pub mod engine;
pub mod events;
pub mod ports;

pub use engine::{ControlLoopEngine, ControllerState};
