//! Heater controller firmware library.
//!
//! Exposes the control core and the hardware-facing drivers so the
//! engine can be exercised by host-side unit and integration tests.
//! All ESP-IDF-specific code is guarded by `#[cfg(target_os = "espidf")]`
//! within each module.

#![deny(unused_must_use)]

pub mod app;
pub mod config;
pub mod control;
pub mod error;
pub mod events;
pub mod fsm;
pub mod safety;
pub mod scheduler;
pub mod time;

// Board-facing modules; the ESP-IDF parts are cfg-gated inside.
pub mod adapters;
pub mod drivers;
pub mod pins;
pub mod sensors;
