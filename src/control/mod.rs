//! Control primitives: setpoint profile, sensor filter, and PID.

pub mod filter;
pub mod pid;
pub mod profile;
