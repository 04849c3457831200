//! Actuator and converter drivers, hardware initialisation, timers.

pub mod element;
pub mod hw_init;
pub mod hw_timer;
pub mod induction;
pub mod max6675;
pub mod watchdog;

pub use element::ElementHeater;
pub use induction::InductionHeater;
pub use max6675::Max6675;
