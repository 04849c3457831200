//! Adapters: concrete implementations of the port traits.
//!
//! | Adapter    | Implements                      | Connects to                 |
//! |------------|---------------------------------|-----------------------------|
//! | `hardware` | HeaterActuator, sensors, Clock  | heater, MAX6675, ADC, die   |
//! | `log_sink` | EventSink                       | Serial log output           |
//! | `csv_log`  | CycleLogSink                    | Any `std::io::Write`        |
//! | `profiles` | ProfileSource                   | Built-in profile table      |
//! | `time`     | Clock                           | ESP32 system timer          |

pub mod csv_log;
pub mod hardware;
pub mod log_sink;
pub mod profiles;
pub mod time;

pub use csv_log::CsvCycleLog;
pub use hardware::HardwareAdapter;
pub use log_sink::LogEventSink;
pub use profiles::StaticProfiles;
pub use time::MonotonicClock;
