//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing each [`AppEvent`] as one
//! structured line to the ESP-IDF logger (UART / USB-CDC in production).
//! Per-cycle telemetry goes out at `debug` so it can be filtered without
//! losing mode and fault lines.

use log::{debug, error, info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] to the serial console.
#[derive(Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Started(mode) => {
                info!("START | mode={:?}", mode);
            }
            AppEvent::ModeChanged { from, to } => {
                info!("MODE | {:?} -> {:?}", from, to);
            }
            AppEvent::FaultLatched(code) => {
                error!("FAULT | latched {} | {}", code.as_str(), code.message());
            }
            AppEvent::FaultCleared(code) => {
                info!("FAULT | cleared {}", code.as_str());
            }
            AppEvent::SensorPaused(fault) => {
                warn!("SENSOR | cycle skipped: {}", fault);
            }
            AppEvent::PidReset(reason) => {
                info!("PID | reset ({:?})", reason);
            }
            AppEvent::SetpointReached => {
                info!("SESSION | setpoint reached");
            }
            AppEvent::SessionExpired => {
                info!("SESSION | expired");
            }
            AppEvent::ProfileFinished => {
                info!("SESSION | autosession profile finished");
            }
            AppEvent::SessionNearExpiry => {
                info!("SESSION | ending soon");
            }
            AppEvent::DieCooling(celsius) => {
                error!("FAULT | controller die {:.1}\u{00b0}C, heater paused", celsius);
            }
            AppEvent::Cycle(r) => {
                debug!(
                    "CYCLE | t={:.1}s | T={:.1}/{:.0}\u{00b0}C | {:.2}V | {:.1}% {}W | \
                     P={:.2} I={:.2} D={:.2}",
                    r.elapsed_ms as f32 / 1000.0,
                    r.temperature,
                    r.setpoint,
                    r.volts,
                    r.power,
                    r.watts,
                    r.p,
                    r.i,
                    r.d,
                );
            }
        }
    }
}
