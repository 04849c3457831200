//! heatctl firmware: main entry point.
//!
//! Event-driven: three `esp_timer`s push ticks into the lock-free queue
//! and the main task drains it, so every control decision runs on one
//! task and to completion.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                     Adapters (outer ring)                    │
//! │                                                              │
//! │  HardwareAdapter        LogEventSink      CsvCycleLog        │
//! │  (heater + sensors)     (EventSink)       (CycleLogSink)     │
//! │  MonotonicClock         StaticProfiles                       │
//! │                                                              │
//! │  ────────────────── Port Trait Boundary ─────────────────    │
//! │                                                              │
//! │  ┌────────────────────────────────────────────────────────┐  │
//! │  │           ControlLoopEngine (pure logic)               │  │
//! │  │  Filter · PID · Modes · Safety interlocks              │  │
//! │  └────────────────────────────────────────────────────────┘  │
//! │                                                              │
//! │  control 371 ms · housekeeping 903 ms · coil 750 ms timers   │
//! └──────────────────────────────────────────────────────────────┘
//! ```

#![deny(unused_must_use)]

use anyhow::{Result, anyhow};
use esp_idf_hal::delay::FreeRtos;
use esp_idf_hal::gpio::{AnyOutputPin, Output, OutputPin as _, PinDriver};
use esp_idf_hal::ledc::{LedcDriver, LedcTimerDriver, config::TimerConfig};
use esp_idf_hal::peripherals::Peripherals;
use esp_idf_hal::spi::{SpiDeviceDriver, SpiDriver, SpiDriverConfig, config::Config as SpiConfig};
use esp_idf_hal::units::Hertz;
use log::{error, info, warn};

use heatctl::adapters::{CsvCycleLog, HardwareAdapter, LogEventSink, MonotonicClock, StaticProfiles};
use heatctl::app::commands;
use heatctl::app::ports::HeaterActuator;
use heatctl::app::ControlLoopEngine;
use heatctl::config::{ControllerConfig, HeaterKind};
use heatctl::drivers::hw_timer::EspTimerBackend;
use heatctl::drivers::watchdog::Watchdog;
use heatctl::drivers::{ElementHeater, InductionHeater, Max6675, hw_init};
use heatctl::error::ControlError;
use heatctl::events::{self, TimerEvent};
use heatctl::pins;
use heatctl::scheduler::PeriodicTimer;
use heatctl::sensors::{BoardAdc, DieTemperature, SupplyVoltageMonitor};

// ── Board heater ──────────────────────────────────────────────
//
// The fitted power stage is chosen by the profile at boot, so the
// adapter holds one of two concrete drivers.

enum BoardHeater {
    Element(ElementHeater<LedcDriver<'static>>),
    Induction(InductionHeater<PinDriver<'static, AnyOutputPin, Output>, 2>),
}

impl HeaterActuator for BoardHeater {
    fn on(&mut self, power: f32) {
        match self {
            Self::Element(h) => h.on(power),
            Self::Induction(h) => h.on(power),
        }
    }

    fn set_power(&mut self, power: f32) {
        match self {
            Self::Element(h) => h.set_power(power),
            Self::Induction(h) => h.set_power(power),
        }
    }

    fn off(&mut self) {
        match self {
            Self::Element(h) => h.off(),
            Self::Induction(h) => h.off(),
        }
    }

    fn is_on(&self) -> bool {
        match self {
            Self::Element(h) => h.is_on(),
            Self::Induction(h) => h.is_on(),
        }
    }

    fn power(&self) -> f32 {
        match self {
            Self::Element(h) => h.power(),
            Self::Induction(h) => h.power(),
        }
    }

    fn set_max_duty_cycle(&mut self, percent: f32) {
        match self {
            Self::Element(h) => h.set_max_duty_cycle(percent),
            Self::Induction(h) => h.set_max_duty_cycle(percent),
        }
    }

    fn advance_coil(&mut self) {
        if let Self::Induction(h) = self {
            h.advance_coil();
        }
    }
}

/// Optional profile baked in at build time (`HEATCTL_CONFIG_JSON=...`).
fn load_config() -> ControllerConfig {
    match option_env!("HEATCTL_CONFIG_JSON") {
        Some(json) => match ControllerConfig::from_json(json) {
            Ok(cfg) => {
                info!("Config loaded from build-time JSON");
                cfg
            }
            Err(e) => {
                warn!("Build-time config rejected ({}), using defaults", e);
                ControllerConfig::default()
            }
        },
        None => ControllerConfig::default(),
    }
}

fn periodic(
    name: &'static core::ffi::CStr,
    label: &'static str,
    period_ms: u32,
    event: TimerEvent,
) -> Result<PeriodicTimer<EspTimerBackend>> {
    let backend = EspTimerBackend::new(name, event)
        .map_err(|rc| anyhow!("{} timer create failed (rc={})", label, rc))?;
    Ok(PeriodicTimer::new(label, period_ms, backend))
}

// ── Main ──────────────────────────────────────────────────────

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  heatctl v{}                      ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    hw_init::init_peripherals()?;
    let watchdog = Watchdog::new();

    // ── 2. Profile ────────────────────────────────────────────
    let config = load_config();
    info!(
        "Profile: {:?} control, {:?} heater, {:?} supply, setpoint {}\u{00b0}C",
        config.control, config.heater, config.power_type, config.setpoint
    );

    // ── 3. Peripherals ────────────────────────────────────────
    let peripherals = Peripherals::take()?;
    let p = peripherals.pins;

    let heater = match config.heater {
        HeaterKind::Element => {
            let timer = LedcTimerDriver::new(
                peripherals.ledc.timer0,
                &TimerConfig::default().frequency(Hertz(pins::HEATER_PWM_FREQ_HZ)),
            )?;
            let pwm = LedcDriver::new(peripherals.ledc.channel0, timer, p.gpio4)?;
            BoardHeater::Element(ElementHeater::new(pwm))
        }
        HeaterKind::Induction => {
            let coils = [
                PinDriver::output(p.gpio5.downgrade_output())?,
                PinDriver::output(p.gpio6.downgrade_output())?,
            ];
            BoardHeater::Induction(InductionHeater::new(coils))
        }
    };

    let spi = SpiDriver::new_without_sdo(
        peripherals.spi2,
        p.gpio12,
        p.gpio13,
        &SpiDriverConfig::new(),
    )?;
    let spi = SpiDeviceDriver::new(
        spi,
        Some(p.gpio10),
        &SpiConfig::new().baudrate(Hertz(pins::TC_SPI_BAUD_HZ)),
    )?;
    let thermocouple = Max6675::new(spi, config.thermocouple_limit);

    let mut hw = HardwareAdapter::new(
        heater,
        thermocouple,
        SupplyVoltageMonitor::new(BoardAdc::new(), FreeRtos),
        DieTemperature::new(),
        MonotonicClock::new(),
        FreeRtos,
    );

    let mut sink = LogEventSink::new();
    let mut cycle_log = CsvCycleLog::new(std::io::stdout(), config.log_flush_threshold);
    let profiles = StaticProfiles::builtin();

    // ── 4. Engine ─────────────────────────────────────────────
    let mut engine = ControlLoopEngine::new(config.clone()).map_err(ControlError::from)?;
    if let Err(fault) = engine.probe_sensor(hw.thermocouple_mut()) {
        error!("Thermocouple unusable at boot ({}), duty-cycle control only", fault);
    }
    engine.start(&hw, &mut sink);

    // ── 5. Timers ─────────────────────────────────────────────
    events::init_event_queue();
    let control_timer = periodic(
        c"control",
        "control",
        config.control_period_ms,
        TimerEvent::ControlTick,
    )?;
    let housekeeping_timer = periodic(
        c"housekeeping",
        "housekeeping",
        config.housekeeping_period_ms,
        TimerEvent::HousekeepingTick,
    )?;
    control_timer.start().map_err(ControlError::from)?;
    housekeeping_timer.start().map_err(ControlError::from)?;

    let coil_timer = if config.heater == HeaterKind::Induction {
        let t = periodic(
            c"coil",
            "coil",
            config.coil_switch_period_ms,
            TimerEvent::CoilSwitch,
        )?;
        t.start().map_err(ControlError::from)?;
        Some(t)
    } else {
        None
    };

    info!(
        "Timers: control {} ms, housekeeping {} ms{}",
        config.control_period_ms,
        config.housekeeping_period_ms,
        if coil_timer.is_some() { ", coil rotation on" } else { "" }
    );
    info!("System ready. Entering event loop.");

    // ── 6. Event loop ─────────────────────────────────────────
    loop {
        events::drain_events(|event| match event {
            TimerEvent::ControlTick => {
                // A tick already queued when the timer was stopped is stale.
                if !control_timer.is_running() {
                    return;
                }
                if let Err(e) = engine.on_control_tick(&mut hw, &control_timer, &mut sink, &mut cycle_log) {
                    error!("Control tick: {}", e);
                }
            }
            TimerEvent::HousekeepingTick => {
                let mut keepalive = || watchdog.feed();
                if let Err(e) =
                    engine.on_housekeeping_tick(&mut hw, &control_timer, &mut sink, &mut keepalive)
                {
                    error!("Housekeeping tick: {}", e);
                }
            }
            TimerEvent::CoilSwitch => hw.advance_coil(),
        });

        commands::drain(|cmd| engine.handle_command(cmd, &mut hw, &profiles, &mut sink));

        watchdog.feed();
        FreeRtos::delay_ms(pins::MAIN_LOOP_IDLE_MS);
    }
}
