//! One-shot peripheral initialisation and raw readers.
//!
//! Configures the ADC1 channel behind the supply voltage divider and the
//! on-chip temperature sensor, using raw ESP-IDF sys calls.  Called once
//! from `main()` before the event loop starts.
//!
//! Host builds read from static atomics instead; tests inject values with
//! the `sim_set_*` helpers.

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

#[cfg(target_os = "espidf")]
use log::info;

#[cfg(target_os = "espidf")]
use crate::pins;

// ── Error type ────────────────────────────────────────────────

/// Errors during one-shot peripheral initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HwInitError {
    AdcInitFailed(i32),
    DieSensorInitFailed(i32),
}

impl core::fmt::Display for HwInitError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::AdcInitFailed(rc) => write!(f, "ADC1 init failed (rc={})", rc),
            Self::DieSensorInitFailed(rc) => {
                write!(f, "die temperature sensor init failed (rc={})", rc)
            }
        }
    }
}

impl std::error::Error for HwInitError {}

#[cfg(target_os = "espidf")]
pub fn init_peripherals() -> Result<(), HwInitError> {
    // SAFETY: called once from main() before the event loop; single-threaded.
    unsafe {
        init_adc()?;
        init_die_sensor()?;
    }
    info!("hw_init: ADC1 and die temperature sensor configured");
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn init_peripherals() -> Result<(), HwInitError> {
    log::info!("hw_init(sim): peripheral init skipped");
    Ok(())
}

// ── ADC (oneshot) ─────────────────────────────────────────────

#[cfg(target_os = "espidf")]
static mut ADC1_HANDLE: adc_oneshot_unit_handle_t = core::ptr::null_mut();

/// SAFETY: only called from the init path or the main-loop read path;
/// `init_adc()` completes before the event loop starts.
#[cfg(target_os = "espidf")]
unsafe fn adc1_handle() -> adc_oneshot_unit_handle_t {
    unsafe { ADC1_HANDLE }
}

#[cfg(target_os = "espidf")]
unsafe fn init_adc() -> Result<(), HwInitError> {
    let init_cfg = adc_oneshot_unit_init_cfg_t {
        unit_id: adc_unit_t_ADC_UNIT_1,
        ulp_mode: adc_ulp_mode_t_ADC_ULP_MODE_DISABLE,
        ..Default::default()
    };
    // SAFETY: ADC1_HANDLE is only written here, once at boot.
    let ret = unsafe { adc_oneshot_new_unit(&init_cfg, &raw mut ADC1_HANDLE) };
    if ret != ESP_OK as i32 {
        return Err(HwInitError::AdcInitFailed(ret));
    }

    // 12 dB attenuation covers the full 0-3.3 V divider output.
    let chan_cfg = adc_oneshot_chan_cfg_t {
        atten: adc_atten_t_ADC_ATTEN_DB_12,
        bitwidth: adc_bitwidth_t_ADC_BITWIDTH_12,
    };
    let ret = unsafe {
        adc_oneshot_config_channel(adc1_handle(), pins::VSENSE_ADC_CHANNEL, &chan_cfg)
    };
    if ret != ESP_OK as i32 {
        return Err(HwInitError::AdcInitFailed(ret));
    }

    info!(
        "hw_init: ADC1 CH{} (GPIO{}) = supply sense",
        pins::VSENSE_ADC_CHANNEL,
        pins::VSENSE_ADC_GPIO
    );
    Ok(())
}

/// One 12-bit conversion, or `None` if the driver reports an error.
#[cfg(target_os = "espidf")]
pub fn adc1_read(channel: u32) -> Option<u16> {
    let mut raw: i32 = 0;
    // SAFETY: adc1_handle() contract, single-threaded main-loop access.
    let ret = unsafe { adc_oneshot_read(adc1_handle(), channel, &mut raw) };
    if ret != ESP_OK as i32 {
        return None;
    }
    Some(raw.clamp(0, 4095) as u16)
}

#[cfg(not(target_os = "espidf"))]
static SIM_ADC1: core::sync::atomic::AtomicU16 = core::sync::atomic::AtomicU16::new(0);

#[cfg(not(target_os = "espidf"))]
pub fn adc1_read(_channel: u32) -> Option<u16> {
    Some(SIM_ADC1.load(core::sync::atomic::Ordering::Relaxed))
}

/// Set the value the next simulated ADC1 conversion returns (12-bit).
#[cfg(not(target_os = "espidf"))]
pub fn sim_set_adc1(raw: u16) {
    SIM_ADC1.store(raw.min(4095), core::sync::atomic::Ordering::Relaxed);
}

// ── Die temperature sensor ────────────────────────────────────

#[cfg(target_os = "espidf")]
static mut DIE_SENSOR: temperature_sensor_handle_t = core::ptr::null_mut();

#[cfg(target_os = "espidf")]
unsafe fn init_die_sensor() -> Result<(), HwInitError> {
    let cfg = temperature_sensor_config_t {
        range_min: -10,
        range_max: 80,
        ..Default::default()
    };
    // SAFETY: DIE_SENSOR is only written here, once at boot.
    let ret = unsafe { temperature_sensor_install(&cfg, &raw mut DIE_SENSOR) };
    if ret != ESP_OK as i32 {
        return Err(HwInitError::DieSensorInitFailed(ret));
    }
    let ret = unsafe { temperature_sensor_enable(DIE_SENSOR) };
    if ret != ESP_OK as i32 {
        return Err(HwInitError::DieSensorInitFailed(ret));
    }
    Ok(())
}

/// Controller die temperature in °C, or `None` on a driver error.
#[cfg(target_os = "espidf")]
pub fn die_temperature_read() -> Option<f32> {
    let mut celsius: f32 = 0.0;
    // SAFETY: DIE_SENSOR is written once in init_die_sensor() before the
    // event loop; read from the main loop only.
    let ret = unsafe { temperature_sensor_get_celsius(DIE_SENSOR, &mut celsius) };
    (ret == ESP_OK as i32).then_some(celsius)
}

/// Simulated die temperature, stored as `f32` bits.  Starts at 25 °C.
#[cfg(not(target_os = "espidf"))]
static SIM_DIE_BITS: core::sync::atomic::AtomicU32 = core::sync::atomic::AtomicU32::new(0x41C8_0000);

#[cfg(not(target_os = "espidf"))]
pub fn die_temperature_read() -> Option<f32> {
    Some(f32::from_bits(
        SIM_DIE_BITS.load(core::sync::atomic::Ordering::Relaxed),
    ))
}

#[cfg(not(target_os = "espidf"))]
pub fn sim_set_die_celsius(celsius: f32) {
    SIM_DIE_BITS.store(celsius.to_bits(), core::sync::atomic::Ordering::Relaxed);
}
