//! GPIO / peripheral pin assignments for the heater controller board.
//!
//! Single source of truth: every driver references this module rather
//! than hard-coding pin numbers.

// ---------------------------------------------------------------------------
// Heater power stage
// ---------------------------------------------------------------------------

/// LEDC PWM output driving the element MOSFET gate.
pub const HEATER_PWM_GPIO: i32 = 4;
/// Heater PWM carrier frequency.
pub const HEATER_PWM_FREQ_HZ: u32 = 1_000;

/// Induction coil enable outputs, energised one at a time.
pub const COIL_GPIOS: [i32; 2] = [5, 6];

// ---------------------------------------------------------------------------
// Thermocouple amplifier (MAX6675 on SPI2)
// ---------------------------------------------------------------------------

pub const TC_SCK_GPIO: i32 = 12;
pub const TC_MISO_GPIO: i32 = 13;
pub const TC_CS_GPIO: i32 = 10;
/// MAX6675 tolerates up to 4.3 MHz; stay well below.
pub const TC_SPI_BAUD_HZ: u32 = 1_000_000;

// ---------------------------------------------------------------------------
// Supply voltage sense (ADC1)
// ---------------------------------------------------------------------------

/// Divider tap on the supply rail.  ADC1 channel 0 (GPIO 1 on ESP32-S3).
pub const VSENSE_ADC_GPIO: i32 = 1;
pub const VSENSE_ADC_CHANNEL: u32 = 0;

/// Upper divider resistor (Ω).
pub const VSENSE_R_TOP: f32 = 910_000.0;
/// Lower divider resistor (Ω).
pub const VSENSE_R_BOTTOM: f32 = 102_000.0;
/// ADC reference (V) at 12 dB attenuation.
pub const VSENSE_VREF: f32 = 3.3;

// ---------------------------------------------------------------------------
// Timer periods
// ---------------------------------------------------------------------------

/// Main-loop idle sleep between event queue polls (ms).
pub const MAIN_LOOP_IDLE_MS: u32 = 10;
