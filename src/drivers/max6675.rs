//! MAX6675 K-type thermocouple converter on SPI.
//!
//! The chip answers every chip-select with one 16-bit big-endian frame:
//!
//! ```text
//!  D15     D14..D3          D2        D1      D0
//!  dummy   12-bit reading   TC open   dev ID  tri-state
//! ```
//!
//! The reading is in 0.25 °C steps.  D2 set means no thermocouple is
//! connected, reported as [`SensorFault::InvalidReading`].

use embedded_hal::spi::SpiDevice;
use log::error;

use crate::app::ports::TemperatureSensor;
use crate::error::SensorFault;
use crate::sensors::thermocouple::classify;

const OPEN_CIRCUIT_BIT: u16 = 1 << 2;
const CELSIUS_PER_COUNT: f32 = 0.25;

pub struct Max6675<SPI: SpiDevice> {
    spi: SPI,
    limit: f32,
}

impl<SPI: SpiDevice> Max6675<SPI> {
    /// `limit` is the highest plausible reading; anything above it is
    /// treated as a shorted probe.
    pub fn new(spi: SPI, limit: f32) -> Self {
        Self { spi, limit }
    }

    /// Read one raw frame.
    pub fn read_frame(&mut self) -> Result<u16, SensorFault> {
        let mut buf = [0u8; 2];
        self.spi.read(&mut buf).map_err(|_| {
            error!("MAX6675: SPI read failed");
            SensorFault::ReadError
        })?;
        Ok(u16::from_be_bytes(buf))
    }

    /// Decode a frame to °C.
    pub fn decode(frame: u16) -> Result<f32, SensorFault> {
        if frame & OPEN_CIRCUIT_BIT != 0 {
            return Err(SensorFault::InvalidReading);
        }
        Ok(f32::from(frame >> 3) * CELSIUS_PER_COUNT)
    }
}

impl<SPI: SpiDevice> TemperatureSensor for Max6675<SPI> {
    fn raw_read(&mut self) -> Result<i32, SensorFault> {
        let celsius = Self::decode(self.read_frame()?)?;
        classify(celsius, self.limit)
    }
}
