//! Bit-banged HX711 driver over `embedded-hal` 1.0 pins.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};

use crate::{LoadCell, SensorError};

pub const HX711_MINIMUM: i32 = -(2i32.saturating_pow(24 - 1));
pub const HX711_MAXIMUM: i32 = 2i32.saturating_pow(24 - 1) - 1;
const HX711_DELAY_TIME_US: u32 = 1;
const HX711_POLL_INTERVAL_US: u32 = 100;
// clock held high this long puts the chip to sleep
const HX711_POWER_DOWN_TIME_US: u32 = 60;

/// Default bound on waiting for a conversion. The chip settles in 400ms after power up.
pub const DEFAULT_READY_TIMEOUT_US: u32 = 1_000_000;

/// Channel and gain of the next conversion, encoded as the number of
/// extra clock pulses sent after the 24 data bits.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum GainMode {
    A128 = 1,
    B32 = 2,
    A64 = 3,
}

impl GainMode {
    fn pulses(self) -> u8 {
        self as u8
    }
}

pub struct HX711<SckPin, DTPin, Delay> {
    sck_pin: SckPin,
    dt_pin: DTPin,
    delay: Delay,
    last_reading: i32,
    gain_mode: GainMode,
    offset: i32, // tare
    scale: f32,  // calibration value
    ready_timeout_us: u32,
    powered_up: bool,
}

impl<SckPin, DTPin, Delay> HX711<SckPin, DTPin, Delay>
where
    SckPin: OutputPin,
    DTPin: InputPin,
    Delay: DelayNs,
{
    /// Bind the driver to its pins. Driving the clock low powers the chip up.
    pub fn new(mut sck_pin: SckPin, dt_pin: DTPin, delay: Delay) -> Result<Self, SensorError> {
        sck_pin.set_low().map_err(pin_fault)?;
        Ok(Self {
            sck_pin,
            dt_pin,
            delay,
            last_reading: 0,
            gain_mode: GainMode::A128,
            offset: 0,
            scale: 1.0,
            ready_timeout_us: DEFAULT_READY_TIMEOUT_US,
            powered_up: true,
        })
    }

    pub fn with_ready_timeout_us(mut self, timeout_us: u32) -> Self {
        self.ready_timeout_us = timeout_us;
        self
    }

    pub fn set_ready_timeout_us(&mut self, timeout_us: u32) {
        self.ready_timeout_us = timeout_us;
    }

    pub fn is_ready(&mut self) -> Result<bool, SensorError> {
        // if the dt pin is low, device is ready for read
        self.dt_pin.is_low().map_err(pin_fault)
    }

    /// Get last reading, offset relative to the tare, and scaled.
    pub fn get_last(&self) -> f32 {
        (i64::from(self.last_reading) - i64::from(self.offset)) as f32 / self.scale
    }

    pub fn get_last_raw(&self) -> i32 {
        self.last_reading
    }

    pub fn get_gain_mode(&self) -> GainMode {
        self.gain_mode
    }

    /// The new mode applies from the conversion after the next read.
    pub fn set_gain_mode(&mut self, new_mode: GainMode) {
        self.gain_mode = new_mode;
    }

    pub fn power_down(&mut self) -> Result<(), SensorError> {
        self.sck_pin.set_high().map_err(pin_fault)?;
        self.delay.delay_us(HX711_POWER_DOWN_TIME_US);
        self.powered_up = false;
        Ok(())
    }

    /// Wake the chip. It resets to channel A, gain 128.
    pub fn power_up(&mut self) -> Result<(), SensorError> {
        self.sck_pin.set_low().map_err(pin_fault)?;
        self.powered_up = true;
        Ok(())
    }

    pub fn is_powered_up(&self) -> bool {
        self.powered_up
    }

    /// Give back the pins and delay.
    pub fn release(self) -> (SckPin, DTPin, Delay) {
        (self.sck_pin, self.dt_pin, self.delay)
    }

    fn wait_ready(&mut self) -> Result<(), SensorError> {
        let mut waited_us: u32 = 0;
        while !self.is_ready()? {
            if waited_us >= self.ready_timeout_us {
                log::warn!("hx711 not ready after {} us", waited_us);
                return Err(SensorError::HardwareUnavailable);
            }
            self.delay.delay_us(HX711_POLL_INTERVAL_US);
            waited_us = waited_us.saturating_add(HX711_POLL_INTERVAL_US);
        }
        Ok(())
    }

    fn shift_in(&mut self) -> Result<u32, SensorError> {
        let mut value: u32 = 0;
        // bits arrive MSB first
        for _ in 0..24 {
            let bit = self.read_hx711_bit(HX711_DELAY_TIME_US)?;
            value = (value << 1) | u32::from(bit);
        }
        // send gain mode for next reading
        for _ in 0..self.gain_mode.pulses() {
            self.toggle_sck_bit(HX711_DELAY_TIME_US)?;
        }
        Ok(value)
    }

    fn read_hx711_bit(&mut self, hx711_delay_time_us: u32) -> Result<bool, SensorError> {
        self.sck_pin.set_high().map_err(pin_fault)?;
        self.delay.delay_us(hx711_delay_time_us);

        let pin_state = self.dt_pin.is_high().map_err(pin_fault)?;

        self.sck_pin.set_low().map_err(pin_fault)?;
        self.delay.delay_us(hx711_delay_time_us);

        Ok(pin_state)
    }

    fn toggle_sck_bit(&mut self, hx711_delay_time_us: u32) -> Result<(), SensorError> {
        self.sck_pin.set_high().map_err(pin_fault)?;
        self.delay.delay_us(hx711_delay_time_us);
        self.sck_pin.set_low().map_err(pin_fault)?;
        self.delay.delay_us(hx711_delay_time_us);
        Ok(())
    }
}

impl<SckPin, DTPin, Delay> LoadCell for HX711<SckPin, DTPin, Delay>
where
    SckPin: OutputPin,
    DTPin: InputPin,
    Delay: DelayNs,
{
    fn read(&mut self) -> Result<i32, SensorError> {
        if !self.powered_up {
            self.power_up()?;
        }
        self.wait_ready()?;

        // clock high for longer than 60us powers the chip down mid-frame
        let value = critical_section::with(|_| self.shift_in())?;

        let signed = sign_extend_24(value);
        log::trace!("hx711 sample = {}", signed);
        self.last_reading = signed;
        Ok(signed)
    }

    fn get_offset(&self) -> i32 {
        self.offset
    }

    fn set_offset(&mut self, offset: i32) {
        self.offset = offset;
    }

    fn set_scale(&mut self, scale: f32) {
        self.scale = scale;
    }

    fn get_scale(&self) -> f32 {
        self.scale
    }
}

fn sign_extend_24(value: u32) -> i32 {
    ((value << 8) as i32) >> 8
}

fn pin_fault<E: embedded_hal::digital::Error>(e: E) -> SensorError {
    log::warn!("hx711 pin fault: {:?}", e.kind());
    SensorError::HardwareUnavailable
}
