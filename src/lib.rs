//! Force acquisition for a rocket motor test stand.
//!
//! The stand reads thrust through a strain gauge load cell digitised by an
//! HX711. This crate provides the [`hx711`] driver, the [`ForceSensor`] that
//! tares the cell and converts samples into force units, the stand
//! [`config`] and a [`SharedForceSensor`] slot for interrupt-safe access.

#![cfg_attr(not(test), no_std)]

pub mod config;
pub mod error;
pub mod force;
pub mod hx711;
pub mod shared;

pub use error::{ConfigError, SensorError};
pub use force::ForceSensor;
pub use shared::SharedForceSensor;

/// A load cell ADC that can produce raw samples and apply an offset and scale.
pub trait LoadCell {
    /// Read one raw sample from the load cell.
    fn read(&mut self) -> Result<i32, SensorError>;

    /// Average `num_samples` raw samples. Zero samples reads one.
    fn read_average(&mut self, num_samples: usize) -> Result<i32, SensorError> {
        let num_samples = num_samples.max(1);
        let mut sum: i64 = 0;
        for _ in 0..num_samples {
            sum += i64::from(self.read()?);
        }
        Ok((sum / num_samples as i64) as i32)
    }

    /// Read the value after applying offset and scaling.
    fn read_scaled(&mut self) -> Result<f32, SensorError> {
        self.read_scaled_average(1)
    }

    /// Average `num_samples` readings, then apply offset and scaling.
    fn read_scaled_average(&mut self, num_samples: usize) -> Result<f32, SensorError> {
        let raw = self.read_average(num_samples)?;
        let tared = i64::from(raw) - i64::from(self.get_offset());
        Ok(tared as f32 / self.get_scale())
    }

    /// Zero the load cell offset by averaging `num_samples` readings
    fn tare(&mut self, num_samples: usize) -> Result<(), SensorError> {
        let offset = self.read_average(num_samples)?;
        self.set_offset(offset);
        Ok(())
    }

    /// Get the load cell offset.
    fn get_offset(&self) -> i32;

    /// Set the load cell offset directly, e.g. from a persisted tare.
    fn set_offset(&mut self, offset: i32);

    /// Set the scale (AKA calibrate the scale).
    /// Raw counts are divided by this value.
    fn set_scale(&mut self, scale: f32);

    /// Get the scale.
    fn get_scale(&self) -> f32;
}
