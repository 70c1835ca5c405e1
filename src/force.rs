//! Calibrated force readings from a tared load cell.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};

use crate::config::{calibration_is_valid, SensorSettings};
use crate::hx711::HX711;
use crate::{LoadCell, SensorError};

/// A load cell that has been tared and can produce force readings.
///
/// The only way to obtain one is [`ForceSensor::initialize`], so holding a
/// `ForceSensor` means the zero offset has been captured.
pub struct ForceSensor<LC> {
    load_cell: LC,
    calibration_factor: f32,
    zero_offset: i32,
    samples_per_reading: usize,
}

impl<LC: LoadCell> ForceSensor<LC> {
    /// Tare the load cell and take ownership of it.
    ///
    /// The cell must be unloaded: whatever force is applied now becomes zero.
    pub fn initialize(mut load_cell: LC, settings: &SensorSettings) -> Result<Self, SensorError> {
        if !calibration_is_valid(settings.calibration_factor) {
            return Err(SensorError::InvalidCalibration);
        }

        log::debug!("Initializing force sensor...");
        load_cell.set_scale(1.0);
        load_cell.tare(usize::from(settings.tare_samples))?;
        let zero_offset = load_cell.get_offset();
        log::debug!("Zero offset: {}", zero_offset);

        Ok(Self {
            load_cell,
            calibration_factor: settings.calibration_factor,
            zero_offset,
            samples_per_reading: usize::from(settings.samples_per_reading).max(1),
        })
    }

    /// Force relative to the zero offset, in the units of the calibration factor.
    pub fn read_force(&mut self) -> Result<f32, SensorError> {
        self.load_cell.set_offset(self.zero_offset);
        self.load_cell.set_scale(self.calibration_factor);
        let force = self
            .load_cell
            .read_scaled_average(self.samples_per_reading)?;
        if !force.is_finite() {
            log::warn!("non-finite force reading discarded");
            return Err(SensorError::HardwareUnavailable);
        }
        Ok(force)
    }

    /// Average raw counts, without offset or scaling.
    pub fn read_raw(&mut self, num_samples: usize) -> Result<i32, SensorError> {
        self.load_cell.read_average(num_samples)
    }

    /// Work out the calibration factor with a known `reference_force` on the cell.
    ///
    /// The factor is returned, not applied; store it in the stand configuration.
    pub fn measure_calibration_factor(
        &mut self,
        reference_force: f32,
        num_samples: usize,
    ) -> Result<f32, SensorError> {
        if !calibration_is_valid(reference_force) {
            return Err(SensorError::InvalidCalibration);
        }
        let loaded = self.read_raw(num_samples)?;
        let delta = i64::from(loaded) - i64::from(self.zero_offset);
        let factor = delta as f32 / reference_force;
        log::debug!("Calibration: {} counts for {} -> factor {}", delta, reference_force, factor);
        if !calibration_is_valid(factor) {
            return Err(SensorError::InvalidCalibration);
        }
        Ok(factor)
    }

    pub fn zero_offset(&self) -> i32 {
        self.zero_offset
    }

    pub fn calibration_factor(&self) -> f32 {
        self.calibration_factor
    }

    pub fn release(self) -> LC {
        self.load_cell
    }
}

impl<SckPin, DTPin, Delay> ForceSensor<HX711<SckPin, DTPin, Delay>>
where
    SckPin: OutputPin,
    DTPin: InputPin,
    Delay: DelayNs,
{
    /// Bind an HX711 to its data and clock pins, then tare it.
    pub fn on_pins(
        data_pin: DTPin,
        clock_pin: SckPin,
        delay: Delay,
        settings: &SensorSettings,
    ) -> Result<Self, SensorError> {
        let mut hx711 = HX711::new(clock_pin, data_pin, delay)?
            .with_ready_timeout_us(settings.ready_timeout_us());
        hx711.set_gain_mode(settings.gain);
        Self::initialize(hx711, settings)
    }
}
