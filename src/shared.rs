//! A force sensor slot shared between interrupt handlers and the main loop.
//!
//! Reading the HX711 is a multi-step bit-banged exchange and must not be
//! interleaved. The slot lends the sensor out to one caller at a time. Only
//! the check-out and check-in run in a critical section; the reading itself,
//! including the wait for a conversion, runs with interrupts enabled. A
//! caller that finds the sensor lent out gets `SensorError::Busy`.
//!
//! ```ignore
//! static FORCE: SharedForceSensor<Hx> = SharedForceSensor::new();
//!
//! FORCE.install(ForceSensor::on_pins(dt, sck, delay, &config.sensor)?);
//! let thrust = FORCE.read_force()?;
//! ```

use core::cell::RefCell;

use critical_section::Mutex;

use crate::force::ForceSensor;
use crate::{LoadCell, SensorError};

enum Slot<LC> {
    Empty,
    Idle(ForceSensor<LC>),
    // lent out to a reader
    InUse,
}

impl<LC> Slot<LC> {
    fn replace(&mut self, next: Slot<LC>) -> Option<ForceSensor<LC>> {
        match core::mem::replace(self, next) {
            Slot::Idle(sensor) => Some(sensor),
            Slot::Empty | Slot::InUse => None,
        }
    }
}

pub struct SharedForceSensor<LC> {
    slot: Mutex<RefCell<Slot<LC>>>,
}

impl<LC> SharedForceSensor<LC> {
    pub const fn new() -> Self {
        Self {
            slot: Mutex::new(RefCell::new(Slot::Empty)),
        }
    }

    /// Install an initialized sensor, returning the idle one it replaces.
    ///
    /// A sensor that is lent out when this is called is dropped on return.
    pub fn install(&self, sensor: ForceSensor<LC>) -> Option<ForceSensor<LC>> {
        critical_section::with(|cs| self.slot.borrow_ref_mut(cs).replace(Slot::Idle(sensor)))
    }

    /// Remove the sensor. `None` if the slot is empty or the sensor is lent out.
    pub fn take(&self) -> Option<ForceSensor<LC>> {
        critical_section::with(|cs| {
            let mut slot = self.slot.borrow_ref_mut(cs);
            if matches!(*slot, Slot::Idle(_)) {
                slot.replace(Slot::Empty)
            } else {
                None
            }
        })
    }

    pub fn is_installed(&self) -> bool {
        critical_section::with(|cs| !matches!(*self.slot.borrow_ref(cs), Slot::Empty))
    }

    /// Check the sensor out, run `f` on it outside any critical section, and
    /// check it back in.
    pub fn with<R>(
        &self,
        f: impl FnOnce(&mut ForceSensor<LC>) -> Result<R, SensorError>,
    ) -> Result<R, SensorError> {
        let mut sensor = critical_section::with(|cs| {
            let mut slot = self.slot.borrow_ref_mut(cs);
            match &*slot {
                Slot::InUse => return Err(SensorError::Busy),
                Slot::Empty => return Err(SensorError::NotInitialized),
                Slot::Idle(_) => {}
            }
            slot.replace(Slot::InUse).ok_or(SensorError::NotInitialized)
        })?;

        let result = f(&mut sensor);

        critical_section::with(|cs| {
            let mut slot = self.slot.borrow_ref_mut(cs);
            // installed or taken while lent out: the newer state wins
            if matches!(*slot, Slot::InUse) {
                *slot = Slot::Idle(sensor);
            }
        });
        result
    }
}

impl<LC: LoadCell> SharedForceSensor<LC> {
    pub fn read_force(&self) -> Result<f32, SensorError> {
        self.with(|sensor| sensor.read_force())
    }
}

impl<LC> Default for SharedForceSensor<LC> {
    fn default() -> Self {
        Self::new()
    }
}
