//! HX 711 Polling Example
//!
//! Runs on the host against a simulated HX711: the chip model sits behind
//! `embedded-hal` pins, so the same wiring works with any HAL's GPIO types.
//! A simulated burn ramps thrust up and back down while the main loop polls
//! a shared force sensor.

use core::convert::Infallible;
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use dyno_force::config::Profile;
use dyno_force::{ForceSensor, SharedForceSensor};
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{ErrorType, InputPin, OutputPin};

/// Counts the chip reports with nothing on the cell.
const BASELINE: i32 = 84_211;

struct Chip {
    raw: i32,
    pulses: u8,
    clock_high: bool,
}

type SharedChip = Rc<RefCell<Chip>>;

struct SckPin(SharedChip);
struct DtPin(SharedChip);

impl ErrorType for SckPin {
    type Error = Infallible;
}

impl OutputPin for SckPin {
    fn set_high(&mut self) -> Result<(), Self::Error> {
        let mut chip = self.0.borrow_mut();
        chip.clock_high = true;
        chip.pulses = chip.pulses.saturating_add(1);
        Ok(())
    }

    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.0.borrow_mut().clock_high = false;
        Ok(())
    }
}

impl ErrorType for DtPin {
    type Error = Infallible;
}

impl InputPin for DtPin {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        let mut chip = self.0.borrow_mut();
        if chip.clock_high {
            // shifting out, MSB first
            let bit = u32::from(chip.pulses) - 1;
            return Ok(bit < 24 && (chip.raw as u32 >> (23 - bit)) & 1 == 1);
        }
        // a new conversion is ready once the last frame has been clocked out
        if chip.pulses >= 25 {
            chip.pulses = 0;
        }
        Ok(false)
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        self.is_high().map(|high| !high)
    }
}

struct HostDelay;

impl DelayNs for HostDelay {
    fn delay_ns(&mut self, ns: u32) {
        std::thread::sleep(Duration::from_nanos(u64::from(ns)));
    }
}

/// Thrust in counts at `step` of a triangular burn profile.
fn burn_counts(step: i32) -> i32 {
    let peak = 40;
    -140 * (peak - (step - peak).abs()).max(0)
}

fn main() {
    let config = Profile::Bench.config();
    if let Err(e) = config.validate() {
        println!("Bad configuration: {e}");
        return;
    }

    let chip = Rc::new(RefCell::new(Chip {
        raw: BASELINE,
        pulses: 0,
        clock_high: false,
    }));
    let dt = DtPin(Rc::clone(&chip));
    let sck = SckPin(Rc::clone(&chip));
    println!(
        "HX711 on DT=GPIO{} SCK=GPIO{}",
        config.pins.adc_dt, config.pins.adc_sck
    );

    // the cell must be unloaded here
    let load_sensor = match ForceSensor::on_pins(dt, sck, HostDelay, &config.sensor) {
        Ok(sensor) => sensor,
        Err(e) => {
            println!("Force sensor failed to initialize: {e}");
            return;
        }
    };
    println!("Zero offset = {}", load_sensor.zero_offset());

    let shared = SharedForceSensor::new();
    shared.install(load_sensor);

    for step in 0..=80 {
        chip.borrow_mut().raw = BASELINE + burn_counts(step);
        match shared.read_force() {
            Ok(force) => println!("t={:>3} force = {:8.3}", step, force),
            Err(e) => println!("t={:>3} read failed: {e}", step),
        }
        std::thread::sleep(Duration::from_millis(5));
    }
}
