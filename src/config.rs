//! Test stand configuration.
//!
//! The stand has been built in two configurations: a bench rig used while
//! bringing up the hardware (verbose logging, silent, one raw data file) and
//! a field rig (audible status, a raw data file plus a processed force
//! profile). Both share the same wiring. Each is exposed as a [`Profile`];
//! every flag and filename can be overridden on top of either.

use core::time::Duration;

use heapless::String;

use crate::error::ConfigError;
use crate::hx711::{GainMode, DEFAULT_READY_TIMEOUT_US};

pub const PATH_CAPACITY: usize = 32;

/// Bounded file path on the stand's storage card.
pub type Path = String<PATH_CAPACITY>;

/// Counts per force unit of the stand's load cell, from its last calibration.
pub const CALIBRATION_FACTOR: f32 = -139.944621;

pub const TARE_SAMPLES: u16 = 10;

const BENCH_DATA_FILE: &str = "/dyno.csv";
/// Placeholder path; the field rig's header with its real paths is not available.
const FIELD_DATA_FILE: &str = "/data.csv";
/// Placeholder path, like [`FIELD_DATA_FILE`].
const FIELD_PROFILE_FILE: &str = "/profile.csv";

const _: () = assert!(BENCH_DATA_FILE.len() <= PATH_CAPACITY);
const _: () = assert!(FIELD_DATA_FILE.len() <= PATH_CAPACITY);
const _: () = assert!(FIELD_PROFILE_FILE.len() <= PATH_CAPACITY);

/// GPIO assignments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PinMap {
    /// Status LED
    pub led: u8,
    pub speaker: u8,
    /// Storage card chip select
    pub cs: u8,
    /// Control button
    pub button: u8,
    /// Igniter output
    pub pyro: u8,
    /// HX711 data out
    pub adc_dt: u8,
    /// HX711 serial clock
    pub adc_sck: u8,
}

impl PinMap {
    pub const fn stand() -> Self {
        Self {
            led: 17,
            speaker: 14,
            cs: 16,
            button: 21,
            pyro: 32,
            adc_dt: 15,
            adc_sck: 33,
        }
    }

    fn assignments(&self) -> [u8; 7] {
        [
            self.led,
            self.speaker,
            self.cs,
            self.button,
            self.pyro,
            self.adc_dt,
            self.adc_sck,
        ]
    }

    /// Every function must own its GPIO exclusively.
    pub fn check_distinct(&self) -> Result<(), ConfigError> {
        let pins = self.assignments();
        for (i, pin) in pins.iter().enumerate() {
            if pins[i + 1..].contains(pin) {
                return Err(ConfigError::PinConflict(*pin));
            }
        }
        Ok(())
    }
}

impl Default for PinMap {
    fn default() -> Self {
        Self::stand()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Features {
    /// Verbose diagnostic logging
    pub debug: bool,
    /// Audible status feedback
    pub speaker_enable: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Files {
    /// Raw run data (CSV)
    pub data: Path,
    /// Processed force profile, if the rig writes one
    pub profile: Option<Path>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Timing {
    pub countdown_s: u32,
    pub test_duration_s: u32,
    pub pyro_duration_ms: u32,
}

impl Timing {
    pub fn countdown(&self) -> Duration {
        Duration::from_secs(u64::from(self.countdown_s))
    }

    pub fn test_duration(&self) -> Duration {
        Duration::from_secs(u64::from(self.test_duration_s))
    }

    pub fn pyro_duration(&self) -> Duration {
        Duration::from_millis(u64::from(self.pyro_duration_ms))
    }
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            countdown_s: 20,
            test_duration_s: 10,
            pyro_duration_ms: 3000,
        }
    }
}

/// Load cell acquisition settings.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SensorSettings {
    /// Raw counts are divided by this to give force. Must be finite and non-zero.
    pub calibration_factor: f32,
    /// Samples averaged into the zero offset at initialization.
    pub tare_samples: u16,
    /// Samples averaged into each force reading.
    pub samples_per_reading: u16,
    /// How long to wait for the ADC to signal a conversion.
    pub ready_timeout_ms: u32,
    pub gain: GainMode,
}

impl SensorSettings {
    pub fn ready_timeout_us(&self) -> u32 {
        self.ready_timeout_ms.saturating_mul(1000)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !calibration_is_valid(self.calibration_factor) {
            return Err(ConfigError::InvalidCalibration);
        }
        if self.tare_samples == 0 || self.samples_per_reading == 0 {
            return Err(ConfigError::InvalidSampleCount);
        }
        if self.ready_timeout_ms == 0 {
            return Err(ConfigError::InvalidTimeout);
        }
        Ok(())
    }
}

impl Default for SensorSettings {
    fn default() -> Self {
        Self {
            calibration_factor: CALIBRATION_FACTOR,
            tare_samples: TARE_SAMPLES,
            samples_per_reading: 1,
            ready_timeout_ms: DEFAULT_READY_TIMEOUT_US / 1000,
            gain: GainMode::A128,
        }
    }
}

pub(crate) fn calibration_is_valid(factor: f32) -> bool {
    factor.is_finite() && factor != 0.0
}

/// Named build profiles of the stand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Profile {
    /// Bring-up rig: debug logging, speaker off, raw data only.
    Bench,
    /// Field rig: speaker on, raw data and force profile.
    Field,
}

impl Profile {
    pub fn config(self) -> StandConfig {
        match self {
            Profile::Bench => StandConfig {
                pins: PinMap::stand(),
                features: Features {
                    debug: true,
                    speaker_enable: false,
                },
                files: Files {
                    data: Path::try_from(BENCH_DATA_FILE).unwrap_or_default(),
                    profile: None,
                },
                timing: Timing::default(),
                sensor: SensorSettings::default(),
            },
            Profile::Field => StandConfig {
                pins: PinMap::stand(),
                features: Features {
                    debug: false,
                    speaker_enable: true,
                },
                files: Files {
                    data: Path::try_from(FIELD_DATA_FILE).unwrap_or_default(),
                    profile: Path::try_from(FIELD_PROFILE_FILE).ok(),
                },
                timing: Timing::default(),
                sensor: SensorSettings::default(),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StandConfig {
    pub pins: PinMap,
    pub features: Features,
    pub files: Files,
    pub timing: Timing,
    pub sensor: SensorSettings,
}

impl StandConfig {
    pub fn with_debug(mut self, enabled: bool) -> Self {
        self.features.debug = enabled;
        self
    }

    pub fn with_speaker(mut self, enabled: bool) -> Self {
        self.features.speaker_enable = enabled;
        self
    }

    pub fn with_data_file(mut self, path: &str) -> Result<Self, ConfigError> {
        self.files.data = to_path(path)?;
        Ok(self)
    }

    /// `None` stops the rig writing a force profile.
    pub fn with_profile_file(mut self, path: Option<&str>) -> Result<Self, ConfigError> {
        self.files.profile = path.map(to_path).transpose()?;
        Ok(self)
    }

    pub fn with_calibration_factor(mut self, factor: f32) -> Self {
        self.sensor.calibration_factor = factor;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.pins.check_distinct()?;
        self.sensor.validate()
    }

    /// Maximum log level the application should install.
    pub fn log_level(&self) -> log::LevelFilter {
        if self.features.debug {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Info
        }
    }
}

impl Default for StandConfig {
    fn default() -> Self {
        Profile::Bench.config()
    }
}

fn to_path(path: &str) -> Result<Path, ConfigError> {
    Path::try_from(path).map_err(|_| ConfigError::PathTooLong)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profiles_share_wiring() {
        let bench = Profile::Bench.config();
        let field = Profile::Field.config();
        assert_eq!(bench.pins, field.pins);
        assert_eq!(bench.pins.adc_dt, 15);
        assert_eq!(bench.pins.adc_sck, 33);
        assert_eq!(bench.pins.pyro, 32);
        assert_eq!(bench.timing, field.timing);
        assert_eq!(bench.sensor, field.sensor);
    }

    #[test]
    fn profiles_differ_in_flags_and_files() {
        let bench = Profile::Bench.config();
        assert!(bench.features.debug);
        assert!(!bench.features.speaker_enable);
        assert_eq!(bench.files.data.as_str(), "/dyno.csv");
        assert!(bench.files.profile.is_none());

        let field = Profile::Field.config();
        assert!(!field.features.debug);
        assert!(field.features.speaker_enable);
        assert_eq!(field.files.data.as_str(), "/data.csv");
        assert_eq!(field.files.profile.as_deref(), Some("/profile.csv"));
    }

    #[test]
    fn flags_are_independent() {
        let both = Profile::Bench.config().with_speaker(true);
        assert!(both.features.debug && both.features.speaker_enable);

        let neither = Profile::Field.config().with_speaker(false);
        assert!(!neither.features.debug && !neither.features.speaker_enable);

        let debug_field = Profile::Field.config().with_debug(true);
        assert!(debug_field.features.speaker_enable);
        assert_eq!(debug_field.files, Profile::Field.config().files);
    }

    #[test]
    fn filenames_are_independent_of_flags() {
        let config = Profile::Bench
            .config()
            .with_profile_file(Some("/run1_profile.csv"))
            .unwrap()
            .with_data_file("/run1.csv")
            .unwrap();
        assert!(config.features.debug);
        assert_eq!(config.files.data.as_str(), "/run1.csv");
        assert_eq!(config.files.profile.as_deref(), Some("/run1_profile.csv"));

        let config = Profile::Field.config().with_profile_file(None).unwrap();
        assert!(config.files.profile.is_none());
        assert!(config.features.speaker_enable);
    }

    #[test]
    fn rejects_long_paths() {
        let long = "/a/very/long/path/that/does/not/fit.csv";
        assert!(long.len() > PATH_CAPACITY);
        assert_eq!(
            Profile::Bench.config().with_data_file(long),
            Err(ConfigError::PathTooLong)
        );
    }

    #[test]
    fn default_config_is_valid() {
        assert_eq!(StandConfig::default().validate(), Ok(()));
        assert_eq!(Profile::Field.config().validate(), Ok(()));
    }

    #[test]
    fn rejects_unusable_calibration() {
        for factor in [0.0, -0.0, f32::NAN, f32::INFINITY] {
            let config = StandConfig::default().with_calibration_factor(factor);
            assert_eq!(config.validate(), Err(ConfigError::InvalidCalibration));
        }
    }

    #[test]
    fn rejects_shared_pins() {
        let mut config = StandConfig::default();
        config.pins.pyro = config.pins.led;
        assert_eq!(config.validate(), Err(ConfigError::PinConflict(17)));
    }

    #[test]
    fn rejects_zero_samples_and_timeout() {
        let mut config = StandConfig::default();
        config.sensor.tare_samples = 0;
        assert_eq!(config.validate(), Err(ConfigError::InvalidSampleCount));

        let mut config = StandConfig::default();
        config.sensor.ready_timeout_ms = 0;
        assert_eq!(config.validate(), Err(ConfigError::InvalidTimeout));
    }

    #[test]
    fn timing_durations() {
        let timing = Timing::default();
        assert_eq!(timing.countdown(), Duration::from_secs(20));
        assert_eq!(timing.test_duration(), Duration::from_secs(10));
        assert_eq!(timing.pyro_duration(), Duration::from_millis(3000));
        assert!(timing.pyro_duration() < timing.test_duration());
    }

    #[test]
    fn debug_flag_selects_log_level() {
        assert_eq!(StandConfig::default().log_level(), log::LevelFilter::Debug);
        assert_eq!(Profile::Field.config().log_level(), log::LevelFilter::Info);
    }

    #[test]
    fn ready_timeout_in_microseconds() {
        let settings = SensorSettings::default();
        assert_eq!(settings.ready_timeout_us(), DEFAULT_READY_TIMEOUT_US);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn serde_roundtrip() {
        let config = Profile::Field.config().with_calibration_factor(-141.5);
        let json = serde_json::to_string(&config).unwrap();
        let back: StandConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }
}
