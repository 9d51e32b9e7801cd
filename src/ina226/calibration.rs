//! Range calibration and unit conversion
//!
//! The device multiplies raw shunt-voltage readings by the value programmed
//! into its calibration register to produce current and power readings
//! directly. [`Calibration`] derives that register value, together with the
//! scale factors needed to convert the raw readings back to amps and watts,
//! from the shunt resistance and the largest current the caller expects to
//! measure.

use defmt::Format;
use micromath::F32Ext;

/// Bus voltage ceiling of the part family, in volts
pub const MAX_BUS_VOLTAGE: f32 = 36.0;
/// Shunt voltage ceiling of the part family, in volts
pub const MAX_SHUNT_VOLTAGE: f32 = 0.08192;
/// Bus voltage register scale, in volts per bit
pub const BUS_VOLTAGE_LSB: f32 = 0.00125;
/// Shunt voltage register scale, in volts per bit
pub const SHUNT_VOLTAGE_LSB: f32 = 0.0000025;

/// Current scale quantization step, in amps per bit
///
/// The calibration register is a coarse fixed-point format, so the current
/// scale is quantized. Rounding up (never down) guarantees the configured
/// range covers the requested maximum current.
const CURRENT_LSB_STEP: f32 = 0.0001;

/// Fixed scaling constant from the device's calibration formula
const CALIBRATION_SCALE: f32 = 0.00512;

/// Largest positive reading of a 16-bit register
const FULL_SCALE: f32 = 32767.0;

/// Power register scale is a fixed multiple of the current scale
const POWER_LSB_FACTOR: f32 = 25.0;

/// Derived scaling constants for one shunt/range combination
///
/// Computed once per [`calibrate`](super::Ina226::calibrate) call and reused
/// by every subsequent read. Inputs must be positive and sane; degenerate
/// values (e.g. a near-zero shunt) overflow the 16-bit register value and are
/// the caller's responsibility.
#[derive(Clone, Copy, Debug, PartialEq, Format)]
pub struct Calibration {
    /// Current register scale, in amps per bit; always a positive multiple
    /// of 0.0001
    pub current_lsb: f32,
    /// Power register scale, in watts per bit
    pub power_lsb: f32,
    /// Shunt resistance, in ohms
    pub r_shunt: f32,
    /// Value for the device's calibration register
    pub register_value: u16,
}

impl Calibration {
    /// Derive calibration for `r_shunt` ohms, measuring up to
    /// `max_expected_current` amps
    pub fn new(r_shunt: f32, max_expected_current: f32) -> Self {
        let minimum_lsb = max_expected_current / FULL_SCALE;
        // Quantize up to the next step so the range never falls short
        let current_lsb = F32Ext::ceil(minimum_lsb / CURRENT_LSB_STEP) * CURRENT_LSB_STEP;
        let power_lsb = POWER_LSB_FACTOR * current_lsb;
        let register_value = F32Ext::round(CALIBRATION_SCALE / (current_lsb * r_shunt)) as u16;

        Self {
            current_lsb,
            power_lsb,
            r_shunt,
            register_value,
        }
    }

    /// Absolute current ceiling given the hardware shunt voltage limit
    pub fn max_possible_current(&self) -> f32 {
        MAX_SHUNT_VOLTAGE / self.r_shunt
    }

    /// Largest measurable current: the calibrated range ceiling capped by
    /// the physical ceiling
    pub fn max_current(&self) -> f32 {
        (self.current_lsb * FULL_SCALE).min(self.max_possible_current())
    }

    /// Largest shunt voltage that can occur within the measurable range
    pub fn max_shunt_voltage(&self) -> f32 {
        (self.max_current() * self.r_shunt).min(MAX_SHUNT_VOLTAGE)
    }

    /// Largest measurable power
    pub fn max_power(&self) -> f32 {
        self.max_current() * MAX_BUS_VOLTAGE
    }

    /// Convert a raw current register reading to amps
    pub fn current(&self, raw: i16) -> f32 {
        raw as f32 * self.current_lsb
    }

    /// Convert a raw power register reading to watts
    pub fn power(&self, raw: i16) -> f32 {
        raw as f32 * self.power_lsb
    }
}
