//! INA226 power/current monitor driver
//!
//! Register-based driver over blocking I2C. The device measures the voltage
//! across an external shunt resistor and, once the calibration register is
//! programmed, reports current and power directly in scaled units.
//!
//! Usage follows the device's initialization order: [`Ina226::configure`]
//! first, then [`Ina226::calibrate`], then reads. Current, power and
//! limit-setting operations return [`Error::NotCalibrated`] until
//! `calibrate` has run, because their scale factors come from calibration.
//!
//! Every operation is a single synchronous request/response exchange; there
//! are no retries and no read-back verification of writes. The driver owns
//! its bus handle, so sharing one device between contexts requires external
//! serialization.

pub mod calibration;
pub mod config;
pub mod regs;

use embedded_hal::blocking::i2c;
use micromath::F32Ext;

pub use calibration::{
    Calibration, BUS_VOLTAGE_LSB, MAX_BUS_VOLTAGE, MAX_SHUNT_VOLTAGE, SHUNT_VOLTAGE_LSB,
};
pub use config::{Averaging, ConversionTime, Mode};
use regs::Register;

/// Device address with both address pins tied to GND
pub const DEFAULT_ADDRESS: u8 = 0x40;

/// Driver error
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Error<E> {
    /// Bus transfer failed
    Bus(E),
    /// The operation depends on scale factors set by [`Ina226::calibrate`]
    NotCalibrated,
    /// Load resistance is undefined while no current flows
    ZeroCurrent,
}

impl<E> From<E> for Error<E> {
    fn from(err: E) -> Self {
        Error::Bus(err)
    }
}

/// INA226 on a blocking I2C bus
pub struct Ina226<I2C> {
    i2c: I2C,
    address: u8,
    calibration: Option<Calibration>,
}

impl<I2C, E> Ina226<I2C>
where
    I2C: i2c::Write<Error = E> + i2c::WriteRead<Error = E>,
{
    /// Create the driver for the device at the given 7-bit address
    pub fn new(i2c: I2C, address: u8) -> Self {
        Self {
            i2c,
            address,
            calibration: None,
        }
    }

    /// Destroy the driver and release the bus handle
    pub fn release(self) -> I2C {
        self.i2c
    }

    /// Write the configuration register
    ///
    /// No read-back verification is performed; a device that silently drops
    /// the write stays unconfigured.
    pub fn configure(
        &mut self,
        avg: Averaging,
        bus_ct: ConversionTime,
        shunt_ct: ConversionTime,
        mode: Mode,
    ) -> Result<(), Error<E>> {
        self.write_register(Register::Config, config::pack(avg, bus_ct, shunt_ct, mode))
    }

    /// Derive scale factors for `r_shunt` ohms and up to
    /// `max_expected_current` amps, and program the calibration register
    ///
    /// Both inputs must be positive; degenerate values are not validated
    /// (see [`Calibration`]). May be called again to re-range the device.
    pub fn calibrate(&mut self, r_shunt: f32, max_expected_current: f32) -> Result<(), Error<E>> {
        let cal = Calibration::new(r_shunt, max_expected_current);
        self.write_register(Register::Calibration, cal.register_value)?;
        self.calibration = Some(cal);
        Ok(())
    }

    /// Scale factors from the last [`Self::calibrate`] call, if any
    pub fn calibration(&self) -> Option<&Calibration> {
        self.calibration.as_ref()
    }

    fn calibrated(&self) -> Result<&Calibration, Error<E>> {
        self.calibration.as_ref().ok_or(Error::NotCalibrated)
    }

    /// Current ceiling implied by the shunt voltage limit, in amps
    pub fn max_possible_current(&self) -> Result<f32, Error<E>> {
        Ok(self.calibrated()?.max_possible_current())
    }

    /// Largest measurable current, in amps
    pub fn max_current(&self) -> Result<f32, Error<E>> {
        Ok(self.calibrated()?.max_current())
    }

    /// Largest shunt voltage within the measurable range, in volts
    pub fn max_shunt_voltage(&self) -> Result<f32, Error<E>> {
        Ok(self.calibrated()?.max_shunt_voltage())
    }

    /// Largest measurable power, in watts
    pub fn max_power(&self) -> Result<f32, Error<E>> {
        Ok(self.calibrated()?.max_power())
    }

    /// Shunt voltage in volts
    pub fn read_shunt_voltage(&mut self) -> Result<f32, Error<E>> {
        let raw = self.read_register(Register::ShuntVoltage)? as i16;
        Ok(raw as f32 * SHUNT_VOLTAGE_LSB)
    }

    /// Bus voltage in volts
    pub fn read_bus_voltage(&mut self) -> Result<f32, Error<E>> {
        let raw = self.read_register(Register::BusVoltage)? as i16;
        Ok(raw as f32 * BUS_VOLTAGE_LSB)
    }

    /// Shunt current in amps
    pub fn read_shunt_current(&mut self) -> Result<f32, Error<E>> {
        let cal = *self.calibrated()?;
        let raw = self.read_register(Register::Current)? as i16;
        Ok(cal.current(raw))
    }

    /// Bus power in watts
    pub fn read_bus_power(&mut self) -> Result<f32, Error<E>> {
        let cal = *self.calibrated()?;
        let raw = self.read_register(Register::Power)? as i16;
        Ok(cal.power(raw))
    }

    /// Load resistance in ohms, from bus voltage and shunt current
    ///
    /// Fails with [`Error::ZeroCurrent`] when no current flows instead of
    /// returning infinity or NaN.
    pub fn read_load_resistance(&mut self) -> Result<f32, Error<E>> {
        let voltage = self.read_bus_voltage()?;
        let current = self.read_shunt_current()?;
        if current == 0.0 {
            return Err(Error::ZeroCurrent);
        }
        Ok(voltage / current)
    }

    /// Averaging setting read back from the configuration register
    pub fn averaging(&mut self) -> Result<Averaging, Error<E>> {
        let word = self.read_register(Register::Config)?;
        Ok(Averaging::from_bits(word >> config::AVG_OFFSET))
    }

    /// Bus conversion time read back from the configuration register
    pub fn bus_conversion_time(&mut self) -> Result<ConversionTime, Error<E>> {
        let word = self.read_register(Register::Config)?;
        Ok(ConversionTime::from_bits(word >> config::BUS_CT_OFFSET))
    }

    /// Shunt conversion time read back from the configuration register
    pub fn shunt_conversion_time(&mut self) -> Result<ConversionTime, Error<E>> {
        let word = self.read_register(Register::Config)?;
        Ok(ConversionTime::from_bits(word >> config::SHUNT_CT_OFFSET))
    }

    /// Operating mode read back from the configuration register
    pub fn mode(&mut self) -> Result<Mode, Error<E>> {
        let word = self.read_register(Register::Config)?;
        Ok(Mode::from_bits(word))
    }

    /// Set the alert limit as a bus voltage threshold, in volts
    pub fn set_bus_voltage_limit(&mut self, volts: f32) -> Result<(), Error<E>> {
        let counts = F32Ext::round(volts / BUS_VOLTAGE_LSB) as u16;
        self.write_register(Register::AlertLimit, counts)
    }

    /// Set the alert limit as a shunt voltage threshold, in volts
    pub fn set_shunt_voltage_limit(&mut self, volts: f32) -> Result<(), Error<E>> {
        let counts = F32Ext::round(volts / SHUNT_VOLTAGE_LSB) as u16;
        self.write_register(Register::AlertLimit, counts)
    }

    /// Set the alert limit as a power threshold, in watts
    pub fn set_power_limit(&mut self, watts: f32) -> Result<(), Error<E>> {
        let cal = *self.calibrated()?;
        let counts = F32Ext::round(watts / cal.power_lsb) as u16;
        self.write_register(Register::AlertLimit, counts)
    }

    /// Raw mask/enable register
    pub fn mask_enable(&mut self) -> Result<u16, Error<E>> {
        self.read_register(Register::MaskEnable)
    }

    /// Overwrite the mask/enable register
    pub fn set_mask_enable(&mut self, mask: u16) -> Result<(), Error<E>> {
        self.write_register(Register::MaskEnable, mask)
    }

    /// Alert when shunt voltage exceeds the alert limit
    ///
    /// Each `enable_*_alert` overwrites the whole mask/enable register, so
    /// the previously selected alert source is cleared. Compose bits through
    /// [`Self::set_mask_enable`] to combine sources.
    pub fn enable_shunt_over_limit_alert(&mut self) -> Result<(), Error<E>> {
        self.set_mask_enable(regs::mask::SHUNT_OVER_LIMIT)
    }

    /// Alert when shunt voltage drops below the alert limit
    pub fn enable_shunt_under_limit_alert(&mut self) -> Result<(), Error<E>> {
        self.set_mask_enable(regs::mask::SHUNT_UNDER_LIMIT)
    }

    /// Alert when bus voltage exceeds the alert limit
    pub fn enable_bus_over_limit_alert(&mut self) -> Result<(), Error<E>> {
        self.set_mask_enable(regs::mask::BUS_OVER_LIMIT)
    }

    /// Alert when bus voltage drops below the alert limit
    pub fn enable_bus_under_limit_alert(&mut self) -> Result<(), Error<E>> {
        self.set_mask_enable(regs::mask::BUS_UNDER_LIMIT)
    }

    /// Alert when power exceeds the alert limit
    pub fn enable_over_power_limit_alert(&mut self) -> Result<(), Error<E>> {
        self.set_mask_enable(regs::mask::OVER_POWER_LIMIT)
    }

    /// Alert on conversion ready
    pub fn enable_conversion_ready_alert(&mut self) -> Result<(), Error<E>> {
        self.set_mask_enable(regs::mask::CONVERSION_READY)
    }

    /// Invert the polarity of the alert pin (read-modify-write)
    pub fn set_alert_inverted_polarity(&mut self, inverted: bool) -> Result<(), Error<E>> {
        self.modify_mask_enable(regs::mask::ALERT_POLARITY, inverted)
    }

    /// Latch the alert pin until the mask/enable register is read
    /// (read-modify-write)
    pub fn set_alert_latch(&mut self, latch: bool) -> Result<(), Error<E>> {
        self.modify_mask_enable(regs::mask::ALERT_LATCH_ENABLE, latch)
    }

    fn modify_mask_enable(&mut self, bit: u16, set: bool) -> Result<(), Error<E>> {
        let mut value = self.mask_enable()?;
        if set {
            value |= bit;
        } else {
            value &= !bit;
        }
        self.set_mask_enable(value)
    }

    /// Whether the internal current/power computation overflowed
    pub fn is_math_overflow(&mut self) -> Result<bool, Error<E>> {
        Ok(self.mask_enable()? & regs::mask::MATH_OVERFLOW_FLAG != 0)
    }

    /// Whether the alert function has triggered
    pub fn is_alert(&mut self) -> Result<bool, Error<E>> {
        Ok(self.mask_enable()? & regs::mask::ALERT_FUNCTION_FLAG != 0)
    }

    /// Manufacturer ID register (0x5449 on a genuine part)
    pub fn manufacturer_id(&mut self) -> Result<u16, Error<E>> {
        self.read_register(Register::ManufacturerId)
    }

    /// Die ID register (0x2260 for the INA226)
    pub fn die_id(&mut self) -> Result<u16, Error<E>> {
        self.read_register(Register::DieId)
    }

    /// Read a register: one address byte out, two value bytes back
    /// (big-endian)
    pub fn read_register(&mut self, reg: Register) -> Result<u16, Error<E>> {
        let mut buf = [0u8; 2];
        self.i2c.write_read(self.address, &[reg.addr()], &mut buf)?;
        Ok(u16::from_be_bytes(buf))
    }

    /// Write a register as a 3-byte frame: address, value high byte, value
    /// low byte
    pub fn write_register(&mut self, reg: Register, value: u16) -> Result<(), Error<E>> {
        let [high, low] = value.to_be_bytes();
        self.i2c.write(self.address, &[reg.addr(), high, low])?;
        Ok(())
    }
}

#[cfg(test)]
mod mock {
    use core::convert::Infallible;
    use embedded_hal::blocking::i2c;
    use std::collections::HashMap;
    use std::vec::Vec;

    /// Register-backed bus mock recording every write frame
    #[derive(Default)]
    pub struct Bus {
        regs: HashMap<u8, u16>,
        pub frames: Vec<Vec<u8>>,
    }

    impl Bus {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_register(mut self, reg: u8, value: u16) -> Self {
            self.regs.insert(reg, value);
            self
        }
    }

    impl i2c::Write for Bus {
        type Error = Infallible;

        fn write(&mut self, _addr: u8, bytes: &[u8]) -> Result<(), Self::Error> {
            self.frames.push(bytes.to_vec());
            if let [reg, high, low] = *bytes {
                self.regs.insert(reg, u16::from_be_bytes([high, low]));
            }
            Ok(())
        }
    }

    impl i2c::WriteRead for Bus {
        type Error = Infallible;

        fn write_read(
            &mut self,
            _addr: u8,
            bytes: &[u8],
            buffer: &mut [u8],
        ) -> Result<(), Self::Error> {
            let value = self.regs.get(&bytes[0]).copied().unwrap_or(0);
            buffer.copy_from_slice(&value.to_be_bytes());
            Ok(())
        }
    }
}
