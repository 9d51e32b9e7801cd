//! INA226 register map

use defmt::Format;

/// Register addresses
#[derive(Clone, Copy, Debug, PartialEq, Eq, Format)]
#[repr(u8)]
pub enum Register {
    Config = 0x00,
    ShuntVoltage = 0x01,
    BusVoltage = 0x02,
    Power = 0x03,
    Current = 0x04,
    Calibration = 0x05,
    MaskEnable = 0x06,
    AlertLimit = 0x07,
    ManufacturerId = 0xFE,
    DieId = 0xFF,
}

impl Register {
    pub fn addr(self) -> u8 {
        self as u8
    }
}

/// Value of the manufacturer ID register on a genuine part ("TI")
pub const TI_MANUFACTURER_ID: u16 = 0x5449;
/// Value of the die ID register for the INA226
pub const INA226_DIE_ID: u16 = 0x2260;

/// Mask/enable register bits
pub mod mask {
    pub const SHUNT_OVER_LIMIT: u16 = 1 << 15;
    pub const SHUNT_UNDER_LIMIT: u16 = 1 << 14;
    pub const BUS_OVER_LIMIT: u16 = 1 << 13;
    pub const BUS_UNDER_LIMIT: u16 = 1 << 12;
    pub const OVER_POWER_LIMIT: u16 = 1 << 11;
    pub const CONVERSION_READY: u16 = 1 << 10;
    pub const ALERT_FUNCTION_FLAG: u16 = 1 << 4;
    pub const CONVERSION_READY_FLAG: u16 = 1 << 3;
    pub const MATH_OVERFLOW_FLAG: u16 = 1 << 2;
    pub const ALERT_POLARITY: u16 = 1 << 1;
    pub const ALERT_LATCH_ENABLE: u16 = 1 << 0;
}
