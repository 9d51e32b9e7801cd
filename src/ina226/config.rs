//! Configuration register encoding
//!
//! The configuration word packs four independent settings at fixed bit
//! offsets: averaging at bit 9, bus conversion time at bit 6, shunt
//! conversion time at bit 3, operating mode at bits 0-2. Packing and
//! decoding are pure functions so they can be tested without hardware.

use defmt::Format;

pub(crate) const AVG_OFFSET: u16 = 9;
pub(crate) const BUS_CT_OFFSET: u16 = 6;
pub(crate) const SHUNT_CT_OFFSET: u16 = 3;

const FIELD_MASK: u16 = 0b111;

/// Number of samples averaged into each conversion result
#[derive(Clone, Copy, Debug, PartialEq, Eq, Format)]
#[repr(u16)]
pub enum Averaging {
    X1 = 0,
    X4 = 1,
    X16 = 2,
    X64 = 3,
    X128 = 4,
    X256 = 5,
    X512 = 6,
    X1024 = 7,
}

/// Single-conversion time, shared encoding for the bus and shunt fields
#[derive(Clone, Copy, Debug, PartialEq, Eq, Format)]
#[repr(u16)]
pub enum ConversionTime {
    Us140 = 0,
    Us204 = 1,
    Us332 = 2,
    Us588 = 3,
    Us1100 = 4,
    Us2116 = 5,
    Us4156 = 6,
    Us8244 = 7,
}

/// Operating mode
#[derive(Clone, Copy, Debug, PartialEq, Eq, Format)]
#[repr(u16)]
pub enum Mode {
    PowerDown = 0,
    ShuntTriggered = 1,
    BusTriggered = 2,
    ShuntBusTriggered = 3,
    ShuntContinuous = 5,
    BusContinuous = 6,
    ShuntBusContinuous = 7,
}

/// Compose the 16-bit configuration word
pub fn pack(avg: Averaging, bus_ct: ConversionTime, shunt_ct: ConversionTime, mode: Mode) -> u16 {
    (avg as u16) << AVG_OFFSET
        | (bus_ct as u16) << BUS_CT_OFFSET
        | (shunt_ct as u16) << SHUNT_CT_OFFSET
        | mode as u16
}

impl Averaging {
    /// Decode from the low 3 bits of `bits`
    pub fn from_bits(bits: u16) -> Self {
        match bits & FIELD_MASK {
            0 => Self::X1,
            1 => Self::X4,
            2 => Self::X16,
            3 => Self::X64,
            4 => Self::X128,
            5 => Self::X256,
            6 => Self::X512,
            _ => Self::X1024,
        }
    }

    /// Averaged sample count
    pub fn samples(self) -> u16 {
        match self {
            Self::X1 => 1,
            Self::X4 => 4,
            Self::X16 => 16,
            Self::X64 => 64,
            Self::X128 => 128,
            Self::X256 => 256,
            Self::X512 => 512,
            Self::X1024 => 1024,
        }
    }
}

impl ConversionTime {
    /// Decode from the low 3 bits of `bits`
    pub fn from_bits(bits: u16) -> Self {
        match bits & FIELD_MASK {
            0 => Self::Us140,
            1 => Self::Us204,
            2 => Self::Us332,
            3 => Self::Us588,
            4 => Self::Us1100,
            5 => Self::Us2116,
            6 => Self::Us4156,
            _ => Self::Us8244,
        }
    }

    /// Conversion time in microseconds
    pub fn micros(self) -> u32 {
        match self {
            Self::Us140 => 140,
            Self::Us204 => 204,
            Self::Us332 => 332,
            Self::Us588 => 588,
            Self::Us1100 => 1100,
            Self::Us2116 => 2116,
            Self::Us4156 => 4156,
            Self::Us8244 => 8244,
        }
    }
}

impl Mode {
    /// Decode from the low 3 bits of `bits`
    ///
    /// The device has two power-down encodings (0 and 4), both decode to
    /// [`Mode::PowerDown`].
    pub fn from_bits(bits: u16) -> Self {
        match bits & FIELD_MASK {
            0 | 4 => Self::PowerDown,
            1 => Self::ShuntTriggered,
            2 => Self::BusTriggered,
            3 => Self::ShuntBusTriggered,
            5 => Self::ShuntContinuous,
            6 => Self::BusContinuous,
            _ => Self::ShuntBusContinuous,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pack_known_words() {
        assert_eq!(
            pack(
                Averaging::X4,
                ConversionTime::Us1100,
                ConversionTime::Us140,
                Mode::ShuntBusContinuous,
            ),
            0b001 << 9 | 0b100 << 6 | 0b000 << 3 | 0b111,
        );
        assert_eq!(
            pack(
                Averaging::X1024,
                ConversionTime::Us8244,
                ConversionTime::Us8244,
                Mode::PowerDown,
            ),
            0b111_111_111_000,
        );
    }

    #[test]
    fn decode_power_on_default() {
        // The device resets to 0x4127 (bit 14 is a reserved bit that reads 1)
        let word = 0x4127;
        assert_eq!(Averaging::from_bits(word >> AVG_OFFSET), Averaging::X1);
        assert_eq!(
            ConversionTime::from_bits(word >> BUS_CT_OFFSET),
            ConversionTime::Us1100
        );
        assert_eq!(
            ConversionTime::from_bits(word >> SHUNT_CT_OFFSET),
            ConversionTime::Us1100
        );
        assert_eq!(Mode::from_bits(word), Mode::ShuntBusContinuous);
    }

    #[test]
    fn pack_decode_round_trip() {
        let avg = Averaging::X128;
        let bus_ct = ConversionTime::Us588;
        let shunt_ct = ConversionTime::Us2116;
        let mode = Mode::BusTriggered;
        let word = pack(avg, bus_ct, shunt_ct, mode);
        assert_eq!(Averaging::from_bits(word >> AVG_OFFSET), avg);
        assert_eq!(ConversionTime::from_bits(word >> BUS_CT_OFFSET), bus_ct);
        assert_eq!(ConversionTime::from_bits(word >> SHUNT_CT_OFFSET), shunt_ct);
        assert_eq!(Mode::from_bits(word), mode);
    }

    #[test]
    fn alternate_power_down_encoding() {
        assert_eq!(Mode::from_bits(4), Mode::PowerDown);
    }

    #[test]
    fn conversion_time_micros() {
        assert_eq!(ConversionTime::Us140.micros(), 140);
        assert_eq!(ConversionTime::Us1100.micros(), 1100);
        assert_eq!(ConversionTime::Us8244.micros(), 8244);
    }

    #[test]
    fn averaging_sample_counts() {
        assert_eq!(Averaging::X1.samples(), 1);
        assert_eq!(Averaging::X4.samples(), 4);
        assert_eq!(Averaging::X64.samples(), 64);
        assert_eq!(Averaging::X1024.samples(), 1024);
    }
}
