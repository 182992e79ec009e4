//! Binary-coded decimal date and time registers
//!
//! Real-time clocks usually store the current time as seven BCD bytes:
//! second, minute, hour, weekday, day of month, month and year. Some chips
//! swap weekday and day of month, and some number the weekdays from 1
//! instead of 0. [`DateTimeCodec`] covers both variations.

use num_enum::TryFromPrimitive;
use serde::{Deserialize, Serialize};

use crate::{accessor::RegisterAccessor, Access, CodecError, ConfigError, Error};

/// Number of bytes in a date/time register
pub const DATE_TIME_LEN: usize = 7;

/// The clock-halt/oscillator-stop flag many chips keep in the seconds byte
pub const SECONDS_FLAG: u8 = 0x80;

const SECOND_MASK: u8 = 0x7f;
const MINUTE_MASK: u8 = 0x7f;
const HOUR_MASK: u8 = 0x3f;
const DAY_MASK: u8 = 0x3f;
const WEEKDAY_MASK: u8 = 0x07;
const MONTH_MASK: u8 = 0x1f;

/// Converts a packed BCD byte to its binary value
///
/// `0x59` becomes `59`.
pub fn bcd_to_binary(bcd: u8) -> u8 {
    bcd.wrapping_sub(6u8.wrapping_mul(bcd >> 4))
}

/// Converts a binary value below 100 to packed BCD
///
/// `59` becomes `0x59`.
pub fn binary_to_bcd(value: u8) -> u8 {
    value.wrapping_add(6u8.wrapping_mul(value / 10))
}

/// Day of the week, starting on Monday
#[derive(Copy, Clone, Debug, Eq, PartialEq, TryFromPrimitive, Serialize, Deserialize)]
#[repr(u8)]
pub enum Weekday {
    /// Monday
    Monday = 0,
    /// Tuesday
    Tuesday = 1,
    /// Wednesday
    Wednesday = 2,
    /// Thursday
    Thursday = 3,
    /// Friday
    Friday = 4,
    /// Saturday
    Saturday = 5,
    /// Sunday
    Sunday = 6,
}

impl Weekday {
    /// Decodes a weekday, as numbered by a device that starts at `start`
    pub(crate) fn from_raw(raw: u8, start: u8) -> Result<Self, CodecError> {
        raw.checked_sub(start)
            .and_then(|index| Weekday::try_from_primitive(index).ok())
            .ok_or(CodecError::InvalidWeekday(raw))
    }

    /// Encodes the weekday for a device whose numbering starts at `start`
    pub(crate) fn to_raw(self, start: u8) -> u8 {
        self as u8 + start
    }
}

/// A calendar date and time of day
///
/// Only the years 2000 to 2099 can be stored in a register.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct DateTime {
    /// Year, from 2000 to 2099
    pub year: u16,
    /// Month, from 1 to 12
    pub month: u8,
    /// Day of the month, from 1 to 31
    pub day: u8,
    /// Day of the week
    pub weekday: Weekday,
    /// Hour, from 0 to 23
    pub hour: u8,
    /// Minute, from 0 to 59
    pub minute: u8,
    /// Second, from 0 to 59
    pub second: u8,
}

/// Converts between [`DateTime`] and the 7-byte BCD register layout
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct DateTimeCodec {
    weekday_first: bool,
    weekday_start: u8,
    preserve_seconds_flag: bool,
}

impl DateTimeCodec {
    /// Create a new codec
    ///
    /// With `weekday_first`, the weekday byte precedes the day of month.
    /// `weekday_start` is the raw value the device uses for Monday, and must
    /// be `0` or `1`.
    pub fn new(weekday_first: bool, weekday_start: u8) -> Result<Self, ConfigError> {
        if weekday_start > 1 {
            return Err(ConfigError::WeekdayStart(weekday_start));
        }

        Ok(DateTimeCodec {
            weekday_first,
            weekday_start,
            preserve_seconds_flag: false,
        })
    }

    /// Keep bit 7 of the seconds byte when writing through a register
    ///
    /// By default, encoding clears the bit.
    pub fn preserve_seconds_flag(mut self, preserve: bool) -> Self {
        self.preserve_seconds_flag = preserve;
        self
    }

    /// Whether [`DateTimeRegister::set`] keeps the seconds flag
    pub fn preserves_seconds_flag(&self) -> bool {
        self.preserve_seconds_flag
    }

    fn weekday_index(&self) -> usize {
        if self.weekday_first {
            3
        } else {
            4
        }
    }

    fn day_index(&self) -> usize {
        if self.weekday_first {
            4
        } else {
            3
        }
    }

    /// Decodes the raw register bytes
    ///
    /// Flag bits next to the BCD digits are ignored.
    pub fn decode(&self, bytes: &[u8; DATE_TIME_LEN]) -> Result<DateTime, CodecError> {
        let raw_weekday = bcd_to_binary(bytes[self.weekday_index()] & WEEKDAY_MASK);

        Ok(DateTime {
            year: 2000 + bcd_to_binary(bytes[6]) as u16,
            month: bcd_to_binary(bytes[5] & MONTH_MASK),
            day: bcd_to_binary(bytes[self.day_index()] & DAY_MASK),
            weekday: Weekday::from_raw(raw_weekday, self.weekday_start)?,
            hour: bcd_to_binary(bytes[2] & HOUR_MASK),
            minute: bcd_to_binary(bytes[1] & MINUTE_MASK),
            second: bcd_to_binary(bytes[0] & SECOND_MASK),
        })
    }

    /// Encodes a date and time into raw register bytes
    ///
    /// The seconds flag is always cleared. Fails, if any component is outside
    /// of its calendar range.
    pub fn encode(&self, date_time: &DateTime) -> Result<[u8; DATE_TIME_LEN], CodecError> {
        let valid = (2000..=2099).contains(&date_time.year)
            && (1..=12).contains(&date_time.month)
            && (1..=31).contains(&date_time.day)
            && date_time.hour < 24
            && date_time.minute < 60
            && date_time.second < 60;
        if !valid {
            return Err(CodecError::ValueOutOfRange);
        }

        let mut bytes = [0; DATE_TIME_LEN];
        bytes[0] = binary_to_bcd(date_time.second) & SECOND_MASK;
        bytes[1] = binary_to_bcd(date_time.minute);
        bytes[2] = binary_to_bcd(date_time.hour);
        bytes[self.weekday_index()] =
            binary_to_bcd(date_time.weekday.to_raw(self.weekday_start));
        bytes[self.day_index()] = binary_to_bcd(date_time.day);
        bytes[5] = binary_to_bcd(date_time.month);
        bytes[6] = binary_to_bcd((date_time.year - 2000) as u8);

        Ok(bytes)
    }
}

impl Default for DateTimeCodec {
    /// Weekday before day of month, Monday numbered `1`
    fn default() -> Self {
        DateTimeCodec {
            weekday_first: true,
            weekday_start: 1,
            preserve_seconds_flag: false,
        }
    }
}

/// A BCD date/time register
pub struct DateTimeRegister {
    address: u32,
    codec: DateTimeCodec,
    access: Access,
    buffer: [u8; DATE_TIME_LEN],
}

impl DateTimeRegister {
    /// Create a new date/time register at `address`
    pub fn new(address: u32, codec: DateTimeCodec, access: Access) -> Self {
        DateTimeRegister {
            address,
            codec,
            access,
            buffer: [0; DATE_TIME_LEN],
        }
    }

    /// A read-write date/time register
    pub fn rw(address: u32, codec: DateTimeCodec) -> Self {
        Self::new(address, codec, Access::ReadWrite)
    }

    /// The address of the seconds byte
    pub fn address(&self) -> u32 {
        self.address
    }

    /// The codec in use
    pub fn codec(&self) -> &DateTimeCodec {
        &self.codec
    }

    /// Reads the current date and time
    pub fn get<A>(&mut self, accessor: &mut A) -> Result<DateTime, Error<A::Error>>
    where
        A: RegisterAccessor,
    {
        accessor.read_register(self.address, &mut self.buffer)?;

        Ok(self.codec.decode(&self.buffer)?)
    }

    /// Writes a new date and time
    ///
    /// If the codec preserves the seconds flag, the seconds byte is read
    /// first, so the write doesn't change the flag.
    pub fn set<A>(&mut self, accessor: &mut A, date_time: &DateTime) -> Result<(), Error<A::Error>>
    where
        A: RegisterAccessor,
    {
        self.access.ensure_writable()?;
        self.buffer = self.codec.encode(date_time)?;

        if self.codec.preserve_seconds_flag {
            let mut seconds = [0];
            accessor.read_register(self.address, &mut seconds)?;
            self.buffer[0] |= seconds[0] & SECONDS_FLAG;
        }

        accessor.write_register(self.address, &self.buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::Registers;

    fn sample() -> DateTime {
        DateTime {
            year: 2024,
            month: 2,
            day: 29,
            weekday: Weekday::Thursday,
            hour: 23,
            minute: 59,
            second: 58,
        }
    }

    #[test]
    fn bcd_conversion() {
        for value in 0..100 {
            assert_eq!(bcd_to_binary(binary_to_bcd(value)), value);
        }

        assert_eq!(binary_to_bcd(59), 0x59);
        assert_eq!(bcd_to_binary(0x31), 31);
    }

    #[test]
    fn encode_weekday_first() {
        let codec = DateTimeCodec::default();

        let bytes = codec.encode(&sample()).unwrap();

        assert_eq!(bytes, [0x58, 0x59, 0x23, 0x04, 0x29, 0x02, 0x24]);
        assert_eq!(codec.decode(&bytes).unwrap(), sample());
    }

    #[test]
    fn encode_day_first_zero_based() {
        let codec = DateTimeCodec::new(false, 0).unwrap();

        let bytes = codec.encode(&sample()).unwrap();

        assert_eq!(bytes, [0x58, 0x59, 0x23, 0x29, 0x03, 0x02, 0x24]);
        assert_eq!(codec.decode(&bytes).unwrap(), sample());
    }

    #[test]
    fn decode_ignores_flag_bits() {
        let codec = DateTimeCodec::default();

        let bytes = [0x80 | 0x12, 0x34, 0x40 | 0x08, 0x07, 0x01, 0x80 | 0x12, 0x99];

        assert_eq!(
            codec.decode(&bytes).unwrap(),
            DateTime {
                year: 2099,
                month: 12,
                day: 1,
                weekday: Weekday::Sunday,
                hour: 8,
                minute: 34,
                second: 12,
            }
        );
    }

    #[test]
    fn invalid_weekdays() {
        let codec = DateTimeCodec::default();
        let mut bytes = codec.encode(&sample()).unwrap();

        bytes[3] = 0x00;
        assert_eq!(codec.decode(&bytes), Err(CodecError::InvalidWeekday(0)));

        let codec = DateTimeCodec::new(true, 0).unwrap();
        bytes[3] = 0x07;
        assert_eq!(codec.decode(&bytes), Err(CodecError::InvalidWeekday(7)));
    }

    #[test]
    fn out_of_range_components() {
        let codec = DateTimeCodec::default();

        for date_time in [
            DateTime { year: 1999, ..sample() },
            DateTime { year: 2100, ..sample() },
            DateTime { month: 13, ..sample() },
            DateTime { day: 0, ..sample() },
            DateTime { hour: 24, ..sample() },
            DateTime { second: 60, ..sample() },
        ]
        .iter()
        {
            assert_eq!(codec.encode(date_time), Err(CodecError::ValueOutOfRange));
        }
    }

    #[test]
    fn weekday_start_must_be_zero_or_one() {
        assert_eq!(DateTimeCodec::new(true, 2), Err(ConfigError::WeekdayStart(2)));
    }

    #[test]
    fn register_round_trip() {
        let mut registers = Registers::new();
        let mut clock = DateTimeRegister::rw(0x00, DateTimeCodec::default());

        clock.set(&mut registers, &sample()).unwrap();

        assert_eq!(registers.at(0x00, 7), &[0x58, 0x59, 0x23, 0x04, 0x29, 0x02, 0x24]);
        assert_eq!(clock.get(&mut registers).unwrap(), sample());
        assert_eq!(registers.writes, 1);
    }

    #[test]
    fn seconds_flag_is_cleared_by_default() {
        let mut registers = Registers::with(0x00, &[0x80]);
        let mut clock = DateTimeRegister::rw(0x00, DateTimeCodec::default());

        clock.set(&mut registers, &sample()).unwrap();

        assert_eq!(registers.memory[0x00], 0x58);
        assert_eq!(registers.reads, 0);
    }

    #[test]
    fn seconds_flag_can_be_preserved() {
        let mut registers = Registers::with(0x00, &[0x80]);
        let codec = DateTimeCodec::default().preserve_seconds_flag(true);
        let mut clock = DateTimeRegister::rw(0x00, codec);

        clock.set(&mut registers, &sample()).unwrap();
        assert_eq!(registers.memory[0x00], 0xd8);
        assert_eq!(clock.get(&mut registers).unwrap().second, 58);
    }

    #[test]
    fn read_only_register() {
        let mut registers = Registers::new();
        let mut clock = DateTimeRegister::new(0x00, DateTimeCodec::default(), Access::ReadOnly);

        assert!(matches!(
            clock.set(&mut registers, &sample()),
            Err(Error::ReadOnly)
        ));
        assert_eq!(registers.transactions(), 0);
    }

    #[test]
    fn invalid_weekday_surfaces_from_register() {
        let mut registers = Registers::with(0x00, &[0x00, 0x00, 0x00, 0x00, 0x01, 0x01, 0x00]);
        let mut clock = DateTimeRegister::rw(0x00, DateTimeCodec::default());

        assert!(matches!(
            clock.get(&mut registers),
            Err(Error::InvalidWeekday(0))
        ));
    }
}
