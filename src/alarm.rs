//! Binary-coded decimal alarm registers
//!
//! An alarm register looks like a truncated date/time register in which
//! every byte can be switched off. A byte with bit 7 set doesn't take part in
//! the comparison. Which fields are switched on determines how often the
//! alarm fires (see [`AlarmFrequency`]).
//!
//! Chips differ in whether the alarm has a seconds byte, and in whether
//! weekday and day of month share one byte. In the shared byte, bit 6 selects
//! the weekday.

use serde::{Deserialize, Serialize};

use crate::{
    accessor::RegisterAccessor,
    bcd::{bcd_to_binary, binary_to_bcd, DateTime, Weekday},
    Access, CodecError, ConfigError, Error,
};

/// The largest alarm register, in bytes
pub const MAX_ALARM_LEN: usize = 5;

/// Marks an alarm byte as disabled
pub const DISABLED: u8 = 0x80;

/// Selects the weekday in a shared day/weekday byte
pub const WEEKDAY_FLAG: u8 = 0x40;

const SECOND_MASK: u8 = 0x7f;
const MINUTE_MASK: u8 = 0x7f;
const HOUR_MASK: u8 = 0x3f;
const DAY_MASK: u8 = 0x3f;
const WEEKDAY_MASK: u8 = 0x0f;

/// How often an alarm fires
#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum AlarmFrequency {
    /// Every second
    Secondly,
    /// Once a minute, when the second matches
    Minutely,
    /// Once an hour, when minute and second match
    Hourly,
    /// Once a day, when the time of day matches
    Daily,
    /// Once a week, when weekday and time of day match
    Weekly,
    /// Once a month, when day of month and time of day match
    Monthly,
}

/// An alarm time
///
/// `None` disables a field, so it matches any value.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct Alarm {
    /// Second, from 0 to 59
    pub second: Option<u8>,
    /// Minute, from 0 to 59
    pub minute: Option<u8>,
    /// Hour, from 0 to 23
    pub hour: Option<u8>,
    /// Day of month, from 1 to 31
    pub day: Option<u8>,
    /// Day of the week
    pub weekday: Option<Weekday>,
}

impl Alarm {
    /// The alarm that fires at `time` with the given frequency
    ///
    /// Only the fields that have to match for `frequency` are taken from
    /// `time`. All others are disabled.
    pub fn at(time: &DateTime, frequency: AlarmFrequency) -> Self {
        use self::AlarmFrequency::*;

        let mut alarm = Alarm::default();
        if frequency != Secondly {
            alarm.second = Some(time.second);
        }
        if let Hourly | Daily | Weekly | Monthly = frequency {
            alarm.minute = Some(time.minute);
        }
        if let Daily | Weekly | Monthly = frequency {
            alarm.hour = Some(time.hour);
        }
        match frequency {
            Weekly => alarm.weekday = Some(time.weekday),
            Monthly => alarm.day = Some(time.day),
            _ => {}
        }

        alarm
    }

    /// Infers how often the alarm fires
    ///
    /// The most significant enabled field decides.
    pub fn frequency(&self) -> AlarmFrequency {
        if self.day.is_some() {
            AlarmFrequency::Monthly
        } else if self.weekday.is_some() {
            AlarmFrequency::Weekly
        } else if self.hour.is_some() {
            AlarmFrequency::Daily
        } else if self.minute.is_some() {
            AlarmFrequency::Hourly
        } else if self.second.is_some() {
            AlarmFrequency::Minutely
        } else {
            AlarmFrequency::Secondly
        }
    }
}

/// The physical layout of an alarm register
///
/// Bytes are, in order: second (only with `has_seconds`), minute, hour, day
/// of month or shared day/weekday, weekday (only without `weekday_shared`).
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct AlarmLayout {
    /// The register starts with a seconds byte
    pub has_seconds: bool,

    /// Day of month and weekday share one byte, selected by bit 6
    pub weekday_shared: bool,

    /// The raw value the device uses for Monday, `0` or `1`
    pub weekday_start: u8,
}

impl AlarmLayout {
    /// The size of the register, in bytes
    pub fn len(&self) -> usize {
        self.has_seconds as usize + 3 + !self.weekday_shared as usize
    }

    fn minute_index(&self) -> usize {
        self.has_seconds as usize
    }
}

impl Default for AlarmLayout {
    /// Seconds byte, shared day/weekday byte, Monday numbered `1`
    fn default() -> Self {
        AlarmLayout {
            has_seconds: true,
            weekday_shared: true,
            weekday_start: 1,
        }
    }
}

/// Converts between [`Alarm`] and the raw bytes of an alarm register
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct AlarmCodec {
    layout: AlarmLayout,
}

impl AlarmCodec {
    /// Create a codec for the given layout
    pub fn new(layout: AlarmLayout) -> Result<Self, ConfigError> {
        if layout.weekday_start > 1 {
            return Err(ConfigError::WeekdayStart(layout.weekday_start));
        }

        Ok(AlarmCodec { layout })
    }

    /// The layout in use
    pub fn layout(&self) -> &AlarmLayout {
        &self.layout
    }

    /// Decodes the first `layout().len()` bytes
    ///
    /// Without a seconds byte, `second` is always `None`.
    pub fn decode(&self, bytes: &[u8; MAX_ALARM_LEN]) -> Result<Alarm, CodecError> {
        let layout = &self.layout;
        let i = layout.minute_index();

        let mut alarm = Alarm {
            second: None,
            minute: decode_field(bytes[i], MINUTE_MASK),
            hour: decode_field(bytes[i + 1], HOUR_MASK),
            day: None,
            weekday: None,
        };
        if layout.has_seconds {
            alarm.second = decode_field(bytes[0], SECOND_MASK);
        }

        if layout.weekday_shared {
            let shared = bytes[i + 2];
            if shared & DISABLED == 0 && shared & WEEKDAY_FLAG != 0 {
                alarm.weekday = self.decode_weekday(shared)?;
            } else {
                alarm.day = decode_field(shared, DAY_MASK);
            }
        } else {
            alarm.day = decode_field(bytes[i + 2], DAY_MASK);
            alarm.weekday = self.decode_weekday(bytes[i + 3])?;
        }

        Ok(alarm)
    }

    /// Encodes an alarm, filling the first `layout().len()` bytes
    ///
    /// Fails with [`CodecError::ValueOutOfRange`], if a component is outside
    /// of its range or `second` is set but the register has no seconds byte.
    /// Fails with [`CodecError::AlarmConflict`], if both `day` and `weekday`
    /// are set but share one byte.
    pub fn encode(&self, alarm: &Alarm) -> Result<[u8; MAX_ALARM_LEN], CodecError> {
        let valid = alarm.second.map_or(true, |second| second < 60)
            && alarm.minute.map_or(true, |minute| minute < 60)
            && alarm.hour.map_or(true, |hour| hour < 24)
            && alarm.day.map_or(true, |day| (1..=31).contains(&day));
        if !valid || (alarm.second.is_some() && !self.layout.has_seconds) {
            return Err(CodecError::ValueOutOfRange);
        }

        let layout = &self.layout;
        let i = layout.minute_index();
        let mut bytes = [0; MAX_ALARM_LEN];

        if layout.has_seconds {
            bytes[0] = encode_field(alarm.second);
        }
        bytes[i] = encode_field(alarm.minute);
        bytes[i + 1] = encode_field(alarm.hour);

        let weekday = alarm
            .weekday
            .map(|weekday| weekday.to_raw(layout.weekday_start));

        if layout.weekday_shared {
            bytes[i + 2] = match (alarm.day, weekday) {
                (Some(_), Some(_)) => return Err(CodecError::AlarmConflict),
                (None, Some(weekday)) => WEEKDAY_FLAG | binary_to_bcd(weekday),
                (day, None) => encode_field(day),
            };
        } else {
            bytes[i + 2] = encode_field(alarm.day);
            bytes[i + 3] = encode_field(weekday);
        }

        Ok(bytes)
    }

    fn decode_weekday(&self, byte: u8) -> Result<Option<Weekday>, CodecError> {
        decode_field(byte, WEEKDAY_MASK)
            .map(|raw| Weekday::from_raw(raw, self.layout.weekday_start))
            .transpose()
    }
}

fn decode_field(byte: u8, mask: u8) -> Option<u8> {
    if byte & DISABLED != 0 {
        None
    } else {
        Some(bcd_to_binary(byte & mask))
    }
}

fn encode_field(value: Option<u8>) -> u8 {
    match value {
        Some(value) => binary_to_bcd(value),
        None => DISABLED,
    }
}

/// A BCD alarm register
pub struct AlarmRegister {
    address: u32,
    codec: AlarmCodec,
    access: Access,
    buffer: [u8; MAX_ALARM_LEN],
}

impl AlarmRegister {
    /// Create a new alarm register at `address`
    pub fn new(address: u32, codec: AlarmCodec, access: Access) -> Self {
        AlarmRegister {
            address,
            codec,
            access,
            buffer: [0; MAX_ALARM_LEN],
        }
    }

    /// A read-write alarm register
    pub fn rw(address: u32, codec: AlarmCodec) -> Self {
        Self::new(address, codec, Access::ReadWrite)
    }

    /// The address of the first alarm byte
    pub fn address(&self) -> u32 {
        self.address
    }

    /// The codec in use
    pub fn codec(&self) -> &AlarmCodec {
        &self.codec
    }

    /// Reads the alarm
    pub fn get<A>(&mut self, accessor: &mut A) -> Result<Alarm, Error<A::Error>>
    where
        A: RegisterAccessor,
    {
        let len = self.codec.layout.len();
        accessor.read_register(self.address, &mut self.buffer[..len])?;

        Ok(self.codec.decode(&self.buffer)?)
    }

    /// Writes the alarm
    pub fn set<A>(&mut self, accessor: &mut A, alarm: &Alarm) -> Result<(), Error<A::Error>>
    where
        A: RegisterAccessor,
    {
        self.access.ensure_writable()?;
        self.buffer = self.codec.encode(alarm)?;

        let len = self.codec.layout.len();
        accessor.write_register(self.address, &self.buffer[..len])
    }
}
