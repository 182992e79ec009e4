//! Typed fields over byte-addressed peripheral registers
//!
//! Many I2C and SPI peripherals expose their state as a map of registers, and
//! a driver mostly needs to read or change a few bits of one of them. This
//! crate provides field descriptors for that:
//!
//! - [`BitField`]: one bit, as a `bool`
//! - [`MultiBitField`]: a range of bits, as a signed or unsigned integer
//! - [`StructField`], [`UnaryField`] and [`StructArray`]: registers holding
//!   typed values laid out back to back
//! - [`DateTimeRegister`] and [`AlarmRegister`]: BCD time registers, as found
//!   in real-time clocks
//!
//! Fields don't own the bus. A driver keeps its fields as named members next
//! to a [`RegisterAccessor`], and passes the accessor to every `get`/`set`
//! call. Writes to part of a register are read-modify-write, so the other bits
//! are not changed.
//!
//! # Example
//!
//! ``` rust
//! use embedded_hal_mock::i2c::{Mock, Transaction};
//! use regfield::{AddressMode, BitField, I2cAccessor};
//!
//! let expectations = [
//!     Transaction::write_read(0x68, vec![0x0e], vec![0b0001_1000]),
//!     Transaction::write(0x68, vec![0x0e, 0b0001_1100]),
//! ];
//! let mut i2c = Mock::new(&expectations);
//!
//! let mut accessor = I2cAccessor::new(i2c.clone(), 0x68, AddressMode::default());
//! let mut interrupt_control = BitField::rw(0x0e, 2).unwrap();
//!
//! interrupt_control.set(&mut accessor, true).unwrap();
//!
//! i2c.done();
//! ```

#![cfg_attr(not(test), no_std)]
#![deny(missing_docs)]

pub mod accessor;
pub mod alarm;
pub mod bcd;
pub mod bit;
pub mod bits;
pub mod configs;
pub mod error;
pub mod structs;

#[cfg(test)]
mod testing;

pub use crate::{
    accessor::{I2cAccessor, RegisterAccessor, SpiAccessor},
    alarm::{Alarm, AlarmCodec, AlarmFrequency, AlarmLayout, AlarmRegister},
    bcd::{DateTime, DateTimeCodec, DateTimeRegister, Weekday},
    bit::BitField,
    bits::MultiBitField,
    configs::{Access, AddressMode, FieldConfig},
    error::{CodecError, ConfigError, Error},
    structs::{ByteOrder, Kind, Layout, StructArray, StructField, UnaryField, Value},
};
