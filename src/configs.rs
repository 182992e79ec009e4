//! Configuration structs for accessors and fields
//!
//! These are passed to the constructors of the accessors and field
//! descriptors. Constructors validate them, so an unusable configuration is
//! reported when the device object is built.

use crate::{ConfigError, Error};

/// The widest register address supported, in bytes
pub const MAX_ADDRESS_WIDTH: usize = 4;

/// The widest register supported by bit and multi-bit fields, in bytes
pub const MAX_REGISTER_WIDTH: usize = 8;

/// The largest payload a single register transaction can carry, in bytes
pub const MAX_PAYLOAD_LEN: usize = 32;

/// Whether a field may be written to
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Access {
    /// Writes fail with [`Error::ReadOnly`] without touching the bus
    ReadOnly,
    /// The field can be read and written
    ReadWrite,
}

impl Default for Access {
    fn default() -> Self {
        Access::ReadWrite
    }
}

impl Access {
    /// Fails with [`Error::ReadOnly`] unless writes are allowed
    pub(crate) fn ensure_writable<E>(self) -> Result<(), Error<E>> {
        match self {
            Access::ReadWrite => Ok(()),
            Access::ReadOnly => Err(Error::ReadOnly),
        }
    }
}

/// How register addresses are put on the wire
///
/// The address takes up `width` bytes in front of the register data. If
/// `lsb_first` is set, the least significant address byte is sent first.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct AddressMode {
    width: u8,
    lsb_first: bool,
}

impl AddressMode {
    /// Create a new address mode
    ///
    /// Fails, if `width` is not between 1 and [`MAX_ADDRESS_WIDTH`].
    pub fn new(width: u8, lsb_first: bool) -> Result<Self, ConfigError> {
        if width == 0 || width as usize > MAX_ADDRESS_WIDTH {
            return Err(ConfigError::AddressWidth(width));
        }

        Ok(AddressMode { width, lsb_first })
    }

    /// The number of address bytes
    pub fn width(&self) -> usize {
        self.width as usize
    }

    /// Whether the least significant address byte is sent first
    pub fn lsb_first(&self) -> bool {
        self.lsb_first
    }

    /// Checks that `address` can be represented with this address width
    pub fn check(&self, address: u32) -> Result<(), ConfigError> {
        let width = self.width();
        if width < MAX_ADDRESS_WIDTH && address >> (8 * width) != 0 {
            return Err(ConfigError::AddressOverflow { address });
        }

        Ok(())
    }

    /// Writes the address bytes to the head of `buffer`
    ///
    /// Returns the number of bytes written.
    ///
    /// # Panics
    ///
    /// Panics, if `buffer` is shorter than the address width.
    pub fn pack(&self, address: u32, buffer: &mut [u8]) -> Result<usize, ConfigError> {
        self.check(address)?;

        let width = self.width();
        if self.lsb_first {
            buffer[..width].copy_from_slice(&address.to_le_bytes()[..width]);
        } else {
            buffer[..width].copy_from_slice(&address.to_be_bytes()[MAX_ADDRESS_WIDTH - width..]);
        }

        Ok(width)
    }
}

impl Default for AddressMode {
    fn default() -> Self {
        AddressMode {
            width: 1,
            lsb_first: true,
        }
    }
}

/// Field configuration shared by [`BitField`] and [`MultiBitField`]
///
/// [`BitField`]: ../bit/struct.BitField.html
/// [`MultiBitField`]: ../bits/struct.MultiBitField.html
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct FieldConfig {
    /// Whether the field may be written to
    pub access: Access,
    /// The number of bytes in the register that holds the field
    pub register_width: usize,
    /// Whether the first data byte on the wire is the least significant one
    pub lsb_first: bool,
}

impl Default for FieldConfig {
    fn default() -> Self {
        FieldConfig {
            access: Access::ReadWrite,
            register_width: 1,
            lsb_first: true,
        }
    }
}

impl FieldConfig {
    /// The default configuration, but read-only
    pub fn read_only() -> Self {
        FieldConfig {
            access: Access::ReadOnly,
            ..Default::default()
        }
    }

    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.register_width == 0 || self.register_width > MAX_REGISTER_WIDTH {
            return Err(ConfigError::RegisterWidth(self.register_width));
        }

        Ok(())
    }
}
