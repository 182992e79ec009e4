//! Single-bit register fields

use crate::{
    accessor::RegisterAccessor,
    configs::MAX_REGISTER_WIDTH,
    Access, ConfigError, Error, FieldConfig,
};

/// One bit of a register, exposed as a `bool`
///
/// The bit index may go beyond the first byte of a multi-byte register:
/// `bit % 8` selects the bit within a byte, `bit / 8` the byte. With
/// `lsb_first`, bit 0 lives in the first data byte on the wire. Otherwise it
/// lives in the last one.
///
/// Writes are read-modify-write, so the other bits of the register are left
/// as they are.
pub struct BitField {
    address: u32,
    mask: u8,
    byte: usize,
    config: FieldConfig,
    buffer: [u8; MAX_REGISTER_WIDTH],
}

impl BitField {
    /// Create a new bit field
    ///
    /// Fails, if the register width is invalid or `bit` is outside of the
    /// register.
    pub fn new(address: u32, bit: usize, config: FieldConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let byte_offset = bit / 8;
        if byte_offset >= config.register_width {
            return Err(ConfigError::FieldOverflow);
        }

        let byte = if config.lsb_first {
            byte_offset
        } else {
            config.register_width - 1 - byte_offset
        };

        Ok(BitField {
            address,
            mask: 1 << (bit % 8),
            byte,
            config,
            buffer: [0; MAX_REGISTER_WIDTH],
        })
    }

    /// A read-write bit in a single-byte register
    pub fn rw(address: u32, bit: usize) -> Result<Self, ConfigError> {
        Self::new(address, bit, FieldConfig::default())
    }

    /// A read-only bit in a single-byte register
    pub fn ro(address: u32, bit: usize) -> Result<Self, ConfigError> {
        Self::new(address, bit, FieldConfig::read_only())
    }

    /// The address of the register
    pub fn address(&self) -> u32 {
        self.address
    }

    /// Index of the data byte that holds the bit
    ///
    /// This doesn't include the address bytes. On the wire, the byte follows
    /// the address, at `address_width + byte_index()`.
    pub fn byte_index(&self) -> usize {
        self.byte
    }

    /// The mask that selects the bit within its byte
    pub fn mask(&self) -> u8 {
        self.mask
    }

    /// Whether the bit may be written to
    pub fn access(&self) -> Access {
        self.config.access
    }

    /// Reads the register and returns the bit
    pub fn get<A>(&mut self, accessor: &mut A) -> Result<bool, Error<A::Error>>
    where
        A: RegisterAccessor,
    {
        let width = self.config.register_width;
        accessor.read_register(self.address, &mut self.buffer[..width])?;

        Ok(self.buffer[self.byte] & self.mask != 0)
    }

    /// Sets or clears the bit, leaving the rest of the register unchanged
    ///
    /// Fails with [`Error::ReadOnly`] for read-only bits, without accessing
    /// the bus.
    pub fn set<A>(&mut self, accessor: &mut A, value: bool) -> Result<(), Error<A::Error>>
    where
        A: RegisterAccessor,
    {
        self.config.access.ensure_writable()?;

        let width = self.config.register_width;
        accessor.read_register(self.address, &mut self.buffer[..width])?;

        if value {
            self.buffer[self.byte] |= self.mask;
        } else {
            self.buffer[self.byte] &= !self.mask;
        }

        accessor.write_register(self.address, &self.buffer[..width])
    }
}
