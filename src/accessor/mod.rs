//! Register-level bus access
//!
//! Field descriptors never talk to the bus directly. They go through a
//! [`RegisterAccessor`], which knows how wide register addresses are, how
//! they're put on the wire, and how a register is read or written in a single
//! bus transaction.
//!
//! Two implementations are provided on top of the blocking `embedded-hal`
//! traits: [`I2cAccessor`] and [`SpiAccessor`]. Other transports only need to
//! implement [`RegisterAccessor`].

use crate::{AddressMode, ConfigError, Error};

pub use self::{i2c::*, spi::*};

mod i2c;
mod spi;

/// Reads and writes whole registers
///
/// Every call is one complete bus transaction. An implementation must not let
/// any other transaction interleave between sending the address and
/// transferring the data.
pub trait RegisterAccessor {
    /// The transport's error type
    type Error;

    /// How register addresses are put on the wire
    fn address_mode(&self) -> AddressMode;

    /// Reads `buffer.len()` bytes, starting at register `address`
    ///
    /// On success, `buffer` contains exactly the bytes that are present at
    /// `address` through `address + buffer.len() - 1`.
    fn read_register(
        &mut self,
        address: u32,
        buffer: &mut [u8],
    ) -> Result<(), Error<Self::Error>>;

    /// Writes all of `buffer`, starting at register `address`
    fn write_register(&mut self, address: u32, buffer: &[u8]) -> Result<(), Error<Self::Error>>;

    /// Writes `address` to the head of `buffer`, as it's sent on the wire
    ///
    /// Returns the number of address bytes written.
    fn pack_address(&self, address: u32, buffer: &mut [u8]) -> Result<usize, ConfigError> {
        self.address_mode().pack(address, buffer)
    }
}
