use embedded_hal::blocking::i2c;

use crate::{
    configs::{MAX_ADDRESS_WIDTH, MAX_PAYLOAD_LEN},
    AddressMode, ConfigError, Error,
};

use super::RegisterAccessor;

/// Register access over I2C
///
/// Reads send the register address and read the data back after a repeated
/// start, so no other transaction can get in between. Writes send address and
/// data in a single write.
pub struct I2cAccessor<I2C> {
    i2c: I2C,
    device_address: u8,
    mode: AddressMode,
    frame: [u8; MAX_ADDRESS_WIDTH + MAX_PAYLOAD_LEN],
}

impl<I2C> I2cAccessor<I2C> {
    /// Create a new instance of `I2cAccessor`
    ///
    /// Requires the I2C bus and the 7-bit address of the peripheral on it.
    pub fn new(i2c: I2C, device_address: u8, mode: AddressMode) -> Self {
        I2cAccessor {
            i2c,
            device_address,
            mode,
            frame: [0; MAX_ADDRESS_WIDTH + MAX_PAYLOAD_LEN],
        }
    }

    /// The 7-bit address of the peripheral
    pub fn device_address(&self) -> u8 {
        self.device_address
    }

    /// Releases the I2C bus
    pub fn free(self) -> I2C {
        self.i2c
    }
}

impl<I2C, E> RegisterAccessor for I2cAccessor<I2C>
where
    I2C: i2c::WriteRead<Error = E> + i2c::Write<Error = E>,
{
    type Error = E;

    fn address_mode(&self) -> AddressMode {
        self.mode
    }

    fn read_register(&mut self, address: u32, buffer: &mut [u8]) -> Result<(), Error<E>> {
        let mut header = [0; MAX_ADDRESS_WIDTH];
        let len = self.mode.pack(address, &mut header)?;

        self.i2c
            .write_read(self.device_address, &header[..len], buffer)
            .map_err(Error::Bus)
    }

    fn write_register(&mut self, address: u32, buffer: &[u8]) -> Result<(), Error<E>> {
        if buffer.len() > MAX_PAYLOAD_LEN {
            return Err(ConfigError::RegisterWidth(buffer.len()).into());
        }

        let len = self.mode.pack(address, &mut self.frame)?;
        let end = len + buffer.len();
        self.frame[len..end].copy_from_slice(buffer);

        self.i2c
            .write(self.device_address, &self.frame[..end])
            .map_err(Error::Bus)
    }
}
