use core::{convert::TryFrom, fmt};

use embedded_hal::{blocking::spi, digital::v2::OutputPin};
use num_enum::TryFromPrimitive;

use crate::{configs::MAX_ADDRESS_WIDTH, AddressMode, ConfigError, Error};

use super::RegisterAccessor;

/// Value of the read/write command bit
///
/// SPI peripherals embed the direction of a transaction in the most
/// significant bit of the first address byte.
#[derive(Copy, Clone, Debug, Eq, PartialEq, TryFromPrimitive)]
#[repr(u8)]
pub enum CommandBit {
    /// The bit is `0`
    Clear = 0,
    /// The bit is `1`
    Set = 1,
}

impl CommandBit {
    fn inverted(self) -> Self {
        match self {
            CommandBit::Clear => CommandBit::Set,
            CommandBit::Set => CommandBit::Clear,
        }
    }
}

/// Register access over SPI
///
/// Chip select is asserted for the duration of a single register read or
/// write, and is released again even if the transaction fails.
pub struct SpiAccessor<SPI, CS> {
    spi: SPI,
    chip_select: CS,
    chip_select_delay: u8,
    mode: AddressMode,
    read_command: CommandBit,
}

impl<SPI, CS> SpiAccessor<SPI, CS> {
    /// Create a new instance of `SpiAccessor`
    ///
    /// Requires the SPI peripheral and the chip select pin that are connected
    /// to the device. Reads are signalled by setting the command bit, writes by
    /// clearing it. Use [`SpiAccessor::with_read_command`] for devices that do
    /// it the other way around.
    pub fn new(spi: SPI, chip_select: CS, mode: AddressMode) -> Self {
        SpiAccessor {
            spi,
            chip_select,
            chip_select_delay: 0,
            mode,
            read_command: CommandBit::Set,
        }
    }

    /// Sets the value of the command bit that signals a read
    ///
    /// Writes use the opposite value. Fails, if `bit` is neither `0` nor `1`.
    pub fn with_read_command(mut self, bit: u8) -> Result<Self, ConfigError> {
        self.read_command =
            CommandBit::try_from(bit).map_err(|_| ConfigError::CommandBit(bit))?;
        Ok(self)
    }

    /// Set the chip select delay
    ///
    /// Chip select is driven low `delay` extra times before the first byte is
    /// clocked, which gives slow devices time to wake up on fast MCUs.
    pub fn set_chip_select_delay(&mut self, delay: u8) {
        self.chip_select_delay = delay;
    }

    /// Releases the SPI peripheral and the chip select pin
    pub fn free(self) -> (SPI, CS) {
        (self.spi, self.chip_select)
    }

    /// Packs the address and embeds the command bit into its first byte
    fn header(
        &self,
        address: u32,
        command: CommandBit,
    ) -> Result<([u8; MAX_ADDRESS_WIDTH], usize), ConfigError> {
        let mut header = [0; MAX_ADDRESS_WIDTH];
        let len = self.mode.pack(address, &mut header)?;

        // The command bit shares the first byte with the address.
        if header[0] & 0x80 != 0 {
            return Err(ConfigError::AddressOverflow { address });
        }
        header[0] = (header[0] & 0x7f) | ((command as u8) << 7);

        Ok((header, len))
    }
}

impl<SPI, CS> SpiAccessor<SPI, CS>
where
    SPI: spi::Transfer<u8> + spi::Write<u8>,
    CS: OutputPin,
{
    /// Runs `f` with chip select asserted
    ///
    /// Chip select is released afterwards, no matter whether asserting it or
    /// running `f` succeeded. An error from either takes precedence over one
    /// from releasing chip select.
    fn transaction<F>(&mut self, f: F) -> Result<(), SpiError<SPI, CS>>
    where
        F: FnOnce(&mut SPI) -> Result<(), SpiError<SPI, CS>>,
    {
        // A failed assertion may still have driven chip select low.
        let result = self.assert_cs_low().and_then(|()| f(&mut self.spi));
        let released = self.assert_cs_high();

        result.and(released)
    }

    fn assert_cs_low(&mut self) -> Result<(), SpiError<SPI, CS>> {
        for _ in 0..=self.chip_select_delay {
            self.chip_select
                .set_low()
                .map_err(|err| SpiError::ChipSelect(err))?;
        }

        Ok(())
    }

    fn assert_cs_high(&mut self) -> Result<(), SpiError<SPI, CS>> {
        self.chip_select
            .set_high()
            .map_err(|err| SpiError::ChipSelect(err))?;

        Ok(())
    }
}

impl<SPI, CS> RegisterAccessor for SpiAccessor<SPI, CS>
where
    SPI: spi::Transfer<u8> + spi::Write<u8>,
    CS: OutputPin,
{
    type Error = SpiError<SPI, CS>;

    fn address_mode(&self) -> AddressMode {
        self.mode
    }

    fn read_register(
        &mut self,
        address: u32,
        buffer: &mut [u8],
    ) -> Result<(), Error<Self::Error>> {
        let (header, len) = self.header(address, self.read_command)?;

        self.transaction(|bus| {
            <SPI as spi::Write<u8>>::write(bus, &header[..len])
                .map_err(|err| SpiError::Write(err))?;

            // Clock out zeros while the device sends the register contents.
            for byte in buffer.iter_mut() {
                *byte = 0;
            }
            <SPI as spi::Transfer<u8>>::transfer(bus, buffer)
                .map_err(|err| SpiError::Transfer(err))?;

            Ok(())
        })
        .map_err(Error::Bus)
    }

    fn write_register(&mut self, address: u32, buffer: &[u8]) -> Result<(), Error<Self::Error>> {
        let (header, len) = self.header(address, self.read_command.inverted())?;

        self.transaction(|bus| {
            <SPI as spi::Write<u8>>::write(bus, &header[..len])
                .map_err(|err| SpiError::Write(err))?;
            <SPI as spi::Write<u8>>::write(bus, buffer).map_err(|err| SpiError::Write(err))?;

            Ok(())
        })
        .map_err(Error::Bus)
    }
}

/// An SPI error that can occur when accessing a register
pub enum SpiError<SPI, CS>
where
    SPI: spi::Transfer<u8> + spi::Write<u8>,
    CS: OutputPin,
{
    /// SPI error occured during a transfer transaction
    Transfer(<SPI as spi::Transfer<u8>>::Error),

    /// SPI error occured during a write transaction
    Write(<SPI as spi::Write<u8>>::Error),

    /// Error occured while changing chip select signal
    ChipSelect(<CS as OutputPin>::Error),
}

// We can't derive this implementation, as the compiler will complain that the
// associated error type doesn't implement `Debug`.
impl<SPI, CS> fmt::Debug for SpiError<SPI, CS>
where
    SPI: spi::Transfer<u8> + spi::Write<u8>,
    <SPI as spi::Transfer<u8>>::Error: fmt::Debug,
    <SPI as spi::Write<u8>>::Error: fmt::Debug,
    CS: OutputPin,
    <CS as OutputPin>::Error: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SpiError::Transfer(error) => write!(f, "Transfer({:?})", error),
            SpiError::Write(error) => write!(f, "Write({:?})", error),
            SpiError::ChipSelect(error) => write!(f, "ChipSelect({:?})", error),
        }
    }
}
