//! In-memory register map for unit tests

use crate::{accessor::RegisterAccessor, AddressMode, Error};

/// The error returned by [`Registers`] when told to fail
#[derive(Debug, Eq, PartialEq)]
pub struct BusFault;

/// A device with 256 bytes of register space that counts bus transactions
pub struct Registers {
    pub memory: [u8; 256],
    pub mode: AddressMode,
    pub reads: usize,
    pub writes: usize,
    pub fail: bool,
}

impl Registers {
    pub fn new() -> Self {
        Registers {
            memory: [0; 256],
            mode: AddressMode::default(),
            reads: 0,
            writes: 0,
            fail: false,
        }
    }

    /// Starts out with `bytes` stored at `address`
    pub fn with(address: usize, bytes: &[u8]) -> Self {
        let mut registers = Self::new();
        registers.memory[address..address + bytes.len()].copy_from_slice(bytes);
        registers
    }

    pub fn at(&self, address: usize, len: usize) -> &[u8] {
        &self.memory[address..address + len]
    }

    pub fn transactions(&self) -> usize {
        self.reads + self.writes
    }
}

impl RegisterAccessor for Registers {
    type Error = BusFault;

    fn address_mode(&self) -> AddressMode {
        self.mode
    }

    fn read_register(&mut self, address: u32, buffer: &mut [u8]) -> Result<(), Error<BusFault>> {
        self.mode.check(address)?;
        if self.fail {
            return Err(Error::Bus(BusFault));
        }

        self.reads += 1;
        let start = address as usize;
        buffer.copy_from_slice(&self.memory[start..start + buffer.len()]);

        Ok(())
    }

    fn write_register(&mut self, address: u32, buffer: &[u8]) -> Result<(), Error<BusFault>> {
        self.mode.check(address)?;
        if self.fail {
            return Err(Error::Bus(BusFault));
        }

        self.writes += 1;
        let start = address as usize;
        self.memory[start..start + buffer.len()].copy_from_slice(buffer);

        Ok(())
    }
}
