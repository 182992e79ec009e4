//! Multi-bit register fields
//!
//! **NOTE**: [`MultiBitField::set`] accepts values that have a larger number
//! of bits than the field actually consists of. If you use it to pass a value
//! that is too large to be written to the field, it will be silently
//! truncated to the field's low bits. Use [`MultiBitField::set_checked`] if
//! that's not what you want.

use core::marker::PhantomData;

use crate::{
    accessor::RegisterAccessor,
    configs::MAX_REGISTER_WIDTH,
    Access, ConfigError, Error, FieldConfig,
};

/// An N-bit integer field within a register
///
/// The field covers `num_bits` bits, starting at `lowest_bit` of the register
/// value. The register value is assembled from all register bytes according
/// to `lsb_first`, so the byte order only decides which byte on the wire
/// contributes which bits.
///
/// Whether the field is signed is decided by `T`. Signed fields use the top
/// bit of the field as the sign bit (two's complement).
pub struct MultiBitField<T> {
    address: u32,
    lowest_bit: u32,
    num_bits: u32,
    mask: u64,
    config: FieldConfig,
    buffer: [u8; MAX_REGISTER_WIDTH],
    _value: PhantomData<T>,
}

impl<T> MultiBitField<T>
where
    T: FieldValue,
{
    /// Create a new multi-bit field
    ///
    /// Fails, if the register width is invalid, if `T` can't hold `num_bits`
    /// bits, or if the field doesn't fit into the register.
    pub fn new(
        address: u32,
        lowest_bit: u32,
        num_bits: u32,
        config: FieldConfig,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        if num_bits == 0 || num_bits > T::BITS {
            return Err(ConfigError::FieldWidth(num_bits));
        }

        let register_bits = config.register_width as u32 * 8;
        match lowest_bit.checked_add(num_bits) {
            Some(end) if end <= register_bits => (),
            _ => return Err(ConfigError::FieldOverflow),
        }

        Ok(MultiBitField {
            address,
            lowest_bit,
            num_bits,
            mask: (u64::MAX >> (64 - num_bits)) << lowest_bit,
            config,
            buffer: [0; MAX_REGISTER_WIDTH],
            _value: PhantomData,
        })
    }

    /// A read-write field in a single-byte register
    pub fn rw(address: u32, lowest_bit: u32, num_bits: u32) -> Result<Self, ConfigError> {
        Self::new(address, lowest_bit, num_bits, FieldConfig::default())
    }

    /// A read-only field in a single-byte register
    pub fn ro(address: u32, lowest_bit: u32, num_bits: u32) -> Result<Self, ConfigError> {
        Self::new(address, lowest_bit, num_bits, FieldConfig::read_only())
    }

    /// The address of the register
    pub fn address(&self) -> u32 {
        self.address
    }

    /// The index of the field's lowest bit within the register value
    pub fn lowest_bit(&self) -> u32 {
        self.lowest_bit
    }

    /// The number of bits in the field
    pub fn num_bits(&self) -> u32 {
        self.num_bits
    }

    /// The bits of the register value that belong to the field
    pub fn mask(&self) -> u64 {
        self.mask
    }

    /// Whether the field may be written to
    pub fn access(&self) -> Access {
        self.config.access
    }

    /// Whether the field's top bit is a sign bit
    pub fn is_signed(&self) -> bool {
        T::SIGNED
    }

    /// Reads the register and extracts the field
    pub fn get<A>(&mut self, accessor: &mut A) -> Result<T, Error<A::Error>>
    where
        A: RegisterAccessor,
    {
        let width = self.config.register_width;
        accessor.read_register(self.address, &mut self.buffer[..width])?;

        let register = assemble(&self.buffer[..width], self.config.lsb_first);
        let raw = (register & self.mask) >> self.lowest_bit;

        Ok(T::from_raw(raw, self.num_bits))
    }

    /// Writes the field, leaving the rest of the register unchanged
    ///
    /// Bits of `value` above the field's width are dropped. Fails with
    /// [`Error::ReadOnly`] for read-only fields, without accessing the bus.
    pub fn set<A>(&mut self, accessor: &mut A, value: T) -> Result<(), Error<A::Error>>
    where
        A: RegisterAccessor,
    {
        self.config.access.ensure_writable()?;

        let width = self.config.register_width;
        accessor.read_register(self.address, &mut self.buffer[..width])?;

        let mut register = assemble(&self.buffer[..width], self.config.lsb_first);
        register &= !self.mask;
        register |= (value.into_raw() << self.lowest_bit) & self.mask;
        disassemble(register, &mut self.buffer[..width], self.config.lsb_first);

        accessor.write_register(self.address, &self.buffer[..width])
    }

    /// Like [`MultiBitField::set`], but rejects values that don't fit
    ///
    /// Fails with [`Error::ValueOutOfRange`] before accessing the bus, if
    /// `value` can't be represented in `num_bits` bits.
    pub fn set_checked<A>(&mut self, accessor: &mut A, value: T) -> Result<(), Error<A::Error>>
    where
        A: RegisterAccessor,
    {
        self.config.access.ensure_writable()?;

        if !value.fits(self.num_bits) {
            return Err(Error::ValueOutOfRange);
        }

        self.set(accessor, value)
    }
}

/// Assembles register bytes into a single value
fn assemble(bytes: &[u8], lsb_first: bool) -> u64 {
    let mut register = 0;

    for (i, &b) in bytes.iter().enumerate() {
        register |= (b as u64) << shift_of(i, bytes.len(), lsb_first);
    }

    register
}

/// Splits a register value back into its bytes
fn disassemble(register: u64, bytes: &mut [u8], lsb_first: bool) {
    let len = bytes.len();

    for (i, b) in bytes.iter_mut().enumerate() {
        *b = (register >> shift_of(i, len, lsb_first)) as u8;
    }
}

fn shift_of(i: usize, len: usize, lsb_first: bool) -> usize {
    if lsb_first {
        8 * i
    } else {
        8 * (len - 1 - i)
    }
}

/// Implemented for the integer types a [`MultiBitField`] can hold
///
/// This is a mostly internal trait that should not need to be implemented by
/// users of this crate. It's implemented for all primitive integers up to 64
/// bits.
pub trait FieldValue: Copy {
    /// The number of bits in the type
    const BITS: u32;

    /// Whether the type is interpreted as two's complement
    const SIGNED: bool;

    /// Converts right-aligned field bits into a value
    fn from_raw(raw: u64, num_bits: u32) -> Self;

    /// Converts the value into raw bits, before truncation to the field
    fn into_raw(self) -> u64;

    /// Whether the value can be represented in `num_bits` bits
    fn fits(self, num_bits: u32) -> bool;
}

/// Internal macro used to implement `FieldValue` for unsigned integers
macro_rules! impl_unsigned {
    ($($ty:ty,)*) => {
        $(
            impl FieldValue for $ty {
                const BITS: u32 = (::core::mem::size_of::<$ty>() * 8) as u32;
                const SIGNED: bool = false;

                fn from_raw(raw: u64, _: u32) -> Self {
                    raw as $ty
                }

                fn into_raw(self) -> u64 {
                    self as u64
                }

                fn fits(self, num_bits: u32) -> bool {
                    num_bits >= 64 || (self as u64) >> num_bits == 0
                }
            }
        )*
    }
}

/// Internal macro used to implement `FieldValue` for signed integers
macro_rules! impl_signed {
    ($($ty:ty,)*) => {
        $(
            impl FieldValue for $ty {
                const BITS: u32 = (::core::mem::size_of::<$ty>() * 8) as u32;
                const SIGNED: bool = true;

                fn from_raw(raw: u64, num_bits: u32) -> Self {
                    // Moving the field's sign bit to the top and shifting it
                    // back arithmetically is the same as subtracting
                    // `1 << num_bits` when the sign bit is set.
                    let shift = 64 - num_bits;
                    (((raw << shift) as i64) >> shift) as $ty
                }

                fn into_raw(self) -> u64 {
                    self as i64 as u64
                }

                fn fits(self, num_bits: u32) -> bool {
                    if num_bits >= 64 {
                        return true;
                    }

                    let value = self as i64;
                    let limit = 1i64 << (num_bits - 1);
                    value >= -limit && value < limit
                }
            }
        )*
    }
}

impl_unsigned! {
    u8,
    u16,
    u32,
    u64,
}

impl_signed! {
    i8,
    i16,
    i32,
    i64,
}
