//! Structured registers
//!
//! Some registers aren't a single integer but a fixed sequence of typed
//! values, like the calibration block of a sensor. A [`Layout`] declares that
//! sequence once, as an ordered list of [`Kind`]s and a [`ByteOrder`], and is
//! validated when it's created.

use core::marker::PhantomData;

use byte::{
    ctx::{Endian, BE, LE},
    BytesExt as _,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::{
    accessor::RegisterAccessor,
    configs::MAX_PAYLOAD_LEN,
    Access, ConfigError, Error,
};

/// The maximum number of values in a layout
pub const MAX_VALUES: usize = MAX_PAYLOAD_LEN;

/// The values of a structured register, in layout order
pub type Values = heapless::Vec<Value, MAX_VALUES>;

/// Byte order of the values in a structured register
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ByteOrder {
    /// Least significant byte first
    Little,
    /// Most significant byte first
    Big,
}

impl ByteOrder {
    fn endian(self) -> Endian {
        match self {
            ByteOrder::Little => LE,
            ByteOrder::Big => BE,
        }
    }
}

/// The type of a single value within a structured register
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Kind {
    /// Unsigned 8-bit integer
    U8,
    /// Signed 8-bit integer
    I8,
    /// Unsigned 16-bit integer
    U16,
    /// Signed 16-bit integer
    I16,
    /// Unsigned 32-bit integer
    U32,
    /// Signed 32-bit integer
    I32,
    /// Unsigned 64-bit integer
    U64,
    /// Signed 64-bit integer
    I64,
    /// IEEE 754 single precision float
    F32,
    /// IEEE 754 double precision float
    F64,
}

impl Kind {
    /// The number of bytes a value of this kind takes up
    pub fn size(self) -> usize {
        match self {
            Kind::U8 | Kind::I8 => 1,
            Kind::U16 | Kind::I16 => 2,
            Kind::U32 | Kind::I32 | Kind::F32 => 4,
            Kind::U64 | Kind::I64 | Kind::F64 => 8,
        }
    }
}

/// A single value read from or written to a structured register
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// See [`Kind::U8`]
    U8(u8),
    /// See [`Kind::I8`]
    I8(i8),
    /// See [`Kind::U16`]
    U16(u16),
    /// See [`Kind::I16`]
    I16(i16),
    /// See [`Kind::U32`]
    U32(u32),
    /// See [`Kind::I32`]
    I32(i32),
    /// See [`Kind::U64`]
    U64(u64),
    /// See [`Kind::I64`]
    I64(i64),
    /// See [`Kind::F32`]
    F32(f32),
    /// See [`Kind::F64`]
    F64(f64),
}

impl Value {
    /// The kind of this value
    pub fn kind(&self) -> Kind {
        match self {
            Value::U8(_) => Kind::U8,
            Value::I8(_) => Kind::I8,
            Value::U16(_) => Kind::U16,
            Value::I16(_) => Kind::I16,
            Value::U32(_) => Kind::U32,
            Value::I32(_) => Kind::I32,
            Value::U64(_) => Kind::U64,
            Value::I64(_) => Kind::I64,
            Value::F32(_) => Kind::F32,
            Value::F64(_) => Kind::F64,
        }
    }
}

/// The binary layout of a structured register
///
/// # Example
///
/// ``` rust
/// use regfield::structs::{ByteOrder, Kind, Layout};
///
/// const CALIBRATION: &[Kind] = &[Kind::U16, Kind::I16, Kind::I8];
///
/// let layout = Layout::new(ByteOrder::Little, CALIBRATION).unwrap();
/// assert_eq!(layout.size(), 5);
/// ```
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Layout {
    kinds: &'static [Kind],
    order: ByteOrder,
    size: usize,
}

impl Layout {
    /// Create a new layout
    ///
    /// Fails, if `kinds` is empty or the layout doesn't fit into a single
    /// register transaction.
    pub fn new(order: ByteOrder, kinds: &'static [Kind]) -> Result<Self, ConfigError> {
        if kinds.is_empty() {
            return Err(ConfigError::EmptyLayout);
        }

        let size = kinds.iter().map(|kind| kind.size()).sum();
        if size > MAX_PAYLOAD_LEN {
            return Err(ConfigError::LayoutTooLarge(size));
        }

        Ok(Layout { kinds, order, size })
    }

    /// The kinds of the values, in order
    pub fn kinds(&self) -> &'static [Kind] {
        self.kinds
    }

    /// The byte order of the values
    pub fn order(&self) -> ByteOrder {
        self.order
    }

    /// The size of the layout, in bytes
    pub fn size(&self) -> usize {
        self.size
    }

    fn decode<E>(&self, bytes: &[u8]) -> Result<Values, Error<E>> {
        let endian = self.order.endian();
        let offset = &mut 0;
        let mut values = Values::new();

        for kind in self.kinds {
            let value = match kind {
                Kind::U8 => Value::U8(bytes.read_with::<u8>(offset, endian)?),
                Kind::I8 => Value::I8(bytes.read_with::<i8>(offset, endian)?),
                Kind::U16 => Value::U16(bytes.read_with::<u16>(offset, endian)?),
                Kind::I16 => Value::I16(bytes.read_with::<i16>(offset, endian)?),
                Kind::U32 => Value::U32(bytes.read_with::<u32>(offset, endian)?),
                Kind::I32 => Value::I32(bytes.read_with::<i32>(offset, endian)?),
                Kind::U64 => Value::U64(bytes.read_with::<u64>(offset, endian)?),
                Kind::I64 => Value::I64(bytes.read_with::<i64>(offset, endian)?),
                Kind::F32 => Value::F32(f32::from_bits(bytes.read_with::<u32>(offset, endian)?)),
                Kind::F64 => Value::F64(f64::from_bits(bytes.read_with::<u64>(offset, endian)?)),
            };

            // `Layout::new` makes sure there are never more values than fit.
            values
                .push(value)
                .map_err(|_| ConfigError::LayoutTooLarge(self.size))?;
        }

        Ok(values)
    }

    fn encode<E>(&self, values: &[Value], bytes: &mut [u8]) -> Result<(), Error<E>> {
        if values.len() != self.kinds.len() {
            return Err(Error::ValueMismatch {
                index: values.len().min(self.kinds.len()),
            });
        }

        let endian = self.order.endian();
        let offset = &mut 0;

        for (index, (kind, value)) in self.kinds.iter().zip(values).enumerate() {
            if value.kind() != *kind {
                return Err(Error::ValueMismatch { index });
            }

            match *value {
                Value::U8(v) => bytes.write_with(offset, v, endian)?,
                Value::I8(v) => bytes.write_with(offset, v, endian)?,
                Value::U16(v) => bytes.write_with(offset, v, endian)?,
                Value::I16(v) => bytes.write_with(offset, v, endian)?,
                Value::U32(v) => bytes.write_with(offset, v, endian)?,
                Value::I32(v) => bytes.write_with(offset, v, endian)?,
                Value::U64(v) => bytes.write_with(offset, v, endian)?,
                Value::I64(v) => bytes.write_with(offset, v, endian)?,
                Value::F32(v) => bytes.write_with(offset, v.to_bits(), endian)?,
                Value::F64(v) => bytes.write_with(offset, v.to_bits(), endian)?,
            }
        }

        Ok(())
    }
}

/// A register holding a fixed sequence of typed values
///
/// Reads and writes always transfer the whole layout in one transaction.
pub struct StructField {
    address: u32,
    layout: Layout,
    access: Access,
    buffer: [u8; MAX_PAYLOAD_LEN],
}

impl StructField {
    /// Create a new structured field
    pub fn new(address: u32, layout: Layout, access: Access) -> Self {
        StructField {
            address,
            layout,
            access,
            buffer: [0; MAX_PAYLOAD_LEN],
        }
    }

    /// A read-write structured field
    pub fn rw(address: u32, layout: Layout) -> Self {
        Self::new(address, layout, Access::ReadWrite)
    }

    /// A read-only structured field
    pub fn ro(address: u32, layout: Layout) -> Self {
        Self::new(address, layout, Access::ReadOnly)
    }

    /// The address of the first byte of the register
    pub fn address(&self) -> u32 {
        self.address
    }

    /// The layout of the register
    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// Whether the field may be written to
    pub fn access(&self) -> Access {
        self.access
    }

    /// Reads the register and decodes its values
    pub fn get<A>(&mut self, accessor: &mut A) -> Result<Values, Error<A::Error>>
    where
        A: RegisterAccessor,
    {
        let size = self.layout.size();
        accessor.read_register(self.address, &mut self.buffer[..size])?;

        self.layout.decode(&self.buffer[..size])
    }

    /// Encodes `values` and writes them to the register
    ///
    /// Fails with [`Error::ValueMismatch`] before accessing the bus, if
    /// `values` doesn't match the layout.
    pub fn set<A>(&mut self, accessor: &mut A, values: &[Value]) -> Result<(), Error<A::Error>>
    where
        A: RegisterAccessor,
    {
        self.access.ensure_writable()?;

        let size = self.layout.size();
        self.layout.encode(values, &mut self.buffer[..size])?;

        accessor.write_register(self.address, &self.buffer[..size])
    }

    /// Reads the register and deserializes it as `T`
    ///
    /// The payload is interpreted as packed little-endian data, as produced
    /// by `ssmarshal`. `T` must take up exactly as many bytes as the layout.
    pub fn get_as<T, A>(&mut self, accessor: &mut A) -> Result<T, Error<A::Error>>
    where
        T: DeserializeOwned,
        A: RegisterAccessor,
    {
        let size = self.layout.size();
        accessor.read_register(self.address, &mut self.buffer[..size])?;

        let (value, len) = ssmarshal::deserialize::<T>(&self.buffer[..size])?;
        if len != size {
            return Err(ConfigError::LayoutMismatch {
                expected: size,
                actual: len,
            }
            .into());
        }

        Ok(value)
    }

    /// Serializes `value` and writes it to the register
    ///
    /// See [`StructField::get_as`] for the encoding.
    pub fn set_as<T, A>(&mut self, accessor: &mut A, value: &T) -> Result<(), Error<A::Error>>
    where
        T: Serialize,
        A: RegisterAccessor,
    {
        self.access.ensure_writable()?;

        let size = self.layout.size();
        let len = ssmarshal::serialize(&mut self.buffer[..size], value)?;
        if len != size {
            return Err(ConfigError::LayoutMismatch {
                expected: size,
                actual: len,
            }
            .into());
        }

        accessor.write_register(self.address, &self.buffer[..size])
    }
}

/// A register that holds a single scalar value
pub struct UnaryField<T> {
    field: StructField,
    _value: PhantomData<T>,
}

impl<T> UnaryField<T>
where
    T: Scalar,
{
    /// Create a new single-value field
    pub fn new(address: u32, order: ByteOrder, access: Access) -> Self {
        let layout = Layout {
            kinds: T::KINDS,
            order,
            size: T::KINDS[0].size(),
        };

        UnaryField {
            field: StructField::new(address, layout, access),
            _value: PhantomData,
        }
    }

    /// A read-write single-value field
    pub fn rw(address: u32, order: ByteOrder) -> Self {
        Self::new(address, order, Access::ReadWrite)
    }

    /// A read-only single-value field
    pub fn ro(address: u32, order: ByteOrder) -> Self {
        Self::new(address, order, Access::ReadOnly)
    }

    /// The address of the register
    pub fn address(&self) -> u32 {
        self.field.address()
    }

    /// Reads the value
    pub fn get<A>(&mut self, accessor: &mut A) -> Result<T, Error<A::Error>>
    where
        A: RegisterAccessor,
    {
        let values = self.field.get(accessor)?;

        values
            .first()
            .and_then(|&value| T::from_value(value))
            .ok_or(Error::ValueMismatch { index: 0 })
    }

    /// Writes the value
    pub fn set<A>(&mut self, accessor: &mut A, value: T) -> Result<(), Error<A::Error>>
    where
        A: RegisterAccessor,
    {
        self.field.set(accessor, &[value.into_value()])
    }
}

/// Implemented for the types a [`UnaryField`] can hold
///
/// This is a mostly internal trait that should not need to be implemented by
/// users of this crate.
pub trait Scalar: Copy {
    /// A single-element layout for this type
    const KINDS: &'static [Kind];

    /// Extracts the scalar, if `value` has the right kind
    fn from_value(value: Value) -> Option<Self>;

    /// Wraps the scalar
    fn into_value(self) -> Value;
}

/// Internal macro used to implement `Scalar`
macro_rules! impl_scalar {
    ($($ty:ty => $variant:ident,)*) => {
        $(
            impl Scalar for $ty {
                const KINDS: &'static [Kind] = &[Kind::$variant];

                fn from_value(value: Value) -> Option<Self> {
                    match value {
                        Value::$variant(v) => Some(v),
                        _ => None,
                    }
                }

                fn into_value(self) -> Value {
                    Value::$variant(self)
                }
            }
        )*
    }
}

impl_scalar! {
    u8 => U8,
    i8 => I8,
    u16 => U16,
    i16 => I16,
    u32 => U32,
    i32 => I32,
    u64 => U64,
    i64 => I64,
    f32 => F32,
    f64 => F64,
}

/// A sequence of identically laid out registers at increasing addresses
///
/// Element `i` lives at `address + i * layout.size()`. Buffers are created
/// per access instead of being kept around for every element.
pub struct StructArray {
    address: u32,
    layout: Layout,
    len: usize,
    access: Access,
}

impl StructArray {
    /// Create a new array of structured registers
    ///
    /// Fails, if the address of the last element doesn't fit into `u32`.
    pub fn new(
        address: u32,
        layout: Layout,
        len: usize,
        access: Access,
    ) -> Result<Self, ConfigError> {
        if len > 0 {
            let last = address as u64 + (len as u64 - 1) * layout.size() as u64;
            if last > u32::MAX as u64 {
                return Err(ConfigError::AddressOverflow { address });
            }
        }

        Ok(StructArray {
            address,
            layout,
            len,
            access,
        })
    }

    /// A read-write array
    pub fn rw(address: u32, layout: Layout, len: usize) -> Result<Self, ConfigError> {
        Self::new(address, layout, len, Access::ReadWrite)
    }

    /// A read-only array
    pub fn ro(address: u32, layout: Layout, len: usize) -> Result<Self, ConfigError> {
        Self::new(address, layout, len, Access::ReadOnly)
    }

    /// The number of elements
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the array has no elements
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The layout of each element
    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// The address of element `index`, if it exists
    pub fn element_address(&self, index: usize) -> Option<u32> {
        if index >= self.len {
            return None;
        }

        // Can't overflow, as checked in `new`.
        Some(self.address + (index * self.layout.size()) as u32)
    }

    /// Reads element `index`
    pub fn get<A>(&self, accessor: &mut A, index: usize) -> Result<Values, Error<A::Error>>
    where
        A: RegisterAccessor,
    {
        let address = self.checked_address(index)?;
        let size = self.layout.size();

        let mut buffer = [0; MAX_PAYLOAD_LEN];
        accessor.read_register(address, &mut buffer[..size])?;

        self.layout.decode(&buffer[..size])
    }

    /// Writes element `index`
    pub fn set<A>(
        &self,
        accessor: &mut A,
        index: usize,
        values: &[Value],
    ) -> Result<(), Error<A::Error>>
    where
        A: RegisterAccessor,
    {
        self.access.ensure_writable()?;
        let address = self.checked_address(index)?;
        let size = self.layout.size();

        let mut buffer = [0; MAX_PAYLOAD_LEN];
        self.layout.encode(values, &mut buffer[..size])?;

        accessor.write_register(address, &buffer[..size])
    }

    fn checked_address<E>(&self, index: usize) -> Result<u32, Error<E>> {
        self.element_address(index).ok_or(Error::OutOfBounds {
            index,
            len: self.len,
        })
    }
}
