//! Errors returned by register accessors and field descriptors

use core::fmt;

/// An error that can occur when accessing a register field
///
/// `E` is the error type of the [`RegisterAccessor`] in use. Bus errors are
/// passed through as [`Error::Bus`] without being interpreted or retried.
///
/// [`RegisterAccessor`]: ../accessor/trait.RegisterAccessor.html
pub enum Error<E> {
    /// Error occured while using the bus
    Bus(E),

    /// The field or accessor was configured in a way that can't work
    Config(ConfigError),

    /// Attempted to write to a read-only field
    ///
    /// No bus transaction is issued before this error is returned.
    ReadOnly,

    /// Array index outside of `0..len`
    OutOfBounds {
        /// The index that was requested
        index: usize,
        /// The number of elements in the array
        len: usize,
    },

    /// A structured value doesn't match the kind declared by the layout
    ValueMismatch {
        /// Position of the offending value within the tuple
        index: usize,
    },

    /// The value doesn't fit into the field
    ///
    /// Only returned by the checked setters. The regular setters silently
    /// truncate instead.
    ValueOutOfRange,

    /// The weekday read from the device is not valid for the codec
    InvalidWeekday(u8),

    /// An alarm in a shared day/weekday register enables both fields
    AlarmConflict,

    /// An error occured while encoding or decoding a structured payload
    Bytes(byte::Error),

    /// An error occured while serializing or deserializing data
    Ssmarshal(ssmarshal::Error),
}

impl<E> From<ConfigError> for Error<E> {
    fn from(error: ConfigError) -> Self {
        Error::Config(error)
    }
}

impl<E> From<CodecError> for Error<E> {
    fn from(error: CodecError) -> Self {
        match error {
            CodecError::ValueOutOfRange => Error::ValueOutOfRange,
            CodecError::InvalidWeekday(raw) => Error::InvalidWeekday(raw),
            CodecError::AlarmConflict => Error::AlarmConflict,
        }
    }
}

impl<E> From<byte::Error> for Error<E> {
    fn from(error: byte::Error) -> Self {
        Error::Bytes(error)
    }
}

impl<E> From<ssmarshal::Error> for Error<E> {
    fn from(error: ssmarshal::Error) -> Self {
        Error::Ssmarshal(error)
    }
}

// We can't derive this implementation, as the compiler would then require
// `E: Debug` for every use of `Error`, not just for formatting.
impl<E> fmt::Debug for Error<E>
where
    E: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Bus(error) => write!(f, "Bus({:?})", error),
            Error::Config(error) => write!(f, "Config({:?})", error),
            Error::ReadOnly => write!(f, "ReadOnly"),
            Error::OutOfBounds { index, len } => {
                write!(f, "OutOfBounds {{ index: {:?}, len: {:?} }}", index, len)
            }
            Error::ValueMismatch { index } => {
                write!(f, "ValueMismatch {{ index: {:?} }}", index)
            }
            Error::ValueOutOfRange => write!(f, "ValueOutOfRange"),
            Error::InvalidWeekday(raw) => write!(f, "InvalidWeekday({:?})", raw),
            Error::AlarmConflict => write!(f, "AlarmConflict"),
            Error::Bytes(error) => write!(f, "Bytes({:?})", error),
            Error::Ssmarshal(error) => write!(f, "Ssmarshal({:?})", error),
        }
    }
}

/// An error returned by the BCD date/time and alarm codecs
///
/// Converts into the [`Error`] variant of the same name, so codec failures
/// surface the same way whether the codec is used directly or through a
/// register field.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CodecError {
    /// A date or time component is outside of its calendar range
    ValueOutOfRange,

    /// A raw weekday outside of the range the codec is configured for
    InvalidWeekday(u8),

    /// Both day of month and weekday are set, but share one register
    AlarmConflict,
}

/// A field or accessor was constructed with an unusable configuration
///
/// Returned by constructors, so a bad register map fails when the device
/// object is built rather than on first access.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ConfigError {
    /// Address width must be between 1 and 4 bytes
    AddressWidth(u8),

    /// The address can't be represented with the configured address width
    AddressOverflow {
        /// The address that didn't fit
        address: u32,
    },

    /// Register width is zero or larger than the field supports
    RegisterWidth(usize),

    /// The field's bits don't fit into the register
    FieldOverflow,

    /// The field has no bits, or more bits than its value type can hold
    FieldWidth(u32),

    /// The read/write command bit must be `0` or `1`
    CommandBit(u8),

    /// The first day of the week must be numbered `0` or `1`
    WeekdayStart(u8),

    /// A structured layout must contain at least one value
    EmptyLayout,

    /// A structured layout is larger than the payload buffer
    LayoutTooLarge(usize),

    /// A serialized type doesn't have the size of the register layout
    LayoutMismatch {
        /// The size of the layout, in bytes
        expected: usize,
        /// The size of the serialized value, in bytes
        actual: usize,
    },
}
