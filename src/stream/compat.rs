//! UART compatibility shims
//!
//! Firmware that used to talk to a hardware serial port passes baud rate,
//! frame configuration, mode and pin to `begin`, and writes integers that
//! are narrowed to a byte. Both are accepted here so call sites do not have
//! to change.

/// UART parameters accepted by `begin_serial` and otherwise ignored
///
/// Converts from the same argument shapes a serial `begin` takes:
///
/// ```
/// use netdebug::SerialConfig;
///
/// let config: SerialConfig = (115_200_u32, 0x1c_u8).into();
/// assert_eq!(config.baud, 115_200);
/// assert_eq!(config.mode, 0);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SerialConfig {
    /// Baud rate in bits per second
    pub baud: u32,
    /// Frame configuration (data bits, parity, stop bits) as a UART constant
    pub config: u8,
    /// Direction mode, 0 when not given
    pub mode: u8,
    /// Transmit pin, 0 when not given
    pub tx_pin: u8,
}

impl From<u32> for SerialConfig {
    fn from(baud: u32) -> Self {
        Self {
            baud,
            ..Self::default()
        }
    }
}

impl From<(u32, u8)> for SerialConfig {
    fn from((baud, config): (u32, u8)) -> Self {
        Self {
            baud,
            config,
            ..Self::default()
        }
    }
}

impl From<(u32, u8, u8)> for SerialConfig {
    fn from((baud, config, mode): (u32, u8, u8)) -> Self {
        Self {
            baud,
            config,
            mode,
            tx_pin: 0,
        }
    }
}

impl From<(u32, u8, u8, u8)> for SerialConfig {
    fn from((baud, config, mode, tx_pin): (u32, u8, u8, u8)) -> Self {
        Self {
            baud,
            config,
            mode,
            tx_pin,
        }
    }
}

/// Integer types that a serial `write` narrows to their low byte
pub trait NarrowByte: Copy {
    /// Keeps the low eight bits, discarding the rest
    fn narrow(self) -> u8;
}

macro_rules! impl_narrow_byte {
    ($($ty:ty),*) => {
        $(
            impl NarrowByte for $ty {
                #[inline]
                fn narrow(self) -> u8 {
                    self as u8
                }
            }
        )*
    };
}

impl_narrow_byte!(u8, u16, u32, u64, usize, i8, i16, i32, i64, isize);
