//! Hardware Abstraction Layer for RustPressSymbol.
//!
//! Thin wrappers around ESP-IDF peripherals.
//! Business logic stays in core modules, HAL is just I/O.
//!
//! The traits below are the seams the core calls into. Device
//! implementations live in [`esp`]; tests supply their own doubles.

pub mod gpio;
pub mod uart;

#[cfg(target_os = "espidf")]
pub mod esp;

pub use gpio::ButtonPinConfig;
pub use uart::SymbolUartConfig;

use crate::event::{Level, PinId};

/// Pin level reader.
///
/// Must be callable from interrupt context: no blocking, no allocation.
pub trait LevelReader {
    fn read_level(&self, pin: PinId) -> Level;
}

/// Monotonic microsecond clock.
pub trait MonotonicClock {
    /// Microseconds since boot. Does not wrap within a session.
    fn now_us(&self) -> i64;

    /// Scheduler tick counter, used only as an entropy input.
    fn tick_count(&self) -> u32 {
        (self.now_us() / 1000) as u32
    }
}

/// Output byte channel for emitted symbols.
pub trait ByteChannel {
    type Error: core::fmt::Debug;

    /// Write `bytes`, returning how many were accepted.
    ///
    /// Partial writes are reported, not retried.
    fn write(&mut self, bytes: &[u8]) -> Result<usize, Self::Error>;
}

impl<T: LevelReader + ?Sized> LevelReader for &T {
    fn read_level(&self, pin: PinId) -> Level {
        (**self).read_level(pin)
    }
}

impl<T: MonotonicClock + ?Sized> MonotonicClock for &T {
    fn now_us(&self) -> i64 {
        (**self).now_us()
    }

    fn tick_count(&self) -> u32 {
        (**self).tick_count()
    }
}

impl<T: ByteChannel + ?Sized> ByteChannel for &mut T {
    type Error = T::Error;

    fn write(&mut self, bytes: &[u8]) -> Result<usize, Self::Error> {
        (**self).write(bytes)
    }
}
