//! Module: event
//!
//! Purpose: Edge event types handed from interrupt context to the press task.
//!
//! Architecture:
//! - `RawEvent` is built only inside the edge ISR, copied into a queue slot,
//!   and consumed by the single press task
//! - Compact `Copy` layout so a queue slot write is a plain store
//!
//! Safety: Safe. No unsafe blocks. Copy types only.

/// Logic level of a pin.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum Level {
    Low = 0,
    High = 1,
}

impl Level {
    /// Build from the raw value returned by a GPIO register read.
    #[inline]
    pub fn from_raw(raw: i32) -> Self {
        if raw == 0 {
            Level::Low
        } else {
            Level::High
        }
    }

    #[inline]
    pub fn is_high(self) -> bool {
        self == Level::High
    }
}

impl From<bool> for Level {
    fn from(high: bool) -> Self {
        if high {
            Level::High
        } else {
            Level::Low
        }
    }
}

/// GPIO number of a monitored pin.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PinId(pub u8);

impl PinId {
    #[inline]
    pub const fn number(self) -> u8 {
        self.0
    }
}

/// Which level means "pressed" for a button line.
///
/// Fixed per deployment, never auto-detected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Polarity {
    /// Pull-up wiring, button shorts to ground.
    #[default]
    ActiveLow,
    /// Pull-down wiring, button connects to VCC.
    ActiveHigh,
}

impl Polarity {
    /// Level the pin reads while the button is held.
    #[inline]
    pub fn pressed_level(self) -> Level {
        match self {
            Polarity::ActiveLow => Level::Low,
            Polarity::ActiveHigh => Level::High,
        }
    }

    /// Level the pin reads while the button is idle.
    #[inline]
    pub fn released_level(self) -> Level {
        match self {
            Polarity::ActiveLow => Level::High,
            Polarity::ActiveHigh => Level::Low,
        }
    }

    #[inline]
    pub fn is_pressed(self, level: Level) -> bool {
        level == self.pressed_level()
    }
}

/// Edge event captured at interrupt time.
///
/// Immutable once built. Ownership moves ISR → queue slot → press task.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RawEvent {
    /// Pin that raised the interrupt.
    pub source_id: PinId,
    /// Pin level sampled inside the ISR.
    pub level_at_capture: Level,
    /// Monotonic timestamp (µs) sampled inside the ISR.
    pub capture_timestamp_us: i64,
}

impl RawEvent {
    /// Placeholder used to initialise queue storage.
    pub const EMPTY: Self = Self {
        source_id: PinId(0),
        level_at_capture: Level::Low,
        capture_timestamp_us: 0,
    };

    #[inline]
    pub const fn new(source_id: PinId, level_at_capture: Level, capture_timestamp_us: i64) -> Self {
        Self {
            source_id,
            level_at_capture,
            capture_timestamp_us,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_polarity_levels() {
        assert_eq!(Polarity::ActiveLow.pressed_level(), Level::Low);
        assert_eq!(Polarity::ActiveLow.released_level(), Level::High);
        assert_eq!(Polarity::ActiveHigh.pressed_level(), Level::High);
        assert!(Polarity::ActiveHigh.is_pressed(Level::High));
        assert!(!Polarity::ActiveLow.is_pressed(Level::High));
    }

    #[test]
    fn test_level_from_raw() {
        assert_eq!(Level::from_raw(0), Level::Low);
        assert_eq!(Level::from_raw(1), Level::High);
        assert_eq!(Level::from(true), Level::High);
    }
}
