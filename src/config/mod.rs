//! Module: config
//!
//! Purpose: Configuration for RustPressSymbol.
//!
//! Architecture:
//! - Compile-time design constants (queue capacity, draw bound, settle range)
//! - `CONFIG`: runtime-tunable values held in atomics, bumped `generation`
//!   on every change
//! - The press task reads a `PipelineConfig` snapshot and re-reads it only
//!   when the generation moves
//!
//! Safety: RT-safe. All access via atomics, no locks.

use core::sync::atomic::{AtomicBool, AtomicU16, AtomicU32, AtomicU8, Ordering};

use crate::event::Polarity;

/// Edge event queue slots.
pub const QUEUE_CAPACITY: usize = 10;

/// Random draws per selection before falling back to the successor.
pub const MAX_DRAWS: usize = 10;

/// Default debounce settle delay.
pub const DEFAULT_SETTLE_MS: u32 = 50;

/// Accepted settle delay range.
pub const MIN_SETTLE_MS: u32 = 50;
pub const MAX_SETTLE_MS: u32 = 200;

/// Byte sent after each symbol.
pub const DEFAULT_DELIMITER: u8 = b'\n';

/// Log tag for startup lines.
pub const TAG: &str = "press_symbol";

/// Plain-value view of [`EmitterConfig`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PipelineConfig {
    pub settle_ms: u32,
    pub max_draws: u8,
    pub polarity: Polarity,
    pub delimiter: Option<u8>,
    pub generation: u16,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            settle_ms: DEFAULT_SETTLE_MS,
            max_draws: MAX_DRAWS as u8,
            polarity: Polarity::ActiveLow,
            delimiter: Some(DEFAULT_DELIMITER),
            generation: 0,
        }
    }
}

/// Runtime configuration, lock-free.
pub struct EmitterConfig {
    settle_ms: AtomicU32,
    max_draws: AtomicU8,
    active_low: AtomicBool,
    /// 0 = no delimiter.
    delimiter: AtomicU8,
    generation: AtomicU16,
}

impl EmitterConfig {
    pub const fn new() -> Self {
        Self {
            settle_ms: AtomicU32::new(DEFAULT_SETTLE_MS),
            max_draws: AtomicU8::new(MAX_DRAWS as u8),
            active_low: AtomicBool::new(true),
            delimiter: AtomicU8::new(DEFAULT_DELIMITER),
            generation: AtomicU16::new(0),
        }
    }

    #[inline]
    fn bump(&self) {
        self.generation.fetch_add(1, Ordering::Release);
    }

    #[inline]
    pub fn generation(&self) -> u16 {
        self.generation.load(Ordering::Acquire)
    }

    /// Set the settle delay, clamped to `MIN_SETTLE_MS..=MAX_SETTLE_MS`.
    ///
    /// Returns the value actually stored.
    pub fn set_settle_ms(&self, ms: u32) -> u32 {
        let ms = ms.clamp(MIN_SETTLE_MS, MAX_SETTLE_MS);
        self.settle_ms.store(ms, Ordering::Relaxed);
        self.bump();
        ms
    }

    /// Set the draw bound (at least 1).
    pub fn set_max_draws(&self, draws: u8) {
        self.max_draws.store(draws.max(1), Ordering::Relaxed);
        self.bump();
    }

    pub fn set_polarity(&self, polarity: Polarity) {
        self.active_low
            .store(polarity == Polarity::ActiveLow, Ordering::Relaxed);
        self.bump();
    }

    /// `None` sends bare symbols. A NUL delimiter is treated as `None`.
    pub fn set_delimiter(&self, delimiter: Option<u8>) {
        self.delimiter.store(delimiter.unwrap_or(0), Ordering::Relaxed);
        self.bump();
    }

    pub fn snapshot(&self) -> PipelineConfig {
        let generation = self.generation();
        let delimiter = self.delimiter.load(Ordering::Relaxed);

        PipelineConfig {
            settle_ms: self.settle_ms.load(Ordering::Relaxed),
            max_draws: self.max_draws.load(Ordering::Relaxed),
            polarity: if self.active_low.load(Ordering::Relaxed) {
                Polarity::ActiveLow
            } else {
                Polarity::ActiveHigh
            },
            delimiter: if delimiter == 0 { None } else { Some(delimiter) },
            generation,
        }
    }
}

impl Default for EmitterConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Firmware-wide configuration.
pub static CONFIG: EmitterConfig = EmitterConfig::new();

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_constants() {
        let cfg = EmitterConfig::new().snapshot();
        assert_eq!(cfg, PipelineConfig::default());
    }

    #[test]
    fn test_settle_clamped() {
        let cfg = EmitterConfig::new();
        assert_eq!(cfg.set_settle_ms(5), MIN_SETTLE_MS);
        assert_eq!(cfg.set_settle_ms(1000), MAX_SETTLE_MS);
        assert_eq!(cfg.set_settle_ms(120), 120);
        assert_eq!(cfg.snapshot().settle_ms, 120);
    }

    #[test]
    fn test_generation_bumps_on_change() {
        let cfg = EmitterConfig::new();
        let g0 = cfg.generation();
        cfg.set_polarity(Polarity::ActiveHigh);
        cfg.set_delimiter(None);
        let snap = cfg.snapshot();
        assert_eq!(snap.generation, g0.wrapping_add(2));
        assert_eq!(snap.polarity, Polarity::ActiveHigh);
        assert_eq!(snap.delimiter, None);
    }

    #[test]
    fn test_max_draws_floor() {
        let cfg = EmitterConfig::new();
        cfg.set_max_draws(0);
        assert_eq!(cfg.snapshot().max_draws, 1);
    }
}
