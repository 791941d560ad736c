//! Time-based debounce for edge events.
//!
//! Pure logic plus one injected delay. Stateless across events:
//! wait a fixed settle time, re-sample the pin once, compare against
//! the configured pressed polarity.
//!
//! A pin that bounces several times inside the settle window is judged
//! only by the single sample taken at the end of it.

use embedded_hal::delay::DelayNs;

use crate::event::{Level, Polarity, RawEvent};
use crate::hal::{LevelReader, MonotonicClock};

/// Outcome of debouncing one event. Lives for one loop iteration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DebouncedDecision {
    pub is_valid_press: bool,
    /// Level read after the settle delay.
    pub settle_level: Level,
    pub decision_timestamp_us: i64,
}

/// Press classification: valid iff the settled level is the pressed level.
#[inline]
pub fn classify(polarity: Polarity, settle_level: Level) -> bool {
    polarity.is_pressed(settle_level)
}

/// Settle-then-resample debouncer.
pub struct Debouncer<D> {
    delay: D,
    settle_ms: u32,
    polarity: Polarity,
}

impl<D: DelayNs> Debouncer<D> {
    pub fn new(delay: D, settle_ms: u32, polarity: Polarity) -> Self {
        Self {
            delay,
            settle_ms,
            polarity,
        }
    }

    #[inline]
    pub fn settle_ms(&self) -> u32 {
        self.settle_ms
    }

    #[inline]
    pub fn polarity(&self) -> Polarity {
        self.polarity
    }

    /// Apply a new settle delay, taking effect on the next event.
    pub fn set_settle_ms(&mut self, settle_ms: u32) {
        self.settle_ms = settle_ms;
    }

    pub fn set_polarity(&mut self, polarity: Polarity) {
        self.polarity = polarity;
    }

    /// Debounce one event.
    ///
    /// Blocks for the settle delay (not cancellable), then re-samples
    /// the pin that raised the event.
    pub fn settle<P, C>(&mut self, event: &RawEvent, reader: &P, clock: &C) -> DebouncedDecision
    where
        P: LevelReader,
        C: MonotonicClock,
    {
        self.delay.delay_ms(self.settle_ms);

        let settle_level = reader.read_level(event.source_id);

        DebouncedDecision {
            is_valid_press: classify(self.polarity, settle_level),
            settle_level,
            decision_timestamp_us: clock.now_us(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::PinId;

    #[derive(Default)]
    struct CountingDelay {
        total_ns: u64,
    }

    impl DelayNs for CountingDelay {
        fn delay_ns(&mut self, ns: u32) {
            self.total_ns += ns as u64;
        }
    }

    struct Pin(Level);

    impl LevelReader for Pin {
        fn read_level(&self, _pin: PinId) -> Level {
            self.0
        }
    }

    struct Clock(i64);

    impl MonotonicClock for Clock {
        fn now_us(&self) -> i64 {
            self.0
        }
    }

    #[test]
    fn test_classify_matrix() {
        assert!(classify(Polarity::ActiveLow, Level::Low));
        assert!(!classify(Polarity::ActiveLow, Level::High));
        assert!(classify(Polarity::ActiveHigh, Level::High));
        assert!(!classify(Polarity::ActiveHigh, Level::Low));
    }

    #[test]
    fn test_settle_waits_full_delay() {
        let mut debouncer = Debouncer::new(CountingDelay::default(), 50, Polarity::ActiveLow);
        let event = RawEvent::new(PinId(0), Level::Low, 0);

        let decision = debouncer.settle(&event, &Pin(Level::Low), &Clock(50_000));

        assert!(decision.is_valid_press);
        assert_eq!(decision.decision_timestamp_us, 50_000);
        assert!(debouncer.delay.total_ns >= 50_000_000);
    }

    #[test]
    fn test_settle_ignores_capture_level() {
        // Captured as released, settled pressed: the settled sample decides
        let mut debouncer = Debouncer::new(CountingDelay::default(), 10, Polarity::ActiveHigh);
        let event = RawEvent::new(PinId(3), Level::Low, 0);

        let decision = debouncer.settle(&event, &Pin(Level::High), &Clock(0));

        assert!(decision.is_valid_press);
        assert_eq!(decision.settle_level, Level::High);
    }
}
