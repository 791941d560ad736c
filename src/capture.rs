//! Edge capture: the interrupt-context producer.
//!
//! Runs inside the GPIO edge ISR. Samples level and time, builds a
//! [`RawEvent`] and hands it to the queue. Nothing else.
//!
//! # Rules
//!
//! - Bounded time: two reads, one store, no loops
//! - No blocking, no allocation, no logging
//! - Full queue: drop the new event, never wait
//! - The yield-from-ISR hint belongs to the ISR glue, not to `capture`

use crate::config::QUEUE_CAPACITY;
use crate::event::{PinId, RawEvent};
use crate::fault::{FaultCode, FaultState};
use crate::hal::{LevelReader, MonotonicClock};
use crate::queue::EventQueue;

/// Result of one capture attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CaptureOutcome {
    /// Event is in the queue; the consumer should be woken.
    Queued,
    /// Queue was full; event discarded.
    Dropped,
}

/// ISR-side producer bound to one button line.
pub struct EdgeCapture<'q, P, C, const N: usize = QUEUE_CAPACITY> {
    pin: PinId,
    queue: &'q EventQueue<N>,
    reader: P,
    clock: C,
    fault: Option<&'q FaultState>,
}

impl<'q, P, C, const N: usize> EdgeCapture<'q, P, C, N>
where
    P: LevelReader,
    C: MonotonicClock,
{
    pub fn new(pin: PinId, queue: &'q EventQueue<N>, reader: P, clock: C) -> Self {
        Self {
            pin,
            queue,
            reader,
            clock,
            fault: None,
        }
    }

    /// Record queue-full drops into `fault`.
    pub fn with_fault_state(mut self, fault: &'q FaultState) -> Self {
        self.fault = Some(fault);
        self
    }

    #[inline]
    pub fn pin(&self) -> PinId {
        self.pin
    }

    /// Capture one edge. Call from the ISR only.
    #[inline]
    pub fn capture(&self) -> CaptureOutcome {
        let level = self.reader.read_level(self.pin);
        let now_us = self.clock.now_us();
        let event = RawEvent::new(self.pin, level, now_us);

        if self.queue.try_push(event) {
            CaptureOutcome::Queued
        } else {
            if let Some(fault) = self.fault {
                fault.set(FaultCode::QueueFull, self.queue.dropped());
            }
            CaptureOutcome::Dropped
        }
    }
}
