//! Lock-free SPSC (Single Producer, Single Consumer) edge event queue.
//!
//! The only synchronized handoff between the edge ISR and the press task.
//!
//! # Architecture
//!
//! ```text
//! Edge ISR ──try_push──▶ [E0][E1]..[E9] ──try_pop──▶ Press task
//! never blocks            bounded FIFO               may block
//! drop-newest on full
//! ```
//!
//! # Rules
//!
//! - The ISR never blocks and never takes a lock
//! - Full queue: the new event is dropped, queued events are untouched
//! - Events leave in the order they entered

use core::cell::UnsafeCell;
use core::sync::atomic::{AtomicU32, Ordering};

use crate::config::QUEUE_CAPACITY;
use crate::event::RawEvent;

/// Bounded lock-free ring of edge events.
///
/// Indices run over `0..2N` so that "full" and "empty" are distinguishable
/// without a separate counter and without requiring `N` to be a power of 2.
///
/// # Safety
///
/// Uses `UnsafeCell` slots but is safe within these rules:
/// - Exactly one producer (the edge ISR) calls `try_push`
/// - Exactly one consumer (the press task) calls `try_pop`
/// - A slot is written only while it is outside the readable window,
///   and read only while inside it
///
/// # Memory Ordering
///
/// - Producer publishes a slot with `Release` on `write_idx`
/// - Consumer frees a slot with `Release` on `read_idx`
/// - Each side loads the other's index with `Acquire`
pub struct EventQueue<const N: usize = QUEUE_CAPACITY> {
    slots: [UnsafeCell<RawEvent>; N],
    write_idx: AtomicU32,
    read_idx: AtomicU32,
    dropped: AtomicU32,
}

// SAFETY: Single producer, single consumer, atomic coordination.
unsafe impl<const N: usize> Sync for EventQueue<N> {}
unsafe impl<const N: usize> Send for EventQueue<N> {}

impl<const N: usize> EventQueue<N> {
    const WRAP: u32 = 2 * N as u32;

    /// Create an empty queue.
    ///
    /// # Panics
    ///
    /// Panics at compile time (in `static` context) if `N` is zero.
    pub const fn new() -> Self {
        assert!(N > 0, "Event queue needs at least one slot");
        assert!(N <= (u32::MAX / 4) as usize, "Event queue too large");

        Self {
            slots: {
                const EMPTY_SLOT: UnsafeCell<RawEvent> = UnsafeCell::new(RawEvent::EMPTY);
                [EMPTY_SLOT; N]
            },
            write_idx: AtomicU32::new(0),
            read_idx: AtomicU32::new(0),
            dropped: AtomicU32::new(0),
        }
    }

    #[inline]
    fn distance(write: u32, read: u32) -> u32 {
        (write + Self::WRAP - read) % Self::WRAP
    }

    /// Enqueue an event (ISR-safe, never blocks).
    ///
    /// Returns `false` and counts a drop if the queue is full.
    ///
    /// # Timing
    ///
    /// O(1), no allocation, no lock.
    #[inline]
    pub fn try_push(&self, event: RawEvent) -> bool {
        // Producer owns write_idx
        let write = self.write_idx.load(Ordering::Relaxed);
        let read = self.read_idx.load(Ordering::Acquire);

        if Self::distance(write, read) >= N as u32 {
            self.dropped.fetch_add(1, Ordering::Relaxed);
            return false;
        }

        // SAFETY: Slot is outside the readable window, only the producer writes it
        unsafe {
            *self.slots[(write as usize) % N].get() = event;
        }

        self.write_idx.store((write + 1) % Self::WRAP, Ordering::Release);
        true
    }

    /// Dequeue the oldest event.
    ///
    /// Returns `None` if the queue is empty.
    #[inline]
    pub fn try_pop(&self) -> Option<RawEvent> {
        // Consumer owns read_idx
        let read = self.read_idx.load(Ordering::Relaxed);
        let write = self.write_idx.load(Ordering::Acquire);

        if read == write {
            return None;
        }

        // SAFETY: Slot is inside the readable window, the producer won't touch it
        let event = unsafe { *self.slots[(read as usize) % N].get() };

        self.read_idx.store((read + 1) % Self::WRAP, Ordering::Release);
        Some(event)
    }

    /// Number of events waiting.
    #[inline]
    pub fn len(&self) -> usize {
        let read = self.read_idx.load(Ordering::Acquire);
        let write = self.write_idx.load(Ordering::Acquire);
        Self::distance(write, read) as usize
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.len() >= N
    }

    #[inline]
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Count of events dropped because the queue was full.
    #[inline]
    pub fn dropped(&self) -> u32 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Reset dropped counter (e.g., after reporting).
    #[inline]
    pub fn reset_dropped(&self) {
        self.dropped.store(0, Ordering::Relaxed);
    }
}

impl<const N: usize> Default for EventQueue<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// Blocking event receive for the press task.
pub trait EventSource {
    /// Block until an event is available. No timeout.
    fn receive_blocking(&mut self) -> RawEvent;
}

/// Suspends the consumer until the producer signals new data.
pub trait Waiter {
    fn wait(&mut self);
}

/// Busy-wait waiter, for hosts and bring-up.
#[derive(Default)]
pub struct SpinWaiter;

impl Waiter for SpinWaiter {
    #[inline]
    fn wait(&mut self) {
        core::hint::spin_loop();
    }
}

/// Consumer end of an [`EventQueue`] paired with a [`Waiter`].
pub struct QueueReceiver<'q, W, const N: usize = QUEUE_CAPACITY> {
    queue: &'q EventQueue<N>,
    waiter: W,
}

impl<'q, W: Waiter, const N: usize> QueueReceiver<'q, W, N> {
    pub fn new(queue: &'q EventQueue<N>, waiter: W) -> Self {
        Self { queue, waiter }
    }

    pub fn queue(&self) -> &'q EventQueue<N> {
        self.queue
    }
}

impl<'q, W: Waiter, const N: usize> EventSource for QueueReceiver<'q, W, N> {
    fn receive_blocking(&mut self) -> RawEvent {
        loop {
            if let Some(event) = self.queue.try_pop() {
                return event;
            }
            self.waiter.wait();
        }
    }
}
