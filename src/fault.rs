//! Fault recording for RustPressSymbol.
//!
//! Nothing in the press pipeline is fatal. A fault here means an item
//! was discarded (event dropped, symbol not sent) and the loop went on.
//! The state is atomics only, so the edge ISR may record into it.

use core::sync::atomic::{AtomicBool, AtomicU32, AtomicU8, Ordering};

/// Fault codes for discarded work.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum FaultCode {
    /// No fault (normal operation).
    None = 0,

    /// Edge event dropped: queue full at interrupt time.
    QueueFull = 1,

    /// Symbol not sent: output channel write failed or accepted nothing.
    OutputWrite = 2,

    /// Hardware fault: GPIO interrupt could not be re-armed.
    HardwareFault = 3,
}

impl FaultCode {
    /// Convert from raw u8 value.
    pub fn from_u8(value: u8) -> Self {
        match value {
            1 => FaultCode::QueueFull,
            2 => FaultCode::OutputWrite,
            3 => FaultCode::HardwareFault,
            _ => FaultCode::None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FaultCode::None => "none",
            FaultCode::QueueFull => "queue full",
            FaultCode::OutputWrite => "output write",
            FaultCode::HardwareFault => "hardware",
        }
    }
}

/// ISR-safe record of the most recent fault.
///
/// # Usage
///
/// ```ignore
/// static FAULT: FaultState = FaultState::new();
///
/// // In the edge ISR:
/// if !queue.try_push(event) {
///     FAULT.set(FaultCode::QueueFull, queue.dropped());
/// }
///
/// // In the log drain task:
/// if FAULT.is_active() {
///     report(FAULT.snapshot());
///     FAULT.clear();
/// }
/// ```
pub struct FaultState {
    /// True if a fault is pending report.
    active: AtomicBool,

    /// Fault code of the latest fault.
    code: AtomicU8,

    /// Additional data (drop count, bytes written).
    data: AtomicU32,

    /// Total fault count since boot (never cleared).
    count: AtomicU32,
}

impl FaultState {
    pub const fn new() -> Self {
        Self {
            active: AtomicBool::new(false),
            code: AtomicU8::new(0),
            data: AtomicU32::new(0),
            count: AtomicU32::new(0),
        }
    }

    /// Record a fault and bump the counter.
    #[inline]
    pub fn set(&self, code: FaultCode, data: u32) {
        self.code.store(code as u8, Ordering::Release);
        self.data.store(data, Ordering::Release);
        self.count.fetch_add(1, Ordering::Relaxed);
        self.active.store(true, Ordering::Release);
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// Code of the latest fault (only meaningful if `is_active()` is true).
    #[inline]
    pub fn code(&self) -> FaultCode {
        FaultCode::from_u8(self.code.load(Ordering::Acquire))
    }

    #[inline]
    pub fn data(&self) -> u32 {
        self.data.load(Ordering::Acquire)
    }

    #[inline]
    pub fn count(&self) -> u32 {
        self.count.load(Ordering::Relaxed)
    }

    /// Mark the fault as reported. The counter is kept.
    #[inline]
    pub fn clear(&self) {
        self.active.store(false, Ordering::Release);
    }

    #[inline]
    pub fn snapshot(&self) -> FaultSnapshot {
        FaultSnapshot {
            active: self.is_active(),
            code: self.code(),
            data: self.data(),
            count: self.count(),
        }
    }
}

impl Default for FaultState {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of fault state at a point in time.
#[derive(Clone, Copy, Debug)]
pub struct FaultSnapshot {
    pub active: bool,
    pub code: FaultCode,
    pub data: u32,
    pub count: u32,
}
