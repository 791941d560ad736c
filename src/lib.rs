//! # RustPressSymbol
//!
//! Button press → debounced → one symbol on a UART, never the same
//! symbol twice in a row.
//!
//! ## Architecture
//!
//! ```text
//! GPIO edge ISR ──▶ EventQueue ──▶ PressPipeline ──▶ UART1
//!  EdgeCapture      (lock-free     debounce
//!  (no blocking)     SPSC, 10)     select (anti-repeat)
//!                                  emit
//! ```
//!
//! - The ISR only samples and enqueues; a full queue drops the new event
//! - The press task owns all mutable selection state
//! - Diagnostics and logs observe, they never steer
//!
//! Everything except `hal::esp` is pure logic and runs on the host.

#![cfg_attr(not(test), no_std)]

pub mod alphabet;
pub mod capture;
pub mod config;
pub mod debounce;
pub mod diagnostics;
pub mod emitter;
pub mod event;
pub mod fault;
pub mod hal;
pub mod log_globals;
pub mod logging;
pub mod pipeline;
pub mod queue;
pub mod selector;
pub mod uart_logger;

pub use alphabet::{Alphabet, AlphabetError, Symbol};
pub use capture::{CaptureOutcome, EdgeCapture};
pub use config::{PipelineConfig, CONFIG};
pub use debounce::{DebouncedDecision, Debouncer};
pub use emitter::{EmitError, Emitter};
pub use event::{Level, PinId, Polarity, RawEvent};
pub use fault::{FaultCode, FaultState};
pub use log_globals::{FAULT_STATE, LOG_STREAM};
pub use pipeline::{PressOutcome, PressPipeline, PressStats};
pub use queue::{EventQueue, EventSource};
pub use selector::{select, Selection, SelectorState, SharedSelectorState};
