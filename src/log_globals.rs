//! Global log and fault instances.
//!
//! One log ring: producers are the press task and startup code,
//! the single consumer is the log drain task.

use crate::fault::FaultState;
use crate::logging::LogStream;

/// Firmware log ring, drained to the console UART.
pub static LOG_STREAM: LogStream = LogStream::new();

/// Latest non-fatal fault, written by the edge ISR and the press task.
pub static FAULT_STATE: FaultState = FaultState::new();
