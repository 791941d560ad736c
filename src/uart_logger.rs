//! Log output on the console UART.
//!
//! Drains [`LogStream`] to a byte channel and periodically reports
//! dropped log lines, dropped edge events and the latest fault.
//!
//! # Hardware Setup
//!
//! ```text
//! ESP32-S3 GPIO43 (U0TXD) ──────▶ USB-UART bridge ──▶ PC serial monitor
//! ```
//!
//! The symbol stream uses UART1; logs never share it.

use core::fmt::Write;

use crate::fault::{FaultCode, FaultState};
use crate::hal::ByteChannel;
use crate::logging::{BufWriter, LogEntry, LogStream};

/// Health report period.
pub const REPORT_INTERVAL_US: i64 = 10_000_000;

/// Console UART configuration for logging.
pub struct UartLoggerConfig {
    pub baud_rate: u32,
    pub tx_pin: u8,
}

impl Default for UartLoggerConfig {
    fn default() -> Self {
        Self {
            baud_rate: 115200,
            tx_pin: 43, // U0TXD on ESP32-S3
        }
    }
}

/// Format log entry to bytes.
///
/// Format: `[timestamp_us] LEVEL: message\n`
pub fn format_log_entry(entry: &LogEntry, buf: &mut [u8]) -> usize {
    let mut writer = BufWriter::new(buf);
    let _ = write!(
        writer,
        "[{:10}] {}: {}\n",
        entry.timestamp_us,
        entry.level.as_str(),
        entry.message()
    );
    writer.len()
}

/// Write every pending entry to `out`. Returns how many were drained.
///
/// Write errors are ignored: a lost log line is not worth stalling for.
pub fn drain_to<W: ByteChannel, const N: usize>(stream: &LogStream<N>, out: &mut W) -> usize {
    let mut format_buf = [0u8; 160];
    let mut drained = 0;

    while let Some(entry) = stream.drain() {
        let len = format_log_entry(&entry, &mut format_buf);
        let _ = out.write(&format_buf[..len]);
        drained += 1;
    }

    drained
}

/// Drop and fault counters gathered for one health report.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct HealthCounters {
    pub log_dropped: u32,
    pub events_dropped: u32,
    pub fault: Option<(FaultCode, u32, u32)>,
}

impl HealthCounters {
    pub fn is_clean(&self) -> bool {
        self.log_dropped == 0 && self.events_dropped == 0 && self.fault.is_none()
    }
}

/// Collect counters and reset/clear the sources.
pub fn take_health<const N: usize>(
    stream: &LogStream<N>,
    events_dropped: u32,
    fault: &FaultState,
) -> HealthCounters {
    let log_dropped = stream.dropped();
    stream.reset_dropped();

    let snap = fault.snapshot();
    let fault = if snap.active {
        fault.clear();
        Some((snap.code, snap.data, snap.count))
    } else {
        None
    };

    HealthCounters {
        log_dropped,
        events_dropped,
        fault,
    }
}

/// Format a health report. Returns 0 if there is nothing to report.
pub fn format_health(health: &HealthCounters, buf: &mut [u8]) -> usize {
    if health.is_clean() {
        return 0;
    }

    let mut writer = BufWriter::new(buf);
    let _ = write!(
        writer,
        "[WARN] Dropped: log={}, events={}",
        health.log_dropped, health.events_dropped
    );
    if let Some((code, data, count)) = health.fault {
        let _ = write!(writer, "; fault={} data={} total={}", code.as_str(), data, count);
    }
    let _ = writer.write_str("\n");
    writer.len()
}

/// Log drain task (runs at low priority).
///
/// Drains `LOG_STREAM`, reports drops and faults every
/// [`REPORT_INTERVAL_US`], sleeps when idle.
#[cfg(target_os = "espidf")]
pub fn uart_logger_task<W: ByteChannel>(
    out: &mut W,
    event_queue: &crate::queue::EventQueue,
) -> ! {
    use crate::log_globals::{FAULT_STATE, LOG_STREAM};

    let mut report_buf = [0u8; 128];
    let mut last_report = 0i64;

    loop {
        let drained = drain_to(&LOG_STREAM, out);

        // SAFETY: esp_timer_get_time is always safe to call
        let now = unsafe { esp_idf_svc::sys::esp_timer_get_time() };
        if now - last_report > REPORT_INTERVAL_US {
            let events_dropped = event_queue.dropped();
            event_queue.reset_dropped();

            let health = take_health(&LOG_STREAM, events_dropped, &FAULT_STATE);
            let len = format_health(&health, &mut report_buf);
            if len > 0 {
                let _ = out.write(&report_buf[..len]);
            }
            last_report = now;
        }

        if drained == 0 {
            esp_idf_svc::hal::delay::FreeRtos::delay_ms(10);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::{LogLevel, MAX_MSG_LEN};

    struct Sink(Vec<u8>);

    impl ByteChannel for Sink {
        type Error = ();

        fn write(&mut self, bytes: &[u8]) -> Result<usize, ()> {
            self.0.extend_from_slice(bytes);
            Ok(bytes.len())
        }
    }

    #[test]
    fn test_format_log_entry() {
        let entry = LogEntry {
            timestamp_us: 1234567,
            level: LogLevel::Info,
            len: 9,
            msg: {
                let mut msg = [0u8; MAX_MSG_LEN];
                msg[..9].copy_from_slice(b"sent Q ok");
                msg
            },
        };

        let mut buf = [0u8; 160];
        let len = format_log_entry(&entry, &mut buf);

        let formatted = core::str::from_utf8(&buf[..len]).unwrap();
        assert_eq!(formatted, "[   1234567] INFO: sent Q ok\n");
    }

    #[test]
    fn test_drain_to_writes_in_order() {
        let stream = LogStream::<8>::new();
        stream.push(1, LogLevel::Info, b"one");
        stream.push(2, LogLevel::Warn, b"two");

        let mut sink = Sink(Vec::new());
        assert_eq!(drain_to(&stream, &mut sink), 2);

        let text = String::from_utf8(sink.0).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with("INFO: one"));
        assert!(lines[1].ends_with("WARN: two"));
    }

    #[test]
    fn test_health_report_clears_fault() {
        let stream = LogStream::<2>::new();
        stream.push(0, LogLevel::Info, b"a");
        stream.push(0, LogLevel::Info, b"b");
        stream.push(0, LogLevel::Info, b"c"); // dropped

        let fault = FaultState::new();
        fault.set(FaultCode::OutputWrite, 3);

        let health = take_health(&stream, 4, &fault);
        assert_eq!(health.log_dropped, 1);
        assert_eq!(health.fault, Some((FaultCode::OutputWrite, 3, 1)));
        assert!(!fault.is_active());
        assert_eq!(stream.dropped(), 0);

        let mut buf = [0u8; 128];
        let len = format_health(&health, &mut buf);
        let text = core::str::from_utf8(&buf[..len]).unwrap();
        assert_eq!(
            text,
            "[WARN] Dropped: log=1, events=4; fault=output write data=3 total=1\n"
        );
    }

    #[test]
    fn test_clean_health_formats_nothing() {
        let mut buf = [0u8; 64];
        assert_eq!(format_health(&HealthCounters::default(), &mut buf), 0);
    }
}
