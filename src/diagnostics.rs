//! Diagnostic sink for press latency observability.
//!
//! The pipeline reports at fixed points (capture, dequeue, decision,
//! emission). Sinks observe only; nothing they do feeds back into
//! control flow. `()` is the absent sink.

use crate::alphabet::Symbol;
use crate::debounce::DebouncedDecision;
use crate::emitter::EmitReport;
use crate::event::RawEvent;
use crate::logging::LogStream;
use crate::selector::Selection;

/// Timestamps (µs) collected for one event.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LatencyTrace {
    pub captured_us: i64,
    pub dequeued_us: i64,
    pub decided_us: i64,
    pub emitted_us: Option<i64>,
}

impl LatencyTrace {
    /// Time spent waiting in the queue.
    #[inline]
    pub fn queue_wait_us(&self) -> i64 {
        self.dequeued_us - self.captured_us
    }

    /// Time spent debouncing.
    #[inline]
    pub fn settle_us(&self) -> i64 {
        self.decided_us - self.dequeued_us
    }

    /// Edge to last recorded point.
    #[inline]
    pub fn total_us(&self) -> i64 {
        self.emitted_us.unwrap_or(self.decided_us) - self.captured_us
    }
}

/// Why a write produced no emission.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WriteFailure {
    Channel,
    NothingWritten,
}

/// One diagnostic record.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Diagnostic {
    /// Debounce rejected the event (bounce or spurious edge).
    Rejected {
        event: RawEvent,
        decision: DebouncedDecision,
        trace: LatencyTrace,
    },
    /// Symbol written.
    Emitted {
        selection: Selection,
        report: EmitReport,
        trace: LatencyTrace,
    },
    /// Symbol selected but not sent.
    WriteFailed {
        symbol: Symbol,
        failure: WriteFailure,
        trace: LatencyTrace,
    },
}

impl Diagnostic {
    pub fn trace(&self) -> &LatencyTrace {
        match self {
            Diagnostic::Rejected { trace, .. }
            | Diagnostic::Emitted { trace, .. }
            | Diagnostic::WriteFailed { trace, .. } => trace,
        }
    }
}

pub trait DiagnosticSink {
    fn record(&mut self, diagnostic: &Diagnostic);
}

impl DiagnosticSink for () {
    #[inline]
    fn record(&mut self, _diagnostic: &Diagnostic) {}
}

impl<T: DiagnosticSink + ?Sized> DiagnosticSink for &mut T {
    #[inline]
    fn record(&mut self, diagnostic: &Diagnostic) {
        (**self).record(diagnostic)
    }
}

/// Formats diagnostics into a [`LogStream`].
pub struct LogSink<'a, const N: usize = { crate::logging::LOG_BUFFER_SIZE }> {
    stream: &'a LogStream<N>,
}

impl<'a, const N: usize> LogSink<'a, N> {
    pub fn new(stream: &'a LogStream<N>) -> Self {
        Self { stream }
    }
}

impl<'a, const N: usize> DiagnosticSink for LogSink<'a, N> {
    fn record(&mut self, diagnostic: &Diagnostic) {
        let trace = diagnostic.trace();
        let ts = trace.emitted_us.unwrap_or(trace.decided_us);

        match diagnostic {
            Diagnostic::Rejected { event, decision, .. } => {
                crate::rt_debug!(
                    self.stream,
                    ts,
                    "bounce on GPIO{}: settled {:?}, dropped after {}us",
                    event.source_id.number(),
                    decision.settle_level,
                    trace.total_us()
                );
            }
            Diagnostic::Emitted { selection, report, .. } => {
                crate::rt_info!(
                    self.stream,
                    ts,
                    "sent {} ({} draws{}{}) wait={}us settle={}us total={}us",
                    selection.symbol,
                    selection.attempts,
                    if selection.fallback { ", fallback" } else { "" },
                    if report.is_partial() { ", partial" } else { "" },
                    trace.queue_wait_us(),
                    trace.settle_us(),
                    trace.total_us()
                );
            }
            Diagnostic::WriteFailed { symbol, failure, .. } => {
                crate::rt_warn!(
                    self.stream,
                    ts,
                    "write of {} failed: {:?}",
                    symbol,
                    failure
                );
            }
        }
    }
}
