//! Press pipeline: the task-context consumer.
//!
//! ```text
//! EventQueue ──▶ debounce ──▶ select ──▶ emit ──▶ SelectorState
//!                  │ rejected                │ failed
//!                  └────────▶ DiagnosticSink ◀┘
//! ```
//!
//! One pipeline per button line, driven by one task. The pipeline owns
//! its `SelectorState`, so no lock is taken on the hot path. The task
//! suspends only in `receive_blocking` and in the settle delay, and holds
//! nothing shared while suspended.

use embedded_hal::delay::DelayNs;

use crate::alphabet::{Alphabet, Symbol};
use crate::config::{EmitterConfig, PipelineConfig};
use crate::debounce::{DebouncedDecision, Debouncer};
use crate::diagnostics::{Diagnostic, DiagnosticSink, LatencyTrace, WriteFailure};
use crate::emitter::{EmitError, EmitReport, Emitter};
use crate::event::RawEvent;
use crate::fault::{FaultCode, FaultState};
use crate::hal::{ByteChannel, LevelReader, MonotonicClock};
use crate::queue::{EventQueue, EventSource};
use crate::selector::{draws_from, mix_seed, select_bounded, DrawSource, Selection, SelectorState};

/// What happened to one dequeued event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PressOutcome {
    /// Debounce rejected it; nothing sent, state unchanged.
    Rejected(DebouncedDecision),
    /// Symbol sent and recorded as last emitted.
    Emitted { selection: Selection, report: EmitReport },
    /// Symbol selected but the write failed; state unchanged.
    WriteFailed { symbol: Symbol, failure: WriteFailure },
}

impl PressOutcome {
    /// Symbol that went out, if any.
    pub fn emitted_symbol(&self) -> Option<Symbol> {
        match self {
            PressOutcome::Emitted { selection, .. } => Some(selection.symbol),
            _ => None,
        }
    }
}

/// Counters since boot.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PressStats {
    pub received: u32,
    pub rejected: u32,
    pub emitted: u32,
    pub write_failures: u32,
    pub fallbacks: u32,
}

/// Debounce → select → emit consumer for one button line.
pub struct PressPipeline<'a, P, C, D, R, W, G = ()> {
    reader: P,
    clock: C,
    debouncer: Debouncer<D>,
    draws: R,
    emitter: Emitter<W>,
    alphabet: Alphabet<'a>,
    max_draws: usize,
    state: SelectorState,
    sink: G,
    fault: Option<&'a FaultState>,
    stats: PressStats,
    config_generation: u16,
}

impl<'a, P, C, D, R, W> PressPipeline<'a, P, C, D, R, W, ()>
where
    P: LevelReader,
    C: MonotonicClock,
    D: DelayNs,
    R: DrawSource,
    W: ByteChannel,
{
    /// Build a pipeline with no diagnostic sink and an empty state.
    pub fn new(
        reader: P,
        clock: C,
        delay: D,
        draws: R,
        channel: W,
        alphabet: Alphabet<'a>,
        config: &PipelineConfig,
    ) -> Self {
        Self {
            reader,
            clock,
            debouncer: Debouncer::new(delay, config.settle_ms, config.polarity),
            draws,
            emitter: Emitter::with_delimiter(channel, config.delimiter),
            alphabet,
            max_draws: config.max_draws as usize,
            state: SelectorState::new(),
            sink: (),
            fault: None,
            stats: PressStats::default(),
            config_generation: config.generation,
        }
    }
}

impl<'a, P, C, D, R, W, G> PressPipeline<'a, P, C, D, R, W, G>
where
    P: LevelReader,
    C: MonotonicClock,
    D: DelayNs,
    R: DrawSource,
    W: ByteChannel,
    G: DiagnosticSink,
{
    /// Attach a diagnostic sink.
    pub fn with_sink<G2: DiagnosticSink>(self, sink: G2) -> PressPipeline<'a, P, C, D, R, W, G2> {
        PressPipeline {
            reader: self.reader,
            clock: self.clock,
            debouncer: self.debouncer,
            draws: self.draws,
            emitter: self.emitter,
            alphabet: self.alphabet,
            max_draws: self.max_draws,
            state: self.state,
            sink,
            fault: self.fault,
            stats: self.stats,
            config_generation: self.config_generation,
        }
    }

    /// Record output write failures into `fault`.
    pub fn with_fault_state(mut self, fault: &'a FaultState) -> Self {
        self.fault = Some(fault);
        self
    }

    /// Start from a known selector state.
    pub fn with_state(mut self, state: SelectorState) -> Self {
        self.state = state;
        self
    }

    pub fn state(&self) -> &SelectorState {
        &self.state
    }

    pub fn stats(&self) -> &PressStats {
        &self.stats
    }

    pub fn sink(&self) -> &G {
        &self.sink
    }

    pub fn emitter(&self) -> &Emitter<W> {
        &self.emitter
    }

    pub fn debouncer(&self) -> &Debouncer<D> {
        &self.debouncer
    }

    /// Apply a config snapshot. Takes effect from the next event.
    pub fn apply_config(&mut self, config: &PipelineConfig) {
        self.debouncer.set_settle_ms(config.settle_ms);
        self.debouncer.set_polarity(config.polarity);
        self.emitter.set_delimiter(config.delimiter);
        self.max_draws = config.max_draws as usize;
        self.config_generation = config.generation;
    }

    /// Process one dequeued event to completion.
    ///
    /// Blocks for the settle delay. Never fails: every event ends as
    /// rejected, emitted, or a reported write failure.
    pub fn handle(&mut self, event: RawEvent) -> PressOutcome {
        let dequeued_us = self.clock.now_us();
        self.stats.received = self.stats.received.wrapping_add(1);

        let decision = self.debouncer.settle(&event, &self.reader, &self.clock);
        let mut trace = LatencyTrace {
            captured_us: event.capture_timestamp_us,
            dequeued_us,
            decided_us: decision.decision_timestamp_us,
            emitted_us: None,
        };

        if !decision.is_valid_press {
            self.stats.rejected = self.stats.rejected.wrapping_add(1);
            self.sink.record(&Diagnostic::Rejected {
                event,
                decision,
                trace,
            });
            return PressOutcome::Rejected(decision);
        }

        self.draws
            .reseed(mix_seed(self.clock.now_us(), self.clock.tick_count()));

        let selection = select_bounded(
            self.state.last_emitted(),
            draws_from(&mut self.draws),
            &self.alphabet,
            self.max_draws,
        );
        if selection.fallback {
            self.stats.fallbacks = self.stats.fallbacks.wrapping_add(1);
        }

        match self.emitter.emit(&mut self.state, selection) {
            Ok(report) => {
                trace.emitted_us = Some(self.clock.now_us());
                self.stats.emitted = self.stats.emitted.wrapping_add(1);
                self.sink.record(&Diagnostic::Emitted {
                    selection,
                    report,
                    trace,
                });
                PressOutcome::Emitted { selection, report }
            }
            Err(err) => {
                let failure = match err {
                    EmitError::Channel(_) => WriteFailure::Channel,
                    EmitError::NothingWritten => WriteFailure::NothingWritten,
                };
                self.stats.write_failures = self.stats.write_failures.wrapping_add(1);
                if let Some(fault) = self.fault {
                    fault.set(FaultCode::OutputWrite, self.stats.write_failures);
                }
                self.sink.record(&Diagnostic::WriteFailed {
                    symbol: selection.symbol,
                    failure,
                    trace,
                });
                PressOutcome::WriteFailed {
                    symbol: selection.symbol,
                    failure,
                }
            }
        }
    }

    /// Handle the next queued event, if any. Never waits for one.
    pub fn poll<const N: usize>(&mut self, queue: &EventQueue<N>) -> Option<PressOutcome> {
        queue.try_pop().map(|event| self.handle(event))
    }

    /// Press task body. Never returns.
    ///
    /// Picks up configuration changes between events.
    pub fn run<S: EventSource>(&mut self, source: &mut S, config: &EmitterConfig) -> ! {
        loop {
            let event = source.receive_blocking();

            if config.generation() != self.config_generation {
                self.apply_config(&config.snapshot());
            }

            self.handle(event);
        }
    }
}
