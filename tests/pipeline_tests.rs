//! End-to-end press pipeline tests

use std::sync::{Arc, Mutex};
use std::thread;

use embedded_hal::delay::DelayNs;

use rust_press_symbol::alphabet::{Alphabet, Symbol};
use rust_press_symbol::capture::EdgeCapture;
use rust_press_symbol::config::{EmitterConfig, PipelineConfig};
use rust_press_symbol::diagnostics::{Diagnostic, DiagnosticSink, LogSink, WriteFailure};
use rust_press_symbol::emitter::Emitter;
use rust_press_symbol::event::{Level, PinId, Polarity, RawEvent};
use rust_press_symbol::fault::{FaultCode, FaultState};
use rust_press_symbol::hal::{ByteChannel, LevelReader, MonotonicClock};
use rust_press_symbol::logging::{LogLevel, LogStream};
use rust_press_symbol::pipeline::{PressOutcome, PressPipeline};
use rust_press_symbol::queue::EventQueue;
use rust_press_symbol::selector::{
    draws_from, select, ScriptedDraws, SelectorState, SharedSelectorState, XorShiftDraws,
};

// ============================================================================
// Test doubles
// ============================================================================

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

/// Settle delay that returns immediately.
struct NoDelay;

impl DelayNs for NoDelay {
    fn delay_ns(&mut self, _ns: u32) {}
}

/// Channel that fails the writes listed in `fail_on` (0-based call index).
#[derive(Default)]
struct FlakyUart {
    out: Vec<u8>,
    calls: usize,
    fail_on: Vec<usize>,
}

impl ByteChannel for FlakyUart {
    type Error = &'static str;

    fn write(&mut self, bytes: &[u8]) -> Result<usize, &'static str> {
        let call = self.calls;
        self.calls += 1;
        if self.fail_on.contains(&call) {
            return Err("uart timeout");
        }
        self.out.extend_from_slice(bytes);
        Ok(bytes.len())
    }
}

#[derive(Default)]
struct Recorder(Vec<Diagnostic>);

impl DiagnosticSink for Recorder {
    fn record(&mut self, diagnostic: &Diagnostic) {
        self.0.push(*diagnostic);
    }
}

fn press(ts: i64) -> RawEvent {
    RawEvent::new(PinId(0), Level::Low, ts)
}

// ============================================================================
// Tests
// ============================================================================

#[test]
fn test_isr_to_uart_end_to_end() {
    let queue: EventQueue = EventQueue::new();
    let capture = EdgeCapture::new(PinId(0), &queue, Pin(Level::Low), Clock(1_000));
    capture.capture();
    capture.capture();
    capture.capture();

    let draws = [0, 0, 1, 1, 2];
    let mut pipeline = PressPipeline::new(
        Pin(Level::Low),
        Clock(51_000),
        NoDelay,
        ScriptedDraws::new(&draws),
        FlakyUart::default(),
        Alphabet::UPPERCASE,
        &PipelineConfig::default(),
    );

    let mut emitted = Vec::new();
    while let Some(outcome) = pipeline.poll(&queue) {
        emitted.extend(outcome.emitted_symbol());
    }

    // A, then A repeats so B, then B repeats so C
    assert_eq!(emitted, vec![Symbol(b'A'), Symbol(b'B'), Symbol(b'C')]);
    assert_eq!(pipeline.emitter().channel().out, b"A\nB\nC\n");
    assert_eq!(pipeline.state().last_emitted(), Some(Symbol(b'C')));
    assert_eq!(pipeline.stats().emitted, 3);
    assert_eq!(pipeline.debouncer().settle_ms(), 50);
}

#[test]
fn test_failed_write_keeps_previous_symbol() {
    let fault = FaultState::new();
    let uart = FlakyUart {
        fail_on: vec![1],
        ..Default::default()
    };

    let mut pipeline = PressPipeline::new(
        Pin(Level::Low),
        Clock(0),
        NoDelay,
        ScriptedDraws::new(&[3, 7, 7]),
        uart,
        Alphabet::UPPERCASE,
        &PipelineConfig::default(),
    )
    .with_fault_state(&fault)
    .with_sink(Recorder::default());

    assert_eq!(pipeline.handle(press(0)).emitted_symbol(), Some(Symbol(b'D')));

    let failed = pipeline.handle(press(10));
    assert_eq!(
        failed,
        PressOutcome::WriteFailed {
            symbol: Symbol(b'H'),
            failure: WriteFailure::Channel,
        }
    );
    assert_eq!(pipeline.state().last_emitted(), Some(Symbol(b'D')));
    assert_eq!(fault.code(), FaultCode::OutputWrite);
    assert_eq!(fault.data(), 1);

    // Loop keeps going: H was never sent, so H is still fair
    assert_eq!(pipeline.handle(press(20)).emitted_symbol(), Some(Symbol(b'H')));
    assert_eq!(pipeline.emitter().channel().out, b"D\nH\n");

    let stats = *pipeline.stats();
    assert_eq!(stats.received, 3);
    assert_eq!(stats.emitted, 2);
    assert_eq!(stats.write_failures, 1);

    let kinds: Vec<&str> = pipeline
        .sink()
        .0
        .iter()
        .map(|d| match d {
            Diagnostic::Rejected { .. } => "rejected",
            Diagnostic::Emitted { .. } => "emitted",
            Diagnostic::WriteFailed { .. } => "failed",
        })
        .collect();
    assert_eq!(kinds, vec!["emitted", "failed", "emitted"]);
}

#[test]
fn test_fallback_counted_in_stats() {
    let mut pipeline = PressPipeline::new(
        Pin(Level::Low),
        Clock(0),
        NoDelay,
        ScriptedDraws::new(&[25]),
        FlakyUart::default(),
        Alphabet::UPPERCASE,
        &PipelineConfig::default(),
    )
    .with_state(SelectorState::with_last(Symbol(b'Z')));

    match pipeline.handle(press(0)) {
        PressOutcome::Emitted { selection, .. } => {
            assert!(selection.fallback);
            assert_eq!(selection.symbol, Symbol(b'A'));
            assert_eq!(selection.attempts, 10);
        }
        other => panic!("expected emission, got {:?}", other),
    }
    assert_eq!(pipeline.stats().fallbacks, 1);
}

#[test]
fn test_log_sink_reports_each_outcome() {
    let stream = LogStream::<16>::new();

    let mut pipeline = PressPipeline::new(
        Pin(Level::Low),
        Clock(500),
        NoDelay,
        ScriptedDraws::new(&[2]),
        FlakyUart {
            fail_on: vec![1],
            ..Default::default()
        },
        Alphabet::UPPERCASE,
        &PipelineConfig::default(),
    )
    .with_sink(LogSink::new(&stream));

    pipeline.handle(press(100));
    pipeline.handle(press(200));

    let first = stream.drain().unwrap();
    assert_eq!(first.level, LogLevel::Info);
    assert!(first.message().starts_with("sent C (1 draws)"));
    assert!(first.message().contains("wait=400us"));

    let second = stream.drain().unwrap();
    assert_eq!(second.level, LogLevel::Warn);
    assert!(second.message().starts_with("write of D failed"));

    assert!(stream.drain().is_none());
}

#[test]
fn test_apply_config_changes_next_event() {
    let config = EmitterConfig::new();
    let mut pipeline = PressPipeline::new(
        Pin(Level::High),
        Clock(0),
        NoDelay,
        ScriptedDraws::new(&[4]),
        FlakyUart::default(),
        Alphabet::UPPERCASE,
        &config.snapshot(),
    );

    // Active-low: a high pin is a bounce
    assert!(matches!(pipeline.handle(press(0)), PressOutcome::Rejected(_)));

    config.set_polarity(Polarity::ActiveHigh);
    config.set_delimiter(None);
    assert_eq!(config.set_settle_ms(500), 200);
    pipeline.apply_config(&config.snapshot());

    assert_eq!(pipeline.handle(press(1)).emitted_symbol(), Some(Symbol(b'E')));
    assert_eq!(pipeline.emitter().channel().out, b"E");
    assert_eq!(pipeline.debouncer().settle_ms(), 200);
}

#[test]
fn test_xorshift_pipeline_never_repeats() {
    let mut pipeline = PressPipeline::new(
        Pin(Level::Low),
        Clock(123_456),
        NoDelay,
        XorShiftDraws::new(7),
        FlakyUart::default(),
        Alphabet::new(b"AB").unwrap(),
        &PipelineConfig::default(),
    );

    for ts in 0..500 {
        pipeline.handle(press(ts));
    }

    let frames: Vec<u8> = pipeline
        .emitter()
        .channel()
        .out
        .chunks(2)
        .map(|f| f[0])
        .collect();
    assert_eq!(frames.len(), 500);
    assert!(frames.windows(2).all(|w| w[0] != w[1]));
}

#[test]
fn test_shared_state_across_tasks() {
    let shared = Arc::new(SharedSelectorState::new());
    let wire = Arc::new(Mutex::new(Vec::<u8>::new()));

    struct SharedWire(Arc<Mutex<Vec<u8>>>);

    impl ByteChannel for SharedWire {
        type Error = ();

        fn write(&mut self, bytes: &[u8]) -> Result<usize, ()> {
            self.0.lock().unwrap().extend_from_slice(bytes);
            Ok(bytes.len())
        }
    }

    let handles: Vec<_> = (0..4u32)
        .map(|task| {
            let shared = Arc::clone(&shared);
            let wire = Arc::clone(&wire);
            thread::spawn(move || {
                let mut rng = XorShiftDraws::new(task + 1);
                let mut emitter = Emitter::with_delimiter(SharedWire(wire), None);
                let abc = Alphabet::new(b"XY").unwrap();
                for _ in 0..250 {
                    shared.transact(|state| {
                        let sel = select(
                            state.last_emitted(),
                            draws_from(&mut rng),
                            &abc,
                        );
                        emitter.emit(state, sel).unwrap();
                    });
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    let out = wire.lock().unwrap();
    assert_eq!(out.len(), 1_000);
    assert!(out.windows(2).all(|w| w[0] != w[1]));
    assert_eq!(shared.last_emitted(), Some(Symbol(out[999])));
}
