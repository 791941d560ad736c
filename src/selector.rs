//! Constrained symbol selection.
//!
//! Picks a symbol that differs from the last emitted one.
//!
//! # Algorithm
//!
//! 1. Take up to `max_draws` pseudo-random draws, map each onto the
//!    alphabet by modulo, accept the first that differs from `last`
//! 2. If none differs, take the successor of `last` in alphabet order
//!    (wrapping last → first)
//!
//! Step 2 is O(1) and always differs from `last` when the alphabet has
//! two or more symbols. With a single-symbol alphabet, repeats are
//! expected.
//!
//! Randomness here is for variety only. Nothing depends on it being
//! unpredictable.

use core::cell::Cell;
use critical_section::Mutex;

use crate::alphabet::{Alphabet, Symbol};

/// Default bound on random draws per selection.
pub const MAX_DRAWS: usize = crate::config::MAX_DRAWS;

/// Result of one selection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Selection {
    pub symbol: Symbol,
    /// Draws consumed (0..=max_draws).
    pub attempts: u8,
    /// True if the successor fallback produced the symbol.
    pub fallback: bool,
}

/// Select with the default draw bound. See [`select_bounded`].
pub fn select<I>(last: Option<Symbol>, draws: I, alphabet: &Alphabet<'_>) -> Selection
where
    I: IntoIterator<Item = u32>,
{
    select_bounded(last, draws, alphabet, MAX_DRAWS)
}

/// Pure selection over an injected draw sequence.
///
/// At most `max_draws` items are pulled from `draws`.
pub fn select_bounded<I>(
    last: Option<Symbol>,
    draws: I,
    alphabet: &Alphabet<'_>,
    max_draws: usize,
) -> Selection
where
    I: IntoIterator<Item = u32>,
{
    let mut attempts: u8 = 0;

    for draw in draws.into_iter().take(max_draws) {
        attempts = attempts.saturating_add(1);
        let candidate = alphabet.from_draw(draw);
        if Some(candidate) != last {
            return Selection {
                symbol: candidate,
                attempts,
                fallback: false,
            };
        }
    }

    let symbol = match last {
        Some(last) => alphabet.successor(last),
        None => alphabet.from_draw(0),
    };

    Selection {
        symbol,
        attempts,
        fallback: true,
    }
}

/// Source of raw random draws.
pub trait DrawSource {
    fn next_draw(&mut self) -> u32;

    /// Fold fresh entropy in before a selection. No-op by default.
    fn reseed(&mut self, _seed: u32) {}
}

impl<S: DrawSource + ?Sized> DrawSource for &mut S {
    fn next_draw(&mut self) -> u32 {
        (**self).next_draw()
    }

    fn reseed(&mut self, seed: u32) {
        (**self).reseed(seed)
    }
}

/// Endless iterator over a draw source.
pub fn draws_from<S: DrawSource + ?Sized>(source: &mut S) -> impl Iterator<Item = u32> + '_ {
    core::iter::from_fn(move || Some(source.next_draw()))
}

/// Mix a microsecond timestamp and a tick count into a 32-bit seed.
#[inline]
pub fn mix_seed(now_us: i64, ticks: u32) -> u32 {
    let t = now_us as u64;
    let mut x = (t ^ (t >> 32)) as u32 ^ ticks.rotate_left(16);
    // lowbias32 finalizer
    x ^= x >> 16;
    x = x.wrapping_mul(0x7feb_352d);
    x ^= x >> 15;
    x = x.wrapping_mul(0x846c_a68b);
    x ^= x >> 16;
    x
}

/// Xorshift32 generator, reseeded per press from time and ticks.
pub struct XorShiftDraws {
    state: u32,
}

impl XorShiftDraws {
    const NONZERO: u32 = 0x9E37_79B9;

    pub const fn new(seed: u32) -> Self {
        Self {
            state: if seed == 0 { Self::NONZERO } else { seed },
        }
    }
}

impl DrawSource for XorShiftDraws {
    #[inline]
    fn next_draw(&mut self) -> u32 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.state = x;
        x
    }

    #[inline]
    fn reseed(&mut self, seed: u32) {
        self.state ^= seed;
        if self.state == 0 {
            self.state = Self::NONZERO;
        }
    }
}

/// Replays a fixed draw sequence, cycling when exhausted.
///
/// Deterministic stand-in for [`XorShiftDraws`].
pub struct ScriptedDraws<'a> {
    draws: &'a [u32],
    pos: usize,
}

impl<'a> ScriptedDraws<'a> {
    pub fn new(draws: &'a [u32]) -> Self {
        Self { draws, pos: 0 }
    }

    /// Draws consumed so far.
    pub fn consumed(&self) -> usize {
        self.pos
    }
}

impl<'a> DrawSource for ScriptedDraws<'a> {
    fn next_draw(&mut self) -> u32 {
        if self.draws.is_empty() {
            return 0;
        }
        let draw = self.draws[self.pos % self.draws.len()];
        self.pos += 1;
        draw
    }
}

/// Last emitted symbol, owned by the single press task.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SelectorState {
    last_emitted: Option<Symbol>,
}

impl SelectorState {
    pub const fn new() -> Self {
        Self { last_emitted: None }
    }

    /// Start from a known last symbol.
    pub const fn with_last(symbol: Symbol) -> Self {
        Self {
            last_emitted: Some(symbol),
        }
    }

    #[inline]
    pub fn last_emitted(&self) -> Option<Symbol> {
        self.last_emitted
    }

    /// Mark `symbol` as sent. Called by the emitter after the write.
    #[inline]
    pub(crate) fn record(&mut self, symbol: Symbol) {
        self.last_emitted = Some(symbol);
    }
}

/// Selector state shared by several press tasks.
///
/// `transact` holds a critical section across select, compare, transmit
/// and update, so two tasks can't both pick against a stale last symbol.
/// Interrupts are masked for the duration: keep the output channel
/// non-blocking when using this.
pub struct SharedSelectorState {
    last_emitted: Mutex<Cell<Option<Symbol>>>,
}

impl SharedSelectorState {
    pub const fn new() -> Self {
        Self {
            last_emitted: Mutex::new(Cell::new(None)),
        }
    }

    pub fn last_emitted(&self) -> Option<Symbol> {
        critical_section::with(|cs| self.last_emitted.borrow(cs).get())
    }

    /// Run one read-modify-write on the state atomically.
    pub fn transact<R>(&self, f: impl FnOnce(&mut SelectorState) -> R) -> R {
        critical_section::with(|cs| {
            let cell = self.last_emitted.borrow(cs);
            let mut state = SelectorState {
                last_emitted: cell.get(),
            };
            let result = f(&mut state);
            cell.set(state.last_emitted);
            result
        })
    }
}

impl Default for SharedSelectorState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const M: Symbol = Symbol(b'M');

    #[test]
    fn test_first_differing_draw_wins() {
        let abc = Alphabet::UPPERCASE;
        let sel = select(Some(M), [12, 12, 5], &abc);
        assert_eq!(sel.symbol, Symbol(b'F'));
        assert_eq!(sel.attempts, 3);
        assert!(!sel.fallback);
    }

    #[test]
    fn test_no_last_accepts_first_draw() {
        let abc = Alphabet::UPPERCASE;
        let sel = select(None, [12], &abc);
        assert_eq!(sel.symbol, M);
        assert_eq!(sel.attempts, 1);
    }

    #[test]
    fn test_bound_limits_draws() {
        let abc = Alphabet::UPPERCASE;
        // Draw 4 would differ but lies past the bound of 3
        let sel = select_bounded(Some(M), [12, 12, 12, 4], &abc, 3);
        assert!(sel.fallback);
        assert_eq!(sel.attempts, 3);
        assert_eq!(sel.symbol, Symbol(b'N'));
    }

    #[test]
    fn test_single_symbol_alphabet_repeats() {
        let abc = Alphabet::new(b"X").unwrap();
        let sel = select(Some(Symbol(b'X')), [0, 1, 2], &abc);
        assert_eq!(sel.symbol, Symbol(b'X'));
        assert!(sel.fallback);
    }

    #[test]
    fn test_empty_draws_fallback_without_last() {
        let abc = Alphabet::UPPERCASE;
        let sel = select(None, core::iter::empty(), &abc);
        assert_eq!(sel.symbol, Symbol(b'A'));
        assert!(sel.fallback);
        assert_eq!(sel.attempts, 0);
    }

    #[test]
    fn test_xorshift_never_sticks_at_zero() {
        let mut rng = XorShiftDraws::new(0);
        for _ in 0..1000 {
            assert_ne!(rng.next_draw(), 0);
        }
        rng.reseed(0);
        assert_ne!(rng.next_draw(), 0);
    }

    #[test]
    fn test_mix_seed_varies_with_inputs() {
        assert_ne!(mix_seed(1_000, 1), mix_seed(1_001, 1));
        assert_ne!(mix_seed(1_000, 1), mix_seed(1_000, 2));
    }

    #[test]
    fn test_scripted_draws_cycle() {
        let mut src = ScriptedDraws::new(&[1, 2]);
        let got: Vec<u32> = draws_from(&mut src).take(5).collect();
        assert_eq!(got, vec![1, 2, 1, 2, 1]);
        assert_eq!(src.consumed(), 5);
    }

    #[test]
    fn test_shared_state_transact_updates() {
        let shared = SharedSelectorState::new();
        assert_eq!(shared.last_emitted(), None);

        let picked = shared.transact(|state| {
            let sel = select(state.last_emitted(), [3], &Alphabet::UPPERCASE);
            state.record(sel.symbol);
            sel.symbol
        });

        assert_eq!(picked, Symbol(b'D'));
        assert_eq!(shared.last_emitted(), Some(Symbol(b'D')));
    }
}
