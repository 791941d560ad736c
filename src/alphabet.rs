//! Symbol alphabet.
//!
//! An ordered, fixed set of single-byte symbols. Order matters: it
//! defines the successor used by the selector's fallback path.

use core::fmt;

/// One emitted symbol (a single ASCII byte on the wire).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Symbol(pub u8);

impl Symbol {
    #[inline]
    pub const fn byte(self) -> u8 {
        self.0
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_ascii_graphic() {
            write!(f, "{}", self.0 as char)
        } else {
            write!(f, "0x{:02X}", self.0)
        }
    }
}

/// Alphabet construction error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlphabetError {
    /// No symbols given.
    Empty,
    /// Same byte listed twice: the byte and the index of the repeat.
    Duplicate(u8, usize),
}

impl fmt::Display for AlphabetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "alphabet is empty"),
            Self::Duplicate(byte, idx) => write!(f, "duplicate symbol 0x{:02X} at index {}", byte, idx),
        }
    }
}

/// Ordered set of symbols eligible for emission.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Alphabet<'a> {
    symbols: &'a [u8],
}

impl Alphabet<'static> {
    /// `A`..=`Z`.
    pub const UPPERCASE: Alphabet<'static> = Alphabet {
        symbols: b"ABCDEFGHIJKLMNOPQRSTUVWXYZ",
    };
}

impl<'a> Alphabet<'a> {
    /// Build an alphabet. Rejects empty and duplicate symbol lists.
    pub fn new(symbols: &'a [u8]) -> Result<Self, AlphabetError> {
        if symbols.is_empty() {
            return Err(AlphabetError::Empty);
        }
        for (i, byte) in symbols.iter().enumerate() {
            if symbols[..i].contains(byte) {
                return Err(AlphabetError::Duplicate(*byte, i));
            }
        }
        Ok(Self { symbols })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    /// Always false: construction rejects empty alphabets.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<Symbol> {
        self.symbols.get(index).copied().map(Symbol)
    }

    #[inline]
    pub fn index_of(&self, symbol: Symbol) -> Option<usize> {
        self.symbols.iter().position(|&b| b == symbol.0)
    }

    #[inline]
    pub fn contains(&self, symbol: Symbol) -> bool {
        self.index_of(symbol).is_some()
    }

    /// Map a random draw onto the alphabet (modulo reduction).
    #[inline]
    pub fn from_draw(&self, draw: u32) -> Symbol {
        Symbol(self.symbols[draw as usize % self.symbols.len()])
    }

    /// Next symbol in order, wrapping last → first.
    ///
    /// A symbol outside the alphabet maps to the first symbol.
    #[inline]
    pub fn successor(&self, symbol: Symbol) -> Symbol {
        match self.index_of(symbol) {
            Some(idx) => Symbol(self.symbols[(idx + 1) % self.symbols.len()]),
            None => Symbol(self.symbols[0]),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = Symbol> + 'a {
        self.symbols.iter().copied().map(Symbol)
    }
}

impl Default for Alphabet<'static> {
    fn default() -> Self {
        Self::UPPERCASE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uppercase_layout() {
        let abc = Alphabet::UPPERCASE;
        assert_eq!(abc.len(), 26);
        assert_eq!(abc.get(0), Some(Symbol(b'A')));
        assert_eq!(abc.index_of(Symbol(b'M')), Some(12));
        assert_eq!(abc.from_draw(2), Symbol(b'C'));
        assert_eq!(abc.from_draw(26 + 2), Symbol(b'C'));
    }

    #[test]
    fn test_successor_wraps() {
        let abc = Alphabet::UPPERCASE;
        assert_eq!(abc.successor(Symbol(b'A')), Symbol(b'B'));
        assert_eq!(abc.successor(Symbol(b'Z')), Symbol(b'A'));
        assert_eq!(abc.successor(Symbol(b'?')), Symbol(b'A'));
    }

    #[test]
    fn test_new_rejects_bad_input() {
        assert_eq!(Alphabet::new(b""), Err(AlphabetError::Empty));
        assert_eq!(Alphabet::new(b"ABA"), Err(AlphabetError::Duplicate(b'A', 2)));
        assert!(Alphabet::new(b"XY").is_ok());
    }

    #[test]
    fn test_symbol_display() {
        assert_eq!(format!("{}", Symbol(b'Q')), "Q");
        assert_eq!(format!("{}", Symbol(b'\n')), "0x0A");
    }
}
