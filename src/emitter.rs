//! Symbol emission over the output byte channel.
//!
//! Wire format: one symbol byte, then an optional delimiter byte.
//! At-most-once delivery: one write per press, no retry.

use core::fmt;

use crate::alphabet::Symbol;
use crate::hal::ByteChannel;
use crate::selector::{Selection, SelectorState};

/// Default frame delimiter.
pub const DEFAULT_DELIMITER: u8 = crate::config::DEFAULT_DELIMITER;

/// Emission failure. The press is lost; the loop continues.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmitError<E> {
    /// Channel returned an error.
    Channel(E),
    /// Channel accepted zero bytes.
    NothingWritten,
}

impl<E: fmt::Debug> fmt::Display for EmitError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Channel(e) => write!(f, "output channel error: {:?}", e),
            Self::NothingWritten => write!(f, "output channel accepted 0 bytes"),
        }
    }
}

/// Successful emission.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EmitReport {
    pub symbol: Symbol,
    /// Bytes the channel accepted (may be short of the frame length).
    pub written: usize,
    pub frame_len: usize,
}

impl EmitReport {
    #[inline]
    pub fn is_partial(&self) -> bool {
        self.written < self.frame_len
    }
}

/// Writes selected symbols to a [`ByteChannel`].
pub struct Emitter<W> {
    channel: W,
    delimiter: Option<u8>,
}

impl<W: ByteChannel> Emitter<W> {
    /// Emitter with the default `\n` delimiter.
    pub fn new(channel: W) -> Self {
        Self::with_delimiter(channel, Some(DEFAULT_DELIMITER))
    }

    pub fn with_delimiter(channel: W, delimiter: Option<u8>) -> Self {
        Self { channel, delimiter }
    }

    #[inline]
    pub fn delimiter(&self) -> Option<u8> {
        self.delimiter
    }

    pub fn set_delimiter(&mut self, delimiter: Option<u8>) {
        self.delimiter = delimiter;
    }

    pub fn channel(&self) -> &W {
        &self.channel
    }

    pub fn channel_mut(&mut self) -> &mut W {
        &mut self.channel
    }

    /// Encode one frame into `buf`, returning its length.
    #[inline]
    fn frame(&self, symbol: Symbol, buf: &mut [u8; 2]) -> usize {
        buf[0] = symbol.byte();
        match self.delimiter {
            Some(d) => {
                buf[1] = d;
                2
            }
            None => 1,
        }
    }

    /// Transmit `selection` and, once the symbol byte is out, record it.
    ///
    /// State is left untouched on any error, so a symbol is never marked
    /// as last emitted without having been sent.
    pub fn emit(
        &mut self,
        state: &mut SelectorState,
        selection: Selection,
    ) -> Result<EmitReport, EmitError<W::Error>> {
        let mut buf = [0u8; 2];
        let frame_len = self.frame(selection.symbol, &mut buf);

        let written = self
            .channel
            .write(&buf[..frame_len])
            .map_err(EmitError::Channel)?;

        if written == 0 {
            return Err(EmitError::NothingWritten);
        }

        state.record(selection.symbol);

        Ok(EmitReport {
            symbol: selection.symbol,
            written,
            frame_len,
        })
    }
}
