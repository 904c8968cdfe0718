//! Symbol and Bit Text Packing
//!
//! Converts between the packed in-memory representations and the textual
//! boundary format: one ASCII '0' or '1' per bit, symbols written MSB first
//! and concatenated without separators.
//!
//! - [`SymbolText`]: `Vec<Symbol>` of a fixed width <-> text
//! - [`bits_to_text`] / [`text_to_bits`]: plain payload bits <-> text
//!
//! ## Example
//!
//! ```rust
//! use vlink_core::bit_packing::SymbolText;
//!
//! let text = SymbolText::new(4);
//! assert_eq!(text.render(&[0b1011, 0b0001]), "10110001");
//! assert_eq!(text.parse("10110001\n").unwrap(), vec![0b1011, 0b0001]);
//! ```

use crate::types::{BitStream, Bits, CodecError, CodecResult, Symbol};

/// Renders and parses fixed-width symbols as '0'/'1' text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SymbolText {
    width: usize,
}

impl SymbolText {
    /// Create a codec for `width`-bit symbols.
    ///
    /// # Panics
    ///
    /// Panics if `width` is not in `1..=8`.
    pub fn new(width: usize) -> Self {
        assert!((1..=8).contains(&width), "Symbol width must be 1..=8");
        Self { width }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    /// Write each symbol as `width` characters, MSB first.
    pub fn render(&self, symbols: &[Symbol]) -> String {
        let mut text = String::with_capacity(symbols.len() * self.width);
        for &symbol in symbols {
            for i in (0..self.width).rev() {
                text.push(if (symbol >> i) & 1 == 1 { '1' } else { '0' });
            }
        }
        text
    }

    /// Parse text produced by [`render`](Self::render).
    ///
    /// A trailing line ending is ignored. Any other character than '0' or
    /// '1' is an error, as is a length that is not a whole number of symbols.
    pub fn parse(&self, text: &str) -> CodecResult<Vec<Symbol>> {
        let text = trim_line_ending(text);
        if text.len() % self.width != 0 {
            return Err(CodecError::TextLength {
                len: text.len(),
                width: self.width,
            });
        }

        let mut symbols = Vec::with_capacity(text.len() / self.width);
        let mut symbol: Symbol = 0;
        for (position, c) in text.char_indices() {
            symbol = (symbol << 1) | char_bit(c, position)?;
            if (position + 1) % self.width == 0 {
                symbols.push(symbol);
                symbol = 0;
            }
        }
        Ok(symbols)
    }
}

/// Write plain payload bits as text.
pub fn bits_to_text(bits: &Bits) -> String {
    bits.iter()
        .by_vals()
        .map(|bit| if bit { '1' } else { '0' })
        .collect()
}

/// Parse plain payload bits from text. A trailing line ending is ignored.
pub fn text_to_bits(text: &str) -> CodecResult<BitStream> {
    trim_line_ending(text)
        .char_indices()
        .map(|(position, c)| char_bit(c, position).map(|bit| bit == 1))
        .collect()
}

/// Strip one trailing LF, CR or CRLF.
pub fn trim_line_ending(text: &str) -> &str {
    text.strip_suffix("\r\n")
        .or_else(|| text.strip_suffix('\n'))
        .or_else(|| text.strip_suffix('\r'))
        .unwrap_or(text)
}

#[inline]
fn char_bit(c: char, position: usize) -> CodecResult<u8> {
    match c {
        '0' => Ok(0),
        '1' => Ok(1),
        found => Err(CodecError::InvalidSymbolChar { position, found }),
    }
}
