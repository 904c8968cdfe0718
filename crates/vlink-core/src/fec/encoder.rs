//! IS-95 Convolutional Encoder
//!
//! Rate 1/3 (or 1/4 with the systematic bit) convolutional encoder with
//! constraint length K = 9 and the IS-95 generator polynomials.
//!
//! ## Generators
//!
//! | Output | Octal | Binary      |
//! |--------|-------|-------------|
//! | g0     | 557   | 1 0110 1111 |
//! | g1     | 663   | 1 1011 0011 |
//! | g2     | 711   | 1 1100 1001 |
//!
//! Each generator is applied to the 9-bit register value
//! `state | input << delay`; the output bit is the parity of the masked value.
//!
//! ## Symbol Layout
//!
//! ```text
//!   Parity:      [ g0 | g1 | g2 ]            (3 bits)
//!   Systematic:  [ g0 | r0 | g1 | g2 ]       (4 bits, r0 = register bit 0)
//! ```
//!
//! ## Example
//!
//! ```rust
//! use vlink_core::fec::ConvolutionalEncoder;
//!
//! let encoder = ConvolutionalEncoder::is95_parity_only();
//! let symbols: Vec<u8> = encoder.encode_stream([true, false, false]).collect();
//! assert_eq!(symbols, vec![0b111, 0b011, 0b101]);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::{parity, State, Symbol};

/// Shift-register width of the IS-95 encoder (K - 1).
pub const IS95_DELAY: usize = 8;

/// Generator polynomial g0 (octal 557).
pub const G0: u32 = 0o557;
/// Generator polynomial g1 (octal 663).
pub const G1: u32 = 0o663;
/// Generator polynomial g2 (octal 711).
pub const G2: u32 = 0o711;

/// Which bits make up one output symbol.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputLayout {
    /// Three parity bits: g0, g1, g2.
    Parity,
    /// Parity bits with the register's low bit interleaved after g0.
    #[default]
    Systematic,
}

impl OutputLayout {
    /// Bits per symbol for this layout.
    pub fn width(&self) -> usize {
        match self {
            OutputLayout::Parity => 3,
            OutputLayout::Systematic => 4,
        }
    }
}

/// IS-95 convolutional encoder.
///
/// The encoder itself is stateless; the shift register lives in the
/// [`SymbolStream`] returned by [`encode_stream`](Self::encode_stream).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConvolutionalEncoder {
    layout: OutputLayout,
}

impl ConvolutionalEncoder {
    /// Create an encoder with the given output layout.
    pub fn new(layout: OutputLayout) -> Self {
        Self { layout }
    }

    /// IS-95 encoder with the systematic bit (4-bit symbols).
    pub fn is95() -> Self {
        Self::new(OutputLayout::Systematic)
    }

    /// IS-95 encoder with parity bits only (3-bit symbols).
    pub fn is95_parity_only() -> Self {
        Self::new(OutputLayout::Parity)
    }

    pub fn layout(&self) -> OutputLayout {
        self.layout
    }

    /// Bits per output symbol (3 or 4).
    pub fn output_length(&self) -> usize {
        self.layout.width()
    }

    /// Shift-register width.
    pub fn delay(&self) -> usize {
        IS95_DELAY
    }

    /// Number of trellis states (2^delay).
    pub fn num_states(&self) -> usize {
        1 << IS95_DELAY
    }

    /// Code rate (input bits per channel bit).
    pub fn rate(&self) -> f64 {
        1.0 / self.output_length() as f64
    }

    /// Parity of the register value under g0.
    #[inline]
    pub fn g0(&self, register: u32) -> u8 {
        parity(register & G0)
    }

    /// Parity of the register value under g1.
    #[inline]
    pub fn g1(&self, register: u32) -> u8 {
        parity(register & G1)
    }

    /// Parity of the register value under g2.
    #[inline]
    pub fn g2(&self, register: u32) -> u8 {
        parity(register & G2)
    }

    /// Pack the outputs for one register value into a symbol, high bit first.
    pub fn encode_symbol(&self, register: u32) -> Symbol {
        let mut symbol = self.g0(register);
        if self.layout == OutputLayout::Systematic {
            symbol = (symbol << 1) | (register & 1) as u8;
        }
        symbol = (symbol << 1) | self.g1(register);
        (symbol << 1) | self.g2(register)
    }

    /// Lazily encode a bit sequence, one symbol per input bit.
    ///
    /// The register starts at zero.
    pub fn encode_stream<I>(&self, bits: I) -> SymbolStream<I::IntoIter>
    where
        I: IntoIterator<Item = bool>,
    {
        SymbolStream {
            encoder: *self,
            bits: bits.into_iter(),
            state: 0,
        }
    }
}

impl fmt::Display for ConvolutionalEncoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let layout = match self.layout {
            OutputLayout::Parity => "parity",
            OutputLayout::Systematic => "systematic",
        };
        write!(
            f,
            "IS-95(K={}, n={}, {}, generators=[{:o}, {:o}, {:o}])",
            IS95_DELAY + 1,
            self.output_length(),
            layout,
            G0,
            G1,
            G2
        )
    }
}

/// Iterator produced by [`ConvolutionalEncoder::encode_stream`].
#[derive(Debug, Clone)]
pub struct SymbolStream<I> {
    encoder: ConvolutionalEncoder,
    bits: I,
    state: State,
}

impl<I> SymbolStream<I> {
    /// Current shift-register contents (newest bit in the high position).
    pub fn state(&self) -> State {
        self.state
    }
}

impl<I: Iterator<Item = bool>> Iterator for SymbolStream<I> {
    type Item = Symbol;

    fn next(&mut self) -> Option<Symbol> {
        let bit = self.bits.next()?;
        let register = u32::from(self.state) | (u32::from(bit) << IS95_DELAY);
        // Dropping the oldest bit keeps the state within `delay` bits.
        self.state = (register >> 1) as State;
        Some(self.encoder.encode_symbol(register))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.bits.size_hint()
    }
}

impl<I: ExactSizeIterator<Item = bool>> ExactSizeIterator for SymbolStream<I> {}
