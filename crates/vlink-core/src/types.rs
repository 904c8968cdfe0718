//! Core types for the convolutional link
//!
//! This module defines the fundamental types shared by the encoder, the
//! state-transition table and the Viterbi decoder.
//!
//! ## Bits, States and Symbols
//!
//! The encoder consumes one input bit at a time. Its memory (the shift
//! register) is a small unsigned integer that doubles as the trellis state
//! index. Every input bit produces one symbol: a handful of parity bits packed
//! into a byte.
//!
//! ```text
//!   register value (delay + 1 = 9 bits)
//!
//!   bit:   8     7    6    5    4    3    2    1    0
//!        +-----+----+----+----+----+----+----+----+----+
//!        | new | s7 | s6 | s5 | s4 | s3 | s2 | s1 | s0 |
//!        +-----+----+----+----+----+----+----+----+----+
//!          input   \________ state (newest .. oldest) _/
//! ```

use bitvec::prelude::*;

/// A shift-register state, `delay` bits wide.
pub type State = u16;

/// One encoder output unit (3 or 4 bits, MSB first).
pub type Symbol = u8;

/// Accumulated Hamming distance along a trellis path.
pub type PathMetric = u32;

/// Dense bit buffer used for payload bitstreams.
pub type BitStream = BitVec<u8, Msb0>;

/// Borrowed view of a payload bitstream.
pub type Bits = BitSlice<u8, Msb0>;

/// Bits per raster pixel (8-bit R, G and B channels).
pub const BITS_PER_PIXEL: usize = 24;

/// Result type for codec operations
pub type CodecResult<T> = Result<T, CodecError>;

/// Errors that can occur while encoding or decoding
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CodecError {
    /// Backtrace could not reproduce a recorded transition. Indicates a
    /// corrupted table or a decoder bug; the decode is aborted.
    #[error("Broken trellis at depth {depth}: no input bit leads from state {predecessor} to state {state}")]
    BrokenTrellis {
        depth: usize,
        state: State,
        predecessor: State,
    },

    #[error("Invalid symbol character {found:?} at position {position}. Expected '0' or '1'")]
    InvalidSymbolChar { position: usize, found: char },

    #[error("Text length {len} is not a multiple of the symbol width {width}")]
    TextLength { len: usize, width: usize },
}

/// Hamming distance between two symbols of equal width.
#[inline]
pub fn hamming(a: Symbol, b: Symbol) -> PathMetric {
    (a ^ b).count_ones()
}

/// Parity (population count mod 2) of a register value.
#[inline]
pub fn parity(value: u32) -> u8 {
    (value.count_ones() & 1) as u8
}
