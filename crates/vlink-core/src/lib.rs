//! # IS-95 Convolutional Coding Library
//!
//! This crate implements the forward error correction used on the IS-95
//! reverse link: a rate 1/3, constraint length 9 convolutional encoder and a
//! hard-decision Viterbi decoder that runs over fixed-size windows.
//!
//! ## Overview
//!
//! - **Encoding**: one 3-bit (or 4-bit, with a systematic bit) symbol per
//!   payload bit, generator polynomials 557, 663 and 711 (octal)
//! - **Trellis**: a precomputed table of outputs and next states for all 256
//!   register states
//! - **Decoding**: windowed add-compare-select with Hamming branch metrics;
//!   each window starts from the state the previous window ended in
//!
//! ## Signal Flow
//!
//! ```text
//! TX: Pixels → Bits → Convolutional Encoder → Symbols → '0'/'1' text
//! RX: '0'/'1' text → Symbols → Viterbi (window by window) → Bits → Pixels
//! ```
//!
//! ## Example
//!
//! ```rust
//! use vlink_core::{ChannelCoder, ConvolutionalEncoder, BitStream};
//!
//! let coder = ChannelCoder::new(ConvolutionalEncoder::is95());
//! let data: BitStream = (0..48).map(|i| i % 5 == 0).collect();
//!
//! let symbols = coder.encode(&data);
//! let mut decoder = coder.decoder(24);
//! let decoded = decoder.decode(&symbols, data.len()).unwrap();
//! assert_eq!(decoded, data);
//! ```

pub mod bit_packing;
pub mod config;
pub mod fec;
pub mod observe;
pub mod types;

// Re-export main types
pub use bit_packing::{bits_to_text, text_to_bits, SymbolText};
pub use config::{ChannelConfig, CodeConfig, ConfigError, LinkConfig, PathConfig};
pub use fec::{
    ChannelCoder, ConvolutionalEncoder, DecodeStats, OutputLayout, StateTransitionTable,
    ViterbiDecoder, WindowDecode, DEFAULT_DECODING_DEPTH, IS95_DELAY,
};
pub use types::{BitStream, Bits, CodecError, CodecResult, PathMetric, State, Symbol, BITS_PER_PIXEL};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fec::{ChannelCoder, ConvolutionalEncoder, OutputLayout, ViterbiDecoder};
    pub use crate::types::{BitStream, Bits, CodecError, Symbol};
}
