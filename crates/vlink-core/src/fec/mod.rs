//! Forward Error Correction (FEC)
//!
//! The convolutional code at the heart of the link, from encoder to decoder.
//!
//! ## Components
//!
//! - [`ConvolutionalEncoder`]: IS-95 generator polynomials, one symbol per bit
//! - [`StateTransitionTable`]: the encoder's state machine, tabulated once
//! - [`ChannelCoder`]: encodes a whole payload bitstream
//! - [`ViterbiDecoder`]: windowed hard-decision maximum-likelihood decoding
//!
//! ## Usage
//!
//! ```rust
//! use vlink_core::fec::{ChannelCoder, ConvolutionalEncoder};
//! use vlink_core::types::BitStream;
//!
//! let coder = ChannelCoder::new(ConvolutionalEncoder::is95_parity_only());
//! let data: BitStream = [true, false, true, true, false, false, true, false]
//!     .into_iter()
//!     .collect();
//! let symbols = coder.encode(&data);
//!
//! // Flip one channel bit
//! let mut received = symbols.clone();
//! received[3] ^= 0b010;
//!
//! let mut decoder = coder.decoder(24);
//! let decoded = decoder.decode(&received, data.len()).unwrap();
//! assert_eq!(decoded, data);
//! ```

pub mod channel_coder;
pub mod encoder;
pub mod transition;
pub mod viterbi;

pub use channel_coder::ChannelCoder;
pub use encoder::{ConvolutionalEncoder, OutputLayout, SymbolStream, IS95_DELAY};
pub use transition::StateTransitionTable;
pub use viterbi::{DecodeStats, ViterbiDecoder, WindowDecode, DEFAULT_DECODING_DEPTH};
