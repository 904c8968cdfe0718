//! Channel Coder
//!
//! Runs the convolutional encoder over a complete payload bitstream. The
//! shift register starts at zero and carries across pixel boundaries, so the
//! transmitted stream has exactly one symbol per payload bit.

use std::sync::Arc;

use crate::bit_packing::SymbolText;
use crate::fec::encoder::ConvolutionalEncoder;
use crate::fec::transition::StateTransitionTable;
use crate::fec::viterbi::ViterbiDecoder;
use crate::types::{Bits, Symbol};

/// Transmit side of the link.
#[derive(Debug, Clone)]
pub struct ChannelCoder {
    encoder: ConvolutionalEncoder,
}

impl ChannelCoder {
    pub fn new(encoder: ConvolutionalEncoder) -> Self {
        Self { encoder }
    }

    pub fn encoder(&self) -> &ConvolutionalEncoder {
        &self.encoder
    }

    /// Encode a payload into one symbol per bit.
    pub fn encode(&self, bits: &Bits) -> Vec<Symbol> {
        let symbols: Vec<Symbol> = self.encoder.encode_stream(bits.iter().by_vals()).collect();
        tracing::debug!(
            bits = bits.len(),
            symbols = symbols.len(),
            encoder = %self.encoder,
            "Encoded payload"
        );
        symbols
    }

    /// Encode a payload straight to its '0'/'1' text form.
    pub fn encode_text(&self, bits: &Bits) -> String {
        SymbolText::new(self.encoder.output_length()).render(&self.encode(bits))
    }

    /// Build the transition table shared by decoders of this code.
    pub fn transition_table(&self) -> Arc<StateTransitionTable> {
        Arc::new(StateTransitionTable::new(&self.encoder))
    }

    /// Create a matching Viterbi decoder.
    pub fn decoder(&self, decoding_depth: usize) -> ViterbiDecoder {
        ViterbiDecoder::new(self.transition_table(), decoding_depth)
    }
}

impl Default for ChannelCoder {
    fn default() -> Self {
        Self::new(ConvolutionalEncoder::is95())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bitvec::prelude::*;

    #[test]
    fn test_one_symbol_per_bit() {
        let coder = ChannelCoder::default();
        let bits = bitvec![u8, Msb0; 1, 0, 1, 1, 0, 0, 1, 0, 1, 1];
        assert_eq!(coder.encode(&bits).len(), bits.len());
    }

    #[test]
    fn test_encode_empty() {
        let coder = ChannelCoder::default();
        let bits = BitVec::<u8, Msb0>::new();
        assert!(coder.encode(&bits).is_empty());
        assert!(coder.encode_text(&bits).is_empty());
    }

    #[test]
    fn test_register_carries_across_pixels() {
        // Encoding two pixels at once differs from encoding them separately
        // with a fresh register each time.
        let coder = ChannelCoder::new(ConvolutionalEncoder::is95_parity_only());
        let mut bits = bitvec![u8, Msb0; 0; 48];
        bits.set(23, true);

        let joined = coder.encode(&bits);
        let mut separate = coder.encode(&bits[..24]);
        separate.extend(coder.encode(&bits[24..]));
        assert_ne!(joined, separate);
        assert_eq!(joined[..24], separate[..24]);
    }

    #[test]
    fn test_encode_text() {
        let coder = ChannelCoder::new(ConvolutionalEncoder::is95_parity_only());
        let bits = bitvec![u8, Msb0; 1, 0, 0];
        assert_eq!(coder.encode_text(&bits), "111011101");

        let coder = ChannelCoder::default();
        assert_eq!(coder.encode_text(&bits).len(), 12);
    }
}
