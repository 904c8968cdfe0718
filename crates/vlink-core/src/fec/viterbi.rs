//! Windowed Hard-Decision Viterbi Decoder
//!
//! Recovers the most likely input sequence from a (possibly corrupted)
//! symbol stream. The stream is processed in windows of `decoding_depth`
//! symbols; each window runs a full forward pass and backtrace, and its
//! terminal state seeds the next window.
//!
//! ## Algorithm
//!
//! 1. Seed depth 1 from the start state (two reachable states)
//! 2. Add-compare-select over depths 2..D using Hamming branch metrics
//! 3. Pick the terminal state with the smallest path metric
//! 4. Backtrace through the recorded predecessors
//!
//! ```text
//!   depth:     1       2       3            D
//!   start ──┬─ s_a ─── s_c ─── s_e ─ ... ─ s_t  (terminal, min metric)
//!           └─ s_b ─── s_d ...
//! ```
//!
//! ## Example
//!
//! ```rust
//! use vlink_core::fec::{ChannelCoder, ConvolutionalEncoder};
//! use vlink_core::types::BitStream;
//!
//! let coder = ChannelCoder::new(ConvolutionalEncoder::is95());
//! let bits: BitStream = (0..60).map(|i| i % 5 == 0).collect();
//! let symbols = coder.encode(&bits);
//!
//! let mut decoder = coder.decoder(24);
//! let decoded = decoder.decode(&symbols, bits.len()).unwrap();
//! assert_eq!(decoded, bits);
//! ```

use bitvec::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::fec::transition::StateTransitionTable;
use crate::types::{
    hamming, BitStream, CodecError, CodecResult, PathMetric, State, Symbol, BITS_PER_PIXEL,
};

/// Decoding depth used when none is configured.
pub const DEFAULT_DECODING_DEPTH: usize = 24;

/// Result of decoding one window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowDecode {
    /// Decoded input bits, depth 1 first. Always `decoding_depth` long.
    pub bits: BitStream,
    /// State at the final depth; the start state of the next window.
    pub terminal_state: State,
    /// Accumulated path metric at each depth along the chosen path.
    pub metrics: Vec<PathMetric>,
}

impl WindowDecode {
    /// Path metric of the terminal node.
    pub fn path_metric(&self) -> PathMetric {
        self.metrics.last().copied().unwrap_or(0)
    }
}

/// Counters from the most recent [`ViterbiDecoder::decode`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecodeStats {
    /// Windows decoded.
    pub windows: usize,
    /// Padding depths added to the final window.
    pub padded_symbols: usize,
    /// Sum of the windows' terminal path metrics. With a correct decode this
    /// is the number of channel bit errors that were corrected.
    pub path_metric: u64,
}

/// Hard-decision Viterbi decoder over a shared transition table.
#[derive(Debug, Clone)]
pub struct ViterbiDecoder {
    table: Arc<StateTransitionTable>,
    decoding_depth: usize,
    /// `[depth * num_states + state]`
    path_metric: Vec<PathMetric>,
    /// `[depth * num_states + state]`, `None` when unreachable.
    predecessor: Vec<Option<State>>,
    stats: DecodeStats,
}

impl ViterbiDecoder {
    /// Create a decoder. Depths below the register width are clamped.
    pub fn new(table: Arc<StateTransitionTable>, decoding_depth: usize) -> Self {
        let mut decoder = Self {
            table,
            decoding_depth: 0,
            path_metric: Vec::new(),
            predecessor: Vec::new(),
            stats: DecodeStats::default(),
        };
        decoder.set_decoding_depth(decoding_depth);
        decoder
    }

    /// Set the window length and resize the scratch tables.
    ///
    /// A window shorter than the register width cannot reach every state, so
    /// smaller requests are raised to `delay`.
    pub fn set_decoding_depth(&mut self, depth: usize) {
        let min_depth = self.table.delay();
        let depth = if depth < min_depth {
            tracing::warn!(
                requested = depth,
                minimum = min_depth,
                "Decoding depth {} cannot reach all {} states; using {}. A multiple of {} is recommended",
                depth,
                self.table.num_states(),
                min_depth,
                min_depth
            );
            min_depth
        } else {
            depth
        };

        let cells = depth * self.table.num_states();
        self.decoding_depth = depth;
        self.path_metric = vec![self.unreachable_metric(); cells];
        self.predecessor = vec![None; cells];
    }

    pub fn decoding_depth(&self) -> usize {
        self.decoding_depth
    }

    pub fn table(&self) -> &StateTransitionTable {
        &self.table
    }

    /// Statistics of the last full decode.
    pub fn last_stats(&self) -> DecodeStats {
        self.stats
    }

    /// Sentinel metric for unreachable nodes: one more than any real path
    /// metric in a window can be.
    pub fn unreachable_metric(&self) -> PathMetric {
        (self.table.output_length() * self.decoding_depth + 1) as PathMetric
    }

    /// Decode a whole symbol stream and trim the result to `expected_bits`.
    ///
    /// Windows are decoded in order starting from state 0. A final window
    /// shorter than the decoding depth is padded; padded depths carry no
    /// received symbol and add nothing to the path metric.
    pub fn decode(&mut self, symbols: &[Symbol], expected_bits: usize) -> CodecResult<BitStream> {
        let mut decoded = BitStream::with_capacity(symbols.len() + self.decoding_depth);
        let mut stats = DecodeStats::default();
        let mut state: State = 0;

        for window in symbols.chunks(self.decoding_depth) {
            let result = self.decode_window(window, state)?;
            stats.windows += 1;
            stats.padded_symbols += self.decoding_depth - window.len();
            stats.path_metric += u64::from(result.path_metric());
            decoded.extend_from_bitslice(result.bits.as_bitslice());
            state = result.terminal_state;
        }

        if decoded.len() < expected_bits {
            tracing::warn!(
                decoded = decoded.len(),
                expected = expected_bits,
                "Symbol stream shorter than the expected payload"
            );
        }
        decoded.truncate(expected_bits);

        tracing::debug!(
            symbols = symbols.len(),
            windows = stats.windows,
            padded = stats.padded_symbols,
            path_metric = stats.path_metric,
            "Viterbi decode complete"
        );
        self.stats = stats;
        Ok(decoded)
    }

    /// Decode a stream carrying `pixel_count` raster pixels.
    pub fn decode_pixels(&mut self, symbols: &[Symbol], pixel_count: usize) -> CodecResult<BitStream> {
        self.decode(symbols, pixel_count * BITS_PER_PIXEL)
    }

    /// Decode one window starting from `start_state`.
    ///
    /// `received` holds at most `decoding_depth` symbols; any shortfall is
    /// treated as padding. The returned bits always span the full depth.
    pub fn decode_window(&mut self, received: &[Symbol], start_state: State) -> CodecResult<WindowDecode> {
        let depth = self.decoding_depth;
        let num_states = self.table.num_states();
        let delay = self.table.delay();
        let mask = (num_states - 1) as State;
        let unreachable = self.unreachable_metric();
        let received = &received[..received.len().min(depth)];

        let branch = |d: usize, expected: Symbol| -> PathMetric {
            received.get(d).map_or(0, |&symbol| hamming(symbol, expected))
        };

        self.path_metric.fill(unreachable);
        self.predecessor.fill(None);

        // Depth 1: only the two successors of the start state are reachable.
        for input in 0..2u8 {
            let next = self.table.next_state(start_state, input) as usize;
            self.path_metric[next] = branch(0, self.table.output(start_state, input));
            self.predecessor[next] = Some(start_state);
        }

        // Forward pass (add-compare-select).
        for d in 1..depth {
            let prev_row = (d - 1) * num_states;
            let row = d * num_states;

            for state in 0..num_states {
                let s = state as State;
                let input = (s >> (delay - 1)) as u8;
                let p0 = (s << 1) & mask;
                let p1 = p0 | 1;

                let candidate = |p: State| -> Option<PathMetric> {
                    let metric = self.path_metric[prev_row + p as usize];
                    (metric != unreachable).then(|| metric + branch(d, self.table.output(p, input)))
                };

                let chosen = match (candidate(p0), candidate(p1)) {
                    (Some(m0), Some(m1)) if m1 < m0 => Some((p1, m1)),
                    (Some(m0), _) => Some((p0, m0)),
                    (None, Some(m1)) => Some((p1, m1)),
                    (None, None) => None,
                };

                if let Some((p, metric)) = chosen {
                    self.path_metric[row + state] = metric;
                    self.predecessor[row + state] = Some(p);
                }
            }
        }

        // Terminal state: smallest metric, lowest index on ties.
        let last_row = (depth - 1) * num_states;
        let terminal_state = (0..num_states)
            .min_by_key(|&s| self.path_metric[last_row + s])
            .unwrap_or(0) as State;

        let (bits, metrics) = self.backtrace(terminal_state)?;
        debug_assert_eq!(metrics.len(), depth);

        Ok(WindowDecode {
            bits,
            terminal_state,
            metrics,
        })
    }

    /// Walk the predecessor table back from `terminal_state` at the final
    /// depth, recovering the input bit of every transition.
    fn backtrace(&self, terminal_state: State) -> CodecResult<(BitStream, Vec<PathMetric>)> {
        let depth = self.decoding_depth;
        let num_states = self.table.num_states();
        let mut bits = bitvec![u8, Msb0; 0; depth];
        let mut metrics = vec![0; depth];
        let mut state = terminal_state;

        for d in (0..depth).rev() {
            let cell = d * num_states + state as usize;
            let predecessor = self.predecessor[cell].ok_or(CodecError::BrokenTrellis {
                depth: d + 1,
                state,
                predecessor: state,
            })?;
            let input = self
                .table
                .input_for(predecessor, state)
                .ok_or(CodecError::BrokenTrellis {
                    depth: d + 1,
                    state,
                    predecessor,
                })?;

            bits.set(d, input == 1);
            metrics[d] = self.path_metric[cell];
            state = predecessor;
        }

        Ok((bits, metrics))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fec::channel_coder::ChannelCoder;
    use crate::fec::encoder::ConvolutionalEncoder;
    use crate::types::Bits;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn random_bits(len: usize, seed: u64) -> BitStream {
        let mut rng = StdRng::seed_from_u64(seed);
        (0..len).map(|_| rng.gen::<bool>()).collect()
    }

    fn coders() -> [ChannelCoder; 2] {
        [
            ChannelCoder::new(ConvolutionalEncoder::is95()),
            ChannelCoder::new(ConvolutionalEncoder::is95_parity_only()),
        ]
    }

    /// Flip one bit of one symbol.
    fn flip(symbols: &mut [Symbol], index: usize, bit: usize) {
        symbols[index] ^= 1 << bit;
    }

    #[test]
    fn test_all_zero_scenario() {
        let coder = ChannelCoder::new(ConvolutionalEncoder::is95_parity_only());
        let bits = bitvec![u8, Msb0; 0; 24];
        let symbols = coder.encode(&bits);
        assert_eq!(symbols, vec![0b000; 24]);

        let mut decoder = coder.decoder(24);
        let window = decoder.decode_window(&symbols, 0).unwrap();
        assert_eq!(window.bits, bits);
        assert_eq!(window.terminal_state, 0);
        assert_eq!(window.path_metric(), 0);

        let decoded = decoder.decode(&symbols, 24).unwrap();
        assert_eq!(decoded, bits);
    }

    #[test]
    fn test_zero_noise_roundtrip() {
        for coder in coders() {
            let bits = random_bits(24 * 40, 7);
            let symbols = coder.encode(&bits);
            for depth in [8, 12, 24, 40, 64] {
                let mut decoder = coder.decoder(depth);
                let decoded = decoder.decode(&symbols, bits.len()).unwrap();
                assert_eq!(decoded, bits, "depth {} layout {:?}", depth, coder.encoder().layout());
                assert_eq!(decoder.last_stats().path_metric, 0);
            }
        }
    }

    #[test]
    fn test_partial_final_window() {
        for coder in coders() {
            // 100 bits with depth 24: four full windows and one of 4 symbols.
            let bits = random_bits(100, 11);
            let symbols = coder.encode(&bits);
            let mut decoder = coder.decoder(24);
            let decoded = decoder.decode(&symbols, bits.len()).unwrap();
            assert_eq!(decoded, bits);

            let stats = decoder.last_stats();
            assert_eq!(stats.windows, 5);
            assert_eq!(stats.padded_symbols, 20);
        }
    }

    #[test]
    fn test_decode_pixels_trims_padding() {
        let coder = ChannelCoder::new(ConvolutionalEncoder::is95());
        let bits = random_bits(3 * BITS_PER_PIXEL, 5);
        let symbols = coder.encode(&bits);
        let mut decoder = coder.decoder(40);
        let decoded = decoder.decode_pixels(&symbols, 3).unwrap();
        assert_eq!(decoded.len(), 72);
        assert_eq!(decoded, bits);
    }

    #[test]
    fn test_empty_stream() {
        let coder = ChannelCoder::new(ConvolutionalEncoder::is95());
        let mut decoder = coder.decoder(24);
        let decoded = decoder.decode(&[], 0).unwrap();
        assert!(decoded.is_empty());
        assert_eq!(decoder.last_stats().windows, 0);
    }

    #[test]
    fn test_depth_is_clamped() {
        let coder = ChannelCoder::new(ConvolutionalEncoder::is95());
        let mut decoder = coder.decoder(3);
        assert_eq!(decoder.decoding_depth(), 8);

        decoder.set_decoding_depth(32);
        assert_eq!(decoder.decoding_depth(), 32);
        assert_eq!(decoder.unreachable_metric(), 4 * 32 + 1);
    }

    #[test]
    fn test_single_bit_flip_is_corrected() {
        for coder in coders() {
            let width = coder.encoder().output_length();
            let bits = random_bits(40 * 3, 23);
            let clean = coder.encode(&bits);
            let mut decoder = coder.decoder(40);

            for index in [0, 1, 17, 39, 40, 63, 119] {
                for bit in 0..width {
                    let mut symbols = clean.clone();
                    flip(&mut symbols, index, bit);
                    let decoded = decoder.decode(&symbols, bits.len()).unwrap();
                    assert_eq!(decoded, bits, "symbol {} bit {}", index, bit);
                    assert_eq!(decoder.last_stats().path_metric, 1);
                }
            }
        }
    }

    #[test]
    fn test_scattered_errors_are_corrected() {
        let coder = ChannelCoder::new(ConvolutionalEncoder::is95());
        let bits = random_bits(48 * 4, 3);
        let mut symbols = coder.encode(&bits);
        flip(&mut symbols, 5, 0);
        flip(&mut symbols, 60, 3);
        flip(&mut symbols, 110, 1);
        flip(&mut symbols, 170, 2);

        let mut decoder = coder.decoder(48);
        let decoded = decoder.decode(&symbols, bits.len()).unwrap();
        assert_eq!(decoded, bits);
    }

    #[test]
    fn test_metrics_are_monotonic_along_path() {
        let coder = ChannelCoder::new(ConvolutionalEncoder::is95());
        let bits = random_bits(64, 99);
        let mut symbols = coder.encode(&bits);
        let mut rng = StdRng::seed_from_u64(4);
        for _ in 0..10 {
            let index = rng.gen_range(0..symbols.len());
            flip(&mut symbols, index, rng.gen_range(0..4));
        }

        let mut decoder = coder.decoder(64);
        let window = decoder.decode_window(&symbols, 0).unwrap();
        assert!(window.metrics.windows(2).all(|pair| pair[0] <= pair[1]));
        assert!(window.path_metric() < decoder.unreachable_metric());
    }

    #[test]
    fn test_decoding_is_deterministic() {
        let coder = ChannelCoder::new(ConvolutionalEncoder::is95_parity_only());
        let bits = random_bits(200, 8);
        let mut symbols = coder.encode(&bits);
        let mut rng = StdRng::seed_from_u64(12);
        for symbol in symbols.iter_mut() {
            *symbol = rng.gen_range(0..8);
        }

        let mut decoder = coder.decoder(24);
        let first = decoder.decode(&symbols, bits.len()).unwrap();
        let second = decoder.decode(&symbols, bits.len()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_window_start_state_is_threaded() {
        // Decoding the second window on its own, seeded with the first
        // window's terminal state, matches the streamed decode.
        let coder = ChannelCoder::new(ConvolutionalEncoder::is95());
        let bits = random_bits(48, 21);
        let symbols = coder.encode(&bits);

        let mut decoder = coder.decoder(24);
        let first = decoder.decode_window(&symbols[..24], 0).unwrap();
        let second = decoder
            .decode_window(&symbols[24..], first.terminal_state)
            .unwrap();

        let mut joined = first.bits.clone();
        joined.extend_from_bitslice(second.bits.as_bitslice());
        assert_eq!(joined, bits);

        // The terminal state holds the last eight input bits, newest on top.
        let state_after = |tail: &Bits| -> State {
            tail.iter()
                .by_vals()
                .fold(0, |state, bit| (state >> 1) | (State::from(bit) << 7))
        };
        assert_eq!(first.terminal_state, state_after(&bits[16..24]));
        let expected = state_after(&bits[40..]);
        assert_eq!(second.terminal_state, expected);
    }

    #[test]
    fn test_heavy_noise_reduces_errors() {
        // At a 2% channel error rate the decoder output carries fewer bit
        // errors than the raw channel did.
        let coder = ChannelCoder::new(ConvolutionalEncoder::is95());
        let width = coder.encoder().output_length();
        let mut decoder = coder.decoder(48);
        let mut rng = StdRng::seed_from_u64(2024);

        let mut channel_errors = 0usize;
        let mut residual_errors = 0usize;
        for trial in 0..20 {
            let bits = random_bits(480, trial);
            let mut symbols = coder.encode(&bits);
            for symbol in symbols.iter_mut() {
                for bit in 0..width {
                    if rng.gen_range(0..10_000) < 200 {
                        *symbol ^= 1 << bit;
                        channel_errors += 1;
                    }
                }
            }
            let decoded = decoder.decode(&symbols, bits.len()).unwrap();
            residual_errors += decoded
                .iter()
                .by_vals()
                .zip(bits.iter().by_vals())
                .filter(|(a, b)| a != b)
                .count();
        }

        assert!(channel_errors > 0);
        assert!(
            residual_errors < channel_errors,
            "residual {} vs channel {}",
            residual_errors,
            channel_errors
        );
    }

    #[test]
    fn test_corrupted_table_is_fatal() {
        let coder = ChannelCoder::new(ConvolutionalEncoder::is95());
        let mut decoder = coder.decoder(8);
        let symbols = vec![0; 8];
        decoder.decode_window(&symbols, 0).unwrap();

        // Forge a predecessor that cannot reach the terminal state.
        let cell = 7 * decoder.table.num_states();
        decoder.predecessor[cell] = Some(3);
        let err = decoder.backtrace(0).unwrap_err();
        assert_eq!(
            err,
            CodecError::BrokenTrellis {
                depth: 8,
                state: 0,
                predecessor: 3,
            }
        );
    }
}
