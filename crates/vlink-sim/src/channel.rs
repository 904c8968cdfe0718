//! Binary Noise Channel
//!
//! Simulates a binary symmetric channel: every transmitted bit is flipped
//! independently with probability `error_rate / 10 000`.
//!
//! The channel works on any of the three forms a signal takes in the link:
//! plain payload bits, packed encoder symbols, or the '0'/'1' text written
//! to disk. For the same seed the three forms see the same flips, bit for
//! bit, because symbols are walked MSB first exactly like their text.
//!
//! ## Usage
//!
//! ```rust
//! use vlink_sim::channel::NoiseChannel;
//!
//! // 2% bit errors, reproducible
//! let mut channel = NoiseChannel::new(200, Some(7)).unwrap();
//!
//! let symbols = vec![0b1011u8; 1000];
//! let (noisy, report) = channel.apply_symbols(&symbols, 4);
//!
//! assert_eq!(noisy.len(), symbols.len());
//! assert_eq!(report.bits, 4000);
//! ```

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use vlink_core::config::{ChannelConfig, ERROR_RATE_SCALE};
use vlink_core::{BitStream, Bits, CodecError, Symbol};

use crate::error::{SimError, SimResult};

/// Outcome of pushing one signal through the channel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoiseReport {
    /// Bits that crossed the channel
    pub bits: usize,
    /// Bits that were flipped
    pub flipped: usize,
}

impl NoiseReport {
    /// Measured flip rate (0.0 for an empty signal).
    pub fn actual_rate(&self) -> f64 {
        if self.bits == 0 {
            return 0.0;
        }
        self.flipped as f64 / self.bits as f64
    }
}

/// Binary symmetric channel
#[derive(Debug)]
pub struct NoiseChannel {
    error_rate: u32,
    rng: StdRng,
}

impl NoiseChannel {
    /// Create a channel flipping bits with probability `error_rate / 10 000`.
    ///
    /// With `seed` the flips are reproducible; without it the RNG is seeded
    /// from OS entropy.
    pub fn new(error_rate: u32, seed: Option<u64>) -> SimResult<Self> {
        check_rate(error_rate)?;
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Ok(Self { error_rate, rng })
    }

    /// Create a channel from the `channel` section of a config file.
    pub fn from_config(config: &ChannelConfig) -> SimResult<Self> {
        Self::new(config.error_rate, config.seed)
    }

    /// A channel that never flips anything.
    pub fn noiseless() -> Self {
        Self {
            error_rate: 0,
            rng: StdRng::seed_from_u64(0),
        }
    }

    pub fn error_rate(&self) -> u32 {
        self.error_rate
    }

    /// Change the error rate, keeping the RNG state.
    pub fn set_error_rate(&mut self, error_rate: u32) -> SimResult<()> {
        check_rate(error_rate)?;
        self.error_rate = error_rate;
        Ok(())
    }

    /// Restart the RNG from a fixed seed.
    pub fn reseed(&mut self, seed: u64) {
        self.rng = StdRng::seed_from_u64(seed);
    }

    /// Requested flip probability as a fraction.
    pub fn flip_probability(&self) -> f64 {
        self.error_rate as f64 / ERROR_RATE_SCALE as f64
    }

    /// Flip bits of `width`-bit symbols.
    pub fn apply_symbols(&mut self, symbols: &[Symbol], width: usize) -> (Vec<Symbol>, NoiseReport) {
        let bits = symbols.len() * width;
        if self.error_rate == 0 {
            self.log_clean(bits);
            return (symbols.to_vec(), NoiseReport { bits, flipped: 0 });
        }

        let mut flipped = 0;
        let noisy = symbols
            .iter()
            .map(|&symbol| {
                let mut out = symbol;
                for i in (0..width).rev() {
                    if self.draw_flip() {
                        out ^= 1 << i;
                        flipped += 1;
                    }
                }
                out
            })
            .collect();

        let report = NoiseReport { bits, flipped };
        self.log_report(&report);
        (noisy, report)
    }

    /// Flip bits of a plain payload.
    pub fn apply_bits(&mut self, bits: &Bits) -> (BitStream, NoiseReport) {
        if self.error_rate == 0 {
            self.log_clean(bits.len());
            return (
                bits.to_bitvec(),
                NoiseReport {
                    bits: bits.len(),
                    flipped: 0,
                },
            );
        }

        let mut flipped = 0;
        let noisy: BitStream = bits
            .iter()
            .by_vals()
            .map(|bit| {
                if self.draw_flip() {
                    flipped += 1;
                    !bit
                } else {
                    bit
                }
            })
            .collect();

        let report = NoiseReport {
            bits: bits.len(),
            flipped,
        };
        self.log_report(&report);
        (noisy, report)
    }

    /// Flip characters of a '0'/'1' text signal.
    ///
    /// Any other character is rejected. A trailing line ending is dropped.
    pub fn apply_text(&mut self, text: &str) -> SimResult<(String, NoiseReport)> {
        let text = vlink_core::bit_packing::trim_line_ending(text);
        if let Some((position, found)) = text.char_indices().find(|&(_, c)| c != '0' && c != '1') {
            return Err(CodecError::InvalidSymbolChar { position, found }.into());
        }

        if self.error_rate == 0 {
            self.log_clean(text.len());
            return Ok((
                text.to_string(),
                NoiseReport {
                    bits: text.len(),
                    flipped: 0,
                },
            ));
        }

        let mut flipped = 0;
        let noisy = text
            .chars()
            .map(|c| {
                if self.draw_flip() {
                    flipped += 1;
                    if c == '0' {
                        '1'
                    } else {
                        '0'
                    }
                } else {
                    c
                }
            })
            .collect();

        let report = NoiseReport {
            bits: text.len(),
            flipped,
        };
        self.log_report(&report);
        Ok((noisy, report))
    }

    /// Draw `draws` values from `0..10 000` and count them in at most
    /// `buckets` equal-width bins.
    ///
    /// This is the same draw the flip decision uses, so the histogram checks
    /// the uniformity the error rate relies on.
    pub fn histogram(&mut self, draws: usize, buckets: usize) -> Histogram {
        let buckets = buckets.clamp(1, ERROR_RATE_SCALE as usize);
        let bucket_width = (ERROR_RATE_SCALE as usize).div_ceil(buckets);
        let buckets = (ERROR_RATE_SCALE as usize).div_ceil(bucket_width);
        let bucket_width = bucket_width as u32;
        let mut counts = vec![0u64; buckets];
        let mut sum = 0u64;

        for _ in 0..draws {
            let value = self.rng.gen_range(0..ERROR_RATE_SCALE);
            counts[(value / bucket_width) as usize] += 1;
            sum += value as u64;
        }

        Histogram {
            counts,
            bucket_width,
            draws: draws as u64,
            sum,
        }
    }

    #[inline]
    fn draw_flip(&mut self) -> bool {
        self.rng.gen_range(0..ERROR_RATE_SCALE) < self.error_rate
    }

    fn log_clean(&self, bits: usize) {
        tracing::info!(bits, "Requested error rate: 0. No noise added to signal");
    }

    fn log_report(&self, report: &NoiseReport) {
        tracing::info!(
            bits = report.bits,
            flipped = report.flipped,
            requested_pct = self.flip_probability() * 100.0,
            actual_pct = report.actual_rate() * 100.0,
            "Noise applied to signal"
        );
    }
}

fn check_rate(error_rate: u32) -> SimResult<()> {
    if error_rate > ERROR_RATE_SCALE {
        return Err(SimError::InvalidErrorRate(error_rate));
    }
    Ok(())
}

/// Distribution of RNG draws over `0..10 000`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Histogram {
    /// Draw count per bucket
    pub counts: Vec<u64>,
    /// Values covered by each bucket
    pub bucket_width: u32,
    /// Total number of draws
    pub draws: u64,
    /// Sum of all drawn values
    pub sum: u64,
}

impl Histogram {
    /// Mean of the drawn values. Uniform draws give about 4999.5.
    pub fn mean(&self) -> f64 {
        if self.draws == 0 {
            return 0.0;
        }
        self.sum as f64 / self.draws as f64
    }

    /// Largest relative deviation of a bucket from its expected count.
    pub fn max_deviation(&self) -> f64 {
        if self.draws == 0 {
            return 0.0;
        }
        let scale = ERROR_RATE_SCALE as u64;
        self.counts
            .iter()
            .enumerate()
            .map(|(i, &count)| {
                let start = i as u64 * self.bucket_width as u64;
                let span = (start + self.bucket_width as u64).min(scale) - start;
                let expected = self.draws as f64 * span as f64 / scale as f64;
                ((count as f64 - expected) / expected).abs()
            })
            .fold(0.0, f64::max)
    }
}

/// Render a histogram as text bars, the longest bar `bar_width` wide.
pub fn render_histogram(histogram: &Histogram, bar_width: usize) -> String {
    let peak = histogram.counts.iter().copied().max().unwrap_or(0).max(1);
    let mut out = format!(
        "Drawing {} numbers from range 0-{} (incl.-excl.)\nHistogram:\n",
        histogram.draws, ERROR_RATE_SCALE
    );

    for (i, &count) in histogram.counts.iter().enumerate() {
        let bar = (count as usize * bar_width) / peak as usize;
        out.push_str(&format!(
            "{:5}: {:8}  {}\n",
            i as u64 * histogram.bucket_width as u64,
            count,
            "█".repeat(bar)
        ));
    }

    out.push_str(&format!("Average: {:.3}\n", histogram.mean()));
    out
}
