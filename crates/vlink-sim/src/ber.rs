//! Bit Error Rate accounting
//!
//! Counts payload bit errors between what was sent and what came back, and
//! bounds the measured rate with a 95% Wilson score interval. Unlike the
//! plain normal approximation the Wilson interval stays informative when no
//! errors were seen, which is the common case after Viterbi decoding.
//!
//! ## Example
//!
//! ```rust
//! use bitvec::prelude::*;
//! use vlink_sim::ber::BerCounter;
//!
//! let mut ber = BerCounter::new();
//! let tx = bitvec![u8, Msb0; 1, 0, 1, 1, 0, 1, 0, 0, 1, 1];
//! let rx = bitvec![u8, Msb0; 1, 0, 1, 0, 0, 1, 0, 1, 1, 1];
//! ber.update(&tx, &rx);
//! assert_eq!(ber.error_bits(), 2);
//! assert!((ber.ber() - 0.2).abs() < 1e-10);
//! ```

use vlink_core::Bits;

/// Two-sided standard normal quantile for 95% confidence.
const Z_95: f64 = 1.959_964;

/// Bit error counter.
#[derive(Debug, Clone, Default)]
pub struct BerCounter {
    total_bits: u64,
    error_bits: u64,
}

impl BerCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compare two bitstreams. Bits past the shorter one are ignored.
    pub fn update(&mut self, sent: &Bits, received: &Bits) {
        let len = sent.len().min(received.len());
        let errors = sent[..len]
            .iter()
            .by_vals()
            .zip(received[..len].iter().by_vals())
            .filter(|(a, b)| a != b)
            .count();
        self.error_bits += errors as u64;
        self.total_bits += len as u64;
    }

    /// Measured error rate (0.0 before any bits were compared).
    pub fn ber(&self) -> f64 {
        if self.total_bits == 0 {
            return 0.0;
        }
        self.error_bits as f64 / self.total_bits as f64
    }

    pub fn total_bits(&self) -> u64 {
        self.total_bits
    }

    pub fn error_bits(&self) -> u64 {
        self.error_bits
    }

    /// 95% Wilson score interval `(lower, upper)` for the error rate.
    ///
    /// With nothing compared the rate is unconstrained: `(0.0, 1.0)`.
    pub fn confidence_interval(&self) -> (f64, f64) {
        if self.total_bits == 0 {
            return (0.0, 1.0);
        }
        let n = self.total_bits as f64;
        let p = self.ber();
        let z2 = Z_95 * Z_95;

        let scale = 1.0 + z2 / n;
        let center = (p + z2 / (2.0 * n)) / scale;
        let spread = Z_95 / scale * (p * (1.0 - p) / n + z2 / (4.0 * n * n)).sqrt();
        ((center - spread).max(0.0), (center + spread).min(1.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use bitvec::prelude::*;

    #[test]
    fn test_zero_ber() {
        let mut ber = BerCounter::new();
        let bits = bitvec![u8, Msb0; 1, 0, 1, 0, 1];
        ber.update(&bits, &bits);
        assert_eq!(ber.ber(), 0.0);
        assert_eq!(ber.error_bits(), 0);
        assert_eq!(ber.total_bits(), 5);
    }

    #[test]
    fn test_all_errors() {
        let mut ber = BerCounter::new();
        ber.update(&bitvec![u8, Msb0; 1; 4], &bitvec![u8, Msb0; 0; 4]);
        assert_eq!(ber.ber(), 1.0);
        assert_eq!(ber.error_bits(), 4);
    }

    #[test]
    fn test_length_mismatch_uses_shorter() {
        let mut ber = BerCounter::new();
        ber.update(&bitvec![u8, Msb0; 1; 10], &bitvec![u8, Msb0; 0; 6]);
        assert_eq!(ber.total_bits(), 6);
        assert_eq!(ber.error_bits(), 6);
    }

    #[test]
    fn test_wilson_interval() {
        // 10 errors in 100 bits
        let tx = bitvec![u8, Msb0; 1; 100];
        let mut rx = tx.clone();
        for i in 0..10 {
            rx.set(i, false);
        }
        let mut ber = BerCounter::new();
        ber.update(&tx, &rx);

        let (lo, hi) = ber.confidence_interval();
        assert_abs_diff_eq!(lo, 0.0552, epsilon = 1e-3);
        assert_abs_diff_eq!(hi, 0.1744, epsilon = 1e-3);
    }

    #[test]
    fn test_interval_without_errors_has_upper_bound() {
        let bits = bitvec![u8, Msb0; 0; 1000];
        let mut ber = BerCounter::new();
        ber.update(&bits, &bits);

        let (lo, hi) = ber.confidence_interval();
        assert_abs_diff_eq!(lo, 0.0, epsilon = 1e-12);
        // z^2 / (n + z^2)
        assert_abs_diff_eq!(hi, 3.8415 / 1003.8415, epsilon = 1e-5);
    }

    #[test]
    fn test_interval_empty() {
        assert_eq!(BerCounter::new().confidence_interval(), (0.0, 1.0));
    }
}
