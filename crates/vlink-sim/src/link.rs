//! Link Simulator
//!
//! Wires the pieces into the two pipelines the simulator compares:
//!
//! ```text
//! plain: Raster → bits → NoiseChannel → bits → Raster
//! coded: Raster → bits → ChannelCoder → symbols → NoiseChannel
//!               → ViterbiDecoder → bits → Raster
//! ```
//!
//! Each run returns the reconstructed raster, the signal as it left the
//! channel ('0'/'1' text) and a [`LinkReport`] with error counts before and
//! after decoding.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};
use vlink_core::bit_packing::{bits_to_text, SymbolText};
use vlink_core::{ChannelCoder, DecodeStats, LinkConfig, ViterbiDecoder};

use crate::ber::BerCounter;
use crate::channel::NoiseChannel;
use crate::error::SimResult;
use crate::raster::Raster;

/// Which pipeline produced a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkMode {
    Plain,
    Coded,
}

impl fmt::Display for LinkMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LinkMode::Plain => write!(f, "plain"),
            LinkMode::Coded => write!(f, "coded"),
        }
    }
}

/// Error counts for one pass over the link.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkReport {
    pub mode: LinkMode,
    /// Payload bits (24 per pixel)
    pub payload_bits: usize,
    /// Bits that crossed the channel
    pub channel_bits: usize,
    /// Bits flipped by the channel
    pub channel_errors: usize,
    /// Payload bits still wrong after reception
    pub residual_errors: usize,
    /// Channel bit error rate
    pub ber_before: f64,
    /// Payload bit error rate after reception
    pub ber_after: f64,
    /// 95% confidence bounds on `ber_after`
    pub ber_after_interval: (f64, f64),
    /// Decoder statistics (coded runs only)
    pub decode: Option<DecodeStats>,
}

impl fmt::Display for LinkReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "[ {} ] {} payload bits, {} channel bits",
            self.mode, self.payload_bits, self.channel_bits
        )?;
        writeln!(
            f,
            "  channel errors:  {:>8} ({:.4} %)",
            self.channel_errors,
            self.ber_before * 100.0
        )?;
        write!(
            f,
            "  residual errors: {:>8} ({:.4} %, 95% CI {:.4} to {:.4} %)",
            self.residual_errors,
            self.ber_after * 100.0,
            self.ber_after_interval.0 * 100.0,
            self.ber_after_interval.1 * 100.0
        )?;
        if let Some(stats) = &self.decode {
            write!(
                f,
                "\n  decoder: {} windows, {} padded symbols, path metric {}",
                stats.windows, stats.padded_symbols, stats.path_metric
            )?;
        }
        Ok(())
    }
}

/// Output of one link run.
#[derive(Debug, Clone)]
pub struct LinkRun {
    pub report: LinkReport,
    /// Reconstructed image
    pub raster: Raster,
    /// Received signal as '0'/'1' text
    pub signal: String,
}

/// Encoder, channel and decoder of one simulated link.
#[derive(Debug)]
pub struct LinkSimulator {
    coder: ChannelCoder,
    decoder: ViterbiDecoder,
    channel: NoiseChannel,
}

impl LinkSimulator {
    pub fn new(coder: ChannelCoder, decoding_depth: usize, channel: NoiseChannel) -> Self {
        let decoder = coder.decoder(decoding_depth);
        Self {
            coder,
            decoder,
            channel,
        }
    }

    /// Build the link described by a validated config.
    pub fn from_config(config: &LinkConfig) -> SimResult<Self> {
        config.validate()?;
        let coder = ChannelCoder::new(config.code.encoder());
        let channel = NoiseChannel::from_config(&config.channel)?;
        Ok(Self::new(coder, config.code.decoding_depth, channel))
    }

    pub fn coder(&self) -> &ChannelCoder {
        &self.coder
    }

    pub fn decoder(&self) -> &ViterbiDecoder {
        &self.decoder
    }

    pub fn channel_mut(&mut self) -> &mut NoiseChannel {
        &mut self.channel
    }

    /// Send the raw pixel bits over the channel, no coding.
    pub fn run_plain(&mut self, raster: &Raster) -> SimResult<LinkRun> {
        let _span = tracing::info_span!("plain_link", pixels = raster.pixel_count()).entered();

        let bits = raster.to_bits();
        let (received, noise) = self.channel.apply_bits(&bits);
        let rebuilt = Raster::from_bits(&received, raster.width(), raster.height())?;

        let mut residual = BerCounter::new();
        residual.update(&bits, &received);

        let report = LinkReport {
            mode: LinkMode::Plain,
            payload_bits: bits.len(),
            channel_bits: noise.bits,
            channel_errors: noise.flipped,
            residual_errors: residual.error_bits() as usize,
            ber_before: noise.actual_rate(),
            ber_after: residual.ber(),
            ber_after_interval: residual.confidence_interval(),
            decode: None,
        };
        tracing::info!(residual = report.residual_errors, "Plain link complete");

        Ok(LinkRun {
            report,
            raster: rebuilt,
            signal: bits_to_text(&received),
        })
    }

    /// Encode, send and Viterbi-decode the pixel bits.
    pub fn run_coded(&mut self, raster: &Raster) -> SimResult<LinkRun> {
        let _span = tracing::info_span!("coded_link", pixels = raster.pixel_count()).entered();

        let bits = raster.to_bits();
        let width = self.coder.encoder().output_length();
        let symbols = self.coder.encode(&bits);
        let (received, noise) = self.channel.apply_symbols(&symbols, width);

        let decoded = self.decoder.decode_pixels(&received, raster.pixel_count())?;
        let rebuilt = Raster::from_bits(&decoded, raster.width(), raster.height())?;

        let mut residual = BerCounter::new();
        residual.update(&bits, &decoded);

        let report = LinkReport {
            mode: LinkMode::Coded,
            payload_bits: bits.len(),
            channel_bits: noise.bits,
            channel_errors: noise.flipped,
            residual_errors: residual.error_bits() as usize,
            ber_before: noise.actual_rate(),
            ber_after: residual.ber(),
            ber_after_interval: residual.confidence_interval(),
            decode: Some(self.decoder.last_stats()),
        };
        tracing::info!(
            channel_errors = report.channel_errors,
            residual = report.residual_errors,
            "Coded link complete"
        );

        Ok(LinkRun {
            report,
            raster: rebuilt,
            signal: SymbolText::new(width).render(&received),
        })
    }

    /// Decode a received '0'/'1' signal back into a `width × height` raster.
    pub fn decode_signal(&mut self, text: &str, width: u32, height: u32) -> SimResult<Raster> {
        let symbols = SymbolText::new(self.coder.encoder().output_length()).parse(text)?;
        let pixels = width as usize * height as usize;
        let decoded = self.decoder.decode_pixels(&symbols, pixels)?;
        Raster::from_bits(&decoded, width, height)
    }

    /// [`run_plain`](Self::run_plain) between files: BMP in, text signal
    /// and rebuilt BMP out.
    pub fn run_plain_files(
        &mut self,
        input: &Path,
        signal_path: &Path,
        output: &Path,
    ) -> SimResult<LinkReport> {
        let raster = Raster::load_bmp(input)?;
        let run = self.run_plain(&raster)?;
        write_signal(signal_path, &run.signal)?;
        run.raster.save_bmp(output)?;
        Ok(run.report)
    }

    /// [`run_coded`](Self::run_coded) between files.
    pub fn run_coded_files(
        &mut self,
        input: &Path,
        signal_path: &Path,
        output: &Path,
    ) -> SimResult<LinkReport> {
        let raster = Raster::load_bmp(input)?;
        let run = self.run_coded(&raster)?;
        write_signal(signal_path, &run.signal)?;
        run.raster.save_bmp(output)?;
        Ok(run.report)
    }
}

fn write_signal(path: &Path, signal: &str) -> SimResult<()> {
    std::fs::write(path, format!("{}\n", signal))?;
    tracing::debug!(path = %path.display(), bits = signal.len(), "Wrote signal");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use vlink_core::{ConvolutionalEncoder, OutputLayout};

    fn test_raster() -> Raster {
        let pixels = (0..64u32).map(|i| (i * 0x03_05_07) ^ 0x5A_A5_3C).collect();
        Raster::new(8, 8, pixels).unwrap()
    }

    fn simulator(layout: OutputLayout, rate: u32, seed: u64) -> LinkSimulator {
        LinkSimulator::new(
            ChannelCoder::new(ConvolutionalEncoder::new(layout)),
            48,
            NoiseChannel::new(rate, Some(seed)).unwrap(),
        )
    }

    #[test]
    fn test_clean_links_are_lossless() {
        let raster = test_raster();
        for layout in [OutputLayout::Parity, OutputLayout::Systematic] {
            let mut link = simulator(layout, 0, 1);

            let plain = link.run_plain(&raster).unwrap();
            assert_eq!(plain.raster, raster);
            assert_eq!(plain.report.residual_errors, 0);

            let coded = link.run_coded(&raster).unwrap();
            assert_eq!(coded.raster, raster);
            assert_eq!(coded.report.channel_bits, raster.bit_len() * layout.width());
            assert_eq!(coded.report.decode.map(|s| s.path_metric), Some(0));
        }
    }

    #[test]
    fn test_plain_errors_pass_through() {
        let raster = test_raster();
        let mut link = simulator(OutputLayout::Systematic, 300, 2);
        let run = link.run_plain(&raster).unwrap();

        assert!(run.report.channel_errors > 0);
        assert_eq!(run.report.residual_errors, run.report.channel_errors);
        assert_eq!(run.signal.len(), raster.bit_len());
    }

    #[test]
    fn test_coding_reduces_errors() {
        let raster = test_raster();
        let mut plain_errors = 0;
        let mut coded_errors = 0;

        for seed in 0..5 {
            let mut link = simulator(OutputLayout::Systematic, 200, seed);
            plain_errors += link.run_plain(&raster).unwrap().report.residual_errors;
            coded_errors += link.run_coded(&raster).unwrap().report.residual_errors;
        }

        assert!(plain_errors > 0);
        assert!(coded_errors < plain_errors / 4);
    }

    #[test]
    fn test_decode_signal_matches_run() {
        let raster = test_raster();
        let mut link = simulator(OutputLayout::Parity, 100, 3);
        let run = link.run_coded(&raster).unwrap();

        let decoded = link
            .decode_signal(&format!("{}\r\n", run.signal), 8, 8)
            .unwrap();
        assert_eq!(decoded, run.raster);
    }

    #[test]
    fn test_report_rates() {
        let raster = test_raster();
        let mut link = simulator(OutputLayout::Parity, 1000, 4);
        let report = link.run_coded(&raster).unwrap().report;

        assert_abs_diff_eq!(
            report.ber_before,
            report.channel_errors as f64 / report.channel_bits as f64
        );
        assert_eq!(report.payload_bits, 64 * 24);

        let text = report.to_string();
        assert!(text.starts_with("[ coded ] 1536 payload bits, 4608 channel bits"));
        assert!(text.contains("decoder: 32 windows"));
    }

    #[test]
    fn test_report_interval() {
        let raster = test_raster();

        let clean = simulator(OutputLayout::Systematic, 0, 6).run_coded(&raster).unwrap().report;
        let (lo, hi) = clean.ber_after_interval;
        assert_abs_diff_eq!(lo, 0.0, epsilon = 1e-12);
        assert!(hi > 0.0 && hi < 0.01);

        let noisy = simulator(OutputLayout::Parity, 500, 6).run_plain(&raster).unwrap().report;
        let (lo, hi) = noisy.ber_after_interval;
        assert!(noisy.ber_after > 0.0);
        assert!(lo < noisy.ber_after && noisy.ber_after < hi);
        assert!(noisy.to_string().contains("95% CI"));
    }

    #[test]
    fn test_from_config() {
        let mut config = LinkConfig::default();
        config.channel.seed = Some(8);
        config.code.decoding_depth = 12;
        let link = LinkSimulator::from_config(&config).unwrap();
        assert_eq!(link.decoder().decoding_depth(), 12);
        assert_eq!(link.coder().encoder().output_length(), 4);

        config.channel.error_rate = 50_000;
        assert!(LinkSimulator::from_config(&config).is_err());
    }

    #[test]
    fn test_file_pipeline() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.bmp");
        let plain_text = dir.path().join("plain.txt");
        let plain_image = dir.path().join("plain.bmp");
        let coded_text = dir.path().join("coded.txt");
        let coded_image = dir.path().join("coded.bmp");

        let raster = test_raster();
        raster.save_bmp(&input).unwrap();

        let mut link = simulator(OutputLayout::Systematic, 0, 5);
        let plain = link.run_plain_files(&input, &plain_text, &plain_image).unwrap();
        let coded = link.run_coded_files(&input, &coded_text, &coded_image).unwrap();

        assert_eq!(plain.residual_errors, 0);
        assert_eq!(coded.residual_errors, 0);
        assert_eq!(Raster::load_bmp(&coded_image).unwrap(), raster);

        let signal = std::fs::read_to_string(&coded_text).unwrap();
        assert!(signal.ends_with('\n'));
        assert_eq!(signal.trim_end().len(), raster.bit_len() * 4);
        assert_eq!(link.decode_signal(&signal, 8, 8).unwrap(), raster);
    }
}
