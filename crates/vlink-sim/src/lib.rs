//! # Link Simulator
//!
//! Pushes a raster image over a noisy binary channel, once uncoded and once
//! through the IS-95 convolutional code from `vlink-core`, and reports how
//! many bit errors survive each path.
//!
//! ## Components
//!
//! - [`NoiseChannel`]: binary symmetric channel, error rate per 10 000
//! - [`BerCounter`]: bit error accounting with confidence intervals
//! - [`Raster`]: RGB pixels ↔ 24-bit-per-pixel bitstream, BMP I/O
//! - [`LinkSimulator`]: the plain and coded pipelines
//!
//! ## Example
//!
//! ```rust
//! use vlink_core::{ChannelCoder, ConvolutionalEncoder};
//! use vlink_sim::{LinkSimulator, NoiseChannel, Raster};
//!
//! let raster = Raster::filled(4, 4, 0x3366CC);
//! let channel = NoiseChannel::new(100, Some(1)).unwrap();
//! let mut link = LinkSimulator::new(ChannelCoder::new(ConvolutionalEncoder::is95()), 48, channel);
//!
//! let run = link.run_coded(&raster).unwrap();
//! println!("{}", run.report);
//! ```

pub mod ber;
pub mod channel;
pub mod error;
pub mod link;
pub mod raster;

pub use ber::BerCounter;
pub use channel::{render_histogram, Histogram, NoiseChannel, NoiseReport};
pub use error::{SimError, SimResult};
pub use link::{LinkMode, LinkReport, LinkRun, LinkSimulator};
pub use raster::Raster;
