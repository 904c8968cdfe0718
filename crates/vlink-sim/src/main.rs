//! vlink - convolutional-code image link simulator

use clap::{Parser, Subcommand};
use std::error::Error;
use std::path::PathBuf;
use vlink_core::observe::init_logging;
use vlink_core::{ChannelCoder, LinkConfig, OutputLayout};
use vlink_sim::{render_histogram, LinkSimulator, NoiseChannel};

#[derive(Parser)]
#[command(name = "vlink", version, about)]
struct Cli {
    /// Configuration file [default: search VLINK_CONFIG, ./vlink.yaml, user and system config]
    #[arg(short = 'c', long = "config", global = true)]
    config: Option<PathBuf>,

    /// Print diagnostic messages
    #[arg(short = 'v', long = "verbose", global = true)]
    verbose: bool,

    /// Quiet mode: errors only
    #[arg(short = 'q', long = "quiet", global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Send an image over the plain and the coded link
    Run {
        /// Source BMP image
        #[arg(short = 'i', long = "input")]
        input: Option<PathBuf>,

        /// Uncoded signal text output
        #[arg(long = "plain-text")]
        plain_text: Option<PathBuf>,

        /// Image rebuilt from the uncoded signal
        #[arg(long = "plain-image")]
        plain_image: Option<PathBuf>,

        /// Coded signal text output
        #[arg(long = "coded-text")]
        coded_text: Option<PathBuf>,

        /// Image rebuilt by the Viterbi decoder
        #[arg(short = 'o', long = "decoded-image")]
        decoded_image: Option<PathBuf>,

        /// Bit error rate in parts per 10 000
        #[arg(short = 'e', long = "error-rate")]
        error_rate: Option<u32>,

        /// Viterbi decoding depth in symbols
        #[arg(short = 'd', long = "depth")]
        depth: Option<usize>,

        /// RNG seed for reproducible noise
        #[arg(short = 's', long = "seed")]
        seed: Option<u64>,

        /// Use 3-bit parity-only symbols
        #[arg(long = "no-systematic")]
        no_systematic: bool,

        /// Channel profile from the config file
        #[arg(short = 'p', long = "profile")]
        profile: Option<String>,

        /// Skip the uncoded run
        #[arg(long = "skip-plain")]
        skip_plain: bool,
    },

    /// Decode a received coded signal text into an image
    Decode {
        /// Coded signal text
        #[arg(short = 'i', long = "input")]
        input: PathBuf,

        /// Output BMP image
        #[arg(short = 'o', long = "output")]
        output: PathBuf,

        /// Image width in pixels
        #[arg(long = "width")]
        width: u32,

        /// Image height in pixels
        #[arg(long = "height")]
        height: u32,

        /// Viterbi decoding depth in symbols
        #[arg(short = 'd', long = "depth")]
        depth: Option<usize>,

        /// Signal uses 3-bit parity-only symbols
        #[arg(long = "no-systematic")]
        no_systematic: bool,
    },

    /// Check the uniformity of the noise RNG
    Histogram {
        /// Number of draws
        #[arg(short = 'n', long = "draws", default_value_t = 1_000_000)]
        draws: usize,

        /// Number of buckets over 0..10000
        #[arg(short = 'b', long = "buckets", default_value_t = 20)]
        buckets: usize,

        /// Longest bar in characters
        #[arg(short = 'w', long = "bar-width", default_value_t = 60)]
        bar_width: usize,

        /// RNG seed
        #[arg(short = 's', long = "seed")]
        seed: Option<u64>,
    },

    /// Print an example configuration file
    Config,
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    let mut config = match &cli.config {
        Some(path) => LinkConfig::load_from(path)?,
        None => LinkConfig::load()?,
    };

    init_logging(&config.logging.clone().with_verbosity(cli.verbose, cli.quiet));

    run(cli.command, &mut config).map_err(|e| {
        tracing::error!("{}", e);
        e
    })
}

fn run(command: Command, config: &mut LinkConfig) -> Result<(), Box<dyn Error>> {
    match command {
        Command::Run {
            input,
            plain_text,
            plain_image,
            coded_text,
            decoded_image,
            error_rate,
            depth,
            seed,
            no_systematic,
            profile,
            skip_plain,
        } => {
            if let Some(name) = profile {
                *config = config.with_profile(&name)?;
            }
            if let Some(rate) = error_rate {
                config.channel.error_rate = rate;
            }
            if let Some(seed) = seed {
                config.channel.seed = Some(seed);
            }
            if let Some(depth) = depth {
                config.code.decoding_depth = depth;
            }
            if no_systematic {
                config.code.layout = OutputLayout::Parity;
            }

            let paths = &mut config.paths;
            if let Some(path) = input {
                paths.input_image = path;
            }
            if let Some(path) = plain_text {
                paths.plain_text = path;
            }
            if let Some(path) = plain_image {
                paths.plain_image = path;
            }
            if let Some(path) = coded_text {
                paths.coded_text = path;
            }
            if let Some(path) = decoded_image {
                paths.decoded_image = path;
            }

            let mut link = LinkSimulator::from_config(config)?;
            tracing::info!(
                encoder = %link.coder().encoder(),
                depth = link.decoder().decoding_depth(),
                error_rate = config.channel.error_rate,
                "Starting link simulation"
            );

            let paths = &config.paths;
            if !skip_plain {
                let report =
                    link.run_plain_files(&paths.input_image, &paths.plain_text, &paths.plain_image)?;
                println!("{}", report);
            }
            let report =
                link.run_coded_files(&paths.input_image, &paths.coded_text, &paths.decoded_image)?;
            println!("{}", report);
        }

        Command::Decode {
            input,
            output,
            width,
            height,
            depth,
            no_systematic,
        } => {
            if let Some(depth) = depth {
                config.code.decoding_depth = depth;
            }
            if no_systematic {
                config.code.layout = OutputLayout::Parity;
            }

            let coder = ChannelCoder::new(config.code.encoder());
            let mut link =
                LinkSimulator::new(coder, config.code.decoding_depth, NoiseChannel::noiseless());
            let text = std::fs::read_to_string(&input)?;
            let raster = link.decode_signal(&text, width, height)?;
            raster.save_bmp(&output)?;
            println!("Decoded {} pixels to {}", raster.pixel_count(), output.display());
        }

        Command::Histogram {
            draws,
            buckets,
            bar_width,
            seed,
        } => {
            let mut channel = NoiseChannel::new(0, seed.or(config.channel.seed))?;
            let histogram = channel.histogram(draws, buckets);
            print!("{}", render_histogram(&histogram, bar_width));
        }

        Command::Config => {
            print!("{}", LinkConfig::example_yaml());
        }
    }

    Ok(())
}
