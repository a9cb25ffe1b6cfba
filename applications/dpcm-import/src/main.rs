/// DPCM Import - WAV to NES DPCM sample converter
use clap::{Parser, Subcommand, ValueEnum};
use dpcm_audio::{Region, ResamplerBackend};
use dpcm_import::{commands, ConvertOptions, ImportConfig};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "dpcm-import")]
#[command(about = "Convert PCM WAV files to 1-bit DPCM samples", long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, global = true, env = "DPCM_IMPORT_CONFIG")]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the format of a WAV file and the available playback rates
    Info {
        /// WAV file to inspect
        input: PathBuf,

        /// Console timing region
        #[arg(long, value_enum)]
        region: Option<RegionArg>,
    },
    /// Convert a WAV file to a DPCM payload
    Convert {
        /// WAV file to convert
        input: PathBuf,

        /// Output file (defaults to the input with a .dmc extension)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Quality index, 0-15
        #[arg(short, long)]
        quality: Option<u8>,

        /// Gain in dB, -12 to 12
        #[arg(short, long, allow_hyphen_values = true)]
        gain: Option<f32>,

        /// Console timing region
        #[arg(long, value_enum)]
        region: Option<RegionArg>,

        /// Resampler backend
        #[arg(long, value_enum)]
        backend: Option<BackendArg>,

        /// Also write the decoded result as a WAV file
        #[arg(long)]
        preview: Option<PathBuf>,

        /// Sample name (defaults to the file name)
        #[arg(long)]
        name: Option<String>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum RegionArg {
    Ntsc,
    Pal,
}

impl From<RegionArg> for Region {
    fn from(arg: RegionArg) -> Self {
        match arg {
            RegionArg::Ntsc => Region::Ntsc,
            RegionArg::Pal => Region::Pal,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum BackendArg {
    Sinc,
    Rubato,
}

impl From<BackendArg> for ResamplerBackend {
    fn from(arg: BackendArg) -> Self {
        match arg {
            BackendArg::Sinc => ResamplerBackend::Sinc,
            BackendArg::Rubato => ResamplerBackend::Rubato,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let default_filter = if cli.verbose {
        "dpcm_import=debug,dpcm_audio=debug"
    } else {
        "dpcm_import=info,dpcm_audio=info"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let mut config = ImportConfig::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Info { input, region } => {
            if let Some(region) = region {
                config.region = region.into();
            }
            print!("{}", commands::info(&input, config.region)?);
        }
        Commands::Convert {
            input,
            output,
            quality,
            gain,
            region,
            backend,
            preview,
            name,
        } => {
            if let Some(quality) = quality {
                config.quality = quality;
            }
            if let Some(gain) = gain {
                config.gain_db = gain;
            }
            if let Some(region) = region {
                config.region = region.into();
            }
            if let Some(backend) = backend {
                config.backend = backend.into();
            }
            config.validate()?;

            let options = ConvertOptions {
                input,
                output,
                preview,
                name,
                request: config.request()?,
            };
            let outcome = commands::convert(&options)?;

            println!(
                "{}: {} bytes at {:.1} Hz -> {}",
                outcome.name,
                outcome.report.encoded_len,
                outcome.report.target_rate_hz,
                outcome.output.display()
            );
            if outcome.report.capacity_reached {
                println!("  (sample truncated to the maximum length)");
            }
        }
    }

    Ok(())
}
