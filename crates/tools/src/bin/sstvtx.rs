//! sstvtx - encode an image as an SSTV transmission

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use sstvtx_modem::modes::ModeDefinition;
use sstvtx_tools::{init_logging, load_image, parse_format, AspectMode, Transmitter, TxConfig};
use std::path::PathBuf;
use tracing::info;

/// SSTV transmit encoder
#[derive(Parser)]
#[command(name = "sstvtx")]
#[command(about = "Encode images as SSTV audio")]
#[command(version)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Enable debug output
    #[arg(long, global = true)]
    debug: bool,

    /// Include timestamps in log output
    #[arg(long, global = true)]
    timestamps: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Encode an image into an audio file
    Encode(EncodeArgs),
    /// List supported modes
    Modes {
        /// Print the table as JSON
        #[arg(long)]
        json: bool,
    },
}

/// Encoding options, each overriding the config file
#[derive(Args, Clone)]
struct EncodeArgs {
    /// Input image (PNG, JPEG, GIF or BMP)
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Output audio file [default: <input stem>.<format>]
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// SSTV mode (m1, m2, s1, s2, sdx, r36, r72)
    #[arg(short = 'p', long)]
    mode: Option<String>,

    /// Output format (wav, aiff)
    #[arg(short, long)]
    format: Option<String>,

    /// Sample rate in Hz
    #[arg(short = 'r', long)]
    sample_rate: Option<u32>,

    /// Aspect correction
    #[arg(short, long, value_enum)]
    aspect: Option<AspectMode>,

    /// Callsign keyed in CW after the image
    #[arg(short = 'C', long)]
    callsign: Option<String>,

    /// CW speed in words per minute
    #[arg(short = 'W', long)]
    cw_wpm: Option<u32>,

    /// CW tone in Hz
    #[arg(short = 'T', long)]
    cw_tone: Option<f64>,

    /// Peak amplitude (1-32767)
    #[arg(long)]
    amplitude: Option<u16>,

    /// Skip the attention preamble
    #[arg(long)]
    no_preamble: bool,

    /// Skip the closing tones
    #[arg(long)]
    no_trailer: bool,

    /// TOML or JSON configuration file
    #[arg(long)]
    config: Option<PathBuf>,
}

impl EncodeArgs {
    /// File settings, with every flag given on the command line applied on top
    fn into_config(self) -> Result<TxConfig> {
        let mut config = match &self.config {
            Some(path) => TxConfig::from_file(path)?,
            None => TxConfig::default(),
        };

        if let Some(input) = self.input {
            config.input = input;
        }
        if let Some(output) = self.output {
            config.output = Some(output);
        }
        if let Some(mode) = self.mode {
            config.mode = mode;
        }
        if let Some(format) = self.format {
            config.format = Some(parse_format(&format)?);
        }
        if let Some(rate) = self.sample_rate {
            config.sample_rate = rate;
        }
        if let Some(aspect) = self.aspect {
            config.aspect = aspect;
        }
        if let Some(callsign) = self.callsign {
            config.callsign = Some(callsign);
        }
        if let Some(wpm) = self.cw_wpm {
            config.cw_wpm = wpm;
        }
        if let Some(tone) = self.cw_tone {
            config.cw_tone_hz = tone;
        }
        if let Some(amplitude) = self.amplitude {
            config.amplitude = amplitude;
        }
        if self.no_preamble {
            config.preamble = false;
        }
        if self.no_trailer {
            config.trailer = false;
        }
        Ok(config)
    }
}

#[derive(Serialize)]
struct ModeSummary {
    code: &'static str,
    name: &'static str,
    vis_code: u8,
    width: u32,
    height: u32,
    nominal_secs: f64,
    computed_secs: f64,
}

impl From<&ModeDefinition> for ModeSummary {
    fn from(mode: &ModeDefinition) -> Self {
        Self {
            code: mode.code,
            name: mode.display_name,
            vis_code: mode.vis_code,
            width: mode.width,
            height: mode.height,
            nominal_secs: mode.nominal_duration_secs,
            computed_secs: mode.image_duration_us() / 1e6,
        }
    }
}

fn show_modes(json: bool) -> Result<()> {
    let modes: Vec<ModeSummary> = ModeDefinition::all().iter().map(ModeSummary::from).collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&modes)?);
        return Ok(());
    }

    println!("{:<5} {:<12} {:>4} {:>9} {:>9} {:>9}", "CODE", "NAME", "VIS", "SIZE", "NOMINAL", "COMPUTED");
    for mode in &modes {
        println!(
            "{:<5} {:<12} {:>4} {:>9} {:>8.1}s {:>8.1}s",
            mode.code,
            mode.name,
            mode.vis_code,
            format!("{}x{}", mode.width, mode.height),
            mode.nominal_secs,
            mode.computed_secs
        );
    }
    Ok(())
}

fn encode(args: EncodeArgs) -> Result<()> {
    let config = args.into_config()?;
    let transmitter = Transmitter::new(config)?;
    let config = transmitter.config();

    info!(
        "Encoding {:?} as {} at {} Hz",
        config.input,
        transmitter.mode().display_name,
        config.sample_rate
    );

    let pixels = load_image(&config.input, transmitter.mode(), config.aspect)?;
    let buffer = transmitter.transmit(&pixels)?;
    transmitter.write(&buffer)?;

    println!(
        "✓ {} transmission complete: {:.2} s written to {:?}",
        transmitter.mode().display_name,
        buffer.duration_secs(),
        config.output_path()
    );
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.debug, cli.verbose, cli.timestamps);

    match cli.command {
        Commands::Encode(args) => encode(args)?,
        Commands::Modes { json } => show_modes(json)?,
    }

    Ok(())
}
