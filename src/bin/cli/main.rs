//! CLI tool for looping sliced 3MF print jobs.

mod commands;
mod exit_codes;
mod output;

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use plateloop::gcode::{CoolingMode, DetachConfig, PurgeConfig, PurgeStage};

/// Repeat a sliced 3MF print N times with an automatic detach sequence
#[derive(Parser)]
#[command(name = "plateloop")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, short = 'f', value_enum, default_value = "human", global = true)]
    format: OutputFormat,

    /// Log purge and merge decisions to stderr
    #[arg(long, short = 'v', global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a looped copy of a .gcode.3mf (alias: b)
    #[command(alias = "b")]
    Build {
        /// Sliced .gcode.3mf to loop
        archive: PathBuf,

        /// Output file (default: <stem>__loopx<N>.gcode.3mf next to the input)
        #[arg(short = 'o', long)]
        output: Option<PathBuf>,

        /// Number of repetitions
        #[arg(short = 'n', long, default_value = "2", value_parser = clap::value_parser!(u32).range(1..))]
        loops: u32,

        /// Plate to loop (1-based)
        #[arg(short = 'p', long, default_value = "1", value_parser = clap::value_parser!(u32).range(1..))]
        plate: u32,

        /// Force every M140/M190 S<n> to this bed temperature
        #[arg(long, value_name = "CELSIUS")]
        bed_hold: Option<f64>,

        /// Also write the generated G-code to this file
        #[arg(long, value_name = "FILE")]
        gcode_out: Option<PathBuf>,

        #[command(flatten)]
        purge: PurgeArgs,

        #[command(flatten)]
        detach: DetachArgs,
    },

    /// List archive entries (alias: l)
    #[command(alias = "l")]
    List {
        /// Archive file to list
        archive: PathBuf,
    },

    /// Print a plate's G-code (alias: x)
    #[command(alias = "x")]
    Extract {
        /// Archive file
        archive: PathBuf,

        /// Plate to extract; the first .gcode entry when absent
        #[arg(short = 'p', long)]
        plate: Option<u32>,

        /// Write to this file instead of stdout
        #[arg(short = 'o', long)]
        output: Option<PathBuf>,
    },

    /// Show block layout, purge candidates and loop settings (alias: i)
    #[command(alias = "i")]
    Inspect {
        /// A .gcode.3mf or a bare .gcode file
        input: PathBuf,

        /// Plate to inspect when the input is an archive
        #[arg(short = 'p', long, default_value = "1")]
        plate: u32,
    },

    /// Wrap a bare .gcode file into a minimal .gcode.3mf
    Wrap {
        /// G-code file to wrap
        gcode: PathBuf,

        /// Output file (default: <input>.3mf)
        #[arg(short = 'o', long)]
        output: Option<PathBuf>,

        /// Plate index of the wrapped file
        #[arg(short = 'p', long, default_value = "1", value_parser = clap::value_parser!(u32).range(1..))]
        plate: u32,
    },
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Human,
    Json,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum CoolMode {
    /// Wait for the bed to cool to --cool-temp
    Temp,
    /// Dwell for --cool-seconds
    Time,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum Stage {
    Flush,
    Wipe,
    LinePurge,
    TopOfFile,
    NozzleLoad,
}

impl From<Stage> for PurgeStage {
    fn from(stage: Stage) -> Self {
        match stage {
            Stage::Flush => PurgeStage::FlushBlocks,
            Stage::Wipe => PurgeStage::WipeShake,
            Stage::LinePurge => PurgeStage::LinePurge,
            Stage::TopOfFile => PurgeStage::TopOfFile,
            Stage::NozzleLoad => PurgeStage::NozzleLoadLine,
        }
    }
}

/// Purge removal options
#[derive(Args)]
pub struct PurgeArgs {
    /// Skip a purge stage (repeatable)
    #[arg(long = "skip-stage", value_enum)]
    skip: Vec<Stage>,

    /// Keep every purge sequence
    #[arg(long, conflicts_with = "skip")]
    keep_purge: bool,
}

impl PurgeArgs {
    fn to_config(&self) -> PurgeConfig {
        if self.keep_purge {
            return PurgeConfig::none();
        }
        self.skip
            .iter()
            .fold(PurgeConfig::default(), |config, stage| {
                config.with_stage((*stage).into(), false)
            })
    }
}

/// Detach sequence options
#[derive(Args)]
pub struct DetachArgs {
    /// Signed adjustment of the sweep height in mm
    #[arg(long, default_value = "0", allow_hyphen_values = true)]
    z_offset: f64,

    /// Keep the fan off while sweeping
    #[arg(long)]
    no_fan: bool,

    /// Home X/Y after each detach
    #[arg(long)]
    home_between: bool,

    /// Skip the 5 mm safety lift
    #[arg(long)]
    no_safe_lift: bool,

    /// Cooling step before each detach
    #[arg(long, value_enum, default_value = "temp")]
    cool_mode: CoolMode,

    /// Bed temperature to wait for
    #[arg(long, default_value = "30")]
    cool_temp: f64,

    /// Dwell duration
    #[arg(long, default_value = "0")]
    cool_seconds: f64,

    /// Slow raster passes
    #[arg(long, default_value = "0")]
    sweeps_slow: u32,

    /// Fast raster passes
    #[arg(long, default_value = "0")]
    sweeps_fast: u32,

    /// Stroke feed of slow passes
    #[arg(long, default_value = "3000")]
    feed_slow: f64,

    /// Stroke feed of fast passes
    #[arg(long, default_value = "12000")]
    feed_fast: f64,

    /// First sweep column
    #[arg(long, default_value = "0")]
    x_min: f64,

    /// Last sweep column
    #[arg(long, default_value = "220")]
    x_max: f64,

    /// Column step
    #[arg(long, default_value = "30")]
    x_step: f64,

    /// Back edge of the strokes
    #[arg(long, default_value = "250")]
    y_max: f64,

    /// Base sweep height
    #[arg(long, default_value = "2")]
    sweep_z: f64,

    /// Lower Z of the bend phase
    #[arg(long, default_value = "200")]
    bend_bottom: f64,

    /// Upper Z of the bend phase
    #[arg(long, default_value = "235")]
    bend_top: f64,

    /// Bend cycles
    #[arg(long, default_value = "6")]
    bend_cycles: u32,

    /// Feed of bend moves
    #[arg(long, default_value = "12000")]
    bend_feed: f64,
}

impl DetachArgs {
    fn to_config(&self) -> DetachConfig {
        let cooling = match self.cool_mode {
            CoolMode::Temp => CoolingMode::WaitForBed {
                max_temp_c: self.cool_temp,
            },
            CoolMode::Time => CoolingMode::Dwell {
                seconds: self.cool_seconds,
            },
        };
        DetachConfig::new()
            .z_offset(self.z_offset)
            .fan_on(!self.no_fan)
            .home_between(self.home_between)
            .safe_lift(!self.no_safe_lift)
            .cooling(cooling)
            .slow_sweeps(self.sweeps_slow, self.feed_slow)
            .fast_sweeps(self.sweeps_fast, self.feed_fast)
            .sweep_x(self.x_min, self.x_max, self.x_step)
            .sweep_y_max(self.y_max)
            .sweep_z(self.sweep_z)
            .bend(
                self.bend_bottom,
                self.bend_top,
                self.bend_cycles,
                self.bend_feed,
            )
    }
}

fn init_logging(verbose: bool) {
    let level = if verbose {
        tracing_subscriber::filter::LevelFilter::DEBUG
    } else {
        tracing_subscriber::filter::LevelFilter::WARN
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .without_time()
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let exit_code = match cli.command {
        Commands::Build {
            archive,
            output,
            loops,
            plate,
            bed_hold,
            gcode_out,
            purge,
            detach,
        } => commands::build(&commands::BuildConfig {
            archive_path: &archive,
            output_path: output.as_deref(),
            gcode_out: gcode_out.as_deref(),
            loops,
            plate,
            bed_hold,
            purge: purge.to_config(),
            detach: detach.to_config(),
            format: cli.format,
        }),

        Commands::List { archive } => commands::list(&archive, cli.format),

        Commands::Extract {
            archive,
            plate,
            output,
        } => commands::extract(&archive, plate, output.as_deref(), cli.format),

        Commands::Inspect { input, plate } => commands::inspect(&input, plate, cli.format),

        Commands::Wrap {
            gcode,
            output,
            plate,
        } => commands::wrap(&gcode, output.as_deref(), plate, cli.format),
    };

    std::process::exit(exit_code.code());
}
