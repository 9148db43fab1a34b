//! Lab Convert CLI
//!
//! Inspect camera frame streams and convert frames and sweeps to JSON, CSV or
//! PNG.

use clap::{Parser, Subcommand, ValueEnum};
use lab_formats::cam::{mean_frame, sum_frames, CamReader, FrameRange};
use lab_formats::formats::sweep::{
    filter_channel_name, interpolate_sweep, load_sweep, prepare_sweep_frequency, AllowedJump,
    FREQUENCY_COLUMN,
};
use lab_formats::output::{self, CamSummary};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

#[derive(Parser)]
#[command(name = "lab-convert")]
#[command(about = "Inspect camera frame streams and convert lab data to open formats")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Pretty-print JSON output
    #[arg(short, long, global = true)]
    pretty: bool,

    /// Show debug logging (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Print frame count and frame shapes of .cam streams as JSON
    Inspect {
        /// Input .cam file(s)
        #[arg(required = true)]
        input: Vec<PathBuf>,

        /// Assume all frames share the first frame's shape
        #[arg(long)]
        same_size: bool,
    },

    /// Export a single frame
    Export {
        /// Input .cam file
        input: PathBuf,

        /// Frame index
        #[arg(long, default_value_t = 0)]
        frame: usize,

        /// Assume all frames share the first frame's shape
        #[arg(long)]
        same_size: bool,

        #[command(flatten)]
        target: Target,
    },

    /// Sum or average a range of frames
    Combine {
        /// Input .cam file
        input: PathBuf,

        /// Average the frames (default)
        #[arg(long, conflicts_with = "sum")]
        mean: bool,

        /// Sum the frames instead of averaging
        #[arg(long)]
        sum: bool,

        /// First frame index
        #[arg(long, default_value_t = 0)]
        start: usize,

        /// Index step between visited frames
        #[arg(long, default_value_t = 1)]
        step: usize,

        /// Stop after this many frames
        #[arg(long)]
        max_frames: Option<usize>,

        #[command(flatten)]
        target: Target,
    },

    /// Resample waveguide sweeps onto a regular frequency grid
    Sweep {
        /// Sweep prefix(es); `<prefix>.dat` and `<prefix>_info.txt` are read
        #[arg(required = true)]
        prefix: Vec<PathBuf>,

        /// Frequency step of the output grid, in Hz
        #[arg(long)]
        step: f64,

        /// Channel to resample, as `source[:destination]`
        #[arg(long = "column", required = true)]
        columns: Vec<String>,

        /// Keep only the longest chunk without frequency jumps
        #[arg(long)]
        cut_jumps: bool,

        #[command(flatten)]
        target: Target,
    },
}

#[derive(clap::Args)]
struct Target {
    /// Output file path (for single input) or directory (for multiple inputs)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Json,
    Csv,
    Png,
}

impl OutputFormat {
    fn extension(self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Csv => "csv",
            OutputFormat::Png => "png",
        }
    }
}

fn main() {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if cli.verbose { "debug" } else { "info" }));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();

    let inputs: Vec<&PathBuf> = match &cli.command {
        Command::Inspect { input, .. } => input.iter().collect(),
        Command::Export { input, .. } | Command::Combine { input, .. } => vec![input],
        Command::Sweep { prefix, .. } => prefix.iter().collect(),
    };

    let mut success_count = 0;
    let mut error_count = 0;

    for input_path in &inputs {
        info!(input = %input_path.display(), "processing");

        match process(&cli, input_path, inputs.len()) {
            Ok(Some(output_path)) => {
                success_count += 1;
                info!(output = %output_path.display(), "written");
            }
            Ok(None) => success_count += 1,
            Err(e) => {
                error_count += 1;
                eprintln!("Error processing {}: {}", input_path.display(), e);
            }
        }
    }

    if inputs.len() > 1 {
        eprintln!(
            "\nProcessed {} file(s): {} success, {} errors",
            inputs.len(),
            success_count,
            error_count
        );
    }

    if error_count > 0 {
        std::process::exit(1);
    }
}

/// Handle one input; returns the output path if a file was written.
fn process(cli: &Cli, input_path: &Path, input_count: usize) -> CliResult<Option<PathBuf>> {
    match &cli.command {
        Command::Inspect { same_size, .. } => {
            let mut reader = CamReader::new(input_path, *same_size);
            let summary = CamSummary::collect(&mut reader)?;
            let stdout = io::stdout();
            let mut out = stdout.lock();
            output::write_json(&summary, &mut out, cli.pretty)?;
            writeln!(out)?;
            Ok(None)
        }
        Command::Export {
            frame,
            same_size,
            target,
            ..
        } => {
            let mut reader = CamReader::new(input_path, *same_size);
            let data = reader.get(*frame)?;
            let output_path = get_output_path(target, input_path, input_count);
            match target.format {
                OutputFormat::Json => write_to(&output_path, |w| {
                    output::write_json_frame(&data, *frame, w, cli.pretty).map_err(Into::into)
                })?,
                OutputFormat::Csv => write_to(&output_path, |w| Ok(output::write_csv_frame(&data, w)?))?,
                OutputFormat::Png => output::write_frame_png(&data, &output_path)?,
            }
            Ok(Some(output_path))
        }
        Command::Combine {
            mean,
            sum,
            start,
            step,
            max_frames,
            target,
            ..
        } => {
            let range = FrameRange::new(*start, *step);
            let (total, count) = if *sum && !*mean {
                sum_frames(input_path, range, *max_frames)?
            } else {
                mean_frame(input_path, range, *max_frames)?
            };
            let total = total.ok_or("no frames in the selected range")?;
            info!(frames = count, "combined");

            let output_path = get_output_path(target, input_path, input_count);
            match target.format {
                OutputFormat::Json => write_to(&output_path, |w| {
                    output::write_json(&total, w, cli.pretty).map_err(Into::into)
                })?,
                OutputFormat::Csv => write_to(&output_path, |w| Ok(output::write_csv_total(&total, w)?))?,
                OutputFormat::Png => {
                    let image = total.to_frame().ok_or("combined frame has an inconsistent shape")?;
                    output::write_frame_png(&image, &output_path)?
                }
            }
            Ok(Some(output_path))
        }
        Command::Sweep {
            step,
            columns,
            cut_jumps,
            target,
            ..
        } => {
            let pairs = parse_columns(columns);
            let pair_refs: Vec<(&str, &str)> = pairs.iter().map(|(s, d)| (s.as_str(), d.as_str())).collect();

            let (sweep, info) = load_sweep(input_path, false)?;
            let jump = if *cut_jumps { AllowedJump::Auto } else { AllowedJump::Any };
            let sweep = prepare_sweep_frequency(sweep, jump, true, true)?;
            let grid = interpolate_sweep(&sweep, &pair_refs, *step, (None, None), FREQUENCY_COLUMN)?;
            info!(rows = sweep.len(), points = grid.len(), "resampled sweep");

            let output_path = get_output_path(target, input_path, input_count);
            match target.format {
                OutputFormat::Json => write_to(&output_path, |w| {
                    output::write_json_table(&grid, Some(&info), w, cli.pretty).map_err(Into::into)
                })?,
                OutputFormat::Csv => write_to(&output_path, |w| Ok(output::write_csv_table(&grid, w)?))?,
                OutputFormat::Png => {
                    let y_columns: Vec<&str> = pair_refs.iter().map(|(_, dst)| *dst).collect();
                    output::write_table_plot_default(&grid, "Frequency", &y_columns, &output_path)?
                }
            }
            Ok(Some(output_path))
        }
    }
}

/// Split `source[:destination]` arguments; the destination defaults to the
/// source channel name.
fn parse_columns(args: &[String]) -> Vec<(String, String)> {
    args.iter()
        .map(|arg| match arg.split_once(':') {
            Some((src, dst)) => (filter_channel_name(src), dst.to_string()),
            None => {
                let src = filter_channel_name(arg);
                (src.clone(), src)
            }
        })
        .collect()
}

fn write_to<F>(output_path: &Path, write: F) -> CliResult<()>
where
    F: FnOnce(&mut BufWriter<File>) -> CliResult<()>,
{
    let file = File::create(output_path)?;
    let mut writer = BufWriter::new(file);
    write(&mut writer)?;
    writer.flush()?;
    Ok(())
}

fn get_output_path(target: &Target, input_path: &Path, input_count: usize) -> PathBuf {
    let extension = target.format.extension();

    if let Some(ref output) = target.output {
        if input_count == 1 {
            // Single file: use output as-is if it has an extension, otherwise add one
            if output.extension().is_some() {
                output.clone()
            } else {
                output.with_extension(extension)
            }
        } else {
            // Multiple files: output is a directory
            let filename = input_path
                .file_stem()
                .unwrap_or_default()
                .to_string_lossy();
            output.join(format!("{}.{}", filename, extension))
        }
    } else {
        // No output specified: create alongside input
        input_path.with_extension(extension)
    }
}
