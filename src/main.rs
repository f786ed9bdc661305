//! Sequin - Main Entry Point
//!
//! Command-line front end over the rolling scanner and the sequence builder.
//! Cells are exchanged as JSON.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde_json::json;
use std::io::Read;
use std::path::PathBuf;
use tracing::{debug, Level};

use sequin::{
    BuilderOptions, LogicalType, RollingApply, Sequence, SequenceBuilder, SequinConfig,
    SequinResult, Value,
};

#[derive(Parser)]
#[command(name = "sequin")]
#[command(about = "Rolling aggregates and incremental builders over columnar sequences")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Apply an aggregate over a moving window of a JSON array of cells
    Rolling {
        /// Aggregate function name (mean, sum, min, max, count, median)
        #[arg(short, long)]
        function: String,

        /// Window start offset relative to the current position
        #[arg(long, allow_hyphen_values = true)]
        window_start: i64,

        /// Window end offset relative to the current position
        #[arg(long, allow_hyphen_values = true)]
        window_end: i64,

        /// Minimum number of non-null cells a window needs
        #[arg(short, long, default_value_t = 0)]
        min_observations: usize,

        /// Input file, or `-` for stdin
        #[arg(short, long, default_value = "-")]
        input: String,

        /// JSON configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Build a sequence from one JSON cell per line
    Build {
        /// Number of segments; lines are distributed round-robin
        #[arg(short, long)]
        segments: Option<usize>,

        /// Number of recent values to report
        #[arg(long)]
        history: Option<usize>,

        /// Declared element type; inferred when omitted
        #[arg(short, long)]
        dtype: Option<String>,

        /// Input file, or `-` for stdin
        #[arg(short, long, default_value = "-")]
        input: String,

        /// JSON configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

fn read_input(input: &str) -> Result<String> {
    if input == "-" {
        let mut buffer = String::new();
        std::io::stdin()
            .read_to_string(&mut buffer)
            .context("failed to read stdin")?;
        Ok(buffer)
    } else {
        std::fs::read_to_string(input).with_context(|| format!("failed to read {}", input))
    }
}

fn load_config(path: Option<&PathBuf>) -> Result<SequinConfig> {
    match path {
        Some(path) => SequinConfig::from_file(path)
            .with_context(|| format!("failed to load config {}", path.display())),
        None => Ok(SequinConfig::default()),
    }
}

/// Rolling aggregate over a JSON array of cells, returned as a JSON array
fn run_rolling(
    config: &SequinConfig,
    function: &str,
    window_start: i64,
    window_end: i64,
    min_observations: usize,
    text: &str,
) -> Result<serde_json::Value> {
    let json: serde_json::Value = serde_json::from_str(text).context("input is not valid JSON")?;
    let serde_json::Value::Array(cells) = json else {
        bail!("input must be a JSON array of cells");
    };

    let values = cells
        .iter()
        .map(Value::from_json)
        .collect::<SequinResult<Vec<_>>>()?;
    let sequence = Sequence::from_values(values)?;
    debug!(rows = sequence.len(), element_type = %sequence.get_type(), "input loaded");

    let output = RollingApply::new(config.rolling.clone()).apply(
        &sequence,
        function,
        window_start,
        window_end,
        min_observations,
    )?;
    Ok(serde_json::Value::Array(output.iter().map(Value::to_json).collect()))
}

/// Build a sequence from one JSON cell per line, spread round-robin over segments
fn run_build(options: BuilderOptions, text: &str) -> Result<serde_json::Value> {
    let builder = SequenceBuilder::with_options(&options)?;

    let cells = text
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty());
    for (appended, (line_number, line)) in cells.enumerate() {
        let json: serde_json::Value = serde_json::from_str(line)
            .with_context(|| format!("line {} is not valid JSON", line_number + 1))?;
        let segment = appended % options.num_segments;
        let rejected = || format!("line {} rejected", line_number + 1);
        let value = Value::from_json(&json).with_context(rejected)?;
        builder.append(value, segment).with_context(rejected)?;
    }

    let history = builder.read_history(Some(options.history_size))?;
    let sequence = builder.close()?;
    Ok(json!({
        "type": builder.get_type().map(|t| t.name()),
        "length": sequence.len(),
        "history": history.iter().map(Value::to_json).collect::<Vec<_>>(),
        "values": sequence.iter().map(Value::to_json).collect::<Vec<_>>(),
    }))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(if cli.verbose { Level::DEBUG } else { Level::WARN })
        .with_writer(std::io::stderr)
        .init();

    let output = match cli.command {
        Command::Rolling {
            function,
            window_start,
            window_end,
            min_observations,
            input,
            config,
        } => run_rolling(
            &load_config(config.as_ref())?,
            &function,
            window_start,
            window_end,
            min_observations,
            &read_input(&input)?,
        )?,
        Command::Build {
            segments,
            history,
            dtype,
            input,
            config,
        } => {
            let mut options = load_config(config.as_ref())?.builder;
            if let Some(segments) = segments {
                options.num_segments = segments;
            }
            if let Some(history) = history {
                options.history_size = history;
            }
            if let Some(dtype) = dtype {
                options.declared_type = Some(dtype.parse::<LogicalType>()?);
            }
            if options.num_segments == 0 {
                bail!("--segments must be at least 1");
            }
            run_build(options, &read_input(&input)?)?
        }
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
