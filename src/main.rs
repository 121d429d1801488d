use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use skisplit::io::resolve_inputs;
use skisplit::pipeline::default_output_dir;
use skisplit::{AllowList, BoundaryMode, OrderingPolicy, SplitConfig, select_group, split_files};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "skisplit")]
#[command(about = "Split a large ski-run GeoJSON export into one file per ski area", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode: log only warnings/errors
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Stream the input and write one merged collection per ski area
    Split(SplitArgs),

    /// Load the whole input and write the features of a single ski area
    Select(SelectArgs),
}

#[derive(Args)]
struct SplitArgs {
    /// Input GeoJSON file or glob pattern (.gz/.zst are decompressed)
    input: String,

    /// Output directory (defaults to the input's directory)
    output_dir: Option<PathBuf>,

    /// Ignore braces inside JSON strings when finding object boundaries
    #[arg(long)]
    string_aware: bool,

    /// Fail if a ski area re-appears after it was already written
    #[arg(long)]
    require_contiguous: bool,

    /// Leading lines searched for the "features" array
    #[arg(long, default_value_t = skisplit::scanner::DEFAULT_MAX_HEADER_LINES)]
    max_header_lines: usize,

    /// Output file suffix
    #[arg(long, default_value = skisplit::writer::DEFAULT_FILE_SUFFIX)]
    suffix: String,

    /// Ski area to write (repeatable; replaces the embedded list)
    #[arg(long = "group", value_name = "NAME")]
    groups: Vec<String>,

    /// Save a JSON run summary to this path
    #[arg(long)]
    summary: Option<PathBuf>,
}

#[derive(Args)]
struct SelectArgs {
    /// Input GeoJSON file
    input: PathBuf,

    /// Ski area name to keep
    group: String,

    /// Output file (defaults to filtered_<input name> next to the input)
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if cli.quiet {
        builder.filter_level(log::LevelFilter::Warn);
    } else if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.target(env_logger::Target::Stderr).init();

    match cli.command {
        Commands::Split(args) => run_split(args),
        Commands::Select(args) => {
            let summary = select_group(&args.input, &args.group, args.output.as_deref())?;
            log::info!(
                "kept {} of {} features in {}",
                summary.matched,
                summary.scanned,
                summary.output.display()
            );
            Ok(())
        }
    }
}

fn run_split(args: SplitArgs) -> Result<()> {
    let inputs = resolve_inputs(&args.input)?;
    let output_dir = args
        .output_dir
        .unwrap_or_else(|| default_output_dir(&inputs[0]));

    let config = SplitConfig {
        output_dir,
        file_suffix: args.suffix,
        max_header_lines: args.max_header_lines,
        boundary: if args.string_aware {
            BoundaryMode::StringAware
        } else {
            BoundaryMode::Naive
        },
        ordering: if args.require_contiguous {
            OrderingPolicy::RequireContiguous
        } else {
            OrderingPolicy::AssumeContiguous
        },
        allow_list: if args.groups.is_empty() {
            AllowList::embedded()
        } else {
            AllowList::from_names(args.groups)
        },
        ..SplitConfig::default()
    };

    let summary = split_files(&inputs, &config)?;
    summary.log();
    if let Some(path) = args.summary {
        summary.save_to_file(&path)?;
    }
    Ok(())
}
