//! layered-infill - CLI for layered tile infill
//!
//! Usage:
//!   layered-infill generate <request.json>          Answer an infill request
//!   layered-infill preview <request.json> -o x.png  Render the fill
//!   layered-infill resolve <tiles_dir> <pattern> <z> Show the layer file used
//!   layered-infill patterns <tiles_dir>             List available patterns
//!   layered-infill author <tiles_dir> <pattern> <z> <motif>  Write a layer file

mod cli;

use std::env;
use std::process::ExitCode;

use anyhow::{Context, Result, bail};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use cli::{cmd_author, cmd_generate, cmd_patterns, cmd_preview, cmd_resolve, load_config};

/// Options accepted before or after the subcommand.
struct GlobalOptions {
    config: Option<String>,
    verbose: bool,
}

/// Pull `--config <file>` and `-v` out of the argument list.
fn split_global_options(args: &[String]) -> Result<(GlobalOptions, Vec<String>)> {
    let mut options = GlobalOptions { config: None, verbose: false };
    let mut rest = Vec::new();

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "-c" | "--config" => {
                let path = iter.next().context("--config needs a file")?;
                options.config = Some(path.clone());
            }
            "-v" | "--verbose" => options.verbose = true,
            _ => rest.push(arg.clone()),
        }
    }
    Ok((options, rest))
}

/// Structured logs go to stderr so stdout stays machine-readable.
fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn print_usage() {
    eprintln!("layered-infill - Layered tile infill generation");
    eprintln!();
    eprintln!("USAGE:");
    eprintln!("    layered-infill [GLOBAL OPTIONS] <COMMAND> [ARGS]");
    eprintln!();
    eprintln!("COMMANDS:");
    eprintln!("    generate <request.json|->            Answer an infill request with JSON");
    eprintln!("    preview <request.json|-> -o <file>   Render the fill to .svg or .png");
    eprintln!("    resolve <tiles_dir> <pattern> <z>    Show the content file a layer uses");
    eprintln!("    patterns <tiles_dir>                 List patterns and their layers");
    eprintln!("    author <tiles_dir> <pattern> <z> <motif>");
    eprintln!("                                         Write a motif as a layer file");
    eprintln!();
    eprintln!("GLOBAL OPTIONS:");
    eprintln!("    -c, --config <file.yaml>   line_width, reference_size, svg_unit_scale");
    eprintln!("                               Motifs scale by infill_scale / reference_size");
    eprintln!("                               (default 1000); set reference_size to the");
    eprintln!("                               tile size to place motifs unscaled");
    eprintln!("    -v, --verbose              Debug logging (otherwise RUST_LOG, default info)");
    eprintln!("    -h, --help                 Show this help");
}

fn run(args: &[String]) -> Result<()> {
    let (options, rest) = split_global_options(args)?;
    init_logging(options.verbose);

    let Some(command) = rest.first() else {
        print_usage();
        bail!("no command given");
    };
    if matches!(command.as_str(), "help" | "--help" | "-h") {
        print_usage();
        return Ok(());
    }

    let config = load_config(options.config.as_deref())?;
    let args = &rest[1..];

    match command.as_str() {
        "generate" => cmd_generate(args, &config),
        "preview" => cmd_preview(args, &config),
        "resolve" => cmd_resolve(args),
        "patterns" => cmd_patterns(args),
        "author" => cmd_author(args, &config),
        other => {
            print_usage();
            bail!("unknown command '{other}'")
        }
    }
}

fn main() -> ExitCode {
    let args: Vec<String> = env::args().skip(1).collect();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
