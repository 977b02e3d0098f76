//! Generate command implementation.

use anyhow::{Context, Result, bail};
use tracing::info;

use layered_infill::{InfillConfig, InfillGenerator};

use super::common::{flag_value, read_input, write_output};
use super::request::{InfillRequest, InfillResponse};

/// Execute the generate command.
pub fn cmd_generate(args: &[String], config: &InfillConfig) -> Result<()> {
    let mut input: Option<&str> = None;
    let mut output: Option<&str> = None;
    let mut pretty = false;

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "-o" | "--output" => output = Some(flag_value(args, &mut i, "--output")?),
            "--pretty" => pretty = true,
            "-h" | "--help" => {
                print_usage();
                return Ok(());
            }
            path if path == "-" || !path.starts_with('-') => {
                if input.is_none() {
                    input = Some(path);
                }
            }
            other => bail!("unknown option '{other}' for generate"),
        }
        i += 1;
    }

    let Some(input) = input else {
        print_usage();
        bail!("request file required");
    };

    let request = InfillRequest::from_json(&read_input(input)?)?;
    let response = run_request(&request, config)?;

    let json = if pretty {
        serde_json::to_string_pretty(&response)?
    } else {
        serde_json::to_string(&response)?
    };
    write_output(output, &format!("{json}\n"))
}

/// Answer one request. Any failure fails the whole request.
pub fn run_request(request: &InfillRequest, config: &InfillConfig) -> Result<InfillResponse> {
    let generate = request.to_generate_request()?;
    let result = InfillGenerator::new(config.clone())
        .generate(&generate)
        .with_context(|| format!("infill generation failed for pattern '{}' at z {}", generate.pattern, generate.z))?;

    info!(
        lines = result.lines.len(),
        polygons = result.polygons.len(),
        "generated layer fill"
    );
    Ok(InfillResponse::from(&result))
}

/// Print usage information.
pub fn print_usage() {
    eprintln!("layered-infill generate - Answer an infill request");
    eprintln!();
    eprintln!("USAGE:");
    eprintln!("    layered-infill generate <request.json|-> [OPTIONS]");
    eprintln!();
    eprintln!("OPTIONS:");
    eprintln!("    -o, --output <file>   Write the JSON response here (default: stdout)");
    eprintln!("    --pretty              Indent the JSON response");
}
