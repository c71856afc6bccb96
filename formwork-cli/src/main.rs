//! formwork: apply a schema manifest to a JSON document.
//!
//! Usage:
//!   formwork --manifest schemas.toml --schema app.Person --input person.json \
//!       --set address.city=Berlin --set age=42
//!
//! Reads the document from stdin when `--input` is omitted.

use anyhow::{Context, Result};
use clap::Parser;
use formwork_cli::{OutputMode, apply, load_manifest, parse_assignment, render, select_schema};
use std::io::Read;
use std::path::PathBuf;
use std::{fs, io};
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "formwork")]
#[command(about = "Coerce JSON documents through declarative entity schemas")]
struct Args {
    /// Schema manifest (.toml, or .json)
    #[arg(short, long)]
    manifest: PathBuf,

    /// Name of the schema to read the document as
    #[arg(short, long)]
    schema: String,

    /// JSON document to read (defaults to stdin)
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Dotted-path assignment applied after reading, e.g. child.pos.top=10
    #[arg(long = "set", value_name = "PATH=VALUE")]
    assignments: Vec<String>,

    /// Output form
    #[arg(short, long, value_enum, default_value_t = OutputMode::Json)]
    output: OutputMode,

    /// Pretty-print the output
    #[arg(short, long)]
    pretty: bool,

    /// Enable verbose debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let log_level = if args.verbose { Level::DEBUG } else { Level::INFO };
    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_writer(io::stderr)
        .compact()
        .init();

    let manifest = load_manifest(&args.manifest)?;
    let schema = select_schema(&manifest, &args.schema)?;
    info!("Reading document as {}", schema.name());

    let document = match &args.input {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("Failed to read input {}", path.display()))?,
        None => {
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .context("Failed to read stdin")?;
            buffer
        }
    };

    let assignments = args
        .assignments
        .iter()
        .map(String::as_str)
        .map(parse_assignment)
        .collect::<Result<Vec<_>>>()?;

    let entity = apply(&schema, &document, &assignments)?;
    println!("{}", render(&entity, args.output, args.pretty)?);
    Ok(())
}
