use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{anyhow, Result};
use clap::{ArgAction, Args, Parser, Subcommand};
use simple_docs_config::{Config, LoadOptions};
use simple_docs_core::{DocsError, DocsResult, SimpleDocs, Variables};
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Entry point for CLI execution. Returns the desired exit code.
pub fn run() -> Result<i32> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut options = LoadOptions::default();
    if let Some(base) = &cli.base {
        options = options.with_base_dir(base);
    }
    if let Some(config) = &cli.config {
        options = options.with_override_path(config);
    }
    let config = match Config::load(options) {
        Ok(config) => config,
        Err(err) => return Ok(report(&DocsError::from(err), None, None)),
    };
    debug!(base = %config.base_dir.display(), "Configuration loaded");

    let mut docs = match SimpleDocs::from_config(&config) {
        Ok(docs) => docs,
        Err(err) => return Ok(report(&err, None, None)),
    };

    let requested = cli.command.requested_name().map(str::to_owned);
    let outcome = match cli.command {
        Command::Find(args) => handle_find(&docs, args),
        Command::Attributes(args) => handle_attributes(&docs, args),
        Command::Manifest(args) => handle_manifest(&mut docs, args),
    };

    match outcome {
        Ok(()) => Ok(0),
        Err(err) => match err.downcast_ref::<DocsError>() {
            Some(docs_err) => Ok(report(docs_err, Some(&docs), requested.as_deref())),
            None => Err(err),
        },
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}

fn handle_find(docs: &SimpleDocs, args: FindArgs) -> Result<()> {
    let FindArgs { name, vars, json } = args;
    let variables = parse_variables(&vars)?;
    let document = docs.find(&name)?;

    if json {
        let view = document.to_view(&variables)?;
        emit(&serde_json::to_string_pretty(&view)?)
    } else {
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        document.render_to(&variables, &mut handle)?;
        handle.flush()?;
        Ok(())
    }
}

fn handle_attributes(docs: &SimpleDocs, args: AttributesArgs) -> Result<()> {
    let document = docs.find(&args.name)?;
    emit(&serde_json::to_string_pretty(document.attributes())?)
}

fn handle_manifest(docs: &mut SimpleDocs, args: ManifestArgs) -> Result<()> {
    let ManifestArgs { rebuild, cached } = args;

    let manifest = if rebuild {
        docs.rebuild_manifest()?
    } else {
        docs.enable_manifest(true, !cached)?;
        docs.manifest()?
            .ok_or_else(|| anyhow!("manifest {} was not written", docs.manifest_path().display()))?
    };

    emit(&serde_json::to_string_pretty(&manifest)?)
}

fn parse_variables(pairs: &[String]) -> DocsResult<Variables> {
    let invalid = |input: &str, reason| DocsError::InvalidVariable {
        input: input.to_owned(),
        reason,
    };

    let mut variables = Variables::new();
    for pair in pairs {
        let (key, raw) = pair
            .split_once('=')
            .ok_or_else(|| invalid(pair.as_str(), "expected KEY=VALUE"))?;
        let key = key.trim();
        if key.is_empty() {
            return Err(invalid(pair.as_str(), "the name is empty"));
        }
        let value = serde_json::from_str(raw)
            .unwrap_or_else(|_| serde_json::Value::String(raw.to_owned()));
        variables.insert(key.to_owned(), value);
    }
    Ok(variables)
}

fn report(err: &DocsError, docs: Option<&SimpleDocs>, requested: Option<&str>) -> i32 {
    eprintln!("simple-docs error: {err}");

    if let (DocsError::FileNotFound { .. }, Some(docs), Some(requested)) = (err, docs, requested) {
        if let Some(hint) = suggestion(docs, requested) {
            eprintln!("Did you mean '{hint}'?");
        }
    }

    err.exit_code() as i32
}

fn suggestion(docs: &SimpleDocs, requested: &str) -> Option<String> {
    let manifest = docs.manifest().ok().flatten()?;
    manifest.suggest(requested).map(str::to_owned)
}

fn emit(content: &str) -> Result<()> {
    print!("{}", content);
    if !content.ends_with('\n') {
        println!();
    }
    Ok(())
}

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Resolve and render Markdown documentation by logical name",
    propagate_version = true
)]
struct Cli {
    /// Documentation base directory (defaults to the working directory)
    #[arg(long, global = true, value_name = "DIR")]
    base: Option<PathBuf>,
    /// Configuration file overriding `.simple-docs.toml`
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,
    /// Log resolution details to stderr
    #[arg(long, short, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Render a document by logical name
    Find(FindArgs),
    /// Print the attribute block of a document as JSON
    Attributes(AttributesArgs),
    /// Build (when needed) and print the manifest
    Manifest(ManifestArgs),
}

impl Command {
    fn requested_name(&self) -> Option<&str> {
        match self {
            Command::Find(args) => Some(&args.name),
            Command::Attributes(args) => Some(&args.name),
            Command::Manifest(_) => None,
        }
    }
}

#[derive(Args)]
struct FindArgs {
    /// Logical document name, e.g. `guide/intro`
    name: String,
    /// Template variable as KEY=VALUE; VALUE is parsed as JSON when possible
    #[arg(long = "var", value_name = "KEY=VALUE", action = ArgAction::Append)]
    vars: Vec<String>,
    /// Print title, sections, attributes and output as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct AttributesArgs {
    /// Logical document name
    name: String,
}

#[derive(Args)]
struct ManifestArgs {
    /// Rebuild even if an index already exists
    #[arg(long, conflicts_with = "cached")]
    rebuild: bool,
    /// Reuse an existing index instead of rebuilding it
    #[arg(long)]
    cached: bool,
}
