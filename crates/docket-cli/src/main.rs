//! `docket` — query the record aggregation layer from the command line.
//!
//! Reads `docket.toml` (or the path given with `--config`), overridden by
//! `DOCKET__*` environment variables, registers one connector per configured
//! backend and prints the result as JSON.
//!
//! # Usage
//!
//! ```
//! docket --bsn 999990019 list
//! docket --kvk 69599084 get zaken/5b0a0c4e-8b41-4c66-a5ad-3ec0b1f06a11
//! docket --bsn 999990019 download submissions/s123 a.pdf
//! ```

mod settings;

use std::path::PathBuf;

use anyhow::{Context as _, bail};
use clap::{Args, Parser, Subcommand};
use docket_core::{
  Identity,
  format::{format_list, format_single},
};
use serde::Serialize;
use settings::Settings;
use tracing::{level_filters::LevelFilter, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Docket record aggregation")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "docket.toml")]
  config: PathBuf,

  #[command(flatten)]
  party: Party,

  /// Display name of the party.
  #[arg(long, default_value = "")]
  name: String,

  /// Delegated token forwarded to backends that accept one.
  #[arg(long, env = "DOCKET_DELEGATED_TOKEN")]
  token: Option<String>,

  #[command(subcommand)]
  command: Command,
}

/// The authenticated party to act as.
#[derive(Args)]
#[group(required = true, multiple = false)]
struct Party {
  /// Citizen service number of a person.
  #[arg(long)]
  bsn: Option<String>,

  /// Chamber of commerce number of an organisation.
  #[arg(long)]
  kvk: Option<String>,
}

#[derive(Subcommand)]
enum Command {
  /// All records of the party, split into open and closed.
  List,
  /// One record by its internal id (`<connector>/<id>`).
  Get { id: String },
  /// A download location for one file of a record.
  Download { id: String, file: String },
}

impl Cli {
  fn identity(&self) -> anyhow::Result<Identity> {
    let identity = match (&self.party.bsn, &self.party.kvk) {
      (Some(bsn), None) => Identity::person(bsn, &self.name),
      (None, Some(kvk)) => Identity::organisation(kvk, &self.name),
      _ => bail!("exactly one of --bsn or --kvk is required"),
    };
    Ok(match &self.token {
      Some(token) => identity.with_delegated_token(token),
      None => identity,
    })
  }
}

/// Split an internal id into connector id and native id.
fn split_id(id: &str) -> anyhow::Result<(&str, &str)> {
  id.split_once('/')
    .filter(|(connector, native)| !connector.is_empty() && !native.is_empty())
    .with_context(|| format!("malformed record id {id:?}, expected <connector>/<id>"))
}

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
  let json = serde_json::to_string_pretty(value).context("serialising output")?;
  println!("{json}");
  Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_writer(std::io::stderr)
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  let settings: Settings = config::Config::builder()
    .add_source(config::File::from(cli.config.as_path()).required(false))
    .add_source(
      config::Environment::with_prefix("DOCKET")
        .separator("__")
        .try_parsing(true),
    )
    .build()
    .context("failed to read config file")?
    .try_deserialize()
    .context("failed to deserialise Settings")?;

  let aggregator = settings.aggregator()?;
  if aggregator.connector_ids().next().is_none() {
    warn!("no backends configured");
  }
  let identity = cli.identity()?;

  match cli.command {
    Command::List => {
      let listing = aggregator.list_detailed(&identity).await;
      if listing.is_degraded() {
        let failed: Vec<_> =
          listing.failures.iter().map(|f| f.connector_id.as_str()).collect();
        warn!(?failed, "listing is incomplete");
      }
      print_json(&format_list(&listing.records))
    }
    Command::Get { id } => {
      let (connector, native) = split_id(&id)?;
      let Some(record) = aggregator.get(connector, native, &identity).await? else {
        bail!("record {id} not found");
      };
      print_json(&format_single(&record))
    }
    Command::Download { id, file } => {
      let (connector, native) = split_id(&id)?;
      let Some(reference) =
        aggregator.download(connector, native, &file, &identity).await?
      else {
        bail!("file {file} of record {id} not found");
      };
      print_json(&reference)
    }
  }
}
