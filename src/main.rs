//! ledger-cli: command line front end for the ledger API client.
//!
//! ```text
//! ledger-cli [--config ledger.toml] [--url https://api...] <command>
//!
//!   root                          network details from "/"
//!   get <path> [--query JSON]     GET, optionally signed or raw
//!   follow <path> <link>          GET, then follow a named response link
//!   build-tx <ops.json>           print a signed envelope
//!   submit <envelope>             post an envelope
//!   post-ops <ops.json>           build, sign and post
//! ```
//!
//! The wallet key is read from the environment variable named by
//! `wallet.private_key_env` (default `LEDGER_WALLET_PRIVATE_KEY`).

use clap::{Parser, Subcommand};
use serde_json::Value;
use std::path::{Path, PathBuf};

use ledger_api::api::{ApiCaller, ApiResponse, SubmissionParams};
use ledger_api::config::{load_config, ClientConfig};
use ledger_api::ledger::Operation;
use ledger_api::observability::logging::init_logging;

#[derive(Parser)]
#[command(name = "ledger-cli")]
#[command(about = "Query the ledger API and submit transactions", long_about = None)]
struct Cli {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Overrides api.base_url
    #[arg(short, long)]
    url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show network details from the root document
    Root,
    /// GET a resource
    Get {
        path: String,
        /// Query object as JSON, e.g. '{"filter":{"type":"a"}}'
        #[arg(long)]
        query: Option<String>,
        #[arg(long)]
        sign: bool,
        #[arg(long)]
        raw: bool,
    },
    /// GET a resource, then follow one of its links
    Follow {
        path: String,
        link: String,
        #[arg(long)]
        sign: bool,
    },
    /// Build and sign a transaction from a JSON array of operations
    BuildTx { ops: PathBuf },
    /// Post a transaction envelope
    Submit {
        envelope: String,
        #[arg(long)]
        endpoint: Option<String>,
        #[arg(long)]
        no_wait: bool,
        #[arg(long)]
        json_api: bool,
        #[arg(long)]
        sign_request: bool,
    },
    /// Build, sign and post a transaction from a JSON array of operations
    PostOps { ops: PathBuf },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ClientConfig::default(),
    };
    if let Some(url) = cli.url {
        config.api.base_url = url;
    }

    init_logging(&config.observability.log_level);
    tracing::debug!(base_url = %config.api.base_url, "ledger-cli starting");

    let mut caller = ApiCaller::from_config(&config)?;

    match cli.command {
        Commands::Root => {
            let details = caller.discover_network().await?;
            println!("{}", serde_json::to_string_pretty(details)?);
        }
        Commands::Get { path, query, sign, raw } => {
            let query = query.map(|q| serde_json::from_str::<Value>(&q)).transpose()?;
            let response = match (sign, raw) {
                (_, true) => caller.get_raw(&path, query).await?,
                (true, false) => caller.get_with_signature(&path, query).await?,
                (false, false) => caller.get(&path, query).await?,
            };
            print_response(&response)?;
        }
        Commands::Follow { path, link, sign } => {
            let response = if sign {
                caller.get_with_signature(&path, None).await?
            } else {
                caller.get(&path, None).await?
            };
            let followed = response.fetch_link(&link).await?;
            print_response(&followed)?;
        }
        Commands::BuildTx { ops } => {
            let operations = read_operations(&ops)?;
            ensure_network(&mut caller).await?;
            println!("{}", caller.get_transaction(operations)?);
        }
        Commands::Submit {
            envelope,
            endpoint,
            no_wait,
            json_api,
            sign_request,
        } => {
            let params = SubmissionParams {
                endpoint: endpoint.unwrap_or_else(|| config.submission.endpoint.clone()),
                wait_for_ingest: config.submission.wait_for_ingest && !no_wait,
                need_sign_request: config.submission.sign_request || sign_request,
                json_api: config.submission.json_api || json_api,
            };
            let response = caller.post_tx_envelope(&envelope, &params).await?;
            print_response(&response)?;
        }
        Commands::PostOps { ops } => {
            let operations = read_operations(&ops)?;
            ensure_network(&mut caller).await?;
            let params = SubmissionParams {
                endpoint: config.submission.endpoint.clone(),
                wait_for_ingest: config.submission.wait_for_ingest,
                need_sign_request: config.submission.sign_request,
                json_api: config.submission.json_api,
            };
            let envelope = caller.get_transaction(operations)?;
            let response = caller.post_tx_envelope(&envelope, &params).await?;
            print_response(&response)?;
        }
    }

    Ok(())
}

async fn ensure_network(caller: &mut ApiCaller) -> Result<(), Box<dyn std::error::Error>> {
    if caller.network().is_none() {
        caller.discover_network().await?;
    }
    Ok(())
}

fn read_operations(path: &Path) -> Result<Vec<Operation>, Box<dyn std::error::Error>> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

fn print_response(response: &ApiResponse) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(response.data())?);
    if !response.meta().is_null() {
        eprintln!("meta: {}", response.meta());
    }
    for (name, link) in response.links() {
        eprintln!("link {}: {}", name, link.href());
    }
    Ok(())
}
