//! Barter escrow CLI
//!
//! Runs one escrow flow (initialize, exchange or cancel) against the configured
//! network, using the swap terms and key names from the config file.

use anyhow::{Context, Result};
use barter_escrow::{derive_authority, InstructionKind};
use barter_sdk::{ClientConfig, EscrowClient, FileKeyStore, KeyStore, RpcLedger, SwapTerms};
use clap::{Parser, Subcommand};
use solana_sdk::{pubkey::Pubkey, signature::Keypair, transaction::Transaction};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "barter")]
#[command(about = "Two-party barter escrow client")]
struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "barter.toml")]
    config: String,

    /// Override log level
    #[arg(long)]
    log_level: Option<String>,

    /// Validate and assemble, print the transaction, do not submit
    #[arg(long)]
    dry_run: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, Clone, Copy)]
enum Command {
    /// Open an escrow; the initiator's legs move into custody
    Initialize,
    /// Complete the swap as the counterparty
    Exchange,
    /// Cancel the swap and refund the initiator
    Cancel,
    /// Print the custody authority for the configured program
    Authority,
}

impl Command {
    fn kind(self) -> Option<InstructionKind> {
        match self {
            Command::Initialize => Some(InstructionKind::Initialize),
            Command::Exchange => Some(InstructionKind::Exchange),
            Command::Cancel => Some(InstructionKind::Cancel),
            Command::Authority => None,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = ClientConfig::load_or_default(&cli.config)?;
    if let Some(log_level) = cli.log_level {
        config.logging.level = log_level;
    }
    init_logging(&config)?;

    let store = FileKeyStore::new(&config.keys.dir);
    let program_id = store
        .load_public(&config.keys.program)
        .context("loading program id")?;
    info!("Program ID: {}", program_id);
    info!("RPC endpoint: {}", config.network.rpc_url);

    let Some(kind) = cli.command.kind() else {
        let (authority, bump) = derive_authority(&program_id);
        println!("{authority} (bump {bump})");
        return Ok(());
    };

    let terms = config
        .terms
        .resolve(&config.keys, &store)
        .context("resolving swap terms")?;
    let signers = load_signers(kind, &config, &store)?;
    let signer_refs: Vec<&Keypair> = signers.iter().collect();

    let ledger = RpcLedger::from_config(&config.network)?;
    let client = EscrowClient::new(ledger, program_id, config.network.submit_options()?);

    if cli.dry_run {
        let tx = client.prepare(kind, &terms, &signer_refs).await?;
        print!("{}", describe_transaction(&client.assembler().authority(), &terms, &tx));
        info!("Dry run mode - transaction not submitted");
        return Ok(());
    }

    let signature = client.execute(kind, &terms, &signer_refs).await?;
    info!("{:?} confirmed", kind);
    println!("{signature}");
    Ok(())
}

/// Keypairs each flow has to sign with
fn load_signers(
    kind: InstructionKind,
    config: &ClientConfig,
    store: &dyn KeyStore,
) -> Result<Vec<Keypair>> {
    let keys = &config.keys;
    let names: Vec<&str> = match kind {
        InstructionKind::Initialize => vec![keys.initiator.as_str(), keys.escrow.as_str()],
        InstructionKind::Exchange => vec![keys.counterparty.as_str()],
        InstructionKind::Cancel => vec![keys.initiator.as_str()],
    };
    names
        .into_iter()
        .map(|name| {
            store
                .load(name)
                .with_context(|| format!("loading signer {name}"))
        })
        .collect()
}

/// Dry-run listing: accounts in schema order, payload hex, signers
fn describe_transaction(authority: &Pubkey, terms: &SwapTerms, tx: &Transaction) -> String {
    let mut out = format!("escrow:    {}\nauthority: {authority}\n", terms.escrow);
    for ix in &tx.message.instructions {
        for (position, index) in ix.accounts.iter().enumerate() {
            if let Some(key) = tx.message.account_keys.get(*index as usize) {
                out.push_str(&format!("  [{position:2}] {key}\n"));
            }
        }
        let data: String = ix.data.iter().map(|b| format!("{b:02x}")).collect();
        out.push_str(&format!("  data: {data}\n"));
    }
    let signers = tx.message.header.num_required_signatures as usize;
    for key in tx.message.account_keys.iter().take(signers) {
        out.push_str(&format!("  signed by {key}\n"));
    }
    out
}

fn init_logging(config: &ClientConfig) -> Result<()> {
    let log_level = config
        .logging
        .level
        .parse()
        .unwrap_or(tracing::Level::INFO);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("barter={},barter_sdk={}", log_level, log_level).into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    Ok(())
}
