use clap::Parser;
use miette::{IntoDiagnostic, Result};
use rust_decimal::Decimal;
use std::fs::File;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use upi_ledger::application::engine::{LedgerConfig, TransferEngine};
use upi_ledger::domain::account::NewAccount;
use upi_ledger::domain::ports::LedgerStoreRef;
use upi_ledger::error::LedgerError;
use upi_ledger::infrastructure::in_memory::InMemoryLedger;
#[cfg(feature = "storage-rocksdb")]
use upi_ledger::infrastructure::rocksdb::RocksDbLedger;
use upi_ledger::interfaces::csv::balance_writer::BalanceWriter;
use upi_ledger::interfaces::csv::command_reader::{Command, CommandKind, CommandReader};
use upi_ledger::interfaces::csv::history_writer::HistoryWriter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Input ledger commands CSV file
    input: PathBuf,

    /// Path to persistent database (optional). If provided, uses RocksDB.
    #[cfg(feature = "storage-rocksdb")]
    #[arg(long)]
    db_path: Option<PathBuf>,

    /// Balance granted to accounts signed up without an opening balance
    #[arg(long)]
    starting_grant: Option<Decimal>,

    /// Print the transaction history of this payment id instead of the
    /// balance report
    #[arg(long)]
    history: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let store = build_store(&cli)?;
    let mut config = LedgerConfig::default();
    if let Some(grant) = cli.starting_grant {
        config.starting_grant = grant;
    }
    let engine = TransferEngine::new(store, config);

    // Process commands
    let file = File::open(&cli.input).into_diagnostic()?;
    let reader = CommandReader::new(file);
    for command in reader.commands() {
        match command {
            Ok(command) => {
                if let Err(e) = apply(&engine, command).await {
                    eprintln!("Error processing command: {e}");
                }
            }
            Err(e) => {
                eprintln!("Error reading command: {e}");
            }
        }
    }

    // Output final state
    let stdout = io::stdout();
    if let Some(payment_id) = &cli.history {
        let history = engine.get_history(payment_id).await.into_diagnostic()?;
        let mut writer = HistoryWriter::new(stdout.lock());
        writer.write_transactions(&history).into_diagnostic()?;
    } else {
        let accounts = engine.accounts().await.into_diagnostic()?;
        let mut writer = BalanceWriter::new(stdout.lock());
        writer.write_accounts(accounts).into_diagnostic()?;
    }

    Ok(())
}

async fn apply(engine: &TransferEngine, command: Command) -> upi_ledger::error::Result<()> {
    match command.op {
        CommandKind::Signup => {
            engine
                .create_account(NewAccount {
                    payment_id: command.account,
                    display_name: command.name.unwrap_or_default(),
                    credential_hash: command.credential.unwrap_or_default(),
                    opening_balance: command.amount,
                })
                .await?;
        }
        CommandKind::Transfer => {
            let receiver = command
                .counterparty
                .ok_or(LedgerError::MissingField("counterparty"))?;
            let amount = command.amount.ok_or(LedgerError::MissingField("amount"))?;
            engine.transfer(&command.account, &receiver, amount).await?;
        }
    }
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    // Logs go to stderr; stdout carries the report.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}

#[cfg(feature = "storage-rocksdb")]
fn build_store(cli: &Cli) -> Result<LedgerStoreRef> {
    if let Some(db_path) = &cli.db_path {
        let store = RocksDbLedger::open(db_path).into_diagnostic()?;
        return Ok(Arc::new(store));
    }
    Ok(Arc::new(InMemoryLedger::new()))
}

#[cfg(not(feature = "storage-rocksdb"))]
fn build_store(_cli: &Cli) -> Result<LedgerStoreRef> {
    Ok(Arc::new(InMemoryLedger::new()))
}
