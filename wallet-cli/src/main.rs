//! wallet - CLI Wallet Protocol front end
//!
//! # Usage
//!
//! ```bash
//! # Discover providers on PATH
//! wallet list
//!
//! # Run an operation; the payload is read from stdin
//! echo '{"account":"0xabc","message":"hello"}' | wallet sign-message --wallet fiet
//!
//! # Sessions
//! wallet session grant < grant.json
//! wallet session show <id>
//! wallet session revoke <id>
//! ```

use anyhow::Context;
use clap::{Parser, Subcommand};
use cwp::cli::commands::{self, operation::OperationArgs, session::SessionCommand};
use cwp::cli::{CliContext, OutputFormat, OutputFormatter};
use cwp::Operation;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "wallet")]
#[command(version)]
#[command(about = "Discover and drive wallet-<name> providers over the CLI Wallet Protocol", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Configuration directory (config.json, sessions/)
    #[arg(long, global = true, value_name = "DIR", env = "WALLET_CONFIG_DIR")]
    config_dir: Option<PathBuf>,

    /// Output format (json, table)
    #[arg(short, long, global = true, default_value = "json", visible_alias = "output")]
    output_format: String,

    /// Suppress status messages
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Discover wallet providers on PATH
    List,

    /// List accounts exposed by a provider
    Accounts(OperationArgs),

    /// Sign a plaintext message ({account, message} on stdin)
    SignMessage(OperationArgs),

    /// Sign EIP-712 typed data ({account, typedData} on stdin)
    SignTypedData(OperationArgs),

    /// Sign a transaction without broadcasting it
    SignTransaction(OperationArgs),

    /// Sign and broadcast a transaction
    SendTransaction(OperationArgs),

    /// Session management
    Session {
        #[command(subcommand)]
        command: SessionCommand,
    },
}

fn init_tracing(verbose: bool) -> anyhow::Result<()> {
    let mut filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    if verbose {
        filter = filter.add_directive("cwp=debug".parse().context("invalid log directive")?);
    }
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!(e))
        .context("failed to install tracing subscriber")
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = init_tracing(cli.verbose) {
        eprintln!("Warning: {:#}", e);
    }

    let output_format: OutputFormat = cli.output_format.parse().unwrap_or_else(|e| {
        eprintln!("Warning: {}. Using json format.", e);
        OutputFormat::Json
    });

    let mut ctx = match cli.config_dir {
        Some(dir) => CliContext::new(dir),
        None => CliContext::with_defaults(),
    };
    ctx.output_format = output_format;
    ctx.quiet = cli.quiet;
    ctx.verbose = cli.verbose;

    let result = match cli.command {
        Commands::List => commands::list::execute(&ctx).await,
        Commands::Accounts(args) => {
            commands::operation::execute(&ctx, Operation::Accounts, args).await
        }
        Commands::SignMessage(args) => {
            commands::operation::execute(&ctx, Operation::SignMessage, args).await
        }
        Commands::SignTypedData(args) => {
            commands::operation::execute(&ctx, Operation::SignTypedData, args).await
        }
        Commands::SignTransaction(args) => {
            commands::operation::execute(&ctx, Operation::SignTransaction, args).await
        }
        Commands::SendTransaction(args) => {
            commands::operation::execute(&ctx, Operation::SendTransaction, args).await
        }
        Commands::Session { command } => commands::session::execute(&ctx, command).await,
    };

    if let Err(e) = result {
        OutputFormatter::new(ctx.output_format).error(&e);
        std::process::exit(e.exit_code());
    }
}
