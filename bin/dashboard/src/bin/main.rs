//! Command-line token dashboard.
//!
//! Each subcommand drives one view against the configured token:
//! - `home`, `connect`, `switch-wallet`, `balance`: the Home view
//! - `transfer`, `mint`, `approve`, `transfer-from`, `burn`: submit a form
//! - `allowance`: the allowance lookup of the Approve view
//! - `watch`: keep Home on screen and refresh it on every notification

use clap::{Parser, Subcommand};
use client::{ChainClient, RpcWallet, Wallet};
use dashboard::{
    config::Config,
    describe_outcome,
    metrics::{install_prometheus_exporter, Metrics},
};
use events::EventBus;
use eyre::eyre;
use std::{net::SocketAddr, path::PathBuf, sync::Arc};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use view::{input, Approve, Burn, Home, Mint, Transfer, TransferFrom};

#[derive(Parser)]
#[command(name = "dashboard")]
#[command(about = "Inspect and operate a deployed ERC20 token")]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "dashboard.toml")]
    config: PathBuf,

    /// Wallet JSON-RPC endpoint
    #[arg(long, env = "WALLET_URL")]
    wallet_url: Option<String>,

    /// Public RPC endpoint
    #[arg(long, env = "RPC_URL")]
    rpc_url: Option<String>,

    /// Token contract address
    #[arg(long, env = "TOKEN_ADDRESS")]
    token: Option<String>,

    /// Log as JSON
    #[arg(long)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show token metadata, the connected account and its balance
    Home,

    /// Connect the wallet
    Connect,

    /// Pick another wallet account
    SwitchWallet,

    /// Transfer tokens from the connected account
    Transfer {
        #[arg(long)]
        to: String,
        #[arg(long)]
        amount: String,
    },

    /// Mint tokens (owner only)
    Mint {
        #[arg(long)]
        to: String,
        #[arg(long)]
        amount: String,
    },

    /// Approve a spender
    Approve {
        #[arg(long)]
        spender: String,
        #[arg(long)]
        amount: String,
    },

    /// Look up an allowance
    Allowance {
        #[arg(long)]
        owner: String,
        #[arg(long)]
        spender: String,
    },

    /// Transfer tokens on behalf of another account
    TransferFrom {
        #[arg(long)]
        from: String,
        #[arg(long)]
        to: String,
        #[arg(long)]
        amount: String,
    },

    /// Burn tokens from the connected account
    Burn {
        #[arg(long)]
        amount: String,
    },

    /// Look up any holder's balance
    Balance {
        #[arg(long)]
        holder: String,
    },

    /// Keep the home view up to date until interrupted
    Watch {
        /// Serve Prometheus metrics on this address
        #[arg(long)]
        metrics_addr: Option<SocketAddr>,
    },
}

fn init_tracing(json: bool) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> eyre::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    let mut config = Config::load(&cli.config)?;
    if let Some(url) = cli.wallet_url {
        config.wallet_url = Some(url);
    }
    if let Some(url) = cli.rpc_url {
        config.rpc_url = url;
    }
    if let Some(token) = cli.token {
        config.token_address =
            input::parse_address(&token).ok_or_else(|| eyre!("Invalid token address: {token}"))?;
    }

    let network = config.network_config()?;

    info!("Loaded config:");
    info!("  Network: {} ({})", network.chain_name, network.chain_id);
    info!("  RPC URL: {}", network.rpc_url);
    info!("  Token: {}", network.token);
    match &config.wallet_url {
        Some(url) => info!("  Wallet: {url}"),
        None => info!("  Wallet: none"),
    }

    let factory = client::create_token_factory(
        network.token,
        &network.rpc_url,
        config.wallet_url.as_deref(),
    )
    .await?;
    let wallet = config.wallet_url.as_deref().map(RpcWallet::new);
    let chain = ChainClient::new(network, wallet.clone(), factory, EventBus::new());
    let metrics = Metrics::new();

    match cli.command {
        Command::Home => {
            let mut home = Home::new(Arc::clone(&chain));
            home.mount().await;
            print!("{home}");
        }
        Command::Connect => {
            let mut home = Home::new(Arc::clone(&chain));
            let account = home.connect().await?;
            println!("Connected {account}");
        }
        Command::SwitchWallet => {
            let mut home = Home::new(Arc::clone(&chain));
            let account = home.switch_wallet().await?;
            println!("Switched to {account}");
        }
        Command::Transfer { to, amount } => {
            let mut form = Transfer::new(Arc::clone(&chain)).with_input(to, amount);
            let outcome = dashboard::submit(&mut form, &metrics).await?;
            println!("{}", describe_outcome(&outcome));
        }
        Command::Mint { to, amount } => {
            let mut form = Mint::new(Arc::clone(&chain)).with_input(to, amount);
            let outcome = dashboard::submit(&mut form, &metrics).await?;
            println!("{}", describe_outcome(&outcome));
        }
        Command::Approve { spender, amount } => {
            let mut form = Approve::new(Arc::clone(&chain)).with_input(spender, amount);
            let outcome = dashboard::submit(&mut form, &metrics).await?;
            println!("{}", describe_outcome(&outcome));
        }
        Command::Allowance { owner, spender } => {
            let mut form = Approve::new(Arc::clone(&chain)).with_lookup(owner, spender);
            let allowance = form.check_allowance().await?;
            println!("Allowance: {allowance}");
        }
        Command::TransferFrom { from, to, amount } => {
            let mut form = TransferFrom::new(Arc::clone(&chain)).with_input(from, to, amount);
            let outcome = dashboard::submit(&mut form, &metrics).await?;
            println!("{}", describe_outcome(&outcome));
        }
        Command::Burn { amount } => {
            let mut form = Burn::new(Arc::clone(&chain)).with_input(amount);
            let outcome = dashboard::submit(&mut form, &metrics).await?;
            println!("{}", describe_outcome(&outcome));
        }
        Command::Balance { holder } => {
            let balance = dashboard::balance(&chain, &holder).await?;
            println!("Balance of {holder}: {balance}");
        }
        Command::Watch { metrics_addr } => {
            if let Some(addr) = metrics_addr {
                install_prometheus_exporter(addr)?;
                info!(%addr, "Serving metrics");
            }

            let _watcher = wallet.as_ref().map(|wallet| {
                dashboard::record_wallet_events(wallet.subscribe(), metrics.clone());
                wallet.watch(config.poll_interval())
            });

            let mut home = Home::new(Arc::clone(&chain));
            let shutdown = async {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    warn!(error = %e, "Could not listen for Ctrl-C");
                    std::future::pending::<()>().await;
                }
            };

            dashboard::watch(
                &mut home,
                chain.resets(),
                &metrics,
                |home| println!("{home}"),
                shutdown,
            )
            .await;
        }
    }

    Ok(())
}
