//! Cookie Jar CLI
//!
//! Inspects a cookie jar snapshot for an account and prepares withdrawal
//! calls for an external signer.

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use env_logger::Env;
use log::{debug, info};
use serde_json::json;
use std::path::PathBuf;
use std::str::FromStr;

use alloy_primitives::{Address, U256};
use cookie_jar_client::abi::{jar_functions, selector_hex};
use cookie_jar_client::config::JAR_ADDRESS_ENV;
use cookie_jar_client::view::{Panel, TabView};
use cookie_jar_client::{
    decode_revert, validate_note, ClientConfig, ConnectionState, MemoryChain, NoteBounds, View,
    WithdrawalController,
};

/// Cookie Jar - eligibility and withdrawal helper
#[derive(Parser, Debug)]
#[command(name = "cookie-jar")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show eligibility, cooldown and submit state for an account
    Status(AccountArgs),

    /// Validate a note and print the withdrawal call for signing
    Withdraw {
        #[command(flatten)]
        account: AccountArgs,

        /// Note attached to the withdrawal
        #[arg(short, long)]
        note: String,
    },

    /// Check a note against the length bounds
    ValidateNote {
        /// Note text
        note: String,
    },

    /// Translate revert data into the contract error message
    DecodeError {
        /// Hex encoded revert data
        data: String,
    },

    /// Print the jar function signatures and selectors
    Abi,
}

#[derive(Args, Debug)]
pub struct AccountArgs {
    /// Connected wallet address
    #[arg(short, long)]
    pub account: String,

    /// Token to claim with (NFT path)
    #[arg(short, long)]
    pub token: Option<u64>,

    /// Chain snapshot JSON (placed in artifacts/ by default)
    #[arg(short, long, default_value = "chain.json")]
    pub chain: PathBuf,

    /// Cookie jar address; defaults to the snapshot's jar
    #[arg(long, env = JAR_ADDRESS_ENV)]
    pub jar: Option<String>,

    /// Print JSON instead of text
    #[arg(long)]
    pub json: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    match cli.command {
        Commands::Status(ref args) => handle_status(args).await?,
        Commands::Withdraw {
            ref account,
            ref note,
        } => handle_withdraw(account, note)
            .await
            .context("Failed to prepare withdrawal")?,
        Commands::ValidateNote { note } => handle_validate_note(&note)?,
        Commands::DecodeError { data } => handle_decode_error(&data)?,
        Commands::Abi => display_abi(),
    }

    Ok(())
}

/// Setup logging based on verbosity level
fn setup_logging(verbose: bool) {
    let log_level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(log_level)).init();
}

/// Load the snapshot and connect a controller as `args.account`
fn connect(args: &AccountArgs) -> Result<(MemoryChain, ClientConfig, Address)> {
    let path = resolve_artifact_path(args.chain.clone());
    let json = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read chain snapshot {}", path.display()))?;
    let chain = MemoryChain::from_json(&json).context("Invalid chain snapshot")?;

    let config = match &args.jar {
        Some(jar) => ClientConfig::parse(jar).context("Invalid jar address")?,
        None => ClientConfig::new(chain.snapshot().jar),
    };
    let account = Address::from_str(args.account.trim()).context("Invalid account address")?;
    debug!("loaded {} for jar {}", path.display(), config.jar);

    Ok((chain, config, account))
}

async fn prepare<'a>(
    chain: &'a MemoryChain,
    config: &ClientConfig,
    account: Address,
    token: Option<u64>,
) -> Result<WithdrawalController<&'a MemoryChain>> {
    let mut controller = WithdrawalController::new(config, chain);
    controller
        .observe_account(ConnectionState::Connected(account))
        .await;
    if let Some(err) = controller.error() {
        bail!("Eligibility check failed: {err}");
    }
    if let Some(token) = token {
        controller
            .select_token(U256::from(token))
            .await
            .context("Token selection failed")?;
    }
    Ok(controller)
}

/// Handle the status command logic
async fn handle_status(args: &AccountArgs) -> Result<()> {
    let (chain, config, account) = connect(args)?;
    let controller = prepare(&chain, &config, account, args.token).await?;

    let View::Ready(panel) = View::of(&controller) else {
        bail!("Account {account} is not connected");
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&panel_json(&panel))?);
    } else {
        print_panel(account, &panel);
    }
    Ok(())
}

/// Handle the withdraw command logic
async fn handle_withdraw(args: &AccountArgs, note: &str) -> Result<()> {
    let (chain, config, account) = connect(args)?;
    let mut controller = prepare(&chain, &config, account, args.token).await?;

    controller.edit_note(note);
    let request = controller.begin_submit()?;
    info!(
        "prepared {} for {}",
        request.function_name(),
        request.from
    );

    let output = json!({
        "to": request.to.to_string(),
        "from": request.from.to_string(),
        "function": request.function_name(),
        "args": request.call.args(),
        "data": format!("0x{}", hex::encode(request.calldata())),
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

/// Handle the validate-note command logic
fn handle_validate_note(note: &str) -> Result<()> {
    let validation = validate_note(note, NoteBounds::default());
    match validation.error {
        None => {
            println!("Note is valid ({} characters)", note.chars().count());
            Ok(())
        }
        Some(err) => bail!("{err}"),
    }
}

/// Handle the decode-error command logic
fn handle_decode_error(data: &str) -> Result<()> {
    let bytes = hex::decode(data.trim().trim_start_matches("0x")).context("Invalid hex data")?;
    match decode_revert(&bytes) {
        Some(code) => println!("{}: {}", code.code(), code.message()),
        None => println!("Unknown revert data"),
    }
    Ok(())
}

fn display_abi() {
    for (signature, selector) in jar_functions() {
        println!("{}  {signature}", selector_hex(selector));
    }
}

fn print_panel(account: Address, panel: &Panel) {
    println!("The Cookie Jar");
    println!("  {}", panel.headline);
    println!("  account:    {account}");
    println!("  whitelist:  {}", tab_status(&panel.whitelist));
    println!("  nft:        {}", tab_status(&panel.nft));
    if !panel.tokens.is_empty() {
        let tokens: Vec<String> = panel.tokens.iter().map(|id| format!("#{id}")).collect();
        println!("  tokens:     {}", tokens.join(", "));
    }
    if let Some(selected) = panel.selected {
        println!("  selected:   #{selected}");
    }
    if let Some(remaining) = &panel.time_remaining {
        println!("  next claim: {remaining}");
    }
    if let Some(error) = &panel.error {
        println!("  error:      {error}");
    }
    println!(
        "  submit:     {} ({})",
        panel.submit_label,
        if panel.submit_enabled { "enabled" } else { "disabled" }
    );
}

fn tab_status(tab: &TabView) -> String {
    match &tab.advisory {
        None => "eligible".to_string(),
        Some(reason) => format!("not eligible - {reason}"),
    }
}

fn panel_json(panel: &Panel) -> serde_json::Value {
    json!({
        "headline": panel.headline,
        "error": panel.error,
        "whitelist": {
            "enabled": panel.whitelist.enabled,
            "advisory": panel.whitelist.advisory.map(|r| r.to_string()),
        },
        "nft": {
            "enabled": panel.nft.enabled,
            "advisory": panel.nft.advisory.map(|r| r.to_string()),
        },
        "tokens": panel.tokens.iter().map(|id| id.to_string()).collect::<Vec<_>>(),
        "selected": panel.selected.map(|id| id.to_string()),
        "time_remaining": panel.time_remaining,
        "submit_label": panel.submit_label,
        "submit_enabled": panel.submit_enabled,
    })
}

/// Resolves a path to the artifacts/ directory if it's a simple filename
fn resolve_artifact_path(path: PathBuf) -> PathBuf {
    if path
        .parent()
        .map(|p| p.as_os_str().is_empty())
        .unwrap_or(true)
    {
        PathBuf::from("artifacts").join(path)
    } else {
        path
    }
}
