//! Carrot CLI
//!
//! Command-line interface for Carrot stealth addressing.

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use rand::rngs::OsRng;
use rand::RngCore;
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use carrot_core::traits::{EnoteLedger, ProgressCallback};
use carrot_core::types::{
    AddressIndex, AddressIndexExtended, DeriveType, Destination, EnoteRecord, EnoteVariant,
    KeyImage, MasterSecret, PaymentId,
};
use carrot_crypto::SecretScalar;
use carrot_keys::{AccountDevices, CarrotKeys, LegacyKeys, LegacySubaddressTable};
use carrot_registry::{FileLedger, MemoryLedger};
use carrot_scanner::{BatchScanner, ScanOutcome, ScanPosition, ScannerConfig};
use carrot_stealth::{
    make_carrot_enote, make_coinbase_enote, make_two_out_transaction_enotes, PaymentProposal,
    SelfSendProposal,
};

/// Carrot - stealth addressing for CryptoNote-style ledgers
#[derive(Parser)]
#[command(name = "carrot")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Secrets an account is unlocked from. Supplying both unlocks a hybrid account.
#[derive(Args)]
struct AccountArgs {
    /// Carrot master secret (hex)
    #[arg(long, env = "CARROT_MASTER_SECRET", hide_env_values = true)]
    master_secret: Option<String>,
    /// Legacy CryptoNote spend key (hex)
    #[arg(long, env = "CARROT_LEGACY_SPEND_KEY", hide_env_values = true)]
    legacy_spend_key: Option<String>,
}

impl AccountArgs {
    fn unlock(&self) -> Result<AccountDevices> {
        let carrot = match &self.master_secret {
            Some(hex) => {
                let master = MasterSecret::from_hex(hex.trim()).context("Invalid master secret")?;
                Some(CarrotKeys::from_master(&master)?)
            }
            None => None,
        };
        let legacy = match &self.legacy_spend_key {
            Some(hex) => {
                let spend_key =
                    SecretScalar::from_hex(hex.trim()).context("Invalid legacy spend key")?;
                Some(LegacyKeys::from_spend_key(spend_key)?)
            }
            None => None,
        };

        let devices = match (legacy, carrot) {
            (Some(legacy), Some(carrot)) => AccountDevices::hybrid(&legacy, &carrot)?,
            (None, Some(carrot)) => AccountDevices::from_carrot(&carrot)?,
            (Some(legacy), None) => AccountDevices::from_legacy(&legacy)?,
            (None, None) => bail!("Pass --master-secret or --legacy-spend-key"),
        };
        debug!(capabilities = ?devices.capabilities(), "Account unlocked");
        Ok(devices)
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum DeriveTypeArg {
    Auto,
    PreCarrot,
    Carrot,
}

impl From<DeriveTypeArg> for DeriveType {
    fn from(arg: DeriveTypeArg) -> Self {
        match arg {
            DeriveTypeArg::Auto => DeriveType::Auto,
            DeriveTypeArg::PreCarrot => DeriveType::PreCarrot,
            DeriveTypeArg::Carrot => DeriveType::Carrot,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a new Carrot account
    Generate {
        /// Output file for the account (JSON)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Derive a receiving address
    Address {
        #[command(flatten)]
        account: AccountArgs,
        /// Account (major) index
        #[arg(long, default_value = "0")]
        major: u32,
        /// Subaddress (minor) index
        #[arg(long, default_value = "0")]
        minor: u32,
        /// Key hierarchy to derive from
        #[arg(long, value_enum, default_value = "auto")]
        derive_type: DeriveTypeArg,
        /// Payment id for an integrated address (hex, main address only)
        #[arg(long)]
        payment_id: Option<String>,
    },

    /// Pay a destination and publish the enote to a ledger file
    Send {
        /// Destination JSON, or @path to a file containing it
        destination: String,
        /// Amount in atomic units
        #[arg(short, long)]
        amount: u64,
        /// Ledger file
        #[arg(short, long)]
        ledger: PathBuf,
        /// Block the enote is published in
        #[arg(long, default_value = "0")]
        block: u64,
        /// Build a coinbase enote instead of a transaction output
        #[arg(long, conflicts_with = "change")]
        coinbase: bool,
        /// Also return this much change to the sending account
        #[arg(long)]
        change: Option<u64>,
        #[command(flatten)]
        account: AccountArgs,
    },

    /// Scan a ledger file for owned enotes
    Scan {
        #[command(flatten)]
        account: AccountArgs,
        /// Ledger file
        #[arg(short, long)]
        ledger: PathBuf,
        /// Resumable scan position file
        #[arg(long)]
        position: Option<PathBuf>,
        /// Write opening hints of discoveries to this file (JSON)
        #[arg(long)]
        hints: Option<PathBuf>,
        /// Lowest block to scan
        #[arg(long)]
        from_block: Option<u64>,
        /// Highest block to scan
        #[arg(long)]
        to_block: Option<u64>,
        /// Legacy subaddress accounts to precompute
        #[arg(long, default_value = "1")]
        legacy_majors: u32,
        /// Legacy subaddresses per account to precompute
        #[arg(long, default_value = "200")]
        legacy_minors: u32,
        /// Derive key images (needs spend authority)
        #[arg(long)]
        key_images: bool,
        /// Stop at the first owned enote
        #[arg(long)]
        stop_on_first: bool,
    },

    /// Run benchmarks
    Bench {
        /// Number of enotes to generate
        #[arg(short, long, default_value = "10000")]
        count: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        "carrot=debug,info"
    } else {
        "carrot=info,warn"
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    match cli.command {
        Commands::Generate { output } => cmd_generate(output),
        Commands::Address {
            account,
            major,
            minor,
            derive_type,
            payment_id,
        } => cmd_address(&account, AddressIndex::new(major, minor), derive_type.into(), payment_id),
        Commands::Send {
            destination,
            amount,
            ledger,
            block,
            coinbase,
            change,
            account,
        } => cmd_send(&destination, amount, &ledger, block, coinbase, change, &account).await,
        Commands::Scan {
            account,
            ledger,
            position,
            hints,
            from_block,
            to_block,
            legacy_majors,
            legacy_minors,
            key_images,
            stop_on_first,
        } => {
            let mut config = ScannerConfig::from_env()?;
            config.from_block = from_block;
            config.to_block = to_block;
            config.key_images = key_images;
            config.stop_on_first = stop_on_first;
            let paths = ScanPaths {
                ledger: &ledger,
                position: position.as_deref(),
                hints: hints.as_deref(),
            };
            cmd_scan(&account, paths, config, (legacy_majors, legacy_minors)).await
        }
        Commands::Bench { count } => cmd_bench(count).await,
    }
}

fn print_json(value: &impl serde::Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Generate a new account
fn cmd_generate(output: Option<PathBuf>) -> Result<()> {
    println!("{}", "🔑 Generating Carrot account...".cyan().bold());

    let mut bytes = [0u8; 32];
    OsRng.fill_bytes(&mut bytes);
    let master = MasterSecret::from_array(bytes);
    let devices = AccountDevices::from_master(&master)?;
    let main = devices
        .address()
        .make_destination(&AddressIndexExtended::new(AddressIndex::MAIN, DeriveType::Carrot))?;

    let account_json = serde_json::json!({
        "master_secret": master.to_hex(),
        "main_address": main,
    });

    if let Some(path) = output {
        std::fs::write(&path, serde_json::to_string_pretty(&account_json)?)?;
        println!("{} {}", "✅ Account saved to:".green(), path.display());
    } else {
        println!("\n{}", "Account (JSON):".yellow().bold());
        print_json(&account_json)?;
    }

    println!("\n{}", "⚠️  IMPORTANT: Keep your master secret safe!".red().bold());
    println!("   It controls every key of the account and must never be shared.");

    Ok(())
}

/// Derive a receiving address
fn cmd_address(
    account: &AccountArgs,
    index: AddressIndex,
    derive_type: DeriveType,
    payment_id: Option<String>,
) -> Result<()> {
    let devices = account.unlock()?;
    let extended = AddressIndexExtended::new(index, derive_type);
    let mut destination = devices
        .address()
        .make_destination(&extended)
        .context("Failed to derive address")?;

    if let Some(pid) = payment_id {
        let pid = PaymentId::from_hex(pid.trim()).context("Invalid payment id")?;
        destination = destination.integrated(pid)?;
    }

    let kind = if destination.is_subaddress {
        "subaddress"
    } else if destination.payment_id.is_null() {
        "main address"
    } else {
        "integrated address"
    };
    println!("{} {} {}", "📬".cyan(), kind.cyan().bold(), index);
    print_json(&destination)
}

fn parse_destination(arg: &str) -> Result<Destination> {
    let json = match arg.strip_prefix('@') {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read destination file {path}"))?,
        None => arg.to_string(),
    };
    let value: serde_json::Value = serde_json::from_str(&json).context("Invalid destination JSON")?;
    // Accept either a bare destination or a `generate` output
    let value = value.get("main_address").cloned().unwrap_or(value);
    let destination: Destination = serde_json::from_value(value).context("Invalid destination")?;
    destination.validate()?;
    Ok(destination)
}

/// Pay a destination
async fn cmd_send(
    destination: &str,
    amount: u64,
    ledger_path: &Path,
    block: u64,
    coinbase: bool,
    change: Option<u64>,
    account: &AccountArgs,
) -> Result<()> {
    let destination = parse_destination(destination)?;
    println!("{} {} to {}", "💸 Sending".cyan().bold(), amount, destination.spend_pubkey);

    let proposal = PaymentProposal::new(destination, amount);
    let mut enotes = Vec::new();
    if coinbase {
        enotes.push(EnoteVariant::CarrotCoinbase(make_coinbase_enote(&proposal, block)?));
    } else {
        let mut l0 = [0u8; 32];
        OsRng.fill_bytes(&mut l0);
        let tx_first_key_image = KeyImage::from_array(l0);

        match change {
            Some(change) => {
                let devices = account.unlock().context("Change needs the sending account")?;
                let (payment, self_send) = make_two_out_transaction_enotes(
                    &proposal,
                    &SelfSendProposal::change(change),
                    &tx_first_key_image,
                    &devices,
                )?;
                enotes.push(EnoteVariant::Carrot(payment.enote));
                enotes.push(EnoteVariant::Carrot(self_send.enote));
            }
            None => {
                let payment = make_carrot_enote(&proposal, &tx_first_key_image)?;
                enotes.push(EnoteVariant::Carrot(payment.enote));
            }
        }
    }

    let ledger = FileLedger::new(ledger_path)
        .await
        .context("Failed to open ledger file")?;
    for enote in enotes {
        let id = ledger.publish(EnoteRecord::new(block, enote)).await?;
        println!(
            "   {} #{} {} {}",
            "Published".green(),
            id,
            enote.kind().dimmed(),
            enote.onetime_address()
        );
    }
    ledger.save().await.context("Failed to save ledger")?;

    println!("\n{} {} enote(s) in ledger", "✅".green(), ledger.len());
    Ok(())
}

struct ScanPaths<'p> {
    ledger: &'p Path,
    position: Option<&'p Path>,
    hints: Option<&'p Path>,
}

fn progress_bar(template: &str) -> Result<ProgressBar> {
    let pb = ProgressBar::new(0);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(template)?
            .progress_chars("#>-"),
    );
    Ok(pb)
}

/// Scan a ledger for owned enotes
async fn cmd_scan(
    account: &AccountArgs,
    paths: ScanPaths<'_>,
    config: ScannerConfig,
    legacy_window: (u32, u32),
) -> Result<()> {
    println!("{}", "🔎 Scanning for enotes...".cyan().bold());

    let devices = account.unlock()?;
    let ledger = FileLedger::new(paths.ledger)
        .await
        .context("Failed to load ledger file")?;
    println!("   Loaded {} enote(s) from {}", ledger.len(), paths.ledger.display());

    if ledger.is_empty() {
        println!("\n{}", "⚠️  Ledger is empty. No enotes to scan.".yellow());
        return Ok(());
    }

    let position = match paths.position {
        Some(path) if path.exists() => {
            let json = std::fs::read_to_string(path).context("Failed to read position file")?;
            serde_json::from_str(&json).context("Invalid position file")?
        }
        _ => ScanPosition::new(),
    };

    let table = if devices.address().resolve_derive_type(DeriveType::PreCarrot).is_ok() {
        Some(LegacySubaddressTable::generate(
            devices.address(),
            legacy_window.0,
            legacy_window.1,
        )?)
    } else {
        None
    };

    let mut scanner = BatchScanner::new(&devices, config)?.with_position(position);
    if let Some(table) = &table {
        scanner = scanner.with_legacy_table(table);
    }

    let pb = progress_bar("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} ({eta})")?;
    let bar = pb.clone();
    let callback: ProgressCallback = Box::new(move |progress| {
        bar.set_length(progress.total);
        bar.set_position(progress.scanned);
    });

    let outcome = scanner.scan_ledger(&ledger, Some(&callback)).await?;
    pb.finish_and_clear();

    if let Some(path) = paths.position {
        std::fs::write(path, serde_json::to_string_pretty(&scanner.position())?)
            .context("Failed to save position file")?;
    }

    report_discoveries(&outcome);

    if let Some(path) = paths.hints {
        let hints = outcome
            .discoveries
            .iter()
            .map(|found| found.opening_hint())
            .collect::<carrot_core::Result<Vec<_>>>()?;
        std::fs::write(path, serde_json::to_string_pretty(&hints)?)
            .context("Failed to write hints file")?;
        println!("   {} {}", "Opening hints saved to:".dimmed(), path.display());
    }

    let summary = outcome.summary();
    println!(
        "\n   {} scanned, {} view tag matches, {} Janus rejections, {:.1}% filtered",
        summary.total_scanned,
        summary.view_tag_matches,
        summary.janus_rejections,
        summary.filter_efficiency
    );
    Ok(())
}

fn report_discoveries(outcome: &ScanOutcome) {
    if outcome.discoveries.is_empty() {
        println!("\n{}", "No enotes found.".yellow());
        return;
    }

    let total: u64 = outcome.discoveries.iter().map(|d| d.amount()).sum();
    println!(
        "\n{} {} enote(s) found, {} total:",
        "✅".green(),
        outcome.discoveries.len(),
        total
    );
    for found in &outcome.discoveries {
        let record = &found.record;
        println!(
            "   #{} {} {} at {} [{}] {:?}",
            found.record_id,
            "amount".green(),
            record.amount,
            record.address_index.index,
            record.address_index.derive_type,
            record.origin,
        );
        if !record.payment_id.is_null() {
            println!("      {} {}", "Payment id:".dimmed(), record.payment_id);
        }
        if let Some(key_image) = &found.key_image {
            println!("      {} {}", "Key image:".dimmed(), key_image);
        }
    }
    if outcome.stopped_early {
        println!("   {}", "(stopped at first discovery)".dimmed());
    }
}

/// Run benchmarks
async fn cmd_bench(count: usize) -> Result<()> {
    println!("{} {} enotes", "📊 Benchmarking with".cyan().bold(), count);

    println!("\n{}", "1. Unlocking accounts...".dimmed());
    let start = Instant::now();
    let mut seed = [0u8; 32];
    OsRng.fill_bytes(&mut seed);
    let ours = AccountDevices::from_master(&MasterSecret::from_array(seed))?;
    OsRng.fill_bytes(&mut seed);
    let theirs = AccountDevices::from_master(&MasterSecret::from_array(seed))?;
    println!("   ✓ Unlock: {:?}", start.elapsed());

    println!("\n{}", "2. Building enotes...".dimmed());
    let ledger = MemoryLedger::with_capacity(count);
    let ours_main = ours
        .address()
        .make_destination(&AddressIndexExtended::new(AddressIndex::new(0, 1), DeriveType::Auto))?;
    let theirs_main = theirs
        .address()
        .make_destination(&AddressIndexExtended::new(AddressIndex::MAIN, DeriveType::Auto))?;

    let pb = progress_bar("   [{bar:40.cyan/blue}] {pos}/{len}")?;
    pb.set_length(count as u64);
    let start = Instant::now();
    for i in 0..count {
        let destination = if i % 100 == 0 { ours_main } else { theirs_main };
        let mut l0 = [0u8; 32];
        l0[..8].copy_from_slice(&(i as u64).to_le_bytes());
        let out = make_carrot_enote(
            &PaymentProposal::new(destination, i as u64 + 1),
            &KeyImage::from_array(l0),
        )?;
        ledger
            .publish(EnoteRecord::new(i as u64, EnoteVariant::Carrot(out.enote)))
            .await?;
        pb.inc(1);
    }
    pb.finish();
    println!("   ✓ Built {} enotes: {:?}", count, start.elapsed());

    println!("\n{}", "3. Scanning...".dimmed());
    let config = ScannerConfig::from_env()?;
    let workers = config.workers;
    let scanner = BatchScanner::new(&ours, config)?;
    let start = Instant::now();
    let outcome = scanner.scan_ledger(&ledger, None).await?;
    let scan_time = start.elapsed();

    let summary = outcome.summary();
    println!("   ✓ Scanned {} enotes with {} workers: {:?}", count, workers, scan_time);
    println!("   ✓ Found {} enotes", outcome.discoveries.len());
    println!("\n{}", "📈 Results:".green().bold());
    println!("   Scan rate: {:.0} enotes/sec", count as f64 / scan_time.as_secs_f64());
    println!(
        "   Time per enote: {:.2}µs",
        scan_time.as_micros() as f64 / count.max(1) as f64
    );
    println!("   View tag filter: {:.2}% rejected", summary.filter_efficiency);

    let expected = count.div_ceil(100);
    if outcome.discoveries.len() == expected {
        println!("   {} All expected enotes found!", "✅".green());
    } else {
        println!(
            "   {} Expected {}, found {}",
            "❌".red(),
            expected,
            outcome.discoveries.len()
        );
    }

    Ok(())
}
