// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # IP Vault CLI
//!
//! Entry point for the `ipvault` binary. Parses arguments, sets up logging,
//! opens the store and drives the demo sequencer or the walkthrough.
//!
//! - `upload`      - encrypt a file and pin it to mock IPFS
//! - `save-key`    - append a key record to the vault
//! - `buy`         - license check, decrypt, download
//! - `records`     - list the vault
//! - `demo`        - all of the above on one file
//! - `walkthrough` - the seven-step tour, optionally on autoplay
//! - `flow`        - the owner → vault → buyer diagram
//! - `version`     - build information

mod cli;
mod logging;

use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use tokio::signal;
use tokio::sync::broadcast::error::RecvError;

use ipvault_protocol::config::{DemoConfig, SYMMETRIC_ALGORITHM};
use ipvault_protocol::demo::{DemoEvent, DemoSequencer, DirectorySink, SelectedFile};
use ipvault_protocol::ipfs::ContentId;
use ipvault_protocol::license::SimulatedLicenseGate;
use ipvault_protocol::storage::{MemoryStore, SharedStore, SledStore};
use ipvault_protocol::vault::{KeyRecord, KeyVault};
use ipvault_protocol::walkthrough::{
    default_steps, Step, TabbedFlow, WalkthroughController, WalkthroughEvent, WalkthroughPlayer,
};

use cli::{Commands, GlobalArgs, IpvaultCli, LicenseArgs};
use logging::{LogFormat, DEFAULT_FILTER};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = IpvaultCli::parse();

    if let Commands::Version = cli.command {
        print_version();
        return Ok(());
    }

    logging::init_logging(DEFAULT_FILTER, LogFormat::from_str_lossy(&cli.global.log_format));

    match cli.command {
        Commands::Upload(args) => upload(&cli.global, args).await,
        Commands::SaveKey(args) => save_key(&cli.global, args),
        Commands::Buy(args) => buy(&cli.global, args).await,
        Commands::Records(args) => records(&cli.global, args),
        Commands::Demo(args) => demo(&cli.global, args).await,
        Commands::Walkthrough(args) => walkthrough(args).await,
        Commands::Flow(args) => {
            flow(args);
            Ok(())
        }
        Commands::Version => Ok(()),
    }
}

/// Opens the configured store: sled under `<data-dir>/store`, or memory.
fn open_store(global: &GlobalArgs) -> Result<SharedStore> {
    if global.memory {
        let store = match DemoConfig::default().storage_quota {
            Some(quota) => MemoryStore::with_quota(quota),
            None => MemoryStore::new(),
        };
        tracing::info!("using in-memory store");
        return Ok(Arc::new(store));
    }

    let path = global.data_dir.join("store");
    std::fs::create_dir_all(&global.data_dir).with_context(|| {
        format!("failed to create data directory: {}", global.data_dir.display())
    })?;
    let store = SledStore::open(&path)
        .with_context(|| format!("failed to open store at {}", path.display()))?;
    tracing::info!(path = %path.display(), "store opened");
    Ok(Arc::new(store))
}

fn sequencer(store: SharedStore, license: &LicenseArgs) -> DemoSequencer {
    let config = DemoConfig::default().with_license_delay_ms(license.license_delay_ms);
    let gate = Arc::new(SimulatedLicenseGate::new(config.license_check_delay));
    DemoSequencer::new(store, gate).with_mode(license.mode)
}

async fn upload(global: &GlobalArgs, args: cli::UploadArgs) -> Result<()> {
    let store = open_store(global)?;
    let file = SelectedFile::from_path(&args.file)
        .await
        .with_context(|| format!("failed to read {}", args.file.display()))?;

    let gate = Arc::new(SimulatedLicenseGate::default());
    let mut seq = DemoSequencer::new(store, gate).with_mode(args.mode);
    seq.select_file(file);
    let receipt = seq.encrypt_and_upload().context("upload failed")?;

    println!("CID      : {}", receipt.content_id);
    println!("Key      : {}", receipt.key_material);
    println!("File     : {}", receipt.file_name);
    println!("Mode     : {}", receipt.mode.label());

    if args.save_key {
        seq.save_last_key().context("failed to save key")?;
        println!("Key saved to vault.");
    }
    Ok(())
}

fn save_key(global: &GlobalArgs, args: cli::SaveKeyArgs) -> Result<()> {
    let store = open_store(global)?;
    let vault = KeyVault::new(store);
    let record = KeyRecord::new(ContentId::new(args.cid), args.key, args.name, args.mode);
    let count = vault.save(record).context("failed to save key")?;
    println!("Key saved to vault ({count} records).");
    Ok(())
}

async fn buy(global: &GlobalArgs, args: cli::BuyArgs) -> Result<()> {
    let store = open_store(global)?;
    let mut seq = sequencer(store, &args.license);
    let mut sink = DirectorySink::new(&args.license.out);
    let cid = ContentId::new(args.cid);

    match seq.buy_and_download(&cid, &mut sink).await {
        Ok(delivery) => {
            let location = delivery
                .receipt
                .location
                .map(|p| p.display().to_string())
                .unwrap_or_default();
            println!(
                "Delivered {} ({} bytes) -> {}",
                delivery.receipt.file_name, delivery.receipt.bytes, location
            );
            Ok(())
        }
        Err(e) => {
            println!("{}", seq.status());
            Err(e).with_context(|| format!("purchase of {cid} failed"))
        }
    }
}

fn records(global: &GlobalArgs, args: cli::RecordsArgs) -> Result<()> {
    let store = open_store(global)?;
    let vault = KeyVault::new(store);
    let records = match &args.cid {
        Some(cid) => vault.find_all(&ContentId::new(cid.as_str()))?,
        None => vault.records()?,
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(());
    }

    if records.is_empty() {
        println!("No keys saved.");
        return Ok(());
    }
    for record in &records {
        println!(
            "{}  {:<5}  {}  {}",
            record.saved_at.format("%Y-%m-%d %H:%M:%S"),
            record.mode.as_str(),
            record.content_id,
            record.file_name,
        );
    }
    Ok(())
}

async fn demo(global: &GlobalArgs, args: cli::DemoArgs) -> Result<()> {
    let store = open_store(global)?;
    let file = SelectedFile::from_path(&args.file)
        .await
        .with_context(|| format!("failed to read {}", args.file.display()))?;

    let mut seq = sequencer(store, &args.license);

    // Narrate stage changes as they happen.
    let mut rx = seq.subscribe();
    let narrator = tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(DemoEvent::StageChanged { stage, status }) => {
                    println!("[{:<16}] {}", stage.name(), status);
                }
                Err(RecvError::Lagged(n)) => tracing::warn!(skipped = n, "narrator lagged"),
                Err(RecvError::Closed) => break,
            }
        }
    });

    let outcome = run_demo(&mut seq, file, &args.license).await;
    drop(seq);
    narrator.await.context("narrator task failed")?;
    outcome
}

async fn run_demo(seq: &mut DemoSequencer, file: SelectedFile, license: &LicenseArgs) -> Result<()> {
    seq.select_file(file);
    let receipt = seq.encrypt_and_upload().context("upload failed")?;
    seq.save_last_key().context("failed to save key")?;

    let mut sink = DirectorySink::new(&license.out);
    let delivery = seq
        .buy_and_download(&receipt.content_id, &mut sink)
        .await
        .with_context(|| format!("purchase of {} failed", receipt.content_id))?;

    if let Some(path) = delivery.receipt.location {
        tracing::info!(path = %path.display(), "demo complete");
    }
    Ok(())
}

async fn walkthrough(args: cli::WalkthroughArgs) -> Result<()> {
    let config = DemoConfig::default().with_autoplay_ms(args.interval_ms);
    let controller = WalkthroughController::new(default_steps(args.mode))?;
    let mut player = WalkthroughPlayer::new(controller, config.autoplay_interval);
    player.set_active(args.start);

    let steps = player.steps();
    println!("{}", args.mode.label());
    println!();

    if !args.autoplay {
        let active = player.state().active_index;
        for step in &steps {
            let marker = if step.index == active { ">" } else { " " };
            print_step(marker, step, steps.len());
        }
        return Ok(());
    }

    print_step(">", &player.active_step(), steps.len());
    let mut rx = player.subscribe();
    player.toggle_play();

    let mut remaining = args.ticks;
    while remaining > 0 {
        tokio::select! {
            event = rx.recv() => match event {
                Ok(WalkthroughEvent::StepChanged { index }) => {
                    if let Some(step) = steps.get(index) {
                        print_step(">", step, steps.len());
                    }
                    remaining -= 1;
                }
                Ok(WalkthroughEvent::PlaybackChanged { .. }) => {}
                Err(RecvError::Lagged(_)) => {}
                Err(RecvError::Closed) => break,
            },
            _ = signal::ctrl_c() => {
                tracing::info!("interrupted");
                break;
            }
        }
    }

    player.pause();
    Ok(())
}

fn print_step(marker: &str, step: &Step, total: usize) {
    println!("{marker} {}/{}  {}", step.index + 1, total, step.title);
    println!("        {}", step.description);
}

fn flow(args: cli::FlowArgs) {
    let flow = TabbedFlow::new(args.mode);
    let join = |conds: &[ipvault_protocol::license::AccessCondition]| {
        conds
            .iter()
            .map(|c| c.label())
            .collect::<Vec<_>>()
            .join(", ")
    };

    println!("{}", args.mode.label());
    println!("  {}", flow.diagram());
    println!("  write: {}", join(flow.write_conditions()));
    println!("  read : {}", join(flow.read_conditions()));
}

fn print_version() {
    println!("ipvault {}", env!("CARGO_PKG_VERSION"));
    println!("cipher  {}", SYMMETRIC_ALGORITHM);
    println!("rustc   {}", rustc_version());
}

fn rustc_version() -> &'static str {
    option_env!("RUSTC_VERSION").unwrap_or("unknown")
}
