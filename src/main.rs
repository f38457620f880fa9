//! StorageMap: names external drives and records dated, shallow
//! inventories of their directory structure.
//!
//! Thin binary entry point. All logic lives in the `storagemap-core` crate;
//! this file parses arguments, wires the collaborators together and prints
//! summaries.

mod prompt;

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use storagemap_core::config::{self, AppPaths, BASE_DIR_ENV};
use storagemap_core::model::size::{format_count, format_size};
use storagemap_core::naming::NamingPool;
use storagemap_core::orchestrator::{
    AutoAcceptPrompt, NamePrompt, Orchestrator, RunOptions, RunReport, VolumeOutcome,
};
use storagemap_core::platform::{self, DeviceEnumerator, JsonFileEnumerator};
use storagemap_core::registry::RegistryStore;
use storagemap_core::scanner::DEFAULT_LISTING_DEPTH;
use storagemap_core::snapshot::{self, SnapshotWriter};

use crate::prompt::TerminalPrompt;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Data directory holding config/, registry/ and snapshots/
    #[arg(long, global = true, env = BASE_DIR_ENV)]
    base_dir: Option<PathBuf>,

    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,

    #[command(flatten)]
    scan: ScanArgs,
}

#[derive(clap::Args, Clone)]
struct ScanArgs {
    /// Deepest directory level listed in each snapshot
    #[arg(long, default_value_t = DEFAULT_LISTING_DEPTH)]
    depth: u16,

    /// Read volumes from a JSON file instead of asking the operating system
    #[arg(long, value_name = "FILE")]
    volumes_file: Option<PathBuf>,

    /// Accept every proposed name without prompting
    #[arg(short, long)]
    yes: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Detect, name and scan every connected external volume (default)
    Scan(ScanArgs),
    /// Show every registered volume
    List,
    /// List retained snapshots for one volume id
    Snapshots { id: String },
    /// Write one snapshot's directory table as CSV
    Export {
        snapshot: PathBuf,
        /// Output file (stdout if omitted)
        #[arg(short, long, value_name = "FILE")]
        out: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialise structured logging.
    tracing_subscriber::fmt()
        .with_max_level(if cli.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        })
        .with_writer(io::stderr)
        .init();

    let paths = AppPaths::resolve(cli.base_dir.as_deref())
        .context("failed to resolve the StorageMap data directory")?;
    tracing::debug!("Using data directory {}", paths.base_dir.display());

    match cli.command {
        None => scan(&paths, &cli.scan),
        Some(Command::Scan(args)) => scan(&paths, &args),
        Some(Command::List) => list(&paths),
        Some(Command::Snapshots { id }) => snapshots(&paths, &id),
        Some(Command::Export { snapshot, out }) => export(&snapshot, out.as_deref()),
    }
}

fn scan(paths: &AppPaths, args: &ScanArgs) -> anyhow::Result<()> {
    let rules = config::load_naming_rules(&paths.naming_rules_file())
        .context("failed to load naming rules")?;
    let mut registry =
        RegistryStore::load(paths.registry_file()).context("failed to load the drive registry")?;
    let mut pool = NamingPool::from_registry(rules, &registry);
    let writer = SnapshotWriter::new(&paths.snapshots_dir);

    let enumerator: Box<dyn DeviceEnumerator> = match &args.volumes_file {
        Some(file) => Box::new(JsonFileEnumerator::new(file)),
        None => platform::system_enumerator()?,
    };
    let mut prompt: Box<dyn NamePrompt> = if args.yes {
        Box::new(AutoAcceptPrompt)
    } else {
        Box::new(TerminalPrompt::new(io::stdin().lock(), io::stdout()))
    };

    let options = RunOptions {
        listing_depth: args.depth,
    };
    let report = Orchestrator::new(&mut registry, &mut pool, &writer, options)
        .run(enumerator.as_ref(), prompt.as_mut())?;

    print_report(&report);
    Ok(())
}

fn print_report(report: &RunReport) {
    println!();
    if report.volumes.is_empty() {
        println!("No external volumes detected.");
    }
    for entry in &report.volumes {
        let volume = &entry.volume;
        match &entry.outcome {
            VolumeOutcome::Completed(scan) => {
                println!(
                    "{} — {}, {} free, {} directories scanned",
                    scan.id,
                    format_size(volume.capacity_bytes),
                    format_size(volume.free_bytes),
                    format_count(scan.directories as u64)
                );
                println!(
                    "    {} in {} files{}",
                    format_size(scan.total_size),
                    format_count(scan.total_files),
                    if scan.inaccessible > 0 {
                        format!(", {} inaccessible", format_count(scan.inaccessible as u64))
                    } else {
                        String::new()
                    }
                );
                println!("    snapshot: {}", scan.snapshot_path.display());
            }
            VolumeOutcome::Aborted { id, reason } => {
                println!("{id} — scan aborted: {reason}");
            }
            VolumeOutcome::Skipped { reason } => {
                println!("{} — skipped: {reason}", volume.volume_uuid);
            }
        }
    }
    for warning in &report.warnings {
        println!("warning: {warning}");
    }
    println!(
        "\n{} scanned, {} aborted, {} skipped",
        report.completed().count(),
        report.aborted_count(),
        report.skipped_count()
    );
}

fn list(paths: &AppPaths) -> anyhow::Result<()> {
    let registry =
        RegistryStore::load(paths.registry_file()).context("failed to load the drive registry")?;
    if registry.is_empty() {
        println!("No volumes registered in {}", registry.path().display());
        return Ok(());
    }

    println!(
        "{:<12} {:<12} {:<16} {:<8} {:>10}  LAST SCANNED",
        "ID", "NAME", "KIND", "STATUS", "CAPACITY"
    );
    for identity in registry.identities() {
        println!(
            "{:<12} {:<12} {:<16} {:<8} {:>10}  {}",
            identity.id,
            identity.name,
            identity.kind.label(),
            identity.status,
            format_size(identity.capacity_bytes),
            identity.last_scanned.format("%Y-%m-%d %H:%M UTC")
        );
    }
    Ok(())
}

fn snapshots(paths: &AppPaths, id: &str) -> anyhow::Result<()> {
    let id = storagemap_core::naming::normalise_id(id);
    let writer = SnapshotWriter::new(&paths.snapshots_dir);
    let files = writer
        .list(&id)
        .with_context(|| format!("failed to list snapshots for {id}"))?;
    if files.is_empty() {
        println!("No snapshots for {id} in {}", writer.dir().display());
    }
    for file in files {
        println!("{}  {}", file.date, file.path.display());
    }
    Ok(())
}

fn export(snapshot_file: &Path, out: Option<&Path>) -> anyhow::Result<()> {
    let snapshot = SnapshotWriter::load(snapshot_file)?;
    match out {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            snapshot::export_csv(&snapshot, BufWriter::new(file))?;
            tracing::info!(
                "Exported {} directories to {}",
                snapshot.directories.len(),
                path.display()
            );
        }
        None => {
            let stdout = io::stdout();
            let mut lock = stdout.lock();
            snapshot::export_csv(&snapshot, &mut lock)?;
            lock.flush()?;
        }
    }
    Ok(())
}
