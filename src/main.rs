//! # merkle-snapshot
//!
//! Command line front end: prints the Merkle root of one or more directories,
//! optionally checking it against a recorded value, and produces inclusion
//! proofs for individual files.
//!
//! ## Configuration
//! Scan settings come from the TOML file named by `--config`; every key left
//! out of it, or the whole file when the flag is absent, takes its default.
//! The flags below only pick what to scan and what to compare against.

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use log::info;
use merkle_snapshot::{Config, Hash, Snapshot};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "merkle-snapshot")]
#[command(about = "Fingerprint directory trees with incrementally updatable Merkle roots")]
struct Args {
    /// Path to a TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the root hash of each directory
    Root {
        /// Directories to fingerprint
        #[arg(required = true)]
        dirs: Vec<PathBuf>,

        /// Value written to the identity leaf after construction
        #[arg(long)]
        version: Option<Hash>,

        /// Expected root; exits with an error if any directory differs
        #[arg(long)]
        expect: Option<Hash>,
    },
    /// Print and verify the inclusion proof of one file
    Prove {
        /// Snapshot root directory
        dir: PathBuf,
        /// File inside the directory, relative to it or including it
        file: PathBuf,
    },
}

fn main() -> Result<()> {
    // Use RUST_LOG to control verbosity, e.g. RUST_LOG=debug
    env_logger::init();

    let args = Args::parse();
    let config = Config::load_or_default(args.config.as_deref())?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async move {
        match args.command {
            Command::Root {
                dirs,
                version,
                expect,
            } => run_root(&config, &dirs, version, expect).await,
            Command::Prove { dir, file } => run_prove(&config, &dir, &file).await,
        }
    })
}

async fn run_root(
    config: &Config,
    dirs: &[PathBuf],
    version: Option<Hash>,
    expect: Option<Hash>,
) -> Result<()> {
    let mut mismatches = 0;
    for dir in dirs {
        info!("processing directory {}", dir.display());
        let mut snapshot = Snapshot::capture(dir, config).await?;
        if let Some(version) = version {
            snapshot.set_version(version)?;
        }
        println!("{}  {}", snapshot.root(), dir.display());
        if let Some(expected) = expect {
            if !snapshot.check(&expected) {
                mismatches += 1;
            }
        }
    }
    if mismatches > 0 {
        bail!("{} of {} directories did not match the expected root", mismatches, dirs.len());
    }
    Ok(())
}

async fn run_prove(config: &Config, dir: &Path, file: &Path) -> Result<()> {
    let mut snapshot = Snapshot::capture(dir, config).await?;
    let root = snapshot.root();
    let (index, leaf, proof) = snapshot.prove(file)?;
    let verified = proof.verify(&root, &leaf);

    println!("root  {}", root);
    println!("leaf  {} {}", index, leaf);
    print!("{}", proof);
    println!("verified: {}", verified);
    if !verified {
        bail!("proof for {} did not verify", file.display());
    }
    Ok(())
}
