use anyhow::{anyhow, Context, Result};
use clap::{Arg, ArgAction, Command};
use serde::de::DeserializeOwned;
use std::fs;
use std::path::Path;
use tracing::{error, info};

use log_auditor::merkle::{expected_proof_len, verify_consistency, ConsistencyProof, LogRoot};

fn main() -> Result<()> {
    // Parse command line arguments
    let matches = Command::new("verify-consistency")
        .version("0.1.0")
        .about("Verify that a newer log root extends an older trusted root")
        .arg(
            Arg::new("old")
                .short('o')
                .long("old")
                .value_name("PATH")
                .help("Trusted log root (JSON)")
                .required(true),
        )
        .arg(
            Arg::new("new")
                .short('n')
                .long("new")
                .value_name("PATH")
                .help("Claimed new log root (JSON)")
                .required(true),
        )
        .arg(
            Arg::new("proof")
                .short('p')
                .long("proof")
                .value_name("PATH")
                .help("Consistency proof as a JSON array of hex hashes (empty if omitted)"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .action(ArgAction::SetTrue)
                .help("Enable verbose output"),
        )
        .get_matches();

    let verbose = matches.get_flag("verbose");
    tracing_subscriber::fmt()
        .with_max_level(if verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::WARN
        })
        .init();

    let old_path = matches
        .get_one::<String>("old")
        .ok_or_else(|| anyhow!("--old is required"))?;
    let new_path = matches
        .get_one::<String>("new")
        .ok_or_else(|| anyhow!("--new is required"))?;

    let old: LogRoot = read_json(old_path)?;
    let new: LogRoot = read_json(new_path)?;
    let proof: ConsistencyProof = match matches.get_one::<String>("proof") {
        Some(path) => read_json(path)?,
        None => ConsistencyProof::empty(),
    };

    if verbose {
        println!("Old root: {}", old.summary());
        println!("New root: {}", new.summary());
        match expected_proof_len(old.tree_size, new.tree_size) {
            Some(expected) => println!("Proof: {} hashes (expected {})", proof.len(), expected),
            None => println!("Proof: {} hashes (log shrank, no valid proof exists)", proof.len()),
        }
    }

    info!("Verifying consistency {} -> {}", old.tree_size, new.tree_size);
    match verify_consistency(&old, &new, &proof) {
        Ok(root) => {
            println!(
                "✓ Root at size {} (revision {}) is consistent with trusted size {}",
                root.tree_size, root.revision, old.tree_size
            );
            Ok(())
        }
        Err(e) => {
            error!("Consistency verification failed: {}", e);
            println!("❌ {}", e);
            std::process::exit(1);
        }
    }
}

fn read_json<T: DeserializeOwned>(path: &str) -> Result<T> {
    if !Path::new(path).exists() {
        return Err(anyhow!("File not found: {}", path));
    }

    let contents = fs::read_to_string(path).with_context(|| format!("Failed to read {}", path))?;
    serde_json::from_str(&contents).with_context(|| format!("Failed to parse {}", path))
}
