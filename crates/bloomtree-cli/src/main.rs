// crates/bloomtree-cli/src/main.rs

#![forbid(unsafe_code)]
#![deny(
    rust_2018_idioms,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo
)]

use anyhow::{anyhow, Context, Result};
use bloomtree_core::{
    io::{read_auto, read_proof_auto, write_auto, write_proof_auto},
    BloomTree, Membership, ProofType, TreeConfig,
};
use bloomtree_crypto::{from_hex, to_hex};
use bloomtree_filter::{FilterProfile, SeededBloomFilter};
use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(
    name = "bloomtree",
    about = "Bloom tree reference CLI",
    long_about = "Bloom tree reference CLI.\n\nBuild a seeded Bloom filter from a profile, commit to it with a Merkle root, and produce/verify compact presence or absence proofs.",
    version = env!("CARGO_PKG_VERSION"),
    disable_help_subcommand = true
)]
struct Cli {
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Build a filter from a TOML profile, write its snapshot and print the root
    Build {
        /// Filter profile (TOML)
        #[arg(long)]
        profile: PathBuf,

        /// Output path for the filter snapshot and its chunk size (CBOR/JSON)
        #[arg(long, default_value = "filter.json")]
        out: PathBuf,

        /// Bits per chunk; overrides the profile's `[tree]` table
        #[arg(long)]
        chunk_bits: Option<usize>,
    },

    /// Print the root of a filter snapshot (hex)
    Root {
        /// Filter snapshot (CBOR/JSON)
        #[arg(long)]
        filter: PathBuf,

        /// Bits per chunk; overrides the chunk size stored with the snapshot
        #[arg(long)]
        chunk_bits: Option<usize>,
    },

    /// Write a compact presence/absence proof for an element
    Prove {
        /// Filter snapshot (CBOR/JSON)
        #[arg(long)]
        filter: PathBuf,

        /// Element (UTF-8)
        #[arg(long)]
        element: String,

        /// Output path for the proof (CBOR/JSON)
        #[arg(long, default_value = "proof.json")]
        out: PathBuf,

        /// Bits per chunk; overrides the chunk size stored with the snapshot
        #[arg(long)]
        chunk_bits: Option<usize>,
    },

    /// Verify a proof for an element against a trusted root
    Verify {
        /// Filter snapshot (CBOR/JSON); only its parameters and seed are used
        #[arg(long)]
        filter: PathBuf,

        /// Element (UTF-8)
        #[arg(long)]
        element: String,

        /// Proof (CBOR/JSON)
        #[arg(long)]
        proof: PathBuf,

        /// Trusted root (64 hex chars)
        #[arg(long)]
        root: String,

        /// Bits per chunk; overrides the chunk size stored with the snapshot
        #[arg(long)]
        chunk_bits: Option<usize>,
    },
}

/// What `build` writes: the filter plus the chunking its root was taken over.
#[derive(Serialize, Deserialize, Debug)]
struct FilterFile {
    tree: TreeConfig,
    filter: SeededBloomFilter,
}

/// One-line machine-readable result of `build`.
#[derive(Serialize, Debug)]
struct BuildSummary {
    root: String,
    bits: u64,
    hashes: usize,
    elements: usize,
    chunk_bits: usize,
    chunks: usize,
    leaves: usize,
}

fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    match cli.cmd {
        Cmd::Build {
            profile,
            out,
            chunk_bits,
        } => build(&profile, &out, chunk_bits).map(|summary| {
            println!(
                "Built {} → {} (chunk_bits={})",
                summary.root,
                out.display(),
                summary.chunk_bits
            );
            if let Ok(line) = serde_json::to_string(&summary) {
                println!("{line}");
            }
        }),

        Cmd::Root { filter, chunk_bits } => {
            let root = root(&filter, chunk_bits)?;
            println!("{root}");
            Ok(())
        }

        Cmd::Prove {
            filter,
            element,
            out,
            chunk_bits,
        } => prove(&filter, &element, &out, chunk_bits).map(|t| {
            println!("Proved {} for {element:?} → {}", describe(t), out.display());
        }),

        Cmd::Verify {
            filter,
            element,
            proof,
            root,
            chunk_bits,
        } => verify(&filter, &element, &proof, &root, chunk_bits).map(|m| match m {
            Membership::Present => println!("OK: {element:?} is present"),
            Membership::Absent { ordinal } => {
                println!("OK: {element:?} is absent (hash function {ordinal})");
            }
        }),
    }
}

/// Initialize tracing with an env-driven filter (default INFO).
fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let fmt_layer = fmt::layer().with_target(false).with_level(true).compact();

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init();
}

fn describe(t: ProofType) -> &'static str {
    match t {
        ProofType::Presence => "presence",
        ProofType::Absence(_) => "absence",
    }
}

fn load_tree(filter: &Path, chunk_bits: Option<usize>) -> Result<BloomTree<SeededBloomFilter>> {
    let file: FilterFile = read_auto(filter)
        .with_context(|| format!("reading filter snapshot {}", filter.display()))?;
    let config = chunk_bits.map_or(file.tree, TreeConfig::with_chunk_bits);
    BloomTree::with_config(file.filter, config)
        .with_context(|| format!("building tree over {}", filter.display()))
}

fn build(profile: &Path, out: &Path, chunk_bits: Option<usize>) -> Result<BuildSummary> {
    let text = std::fs::read_to_string(profile)
        .with_context(|| format!("reading profile {}", profile.display()))?;
    let prof: FilterProfile =
        toml::from_str(&text).with_context(|| format!("parsing profile {}", profile.display()))?;

    let config = chunk_bits.map_or(prof.tree, TreeConfig::with_chunk_bits);
    info!(profile=%profile.display(), out=%out.display(), chunk_bits = config.chunk_bits, "building filter");

    config.validate().context("tree config")?;

    let file = FilterFile {
        tree: config,
        filter: prof.build().context("building filter from profile")?,
    };
    write_auto(out, &file)
        .with_context(|| format!("writing filter snapshot to {}", out.display()))?;

    let (bits, hashes) = prof.params();
    let tree = BloomTree::with_config(file.filter, config).context("building tree")?;
    let layout = *tree.layout();
    Ok(BuildSummary {
        root: to_hex(&tree.root()),
        bits,
        hashes,
        elements: prof.elements.len(),
        chunk_bits: layout.chunk_bits,
        chunks: layout.chunk_count,
        leaves: layout.leaf_count,
    })
}

fn root(filter: &Path, chunk_bits: Option<usize>) -> Result<String> {
    let tree = load_tree(filter, chunk_bits)?;
    Ok(to_hex(&tree.root()))
}

fn prove(filter: &Path, element: &str, out: &Path, chunk_bits: Option<usize>) -> Result<ProofType> {
    let tree = load_tree(filter, chunk_bits)?;
    info!(filter=%filter.display(), element, out=%out.display(), "proving");

    let proof = tree
        .prove(element.as_bytes())
        .with_context(|| format!("proving {element:?}"))?;
    write_proof_auto(out, &proof)
        .with_context(|| format!("writing proof to {}", out.display()))?;
    Ok(proof.proof_type)
}

fn verify(
    filter: &Path,
    element: &str,
    proof: &Path,
    root: &str,
    chunk_bits: Option<usize>,
) -> Result<Membership> {
    let root = from_hex(root).ok_or_else(|| anyhow!("root must be 64 hex characters"))?;
    let tree = load_tree(filter, chunk_bits)?;
    let proof_v = read_proof_auto(proof)
        .with_context(|| format!("reading proof from {}", proof.display()))?;

    info!(filter=%filter.display(), element, proof=%proof.display(), "verifying proof");
    tree.verify(element.as_bytes(), &proof_v, &root)
        .with_context(|| format!("verification of {element:?} failed"))
}
