//! bloomtree-bench-harness
//!
//! Run small end-to-end benchmarks (fill -> build -> prove presence ->
//! prove absence -> verify) and append CSV rows into
//! `benchmarks/reports/bench-<unix>.csv`.
//!
//! Usage examples:
//!   cargo run -p bloomtree-bench-harness -- --profile benchmarks/profiles/small.toml
//!   cargo run --release -p bloomtree-bench-harness -- --profile benchmarks/profiles/large.toml

use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use anyhow::{bail, Context, Result};
use bloomtree_core::io::{from_cbor, to_cbor};
use bloomtree_core::{BloomTree, CompactMultiProof, Membership, TreeConfig, DEFAULT_CHUNK_BITS};
use bloomtree_filter::SeededBloomFilter;
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use serde::Deserialize;

const fn default_chunk_bits() -> usize {
    DEFAULT_CHUNK_BITS
}

#[derive(Debug, Deserialize)]
struct Profile {
    /// Filter size in bits
    bits: u64,
    /// Hash functions per element
    hashes: usize,
    /// Random elements inserted before building
    elements: usize,
    /// Bits per tree leaf
    #[serde(default = "default_chunk_bits")]
    chunk_bits: usize,
    /// Repetitions of the whole pipeline
    repeats: u32,
    /// RNG seed for element generation
    #[serde(default)]
    rng_seed: u64,
}

fn parse_flag(name: &str, default: &str) -> String {
    let mut it = std::env::args().skip(1);
    while let Some(k) = it.next() {
        if k == format!("--{name}") {
            return it.next().unwrap_or_else(|| default.to_string());
        }
    }
    default.to_string()
}

fn dur_us(d: Duration) -> u128 {
    d.as_micros()
}

fn random_element(rng: &mut StdRng) -> [u8; 16] {
    let mut e = [0u8; 16];
    rng.fill_bytes(&mut e);
    e
}

/// First random element the filter rejects.
fn absent_element(rng: &mut StdRng, filter: &SeededBloomFilter) -> Result<[u8; 16]> {
    for _ in 0..10_000 {
        let e = random_element(rng);
        if !filter.contains(&e) {
            return Ok(e);
        }
    }
    bail!("filter is saturated; no absent element found")
}

fn main() -> Result<()> {
    let profile_path = PathBuf::from(parse_flag("profile", "benchmarks/profiles/small.toml"));

    let profile_src = fs::read_to_string(&profile_path)
        .with_context(|| format!("read profile {}", profile_path.display()))?;
    let profile: Profile = toml::from_str(&profile_src).context("parse profile toml")?;
    println!(
        "Profile: bits={}, hashes={}, elements={}, chunk_bits={}, repeats={}",
        profile.bits, profile.hashes, profile.elements, profile.chunk_bits, profile.repeats
    );
    let config = TreeConfig::with_chunk_bits(profile.chunk_bits);

    fs::create_dir_all("benchmarks/reports").context("create benchmarks/reports")?;

    let ts = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default();
    let csv_path = PathBuf::from(format!("benchmarks/reports/bench-{ts}.csv"));
    let mut csv = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&csv_path)
        .with_context(|| format!("open {}", csv_path.display()))?;
    writeln!(csv, "timestamp,bits,hashes,elements,chunk_bits,repeat,stage,us,extra")?;

    let row_prefix = format!(
        "{ts},{},{},{},{}",
        profile.bits, profile.hashes, profile.elements, profile.chunk_bits
    );

    for rep in 0..profile.repeats {
        let mut rng = StdRng::seed_from_u64(profile.rng_seed.wrapping_add(u64::from(rep)));
        let seed = random_element(&mut rng);
        let elements: Vec<[u8; 16]> =
            (0..profile.elements).map(|_| random_element(&mut rng)).collect();

        // 1) fill filter
        let t0 = Instant::now();
        let filter =
            SeededBloomFilter::from_elements(profile.bits, profile.hashes, seed.to_vec(), &elements)
                .context("build filter")?;
        let t_fill = t0.elapsed();
        writeln!(
            csv,
            "{row_prefix},{rep},fill,{},popcount={}",
            dur_us(t_fill),
            filter.popcount()
        )?;

        let absent = absent_element(&mut rng, &filter)?;

        // 2) build tree
        let t0 = Instant::now();
        let tree = BloomTree::with_config(filter, config).context("build tree")?;
        let t_build = t0.elapsed();
        let root = tree.root();
        writeln!(
            csv,
            "{row_prefix},{rep},build,{},root={}",
            dur_us(t_build),
            hex::encode(root)
        )?;

        // 3) presence proof
        let present = elements.first().copied().unwrap_or_else(|| random_element(&mut rng));
        let t0 = Instant::now();
        let presence = tree.prove(&present).context("presence proof")?;
        let t_presence = t0.elapsed();
        let presence_wire = to_cbor(&presence).context("encode presence proof")?;
        writeln!(
            csv,
            "{row_prefix},{rep},prove_presence,{},digests={};cbor_bytes={}",
            dur_us(t_presence),
            presence.digest_count(),
            presence_wire.len()
        )?;

        // 4) absence proof
        let t0 = Instant::now();
        let absence = tree.prove(&absent).context("absence proof")?;
        let t_absence = t0.elapsed();
        let absence_wire = to_cbor(&absence).context("encode absence proof")?;
        writeln!(
            csv,
            "{row_prefix},{rep},prove_absence,{},digests={};cbor_bytes={}",
            dur_us(t_absence),
            absence.digest_count(),
            absence_wire.len()
        )?;

        // 5) verify both, as a receiver would: from the encoded bytes
        let t0 = Instant::now();
        let presence: CompactMultiProof =
            from_cbor(&presence_wire).context("decode presence proof")?;
        let absence: CompactMultiProof = from_cbor(&absence_wire).context("decode absence proof")?;
        let m1 = tree.verify(&present, &presence, &root).context("verify presence")?;
        let m2 = tree.verify(&absent, &absence, &root).context("verify absence")?;
        let t_verify = t0.elapsed();
        if !matches!(m2, Membership::Absent { .. }) {
            bail!("absence proof verified as {m2:?}");
        }
        writeln!(
            csv,
            "{row_prefix},{rep},verify,{},presence={:?}",
            dur_us(t_verify),
            m1
        )?;
    }

    println!("Wrote report → {}", csv_path.display());
    Ok(())
}
