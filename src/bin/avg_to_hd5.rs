//! Inspects a trained policy snapshot: validates its `kPlayers`/`kActions`
//! header against what the caller expects and prints a per-round summary.
//! Named for the donor CLI's on-disk format; this workspace's snapshots are
//! the `byteorder`-framed binary [`fishbait_core::scribe`] writes, not HDF5.

use clap::Parser;
use colored::Colorize;
use fishbait_core::engine::Round;
use fishbait_core::scribe::{FileScribe, Scribe};
use std::path::PathBuf;

#[derive(Parser)]
#[command(about = "inspects and validates an MCCFR policy snapshot")]
struct Args {
    /// path to a snapshot written by the trainer binary
    input: PathBuf,

    #[arg(long)]
    players: u64,

    #[arg(long)]
    actions: u64,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let scribe = FileScribe::open(&args.input, args.players, args.actions)
        .map_err(|e| anyhow::anyhow!("failed to open {}: {e}", args.input.display()))?;

    println!("{}", format!("snapshot {} is valid", args.input.display()).green());

    println!("{} actions in the abstraction:", scribe.actions().len());
    for (idx, action) in scribe.actions().iter().enumerate() {
        println!("  [{idx}] {:?} size={}", action.play, action.size);
    }

    let (round, seq) = scribe.start_state();
    println!("start state: {round} seq={seq}");

    for round in Round::all() {
        let policy = scribe.policy(round, 0, 0);
        let nonzero = policy.iter().filter(|&&p| p > 0.0).count();
        println!("{round}: cluster 0 at sequence 0 has {nonzero} nonzero legal actions");
    }
    Ok(())
}
