//! Runs MCCFR self-play over a fixed six-max table and periodically
//! snapshots the time-averaged policy to disk.

use clap::Parser;
use colored::Colorize;
use fishbait_core::engine::{AbstractAction, Node, Round};
use fishbait_core::matchmaker::Matchmaker;
use fishbait_core::mccfr::{Average, Strategy};
use fishbait_core::scribe::write_snapshot;
use fishbait_core::{DISCOUNT_PERIOD, PRUNE_CONSTANT};
use std::path::PathBuf;

const PLAYERS: usize = 6;
const STARTING_STACK: i32 = 200;
const BIG_BLIND: i32 = 4;
const SMALL_BLIND: i32 = 2;

#[derive(Parser)]
#[command(about = "trains an MCCFR policy for six-max no-limit hold'em")]
struct Args {
    /// number of full training iterations (one pass over all six seats)
    #[arg(long, default_value_t = 10_000)]
    iterations: u64,

    /// iterations between `Average::accumulate` snapshots of the running strategy
    #[arg(long, default_value_t = 100)]
    accumulate_every: u64,

    /// rng seed for the deal and the sampling strategy
    #[arg(long, default_value_t = 1)]
    seed: u64,

    /// where to write the trained policy snapshot
    #[arg(long, default_value = "policy.fbc")]
    output: PathBuf,

    #[arg(long, default_value_t = 10)]
    clusters_per_round: usize,
}

fn flat_cluster_fn(_round: Round, canonical_index: u64) -> usize {
    (canonical_index % 997) as usize
}

fn main() -> anyhow::Result<()> {
    fishbait_core::init();

    let args = Args::parse();

    if args.output.exists()
        && !dialoguer::Confirm::new()
            .with_prompt(format!("{} already exists, overwrite it?", args.output.display()))
            .default(false)
            .interact()?
    {
        println!("{}", "aborted: output already exists".yellow());
        return Ok(());
    }
    let clusters_per_round = args.clusters_per_round;
    let clusters_fn = move |_round: Round| clusters_per_round;

    let actions = vec![
        AbstractAction::fold(),
        AbstractAction::check_call(),
        AbstractAction::bet(0.5),
        AbstractAction::bet(1.0),
        AbstractAction::all_in(),
    ];

    let start: Node<PLAYERS> = Node::new(
        [STARTING_STACK; PLAYERS],
        0,
        BIG_BLIND,
        SMALL_BLIND,
        0,
        false,
        true,
        0.0,
        0,
        false,
        args.seed,
    );

    let abstraction = Matchmaker::new(flat_cluster_fn, clusters_fn);
    let mut strategy =
        Strategy::new(&start, actions, abstraction, fishbait_core::evaluation::evaluate, PRUNE_CONSTANT, args.seed);

    let mut average: Option<Average<PLAYERS, _, _>> = None;

    for iteration in 1..=args.iterations {
        strategy.seed_rng(args.seed ^ iteration);
        let prune = iteration % 10 != 0;
        for player in 0..PLAYERS {
            let mut node = start.clone();
            node.seed_node_rng(args.seed ^ iteration ^ (player as u64) << 32);
            let buckets = [0usize; PLAYERS];
            strategy.traverse_mccfr(node.clone(), player, prune, buckets);
            if iteration as usize <= fishbait_core::engine::Round::N_ROUNDS * 100 {
                strategy.update_strategy(node, player);
            }
        }

        if iteration as usize % DISCOUNT_PERIOD == 0 {
            strategy.discount(iteration as f32);
        }

        if iteration % args.accumulate_every == 0 {
            match average.as_mut() {
                Some(avg) => avg.accumulate(&strategy),
                None => average = Some(Average::from_strategy(&strategy)),
            }
            log::info!("iteration {iteration}/{}: accumulated snapshot", args.iterations);
        }
    }

    let mut average = average.unwrap_or_else(|| Average::from_strategy(&strategy));
    average.normalize();
    write_snapshot(&args.output, &average)?;
    println!("{} wrote trained policy to {}", "done:".green(), args.output.display());
    Ok(())
}
