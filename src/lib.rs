pub mod abstraction;
pub mod cards;
pub mod commander;
pub mod engine;
pub mod error;
pub mod evaluation;
pub mod matchmaker;
pub mod mccfr;
pub mod scribe;
pub mod sequence;

/// chip counts are exact integers throughout; no float chip math anywhere
pub type Chips = i32;
/// per-infoset regret accumulator, integer per spec, bounded below by [`REGRET_FLOOR`]
pub type Regret = i64;
/// a sampled or accumulated action probability
pub type Probability = f32;
/// counterfactual value returned up a traversal
pub type Utility = f64;

/// large negative floor every accumulated regret is clamped above
pub const REGRET_FLOOR: Regret = -300_000_000;
/// regret threshold below which `TraverseMCCFR(prune=true)` skips a branch
pub const PRUNE_CONSTANT: Regret = -200_000;
/// number of iterations between successive `Strategy::discount` calls
pub const DISCOUNT_PERIOD: usize = 1;
pub const DISCOUNT_ALPHA: f32 = 1.5;
pub const DISCOUNT_OMEGA: f32 = 0.5;
pub const DISCOUNT_GAMMA: f32 = 1.5;

/// rounds don't nest past the river
pub const N_ROUNDS: usize = 4;
/// every Node admits this many distinct board cards
pub const N_BOARD_CARDS: usize = 5;
pub const N_HAND_CARDS: usize = 2;

/// brings up a combined term+file logger, following the donor's own `init()`.
/// Safe to call more than once; later calls are no-ops once a logger is set.
#[cfg(feature = "server")]
pub fn init() {
    use simplelog::*;
    let file_name = format!(
        "logs/{}.log",
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default()
    );
    std::fs::create_dir_all("logs").ok();
    let file = std::fs::File::create(&file_name).ok();
    let term = TermLogger::new(
        LevelFilter::Info,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    );
    match file.map(|f| WriteLogger::new(LevelFilter::Trace, Config::default(), f)) {
        Some(write) => {
            let _ = CombinedLogger::init(vec![term, write]);
        }
        None => {
            let _ = CombinedLogger::init(vec![term]);
        }
    }
}
