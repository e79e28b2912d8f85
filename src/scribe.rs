//! C8: durable storage for a trained [`crate::mccfr::Average`]. The donor
//! crate favors plain binary framing over a format-specific dependency
//! (no HDF5 crate in this corpus), so snapshots are big-endian,
//! length-prefixed binary written with `byteorder` — the same crate the
//! rest of this workspace already pulls in for wire framing.
//!
//! A snapshot opens into anything implementing [`Scribe`], the read-side
//! seam `Commander` and the inspection binary query against: cluster
//! lookups, per-(round,cluster,seq) policy rows, the sequence table's own
//! transition function, and the action abstraction itself.

use crate::engine::{AbstractAction, Play, Round};
use crate::error::{Result, SolverError};
use crate::sequence::{SequenceId, ILLEGAL_ID, LEAF_ID};
use crate::Probability;

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

const MAGIC: &[u8; 4] = b"FBC1";

pub trait Scribe {
    /// the full, zero-padded-for-illegal policy row at `(round, cluster, seq)`
    fn policy(&self, round: Round, cluster: usize, seq: SequenceId) -> Vec<Probability>;
    /// `next(round, seq, action_idx)`, same sentinels as [`crate::sequence::SequenceTable::next`]
    fn next(&self, round: Round, seq: SequenceId, action_idx: usize) -> SequenceId;
    fn actions(&self) -> &[AbstractAction];
    fn action_count(&self) -> usize {
        self.actions().len()
    }
    fn start_state(&self) -> (Round, SequenceId);
}

/// one round's worth of a flattened `[cluster][legal_i]` probability table
/// plus the transition rows needed to walk it without a live [`crate::engine::Node`].
#[derive(Debug)]
struct RoundTable {
    rows: Vec<Vec<SequenceId>>,
    legal_offset: Vec<usize>,
    total_width: usize,
    num_clusters: usize,
    probabilities: Vec<Probability>,
}

impl RoundTable {
    fn legal_indices(&self, seq: SequenceId) -> Vec<usize> {
        self.rows[seq].iter().enumerate().filter(|&(_, &v)| v != ILLEGAL_ID).map(|(i, _)| i).collect()
    }
}

#[derive(Debug)]
pub struct FileScribe {
    actions: Vec<AbstractAction>,
    rounds: Vec<RoundTable>,
}

impl Scribe for FileScribe {
    fn policy(&self, round: Round, cluster: usize, seq: SequenceId) -> Vec<Probability> {
        let table = &self.rounds[round as usize];
        debug_assert!(cluster < table.num_clusters, "cluster out of range for this snapshot");
        let legal = table.legal_indices(seq);
        let mut out = vec![0 as Probability; self.actions.len()];
        let base = cluster * table.total_width + table.legal_offset[seq];
        for (li, &action_idx) in legal.iter().enumerate() {
            out[action_idx] = table.probabilities[base + li];
        }
        out
    }

    fn next(&self, round: Round, seq: SequenceId, action_idx: usize) -> SequenceId {
        self.rounds[round as usize].rows[seq][action_idx]
    }

    fn actions(&self) -> &[AbstractAction] {
        &self.actions
    }

    fn start_state(&self) -> (Round, SequenceId) {
        (Round::PreFlop, 0)
    }
}

impl FileScribe {
    /// opens a snapshot, validating its `kPlayers`/`kActions` header fields
    /// against what the caller expects to train/play with.
    pub fn open(path: &Path, expected_players: u64, expected_actions: u64) -> Result<Self> {
        let file = File::open(path).map_err(|e| SolverError::Internal(e.to_string()))?;
        let mut r = BufReader::new(file);

        let mut magic = [0u8; 4];
        r.read_exact(&mut magic).map_err(|e| SolverError::Internal(e.to_string()))?;
        if &magic != MAGIC {
            return Err(SolverError::Internal("not a recognized snapshot file".into()));
        }

        let players = read_u64(&mut r)?;
        if players != expected_players {
            return Err(SolverError::InvalidSnapshot {
                field: "kPlayers",
                expected: expected_players,
                found: players,
            });
        }

        let num_actions = read_u64(&mut r)?;
        if num_actions != expected_actions {
            return Err(SolverError::InvalidSnapshot {
                field: "kActions",
                expected: expected_actions,
                found: num_actions,
            });
        }

        let mut actions = Vec::with_capacity(num_actions as usize);
        for _ in 0..num_actions {
            actions.push(read_action(&mut r)?);
        }

        let num_rounds = read_u64(&mut r)? as usize;
        let mut rounds = Vec::with_capacity(num_rounds);
        for _ in 0..num_rounds {
            rounds.push(read_round_table(&mut r, actions.len())?);
        }

        Ok(Self { actions, rounds })
    }
}

/// serializes a trained [`crate::mccfr::Average`] to `path`. Each round's
/// probabilities are read off `Average::raw_round`, already normalized by
/// the caller (`Average::normalize`) beforehand if a single canonical
/// snapshot is wanted.
pub fn write_snapshot<const P: usize, A, R>(
    path: &Path,
    average: &crate::mccfr::Average<P, A, R>,
) -> Result<()>
where
    A: crate::abstraction::InfoAbstraction<P>,
    R: Fn(&[crate::cards::Card]) -> crate::evaluation::Strength,
{
    let file = File::create(path).map_err(|e| SolverError::Internal(e.to_string()))?;
    let mut w = BufWriter::new(file);

    w.write_all(MAGIC).map_err(io_err)?;
    write_u64(&mut w, P as u64)?;
    write_u64(&mut w, average.table().actions().len() as u64)?;
    for a in average.table().actions() {
        write_action(&mut w, a)?;
    }

    write_u64(&mut w, Round::N_ROUNDS as u64)?;
    for &round in Round::all().iter() {
        let table = average.table();
        let num_states = table.num_states(round);
        let num_clusters = average.abstraction().num_clusters(round);

        write_u64(&mut w, num_states as u64)?;
        write_u64(&mut w, num_clusters as u64)?;
        write_u64(&mut w, table.total_width(round) as u64)?;
        for seq in 0..num_states {
            for action_idx in 0..table.actions().len() {
                let id = table.next(round, seq, action_idx);
                write_u64(&mut w, sequence_id_to_wire(id))?;
            }
            write_u64(&mut w, table.legal_offset(round, seq) as u64)?;
        }

        let row = average.raw_round(round);
        write_u64(&mut w, row.len() as u64)?;
        for &p in row {
            w.write_f32::<BigEndian>(p).map_err(io_err)?;
        }
    }

    w.flush().map_err(io_err)
}

fn sequence_id_to_wire(id: SequenceId) -> u64 {
    if id == ILLEGAL_ID {
        u64::MAX
    } else if id == LEAF_ID {
        u64::MAX - 1
    } else {
        id as u64
    }
}

fn sequence_id_from_wire(id: u64) -> SequenceId {
    if id == u64::MAX {
        ILLEGAL_ID
    } else if id == u64::MAX - 1 {
        LEAF_ID
    } else {
        id as SequenceId
    }
}

fn read_round_table(r: &mut impl Read, num_actions: usize) -> Result<RoundTable> {
    let num_states = read_u64(r)? as usize;
    let num_clusters = read_u64(r)? as usize;
    let total_width = read_u64(r)? as usize;
    let mut rows = Vec::with_capacity(num_states);
    let mut legal_offset = Vec::with_capacity(num_states);
    for _ in 0..num_states {
        let mut row = Vec::with_capacity(num_actions);
        for _ in 0..num_actions {
            row.push(sequence_id_from_wire(read_u64(r)?));
        }
        rows.push(row);
        legal_offset.push(read_u64(r)? as usize);
    }
    let prob_len = read_u64(r)? as usize;
    let mut probabilities = Vec::with_capacity(prob_len);
    for _ in 0..prob_len {
        probabilities.push(r.read_f32::<BigEndian>().map_err(io_err)?);
    }
    Ok(RoundTable { rows, legal_offset, total_width, num_clusters, probabilities })
}

fn read_u64(r: &mut impl Read) -> Result<u64> {
    r.read_u64::<BigEndian>().map_err(io_err)
}

fn write_u64(w: &mut impl Write, v: u64) -> Result<()> {
    w.write_u64::<BigEndian>(v).map_err(io_err)
}

fn io_err(e: std::io::Error) -> SolverError {
    SolverError::Internal(e.to_string())
}

fn play_tag(play: Play) -> u8 {
    match play {
        Play::Fold => 0,
        Play::CheckCall => 1,
        Play::Bet => 2,
        Play::AllIn => 3,
    }
}

fn play_from_tag(tag: u8) -> Result<Play> {
    match tag {
        0 => Ok(Play::Fold),
        1 => Ok(Play::CheckCall),
        2 => Ok(Play::Bet),
        3 => Ok(Play::AllIn),
        _ => Err(SolverError::Internal(format!("unrecognized play tag {tag}"))),
    }
}

fn write_action(w: &mut impl Write, a: &AbstractAction) -> Result<()> {
    w.write_u8(play_tag(a.play)).map_err(io_err)?;
    w.write_f64::<BigEndian>(a.size).map_err(io_err)?;
    write_u64(w, a.max_raise_num as u64)?;
    w.write_u8(a.min_round as u8).map_err(io_err)?;
    w.write_u8(a.max_round as u8).map_err(io_err)?;
    write_u64(w, a.max_players as u64)?;
    w.write_i32::<BigEndian>(a.min_pot).map_err(io_err)
}

fn read_action(r: &mut impl Read) -> Result<AbstractAction> {
    let play = play_from_tag(r.read_u8().map_err(io_err)?)?;
    let size = r.read_f64::<BigEndian>().map_err(io_err)?;
    let max_raise_num = read_u64(r)? as u32;
    let min_round = Round::from(r.read_u8().map_err(io_err)? as usize);
    let max_round = Round::from(r.read_u8().map_err(io_err)? as usize);
    let max_players = read_u64(r)? as u32;
    let min_pot = r.read_i32::<BigEndian>().map_err(io_err)?;
    let mut a = match play {
        Play::Fold => AbstractAction::fold(),
        Play::CheckCall => AbstractAction::check_call(),
        Play::AllIn => AbstractAction::all_in(),
        Play::Bet => AbstractAction::bet(size),
    };
    a = a.capped_at_raise(max_raise_num).between_rounds(min_round, max_round).capped_at_players(max_players);
    a = a.min_pot(min_pot);
    Ok(a)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Node;
    use crate::evaluation::evaluate;
    use crate::matchmaker::Matchmaker;
    use crate::mccfr::Strategy;
    use crate::PRUNE_CONSTANT;

    fn heads_up_actions() -> Vec<AbstractAction> {
        vec![AbstractAction::fold(), AbstractAction::check_call(), AbstractAction::all_in()]
    }

    fn tiny_matchmaker() -> Matchmaker<fn(Round, u64) -> usize, fn(Round) -> usize> {
        fn cluster_fn(_round: Round, _idx: u64) -> usize {
            0
        }
        fn clusters_per_round(_round: Round) -> usize {
            1
        }
        Matchmaker::new(cluster_fn, clusters_per_round)
    }

    #[test]
    fn round_trips_through_a_temp_file() {
        let start: Node<2> = Node::new([100, 100], 0, 4, 2, 0, false, true, 0.0, 0, false, 1);
        let strategy =
            Strategy::new(&start, heads_up_actions(), tiny_matchmaker(), evaluate, PRUNE_CONSTANT, 7);
        let average = crate::mccfr::Average::from_strategy(&strategy);

        let path = std::env::temp_dir().join("fishbait_core_scribe_roundtrip_test.bin");
        write_snapshot(&path, &average).expect("write_snapshot must succeed");

        let loaded = FileScribe::open(&path, 2, average.table().actions().len() as u64)
            .expect("open must succeed against matching header");
        assert_eq!(loaded.actions().len(), average.table().actions().len());
        let (round, seq) = loaded.start_state();
        assert_eq!(round, Round::PreFlop);
        let policy = loaded.policy(round, 0, seq);
        let total: Probability = policy.iter().sum();
        assert!((total - 1.0).abs() < 1e-4 || total == 0.0);

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn rejects_mismatched_player_count() {
        let start: Node<2> = Node::new([100, 100], 0, 4, 2, 0, false, true, 0.0, 0, false, 1);
        let strategy =
            Strategy::new(&start, heads_up_actions(), tiny_matchmaker(), evaluate, PRUNE_CONSTANT, 11);
        let average = crate::mccfr::Average::from_strategy(&strategy);

        let path = std::env::temp_dir().join("fishbait_core_scribe_mismatch_test.bin");
        write_snapshot(&path, &average).expect("write_snapshot must succeed");

        let err = FileScribe::open(&path, 6, average.table().actions().len() as u64).unwrap_err();
        assert!(matches!(err, SolverError::InvalidSnapshot { field: "kPlayers", .. }));

        let _ = std::fs::remove_file(&path);
    }
}
