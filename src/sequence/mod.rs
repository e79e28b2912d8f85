pub mod table;

pub use table::{SequenceId, SequenceTable, ILLEGAL_ID, LEAF_ID};
