//! Search Module
//!
//! The three-signal retrieval pipeline:
//! - intent classification selecting space and split weight profiles
//! - composite scoring across the six similarity spaces
//! - keyword search with field-weighted BM25
//! - score-weighted RRF fusion with exploration injection

mod composite;
mod fusion;
mod intent;
mod keyword;

pub use composite::{recency, CompositeHit, CompositeScorer, NoteSignals, SpaceScores};
pub use fusion::{
    fuse, inject_exploration, FusedNote, RankedSignal, Signal, SignalContribution,
};
pub use intent::{classify, IntentProfile, QueryIntent, SpaceWeights, SplitWeights};
pub use keyword::{tokenize, KeywordIndex};
