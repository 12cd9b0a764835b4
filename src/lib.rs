//! Pairwise sequence alignment with affine gaps.
//!
//! One DP engine covers global, local and banded alignment. Batches of pairs
//! run serially or on a fixed worker pool; results come back in input order
//! through a lazy iterator, or in completion order through a callback.
//!
//! ```
//! use pairalign::{align_pairwise, AlignConfig, GapScheme, Method, SimpleScoring};
//!
//! let config = AlignConfig::builder()
//!     .with_method(Method::Local)
//!     .with_scoring(SimpleScoring::new(4, -5))
//!     .with_gap(GapScheme::new(-10, -1))
//!     .build()?;
//!
//! let pairs = vec![(b"AACCGGTTTAACCGGTT".to_vec(), b"ACGTCTACGTA".to_vec())];
//! for result in align_pairwise(pairs, config)? {
//!     let result = result?;
//!     assert_eq!(result.score()?, 11);
//! }
//! # Ok::<(), pairalign::AlignError>(())
//! ```

use thiserror::Error;

pub mod alignment_mode;
pub mod alphabet;
pub mod config;
pub mod driver;
pub mod matrix;
pub mod result;
pub mod scoring;
pub mod traceback;

pub use alignment_mode::{Band, EndGaps, Method};
pub use alphabet::{Alphabet, AminoAcid, Dna4, Gapped, Labeled, Sequence};
pub use config::{AlignConfig, AlignConfigBuilder, Execution, Output, Outputs};
pub use driver::{
    align_pair, align_pairwise, align_pairwise_with, AlignmentResults, PairwiseAligner,
};
pub use result::{AlignmentResult, Coordinate};
pub use scoring::{GapScheme, MatrixScoring, ScoringScheme, SimpleScoring};
pub use traceback::{Alignment, AlignedSequence};

/// Score carried by results that have no valid alignment.
pub const INVALID_SCORE: i32 = i32::MIN;

/// Completed results the ordered output may hold beyond the worker count.
pub const REORDER_SLACK: usize = 4;

#[derive(Debug, Error)]
pub enum AlignError {
    #[error("invalid alignment configuration: {0}")]
    Configuration(String),
    #[error("{output} was not requested for this alignment")]
    UnsupportedOutput { output: Output },
    #[error("pair {pair} has no valid alignment (band infeasible or below minimum score)")]
    NoValidAlignment { pair: usize },
    #[error("no gap at aligned position {position}")]
    GapStructure { position: usize },
    #[error("alignment matrix of {cells} cells exceeds the limit of {limit}")]
    SequenceTooLarge { cells: usize, limit: usize },
    #[error("alignment of pair {pair} failed: {reason}")]
    WorkerFailed { pair: usize, reason: String },
    #[error("failed to start alignment thread: {0}")]
    Spawn(#[from] std::io::Error),
}
