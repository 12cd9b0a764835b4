use crate::config::{Output, Outputs};
use crate::traceback::Alignment;
use crate::{AlignError, INVALID_SCORE};

/// A cell of the DP matrix: `column` indexes sequence 1, `row` sequence 2.
///
/// Both count symbols consumed, so a begin coordinate is the first aligned
/// position and an end coordinate is one past the last.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Coordinate {
    pub column: usize,
    pub row: usize,
}

impl Coordinate {
    pub fn new(column: usize, row: usize) -> Self {
        Self { column, row }
    }
}

/// Everything one DP pass produced, before filtering by requested outputs.
#[derive(Debug)]
pub(crate) struct Computed<A> {
    pub score: i32,
    pub end: Coordinate,
    pub begin: Option<Coordinate>,
    pub alignment: Option<Alignment<A>>,
}

/// The outcome of aligning one pair.
///
/// Only fields named in the configured outputs are kept. Reading any other
/// field fails with [`AlignError::UnsupportedOutput`]. A pair without a valid
/// alignment still yields a result; its score is [`INVALID_SCORE`] and its
/// coordinates and alignment are unavailable.
#[derive(Debug, Clone)]
pub struct AlignmentResult<A> {
    pair_index: usize,
    outputs: Outputs,
    valid: bool,
    score: i32,
    begin: Option<Coordinate>,
    end: Option<Coordinate>,
    alignment: Option<Alignment<A>>,
    ids: Option<(String, String)>,
}

impl<A> AlignmentResult<A> {
    /// Packages `computed` (or its absence) keeping only the requested outputs.
    pub(crate) fn assemble(
        pair_index: usize,
        outputs: Outputs,
        computed: Option<Computed<A>>,
        ids: (String, String),
    ) -> Self {
        let keep = |output| outputs.contains(output);
        let ids = keep(Output::SequenceIds).then_some(ids);
        match computed {
            Some(c) => Self {
                pair_index,
                outputs,
                valid: true,
                score: c.score,
                begin: c.begin.filter(|_| keep(Output::BeginPosition)),
                end: Some(c.end).filter(|_| keep(Output::EndPosition)),
                alignment: c.alignment.filter(|_| keep(Output::Alignment)),
                ids,
            },
            None => Self {
                pair_index,
                outputs,
                valid: false,
                score: INVALID_SCORE,
                begin: None,
                end: None,
                alignment: None,
                ids,
            },
        }
    }

    fn require(&self, output: Output) -> Result<(), AlignError> {
        if self.outputs.contains(output) {
            Ok(())
        } else {
            Err(AlignError::UnsupportedOutput { output })
        }
    }

    fn require_valid(&self, output: Output) -> Result<(), AlignError> {
        self.require(output)?;
        if self.valid {
            Ok(())
        } else {
            Err(AlignError::NoValidAlignment {
                pair: self.pair_index,
            })
        }
    }

    /// Position of the pair in its input batch.
    pub fn pair_index(&self) -> usize {
        self.pair_index
    }

    pub fn outputs(&self) -> Outputs {
        self.outputs
    }

    /// False if the band or minimum score left no admissible alignment.
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// The optimal score, or [`INVALID_SCORE`] for a pair with no valid alignment.
    pub fn score(&self) -> Result<i32, AlignError> {
        self.require(Output::Score)?;
        Ok(self.score)
    }

    pub fn begin_position(&self) -> Result<Coordinate, AlignError> {
        self.require_valid(Output::BeginPosition)?;
        Ok(self.begin.unwrap_or_default())
    }

    pub fn end_position(&self) -> Result<Coordinate, AlignError> {
        self.require_valid(Output::EndPosition)?;
        Ok(self.end.unwrap_or_default())
    }

    pub fn alignment(&self) -> Result<&Alignment<A>, AlignError> {
        self.require_valid(Output::Alignment)?;
        self.alignment.as_ref().ok_or(AlignError::NoValidAlignment {
            pair: self.pair_index,
        })
    }

    pub fn into_alignment(self) -> Result<Alignment<A>, AlignError> {
        self.require_valid(Output::Alignment)?;
        let pair = self.pair_index;
        self.alignment.ok_or(AlignError::NoValidAlignment { pair })
    }

    pub fn sequence1_id(&self) -> Result<&str, AlignError> {
        self.require(Output::SequenceIds)?;
        Ok(self.ids.as_ref().map_or("", |(id, _)| id.as_str()))
    }

    pub fn sequence2_id(&self) -> Result<&str, AlignError> {
        self.require(Output::SequenceIds)?;
        Ok(self.ids.as_ref().map_or("", |(_, id)| id.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alphabet::{Dna4, Gapped};

    fn computed() -> Computed<Dna4> {
        Computed {
            score: 7,
            end: Coordinate::new(4, 3),
            begin: Some(Coordinate::new(1, 0)),
            alignment: Some(Alignment {
                seq1: vec![Gapped::Symbol(Dna4::A)],
                seq2: vec![Gapped::Symbol(Dna4::A)],
            }),
        }
    }

    fn ids() -> (String, String) {
        ("r1".to_string(), "r2".to_string())
    }

    #[test]
    fn score_only_result_rejects_alignment_access() {
        let result = AlignmentResult::assemble(0, Output::Score.into(), Some(computed()), ids());
        assert_eq!(result.score().unwrap(), 7);
        assert!(matches!(
            result.alignment(),
            Err(AlignError::UnsupportedOutput {
                output: Output::Alignment
            })
        ));
        assert!(result.begin_position().is_err());
        assert!(result.sequence1_id().is_err());
    }

    #[test]
    fn all_outputs_are_readable() {
        let result = AlignmentResult::assemble(3, Outputs::ALL, Some(computed()), ids());
        assert_eq!(result.pair_index(), 3);
        assert_eq!(result.begin_position().unwrap(), Coordinate::new(1, 0));
        assert_eq!(result.end_position().unwrap(), Coordinate::new(4, 3));
        assert_eq!(result.alignment().unwrap().len(), 1);
        assert_eq!(result.sequence1_id().unwrap(), "r1");
        assert_eq!(result.sequence2_id().unwrap(), "r2");
    }

    #[test]
    fn invalid_result_carries_sentinel_score() {
        let result = AlignmentResult::<Dna4>::assemble(5, Outputs::ALL, None, ids());
        assert!(!result.is_valid());
        assert_eq!(result.score().unwrap(), INVALID_SCORE);
        assert!(matches!(
            result.alignment(),
            Err(AlignError::NoValidAlignment { pair: 5 })
        ));
        assert!(matches!(
            result.end_position(),
            Err(AlignError::NoValidAlignment { pair: 5 })
        ));
    }

    #[test]
    fn unrequested_output_wins_over_invalid() {
        let result = AlignmentResult::<Dna4>::assemble(1, Output::Score.into(), None, ids());
        assert!(matches!(
            result.end_position(),
            Err(AlignError::UnsupportedOutput { .. })
        ));
    }
}
