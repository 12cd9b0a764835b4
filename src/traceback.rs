use std::fmt;
use std::ops::Range;

use crate::alignment_mode::{EndGaps, Method};
use crate::alphabet::{Alphabet, Gapped, Sequence};
use crate::matrix::State;
use crate::result::Coordinate;
use crate::scoring::{GapScheme, ScoringScheme};
use crate::AlignError;

/// Column width of one block in the `Display` output.
const BLOCK_WIDTH: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Match,
    Mismatch,
    /// Gap in sequence 1.
    Insertion,
    /// Gap in sequence 2.
    Deletion,
}

/// Provenance of every cell, two bits per DP state.
///
/// Bits 0-1 hold the predecessor state of the match layer, bits 2-3 that of
/// the gap-in-sequence-2 layer and bits 4-5 that of the gap-in-sequence-1 layer.
#[derive(Debug, Clone)]
pub(crate) struct TraceMatrix {
    data: Vec<u8>,
    rows: usize,
}

impl TraceMatrix {
    pub fn new(cols: usize, rows: usize) -> Self {
        let start = pack(State::Start, State::Start, State::Start);
        Self {
            data: vec![start; rows * cols],
            rows,
        }
    }

    #[inline]
    pub fn set(&mut self, col: usize, row: usize, value: u8) {
        self.data[col * self.rows + row] = value;
    }

    #[inline]
    pub fn get(&self, col: usize, row: usize) -> u8 {
        self.data[col * self.rows + row]
    }

    /// State the optimum of `state` at (`col`, `row`) was reached from.
    pub fn predecessor(&self, col: usize, row: usize, state: State) -> State {
        let shift = match state {
            State::Match => 0,
            State::GapInSeq2 => 2,
            State::GapInSeq1 => 4,
            State::Start => return State::Start,
        };
        State::from_bits(self.get(col, row) >> shift)
    }
}

#[inline]
pub(crate) fn pack(m: State, x: State, y: State) -> u8 {
    m.bits() | x.bits() << 2 | y.bits() << 4
}

/// Two gap-annotated sequences of equal length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alignment<A> {
    pub seq1: Vec<Gapped<A>>,
    pub seq2: Vec<Gapped<A>>,
}

impl<A: Alphabet> Alignment<A> {
    pub fn len(&self) -> usize {
        self.seq1.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seq1.is_empty()
    }

    pub fn operations(&self) -> Vec<Operation> {
        self.seq1
            .iter()
            .zip(&self.seq2)
            .map(|(a, b)| match (a, b) {
                (Gapped::Gap, _) => Operation::Insertion,
                (_, Gapped::Gap) => Operation::Deletion,
                (a, b) if a == b => Operation::Match,
                _ => Operation::Mismatch,
            })
            .collect()
    }

    /// Scores the alignment column by column, charging `gap.open` once per run.
    ///
    /// A column with gaps in both rows scores nothing.
    pub fn rescore<Sc: ScoringScheme<A> + ?Sized>(&self, scoring: &Sc, gap: GapScheme) -> i32 {
        let mut score = 0;
        let mut in_gap1 = false;
        let mut in_gap2 = false;
        for (a, b) in self.seq1.iter().zip(&self.seq2) {
            match (a, b) {
                (Gapped::Symbol(a), Gapped::Symbol(b)) => {
                    score += scoring.score(*a, *b);
                    in_gap1 = false;
                    in_gap2 = false;
                }
                (Gapped::Gap, Gapped::Symbol(_)) => {
                    score += if in_gap1 { gap.extend } else { gap.first() };
                    in_gap1 = true;
                    in_gap2 = false;
                }
                (Gapped::Symbol(_), Gapped::Gap) => {
                    score += if in_gap2 { gap.extend } else { gap.first() };
                    in_gap1 = false;
                    in_gap2 = true;
                }
                (Gapped::Gap, Gapped::Gap) => {}
            }
        }
        score
    }
}

/// Writes blocks of 50 columns, each with a ruler and a `|` line marking
/// identical columns.
impl<A: Alphabet> fmt::Display for Alignment<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const INDENT: &str = "        ";
        let len = self.len();
        for start in (0..len).step_by(BLOCK_WIDTH) {
            if start != 0 {
                writeln!(f)?;
            }
            let end = (start + BLOCK_WIDTH).min(len);
            write!(f, "{start:>7} ")?;
            for col in 1..=end - start {
                let mark = if col % 10 == 0 {
                    ':'
                } else if col % 5 == 0 {
                    '.'
                } else {
                    ' '
                };
                write!(f, "{mark}")?;
            }
            write!(f, "\n{INDENT}")?;
            for s in &self.seq1[start..end] {
                write!(f, "{}", s.to_char())?;
            }
            write!(f, "\n{INDENT}")?;
            for (a, b) in self.seq1[start..end].iter().zip(&self.seq2[start..end]) {
                let mark = if a.to_char() == b.to_char() { '|' } else { ' ' };
                write!(f, "{mark}")?;
            }
            write!(f, "\n{INDENT}")?;
            for s in &self.seq2[start..end] {
                write!(f, "{}", s.to_char())?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Gap editing on an aligned sequence.
pub trait AlignedSequence {
    /// Inserts one gap before `position`.
    ///
    /// # Panics
    ///
    /// Panics if `position > len`.
    fn insert_gap(&mut self, position: usize) {
        self.insert_gaps(position, 1);
    }

    /// Inserts `count` gaps before `position`.
    ///
    /// # Panics
    ///
    /// Panics if `position > len`.
    fn insert_gaps(&mut self, position: usize, count: usize);

    /// Removes the gap at `position`; fails if there is no gap there.
    fn erase_gap(&mut self, position: usize) -> Result<(), AlignError> {
        self.erase_gaps(position..position + 1)
    }

    /// Removes every position of `range`, which must consist of gaps only.
    /// On failure the sequence is left unchanged.
    fn erase_gaps(&mut self, range: Range<usize>) -> Result<(), AlignError>;

    /// Number of non-gap symbols.
    fn ungapped_len(&self) -> usize;
}

impl<A: Alphabet> AlignedSequence for Vec<Gapped<A>> {
    fn insert_gaps(&mut self, position: usize, count: usize) {
        self.splice(position..position, std::iter::repeat(Gapped::Gap).take(count));
    }

    fn erase_gaps(&mut self, range: Range<usize>) -> Result<(), AlignError> {
        if range.start > range.end {
            return Err(AlignError::GapStructure {
                position: range.start,
            });
        }
        if let Some(position) = range
            .clone()
            .find(|&p| !self.get(p).map_or(false, Gapped::is_gap))
        {
            return Err(AlignError::GapStructure { position });
        }
        self.drain(range);
        Ok(())
    }

    fn ungapped_len(&self) -> usize {
        self.iter().filter(|s| !s.is_gap()).count()
    }
}

/// Walks the recorded provenance back from `end` in `state`.
///
/// Stops at the origin, at a local restart, or on a boundary whose gaps are
/// free. Every step consumes at least one symbol, so the walk terminates.
/// Returns the alignment and the coordinate the walk stopped at.
pub(crate) fn trace_back<S1, S2>(
    seq1: &S1,
    seq2: &S2,
    trace: &TraceMatrix,
    end: Coordinate,
    state: State,
    method: Method,
    end_gaps: EndGaps,
) -> (Alignment<S1::Symbol>, Coordinate)
where
    S1: Sequence + ?Sized,
    S2: Sequence<Symbol = S1::Symbol> + ?Sized,
{
    let local = method == Method::Local;
    let free_left = local || end_gaps.seq1_leading;
    let free_top = local || end_gaps.seq2_leading;

    let mut aligned1 = Vec::new();
    let mut aligned2 = Vec::new();
    let (mut col, mut row, mut state) = (end.column, end.row, state);

    loop {
        if (col == 0 && (row == 0 || free_left)) || (row == 0 && free_top) {
            break;
        }
        let next = trace.predecessor(col, row, state);
        match state {
            State::Match if col > 0 && row > 0 => {
                aligned1.push(Gapped::Symbol(seq1.symbol(col - 1)));
                aligned2.push(Gapped::Symbol(seq2.symbol(row - 1)));
                col -= 1;
                row -= 1;
            }
            State::GapInSeq2 if col > 0 => {
                aligned1.push(Gapped::Symbol(seq1.symbol(col - 1)));
                aligned2.push(Gapped::Gap);
                col -= 1;
            }
            State::GapInSeq1 if row > 0 => {
                aligned1.push(Gapped::Gap);
                aligned2.push(Gapped::Symbol(seq2.symbol(row - 1)));
                row -= 1;
            }
            _ => break,
        }
        state = next;
    }

    aligned1.reverse();
    aligned2.reverse();
    (
        Alignment {
            seq1: aligned1,
            seq2: aligned2,
        },
        Coordinate { column: col, row },
    )
}
