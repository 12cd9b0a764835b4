use std::marker::PhantomData;

use crate::alphabet::{Alphabet, AminoAcid};

/// Substitution scores between two symbols.
///
/// Positive scores mean similarity; callers pass negative values for penalties.
/// Implementations must answer in O(1) and are shared read-only across workers.
pub trait ScoringScheme<A>: Send + Sync {
    fn score(&self, a: A, b: A) -> i32;
}

/// Match/mismatch scoring for any alphabet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimpleScoring {
    pub match_score: i32,
    pub mismatch_score: i32,
}

impl SimpleScoring {
    pub fn new(match_score: i32, mismatch_score: i32) -> Self {
        Self {
            match_score,
            mismatch_score,
        }
    }

    /// Scores that turn a global alignment into negated edit distance.
    pub fn edit() -> Self {
        Self::new(0, -1)
    }
}

impl Default for SimpleScoring {
    fn default() -> Self {
        Self::edit()
    }
}

impl<A: Alphabet> ScoringScheme<A> for SimpleScoring {
    #[inline]
    fn score(&self, a: A, b: A) -> i32 {
        if a == b {
            self.match_score
        } else {
            self.mismatch_score
        }
    }
}

/// A full substitution matrix indexed by symbol rank.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatrixScoring<A> {
    scores: Vec<i32>,
    _alphabet: PhantomData<fn() -> A>,
}

impl<A: Alphabet> MatrixScoring<A> {
    /// Builds the matrix from `f` evaluated on every pair of symbols.
    pub fn from_fn(mut f: impl FnMut(A, A) -> i32) -> Self {
        let mut scores = vec![0; A::SIZE * A::SIZE];
        for r1 in 0..A::SIZE {
            for r2 in 0..A::SIZE {
                if let (Some(a), Some(b)) = (A::from_rank(r1), A::from_rank(r2)) {
                    scores[r1 * A::SIZE + r2] = f(a, b);
                }
            }
        }
        Self {
            scores,
            _alphabet: PhantomData,
        }
    }

    pub fn from_simple(simple: SimpleScoring) -> Self {
        Self::from_fn(|a, b| simple.score(a, b))
    }

    pub fn set_score(&mut self, a: A, b: A, score: i32) {
        self.scores[a.rank() * A::SIZE + b.rank()] = score;
    }

    pub fn is_symmetric(&self) -> bool {
        (0..A::SIZE).all(|r1| {
            (0..A::SIZE).all(|r2| self.scores[r1 * A::SIZE + r2] == self.scores[r2 * A::SIZE + r1])
        })
    }
}

impl<A: Alphabet> ScoringScheme<A> for MatrixScoring<A> {
    #[inline]
    fn score(&self, a: A, b: A) -> i32 {
        self.scores[a.rank() * A::SIZE + b.rank()]
    }
}

#[rustfmt::skip]
const BLOSUM62: [[i32; 20]; 20] = [
    [ 4, -1, -2, -2,  0, -1, -1,  0, -2, -1, -1, -1, -1, -2, -1,  1,  0, -3, -2,  0], // A
    [-1,  5,  0, -2, -3,  1,  0, -2,  0, -3, -2,  2, -1, -3, -2, -1, -1, -3, -2, -3], // R
    [-2,  0,  6,  1, -3,  0,  0,  0,  1, -3, -3,  0, -2, -3, -2,  1,  0, -4, -2, -3], // N
    [-2, -2,  1,  6, -3,  0,  2, -1, -1, -3, -4, -1, -3, -3, -1,  0, -1, -4, -3, -3], // D
    [ 0, -3, -3, -3,  9, -3, -4, -3, -3, -1, -1, -3, -1, -2, -3, -1, -1, -2, -2, -1], // C
    [-1,  1,  0,  0, -3,  5,  2, -2,  0, -3, -2,  1,  0, -3, -1,  0, -1, -2, -1, -2], // Q
    [-1,  0,  0,  2, -4,  2,  5, -2,  0, -3, -3,  1, -2, -3, -1,  0, -1, -3, -2, -2], // E
    [ 0, -2,  0, -1, -3, -2, -2,  6, -2, -4, -4, -2, -3, -3, -2,  0, -2, -2, -3, -3], // G
    [-2,  0,  1, -1, -3,  0,  0, -2,  8, -3, -3, -1, -2, -1, -2, -1, -2, -2,  2, -3], // H
    [-1, -3, -3, -3, -1, -3, -3, -4, -3,  4,  2, -3,  1,  0, -3, -2, -1, -3, -1,  3], // I
    [-1, -2, -3, -4, -1, -2, -3, -4, -3,  2,  4, -2,  2,  0, -3, -2, -1, -2, -1,  1], // L
    [-1,  2,  0, -1, -3,  1,  1, -2, -1, -3, -2,  5, -1, -3, -1,  0, -1, -3, -2, -2], // K
    [-1, -1, -2, -3, -1,  0, -2, -3, -2,  1,  2, -1,  5,  0, -2, -1, -1, -1, -1,  1], // M
    [-2, -3, -3, -3, -2, -3, -3, -3, -1,  0,  0, -3,  0,  6, -4, -2, -2,  1,  3, -1], // F
    [-1, -2, -2, -1, -3, -1, -1, -2, -2, -3, -3, -1, -2, -4,  7, -1, -1, -4, -3, -2], // P
    [ 1, -1,  1,  0, -1,  0,  0,  0, -1, -2, -2,  0, -1, -2, -1,  4,  1, -3, -2, -2], // S
    [ 0, -1,  0, -1, -1, -1, -1, -2, -2, -1, -1, -1, -1, -2, -1,  1,  5, -2, -2,  0], // T
    [-3, -3, -4, -4, -2, -2, -3, -2, -2, -3, -2, -3, -1,  1, -4, -3, -2, 11,  2, -3], // W
    [-2, -2, -2, -3, -2, -1, -2, -3,  2, -1, -1, -2, -1,  3, -3, -2, -2,  2,  7, -1], // Y
    [ 0, -3, -3, -3, -1, -2, -2, -3, -3,  3,  1, -2,  1, -1, -2, -2,  0, -3, -1,  4], // V
];

impl MatrixScoring<AminoAcid> {
    pub fn blosum62() -> Self {
        Self::from_fn(|a, b| BLOSUM62[a.rank()][b.rank()])
    }
}

/// Affine gap scores. A run of `k` gaps scores `open + k * extend`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GapScheme {
    pub open: i32,
    pub extend: i32,
}

impl GapScheme {
    pub fn new(open: i32, extend: i32) -> Self {
        Self { open, extend }
    }

    /// Linear gaps of `score` per position.
    pub fn linear(score: i32) -> Self {
        Self::new(0, score)
    }

    /// Score of a single contiguous run of `len` gaps, saturating at `i32::MIN`.
    pub fn run(&self, len: usize) -> i32 {
        if len == 0 {
            return 0;
        }
        let len = i32::try_from(len).unwrap_or(i32::MAX);
        self.open.saturating_add(len.saturating_mul(self.extend))
    }

    #[inline]
    pub(crate) fn first(&self) -> i32 {
        self.open.saturating_add(self.extend)
    }
}

impl Default for GapScheme {
    /// Edit-distance gaps: every gap position scores -1.
    fn default() -> Self {
        Self::linear(-1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alphabet::Dna4;

    #[test]
    fn simple_scoring_distinguishes_match_and_mismatch() {
        let s = SimpleScoring::new(4, -5);
        assert_eq!(ScoringScheme::<Dna4>::score(&s, Dna4::A, Dna4::A), 4);
        assert_eq!(ScoringScheme::<Dna4>::score(&s, Dna4::A, Dna4::T), -5);
        assert_eq!(ScoringScheme::<u8>::score(&s, b'x', b'x'), 4);
    }

    #[test]
    fn matrix_scoring_can_be_edited() {
        let mut m: MatrixScoring<Dna4> = MatrixScoring::from_simple(SimpleScoring::new(1, -1));
        assert!(m.is_symmetric());
        m.set_score(Dna4::A, Dna4::G, 0);
        assert_eq!(m.score(Dna4::A, Dna4::G), 0);
        assert_eq!(m.score(Dna4::G, Dna4::A), -1);
        assert!(!m.is_symmetric());
    }

    #[test]
    fn blosum62_lookups() {
        let m = MatrixScoring::<AminoAcid>::blosum62();
        let aa = |c| AminoAcid::from_char(c).unwrap();
        assert!(m.is_symmetric());
        assert_eq!(m.score(aa('W'), aa('W')), 11);
        assert_eq!(m.score(aa('C'), aa('C')), 9);
        assert_eq!(m.score(aa('I'), aa('V')), 3);
        assert_eq!(m.score(aa('D'), aa('L')), -4);
    }

    #[test]
    fn gap_runs_charge_open_once() {
        let g = GapScheme::new(-10, -1);
        assert_eq!(g.run(0), 0);
        assert_eq!(g.run(1), -11);
        assert_eq!(g.run(2), -12);
        assert_eq!(GapScheme::default().run(3), -3);
    }

    #[test]
    fn long_gap_runs_saturate() {
        let g = GapScheme::new(-10, -1_000_000);
        assert_eq!(g.run(5_000), i32::MIN);
        assert_eq!(g.run(usize::MAX), i32::MIN);
    }
}
