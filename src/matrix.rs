//! The affine-gap DP engine.
//!
//! Three layers are evaluated per cell (match, gap in sequence 2, gap in
//! sequence 1) over columns of sequence 1 and rows of sequence 2. Scores live
//! in a single rolling column; provenance is kept for the full matrix only
//! when a traceback is needed.
//!
//! Ties between predecessors are broken in a fixed order: match first, then
//! gap in sequence 2, then gap in sequence 1.

use log::trace;

use crate::alignment_mode::{Band, EndGaps, Method};
use crate::alphabet::Sequence;
use crate::config::AlignConfig;
use crate::result::Coordinate;
use crate::scoring::{GapScheme, ScoringScheme};
use crate::traceback::{pack, TraceMatrix};

/// Score of an unreachable cell.
pub(crate) const NEG_INF: i32 = i32::MIN / 2;

#[inline]
fn plus(score: i32, delta: i32) -> i32 {
    if score <= NEG_INF {
        NEG_INF
    } else {
        score.saturating_add(delta).max(NEG_INF)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum State {
    Match = 0,
    /// Consumes a symbol of sequence 1 against a gap.
    GapInSeq2 = 1,
    /// Consumes a symbol of sequence 2 against a gap.
    GapInSeq1 = 2,
    Start = 3,
}

impl State {
    #[inline]
    pub fn bits(self) -> u8 {
        self as u8
    }

    #[inline]
    pub fn from_bits(bits: u8) -> Self {
        match bits & 0b11 {
            0 => State::Match,
            1 => State::GapInSeq2,
            2 => State::GapInSeq1,
            _ => State::Start,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Cell {
    m: i32,
    x: i32,
    y: i32,
}

impl Cell {
    const UNREACHABLE: Cell = Cell {
        m: NEG_INF,
        x: NEG_INF,
        y: NEG_INF,
    };

    /// A boundary cell that alignments may start from at no cost.
    const FREE: Cell = Cell {
        m: 0,
        x: NEG_INF,
        y: NEG_INF,
    };

    #[inline]
    fn best(&self) -> (State, i32) {
        pick(self.m, self.x, self.y)
    }
}

/// First maximum among the three layers, in tie-breaking order.
#[inline]
fn pick(m: i32, x: i32, y: i32) -> (State, i32) {
    let mut best = (State::Match, m);
    if x > best.1 {
        best = (State::GapInSeq2, x);
    }
    if y > best.1 {
        best = (State::GapInSeq1, y);
    }
    best
}

/// The cell an optimal alignment ends in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Optimum {
    pub score: i32,
    pub end: Coordinate,
    pub state: State,
}

impl Optimum {
    fn offer(best: &mut Option<Optimum>, column: usize, row: usize, cell: Cell) {
        let (state, score) = cell.best();
        if score > NEG_INF && best.map_or(true, |b| score > b.score) {
            *best = Some(Optimum {
                score,
                end: Coordinate { column, row },
                state,
            });
        }
    }
}

#[derive(Debug)]
pub(crate) struct DpRun {
    /// `None` if no admissible path reaches an end cell.
    pub optimum: Option<Optimum>,
    pub trace: Option<TraceMatrix>,
}

/// Parameters of one DP pass, borrowed from the shared configuration.
pub(crate) struct DpMatrix<'a, Sc> {
    scoring: &'a Sc,
    method: Method,
    band: Option<Band>,
    end_gaps: EndGaps,
    gap: GapScheme,
}

impl<'a, Sc> DpMatrix<'a, Sc> {
    pub fn new(config: &'a AlignConfig<Sc>) -> Self {
        Self {
            scoring: config.scoring(),
            method: config.method(),
            band: config.band(),
            end_gaps: config.end_gaps(),
            gap: config.gap(),
        }
    }

    #[inline]
    fn in_band(&self, column: usize, row: usize) -> bool {
        self.band.map_or(true, |b| b.contains(column, row))
    }

    #[inline]
    fn band_rows(&self, column: usize, rows: usize) -> Option<(usize, usize)> {
        match self.band {
            Some(b) => b.rows(column, rows),
            None => Some((0, rows)),
        }
    }

    /// Fills the matrix for `seq1` (columns) against `seq2` (rows).
    pub fn fill<S1, S2>(&self, seq1: &S1, seq2: &S2, keep_trace: bool) -> DpRun
    where
        S1: Sequence + ?Sized,
        S2: Sequence<Symbol = S1::Symbol> + ?Sized,
        Sc: ScoringScheme<S1::Symbol>,
    {
        let cols = seq1.len();
        let rows = seq2.len();
        let local = self.method == Method::Local;
        let first = self.gap.first();
        let extend = self.gap.extend;
        let free_left = local || self.end_gaps.seq1_leading;
        let free_top = local || self.end_gaps.seq2_leading;
        let origin = self.in_band(0, 0);
        trace!(
            "filling {}x{} matrix ({:?}, band {:?}, traceback {})",
            cols + 1,
            rows + 1,
            self.method,
            self.band,
            keep_trace
        );

        let mut trace = keep_trace.then(|| TraceMatrix::new(cols + 1, rows + 1));
        let mut column = vec![Cell::UNREACHABLE; rows + 1];
        let mut last_row = if !local && self.end_gaps.seq2_trailing {
            vec![Cell::UNREACHABLE; cols + 1]
        } else {
            Vec::new()
        };
        let mut local_best = Optimum {
            score: 0,
            end: Coordinate::default(),
            state: State::Start,
        };

        // Left column: gaps in sequence 1 accumulate from the origin unless free.
        if let Some((lo, hi)) = self.band_rows(0, rows) {
            for (r, cell) in column.iter_mut().enumerate().take(hi + 1).skip(lo) {
                *cell = if r == 0 || free_left {
                    Cell::FREE
                } else if origin {
                    if let Some(t) = trace.as_mut() {
                        let from = if r > 1 { State::GapInSeq1 } else { State::Match };
                        t.set(0, r, pack(State::Start, State::Start, from));
                    }
                    Cell {
                        y: self.gap.run(r).max(NEG_INF),
                        ..Cell::UNREACHABLE
                    }
                } else {
                    Cell::UNREACHABLE
                };
            }
            if !last_row.is_empty() && hi == rows {
                last_row[0] = column[rows];
            }
        }

        for c in 1..=cols {
            let Some((lo, hi)) = self.band_rows(c, rows) else {
                continue;
            };
            let a = seq1.symbol(c - 1);
            // `column` still holds column c - 1 at rows >= r while row r is computed.
            let mut diag = if lo > 0 { column[lo - 1] } else { Cell::UNREACHABLE };
            let mut up = Cell::UNREACHABLE;
            let mut start = lo;

            if lo == 0 {
                let cell = if free_top {
                    Cell::FREE
                } else if origin {
                    if let Some(t) = trace.as_mut() {
                        let from = if c > 1 { State::GapInSeq2 } else { State::Match };
                        t.set(c, 0, pack(State::Start, from, State::Start));
                    }
                    Cell {
                        x: self.gap.run(c).max(NEG_INF),
                        ..Cell::UNREACHABLE
                    }
                } else {
                    Cell::UNREACHABLE
                };
                diag = column[0];
                column[0] = cell;
                up = cell;
                start = 1;
                if !last_row.is_empty() && rows == 0 {
                    last_row[c] = cell;
                }
            }

            for r in start..=hi {
                let b = seq2.symbol(r - 1);
                let left = column[r];

                let (m_from, base) = match diag.best() {
                    (_, base) if local && base <= 0 => (State::Start, 0),
                    best => best,
                };
                let m = plus(base, self.scoring.score(a, b));
                let (x_from, x) = pick(
                    plus(left.m, first),
                    plus(left.x, extend),
                    plus(left.y, first),
                );
                let (y_from, y) = pick(plus(up.m, first), plus(up.x, first), plus(up.y, extend));

                let cell = Cell { m, x, y };
                if let Some(t) = trace.as_mut() {
                    t.set(c, r, pack(m_from, x_from, y_from));
                }
                if local {
                    let (state, score) = cell.best();
                    if score > local_best.score {
                        local_best = Optimum {
                            score,
                            end: Coordinate { column: c, row: r },
                            state,
                        };
                    }
                }
                diag = left;
                column[r] = cell;
                up = cell;
            }

            if !last_row.is_empty() && hi == rows && rows > 0 {
                last_row[c] = column[rows];
            }
        }

        let optimum = if local {
            Some(local_best)
        } else {
            self.global_optimum(&column, &last_row, cols, rows)
        };
        DpRun { optimum, trace }
    }

    /// Corner first, then the freed last column, then the freed last row.
    fn global_optimum(
        &self,
        column: &[Cell],
        last_row: &[Cell],
        cols: usize,
        rows: usize,
    ) -> Option<Optimum> {
        let mut best = None;
        if self.in_band(cols, rows) {
            Optimum::offer(&mut best, cols, rows, column[rows]);
        }
        if self.end_gaps.seq1_trailing {
            if let Some((lo, hi)) = self.band_rows(cols, rows) {
                for r in lo..=hi {
                    Optimum::offer(&mut best, cols, r, column[r]);
                }
            }
        }
        if self.end_gaps.seq2_trailing {
            for (c, cell) in last_row.iter().enumerate() {
                if self.in_band(c, rows) {
                    Optimum::offer(&mut best, c, rows, *cell);
                }
            }
        }
        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alphabet::{parse, Dna4};
    use crate::config::AlignConfigBuilder;
    use crate::scoring::{GapScheme, SimpleScoring};

    fn dna(text: &str) -> Vec<Dna4> {
        parse(text).unwrap()
    }

    fn config(
        build: impl FnOnce(AlignConfigBuilder<SimpleScoring>) -> AlignConfigBuilder<SimpleScoring>,
    ) -> AlignConfig<SimpleScoring> {
        build(AlignConfig::builder()).build().unwrap()
    }

    fn optimum(config: &AlignConfig<SimpleScoring>, a: &str, b: &str) -> Option<Optimum> {
        DpMatrix::new(config).fill(&dna(a), &dna(b), false).optimum
    }

    #[test]
    fn pick_prefers_match_then_gap_in_seq2() {
        assert_eq!(pick(1, 1, 1), (State::Match, 1));
        assert_eq!(pick(0, 1, 1), (State::GapInSeq2, 1));
        assert_eq!(pick(0, 0, 1), (State::GapInSeq1, 1));
        assert_eq!(pick(NEG_INF, NEG_INF, NEG_INF), (State::Match, NEG_INF));
    }

    #[test]
    fn unreachable_scores_stay_unreachable() {
        assert_eq!(plus(NEG_INF, -5), NEG_INF);
        assert_eq!(plus(NEG_INF, 100), NEG_INF);
        assert_eq!(plus(3, -5), -2);
        assert_eq!(plus(NEG_INF + 1, i32::MIN), NEG_INF);
    }

    #[test]
    fn local_fixture_score_and_end() {
        let config = config(|b| {
            b.with_method(Method::Local)
                .with_scoring(SimpleScoring::new(4, -5))
                .with_gap(GapScheme::new(-10, -1))
        });
        let best = optimum(&config, "AACCGGTTTAACCGGTT", "ACGTCTACGTA").unwrap();
        assert_eq!(best.score, 11);
        assert_eq!(best.end, Coordinate::new(10, 7));
        assert_eq!(best.state, State::Match);
    }

    #[test]
    fn global_edit_distance() {
        let config = config(|b| b.with_scoring(SimpleScoring::edit()));
        assert_eq!(optimum(&config, "ACGTT", "AGTTA").unwrap().score, -2);
        assert_eq!(optimum(&config, "", "ACG").unwrap().score, -3);
        assert_eq!(optimum(&config, "", "").unwrap().score, 0);
    }

    #[test]
    fn global_boundary_charges_one_open_per_run() {
        let config = config(|b| {
            b.with_scoring(SimpleScoring::new(2, -1))
                .with_gap(GapScheme::new(-5, -1))
        });
        assert_eq!(optimum(&config, "ACGT", "").unwrap().score, -9);
        assert_eq!(optimum(&config, "", "AC").unwrap().score, -7);
    }

    #[test]
    fn huge_gap_penalties_do_not_overflow() {
        let config = config(|b| {
            b.with_scoring(SimpleScoring::new(2, -1))
                .with_gap(GapScheme::new(-10, -400_000_000))
        });
        assert!(optimum(&config, "ACGTACGT", "").is_none());
        assert_eq!(optimum(&config, "ACGT", "ACGT").unwrap().score, 8);
    }

    #[test]
    fn free_trailing_gaps_end_inside_last_column() {
        let config = config(|b| {
            b.with_scoring(SimpleScoring::new(2, -1))
                .with_gap(GapScheme::new(-5, -1))
                .with_end_gaps(EndGaps::seq1_ends())
        });
        let best = optimum(&config, "ACGT", "AACGTT").unwrap();
        assert_eq!(best.score, 8);
        assert_eq!(best.end, Coordinate::new(4, 5));
    }

    #[test]
    fn band_excluding_the_corner_is_infeasible() {
        let config = config(|b| {
            b.with_scoring(SimpleScoring::new(2, -1))
                .with_gap(GapScheme::new(-2, -1))
                .with_band(Band::new(0, 1))
        });
        assert!(optimum(&config, "ACGT", "ACGTTTTT").is_none());
    }

    #[test]
    fn band_excluding_the_origin_is_infeasible() {
        let config = config(|b| {
            b.with_scoring(SimpleScoring::new(2, -1))
                .with_band(Band::new(1, 3))
        });
        assert!(optimum(&config, "ACGT", "ACG").is_none());
    }

    #[test]
    fn wide_band_matches_unbanded() {
        let plain = config(|b| {
            b.with_scoring(SimpleScoring::new(2, -1))
                .with_gap(GapScheme::new(-2, -1))
        });
        let banded = config(|b| {
            b.with_scoring(SimpleScoring::new(2, -1))
                .with_gap(GapScheme::new(-2, -1))
                .with_band(Band::new(-5, 1))
        });
        let a = "ACGT";
        let b = "ACGTTTTT";
        assert_eq!(optimum(&plain, a, b).unwrap().score, 2);
        assert_eq!(optimum(&banded, a, b).unwrap().score, 2);
    }

    #[test]
    fn local_without_similarity_scores_zero() {
        let config = config(|b| {
            b.with_method(Method::Local)
                .with_scoring(SimpleScoring::new(1, -1))
        });
        let best = optimum(&config, "AAAA", "TTTT").unwrap();
        assert_eq!(best.score, 0);
        assert_eq!(best.state, State::Start);
        assert_eq!(best.end, Coordinate::default());
    }

    #[test]
    fn trace_is_only_kept_on_request() {
        let config = config(|b| b.with_scoring(SimpleScoring::edit()));
        let dp = DpMatrix::new(&config);
        assert!(dp.fill(&dna("AC"), &dna("AG"), false).trace.is_none());
        assert!(dp.fill(&dna("AC"), &dna("AG"), true).trace.is_some());
    }
}
