/// Which DP recurrence the engine evaluates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Method {
    /// Needleman-Wunsch: both sequences end to end.
    #[default]
    Global,
    /// Smith-Waterman: best-scoring pair of substrings.
    Local,
}

/// A diagonal strip of the DP matrix.
///
/// Diagonal `d` holds the cells with `column - row == d`, where columns walk
/// sequence 1 and rows walk sequence 2. A positive diagonal starts in the top
/// row, a negative one in the left column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Band {
    pub lower: isize,
    pub upper: isize,
}

impl Band {
    pub fn new(lower: isize, upper: isize) -> Self {
        Self { lower, upper }
    }

    #[inline]
    pub fn contains(&self, column: usize, row: usize) -> bool {
        let d = column as isize - row as isize;
        self.lower <= d && d <= self.upper
    }

    /// Rows of `column` that fall inside the band, clipped to `0..=rows`.
    pub(crate) fn rows(&self, column: usize, rows: usize) -> Option<(usize, usize)> {
        let c = column as isize;
        let first = (c - self.upper).max(0);
        let last = (c - self.lower).min(rows as isize);
        (first <= last).then(|| (first as usize, last as usize))
    }
}

/// Which leading and trailing gaps are scored as free.
///
/// Only meaningful for the global method. A leading gap in sequence 1 skips a
/// prefix of sequence 2 (the left column starts at zero); a trailing gap in
/// sequence 1 lets the alignment end anywhere in the last column. The flags
/// for sequence 2 mirror this on the top and bottom rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EndGaps {
    pub seq1_leading: bool,
    pub seq1_trailing: bool,
    pub seq2_leading: bool,
    pub seq2_trailing: bool,
}

impl EndGaps {
    /// Every end gap is scored.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn all() -> Self {
        Self {
            seq1_leading: true,
            seq1_trailing: true,
            seq2_leading: true,
            seq2_trailing: true,
        }
    }

    /// Sequence 1 may be placed anywhere inside sequence 2.
    pub fn seq1_ends() -> Self {
        Self {
            seq1_leading: true,
            seq1_trailing: true,
            ..Self::default()
        }
    }

    /// Sequence 2 may be placed anywhere inside sequence 1.
    pub fn seq2_ends() -> Self {
        Self {
            seq2_leading: true,
            seq2_trailing: true,
            ..Self::default()
        }
    }

    pub fn any(&self) -> bool {
        self.seq1_leading || self.seq1_trailing || self.seq2_leading || self.seq2_trailing
    }

    /// The same policy with the roles of the two sequences exchanged.
    pub fn swapped(&self) -> Self {
        Self {
            seq1_leading: self.seq2_leading,
            seq1_trailing: self.seq2_trailing,
            seq2_leading: self.seq1_leading,
            seq2_trailing: self.seq1_trailing,
        }
    }
}
