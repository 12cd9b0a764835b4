//! Symbol and sequence capabilities required by the aligner.
//!
//! The DP engine only needs three things from its inputs: symbol equality,
//! a rank usable as a scoring lookup key, and O(1) indexed access into a
//! sequence of known length. Everything else (parsing, file formats) lives
//! outside this crate.

use std::fmt;

/// A finite alphabet of alignable symbols.
pub trait Alphabet: Copy + Eq + fmt::Debug + Send + Sync + 'static {
    /// Number of distinct ranks.
    const SIZE: usize;

    fn rank(self) -> usize;
    fn from_rank(rank: usize) -> Option<Self>;
    fn to_char(self) -> char;
    fn from_char(c: char) -> Option<Self>;
}

/// Indexed, immutable access to a run of symbols.
pub trait Sequence {
    type Symbol: Alphabet;

    fn len(&self) -> usize;

    /// Symbol at `index`. Callers never pass `index >= len()`.
    fn symbol(&self, index: usize) -> Self::Symbol;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Identifier reported through the `sequence_ids` output, if any.
    fn id(&self) -> Option<&str> {
        None
    }
}

impl<A: Alphabet> Sequence for [A] {
    type Symbol = A;

    fn len(&self) -> usize {
        <[A]>::len(self)
    }

    #[inline]
    fn symbol(&self, index: usize) -> A {
        self[index]
    }
}

impl<A: Alphabet> Sequence for Vec<A> {
    type Symbol = A;

    fn len(&self) -> usize {
        Vec::len(self)
    }

    #[inline]
    fn symbol(&self, index: usize) -> A {
        self[index]
    }
}

impl<A: Alphabet, const N: usize> Sequence for [A; N] {
    type Symbol = A;

    fn len(&self) -> usize {
        N
    }

    #[inline]
    fn symbol(&self, index: usize) -> A {
        self[index]
    }
}

impl<S: Sequence + ?Sized> Sequence for &S {
    type Symbol = S::Symbol;

    fn len(&self) -> usize {
        (**self).len()
    }

    #[inline]
    fn symbol(&self, index: usize) -> Self::Symbol {
        (**self).symbol(index)
    }

    fn id(&self) -> Option<&str> {
        (**self).id()
    }
}

impl<S: Sequence + ?Sized> Sequence for std::sync::Arc<S> {
    type Symbol = S::Symbol;

    fn len(&self) -> usize {
        (**self).len()
    }

    #[inline]
    fn symbol(&self, index: usize) -> Self::Symbol {
        (**self).symbol(index)
    }

    fn id(&self) -> Option<&str> {
        (**self).id()
    }
}

/// A sequence paired with an identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Labeled<S> {
    pub id: String,
    pub seq: S,
}

impl<S> Labeled<S> {
    pub fn new(id: impl Into<String>, seq: S) -> Self {
        Self { id: id.into(), seq }
    }
}

impl<S: Sequence> Sequence for Labeled<S> {
    type Symbol = S::Symbol;

    fn len(&self) -> usize {
        self.seq.len()
    }

    #[inline]
    fn symbol(&self, index: usize) -> Self::Symbol {
        self.seq.symbol(index)
    }

    fn id(&self) -> Option<&str> {
        Some(&self.id)
    }
}

/// A symbol of an aligned sequence: either an alphabet symbol or a gap.
///
/// The gap lives outside the alphabet, so input sequences can never contain one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Gapped<A> {
    Symbol(A),
    Gap,
}

impl<A: Alphabet> Gapped<A> {
    pub const GAP_CHAR: char = '-';

    pub fn is_gap(&self) -> bool {
        matches!(self, Gapped::Gap)
    }

    pub fn symbol(&self) -> Option<A> {
        match *self {
            Gapped::Symbol(a) => Some(a),
            Gapped::Gap => None,
        }
    }

    pub fn to_char(self) -> char {
        match self {
            Gapped::Symbol(a) => a.to_char(),
            Gapped::Gap => Self::GAP_CHAR,
        }
    }
}

impl<A> From<A> for Gapped<A> {
    fn from(a: A) -> Self {
        Gapped::Symbol(a)
    }
}

/// Parses `text` into symbols of `A`, failing on the first unknown character.
pub fn parse<A: Alphabet>(text: &str) -> Option<Vec<A>> {
    text.chars().map(A::from_char).collect()
}

/// Four-letter DNA alphabet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Dna4 {
    A,
    C,
    G,
    T,
}

impl Alphabet for Dna4 {
    const SIZE: usize = 4;

    #[inline]
    fn rank(self) -> usize {
        self as usize
    }

    fn from_rank(rank: usize) -> Option<Self> {
        match rank {
            0 => Some(Dna4::A),
            1 => Some(Dna4::C),
            2 => Some(Dna4::G),
            3 => Some(Dna4::T),
            _ => None,
        }
    }

    fn to_char(self) -> char {
        match self {
            Dna4::A => 'A',
            Dna4::C => 'C',
            Dna4::G => 'G',
            Dna4::T => 'T',
        }
    }

    fn from_char(c: char) -> Option<Self> {
        match c.to_ascii_uppercase() {
            'A' => Some(Dna4::A),
            'C' => Some(Dna4::C),
            'G' => Some(Dna4::G),
            'T' | 'U' => Some(Dna4::T),
            _ => None,
        }
    }
}

/// Residue order shared by the amino acid ranks and the BLOSUM62 preset.
pub(crate) const AMINO_ACID_ORDER: &[u8; 20] = b"ARNDCQEGHILKMFPSTWYV";

/// The twenty standard amino acids, ranked in `ARNDCQEGHILKMFPSTWYV` order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AminoAcid(u8);

impl Alphabet for AminoAcid {
    const SIZE: usize = 20;

    #[inline]
    fn rank(self) -> usize {
        self.0 as usize
    }

    fn from_rank(rank: usize) -> Option<Self> {
        (rank < Self::SIZE).then(|| AminoAcid(rank as u8))
    }

    fn to_char(self) -> char {
        AMINO_ACID_ORDER[self.0 as usize] as char
    }

    fn from_char(c: char) -> Option<Self> {
        let c = c.to_ascii_uppercase();
        AMINO_ACID_ORDER
            .iter()
            .position(|&r| r as char == c)
            .map(|rank| AminoAcid(rank as u8))
    }
}

/// Raw bytes, for callers that have not decoded into a typed alphabet.
impl Alphabet for u8 {
    const SIZE: usize = 256;

    #[inline]
    fn rank(self) -> usize {
        self as usize
    }

    fn from_rank(rank: usize) -> Option<Self> {
        u8::try_from(rank).ok()
    }

    fn to_char(self) -> char {
        self as char
    }

    fn from_char(c: char) -> Option<Self> {
        u8::try_from(c).ok()
    }
}
