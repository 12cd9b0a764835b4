use std::fmt;
use std::ops::BitOr;

use crate::alignment_mode::{Band, EndGaps, Method};
use crate::scoring::GapScheme;
use crate::AlignError;

/// A single field an [`AlignmentResult`](crate::AlignmentResult) can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Output {
    Score,
    BeginPosition,
    EndPosition,
    Alignment,
    SequenceIds,
}

impl Output {
    const ALL: [Output; 5] = [
        Output::Score,
        Output::BeginPosition,
        Output::EndPosition,
        Output::Alignment,
        Output::SequenceIds,
    ];

    #[inline]
    fn bit(self) -> u8 {
        1 << self as u8
    }
}

impl fmt::Display for Output {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Output::Score => "score",
            Output::BeginPosition => "begin position",
            Output::EndPosition => "end position",
            Output::Alignment => "alignment",
            Output::SequenceIds => "sequence ids",
        };
        f.write_str(name)
    }
}

/// The set of requested outputs.
#[derive(Clone, Copy, PartialEq, Eq, Default)]
pub struct Outputs(u8);

impl Outputs {
    pub const NONE: Outputs = Outputs(0);
    pub const ALL: Outputs = Outputs(0b1_1111);

    pub fn contains(&self, output: Output) -> bool {
        self.0 & output.bit() != 0
    }

    pub fn with(self, output: Output) -> Self {
        Outputs(self.0 | output.bit())
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = Output> + '_ {
        Output::ALL.into_iter().filter(|o| self.contains(*o))
    }

    /// Begin positions are only known after walking the traceback.
    pub(crate) fn needs_traceback(&self) -> bool {
        self.contains(Output::Alignment) || self.contains(Output::BeginPosition)
    }
}

impl fmt::Debug for Outputs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl From<Output> for Outputs {
    fn from(output: Output) -> Self {
        Outputs::NONE.with(output)
    }
}

impl BitOr<Output> for Outputs {
    type Output = Outputs;

    fn bitor(self, rhs: Output) -> Outputs {
        self.with(rhs)
    }
}

impl BitOr for Output {
    type Output = Outputs;

    fn bitor(self, rhs: Output) -> Outputs {
        Outputs::from(self).with(rhs)
    }
}

/// How a batch is scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Execution {
    #[default]
    Serial,
    Parallel { threads: usize },
}

impl Execution {
    /// A pool sized to the available hardware parallelism.
    pub fn parallel() -> Self {
        let threads = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        Execution::Parallel { threads }
    }

    pub fn with_threads(threads: usize) -> Self {
        Execution::Parallel { threads }
    }

    pub fn threads(&self) -> usize {
        match *self {
            Execution::Serial => 1,
            Execution::Parallel { threads } => threads,
        }
    }
}

/// Validated, immutable alignment configuration shared by every pair of a batch.
#[derive(Debug, Clone)]
pub struct AlignConfig<Sc> {
    method: Method,
    band: Option<Band>,
    end_gaps: EndGaps,
    min_score: Option<i32>,
    outputs: Outputs,
    execution: Execution,
    scoring: Sc,
    gap: GapScheme,
    max_cells: Option<usize>,
}

impl<Sc> AlignConfig<Sc> {
    pub fn builder() -> AlignConfigBuilder<Sc> {
        AlignConfigBuilder::new()
    }

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn band(&self) -> Option<Band> {
        self.band
    }

    pub fn end_gaps(&self) -> EndGaps {
        self.end_gaps
    }

    pub fn min_score(&self) -> Option<i32> {
        self.min_score
    }

    pub fn outputs(&self) -> Outputs {
        self.outputs
    }

    pub fn execution(&self) -> Execution {
        self.execution
    }

    pub fn scoring(&self) -> &Sc {
        &self.scoring
    }

    pub fn gap(&self) -> GapScheme {
        self.gap
    }

    pub fn max_cells(&self) -> Option<usize> {
        self.max_cells
    }
}

/// Collects configuration elements; [`build`](Self::build) validates them once.
///
/// Setting the same element twice is recorded and reported by `build`.
#[derive(Debug)]
pub struct AlignConfigBuilder<Sc> {
    method: Option<Method>,
    band: Option<Band>,
    end_gaps: Option<EndGaps>,
    min_score: Option<i32>,
    outputs: Outputs,
    execution: Option<Execution>,
    scoring: Option<Sc>,
    gap: Option<GapScheme>,
    max_cells: Option<usize>,
    duplicates: Vec<String>,
}

impl<Sc> Default for AlignConfigBuilder<Sc> {
    fn default() -> Self {
        Self {
            method: None,
            band: None,
            end_gaps: None,
            min_score: None,
            outputs: Outputs::NONE,
            execution: None,
            scoring: None,
            gap: None,
            max_cells: None,
            duplicates: Vec::new(),
        }
    }
}

fn set_once<T>(slot: &mut Option<T>, value: T, name: &str, duplicates: &mut Vec<String>) {
    if slot.is_some() {
        duplicates.push(name.to_string());
    }
    *slot = Some(value);
}

impl<Sc> AlignConfigBuilder<Sc> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_method(mut self, method: Method) -> Self {
        set_once(&mut self.method, method, "method", &mut self.duplicates);
        self
    }

    pub fn with_band(mut self, band: Band) -> Self {
        set_once(&mut self.band, band, "band", &mut self.duplicates);
        self
    }

    pub fn with_end_gaps(mut self, end_gaps: EndGaps) -> Self {
        set_once(&mut self.end_gaps, end_gaps, "end gaps", &mut self.duplicates);
        self
    }

    pub fn with_min_score(mut self, min_score: i32) -> Self {
        set_once(&mut self.min_score, min_score, "min score", &mut self.duplicates);
        self
    }

    pub fn with_output(mut self, output: Output) -> Self {
        if self.outputs.contains(output) {
            self.duplicates.push(format!("output {output}"));
        }
        self.outputs = self.outputs.with(output);
        self
    }

    pub fn with_outputs(self, outputs: impl Into<Outputs>) -> Self {
        outputs.into().iter().fold(self, |b, o| b.with_output(o))
    }

    pub fn with_execution(mut self, execution: Execution) -> Self {
        set_once(&mut self.execution, execution, "execution", &mut self.duplicates);
        self
    }

    pub fn with_scoring(mut self, scoring: Sc) -> Self {
        set_once(&mut self.scoring, scoring, "scoring scheme", &mut self.duplicates);
        self
    }

    pub fn with_gap(mut self, gap: GapScheme) -> Self {
        set_once(&mut self.gap, gap, "gap scheme", &mut self.duplicates);
        self
    }

    /// Rejects pairs whose traceback matrix would hold more than `cells` cells.
    pub fn with_max_cells(mut self, cells: usize) -> Self {
        set_once(&mut self.max_cells, cells, "max cells", &mut self.duplicates);
        self
    }

    pub fn build(self) -> Result<AlignConfig<Sc>, AlignError> {
        if let Some(name) = self.duplicates.first() {
            return Err(AlignError::Configuration(format!(
                "{name} is configured more than once"
            )));
        }
        let scoring = self.scoring.ok_or_else(|| {
            AlignError::Configuration("a scoring scheme must be configured".to_string())
        })?;
        let method = self.method.unwrap_or_default();
        let end_gaps = self.end_gaps.unwrap_or_default();
        if method == Method::Local && end_gaps.any() {
            return Err(AlignError::Configuration(
                "free end gaps cannot be combined with local alignment".to_string(),
            ));
        }
        if let Some(band) = self.band {
            if band.lower > band.upper {
                return Err(AlignError::Configuration(format!(
                    "band lower diagonal {} exceeds upper diagonal {}",
                    band.lower, band.upper
                )));
            }
        }
        let execution = self.execution.unwrap_or_default();
        if execution.threads() == 0 {
            return Err(AlignError::Configuration(
                "parallel execution needs at least one thread".to_string(),
            ));
        }
        let outputs = if self.outputs.is_empty() {
            Outputs::ALL
        } else {
            self.outputs
        };

        Ok(AlignConfig {
            method,
            band: self.band,
            end_gaps,
            min_score: self.min_score,
            outputs,
            execution,
            scoring,
            gap: self.gap.unwrap_or_default(),
            max_cells: self.max_cells,
        })
    }
}
