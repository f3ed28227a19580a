use std::time::Duration;

/// Which comparator orders the linkages after post-processing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CostModel {
  /// Violations, then unused words, then disjunct cost, then link length
  #[default]
  Standard,
  /// Corpus (statistical) cost first, falling back to `Standard`
  Corpus,
}

/// Options for a single parse call. Read-only during the parse.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseOptions {
  pub min_null_count: usize,
  pub max_null_count: usize,
  /// Most linkages to extract and post-process per parse
  pub linkage_limit: usize,
  /// Disjuncts costing more than this are dropped before counting
  pub disjunct_cost: f64,
  /// Length limit for connectors outside the unlimited set
  pub short_length: usize,
  /// Apply `short_length` to every connector
  pub all_short: bool,
  /// Allow linkages made of several disconnected components
  pub islands_ok: bool,
  /// Seed sampling from the sentence itself instead of the process seed
  pub repeatable_rand: bool,
  pub cost_model: CostModel,
  /// Sentences at least this long get a scan pass before post-processing
  pub twopass_length: usize,
  pub max_parse_time: Option<Duration>,
  pub max_memory: Option<usize>,
  /// Counts above this are reported as overflowed
  pub count_ceiling: u64,
  /// Keep linkages that fail the morphology check instead of discarding them
  pub display_morphism_violations: bool,
}

impl Default for ParseOptions {
  fn default() -> Self {
    Self {
      min_null_count: 0,
      max_null_count: 0,
      linkage_limit: 100,
      disjunct_cost: 2.7,
      short_length: 10,
      all_short: false,
      islands_ok: false,
      repeatable_rand: true,
      cost_model: CostModel::Standard,
      twopass_length: 30,
      max_parse_time: None,
      max_memory: None,
      count_ceiling: i32::MAX as u64,
      display_morphism_violations: false,
    }
  }
}

impl ParseOptions {
  /// Relaxed options for a last-resort parse after the normal ones found
  /// nothing: short links everywhere, islands and nulls allowed, a tight
  /// time budget and a small linkage limit.
  pub fn panic() -> Self {
    Self {
      min_null_count: 1,
      max_null_count: crate::error::MAX_SENTENCE,
      linkage_limit: 100,
      disjunct_cost: 4.0,
      short_length: 6,
      all_short: true,
      islands_ok: true,
      max_parse_time: Some(Duration::from_secs(60)),
      ..Self::default()
    }
  }

  pub fn with_null_range(mut self, min: usize, max: usize) -> Self {
    self.min_null_count = min;
    self.max_null_count = max;
    self
  }

  pub fn with_linkage_limit(mut self, limit: usize) -> Self {
    self.linkage_limit = limit;
    self
  }
}
