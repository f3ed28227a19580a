//! Hooks for global grammar checks and corpus statistics, applied to
//! linkages after extraction.

use crate::linkage::Linkage;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostProcessResult {
  Accept,
  /// The linkage breaks a rule; the message names it
  Violation(String),
}

/// Global constraints a linkage must satisfy beyond local connector matching.
pub trait PostProcessor {
  /// First pass over candidate linkages of long sentences, to let the
  /// processor narrow its rule set before `process` runs.
  fn scan(&mut self, _linkage: &Linkage) {}

  fn process(&mut self, linkage: &Linkage) -> PostProcessResult;
}

/// Accepts every linkage.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPostProcessing;

impl PostProcessor for NoPostProcessing {
  fn process(&mut self, _linkage: &Linkage) -> PostProcessResult {
    PostProcessResult::Accept
  }
}

impl<F> PostProcessor for F
where
  F: FnMut(&Linkage) -> PostProcessResult,
{
  fn process(&mut self, linkage: &Linkage) -> PostProcessResult {
    self(linkage)
  }
}

/// Statistical cost of a linkage, used by the corpus cost model.
pub trait CorpusScorer {
  fn score(&self, linkage: &Linkage) -> f64;
}

impl<F> CorpusScorer for F
where
  F: Fn(&Linkage) -> f64,
{
  fn score(&self, linkage: &Linkage) -> f64 {
    self(linkage)
  }
}
