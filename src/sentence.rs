use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use regex::Regex;
use tracing::{debug, info, warn};

use crate::count::{Count, CountContext};
use crate::disjunct::Word;
use crate::error::{ParseError, MAX_SENTENCE};
use crate::extract::extract_linkage;
use crate::fast_match::Matcher;
use crate::linkage::Linkage;
use crate::morphism::{sane_morphism, MORPHISM_VIOLATION};
use crate::options::ParseOptions;
use crate::postprocess::{CorpusScorer, NoPostProcessing, PostProcessResult, PostProcessor};
use crate::prepare::prepare_words;
use crate::ranking::sort_linkages;
use crate::resources::Resources;
use crate::select::{sampling_seed, select_linkages};

/// Sampling state handed from dropped sentences to new ones. Races only
/// shuffle which state a sentence starts from.
static GLOBAL_RAND_STATE: AtomicU64 = AtomicU64::new(0);

/// Where a parse call got to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseStage {
  Unparsed,
  Counting { null_count: usize },
  NoSolution { null_count: usize },
  Selected,
  Extracted,
  PostProcessed,
  Ranked,
  Done,
}

/// A tokenized sentence and the results of its latest parse.
#[derive(Debug)]
pub struct Sentence {
  words: Vec<Word>,
  unlimited: Option<Vec<String>>,
  morpheme_regex: Option<Regex>,
  resources: Resources,
  linkages: Vec<Linkage>,
  num_linkages_found: Count,
  num_valid_linkages: usize,
  num_linkages_post_processed: usize,
  null_count: usize,
  stage: ParseStage,
  rand_state: u64,
}

impl Sentence {
  pub fn new(words: Vec<Word>) -> Self {
    Self {
      words,
      unlimited: None,
      morpheme_regex: None,
      resources: Resources::unlimited(),
      linkages: Vec::new(),
      num_linkages_found: Count::ZERO,
      num_valid_linkages: 0,
      num_linkages_post_processed: 0,
      null_count: 0,
      stage: ParseStage::Unparsed,
      rand_state: GLOBAL_RAND_STATE.load(Ordering::Relaxed),
    }
  }

  /// Connector labels that are exempt from the short length limit.
  pub fn with_unlimited_connectors(mut self, labels: Vec<String>) -> Self {
    self.unlimited = Some(labels);
    self
  }

  /// Pattern the morpheme type sequence of a null-free linkage must match.
  pub fn with_morpheme_regex(mut self, regex: Regex) -> Self {
    self.morpheme_regex = Some(regex);
    self
  }

  pub fn length(&self) -> usize {
    self.words.len()
  }

  pub fn words(&self) -> &[Word] {
    &self.words
  }

  pub fn num_linkages_found(&self) -> Count {
    self.num_linkages_found
  }

  pub fn num_valid_linkages(&self) -> usize {
    self.num_valid_linkages
  }

  pub fn num_linkages_post_processed(&self) -> usize {
    self.num_linkages_post_processed
  }

  pub fn null_count(&self) -> usize {
    self.null_count
  }

  pub fn stage(&self) -> ParseStage {
    self.stage
  }

  pub fn resources(&self) -> &Resources {
    &self.resources
  }

  pub fn timer_expired(&self) -> bool {
    self.resources.time_expired()
  }

  pub fn memory_exhausted(&self) -> bool {
    self.resources.memory_exhausted()
  }

  /// Ranked linkages, best first; discarded ones are not kept.
  pub fn linkages(&self) -> &[Linkage] {
    &self.linkages
  }

  pub fn linkage(&self, idx: usize) -> Option<&Linkage> {
    self.linkages.get(idx)
  }

  /// Parses with no post-processing. Returns the number of valid linkages.
  pub fn parse(&mut self, opts: &ParseOptions) -> Result<usize, ParseError> {
    self.parse_with(opts, &mut NoPostProcessing, None)
  }

  pub fn parse_with(
    &mut self,
    opts: &ParseOptions,
    pp: &mut dyn PostProcessor,
    scorer: Option<&dyn CorpusScorer>,
  ) -> Result<usize, ParseError> {
    let resources = Resources::new(opts.max_parse_time, opts.max_memory);
    let result = self.run(opts, pp, scorer, &resources);
    resources.stop();
    self.resources = resources;
    self.stage = ParseStage::Done;
    result
  }

  /// Parses without nulls, then allowing any number of null words, then
  /// with the relaxed panic options, stopping at the first attempt that
  /// finds a valid linkage.
  pub fn parse_with_fallback(
    &mut self,
    opts: &ParseOptions,
    pp: &mut dyn PostProcessor,
    scorer: Option<&dyn CorpusScorer>,
  ) -> Result<usize, ParseError> {
    let strict = opts.clone().with_null_range(0, 0);
    let found = self.parse_with(&strict, pp, scorer)?;
    if found > 0 {
      return Ok(found);
    }

    if !self.resources.exhausted() {
      let relaxed = opts.clone().with_null_range(1, self.length());
      let found = self.parse_with(&relaxed, pp, scorer)?;
      if found > 0 {
        return Ok(found);
      }
    }

    info!(length = self.length(), "no complete linkage, trying panic parse");
    let panic = ParseOptions {
      max_null_count: self.length(),
      cost_model: opts.cost_model,
      ..ParseOptions::panic()
    };
    self.parse_with(&panic, pp, scorer)
  }

  fn reset(&mut self) {
    self.linkages.clear();
    self.num_linkages_found = Count::ZERO;
    self.num_valid_linkages = 0;
    self.num_linkages_post_processed = 0;
    self.null_count = 0;
    self.stage = ParseStage::Unparsed;
  }

  fn run(
    &mut self,
    opts: &ParseOptions,
    pp: &mut dyn PostProcessor,
    scorer: Option<&dyn CorpusScorer>,
    resources: &Resources,
  ) -> Result<usize, ParseError> {
    self.reset();
    resources.reset();

    let length = self.length();
    if length >= MAX_SENTENCE {
      return Err(ParseError::SentenceTooLong(length));
    }
    if resources.exhausted() {
      debug!("no resources left before parsing");
      return Ok(0);
    }

    let words = prepare_words(self.words.clone(), opts, self.unlimited.as_deref());
    let matcher = Matcher::new(&words)?;
    resources.charge(matcher.size_in_bytes());

    let max_null_count = opts.max_null_count.min(length);
    for null_count in opts.min_null_count..=max_null_count {
      if resources.exhausted() {
        break;
      }

      self.stage = ParseStage::Counting { null_count };
      let mut ctx = CountContext::new(&matcher, opts, resources);
      let found = ctx.total(null_count);
      if let Some(err) = ctx.take_error() {
        return Err(err);
      }
      info!(null_count, %found, "counted linkages");

      self.null_count = null_count;
      self.num_linkages_found = found;
      if ctx.is_exhausted() {
        self.num_linkages_found = Count::ZERO;
        break;
      }
      if found.is_zero() {
        self.stage = ParseStage::NoSolution { null_count };
        continue;
      }

      self.process_linkages(&mut ctx, &words, opts, pp, scorer, resources)?;
      if self.num_valid_linkages > 0 {
        break;
      }
      if found.is_overflowed() {
        warn!(null_count, "count overflowed without a valid linkage, giving up");
        break;
      }
    }

    Ok(self.num_valid_linkages)
  }

  /// Selects, extracts, checks and ranks the linkages counted in `ctx`.
  fn process_linkages(
    &mut self,
    ctx: &mut CountContext<'_>,
    words: &[Word],
    opts: &ParseOptions,
    pp: &mut dyn PostProcessor,
    scorer: Option<&dyn CorpusScorer>,
    resources: &Resources,
  ) -> Result<(), ParseError> {
    let found = self.num_linkages_found;
    let null_count = self.null_count;

    let seed = sampling_seed(found, words.len(), opts.repeatable_rand, self.rand_state);
    let (indices, rand_state) = select_linkages(found, opts.linkage_limit, seed);
    if !opts.repeatable_rand {
      self.rand_state = rand_state;
    }
    self.stage = ParseStage::Selected;

    let mut linkages = Vec::new();
    linkages
      .try_reserve_exact(indices.len())
      .map_err(ParseError::oom("linkages"))?;
    for (i, index) in indices.into_iter().enumerate() {
      if i % 10 == 9 && resources.exhausted() {
        break;
      }
      match extract_linkage(ctx, index, null_count, seed) {
        Some(linkage) => {
          resources.charge(linkage.size_in_bytes());
          linkages.push(linkage);
        }
        None => debug!(%index, "no linkage at index"),
      }
    }
    self.stage = ParseStage::Extracted;

    for linkage in linkages.iter_mut() {
      if !sane_morphism(words, linkage, self.morpheme_regex.as_ref(), null_count) {
        linkage.info.add_violation(MORPHISM_VIOLATION);
        linkage.info.discarded = !opts.display_morphism_violations;
      }
    }

    if words.len() >= opts.twopass_length {
      for (i, linkage) in linkages.iter().enumerate() {
        if linkage.info.discarded || linkage.info.violations > 0 {
          continue;
        }
        pp.scan(linkage);
        if i % 10 == 9 && resources.exhausted() {
          break;
        }
      }
    }

    let mut processed = 0;
    let mut valid = 0;
    for (i, linkage) in linkages.iter_mut().enumerate() {
      processed = i + 1;
      if linkage.info.discarded || linkage.info.violations > 0 {
        continue;
      }
      match pp.process(linkage) {
        PostProcessResult::Accept => valid += 1,
        PostProcessResult::Violation(msg) => linkage.info.add_violation(msg),
      }
      if let Some(scorer) = scorer {
        linkage.info.corpus_cost = scorer.score(linkage);
      }
      if i % 10 == 9 && resources.exhausted() {
        break;
      }
    }
    // linkages past a budget cut-off were never checked
    linkages.truncate(processed);
    self.stage = ParseStage::PostProcessed;

    sort_linkages(&mut linkages, opts.cost_model);
    linkages.retain(|l| !l.info.discarded);
    self.stage = ParseStage::Ranked;

    debug!(
      extracted = processed,
      kept = linkages.len(),
      valid,
      "ranked linkages"
    );
    self.num_linkages_post_processed = linkages.len();
    self.num_valid_linkages = valid;
    self.linkages = linkages;
    Ok(())
  }
}

impl Drop for Sentence {
  fn drop(&mut self) {
    GLOBAL_RAND_STATE.store(self.rand_state, Ordering::Relaxed);
  }
}

impl fmt::Display for Sentence {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    for (idx, w) in self.words.iter().enumerate() {
      if idx > 0 {
        write!(f, " ")?;
      }
      write!(f, "{}", w.string)?;
    }
    Ok(())
  }
}
