mod common;

use regex::Regex;

use linkparse::morphism::{EMPTY_WORD_MARK, MORPHISM_VIOLATION};
use linkparse::{
  CostModel, Disjunct, Lexicon, Linkage, LinkageIndex, NoPostProcessing, ParseOptions,
  PostProcessResult, PostProcessor, Sentence, Word,
};

use common::{
  assert_disjuncts_consistent, attachment_lexicon, init_tracing, sentence, ATTACHMENT_SENTENCE,
};

fn attachment_sentence() -> Sentence {
  let tokens = ATTACHMENT_SENTENCE.split(' ').collect::<Vec<_>>();
  attachment_lexicon().sentence(&tokens)
}

fn link_sets(s: &Sentence) -> Vec<Vec<(usize, usize, String)>> {
  s.linkages()
    .iter()
    .map(|l| l.links().iter().map(|k| (k.lw, k.rw, k.name.clone())).collect())
    .collect()
}

#[test]
fn test_null_count_is_minimal() {
  init_tracing();
  let lex = attachment_lexicon();
  let tokens = ["the", "man", "saw", "xyzzy", "the", "dog"];

  let mut strict = lex.sentence(&tokens);
  assert_eq!(strict.parse(&ParseOptions::default()).unwrap(), 0);

  for max in 1..4 {
    let mut s = lex.sentence(&tokens);
    let valid = s
      .parse(&ParseOptions::default().with_null_range(0, max))
      .unwrap();
    assert!(valid > 0, "max_null_count {}", max);
    // more room for nulls never changes the first null count that works
    assert_eq!(s.null_count(), 1);
    for l in s.linkages() {
      assert_eq!(l.unused_word_cost(), 1);
      assert!(l.is_planar());
      assert_disjuncts_consistent(l);
    }
  }
}

#[test]
fn test_sampling_is_repeatable() {
  init_tracing();
  let opts = ParseOptions::default().with_linkage_limit(2);

  let mut a = attachment_sentence();
  let mut b = attachment_sentence();
  a.parse(&opts).unwrap();
  b.parse(&opts).unwrap();

  assert_eq!(a.linkages().len(), 2);
  assert_eq!(link_sets(&a), link_sets(&b));
  for l in a.linkages() {
    assert!(matches!(l.index(), LinkageIndex::Exact(i) if i < 5));
    assert_disjuncts_consistent(l);
  }
}

#[test]
fn test_overflowed_count_still_samples() {
  init_tracing();
  let first = vec!["A+"; 50].join("|");
  let middle = vec!["A- & A+"; 50].join("|");
  let last = vec!["A-"; 50].join("|");
  let mut spec = vec![("w", first.as_str())];
  spec.extend((0..8).map(|_| ("w", middle.as_str())));
  spec.push(("w", last.as_str()));

  let mut s = sentence(&spec);
  let opts = ParseOptions::default().with_linkage_limit(5);
  let valid = s.parse(&opts).unwrap();

  assert!(s.num_linkages_found().is_overflowed());
  assert_eq!(valid, 5);
  assert_eq!(s.linkages().len(), 5);
  for l in s.linkages() {
    assert!(matches!(l.index(), LinkageIndex::Sampled(_)));
    assert_eq!(l.num_links(), 9);
    assert!(l.is_planar());
    assert_disjuncts_consistent(l);
  }
}

#[derive(Default)]
struct ScanCounter {
  scanned: usize,
  processed: usize,
}

impl PostProcessor for ScanCounter {
  fn scan(&mut self, _linkage: &Linkage) {
    self.scanned += 1;
  }

  fn process(&mut self, _linkage: &Linkage) -> PostProcessResult {
    self.processed += 1;
    PostProcessResult::Accept
  }
}

#[test]
fn test_scan_pass_for_long_sentences() {
  init_tracing();

  let mut pp = ScanCounter::default();
  let opts = ParseOptions {
    twopass_length: 0,
    ..ParseOptions::default()
  };
  attachment_sentence().parse_with(&opts, &mut pp, None).unwrap();
  assert_eq!((pp.scanned, pp.processed), (5, 5));

  let mut pp = ScanCounter::default();
  let opts = ParseOptions {
    twopass_length: 100,
    ..ParseOptions::default()
  };
  attachment_sentence().parse_with(&opts, &mut pp, None).unwrap();
  assert_eq!((pp.scanned, pp.processed), (0, 5));
}

#[test]
fn test_cost_models() {
  init_tracing();
  let lex: Lexicon = "a: [A+] or B+; b: A- or B-;".parse().unwrap();

  let mut s = lex.sentence(&["a", "b"]);
  assert_eq!(s.parse(&ParseOptions::default()).unwrap(), 2);
  assert_eq!(s.linkages()[0].links()[0].name, "B");
  assert_eq!(s.linkages()[1].disjunct_cost(), 1.0);

  let prefer_a = |l: &Linkage| if l.links()[0].name == "A" { 0.5 } else { 3.0 };
  let opts = ParseOptions {
    cost_model: CostModel::Corpus,
    ..ParseOptions::default()
  };
  let mut s = lex.sentence(&["a", "b"]);
  s.parse_with(&opts, &mut NoPostProcessing, Some(&prefer_a)).unwrap();
  assert_eq!(s.linkages()[0].links()[0].name, "A");
  assert_eq!(s.linkages()[0].corpus_cost(), 0.5);

  // without a scorer every corpus cost ties and the standard order decides
  let mut s = lex.sentence(&["a", "b"]);
  s.parse_with(&opts, &mut NoPostProcessing, None).unwrap();
  assert_eq!(s.linkages()[0].links()[0].name, "B");
}

fn split_walks() -> Sentence {
  let stem = |ws: &str| "X+".parse::<Disjunct>().unwrap().with_word_string(ws);
  let suffix = |ws: &str| "X-".parse::<Disjunct>().unwrap().with_word_string(ws);
  Sentence::new(vec![
    Word::morpheme(
      "walk",
      vec![stem("walk.="), stem("walks.v")],
      Some("walks".to_string()),
      vec!["walk".to_string(), "walks".to_string()],
    ),
    Word::morpheme(
      "=s",
      vec![suffix("=s"), suffix(EMPTY_WORD_MARK)],
      None,
      vec!["=s".to_string(), EMPTY_WORD_MARK.to_string()],
    ),
  ])
}

#[test]
fn test_mixed_splits_are_discarded() {
  init_tracing();

  let mut s = split_walks();
  assert_eq!(s.parse(&ParseOptions::default()).unwrap(), 2);
  assert_eq!(s.linkages().len(), 2);
  assert!(s.linkages().iter().all(|l| l.info().violations == 0));

  let opts = ParseOptions {
    display_morphism_violations: true,
    ..ParseOptions::default()
  };
  let mut s = split_walks();
  assert_eq!(s.parse(&opts).unwrap(), 2);
  assert_eq!(s.linkages().len(), 4);
  assert_eq!(s.linkages()[3].violation_name(), Some(MORPHISM_VIOLATION));
  assert!(!s.linkages()[3].is_discarded());
}

#[test]
fn test_morpheme_pattern_filters_splits() {
  init_tracing();

  // only whole words may stand alone
  let mut s = split_walks().with_morpheme_regex(Regex::new("^wb$").unwrap());
  assert_eq!(s.parse(&ParseOptions::default()).unwrap(), 1);
  assert_eq!(s.linkages().len(), 1);
  assert_eq!(s.linkages()[0].disjunct(0).unwrap().word_string, "walks.v");

  let mut s = split_walks().with_morpheme_regex(Regex::new("^(w|ts)b$").unwrap());
  assert_eq!(s.parse(&ParseOptions::default()).unwrap(), 2);
}
