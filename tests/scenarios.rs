mod common;

use std::time::Duration;

use linkparse::{Count, Lexicon, ParseOptions, ParseStage};

use common::{assert_disjuncts_consistent, attachment_lexicon, init_tracing, ATTACHMENT_SENTENCE};

#[test]
fn test_this_is() {
  init_tracing();
  let lex: Lexicon = "LEFT-WALL: Wd+; this: Wd- & Ss*b+; is: Ss-;".parse().unwrap();
  let mut sentence = lex.sentence(&["this", "is"]);

  let valid = sentence.parse(&ParseOptions::default()).unwrap();
  assert_eq!(valid, 1);
  assert_eq!(sentence.num_linkages_found(), Count::ONE);
  assert_eq!(sentence.null_count(), 0);

  let linkage = sentence.linkage(0).unwrap();
  assert_eq!(linkage.info().violations, 0);
  assert_eq!(linkage.unused_word_cost(), 0);

  let links = linkage
    .links()
    .iter()
    .map(|l| (l.lw, l.name.as_str(), l.rw))
    .collect::<Vec<_>>();
  assert_eq!(links, vec![(0, "Wd", 1), (1, "Ss*b", 2)]);
  assert_eq!(linkage.links()[1].left_label, "Ss*b");
  assert_eq!(linkage.links()[1].right_label, "Ss");
  assert_eq!(linkage.words(), ["LEFT-WALL", "this", "is"]);
}

#[test]
fn test_unknown_word_becomes_null() {
  init_tracing();
  let opts = ParseOptions::default().with_null_range(0, 1);

  let lex: Lexicon = "LEFT-WALL: Wd+; this: Wd- & {Ss*b+};".parse().unwrap();
  let mut sentence = lex.sentence(&["this", "is"]);
  let valid = sentence.parse(&opts).unwrap();
  assert_eq!(valid, 1);
  assert_eq!(sentence.null_count(), 1);

  let linkage = sentence.linkage(0).unwrap();
  assert_eq!(linkage.unused_word_cost(), 1);
  assert_eq!(linkage.words(), ["LEFT-WALL", "this", "[is]"]);
  assert!(linkage.disjunct(2).is_none());

  // `this` insists on its subject link here, so one null is not enough
  let lex: Lexicon = "LEFT-WALL: Wd+; this: Wd- & Ss*b+;".parse().unwrap();
  let mut sentence = lex.sentence(&["this", "is"]);
  assert_eq!(sentence.parse(&opts).unwrap(), 0);
  assert_eq!(sentence.stage(), ParseStage::Done);
  assert!(sentence.linkages().is_empty());
}

#[test]
fn test_attachment_ambiguity() {
  init_tracing();
  let lex = attachment_lexicon();
  let tokens = ATTACHMENT_SENTENCE.split(' ').collect::<Vec<_>>();
  let mut sentence = lex.sentence(&tokens);

  assert_eq!(sentence.parse(&ParseOptions::default()).unwrap(), 5);
  assert_eq!(sentence.num_linkages_found(), Count::Value(5));
  for linkage in sentence.linkages() {
    assert!(linkage.is_planar());
    assert_disjuncts_consistent(linkage);
  }

  // the linkages are distinct
  for (i, a) in sentence.linkages().iter().enumerate() {
    for b in sentence.linkages()[i + 1..].iter() {
      assert_ne!(a.links(), b.links());
    }
  }

  // ranked by total link length
  let costs = sentence
    .linkages()
    .iter()
    .map(|l| l.link_cost())
    .collect::<Vec<_>>();
  assert!(costs.windows(2).all(|w| w[0] <= w[1]), "{:?}", costs);
}

#[test]
fn test_zero_time_budget() {
  init_tracing();
  let lex = attachment_lexicon();
  let tokens = ATTACHMENT_SENTENCE.split(' ').collect::<Vec<_>>();
  let mut sentence = lex.sentence(&tokens);

  let opts = ParseOptions {
    max_parse_time: Some(Duration::ZERO),
    ..ParseOptions::default()
  };
  assert_eq!(sentence.parse(&opts).unwrap(), 0);
  assert!(sentence.timer_expired());
  assert!(sentence.linkages().is_empty());

  // flags are cleared by the next parse
  assert_eq!(sentence.parse(&ParseOptions::default()).unwrap(), 5);
  assert!(!sentence.timer_expired());
}

#[test]
fn test_memory_budget() {
  init_tracing();
  let lex = attachment_lexicon();
  let tokens = ATTACHMENT_SENTENCE.split(' ').collect::<Vec<_>>();
  let mut sentence = lex.sentence(&tokens);

  let opts = ParseOptions {
    max_memory: Some(1),
    ..ParseOptions::default()
  };
  sentence.parse(&opts).unwrap();
  assert!(sentence.memory_exhausted());
  assert!(sentence.resources().exhausted());
}

#[test]
fn test_failed_attempts_give_back_memory() {
  init_tracing();
  let lex = attachment_lexicon();
  let tokens = ["the", "man", "saw", "xyzzy", "the", "dog", "with", "the", "telescope"];

  let mut direct = lex.sentence(&tokens);
  assert!(direct.parse(&ParseOptions::default().with_null_range(1, 1)).unwrap() > 0);
  let used = direct.resources().memory_used();

  // the count tables of the null-free attempt are gone by the end
  let mut stepped = lex.sentence(&tokens);
  assert!(stepped.parse(&ParseOptions::default().with_null_range(0, 1)).unwrap() > 0);
  assert_eq!(stepped.null_count(), 1);
  assert_eq!(stepped.resources().memory_used(), used);
}

#[test]
fn test_read_dictionary_file() {
  init_tracing();
  let path = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/data/tiny.dict");
  let lex = Lexicon::read_from_file(path).unwrap();
  assert!(lex.contains("dog"));
  assert!(lex.unlimited_connectors().is_some());

  let linkages = lex
    .parse("the dog chased a cat", &ParseOptions::default())
    .unwrap();
  assert_eq!(linkages.len(), 1);
  assert_eq!(linkages[0].num_links(), 5);

  assert!(Lexicon::read_from_file("no/such/file.dict").is_err());
}
