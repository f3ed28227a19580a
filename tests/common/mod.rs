#![allow(dead_code)]

use std::sync::Once;

use linkparse::{Disjunct, Lexicon, Linkage, Sentence, Word};
use tracing_subscriber::EnvFilter;

static INIT: Once = Once::new();

/// Routes library events to the test output, filtered by `RUST_LOG`.
pub fn init_tracing() {
  INIT.call_once(|| {
    let _ = tracing_subscriber::fmt()
      .with_env_filter(EnvFilter::from_default_env())
      .with_test_writer()
      .try_init();
  });
}

/// Builds a sentence from `(word, "disjunct | disjunct | ...")` pairs.
pub fn sentence(spec: &[(&str, &str)]) -> Sentence {
  let words = spec
    .iter()
    .map(|(w, ds)| {
      let disjuncts = ds
        .split('|')
        .filter(|d| !d.trim().is_empty())
        .map(|d| d.parse::<Disjunct>().unwrap())
        .collect();
      Word::new(*w, disjuncts)
    })
    .collect();
  Sentence::new(words)
}

pub const ATTACHMENT_DICT: &str = r#"
  LEFT-WALL: Wd+;
  the: D+;
  man: Wd- & D- & Ss+;
  saw: Ss- & O+ & {@MV+};
  dog telescope park: (O- or J-) & D- & {@M+};
  with in: (M- or MV-) & J+;
"#;

pub const ATTACHMENT_SENTENCE: &str = "the man saw the dog with the telescope in the park";

pub fn attachment_lexicon() -> Lexicon {
  ATTACHMENT_DICT.parse().unwrap()
}

/// Every link ends on connectors of the disjuncts chosen for its two words,
/// and every connector of a chosen disjunct is used.
pub fn assert_disjuncts_consistent(linkage: &Linkage) {
  for link in linkage.links() {
    let left = linkage.disjunct(link.lw).expect("linked word has a disjunct");
    let right = linkage.disjunct(link.rw).expect("linked word has a disjunct");
    assert!(left.right().iter().any(|c| c.label() == link.left_label), "{}", link);
    assert!(right.left().iter().any(|c| c.label() == link.right_label), "{}", link);
  }

  for w in 0..linkage.num_words() {
    let Some(d) = linkage.disjunct(w) else {
      assert!(linkage.links().iter().all(|l| l.lw != w && l.rw != w));
      continue;
    };
    let lefts = linkage.links().iter().filter(|l| l.rw == w).count();
    let rights = linkage.links().iter().filter(|l| l.lw == w).count();
    if d.left().iter().any(|c| c.is_multi()) {
      assert!(lefts >= d.left().len());
    } else {
      assert_eq!(lefts, d.left().len(), "word {} in\n{}", w, linkage);
    }
    if d.right().iter().any(|c| c.is_multi()) {
      assert!(rights >= d.right().len());
    } else {
      assert_eq!(rights, d.right().len(), "word {} in\n{}", w, linkage);
    }
  }
}
