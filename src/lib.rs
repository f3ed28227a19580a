#[macro_use]
extern crate lazy_static;

pub mod connector;
pub mod count;
pub mod disjunct;
pub mod error;
pub mod extract;
pub mod fast_match;
pub mod lexicon;
pub mod linkage;
pub mod morphism;
pub mod options;
pub mod postprocess;
pub mod prepare;
pub mod ranking;
pub mod resources;
pub mod select;
pub mod sentence;
pub mod utils;

pub use crate::connector::{Connector, Direction};
pub use crate::count::Count;
pub use crate::disjunct::{Disjunct, Word};
pub use crate::error::{ParseError, MAX_SENTENCE};
pub use crate::lexicon::Lexicon;
pub use crate::linkage::{Link, Linkage, LinkageInfo};
pub use crate::options::{CostModel, ParseOptions};
pub use crate::postprocess::{CorpusScorer, NoPostProcessing, PostProcessResult, PostProcessor};
pub use crate::resources::Resources;
pub use crate::select::LinkageIndex;
pub use crate::sentence::{ParseStage, Sentence};
pub use crate::utils::Err;

impl Lexicon {
  /// Tokenizes on whitespace and parses with `opts`, returning the ranked
  /// linkages.
  pub fn parse(&self, input: &str, opts: &ParseOptions) -> Result<Vec<Linkage>, ParseError> {
    let tokens = input.split_whitespace().collect::<Vec<_>>();
    let mut sentence = self.sentence(&tokens);
    sentence.parse(opts)?;
    Ok(sentence.linkages().to_vec())
  }
}

#[test]
fn test_agreement_blocking() {
  let lex: Lexicon = r#"
    LEFT-WALL: Wd+;
    he she: Wd- & Ss+;
    they: Wd- & Sp+;
    runs: Ss-;
    run: Sp-;
  "#
  .parse()
  .unwrap();
  let opts = ParseOptions::default();

  assert_eq!(lex.parse("he runs", &opts).unwrap().len(), 1);
  assert_eq!(lex.parse("they run", &opts).unwrap().len(), 1);

  assert_eq!(lex.parse("he run", &opts).unwrap().len(), 0);
  assert_eq!(lex.parse("they runs", &opts).unwrap().len(), 0);
}
