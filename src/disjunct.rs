use std::fmt;
use std::str::FromStr;

use crate::connector::{Connector, Direction};
use crate::utils::Err;

/// One way of using a word: the connectors it must link on each side.
///
/// Both lists are stored outermost first, i.e. the connector that reaches
/// the farthest word comes first. That is the written order for `-`
/// connectors and the reverse of it for `+` connectors.
#[derive(Debug, Clone, PartialEq)]
pub struct Disjunct {
  pub(crate) left: Vec<Connector>,
  pub(crate) right: Vec<Connector>,
  pub cost: f64,
  /// The dictionary entry this disjunct came from, e.g. `dog.n`
  pub word_string: String,
}

impl Disjunct {
  /// Builds a disjunct from connectors in the order they are written in a
  /// dictionary expression (`A- & B- & C+ & D+`).
  pub fn new(word_string: impl Into<String>, connectors: Vec<Connector>, cost: f64) -> Self {
    let (left, mut right): (Vec<_>, Vec<_>) = connectors
      .into_iter()
      .partition(|c| c.direction() == Direction::Left);
    right.reverse();

    Self {
      left,
      right,
      cost,
      word_string: word_string.into(),
    }
  }

  pub fn left(&self) -> &[Connector] {
    &self.left
  }

  pub fn right(&self) -> &[Connector] {
    &self.right
  }

  pub fn is_empty(&self) -> bool {
    self.left.is_empty() && self.right.is_empty()
  }

  /// All connectors in written order
  pub fn connectors(&self) -> impl Iterator<Item = &Connector> {
    self.left.iter().chain(self.right.iter().rev())
  }

  pub fn with_word_string(mut self, word_string: impl Into<String>) -> Self {
    self.word_string = word_string.into();
    self
  }
}

impl FromStr for Disjunct {
  type Err = Err;

  /// Parses a flat conjunction such as `Wd- & Ss*b+`. `()` is the empty disjunct.
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let s = s.trim();
    if s.is_empty() || s == "()" {
      return Ok(Self::new("", Vec::new(), 0.0));
    }
    let connectors = s
      .split('&')
      .map(|c| c.trim().parse::<Connector>())
      .collect::<Result<Vec<_>, _>>()?;
    Ok(Self::new("", connectors, 0.0))
  }
}

impl fmt::Display for Disjunct {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if self.is_empty() {
      return write!(f, "()");
    }
    for (idx, c) in self.connectors().enumerate() {
      if idx > 0 {
        write!(f, " & ")?;
      }
      write!(f, "{}", c)?;
    }
    Ok(())
  }
}

/// A position in the tokenized sentence and everything the dictionary and
/// tokenizer know about it.
#[derive(Debug, Clone, PartialEq)]
pub struct Word {
  pub string: String,
  pub disjuncts: Vec<Disjunct>,
  /// If false, no linkage may leave this word unlinked
  pub null_allowed: bool,
  /// Set on the first token of every input word; the spelling before splitting
  pub unsplit_word: Option<String>,
  /// The token at this position under each tokenization alternative of the
  /// input word it belongs to
  pub alternatives: Vec<String>,
  pub first_upper: bool,
}

impl Word {
  /// A word that is its own, unsplit, input word.
  pub fn new(string: impl Into<String>, disjuncts: Vec<Disjunct>) -> Self {
    let string = string.into();
    Self {
      unsplit_word: Some(string.clone()),
      alternatives: vec![string.clone()],
      first_upper: string.chars().next().is_some_and(char::is_uppercase),
      string,
      disjuncts,
      null_allowed: true,
    }
  }

  /// A token produced by splitting an input word; `alternatives` holds its
  /// spelling under each alternative split.
  pub fn morpheme(
    string: impl Into<String>,
    disjuncts: Vec<Disjunct>,
    unsplit_word: Option<String>,
    alternatives: Vec<String>,
  ) -> Self {
    let string = string.into();
    Self {
      first_upper: unsplit_word
        .as_deref()
        .and_then(|u| u.chars().next())
        .is_some_and(char::is_uppercase),
      string,
      disjuncts,
      null_allowed: true,
      unsplit_word,
      alternatives,
    }
  }
}
