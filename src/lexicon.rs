/// Simple recursive-descent parsing of link grammar dictionaries
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use regex::Regex;
use tracing::{debug, info};

use crate::connector::Connector;
use crate::disjunct::{Disjunct, Word};
use crate::sentence::Sentence;
use crate::utils::combinations;
use crate::Err;

pub const LEFT_WALL: &str = "LEFT-WALL";
pub const RIGHT_WALL: &str = "RIGHT-WALL";
pub const UNLIMITED_CONNECTORS: &str = "UNLIMITED-CONNECTORS";

/// One conjunction of connectors in written order, with its cost
#[derive(Debug, Clone, PartialEq)]
struct Clause {
  connectors: Vec<Connector>,
  cost: f64,
}

impl Clause {
  fn empty() -> Self {
    Self {
      connectors: Vec::new(),
      cost: 0.0,
    }
  }
}

/// A dictionary: word entries and the disjuncts their expressions expand to.
#[derive(Debug, Clone, Default)]
pub struct Lexicon {
  entries: HashMap<String, Vec<Disjunct>>,
  /// Entry names by spelling without subscript, in definition order
  by_base: HashMap<String, Vec<String>>,
  unlimited: Option<Vec<String>>,
}

impl Lexicon {
  pub fn read_from_file(path: impl AsRef<Path>) -> Result<Self, Err> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|e| format!("{}: {}", path.display(), e))?;
    let lexicon: Self = text.parse()?;
    info!(path = %path.display(), entries = lexicon.entries.len(), "loaded dictionary");
    Ok(lexicon)
  }

  fn add_entry(&mut self, name: &str, clauses: &[Clause]) {
    if name == UNLIMITED_CONNECTORS {
      let labels = clauses
        .iter()
        .flat_map(|c| c.connectors.iter())
        .map(|c| c.label().to_string());
      self.unlimited.get_or_insert_with(Vec::new).extend(labels);
      return;
    }

    let disjuncts = clauses
      .iter()
      .map(|c| Disjunct::new(name, c.connectors.clone(), c.cost))
      .collect::<Vec<_>>();
    let base = base_word(name).to_string();
    if !self.entries.contains_key(name) {
      self.by_base.entry(base).or_default().push(name.to_string());
    }
    self.entries.entry(name.to_string()).or_default().extend(disjuncts);
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }

  pub fn contains(&self, word: &str) -> bool {
    self.by_base.contains_key(word) || self.entries.contains_key(word)
  }

  /// The connector labels that are exempt from the short length limit, if
  /// the dictionary names any.
  pub fn unlimited_connectors(&self) -> Option<&[String]> {
    self.unlimited.as_deref()
  }

  /// Every disjunct for `word`. A bare spelling collects all its subscripted
  /// entries (`dog` gives `dog.n` and `dog.v`); a subscripted one only its
  /// own entry.
  pub fn disjuncts(&self, word: &str) -> Vec<Disjunct> {
    if let Some(names) = self.by_base.get(word) {
      names
        .iter()
        .flat_map(|n| self.entries[n].iter().cloned())
        .collect()
    } else {
      self.entries.get(word).cloned().unwrap_or_default()
    }
  }

  /// Looks a token up, retrying in lowercase if it is capitalized and unknown.
  pub fn word(&self, token: &str) -> Word {
    let mut disjuncts = self.disjuncts(token);
    if disjuncts.is_empty() && token.chars().next().is_some_and(char::is_uppercase) {
      disjuncts = self.disjuncts(&token.to_lowercase());
    }
    if disjuncts.is_empty() {
      debug!(token, "word not in dictionary");
    }
    Word::new(token, disjuncts)
  }

  /// Builds a sentence from tokens, adding walls if the dictionary defines them.
  pub fn sentence(&self, tokens: &[&str]) -> Sentence {
    let mut words = Vec::with_capacity(tokens.len() + 2);
    if self.entries.contains_key(LEFT_WALL) {
      words.push(Word::new(LEFT_WALL, self.disjuncts(LEFT_WALL)));
    }
    words.extend(tokens.iter().map(|t| self.word(t)));
    if self.entries.contains_key(RIGHT_WALL) {
      words.push(Word::new(RIGHT_WALL, self.disjuncts(RIGHT_WALL)));
    }

    let mut sentence = Sentence::new(words);
    if let Some(unlimited) = self.unlimited.as_ref() {
      sentence = sentence.with_unlimited_connectors(unlimited.clone());
    }
    sentence
  }
}

/// `dog.n` -> `dog`
pub fn base_word(name: &str) -> &str {
  match name.rfind('.') {
    Some(idx) if idx > 0 => &name[..idx],
    _ => name,
  }
}

impl FromStr for Lexicon {
  type Err = Err;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let mut lexicon = Self::default();
    let mut macros = HashMap::new();
    let mut rem = s;
    loop {
      rem = skip_whitespace(rem);
      if rem.is_empty() {
        break;
      }
      let ((names, clauses), s) = parse_entry(rem, &macros)?;
      for name in names {
        if name.starts_with('<') {
          macros.insert(name, clauses.clone());
        } else {
          lexicon.add_entry(&name, &clauses);
        }
      }
      rem = s;
    }

    if lexicon.is_empty() {
      Err("empty dictionary".into())
    } else {
      Ok(lexicon)
    }
  }
}

type Infallible<'a, T> = (T, &'a str);
type ParseResult<'a, T> = Result<(T, &'a str), Err>;
type Macros = HashMap<String, Vec<Clause>>;

/// helper macro for initializing a regex with lazy_static!
macro_rules! regex_static {
  ($name:ident, $pattern:expr) => {
    lazy_static! {
      static ref $name: Regex = Regex::new($pattern).unwrap();
    }
  };
}

/// Try to consume a regex, returning None if it doesn't match
fn optional_re<'a>(re: &'static Regex, s: &'a str) -> Infallible<'a, Option<&'a str>> {
  match re.find(s) {
    Some(m) if m.start() == 0 => (Some(m.as_str()), &s[m.end()..]),
    _ => (None, s),
  }
}

/// Try to consume a regex, failing if it doesn't match
fn needed_re<'a>(re: &'static Regex, s: &'a str) -> ParseResult<'a, &'a str> {
  if let (Some(c), rest) = optional_re(re, s) {
    Ok((c, rest))
  } else {
    Err(format!("couldn't match {} at {}", re, preview(s)).into())
  }
}

/// Try to consume a char, returning None if it doesn't match
fn optional_char(c: char, s: &str) -> Infallible<Option<char>> {
  match s.strip_prefix(c) {
    Some(rest) => (Some(c), rest),
    None => (None, s),
  }
}

/// Try to consume a char, failing if it doesn't match
fn needed_char(c: char, s: &str) -> ParseResult<char> {
  if let (Some(c), rest) = optional_char(c, s) {
    Ok((c, rest))
  } else {
    Err(format!("couldn't match {} at {}", c, preview(s)).into())
  }
}

fn preview(s: &str) -> &str {
  match s.char_indices().nth(30) {
    Some((idx, _)) => &s[..idx],
    None => s,
  }
}

/// Skips whitespace and // comments
fn skip_whitespace(s: &str) -> &str {
  regex_static!(WHITESPACE_OR_COMMENT, r"(?:\s+|//[^\n]*)+");
  optional_re(&*WHITESPACE_OR_COMMENT, s).1
}

/// Entry names: words, subscripted words (`dog.n`) and macros (`<noun>`)
fn parse_name(s: &str) -> ParseResult<&str> {
  regex_static!(NAME, r"<[^\s<>]+>|[^\s:;()\[\]{}&<>]+");
  needed_re(&*NAME, s).map_err(|err| format!("name: {}", err).into())
}

fn parse_connector(s: &str) -> ParseResult<Connector> {
  regex_static!(CONNECTOR, r"@?[hd]?[A-Z]+[a-z*]*[+-]");
  let (text, s) = needed_re(&*CONNECTOR, s)?;
  Ok((text.parse()?, s))
}

fn parse_number(s: &str) -> Infallible<Option<f64>> {
  regex_static!(NUMBER, r"-?[0-9]+(?:\.[0-9]+)?");
  let (num, rest) = optional_re(&*NUMBER, s);
  match num.and_then(|n| n.parse().ok()) {
    Some(n) => (Some(n), rest),
    None => (None, s),
  }
}

/// `word1 word2 ...: expression;`
fn parse_entry<'a>(s: &'a str, macros: &Macros) -> ParseResult<'a, (Vec<String>, Vec<Clause>)> {
  let mut names = Vec::new();
  let mut rem = s;
  loop {
    rem = skip_whitespace(rem);
    if let (Some(_), s) = optional_char(':', rem) {
      rem = s;
      break;
    }
    let (name, s) = parse_name(rem).map_err(|e| -> Err { format!("entry: {}", e).into() })?;
    names.push(name.to_string());
    rem = s;
  }
  if names.is_empty() {
    return Err(format!("entry without words at {}", preview(s)).into());
  }

  let (clauses, s) = parse_or(skip_whitespace(rem), macros)
    .map_err(|e| -> Err { format!("{}: {}", names[0], e).into() })?;
  let s = skip_whitespace(s);
  let (_, s) = needed_char(';', s).map_err(|e| -> Err { format!("{}: {}", names[0], e).into() })?;
  Ok(((names, clauses), s))
}

fn parse_or<'a>(s: &'a str, macros: &Macros) -> ParseResult<'a, Vec<Clause>> {
  regex_static!(OR, r"or\b");

  let (mut clauses, mut rem) = parse_and(s, macros)?;
  loop {
    let s = skip_whitespace(rem);
    match optional_re(&*OR, s) {
      (Some(_), s) => {
        let (more, s) = parse_and(skip_whitespace(s), macros)?;
        clauses.extend(more);
        rem = s;
      }
      (None, _) => return Ok((clauses, rem)),
    }
  }
}

fn parse_and<'a>(s: &'a str, macros: &Macros) -> ParseResult<'a, Vec<Clause>> {
  let (first, mut rem) = parse_term(s, macros)?;
  let mut operands = vec![first];
  loop {
    let s = skip_whitespace(rem);
    match optional_char('&', s) {
      (Some(_), s) => {
        let (term, s) = parse_term(skip_whitespace(s), macros)?;
        operands.push(term);
        rem = s;
      }
      (None, _) => break,
    }
  }

  if operands.len() == 1 {
    return Ok((operands.remove(0), rem));
  }
  let clauses = combinations(&operands)
    .into_iter()
    .map(|parts| Clause {
      cost: parts.iter().map(|c| c.cost).sum(),
      connectors: parts.into_iter().flat_map(|c| c.connectors).collect(),
    })
    .collect();
  Ok((clauses, rem))
}

fn parse_term<'a>(s: &'a str, macros: &Macros) -> ParseResult<'a, Vec<Clause>> {
  if let (Some(_), rest) = optional_char('(', s) {
    let rest = skip_whitespace(rest);
    if let (Some(_), rest) = optional_char(')', rest) {
      return Ok((vec![Clause::empty()], rest));
    }
    let (clauses, rest) = parse_or(rest, macros)?;
    let (_, rest) = needed_char(')', skip_whitespace(rest))?;
    return Ok((clauses, rest));
  }

  if let (Some(_), rest) = optional_char('{', s) {
    let (mut clauses, rest) = parse_or(skip_whitespace(rest), macros)?;
    let (_, rest) = needed_char('}', skip_whitespace(rest))?;
    clauses.push(Clause::empty());
    return Ok((clauses, rest));
  }

  if let (Some(_), rest) = optional_char('[', s) {
    let (mut clauses, rest) = parse_or(skip_whitespace(rest), macros)?;
    let (_, rest) = needed_char(']', skip_whitespace(rest))?;
    let (cost, rest) = parse_number(rest);
    for c in clauses.iter_mut() {
      c.cost += cost.unwrap_or(1.0);
    }
    return Ok((clauses, rest));
  }

  if s.starts_with('<') {
    let (name, rest) = parse_name(s)?;
    return match macros.get(name) {
      Some(clauses) => Ok((clauses.clone(), rest)),
      None => Err(format!("undefined macro {}", name).into()),
    };
  }

  let (connector, rest) = parse_connector(s)?;
  Ok((
    vec![Clause {
      connectors: vec![connector],
      cost: 0.0,
    }],
    rest,
  ))
}

#[cfg(test)]
mod tests {
  use super::*;

  fn strings(ds: &[Disjunct]) -> Vec<String> {
    ds.iter().map(|d| d.to_string()).collect()
  }

  #[test]
  fn test_expansion() {
    let lex: Lexicon = "a: (B- or C-) & A+ & {D+};".parse().unwrap();
    assert_eq!(
      strings(&lex.disjuncts("a")),
      vec!["B- & A+ & D+", "B- & A+", "C- & A+ & D+", "C- & A+"]
    );
  }

  #[test]
  fn test_costs_and_comments() {
    let lex: Lexicon = r#"
      // determiners
      the: D+;
      dog.n cat.n: [D-]1.5 & S+ or [[O-]];
    "#
    .parse()
    .unwrap();

    let dog = lex.disjuncts("dog");
    assert_eq!(dog.len(), 2);
    assert_eq!(dog[0].cost, 1.5);
    assert_eq!(dog[1].cost, 2.0);
    assert_eq!(dog[0].word_string, "dog.n");
    assert_eq!(lex.disjuncts("cat.n").len(), 2);
    assert!(lex.disjuncts("cat.v").is_empty());
  }

  #[test]
  fn test_macros_and_specials() {
    let lex: Lexicon = r#"
      <noun>: {D-} & (S+ or O-);
      dog: <noun>;
      LEFT-WALL: Wd+;
      UNLIMITED-CONNECTORS: Wd+ & Xp+;
    "#
    .parse()
    .unwrap();

    assert_eq!(lex.disjuncts("dog").len(), 4);
    assert!(!lex.contains("<noun>"));
    assert_eq!(lex.unlimited_connectors(), Some(&["Wd".to_string(), "Xp".to_string()][..]));

    let sentence = lex.sentence(&["Dog", "unknown"]);
    assert_eq!(sentence.length(), 3);
    assert_eq!(sentence.words()[1].disjuncts.len(), 4);
    assert!(sentence.words()[2].disjuncts.is_empty());
  }

  #[test]
  fn test_empty_disjunct() {
    let lex: Lexicon = "x: () or A+;".parse().unwrap();
    assert_eq!(strings(&lex.disjuncts("x")), vec!["()", "A+"]);
  }

  #[test]
  fn test_errors() {
    assert!("".parse::<Lexicon>().is_err());
    assert!("a: A+".parse::<Lexicon>().is_err());
    assert!("a: <missing>;".parse::<Lexicon>().is_err());
    assert!("a: (A+ & B-;".parse::<Lexicon>().is_err());
  }
}
