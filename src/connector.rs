use std::fmt;
use std::str::FromStr;

use crate::utils::{string_hash, Err};

/// A connector with this limit may span any distance.
pub const UNLIMITED_LEN: usize = usize::MAX;

/// Which side of its word a connector attaches to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
  /// `-` connectors link to a word on the left
  Left,
  /// `+` connectors link to a word on the right
  Right,
}

impl Direction {
  pub fn sign(self) -> char {
    match self {
      Self::Left => '-',
      Self::Right => '+',
    }
  }
}

/// A typed attachment point of a disjunct: `[hd]?[A-Z]+[a-z*]*` plus a direction.
///
/// The uppercase run is the connector's type and must agree exactly with a
/// partner's; the trailing subscript letters agree up to `*` wildcards. An
/// optional leading `h` or `d` marks the head or dependent end of the link.
#[derive(Debug, Clone, PartialEq)]
pub struct Connector {
  label: String,
  direction: Direction,
  multi: bool,
  uc_start: usize,
  uc_len: usize,
  hash: u32,
  pub(crate) length_limit: usize,
  /// Nearest word this connector could possibly reach, set during sentence preparation.
  pub(crate) nearest_word: usize,
}

impl Connector {
  /// Builds a connector from a bare label such as `Ss*b`. Panics on labels
  /// without an uppercase type.
  #[cfg(test)]
  pub(crate) fn new(label: &str, direction: Direction, multi: bool) -> Self {
    Self::try_new(label, direction, multi).unwrap_or_else(|e| panic!("{}", e))
  }

  fn try_new(label: &str, direction: Direction, multi: bool) -> Result<Self, Err> {
    let bytes = label.as_bytes();
    let uc_start = match bytes.first() {
      Some(b'h') | Some(b'd') => 1,
      Some(_) => 0,
      None => return Err("empty connector label".into()),
    };
    let uc_len = bytes[uc_start..]
      .iter()
      .take_while(|b| b.is_ascii_uppercase())
      .count();
    if uc_len == 0 {
      return Err(format!("connector {} has no uppercase type", label).into());
    }
    if let Some(bad) = bytes[uc_start + uc_len..]
      .iter()
      .find(|&&b| !(b.is_ascii_lowercase() || b == b'*'))
    {
      return Err(
        format!("bad subscript character {:?} in connector {}", *bad as char, label).into(),
      );
    }

    Ok(Self {
      label: label.to_string(),
      direction,
      multi,
      uc_start,
      uc_len,
      hash: string_hash(&label[uc_start..uc_start + uc_len]),
      length_limit: UNLIMITED_LEN,
      nearest_word: 0,
    })
  }

  pub fn label(&self) -> &str {
    &self.label
  }

  pub fn direction(&self) -> Direction {
    self.direction
  }

  pub fn is_multi(&self) -> bool {
    self.multi
  }

  pub fn length_limit(&self) -> usize {
    self.length_limit
  }

  pub fn nearest_word(&self) -> usize {
    self.nearest_word
  }

  /// The uppercase type letters
  pub fn uc(&self) -> &str {
    &self.label[self.uc_start..self.uc_start + self.uc_len]
  }

  pub fn uc_hash(&self) -> u32 {
    self.hash
  }

  pub fn uc_eq(&self, other: &Connector) -> bool {
    self.hash == other.hash && self.uc() == other.uc()
  }
}

impl FromStr for Connector {
  type Err = Err;

  /// Parses `Ss*b+`, `@MX-`, `hA+` and the like.
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let (multi, rest) = match s.strip_prefix('@') {
      Some(rest) => (true, rest),
      None => (false, s),
    };
    let direction = match rest.chars().last() {
      Some('+') => Direction::Right,
      Some('-') => Direction::Left,
      _ => return Err(format!("connector {} lacks a direction", s).into()),
    };
    Self::try_new(&rest[..rest.len() - 1], direction, multi)
  }
}

impl fmt::Display for Connector {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if self.multi {
      write!(f, "@")?;
    }
    write!(f, "{}{}", self.label, self.direction.sign())
  }
}

fn split_head(s: &str) -> (Option<u8>, &str) {
  match s.as_bytes().first() {
    Some(&c) if c.is_ascii_lowercase() => (Some(c), &s[1..]),
    _ => (None, s),
  }
}

/// Label-only match of two connector strings, ignoring direction and length.
pub fn easy_match(s: &str, t: &str) -> bool {
  let (hs, s) = split_head(s);
  let (ht, t) = split_head(t);
  if hs.is_some() && hs == ht {
    return false;
  }

  let (s, t) = (s.as_bytes(), t.as_bytes());
  let mut i = 0;
  while (i < s.len() && s[i].is_ascii_uppercase()) || (i < t.len() && t[i].is_ascii_uppercase()) {
    if s.get(i) != t.get(i) {
      return false;
    }
    i += 1;
  }
  while i < s.len() && i < t.len() {
    if s[i] != b'*' && t[i] != b'*' && s[i] != t[i] {
      return false;
    }
    i += 1;
  }
  true
}

/// Can `a`, a right-pointing connector on word `aw`, link to `b`, a
/// left-pointing connector on word `bw`?
pub fn do_match(a: &Connector, b: &Connector, aw: usize, bw: usize) -> bool {
  debug_assert!(aw < bw);
  let dist = bw - aw;
  if dist > a.length_limit || dist > b.length_limit {
    return false;
  }
  easy_match(&a.label, &b.label)
}

/// The name of a link: the "greatest common denominator" of its two
/// endpoint labels. Wildcards are filled from the other side, conflicting
/// subscripts become `^`, and the longer label's tail is kept.
pub fn link_name(s: &str, t: &str) -> String {
  let (_, s) = split_head(s);
  let (_, t) = split_head(t);
  if s == t {
    return s.to_string();
  }

  let (long, short) = if t.len() > s.len() { (t, s) } else { (s, t) };
  let mut name = String::with_capacity(long.len());
  for (lc, sc) in long.chars().zip(short.chars()) {
    if lc == sc || sc == '*' {
      name.push(lc);
    } else if lc == '*' {
      name.push(sc);
    } else {
      name.push('^');
    }
  }
  name.push_str(&long[short.len()..]);
  name
}
