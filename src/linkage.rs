use std::fmt;

use crate::connector::{link_name, Connector};
use crate::disjunct::{Disjunct, Word};
use crate::select::LinkageIndex;

/// A link between two words, `lw < rw`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
  pub lw: usize,
  pub rw: usize,
  /// Label of the right-pointing connector on `lw`
  pub left_label: String,
  /// Label of the left-pointing connector on `rw`
  pub right_label: String,
  pub name: String,
}

impl Link {
  pub fn new(lw: usize, rw: usize, left: &Connector, right: &Connector) -> Self {
    Self {
      lw,
      rw,
      left_label: left.label().to_string(),
      right_label: right.label().to_string(),
      name: link_name(left.label(), right.label()),
    }
  }

  /// Words strictly between the two ends
  pub fn span(&self) -> usize {
    self.rw - self.lw - 1
  }

  pub fn crosses(&self, other: &Link) -> bool {
    (self.lw < other.lw && other.lw < self.rw && self.rw < other.rw)
      || (other.lw < self.lw && self.lw < other.rw && other.rw < self.rw)
  }
}

impl fmt::Display for Link {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{} --{}-- {}", self.lw, self.name, self.rw)
  }
}

/// Scores and verdicts attached to a linkage. Filled in once, after
/// post-processing; ranking only reorders linkages.
#[derive(Debug, Clone, PartialEq)]
pub struct LinkageInfo {
  pub index: LinkageIndex,
  pub null_count: usize,
  pub violations: usize,
  pub violation_name: Option<String>,
  pub disjunct_cost: f64,
  pub link_cost: usize,
  pub unused_word_cost: usize,
  pub corpus_cost: f64,
  pub discarded: bool,
}

impl LinkageInfo {
  fn new(index: LinkageIndex, null_count: usize) -> Self {
    Self {
      index,
      null_count,
      violations: 0,
      violation_name: None,
      disjunct_cost: 0.0,
      link_cost: 0,
      unused_word_cost: 0,
      corpus_cost: 0.0,
      discarded: false,
    }
  }

  pub fn add_violation(&mut self, name: impl Into<String>) {
    self.violations += 1;
    if self.violation_name.is_none() {
      self.violation_name = Some(name.into());
    }
  }
}

/// One complete parse: a planar set of links and the disjunct each linked
/// word used.
#[derive(Debug, Clone, PartialEq)]
pub struct Linkage {
  pub(crate) words: Vec<String>,
  pub(crate) links: Vec<Link>,
  pub(crate) disjuncts: Vec<Option<Disjunct>>,
  pub(crate) info: LinkageInfo,
}

impl Linkage {
  /// Assembles a linkage from extracted links and chosen disjunct indices,
  /// computing its costs.
  pub(crate) fn new(
    sentence: &[Word],
    mut links: Vec<Link>,
    chosen: Vec<Option<usize>>,
    index: LinkageIndex,
    null_count: usize,
  ) -> Self {
    links.sort_by_key(|l| (l.lw, l.rw));

    let disjuncts = chosen
      .iter()
      .zip(sentence.iter())
      .map(|(d, w)| d.map(|d| w.disjuncts[d].clone()))
      .collect::<Vec<_>>();

    let words = disjuncts
      .iter()
      .zip(sentence.iter())
      .map(|(d, w)| match d {
        Some(d) if !d.word_string.is_empty() => d.word_string.clone(),
        Some(_) => w.string.clone(),
        None => format!("[{}]", w.string),
      })
      .collect();

    debug_assert!(
      links_fit_disjuncts(&links, &disjuncts),
      "links do not determine the chosen disjuncts"
    );

    let mut info = LinkageInfo::new(index, null_count);
    info.disjunct_cost = disjuncts.iter().flatten().map(|d| d.cost).sum();
    info.link_cost = links.iter().map(Link::span).sum();
    info.unused_word_cost = disjuncts.iter().filter(|d| d.is_none()).count();

    Self {
      words,
      links,
      disjuncts,
      info,
    }
  }

  pub fn num_words(&self) -> usize {
    self.words.len()
  }

  pub fn num_links(&self) -> usize {
    self.links.len()
  }

  /// Displayed spelling of each word; unlinked words are bracketed.
  pub fn words(&self) -> &[String] {
    &self.words
  }

  pub fn links(&self) -> &[Link] {
    &self.links
  }

  pub fn link(&self, idx: usize) -> Option<&Link> {
    self.links.get(idx)
  }

  /// The disjunct chosen for word `w`; None for a null word
  pub fn disjunct(&self, w: usize) -> Option<&Disjunct> {
    self.disjuncts.get(w).and_then(Option::as_ref)
  }

  pub fn disjuncts(&self) -> &[Option<Disjunct>] {
    &self.disjuncts
  }

  pub fn info(&self) -> &LinkageInfo {
    &self.info
  }

  pub fn index(&self) -> LinkageIndex {
    self.info.index
  }

  pub fn violation_name(&self) -> Option<&str> {
    self.info.violation_name.as_deref()
  }

  pub fn disjunct_cost(&self) -> f64 {
    self.info.disjunct_cost
  }

  pub fn link_cost(&self) -> usize {
    self.info.link_cost
  }

  pub fn unused_word_cost(&self) -> usize {
    self.info.unused_word_cost
  }

  pub fn corpus_cost(&self) -> f64 {
    self.info.corpus_cost
  }

  pub fn is_discarded(&self) -> bool {
    self.info.discarded
  }

  /// No two links cross.
  pub fn is_planar(&self) -> bool {
    self
      .links
      .iter()
      .enumerate()
      .all(|(i, a)| self.links[i + 1..].iter().all(|b| !a.crosses(b)))
  }

  /// Approximate heap footprint, for the memory budget.
  pub(crate) fn size_in_bytes(&self) -> usize {
    std::mem::size_of::<Self>()
      + self.links.len() * std::mem::size_of::<Link>()
      + self.disjuncts.len() * std::mem::size_of::<Option<Disjunct>>()
      + self.words.iter().map(String::len).sum::<usize>()
  }
}

/// Every link ends on a connector of the disjunct chosen at each end, and
/// every chosen disjunct has all its connectors used: exactly once, or at
/// least once when the side has a multi connector. Null words have no links.
fn links_fit_disjuncts(links: &[Link], disjuncts: &[Option<Disjunct>]) -> bool {
  let side_fits = |conns: &[Connector], labels: Vec<&str>| {
    let multi = conns.iter().any(Connector::is_multi);
    let count_ok = if multi {
      labels.len() >= conns.len()
    } else {
      labels.len() == conns.len()
    };
    count_ok
      && labels.iter().all(|l| conns.iter().any(|c| c.label() == *l))
      && conns.iter().all(|c| labels.contains(&c.label()))
  };

  disjuncts.iter().enumerate().all(|(w, d)| {
    let lefts = links
      .iter()
      .filter(|l| l.rw == w)
      .map(|l| l.right_label.as_str())
      .collect::<Vec<_>>();
    let rights = links
      .iter()
      .filter(|l| l.lw == w)
      .map(|l| l.left_label.as_str())
      .collect::<Vec<_>>();
    match d {
      Some(d) => side_fits(d.left(), lefts) && side_fits(d.right(), rights),
      None => lefts.is_empty() && rights.is_empty(),
    }
  })
}

impl fmt::Display for Linkage {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    writeln!(f, "{}", self.words.join(" "))?;
    for link in self.links.iter() {
      writeln!(
        f,
        "  {} {} --{}-- {} {}",
        link.lw, self.words[link.lw], link.name, link.rw, self.words[link.rw]
      )?;
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::connector::Direction;

  fn link(lw: usize, rw: usize) -> Link {
    Link::new(
      lw,
      rw,
      &Connector::new("A", Direction::Right, false),
      &Connector::new("A", Direction::Left, false),
    )
  }

  #[test]
  fn test_crossing() {
    assert!(link(0, 2).crosses(&link(1, 3)));
    assert!(link(1, 3).crosses(&link(0, 2)));
    assert!(!link(0, 3).crosses(&link(1, 2)));
    assert!(!link(0, 1).crosses(&link(1, 2)));
    assert!(!link(0, 2).crosses(&link(0, 3)));
  }

  #[test]
  fn test_costs() {
    let words = vec![
      Word::new("a", vec!["A+".parse::<Disjunct>().unwrap()]),
      Word::new("x", vec![]),
      Word::new("b", vec![{
        let mut d: Disjunct = "A-".parse().unwrap();
        d.cost = 1.5;
        d
      }]),
    ];
    let l = Linkage::new(
      &words,
      vec![link(0, 2)],
      vec![Some(0), None, Some(0)],
      LinkageIndex::Exact(0),
      1,
    );
    assert_eq!(l.link_cost(), 1);
    assert_eq!(l.unused_word_cost(), 1);
    assert_eq!(l.disjunct_cost(), 1.5);
    assert_eq!(l.words(), ["a", "[x]", "b"]);
    assert!(l.is_planar());
    assert_eq!(l.to_string(), "a [x] b\n  0 a --A-- 2 b\n");
  }

  #[test]
  fn test_links_must_fit_disjuncts() {
    let d = |s: &str| Some(s.parse::<Disjunct>().unwrap());
    assert!(links_fit_disjuncts(&[link(0, 1)], &[d("A+"), d("A-")]));
    // an unused connector
    assert!(!links_fit_disjuncts(&[link(0, 1)], &[d("A+ & B+"), d("A-")]));
    // a link on a null word
    assert!(!links_fit_disjuncts(&[link(0, 1)], &[d("A+"), None]));
    // a label the disjunct does not have
    assert!(!links_fit_disjuncts(&[link(0, 1)], &[d("A+"), d("B-")]));
    // a multi connector used twice
    assert!(links_fit_disjuncts(
      &[link(0, 1), link(0, 2)],
      &[d("@A+"), d("A-"), d("A-")]
    ));
    assert!(!links_fit_disjuncts(
      &[link(0, 1), link(0, 2)],
      &[d("A+"), d("A-"), d("A-")]
    ));
  }
}
