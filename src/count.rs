//! Counting the linkages of a sentence.
//!
//! A state `(lw, rw, le, re, null_count)` stands for the sub-problem of
//! linking the words strictly between `lw` and `rw`, given that the
//! right-pointing connector list `le` of word `lw` and the left-pointing list
//! `re` of word `rw` still have to be satisfied inside that range, using
//! exactly `null_count` null words. Its count is the number of planar ways to
//! do so. The same state expansion drives extraction, so the enumeration
//! order here defines linkage indices.

use std::collections::{HashMap, TryReserveError};
use std::fmt;

use tracing::{debug, warn};

use crate::connector::Connector;
use crate::disjunct::{Disjunct, Word};
use crate::error::ParseError;
use crate::fast_match::Matcher;
use crate::options::ParseOptions;
use crate::resources::Resources;

/// Number of new memo entries between two resource checks.
const POLL_INTERVAL: usize = 1024;

/// A linkage count, or the marker that it exceeded the configured ceiling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Count {
  Value(u64),
  Overflowed,
}

impl Count {
  pub const ZERO: Self = Self::Value(0);
  pub const ONE: Self = Self::Value(1);

  pub fn is_zero(self) -> bool {
    self == Self::ZERO
  }

  pub fn is_overflowed(self) -> bool {
    self == Self::Overflowed
  }

  /// The exact count, if known
  pub fn value(self) -> Option<u64> {
    match self {
      Self::Value(v) => Some(v),
      Self::Overflowed => None,
    }
  }

  pub fn add(self, other: Self, ceiling: u64) -> Self {
    match (self, other) {
      (Self::Value(a), Self::Value(b)) => match a.checked_add(b) {
        Some(v) if v <= ceiling => Self::Value(v),
        _ => Self::Overflowed,
      },
      _ => Self::Overflowed,
    }
  }

  /// Zero times anything, overflowed included, is zero.
  pub fn mul(self, other: Self, ceiling: u64) -> Self {
    if self.is_zero() || other.is_zero() {
      return Self::ZERO;
    }
    match (self, other) {
      (Self::Value(a), Self::Value(b)) => match a.checked_mul(b) {
        Some(v) if v <= ceiling => Self::Value(v),
        _ => Self::Overflowed,
      },
      _ => Self::Overflowed,
    }
  }
}

impl Default for Count {
  fn default() -> Self {
    Self::ZERO
  }
}

impl fmt::Display for Count {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Value(v) => write!(f, "{}", v),
      Self::Overflowed => write!(f, "overflowed"),
    }
  }
}

/// A connector still to be linked, by position in a disjunct's list. On the
/// left end of a state it indexes the right list of a disjunct of `lw`; on
/// the right end, the left list of a disjunct of `rw`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnRef {
  pub disjunct: usize,
  pub pos: usize,
}

impl ConnRef {
  fn head(disjunct: usize, list: &[Connector]) -> Option<Self> {
    if list.is_empty() {
      None
    } else {
      Some(Self { disjunct, pos: 0 })
    }
  }

  fn next(self, list: &[Connector]) -> Option<Self> {
    if self.pos + 1 < list.len() {
      Some(Self {
        disjunct: self.disjunct,
        pos: self.pos + 1,
      })
    } else {
      None
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct State {
  /// -1 is the virtual edge left of the first word
  pub lw: i32,
  pub rw: i32,
  pub le: Option<ConnRef>,
  pub re: Option<ConnRef>,
  pub null_count: usize,
}

/// One way of splitting a state: a word `word` placed between the two ends,
/// optionally using one of its disjuncts, and the sub-states left and right of
/// it. An absent sub-state contributes a factor of one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Choice {
  pub left: Option<State>,
  pub right: Option<State>,
  pub word: usize,
  pub disjunct: Option<usize>,
  /// The state's `le` links to the disjunct's outermost left connector
  pub link_left: bool,
  /// The disjunct's outermost right connector links to the state's `re`
  pub link_right: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expansion {
  /// A base case: one way (true) or none
  Leaf(bool),
  Choices(Vec<Choice>),
}

/// Arena of counts, indexed through a map from state.
#[derive(Debug, Default)]
struct Memo {
  counts: Vec<Count>,
  index: HashMap<State, usize>,
}

impl Memo {
  fn get(&self, s: &State) -> Option<Count> {
    self.index.get(s).map(|&i| self.counts[i])
  }

  fn insert(&mut self, s: State, count: Count) -> Result<(), TryReserveError> {
    self.counts.try_reserve(1)?;
    self.index.try_reserve(1)?;
    self.index.insert(s, self.counts.len());
    self.counts.push(count);
    Ok(())
  }

  fn len(&self) -> usize {
    self.counts.len()
  }

  const ENTRY_SIZE: usize =
    std::mem::size_of::<State>() + std::mem::size_of::<Count>() + 2 * std::mem::size_of::<usize>();
}

/// Count tables for one null-count attempt.
pub struct CountContext<'a> {
  matcher: &'a Matcher<'a>,
  words: &'a [Word],
  resources: &'a Resources,
  islands_ok: bool,
  ceiling: u64,
  memo: Memo,
  since_poll: usize,
  exhausted: bool,
  error: Option<ParseError>,
}

impl<'a> CountContext<'a> {
  pub fn new(matcher: &'a Matcher<'a>, opts: &ParseOptions, resources: &'a Resources) -> Self {
    Self {
      matcher,
      words: matcher.words(),
      resources,
      islands_ok: opts.islands_ok,
      ceiling: opts.count_ceiling,
      memo: Memo::default(),
      since_poll: 0,
      exhausted: false,
      error: None,
    }
  }

  pub fn words(&self) -> &'a [Word] {
    self.words
  }

  pub fn ceiling(&self) -> u64 {
    self.ceiling
  }

  /// The root state for linkages with exactly `null_count` null words. The
  /// first connected component is free, hence the extra unit.
  pub fn top_state(&self, null_count: usize) -> State {
    State {
      lw: -1,
      rw: self.words.len() as i32,
      le: None,
      re: None,
      null_count: null_count + 1,
    }
  }

  /// Number of linkages with exactly `null_count` null words.
  pub fn total(&mut self, null_count: usize) -> Count {
    let total = self.count(self.top_state(null_count));
    debug!(
      null_count,
      %total,
      memo = self.memo.len(),
      exhausted = self.exhausted,
      "counted linkages"
    );
    if total.is_overflowed() {
      warn!(null_count, ceiling = self.ceiling, "linkage count overflowed");
    }
    total
  }

  /// Set once a resource budget ran out or an allocation failed; counts
  /// computed afterwards are incomplete.
  pub fn is_exhausted(&self) -> bool {
    self.exhausted
  }

  pub fn take_error(&mut self) -> Option<ParseError> {
    self.error.take()
  }

  #[cfg(test)]
  fn memo_len(&self) -> usize {
    self.memo.len()
  }

  fn known_zero(&self, s: &State) -> bool {
    self.memo.get(s).is_some_and(Count::is_zero)
  }

  pub fn count(&mut self, s: State) -> Count {
    if let Some(c) = self.memo.get(&s) {
      return c;
    }
    if self.exhausted {
      return Count::ZERO;
    }

    let count = match self.expand(&s) {
      Expansion::Leaf(true) => Count::ONE,
      Expansion::Leaf(false) => Count::ZERO,
      Expansion::Choices(choices) => {
        let mut total = Count::ZERO;
        for c in choices {
          if c.right.is_some_and(|r| self.known_zero(&r)) {
            continue;
          }
          let l = match c.left {
            Some(l) => self.count(l),
            None => Count::ONE,
          };
          if l.is_zero() {
            continue;
          }
          let r = match c.right {
            Some(r) => self.count(r),
            None => Count::ONE,
          };
          total = total.add(l.mul(r, self.ceiling), self.ceiling);
          if total.is_overflowed() {
            break;
          }
        }
        total
      }
    };

    if !self.exhausted {
      self.store(s, count);
    }
    count
  }

  fn store(&mut self, s: State, count: Count) {
    if let Err(source) = self.memo.insert(s, count) {
      self.error = Some(ParseError::OutOfMemory {
        what: "count memo",
        source,
      });
      self.exhausted = true;
      return;
    }
    self.resources.charge(Memo::ENTRY_SIZE);

    self.since_poll += 1;
    if self.since_poll >= POLL_INTERVAL {
      self.since_poll = 0;
      if self.resources.exhausted() {
        debug!(memo = self.memo.len(), "resources exhausted while counting");
        self.exhausted = true;
      }
    }
  }

  fn disjunct(&self, w: usize, d: usize) -> &'a Disjunct {
    &self.words[w].disjuncts[d]
  }

  /// The connector a state's left end refers to.
  pub fn left_conn(&self, lw: i32, c: ConnRef) -> &'a Connector {
    &self.disjunct(lw as usize, c.disjunct).right[c.pos]
  }

  /// The connector a state's right end refers to.
  pub fn right_conn(&self, rw: i32, c: ConnRef) -> &'a Connector {
    &self.disjunct(rw as usize, c.disjunct).left[c.pos]
  }

  fn nulls_allowed(&self, from: i32, to: i32) -> bool {
    (from..to).all(|w| self.words[w as usize].null_allowed)
  }

  /// All ways of splitting `s`, in the order that defines linkage indices.
  pub fn expand(&self, s: &State) -> Expansion {
    let State {
      lw,
      rw,
      le,
      re,
      null_count: k,
    } = *s;

    if rw == lw + 1 {
      return Expansion::Leaf(le.is_none() && re.is_none() && k == 0);
    }

    if le.is_none() && re.is_none() {
      if !self.islands_ok && lw != -1 {
        return Expansion::Leaf(k == (rw - lw - 1) as usize && self.nulls_allowed(lw + 1, rw));
      }
      return Expansion::Choices(self.component_choices(s));
    }

    let start = match le {
      Some(l) => self.left_conn(lw, l).nearest_word,
      None => (lw + 1) as usize,
    };
    let end = match re {
      Some(r) => self.right_conn(rw, r).nearest_word + 1,
      None => rw as usize,
    };

    let lc = le.map(|l| self.left_conn(lw, l));
    let rc = re.map(|r| self.right_conn(rw, r));
    let mut choices = Vec::new();

    for w in start..end {
      let matches = self
        .matcher
        .form_match_list(w, lc, lw.max(0) as usize, rc, rw as usize);
      for m in matches {
        let d = self.disjunct(w, m.disjunct);
        for lnull in 0..=k {
          let rnull = k - lnull;
          let lefts = if m.match_left {
            self.left_variants(s, w, m.disjunct, lnull)
          } else {
            Vec::new()
          };
          let rights = if m.match_right {
            self.right_variants(s, w, m.disjunct, rnull)
          } else {
            Vec::new()
          };

          for l in lefts.iter() {
            for r in rights.iter() {
              choices.push(Choice {
                left: Some(*l),
                right: Some(*r),
                word: w,
                disjunct: Some(m.disjunct),
                link_left: true,
                link_right: true,
              });
            }
          }

          for l in lefts.iter() {
            choices.push(Choice {
              left: Some(*l),
              right: Some(State {
                lw: w as i32,
                rw,
                le: ConnRef::head(m.disjunct, &d.right),
                re,
                null_count: rnull,
              }),
              word: w,
              disjunct: Some(m.disjunct),
              link_left: true,
              link_right: false,
            });
          }

          if le.is_none() {
            for r in rights.iter() {
              choices.push(Choice {
                left: Some(State {
                  lw,
                  rw: w as i32,
                  le: None,
                  re: ConnRef::head(m.disjunct, &d.left),
                  null_count: lnull,
                }),
                right: Some(*r),
                word: w,
                disjunct: Some(m.disjunct),
                link_left: false,
                link_right: true,
              });
            }
          }
        }
      }
    }

    Expansion::Choices(choices)
  }

  /// With no connectors pending, the next word either starts a new component
  /// using a disjunct with nothing on its left, or is left unlinked. Both
  /// cost one unit of the null budget.
  fn component_choices(&self, s: &State) -> Vec<Choice> {
    let mut choices = Vec::new();
    let k = s.null_count;
    if k == 0 {
      return choices;
    }

    let w = (s.lw + 1) as usize;
    for (idx, d) in self.words[w].disjuncts.iter().enumerate() {
      if d.left.is_empty() {
        choices.push(Choice {
          left: None,
          right: Some(State {
            lw: w as i32,
            rw: s.rw,
            le: ConnRef::head(idx, &d.right),
            re: None,
            null_count: k - 1,
          }),
          word: w,
          disjunct: Some(idx),
          link_left: false,
          link_right: false,
        });
      }
    }

    // Without islands this is only reached from the left edge, and skipping
    // the first word means no component starts at all: the free unit is
    // spent along with the skipped word.
    let skip_cost = if self.islands_ok { 1 } else { 2 };
    if self.words[w].null_allowed && k >= skip_cost {
      choices.push(Choice {
        left: None,
        right: Some(State {
          lw: w as i32,
          rw: s.rw,
          le: None,
          re: None,
          null_count: k - skip_cost,
        }),
        word: w,
        disjunct: None,
        link_left: false,
        link_right: false,
      });
    }

    choices
  }

  /// Sub-states left of `w` once `le` is linked to the outermost left
  /// connector of disjunct `d` of word `w`. Multi connectors may stay
  /// available for further links.
  fn left_variants(&self, s: &State, w: usize, d: usize, null_count: usize) -> Vec<State> {
    let Some(le) = s.le else {
      return Vec::new();
    };
    let le_list = &self.disjunct(s.lw as usize, le.disjunct).right;
    let dl_list = &self.disjunct(w, d).left;
    let dl = ConnRef { disjunct: d, pos: 0 };

    let le_multi = le_list[le.pos].is_multi();
    let dl_multi = dl_list[0].is_multi();

    let state = |le, re| State {
      lw: s.lw,
      rw: w as i32,
      le,
      re,
      null_count,
    };

    let mut states = vec![state(le.next(le_list), dl.next(dl_list))];
    if le_multi {
      states.push(state(Some(le), dl.next(dl_list)));
    }
    if dl_multi {
      states.push(state(le.next(le_list), Some(dl)));
    }
    if le_multi && dl_multi {
      states.push(state(Some(le), Some(dl)));
    }
    states
  }

  /// Sub-states right of `w` once the outermost right connector of disjunct
  /// `d` of word `w` is linked to `re`.
  fn right_variants(&self, s: &State, w: usize, d: usize, null_count: usize) -> Vec<State> {
    let Some(re) = s.re else {
      return Vec::new();
    };
    let re_list = &self.disjunct(s.rw as usize, re.disjunct).left;
    let dr_list = &self.disjunct(w, d).right;
    let dr = ConnRef { disjunct: d, pos: 0 };

    let re_multi = re_list[re.pos].is_multi();
    let dr_multi = dr_list[0].is_multi();

    let state = |le, re| State {
      lw: w as i32,
      rw: s.rw,
      le,
      re,
      null_count,
    };

    let mut states = vec![state(dr.next(dr_list), re.next(re_list))];
    if dr_multi {
      states.push(state(Some(dr), re.next(re_list)));
    }
    if re_multi {
      states.push(state(dr.next(dr_list), Some(re)));
    }
    if dr_multi && re_multi {
      states.push(state(Some(dr), Some(re)));
    }
    states
  }
}

impl Drop for CountContext<'_> {
  fn drop(&mut self) {
    self.resources.release(self.memo.len() * Memo::ENTRY_SIZE);
  }
}
