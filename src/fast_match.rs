//! Fast lookup of the disjuncts on a word that might connect to a given
//! connector arriving from the left or the right.
//!
//! Every word gets two hash tables, one over the outermost left connectors of
//! its disjuncts and one over the outermost right connectors. A table has a
//! slot per connector type, and each slot holds the disjuncts with that type,
//! sorted by how near a word their connector could reach. Queries walk a
//! single slot and stop as soon as the remaining disjuncts cannot reach the
//! querying word.

use std::collections::HashMap;

use tracing::debug;

use crate::connector::{do_match, Connector};
use crate::disjunct::{Disjunct, Word};
use crate::error::ParseError;

/// One candidate disjunct returned by [`Matcher::form_match_list`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Match {
  /// Index into the word's disjunct list
  pub disjunct: usize,
  /// The disjunct's outermost left connector matches the left query connector
  pub match_left: bool,
  /// The disjunct's outermost right connector matches the right query connector
  pub match_right: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
  Left,
  Right,
}

fn head(d: &Disjunct, side: Side) -> Option<&Connector> {
  match side {
    Side::Left => d.left.first(),
    Side::Right => d.right.first(),
  }
}

/// Open-addressed table of buckets; a bucket is the list of disjuncts whose
/// outermost connector on one side has a given uppercase type.
#[derive(Debug)]
struct MatchTable {
  side: Side,
  slots: Vec<Option<Vec<usize>>>,
}

impl MatchTable {
  fn build(disjuncts: &[Disjunct], side: Side) -> Result<Self, ParseError> {
    let len = disjuncts
      .iter()
      .filter(|d| head(d, side).is_some())
      .count();
    let size = len.next_power_of_two();

    let mut slots = Vec::new();
    slots
      .try_reserve_exact(size)
      .map_err(ParseError::oom("match table"))?;
    slots.resize_with(size, || None);

    let mut table = Self { side, slots };
    for (idx, d) in disjuncts.iter().enumerate() {
      if let Some(c) = head(d, side) {
        table.insert(disjuncts, idx, c);
      }
    }
    Ok(table)
  }

  fn mask(&self) -> usize {
    self.slots.len() - 1
  }

  /// Finds the slot holding connectors of `c`'s type, or the empty slot where
  /// they would go. None only if the table is full of other types.
  fn find_slot(&self, disjuncts: &[Disjunct], c: &Connector) -> Option<usize> {
    let start = c.uc_hash() as usize & self.mask();
    let mut h = start;
    loop {
      match &self.slots[h] {
        None => return Some(h),
        Some(bucket) => {
          let occupant = head(&disjuncts[bucket[0]], self.side);
          if occupant.is_some_and(|o| o.uc_eq(c)) {
            return Some(h);
          }
        }
      }
      h = (h + 1) & self.mask();
      if h == start {
        return None;
      }
    }
  }

  fn insert(&mut self, disjuncts: &[Disjunct], idx: usize, c: &Connector) {
    // tables have at least as many slots as connectors, so a slot always exists
    let slot = self
      .find_slot(disjuncts, c)
      .expect("match table sized below its connector count");
    let side = self.side;
    let bucket = self.slots[slot].get_or_insert_with(Vec::new);

    let nearest = |i: &usize| head(&disjuncts[*i], side).map_or(0, |h| h.nearest_word);
    // right tables ascend by nearest word, left tables descend
    let pos = match side {
      Side::Right => bucket.partition_point(|i| nearest(i) < c.nearest_word),
      Side::Left => bucket.partition_point(|i| nearest(i) > c.nearest_word),
    };
    bucket.insert(pos, idx);
  }

  fn lookup(&self, disjuncts: &[Disjunct], c: &Connector) -> &[usize] {
    self
      .find_slot(disjuncts, c)
      .and_then(|h| self.slots[h].as_deref())
      .unwrap_or(&[])
  }
}

/// Per-sentence connector index. Built once per parse and read-only
/// afterwards; query results are returned by value.
#[derive(Debug)]
pub struct Matcher<'a> {
  words: &'a [Word],
  l_tables: Vec<MatchTable>,
  r_tables: Vec<MatchTable>,
}

impl<'a> Matcher<'a> {
  pub fn new(words: &'a [Word]) -> Result<Self, ParseError> {
    let mut l_tables = Vec::new();
    let mut r_tables = Vec::new();
    l_tables
      .try_reserve_exact(words.len())
      .map_err(ParseError::oom("fast matcher"))?;
    r_tables
      .try_reserve_exact(words.len())
      .map_err(ParseError::oom("fast matcher"))?;

    for word in words {
      l_tables.push(MatchTable::build(&word.disjuncts, Side::Left)?);
      r_tables.push(MatchTable::build(&word.disjuncts, Side::Right)?);
    }

    debug!(
      words = words.len(),
      slots = l_tables
        .iter()
        .chain(r_tables.iter())
        .map(|t| t.slots.len())
        .sum::<usize>(),
      "initialized fast matcher"
    );

    Ok(Self {
      words,
      l_tables,
      r_tables,
    })
  }

  pub fn words(&self) -> &'a [Word] {
    self.words
  }

  /// Approximate heap footprint, for the memory budget.
  pub fn size_in_bytes(&self) -> usize {
    self
      .l_tables
      .iter()
      .chain(self.r_tables.iter())
      .map(|t| {
        t.slots.len() * std::mem::size_of::<Option<Vec<usize>>>()
          + t
            .slots
            .iter()
            .flatten()
            .map(|b| b.len() * std::mem::size_of::<usize>())
            .sum::<usize>()
      })
      .sum()
  }

  /// Returns the disjuncts of word `w` whose outermost left connector matches
  /// `lc` (coming from word `lw`) or whose outermost right connector matches
  /// `rc` (coming from word `rw`). Each disjunct appears once, flagged with
  /// the side(s) it matched.
  pub fn form_match_list(
    &self,
    w: usize,
    lc: Option<&Connector>,
    lw: usize,
    rc: Option<&Connector>,
    rw: usize,
  ) -> Vec<Match> {
    let disjuncts = &self.words[w].disjuncts;

    let mut ml: &[usize] = &[];
    if let Some(lc) = lc.filter(|lc| w - lw <= lc.length_limit) {
      let list = self.l_tables[w].lookup(disjuncts, lc);
      if list
        .first()
        .is_some_and(|&d| w - lw <= disjuncts[d].left[0].length_limit)
      {
        ml = list;
      }
    }

    let mut mr: &[usize] = &[];
    if let Some(rc) = rc.filter(|rc| rw - w <= rc.length_limit) {
      let list = self.r_tables[w].lookup(disjuncts, rc);
      if list
        .first()
        .is_some_and(|&d| rw - w <= disjuncts[d].right[0].length_limit)
      {
        mr = list;
      }
    }

    let mut result = Vec::new();

    if let Some(lc) = lc {
      for &d in ml {
        let dl = &disjuncts[d].left[0];
        if dl.nearest_word < lw {
          break;
        }
        if do_match(lc, dl, lw, w) {
          result.push(Match {
            disjunct: d,
            match_left: true,
            match_right: false,
          });
        }
      }
    }

    if let Some(rc) = rc {
      let left_matched = if result.is_empty() || mr.is_empty() {
        HashMap::new()
      } else {
        result
          .iter()
          .enumerate()
          .map(|(pos, m)| (m.disjunct, pos))
          .collect::<HashMap<_, _>>()
      };

      for &d in mr {
        let dr = &disjuncts[d].right[0];
        if dr.nearest_word > rw {
          break;
        }
        if !do_match(dr, rc, w, rw) {
          continue;
        }
        match left_matched.get(&d) {
          Some(&pos) => result[pos].match_right = true,
          None => result.push(Match {
            disjunct: d,
            match_left: false,
            match_right: true,
          }),
        }
      }
    }

    result
  }
}
