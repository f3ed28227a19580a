//! Per-parse preparation of the sentence's words: cost filtering, connector
//! length limits and nearest-word bounds.

use tracing::debug;

use crate::connector::{easy_match, Connector, UNLIMITED_LEN};
use crate::disjunct::{Disjunct, Word};
use crate::options::ParseOptions;

fn length_limit(c: &Connector, opts: &ParseOptions, unlimited: Option<&[String]>) -> usize {
  if opts.all_short {
    return opts.short_length;
  }
  match unlimited {
    None => UNLIMITED_LEN,
    Some(set) if set.iter().any(|u| easy_match(u, c.label())) => UNLIMITED_LEN,
    Some(_) => opts.short_length,
  }
}

/// Sets length limits and nearest words on `d`, a disjunct of word `w` in a
/// sentence of `len` words. Returns false if it can never be satisfied there.
fn prepare_disjunct(
  d: &mut Disjunct,
  w: usize,
  len: usize,
  opts: &ParseOptions,
  unlimited: Option<&[String]>,
) -> bool {
  let m = d.left.len();
  if m > w {
    return false;
  }
  for (i, c) in d.left.iter_mut().enumerate() {
    c.length_limit = length_limit(c, opts, unlimited);
    c.nearest_word = w - (m - i);
  }

  let m = d.right.len();
  if w + m >= len {
    return false;
  }
  for (i, c) in d.right.iter_mut().enumerate() {
    c.length_limit = length_limit(c, opts, unlimited);
    c.nearest_word = w + (m - i);
  }
  true
}

/// Readies dictionary words for one parse. Disjuncts over the cost cap, or
/// that cannot fit in the sentence, are dropped.
pub fn prepare_words(
  mut words: Vec<Word>,
  opts: &ParseOptions,
  unlimited: Option<&[String]>,
) -> Vec<Word> {
  let len = words.len();
  let mut total = 0;
  let mut dropped = 0;

  for (w, word) in words.iter_mut().enumerate() {
    let before = word.disjuncts.len();
    word
      .disjuncts
      .retain_mut(|d| {
        d.cost <= opts.disjunct_cost && prepare_disjunct(d, w, len, opts, unlimited)
      });
    total += word.disjuncts.len();
    dropped += before - word.disjuncts.len();
  }

  debug!(words = len, disjuncts = total, dropped, "prepared sentence");
  words
}
