//! Materializing one linkage out of a counted state space.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::trace;

use crate::count::{Choice, Count, CountContext, Expansion, State};
use crate::linkage::{Link, Linkage};
use crate::select::LinkageIndex;

#[derive(Debug, Default)]
struct Extraction {
  links: Vec<Link>,
  chosen: Vec<Option<usize>>,
}

/// Builds the linkage for `index` among those with exactly `null_count` null
/// words. Sampled indices are drawn with a generator seeded from the marker
/// and `seed`. Returns None if the index is out of range or the counts in
/// `ctx` are incomplete.
pub fn extract_linkage(
  ctx: &mut CountContext<'_>,
  index: LinkageIndex,
  null_count: usize,
  seed: u64,
) -> Option<Linkage> {
  let top = ctx.top_state(null_count);
  let mut out = Extraction {
    links: Vec::new(),
    chosen: vec![None; ctx.words().len()],
  };

  match index {
    LinkageIndex::Exact(i) => walk_exact(ctx, top, i, &mut out)?,
    LinkageIndex::Sampled(marker) => {
      let mut rng = StdRng::seed_from_u64(seed.wrapping_add(marker));
      walk_random(ctx, top, &mut rng, &mut out)?
    }
  }

  let linkage = Linkage::new(ctx.words(), out.links, out.chosen, index, null_count);
  trace!(%index, links = linkage.num_links(), "extracted linkage");
  Some(linkage)
}

fn sub_count(ctx: &mut CountContext<'_>, s: Option<State>) -> Count {
  match s {
    Some(s) => ctx.count(s),
    None => Count::ONE,
  }
}

/// Counts of a choice's two sides, or None when the choice yields nothing.
/// Evaluated in the same order as counting so no extra states are touched.
fn choice_counts(ctx: &mut CountContext<'_>, c: &Choice) -> Option<(Count, Count)> {
  let l = sub_count(ctx, c.left);
  if l.is_zero() {
    return None;
  }
  let r = sub_count(ctx, c.right);
  if r.is_zero() {
    return None;
  }
  Some((l, r))
}

fn record(ctx: &CountContext<'_>, s: &State, c: &Choice, out: &mut Extraction) {
  let Some(d) = c.disjunct else {
    return;
  };
  out.chosen[c.word] = Some(d);
  let disjunct = &ctx.words()[c.word].disjuncts[d];

  if c.link_left {
    if let (Some(le), Some(dl)) = (s.le, disjunct.left.first()) {
      out
        .links
        .push(Link::new(s.lw as usize, c.word, ctx.left_conn(s.lw, le), dl));
    }
  }
  if c.link_right {
    if let (Some(re), Some(dr)) = (s.re, disjunct.right.first()) {
      out
        .links
        .push(Link::new(c.word, s.rw as usize, dr, ctx.right_conn(s.rw, re)));
    }
  }
}

fn walk_exact(
  ctx: &mut CountContext<'_>,
  s: State,
  mut index: u64,
  out: &mut Extraction,
) -> Option<()> {
  let choices = match ctx.expand(&s) {
    Expansion::Leaf(true) if index == 0 => return Some(()),
    Expansion::Leaf(_) => return None,
    Expansion::Choices(choices) => choices,
  };

  for c in choices.iter() {
    let Some((l, r)) = choice_counts(ctx, c) else {
      continue;
    };
    let (l, r) = (l.value()?, r.value()?);
    let n = l.checked_mul(r)?;
    if index < n {
      record(ctx, &s, c, out);
      if let Some(left) = c.left {
        walk_exact(ctx, left, index % l, out)?;
      }
      if let Some(right) = c.right {
        walk_exact(ctx, right, index / l, out)?;
      }
      return Some(());
    }
    index -= n;
  }

  None
}

fn walk_random(
  ctx: &mut CountContext<'_>,
  s: State,
  rng: &mut StdRng,
  out: &mut Extraction,
) -> Option<()> {
  let choices = match ctx.expand(&s) {
    Expansion::Leaf(true) => return Some(()),
    Expansion::Leaf(false) => return None,
    Expansion::Choices(choices) => choices,
  };

  let viable = choices
    .into_iter()
    .filter(|c| choice_counts(ctx, c).is_some())
    .collect::<Vec<_>>();
  if viable.is_empty() {
    return None;
  }

  let c = viable[rng.random_range(0..viable.len())];
  record(ctx, &s, &c, out);
  if let Some(left) = c.left {
    walk_random(ctx, left, rng, out)?;
  }
  if let Some(right) = c.right {
    walk_random(ctx, right, rng, out)?;
  }
  Some(())
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::disjunct::Word;
  use crate::fast_match::Matcher;
  use crate::options::ParseOptions;
  use crate::prepare::prepare_words;
  use crate::resources::Resources;

  fn words() -> Vec<Word> {
    let spec: [(&str, &[&str]); 3] = [
      ("a", &["A+", "A+ & B+"]),
      ("b", &["A-", "B-", "A- & C+"]),
      ("c", &["A-", "B-", "C-"]),
    ];
    let words = spec
      .iter()
      .map(|(w, ds)| Word::new(*w, ds.iter().map(|d| d.parse().unwrap()).collect()))
      .collect();
    prepare_words(words, &ParseOptions::default(), None)
  }

  #[test]
  fn test_exact_indices_enumerate_distinct_linkages() {
    let words = words();
    let matcher = Matcher::new(&words).unwrap();
    let resources = Resources::unlimited();
    let mut ctx = CountContext::new(&matcher, &ParseOptions::default(), &resources);
    assert_eq!(ctx.total(0), Count::Value(2));

    let a = extract_linkage(&mut ctx, LinkageIndex::Exact(0), 0, 0).unwrap();
    let b = extract_linkage(&mut ctx, LinkageIndex::Exact(1), 0, 0).unwrap();
    assert_ne!(a.links(), b.links());
    for l in [&a, &b] {
      assert_eq!(l.num_links(), 2);
      assert!(l.is_planar());
      assert!(l.links().windows(2).all(|w| (w[0].lw, w[0].rw) <= (w[1].lw, w[1].rw)));
    }
    assert!(extract_linkage(&mut ctx, LinkageIndex::Exact(2), 0, 0).is_none());
  }

  #[test]
  fn test_sampled_is_idempotent() {
    let words = words();
    let matcher = Matcher::new(&words).unwrap();
    let resources = Resources::unlimited();
    let mut ctx = CountContext::new(&matcher, &ParseOptions::default(), &resources);
    ctx.total(0);

    let a = extract_linkage(&mut ctx, LinkageIndex::Sampled(3), 0, 11).unwrap();
    let b = extract_linkage(&mut ctx, LinkageIndex::Sampled(3), 0, 11).unwrap();
    assert_eq!(a, b);
  }
}
