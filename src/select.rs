use std::fmt;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, warn};

use crate::count::Count;

/// Which linkage to extract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkageIndex {
  /// Position in the enumeration order of an exactly counted state space
  Exact(u64),
  /// Marker for a pseudo-random linkage when the count overflowed; the same
  /// marker and seed always give the same linkage
  Sampled(u64),
}

impl fmt::Display for LinkageIndex {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Exact(i) => write!(f, "{}", i),
      Self::Sampled(i) => write!(f, "~{}", i),
    }
  }
}

/// Seed for sampling: derived from the sentence itself when sampling must be
/// repeatable, else the sentence's own generator state.
pub fn sampling_seed(found: Count, length: usize, repeatable: bool, rand_state: u64) -> u64 {
  if repeatable {
    found.value().unwrap_or(u64::MAX).wrapping_add(length as u64)
  } else {
    rand_state
  }
}

/// Picks at most `limit` linkage indices out of `found`.
///
/// Counts within the limit are taken whole. Larger counts are cut into
/// `limit` equal blocks with one uniform draw per block, which spreads the
/// sample across the enumeration order. An overflowed count can only be
/// sampled, so it yields `limit` markers. Returns the indices and the
/// generator state after sampling.
pub fn select_linkages(found: Count, limit: usize, seed: u64) -> (Vec<LinkageIndex>, u64) {
  let found = match found {
    Count::Overflowed => {
      warn!(limit, "count overflowed, sampling linkages at random");
      return ((0..limit as u64).map(LinkageIndex::Sampled).collect(), seed);
    }
    Count::Value(v) => v,
  };

  if found <= limit as u64 {
    return ((0..found).map(LinkageIndex::Exact).collect(), seed);
  }

  warn!(found, limit, "too many linkages, sampling a subset");
  debug!(seed, "sampling seed");

  let mut rng = StdRng::seed_from_u64(seed);
  let frac = found as f64 / limit as f64;
  let indices = (0..limit)
    .map(|i| {
      let bottom = (i as f64 * frac) as u64;
      let top = (((i + 1) as f64 * frac) as u64).min(found).max(bottom + 1);
      LinkageIndex::Exact(rng.random_range(bottom..top))
    })
    .collect();

  (indices, rng.random())
}
