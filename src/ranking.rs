use std::cmp::Ordering;

use crate::linkage::{Linkage, LinkageInfo};
use crate::options::CostModel;

/// Standard ordering: discarded linkages last, then fewer violations, fewer
/// unused words, lower disjunct cost and shorter links.
pub fn compare_standard(a: &LinkageInfo, b: &LinkageInfo) -> Ordering {
  match (a.discarded, b.discarded) {
    (true, false) => return Ordering::Greater,
    (false, true) => return Ordering::Less,
    _ => {}
  }

  if a.violations != b.violations {
    return a.violations.cmp(&b.violations);
  }
  if a.unused_word_cost != b.unused_word_cost {
    return a.unused_word_cost.cmp(&b.unused_word_cost);
  }
  // total_cmp keeps the order total: NaN costs sort after every number.
  // Adding zero folds -0.0 into 0.0.
  match (a.disjunct_cost + 0.0).total_cmp(&(b.disjunct_cost + 0.0)) {
    Ordering::Equal => a.link_cost.cmp(&b.link_cost),
    other => other,
  }
}

/// Corpus costs within this distance of each other count as tied.
const CORPUS_TOLERANCE: f64 = 1.0e-5;

/// Corpus cost snapped to a multiple of the tolerance. Comparing the raw
/// costs with a tolerance is not transitive, which `sort_by` may reject.
fn corpus_key(info: &LinkageInfo) -> f64 {
  (info.corpus_cost / CORPUS_TOLERANCE).round() + 0.0
}

/// Corpus ordering: discarded linkages last, then corpus cost, falling back
/// to the standard ordering when the corpus costs are nearly equal.
pub fn compare_corpus(a: &LinkageInfo, b: &LinkageInfo) -> Ordering {
  match (a.discarded, b.discarded) {
    (true, false) => return Ordering::Greater,
    (false, true) => return Ordering::Less,
    _ => {}
  }

  match corpus_key(a).total_cmp(&corpus_key(b)) {
    Ordering::Equal => compare_standard(a, b),
    other => other,
  }
}

impl CostModel {
  pub fn compare(self, a: &LinkageInfo, b: &LinkageInfo) -> Ordering {
    match self {
      Self::Standard => compare_standard(a, b),
      Self::Corpus => compare_corpus(a, b),
    }
  }
}

/// Stable sort of `linkages`, best first.
pub fn sort_linkages(linkages: &mut [Linkage], model: CostModel) {
  linkages.sort_by(|a, b| model.compare(&a.info, &b.info));
}
