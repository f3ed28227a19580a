//! Checking that the morphemes a linkage chose for each input word all come
//! from the same way of splitting that word.

use regex::Regex;
use tracing::debug;

use crate::disjunct::Word;
use crate::linkage::Linkage;

pub const EMPTY_WORD_MARK: &str = "EMPTY-WORD.zzz";
pub const INFIX_MARK: char = '=';
pub const SUBSCRIPT_MARK: char = '.';
pub const MORPHISM_VIOLATION: &str = "Invalid morphism construction.";

/// Morpheme type letters, as matched by a morpheme-sequence regex
pub mod affix {
  pub const PREFIX: char = 'p';
  pub const STEM: char = 't';
  pub const SUFFIX: char = 's';
  pub const WORD: char = 'w';
  /// Closes every input word
  pub const END: char = 'b';
}

/// The morpheme type of a dictionary word string, None for the empty word.
pub fn affix_type(djw: &str) -> Option<char> {
  if djw == EMPTY_WORD_MARK {
    return None;
  }
  let base = match djw.find(SUBSCRIPT_MARK) {
    Some(idx) => &djw[..idx],
    None => djw,
  };

  if djw.len() > 1 && djw.starts_with(INFIX_MARK) {
    Some(affix::SUFFIX)
  } else if djw[base.len()..].starts_with(".=") {
    Some(affix::STEM)
  } else if base.ends_with(INFIX_MARK) {
    Some(affix::PREFIX)
  } else {
    Some(affix::WORD)
  }
}

/// Does tokenization alternative `alt` spell the chosen dictionary word `djw`?
/// An alternative without a subscript ignores the dictionary subscript; one
/// with a subscript needs an exact match.
pub fn alternative_matches(alt: &str, djw: &str) -> bool {
  let (s, t) = (alt.as_bytes(), djw.as_bytes());
  let mut i = 0;
  while i < s.len() && s[i] != b'[' && i < t.len() && s[i] == t[i] {
    i += 1;
  }

  match (s.get(i), t.get(i)) {
    (None, None) | (None, Some(b'.')) | (None, Some(b'[')) => true,
    (Some(b'['), Some(b'[')) => true,
    _ => false,
  }
}

fn downcase_first(s: &str) -> String {
  let mut chars = s.chars();
  match chars.next() {
    Some(c) => c.to_lowercase().chain(chars).collect(),
    None => String::new(),
  }
}

/// Checks every input word of `linkage` against its tokenization
/// alternatives. Null words, and the morphemes of an input word whose first
/// token is null, are skipped. When `regex` is given and the linkage has no
/// null words, the morpheme type sequence must also match it.
pub fn sane_morphism(
  words: &[Word],
  linkage: &Linkage,
  regex: Option<&Regex>,
  null_count: usize,
) -> bool {
  let mut in_word = false;
  let mut start = 0;
  // per alternative: morphemes matched so far, None once one failed
  let mut matched: Vec<Option<usize>> = Vec::new();
  let mut affix_types = String::new();

  for (i, word) in words.iter().enumerate() {
    let Some(d) = linkage.disjunct(i) else {
      in_word = false;
      continue;
    };
    debug_assert!(
      word.disjuncts.contains(d),
      "word {} linked through a disjunct it does not have",
      i
    );

    if word.unsplit_word.is_some() {
      in_word = true;
      start = i;
      matched = vec![Some(0); word.alternatives.len().max(1)];
    }
    if !in_word {
      continue;
    }

    let djw = if d.word_string.is_empty() {
      word.string.as_str()
    } else {
      d.word_string.as_str()
    };
    if let Some(t) = affix_type(djw) {
      affix_types.push(t);
    }

    let mut found = false;
    for (ai, m) in matched.iter_mut().enumerate() {
      let Some(n) = m else {
        continue;
      };
      let alt = word.alternatives.get(ai).map_or("", String::as_str);
      let ok = alternative_matches(alt, djw)
        || (word.first_upper && !alt.is_empty() && alternative_matches(&downcase_first(alt), djw));
      if ok {
        *n += 1;
        found = true;
      } else {
        *m = None;
      }
    }
    if !found {
      debug!(word = i, djw, "chosen word matches no alternative");
      return false;
    }

    let last_morpheme = words.get(i + 1).is_none_or(|w| w.unsplit_word.is_some());
    if last_morpheme {
      affix_types.push(affix::END);
      let morphemes = i - start + 1;
      if !matched.contains(&Some(morphemes)) {
        debug!(word = start, morphemes, "morphemes missing from linkage");
        return false;
      }
    }
  }

  if let Some(re) = regex {
    if null_count == 0 && !affix_types.is_empty() && !re.is_match(&affix_types) {
      debug!(%affix_types, "invalid morpheme type combination");
      return false;
    }
  }
  true
}
