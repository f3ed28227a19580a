use std::collections::TryReserveError;

/// Tokenized sentences, walls included, must be shorter than this.
pub const MAX_SENTENCE: usize = 254;

/// Errors that abort a parse call. Everything else (no linkage, count
/// overflow, budget exhaustion, violations) is reported through the sentence's
/// counters and flags instead.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
  #[error("sentence too long: {0} words, must be under {max}", max = MAX_SENTENCE)]
  SentenceTooLong(usize),

  #[error("out of memory while building {what}")]
  OutOfMemory {
    what: &'static str,
    #[source]
    source: TryReserveError,
  },
}

impl ParseError {
  pub fn oom(what: &'static str) -> impl FnOnce(TryReserveError) -> Self {
    move |source| Self::OutOfMemory { what, source }
  }
}
