use std::cell::Cell;
use std::time::{Duration, Instant};

use tracing::warn;

/// Wall-clock and memory budget for one parse call.
///
/// Exhaustion flags are sticky: once a limit is hit the flag stays set until
/// [`Resources::reset`], even if memory is released afterwards. The flags live
/// in `Cell`s so the governor can be shared by reference through the engine.
#[derive(Debug)]
pub struct Resources {
  max_parse_time: Option<Duration>,
  max_memory: Option<usize>,
  start: Cell<Instant>,
  stopped_at: Cell<Option<Duration>>,
  memory_used: Cell<usize>,
  timer_expired: Cell<bool>,
  memory_exhausted: Cell<bool>,
}

impl Resources {
  pub fn new(max_parse_time: Option<Duration>, max_memory: Option<usize>) -> Self {
    Self {
      max_parse_time,
      max_memory,
      start: Cell::new(Instant::now()),
      stopped_at: Cell::new(None),
      memory_used: Cell::new(0),
      timer_expired: Cell::new(false),
      memory_exhausted: Cell::new(false),
    }
  }

  pub fn unlimited() -> Self {
    Self::new(None, None)
  }

  /// Restarts the clock and clears both flags and the memory counter.
  pub fn reset(&self) {
    self.start.set(Instant::now());
    self.stopped_at.set(None);
    self.memory_used.set(0);
    self.timer_expired.set(false);
    self.memory_exhausted.set(false);
  }

  /// Freezes the clock at the current elapsed time, so flags queried after a
  /// parse describe the parse rather than the caller's later activity.
  pub fn stop(&self) {
    if self.stopped_at.get().is_none() {
      self.stopped_at.set(Some(self.start.get().elapsed()));
    }
  }

  pub fn elapsed(&self) -> Duration {
    self
      .stopped_at
      .get()
      .unwrap_or_else(|| self.start.get().elapsed())
  }

  pub fn time_expired(&self) -> bool {
    if self.timer_expired.get() {
      return true;
    }
    if self.stopped_at.get().is_some() {
      return false;
    }
    if let Some(limit) = self.max_parse_time {
      if self.elapsed() >= limit {
        warn!(?limit, "parse time limit reached");
        self.timer_expired.set(true);
      }
    }
    self.timer_expired.get()
  }

  pub fn memory_exhausted(&self) -> bool {
    self.memory_exhausted.get()
  }

  pub fn exhausted(&self) -> bool {
    // evaluate both so each flag is latched
    let time = self.time_expired();
    self.memory_exhausted() || time
  }

  /// Records `bytes` of new allocation against the budget.
  pub fn charge(&self, bytes: usize) {
    let used = self.memory_used.get().saturating_add(bytes);
    self.memory_used.set(used);
    if let Some(max) = self.max_memory {
      if used > max && !self.memory_exhausted.get() {
        warn!(used, max, "parse memory limit reached");
        self.memory_exhausted.set(true);
      }
    }
  }

  pub fn release(&self, bytes: usize) {
    self
      .memory_used
      .set(self.memory_used.get().saturating_sub(bytes));
  }

  pub fn memory_used(&self) -> usize {
    self.memory_used.get()
  }
}

impl Default for Resources {
  fn default() -> Self {
    Self::unlimited()
  }
}
