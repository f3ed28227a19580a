use std::error::Error;

/// Boxed static error type
pub type Err = Box<dyn Error + 'static>;

/// Takes a list where each element is a set of choices, and returns all the possible sets
/// generated, keeping the order of the list. Will clone the elements.
///
/// ```
/// let v = vec![
///   vec![1],
///   vec![2, 3],
///   vec![4],
/// ];
///
/// assert_eq!(linkparse::utils::combinations(&v), vec![
///   vec![1, 2, 4],
///   vec![1, 3, 4],
/// ]);
/// ```
pub fn combinations<T>(list: &[Vec<T>]) -> Vec<Vec<T>>
where
  T: Clone,
{
  if list.is_empty() {
    Vec::new()
  } else if list.len() == 1 {
    list[0].iter().map(|e| vec![e.clone()]).collect()
  } else {
    let (head, tail) = list.split_at(1);
    let head = &head[0];

    head
      .iter()
      .flat_map(|v| {
        // prepend every element of the head to every possible subseq
        combinations(tail).into_iter().map(move |mut subseq| {
          subseq.insert(0, v.clone());
          subseq
        })
      })
      .collect()
  }
}

/// Byte-for-byte hash of a connector's type letters, masked by callers into
/// power-of-two tables.
pub fn string_hash(s: &str) -> u32 {
  s.bytes()
    .fold(0x811c_9dc5u32, |h, b| (h ^ u32::from(b)).wrapping_mul(0x0100_0193))
}
