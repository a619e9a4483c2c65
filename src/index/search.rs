//! Binary search bounds over ascending slices
//!
//! - `lower_bound`: first element `>= target`, or `len` when there is none
//! - `upper_bound`: last element `<= target`, or `None` when there is none
//!
//! The `_by_key` forms compare elements through a projection, so the same
//! search runs over raw numbers and over position lists keyed by a record
//! field. Input must be ascending by the compared key.

/// Index of the first element `>= target`; `seq.len()` if none
pub fn lower_bound<T: PartialOrd>(seq: &[T], target: &T) -> usize {
    seq.partition_point(|value| value < target)
}

/// Index of the last element `<= target`; `None` if every element is greater
pub fn upper_bound<T: PartialOrd>(seq: &[T], target: &T) -> Option<usize> {
    seq.partition_point(|value| value <= target).checked_sub(1)
}

/// `lower_bound` comparing `key(element)` against `target`
pub fn lower_bound_by_key<T, K, F>(seq: &[T], target: K, mut key: F) -> usize
where
    K: PartialOrd,
    F: FnMut(&T) -> K,
{
    seq.partition_point(|element| key(element) < target)
}

/// `upper_bound` comparing `key(element)` against `target`
pub fn upper_bound_by_key<T, K, F>(seq: &[T], target: K, mut key: F) -> Option<usize>
where
    K: PartialOrd,
    F: FnMut(&T) -> K,
{
    seq.partition_point(|element| key(element) <= target)
        .checked_sub(1)
}
