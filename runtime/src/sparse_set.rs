//! Provides a sparse set of instruction indices, used to de-duplicate threads
//! within a single step of evaluation.

/// A set over the integers `0..capacity` with constant time insertion,
/// membership checks and clearing. Members are kept in insertion order.
pub struct SparseSet {
    dense: Vec<usize>,
    sparse: Vec<usize>,
}

impl SparseSet {
    /// Initializes a new set taking a value representing the maximum size
    /// of the set.
    #[must_use]
    pub fn new(max_len: usize) -> Self {
        Self {
            dense: Vec::with_capacity(max_len),
            sparse: vec![0; max_len],
        }
    }

    /// Inserts a value into the set, returning `false` if it was already a
    /// member.
    pub fn insert(&mut self, val: usize) -> bool {
        if self.contains(val) {
            return false;
        }

        if self.sparse.len() <= val {
            self.sparse.resize((val + 1).next_power_of_two(), 0);
        }

        self.sparse[val] = self.dense.len();
        self.dense.push(val);
        true
    }

    /// Returns `true` if the set contains a value.
    pub fn contains(&self, val: usize) -> bool {
        self.sparse
            .get(val)
            .and_then(|&dense_idx| self.dense.get(dense_idx))
            .map_or(false, |&member| member == val)
    }

    /// Clears the set, removing all values.
    pub fn clear(&mut self) {
        self.dense.clear();
    }
}

#[cfg(test)]
impl SparseSet {
    fn is_empty(&self) -> bool {
        self.dense.is_empty()
    }

    /// The largest value, exclusive, the set can hold without resizing.
    fn capacity(&self) -> usize {
        self.sparse.len()
    }

    fn len(&self) -> usize {
        self.dense.len()
    }

    fn iter(&self) -> impl Iterator<Item = &usize> {
        self.dense.iter()
    }
}

impl core::fmt::Debug for SparseSet {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "SparseSet({:?})", &self.dense)
    }
}
