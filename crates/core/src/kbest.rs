//! Bounded best-first lists.

/// Keeps the `capacity` highest-scoring items in descending order.
///
/// Ties keep arrival order: an item is inserted after every entry whose
/// score is greater than or equal to its own, so the first-seen of two equal
/// scores stays ahead and an equal-scored newcomer to a full list is
/// dropped.
///
/// # Example
///
/// ```rust
/// use deplm_core::KBestList;
///
/// let mut best = KBestList::new(2);
/// best.add(0.5, "a");
/// best.add(0.9, "b");
/// best.add(0.5, "c");
/// assert_eq!(best.items(), vec![&"b", &"a"]);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct KBestList<T> {
    capacity: usize,
    entries: Vec<(f64, T)>,
}

impl<T> KBestList<T> {
    /// An empty list holding at most `capacity` items.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: Vec::with_capacity(capacity),
        }
    }

    /// Offer an item.
    pub fn add(&mut self, score: f64, item: T) {
        if self.capacity == 0 {
            return;
        }
        let at = self
            .entries
            .iter()
            .position(|(existing, _)| *existing < score)
            .unwrap_or(self.entries.len());
        if at >= self.capacity {
            return;
        }
        self.entries.insert(at, (score, item));
        self.entries.truncate(self.capacity);
    }

    /// Lowest retained score, `None` while empty.
    pub fn worst(&self) -> Option<f64> {
        self.entries.last().map(|(score, _)| *score)
    }

    /// Number of retained items.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is retained.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether `capacity` items are retained.
    pub fn is_full(&self) -> bool {
        self.entries.len() >= self.capacity
    }

    /// Maximum number of items.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// `(score, item)` pairs, best first.
    pub fn entries(&self) -> &[(f64, T)] {
        &self.entries
    }

    /// Items only, best first.
    pub fn items(&self) -> Vec<&T> {
        self.entries.iter().map(|(_, item)| item).collect()
    }

    /// Consume into `(score, item)` pairs, best first.
    pub fn into_entries(self) -> Vec<(f64, T)> {
        self.entries
    }
}
