//! Fixed-capacity circular history of accepted samples.

/// Ring buffer holding the most recent `capacity` samples of one metric.
///
/// The buffer is allocated once and never resized. `len` grows until it
/// reaches `capacity` and never shrinks afterwards.
#[derive(Clone, Debug)]
pub struct RingHistory {
    data: Vec<f64>,
    write_index: usize,
    len: usize,
}

impl RingHistory {
    /// A capacity of zero is bumped to one so the write cursor always has a slot.
    pub fn new(capacity: usize) -> Self {
        Self {
            data: vec![0.0; capacity.max(1)],
            write_index: 0,
            len: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn is_full(&self) -> bool {
        self.len == self.capacity()
    }

    /// Slot the next push will write to.
    pub fn write_index(&self) -> usize {
        self.write_index
    }

    pub fn push(&mut self, value: f64) {
        self.data[self.write_index] = value;
        self.write_index = (self.write_index + 1) % self.capacity();
        if self.len < self.capacity() {
            self.len += 1;
        }
    }

    /// The `age`-th most recent sample; `0` is the newest.
    pub fn newest(&self, age: usize) -> Option<f64> {
        if age >= self.len {
            return None;
        }
        let cap = self.capacity();
        let idx = (self.write_index + cap - 1 - age) % cap;
        Some(self.data[idx])
    }

    /// Samples from newest to oldest.
    pub fn iter_newest_first(&self) -> impl Iterator<Item = f64> + '_ {
        (0..self.len).filter_map(move |age| self.newest(age))
    }

    /// Samples in chronological order, oldest first.
    pub fn iter_oldest_first(&self) -> impl Iterator<Item = f64> + '_ {
        (0..self.len).rev().filter_map(move |age| self.newest(age))
    }
}
