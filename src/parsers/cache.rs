use std::fmt;

/// Holds the values of a binary list token that haven't been claimed by a member yet.
///
/// A single `INTEGER_LIST` or `FLOAT_LIST` token usually carries the values of many members (and often of many
/// nested templates), so the remaining values are kept here until the next scalar read. Only one kind of value can
/// be pending at a time.
///
/// Values are stored back to front and popped from the end, which hands them out in the order they were written.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ValueCache {
    ints: Vec<i32>,
    floats: Vec<f64>,
}

/// What the cache is holding right now.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Pending {
    Nothing,
    Ints(usize),
    Floats(usize),
}

impl fmt::Display for Pending {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Pending::Nothing => write!(f, "nothing"),
            Pending::Ints(count) => write!(f, "{} integer(s)", count),
            Pending::Floats(count) => write!(f, "{} float(s)", count),
        }
    }
}

/// Returned when a value of one kind is requested while values of the other kind are pending.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct CacheMismatch {
    pub requested: &'static str,
    pub pending: Pending,
}

impl fmt::Display for CacheMismatch {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "requested a {} while {} from a previous list are pending",
            self.requested, self.pending
        )
    }
}

impl ValueCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.ints.is_empty() && self.floats.is_empty()
    }

    pub fn pending(&self) -> Pending {
        if !self.ints.is_empty() {
            Pending::Ints(self.ints.len())
        } else if !self.floats.is_empty() {
            Pending::Floats(self.floats.len())
        } else {
            Pending::Nothing
        }
    }

    /// Replaces the cache content with `values`. Must only be called on an empty cache.
    pub fn fill_ints(&mut self, mut values: Vec<i32>) {
        debug_assert!(self.is_empty(), "filling a cache that still has values");
        values.reverse();
        self.ints = values;
    }

    /// Replaces the cache content with `values`. Must only be called on an empty cache.
    pub fn fill_floats(&mut self, mut values: Vec<f64>) {
        debug_assert!(self.is_empty(), "filling a cache that still has values");
        values.reverse();
        self.floats = values;
    }

    /// Takes the next pending integer. `Ok(None)` means the cache is empty and a new token has to be read.
    pub fn take_int(&mut self) -> Result<Option<i32>, CacheMismatch> {
        if !self.floats.is_empty() {
            return Err(CacheMismatch {
                requested: "DWORD",
                pending: self.pending(),
            });
        }
        Ok(self.ints.pop())
    }

    /// Takes the next pending float. `Ok(None)` means the cache is empty and a new token has to be read.
    pub fn take_float(&mut self) -> Result<Option<f64>, CacheMismatch> {
        if !self.ints.is_empty() {
            return Err(CacheMismatch {
                requested: "FLOAT",
                pending: self.pending(),
            });
        }
        Ok(self.floats.pop())
    }
}
