//! File-seeded random oracle.
//!
//! The Random replacement policy draws victim indices from a fixed stream of
//! integers loaded at startup, so two runs over the same random file make
//! identical choices. The first value in the file is an advisory count; every
//! value after it is accepted regardless of what the count claims.

use std::fs;
use std::path::Path;

use crate::error::{PaginarError, Result};

/// Deterministic integer stream with bounded-range sampling.
#[derive(Debug, Clone)]
pub struct RandomSource {
    values: Vec<i64>,
    cursor: usize,
}

impl RandomSource {
    /// Load the value stream from a whitespace-separated integer file.
    ///
    /// The first integer is the declared count and is not part of the
    /// stream. A file with no values after the count is an error.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        let mut tokens = text.split_whitespace();

        // Declared count: advisory only, we take whatever follows.
        match tokens.next() {
            Some(tok) => {
                tok.parse::<i64>()
                    .map_err(|_| PaginarError::InvalidRandomValue(tok.to_string()))?;
            }
            None => return Err(PaginarError::EmptyRandomStream),
        }

        let values = tokens
            .map(|tok| {
                tok.parse::<i64>()
                    .map_err(|_| PaginarError::InvalidRandomValue(tok.to_string()))
            })
            .collect::<Result<Vec<i64>>>()?;

        Self::from_values(values)
    }

    /// Build a source from an in-memory stream (the file body without its
    /// leading count).
    pub fn from_values(values: Vec<i64>) -> Result<Self> {
        if values.is_empty() {
            return Err(PaginarError::EmptyRandomStream);
        }
        Ok(Self { values, cursor: 0 })
    }

    /// Next value reduced to `[0, n)`, advancing the cursor and wrapping to
    /// the start of the stream when it runs out.
    ///
    /// Values are reduced by `|v| mod n`; conventional random files hold
    /// non-negative integers, but a negative value cannot push the result
    /// out of range.
    pub fn next_in_range(&mut self, n: usize) -> usize {
        debug_assert!(n > 0, "sampling range must be non-empty");
        if self.cursor >= self.values.len() {
            self.cursor = 0;
        }
        let value = self.values[self.cursor];
        self.cursor += 1;
        (value.unsigned_abs() % n as u64) as usize
    }

    /// Number of values in the stream.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the stream holds no values. Never true for a constructed
    /// source; present for completeness of the container surface.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
