//! Reporting utilities: encode tallies and formatted terminal output.

pub mod format;

pub use format::*;

use crate::encode::{EncodeError, RegisterRecord};

/// One failed encode, keyed by its position in the input.
#[derive(Debug, Clone)]
pub struct EncodeFailure {
    /// Segment index, or CSV line for ingested rows.
    pub position: usize,
    pub error: EncodeError,
}

/// Successful records plus per-item failures.
#[derive(Debug, Clone, Default)]
pub struct EncodeSummary {
    pub records: Vec<RegisterRecord>,
    pub failures: Vec<EncodeFailure>,
}

impl EncodeSummary {
    /// Split `(position, result)` pairs into records and failures, keeping order.
    pub fn collect<I>(results: I) -> Self
    where
        I: IntoIterator<Item = (usize, Result<RegisterRecord, EncodeError>)>,
    {
        let mut out = Self::default();
        for (position, result) in results {
            match result {
                Ok(record) => out.records.push(record),
                Err(error) => out.failures.push(EncodeFailure { position, error }),
            }
        }
        out
    }

    pub fn total(&self) -> usize {
        self.records.len() + self.failures.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collect_splits_results() {
        let summary = EncodeSummary::collect(vec![
            (0, Err(EncodeError::EmptyValidityWindow)),
            (1, Err(EncodeError::FieldOverflow { field: "delay_linear" })),
        ]);
        assert_eq!(summary.total(), 2);
        assert!(summary.records.is_empty());
        assert_eq!(summary.failures[1].position, 1);
    }
}
