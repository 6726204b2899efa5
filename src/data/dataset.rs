//! Dataset Module
//! The loaded listings table together with its cleaned copy.

use polars::prelude::*;
use std::path::Path;

use super::cleaner::DataCleaner;
use super::loader::{DataLoader, LoadError};

/// The raw listings frame and the copy with incomplete rows removed.
///
/// Both variants coexist for the lifetime of the run: views over a single
/// column skip that column's nulls themselves and keep the most data by
/// reading the raw frame, while views that relate several columns read the
/// cleaned one. Every aggregation call site passes its variant explicitly.
pub struct Dataset {
    raw: DataFrame,
    cleaned: DataFrame,
}

impl Dataset {
    /// Load the listings file and build the cleaned copy. Fatal on a
    /// missing file or schema mismatch; there is nothing to analyze
    /// without the data.
    pub fn load(path: &Path) -> Result<Self, LoadError> {
        let raw = DataLoader::load_csv(path)?;
        let cleaned = DataCleaner::drop_missing(&raw)?;
        Ok(Self { raw, cleaned })
    }

    pub fn raw(&self) -> &DataFrame {
        &self.raw
    }

    pub fn cleaned(&self) -> &DataFrame {
        &self.cleaned
    }

    pub fn raw_rows(&self) -> usize {
        self.raw.height()
    }

    pub fn cleaned_rows(&self) -> usize {
        self.cleaned.height()
    }
}
