//! Data module - CSV loading and cleaning

mod cleaner;
mod dataset;
mod loader;

pub use cleaner::DataCleaner;
pub use dataset::Dataset;
pub use loader::{
    DataLoader, LoadError, COL_BUILT_AREA, COL_DECORATION, COL_DISTRICT, COL_TOTAL_PRICE,
    COL_UNIT_PRICE,
};
