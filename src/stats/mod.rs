//! Statistics module - derived views and descriptive helpers

mod aggregator;
mod calculator;

pub use aggregator::{
    AggregationError, Aggregator, CrossTab, AREA_DISPLAY_MAX, TOTAL_PRICE_DISPLAY_MAX,
};
pub use calculator::StatsCalculator;
