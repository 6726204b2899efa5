//! fangjia - Shanghai housing listings analysis & chart generator
//!
//! Loads the 2018-09 listings snapshot, drops incomplete rows into a
//! cleaned copy, and renders the descriptive charts to `charts/`. The run
//! is a batch: the load is fatal, individual charts are not.

mod charts;
mod data;
mod stats;

use std::path::{Path, PathBuf};

use anyhow::Context;
use charts::{ChartRenderer, ChartStyle, RenderError};
use data::Dataset;
use stats::{AggregationError, Aggregator};

const LISTINGS_PATH: &str = "data/2018-09_shanghai_listings.csv";
const OUTPUT_DIR: &str = "charts";
const CHART_COUNT: usize = 8;

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let dataset = Dataset::load(Path::new(LISTINGS_PATH))
        .with_context(|| format!("cannot load listings from {LISTINGS_PATH}"))?;
    log::info!(
        "loaded {} listings ({} after cleaning)",
        dataset.raw_rows(),
        dataset.cleaned_rows()
    );

    let renderer = ChartRenderer::new(OUTPUT_DIR, ChartStyle::default());
    let mut failed = 0usize;
    let mut done = |name: &str, result: anyhow::Result<PathBuf>| match result {
        Ok(path) => log::info!("{name}: wrote {}", path.display()),
        Err(err) => {
            failed += 1;
            log::error!("{name}: {err:#}");
        }
    };

    // Single-column views read the raw frame and skip that column's nulls
    // themselves; the cross tabulation relates two categorical columns and
    // reads the cleaned frame.
    done(
        "price histogram",
        chart(Aggregator::unit_prices(dataset.raw()), |prices| {
            renderer.price_histogram(&prices)
        }),
    );
    done(
        "district median bars",
        chart(
            Aggregator::district_median_unit_price(dataset.raw()),
            |medians| renderer.district_median_bars(&medians),
        ),
    );
    done(
        "area/price scatter",
        chart(Aggregator::area_total_price_pairs(dataset.raw()), |pairs| {
            renderer.area_price_scatter(&pairs)
        }),
    );
    done(
        "district mean heatmap",
        chart(
            Aggregator::district_mean_unit_price(dataset.raw()),
            |means| renderer.district_mean_heatmap(&means),
        ),
    );
    done(
        "decoration pie",
        chart(Aggregator::decoration_counts(dataset.raw()), |counts| {
            renderer.decoration_pie(&counts)
        }),
    );
    done(
        "district boxplot",
        chart(
            Aggregator::unit_price_by_district(dataset.raw()),
            |groups| renderer.district_boxplot(&groups),
        ),
    );
    done(
        "decoration stacked bars",
        chart(
            Aggregator::district_decoration_table(dataset.cleaned()),
            |table| renderer.decoration_stacked_bars(&table),
        ),
    );
    done(
        "district mean line",
        chart(
            Aggregator::district_mean_unit_price(dataset.raw()),
            |means| renderer.district_mean_line(&means),
        ),
    );

    if failed == CHART_COUNT {
        anyhow::bail!("all {CHART_COUNT} charts failed");
    }
    if failed > 0 {
        log::warn!("{failed} of {CHART_COUNT} charts failed");
    }
    Ok(())
}

/// Compute one derived view and hand it to the renderer. Both stages are
/// recoverable per chart; the caller decides what a failure means.
fn chart<T>(
    view: Result<T, AggregationError>,
    render: impl FnOnce(T) -> Result<PathBuf, RenderError>,
) -> anyhow::Result<PathBuf> {
    let view = view?;
    Ok(render(view)?)
}
