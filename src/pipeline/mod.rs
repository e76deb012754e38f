use std::{fs::File, io::Write};

use tracing::info;

use crate::{
    config::Config,
    csv,
    domain::{
        grid::{DateRange, GridCell},
        product::PriceIndex,
        revenue::RevenueRow,
        sales::{DailyAggregate, SalesEvent},
    },
    error::Result,
    store::Store,
};

/// Row counts of each stage of a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub products: usize,
    pub events: usize,
    pub grid_cells: usize,
    pub aggregates: usize,
    pub rows: usize,
    /// Rows stored in the revenue table, zero on a dry run.
    pub written: usize,
}

#[derive(Debug)]
pub struct Revenue {
    pub rows: Vec<RevenueRow>,
    pub summary: RunSummary,
}

/// Loads both source tables and assembles the revenue grid over `range`.
///
/// Nothing is written.
pub fn compute(store: &Store, range: DateRange) -> Result<Revenue> {
    let products = store.load_products()?;
    let raw_sales = store.load_sales()?;
    info!(
        products = products.len(),
        events = raw_sales.len(),
        "loaded source tables"
    );

    let events = SalesEvent::normalize(raw_sales)?;
    let prices = PriceIndex::new(&products)?;

    let grid = GridCell::grid(prices.skus().cloned(), range);
    info!(
        cells = grid.len(),
        skus = prices.len(),
        days = range.num_days(),
        start = %range.start(),
        end = %range.end(),
        "built grid"
    );

    let aggregates = DailyAggregate::from_events(&events)?;
    info!(aggregates = aggregates.len(), "aggregated sales");

    let rows = RevenueRow::assemble(&grid, &prices, &aggregates)?;
    info!(rows = rows.len(), "assembled revenue");

    Ok(Revenue {
        summary: RunSummary {
            products: products.len(),
            events: events.len(),
            grid_cells: grid.len(),
            aggregates: aggregates.len(),
            rows: rows.len(),
            written: 0,
        },
        rows,
    })
}

/// Runs the whole batch: validate, load, assemble, preview, export, replace.
///
/// Any failure aborts before the revenue table is touched. The store
/// connection is released on every path.
pub fn run(config: &Config, preview: impl Write) -> Result<RunSummary> {
    let range = config.range()?;
    let mut store = Store::open(&config.db)?;

    let Revenue { rows, mut summary } = compute(&store, range)?;

    if config.preview > 0 {
        csv::write(rows.iter().take(config.preview), preview)?;
    }

    if let Some(path) = &config.export_csv {
        csv::write(&rows, File::create(path)?)?;
        info!(path = %path.display(), rows = rows.len(), "exported csv");
    }

    if config.dry_run {
        info!("dry run, revenue table left untouched");
    } else {
        summary.written = store.replace_revenue(&rows)?;
        info!(rows = summary.written, "saved revenue table");
    }

    Ok(summary)
}
