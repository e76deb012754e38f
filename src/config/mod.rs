use std::path::PathBuf;

use chrono::NaiveDate;
use clap::Parser;

use crate::domain::{error::Result, grid::DateRange};

/// Build the per-SKU, per-day revenue table of a SQLite sales database.
#[derive(Debug, Clone, Parser)]
#[command(name = "revenue", version)]
pub struct Config {
    /// Path to the SQLite database holding `product` and `sales`
    #[arg(long, env = "REVENUE_DB")]
    pub db: PathBuf,

    /// First day of the grid (inclusive)
    #[arg(long, env = "REVENUE_START_DATE", default_value = "2025-01-01")]
    pub start_date: NaiveDate,

    /// Last day of the grid (inclusive)
    #[arg(long, env = "REVENUE_END_DATE", default_value = "2025-01-31")]
    pub end_date: NaiveDate,

    /// Number of leading rows to print once assembled, 0 to disable
    #[arg(long, default_value_t = 5)]
    pub preview: usize,

    /// Also write the full table to this CSV file
    #[arg(long)]
    pub export_csv: Option<PathBuf>,

    /// Compute everything but leave the `revenue` table untouched
    #[arg(long)]
    pub dry_run: bool,
}

impl Config {
    pub fn range(&self) -> Result<DateRange> {
        DateRange::new(self.start_date, self.end_date)
    }
}
