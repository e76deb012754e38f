use std::collections::BTreeSet;

use chrono::NaiveDate;
use itertools::Itertools;

use super::{
    error::{Error, Result},
    product::SkuId,
};

/// Closed calendar interval, both endpoints included.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if start > end {
            return Err(Error::InvalidRange { start, end });
        }

        Ok(Self { start, end })
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn num_days(&self) -> usize {
        (self.end - self.start).num_days() as usize + 1
    }

    pub fn days(&self) -> impl Iterator<Item = NaiveDate> + Clone {
        let end = self.end;
        self.start.iter_days().take_while(move |day| *day <= end)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GridCell {
    pub sku_id: SkuId,
    pub date: NaiveDate,
}

impl GridCell {
    /// Every SKU paired with every day of `range`, ordered by (sku, day).
    ///
    /// Repeated SKUs collapse to one; the grid always holds exactly
    /// `distinct skus × range.num_days()` cells.
    pub fn grid(skus: impl IntoIterator<Item = SkuId>, range: DateRange) -> Vec<Self> {
        let skus: BTreeSet<_> = skus.into_iter().collect();

        skus.iter()
            .cartesian_product(range.days())
            .map(|(sku_id, date)| GridCell {
                sku_id: sku_id.clone(),
                date,
            })
            .collect()
    }
}
