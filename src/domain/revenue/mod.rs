use std::collections::HashMap;

use itertools::Itertools;
use rust_decimal::Decimal;
use serde::Serialize;

use super::{
    error::{Error, Result},
    grid::GridCell,
    product::{PriceIndex, SkuId},
    sales::DailyAggregate,
};

/// One output row per grid cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RevenueRow {
    pub sku_id: SkuId,
    /// ISO-8601 calendar date.
    #[serde(rename = "date_id")]
    pub date: String,
    pub price: Decimal,
    #[serde(rename = "sales")]
    pub quantity: i64,
    pub revenue: Decimal,
}

impl RevenueRow {
    /// Densifies the sparse daily aggregates over the grid and prices each
    /// cell.
    ///
    /// Cells without an aggregate sell zero. The result holds exactly one row
    /// per grid cell, ordered by (sku, date).
    pub fn assemble(
        grid: &[GridCell],
        prices: &PriceIndex,
        aggregates: &[DailyAggregate],
    ) -> Result<Vec<Self>> {
        let sold: HashMap<_, _> = aggregates
            .iter()
            .map(|agg| ((&agg.sku_id, agg.date), agg.quantity))
            .collect();

        let mut rows = Vec::with_capacity(grid.len());

        for cell in grid.iter().sorted() {
            let price = prices.price(&cell.sku_id)?;
            let quantity = sold
                .get(&(&cell.sku_id, cell.date))
                .copied()
                .unwrap_or_default();
            let revenue = price
                .checked_mul(Decimal::from(quantity))
                .ok_or_else(|| Error::Overflow {
                    sku_id: cell.sku_id.clone(),
                    date: cell.date,
                })?;

            rows.push(RevenueRow {
                sku_id: cell.sku_id.clone(),
                date: cell.date.format("%Y-%m-%d").to_string(),
                price,
                quantity,
                revenue,
            });
        }

        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    use super::*;
    use crate::domain::{grid::DateRange, product::Product};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn grid(skus: &[i64], start: NaiveDate, end: NaiveDate) -> Vec<GridCell> {
        let range = DateRange::new(start, end).unwrap();
        GridCell::grid(skus.iter().copied().map(SkuId::Int), range)
    }

    fn prices(products: &[(i64, Decimal)]) -> PriceIndex {
        let products: Vec<_> = products
            .iter()
            .map(|&(sku_id, price)| Product {
                sku_id: SkuId::Int(sku_id),
                price,
            })
            .collect();
        PriceIndex::new(&products).unwrap()
    }

    fn sold(sku_id: i64, date: NaiveDate, quantity: i64) -> DailyAggregate {
        DailyAggregate {
            sku_id: SkuId::Int(sku_id),
            date,
            quantity,
        }
    }

    fn row(sku_id: i64, date: &str, price: Decimal, quantity: i64) -> RevenueRow {
        RevenueRow {
            sku_id: SkuId::Int(sku_id),
            date: date.to_owned(),
            price,
            quantity,
            revenue: price * Decimal::from(quantity),
        }
    }

    #[test]
    fn prices_sold_quantity() {
        let day = date(2025, 1, 1);
        let grid = grid(&[1], day, day);

        let rows =
            RevenueRow::assemble(&grid, &prices(&[(1, dec!(10))]), &[sold(1, day, 3)]).unwrap();

        assert_eq!(rows, [row(1, "2025-01-01", dec!(10), 3)]);
        assert_eq!(rows[0].revenue, dec!(30));
    }

    #[test]
    fn unsold_cell_defaults_to_zero() {
        let day = date(2025, 1, 1);
        let grid = grid(&[1], day, day);

        let rows = RevenueRow::assemble(&grid, &prices(&[(1, dec!(10))]), &[]).unwrap();

        assert_eq!(rows[0].quantity, 0);
        assert_eq!(rows[0].revenue, Decimal::ZERO);
    }

    #[test]
    fn keeps_decimal_precision() {
        let day = date(2025, 1, 1);
        let grid = grid(&[1], day, day);

        let rows =
            RevenueRow::assemble(&grid, &prices(&[(1, dec!(0.333))]), &[sold(1, day, 3)]).unwrap();

        assert_eq!(rows[0].revenue, dec!(0.999));
    }

    #[test]
    fn densifies_sparse_sales() {
        let grid = grid(&[2, 1], date(2025, 1, 1), date(2025, 1, 2));
        let aggregates = [sold(1, date(2025, 1, 1), 2), sold(9, date(2025, 1, 1), 4)];

        let rows = RevenueRow::assemble(
            &grid,
            &prices(&[(1, dec!(10)), (2, dec!(5))]),
            &aggregates,
        )
        .unwrap();

        assert_eq!(
            rows,
            [
                row(1, "2025-01-01", dec!(10), 2),
                row(1, "2025-01-02", dec!(10), 0),
                row(2, "2025-01-01", dec!(5), 0),
                row(2, "2025-01-02", dec!(5), 0),
            ]
        );
    }

    #[test]
    fn joins_text_skus() {
        let day = date(2025, 1, 1);
        let grid = GridCell::grid([SkuId::from("A-1")], DateRange::new(day, day).unwrap());
        let catalog = PriceIndex::new(&[Product {
            sku_id: "A-1".into(),
            price: dec!(4),
        }])
        .unwrap();
        let aggregates = [DailyAggregate {
            sku_id: "A-1".into(),
            date: day,
            quantity: 2,
        }];

        let rows = RevenueRow::assemble(&grid, &catalog, &aggregates).unwrap();

        assert_eq!(rows[0].sku_id, SkuId::from("A-1"));
        assert_eq!(rows[0].revenue, dec!(8));
    }

    #[test]
    fn row_count_follows_grid_not_sales() {
        let grid = grid(&[1, 2, 3], date(2025, 1, 1), date(2025, 1, 10));
        let dense: Vec<_> = grid
            .iter()
            .map(|cell| DailyAggregate {
                sku_id: cell.sku_id.clone(),
                date: cell.date,
                quantity: 1,
            })
            .collect();
        let catalog = prices(&[(1, dec!(1)), (2, dec!(2)), (3, dec!(3))]);

        assert_eq!(
            RevenueRow::assemble(&grid, &catalog, &[]).unwrap().len(),
            grid.len()
        );
        assert_eq!(
            RevenueRow::assemble(&grid, &catalog, &dense).unwrap().len(),
            grid.len()
        );
    }

    #[test]
    fn rejects_cell_without_price() {
        let day = date(2025, 1, 1);
        let grid = grid(&[1, 2], day, day);

        assert_eq!(
            RevenueRow::assemble(&grid, &prices(&[(1, dec!(10))]), &[]).unwrap_err(),
            Error::OrphanSku {
                sku_id: SkuId::Int(2),
            }
        );
    }

    #[test]
    fn revenue_overflow_is_an_error() {
        let day = date(2025, 1, 1);
        let grid = grid(&[1], day, day);

        assert_eq!(
            RevenueRow::assemble(
                &grid,
                &prices(&[(1, dec!(10000000000000000000000))]),
                &[sold(1, day, 1_000_000_000)],
            )
            .unwrap_err(),
            Error::Overflow {
                sku_id: SkuId::Int(1),
                date: day,
            }
        );
    }
}
