use chrono::NaiveDate;
use thiserror::Error;

use super::product::SkuId;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    #[error("could not parse order timestamp {value:?} of sku {sku_id} at row {row}")]
    Parse {
        row: usize,
        sku_id: SkuId,
        value: String,
    },
    #[error("start date {start} is after end date {end}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },
    #[error("no price is known for sku {sku_id}")]
    OrphanSku { sku_id: SkuId },
    #[error("sku {sku_id} appears more than once in the product catalog")]
    DuplicateProduct { sku_id: SkuId },
    #[error("sales of sku {sku_id} on {date} overflow")]
    Overflow { sku_id: SkuId, date: NaiveDate },
}

pub type Result<T> = std::result::Result<T, Error>;
