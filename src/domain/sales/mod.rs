use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use itertools::Itertools;

use super::{
    error::{Error, Result},
    product::SkuId,
};

const DATETIME_FORMATS: [&str; 3] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// An order timestamp as stored, before normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawTimestamp {
    Text(String),
    /// Seconds since the Unix epoch.
    Unix(i64),
}

impl RawTimestamp {
    fn parse(&self) -> Option<NaiveDateTime> {
        match self {
            RawTimestamp::Unix(secs) => {
                DateTime::<Utc>::from_timestamp(*secs, 0).map(|ts| ts.naive_utc())
            }
            RawTimestamp::Text(text) => {
                let text = text.trim();

                DateTime::parse_from_rfc3339(text)
                    .map(|ts| ts.naive_utc())
                    .ok()
                    .or_else(|| {
                        DATETIME_FORMATS
                            .iter()
                            .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
                    })
                    .or_else(|| {
                        NaiveDate::parse_from_str(text, "%Y-%m-%d")
                            .ok()
                            .and_then(|date| date.and_hms_opt(0, 0, 0))
                    })
            }
        }
    }
}

impl std::fmt::Display for RawTimestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RawTimestamp::Text(text) => f.write_str(text),
            RawTimestamp::Unix(secs) => write!(f, "{secs}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawSalesEvent {
    pub sku_id: SkuId,
    pub ordered_at: RawTimestamp,
    pub quantity: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SalesEvent {
    pub sku_id: SkuId,
    /// Order instant in UTC.
    pub ordered_at: NaiveDateTime,
    pub quantity: i64,
}

impl SalesEvent {
    /// Parses every raw timestamp. A single bad value rejects the whole batch.
    pub fn normalize(raw: impl IntoIterator<Item = RawSalesEvent>) -> Result<Vec<Self>> {
        raw.into_iter()
            .enumerate()
            .map(|(row, event)| -> Result<SalesEvent> {
                let ordered_at = event.ordered_at.parse().ok_or_else(|| Error::Parse {
                    row,
                    sku_id: event.sku_id.clone(),
                    value: event.ordered_at.to_string(),
                })?;

                Ok(SalesEvent {
                    sku_id: event.sku_id,
                    ordered_at,
                    quantity: event.quantity,
                })
            })
            .collect()
    }

    pub fn date(&self) -> NaiveDate {
        self.ordered_at.date()
    }
}

/// Total quantity sold for one SKU on one calendar day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailyAggregate {
    pub sku_id: SkuId,
    pub date: NaiveDate,
    pub quantity: i64,
}

impl DailyAggregate {
    /// Buckets events by (sku, day) and sums their quantities.
    ///
    /// Time of day is discarded. Days without events are absent from the
    /// output; the assembler fills them in. Output is ordered by (sku, day).
    pub fn from_events<'a>(
        events: impl IntoIterator<Item = &'a SalesEvent>,
    ) -> Result<Vec<Self>> {
        events
            .into_iter()
            .into_group_map_by(|event| (event.sku_id.clone(), event.date()))
            .into_iter()
            .sorted_unstable_by(|(a, _), (b, _)| a.cmp(b))
            .map(|((sku_id, date), events)| {
                let quantity = events
                    .iter()
                    .try_fold(0i64, |total, event| total.checked_add(event.quantity));

                match quantity {
                    Some(quantity) => Ok(DailyAggregate {
                        sku_id,
                        date,
                        quantity,
                    }),
                    None => Err(Error::Overflow { sku_id, date }),
                }
            })
            .collect()
    }
}
