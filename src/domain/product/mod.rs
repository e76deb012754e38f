use std::{
    collections::{hash_map::Entry, HashMap},
    fmt,
};

use rust_decimal::Decimal;
use serde::Serialize;

use super::error::{Error, Result};

/// SKU identifier as stored: an integer or a free-form string.
///
/// Integers sort before strings, so mixed catalogs still have a total order.
/// `Int(1)` and `Text("1")` are distinct SKUs.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(untagged)]
pub enum SkuId {
    Int(i64),
    Text(String),
}

impl From<i64> for SkuId {
    fn from(id: i64) -> Self {
        SkuId::Int(id)
    }
}

impl From<&str> for SkuId {
    fn from(id: &str) -> Self {
        SkuId::Text(id.to_owned())
    }
}

impl fmt::Display for SkuId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkuId::Int(id) => write!(f, "{id}"),
            SkuId::Text(id) => f.write_str(id),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Product {
    pub sku_id: SkuId,
    pub price: Decimal,
}

/// Price lookup keyed by SKU.
///
/// Building the index fails on a repeated SKU: every grid cell must join to
/// exactly one price, otherwise the output would carry duplicate rows.
#[derive(Debug, Default)]
pub struct PriceIndex(HashMap<SkuId, Decimal>);

impl PriceIndex {
    pub fn new<'a>(products: impl IntoIterator<Item = &'a Product>) -> Result<Self> {
        let mut prices = HashMap::new();

        for product in products {
            match prices.entry(product.sku_id.clone()) {
                Entry::Occupied(_) => {
                    return Err(Error::DuplicateProduct {
                        sku_id: product.sku_id.clone(),
                    })
                }
                Entry::Vacant(slot) => {
                    slot.insert(product.price);
                }
            }
        }

        Ok(Self(prices))
    }

    pub fn price(&self, sku_id: &SkuId) -> Result<Decimal> {
        self.0
            .get(sku_id)
            .copied()
            .ok_or_else(|| Error::OrphanSku {
                sku_id: sku_id.clone(),
            })
    }

    pub fn skus(&self) -> impl Iterator<Item = &SkuId> + '_ {
        self.0.keys()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    fn product(sku_id: SkuId, price: Decimal) -> Product {
        Product { sku_id, price }
    }

    #[test]
    fn looks_up_prices_by_sku() {
        let products = [
            product(SkuId::Int(1), dec!(10)),
            product("A-1".into(), dec!(2.50)),
        ];
        let index = PriceIndex::new(&products).unwrap();

        assert_eq!(index.len(), 2);
        assert_eq!(index.price(&SkuId::Int(1)), Ok(dec!(10)));
        assert_eq!(index.price(&"A-1".into()), Ok(dec!(2.50)));
    }

    #[test]
    fn unknown_sku_is_an_orphan() {
        let index = PriceIndex::new(&[product(SkuId::Int(1), dec!(10))]).unwrap();

        assert_eq!(
            index.price(&SkuId::Int(7)),
            Err(Error::OrphanSku {
                sku_id: SkuId::Int(7),
            })
        );
    }

    #[test]
    fn integer_and_text_skus_are_distinct() {
        let index = PriceIndex::new(&[product(SkuId::Int(1), dec!(10))]).unwrap();

        assert!(index.price(&"1".into()).is_err());
    }

    #[test]
    fn integers_sort_before_text() {
        let mut skus = vec![
            SkuId::from("b"),
            SkuId::Int(10),
            SkuId::from("a"),
            SkuId::Int(2),
        ];
        skus.sort();

        assert_eq!(
            skus,
            [
                SkuId::Int(2),
                SkuId::Int(10),
                SkuId::from("a"),
                SkuId::from("b"),
            ]
        );
    }

    #[test]
    fn rejects_repeated_sku() {
        let products = [
            product("A-1".into(), dec!(10)),
            product("A-1".into(), dec!(11)),
        ];

        assert_eq!(
            PriceIndex::new(&products).unwrap_err(),
            Error::DuplicateProduct {
                sku_id: "A-1".into(),
            }
        );
    }
}
