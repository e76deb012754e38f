use std::{collections::HashSet, path::Path};

use rusqlite::{
    params,
    types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef},
    Connection, OpenFlags, Row, ToSql,
};
use rust_decimal::{prelude::ToPrimitive, Decimal};
use tracing::{debug, info};

use crate::{
    domain::{
        product::{Product, SkuId},
        revenue::RevenueRow,
        sales::{RawSalesEvent, RawTimestamp},
    },
    error::{Error, Result},
};

pub const PRODUCT_TABLE: &str = "product";
pub const SALES_TABLE: &str = "sales";
pub const REVENUE_TABLE: &str = "revenue";

const PRODUCT_COLUMNS: [&str; 2] = ["sku_id", "price"];
const SALES_COLUMNS: [&str; 3] = ["sku_id", "orderdate_utc", "sales"];

/// SQLite database holding the source relations and the revenue output.
///
/// The connection lives as long as the store and is released on drop,
/// whichever way the run ends.
pub struct Store {
    conn: Connection,
    path: String,
}

impl Store {
    /// Opens an existing database. A missing file, or one that is not a
    /// database, is a connection error rather than a fresh empty database.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let shown = path.display().to_string();
        let connection_failure = |source| Error::Connection {
            path: shown.clone(),
            source,
        };

        info!(path = %shown, "connecting to store");
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(connection_failure)?;
        // SQLite reads the file header lazily.
        conn.query_row("PRAGMA schema_version", [], |_| Ok(()))
            .map_err(connection_failure)?;

        Ok(Self { conn, path: shown })
    }

    pub fn load_products(&self) -> Result<Vec<Product>> {
        self.select(PRODUCT_TABLE, &PRODUCT_COLUMNS, |row| {
            Ok(Product {
                sku_id: row.get(0)?,
                price: row.get::<_, SqlDecimal>(1)?.0,
            })
        })
    }

    pub fn load_sales(&self) -> Result<Vec<RawSalesEvent>> {
        self.select(SALES_TABLE, &SALES_COLUMNS, |row| {
            Ok(RawSalesEvent {
                sku_id: row.get(0)?,
                ordered_at: row.get(1)?,
                quantity: row.get(2)?,
            })
        })
    }

    /// Drops and recreates the revenue table with `rows`, in one transaction.
    ///
    /// On failure the transaction rolls back and the previous table stays as
    /// it was.
    pub fn replace_revenue(&mut self, rows: &[RevenueRow]) -> Result<usize> {
        let tx = self.conn.transaction().map_err(write_failure)?;

        tx.execute_batch(&format!(
            "DROP TABLE IF EXISTS {REVENUE_TABLE};
             CREATE TABLE {REVENUE_TABLE} (
                 sku_id NOT NULL,
                 date_id TEXT NOT NULL,
                 price REAL NOT NULL,
                 sales INTEGER NOT NULL,
                 revenue REAL NOT NULL
             );"
        ))
        .map_err(write_failure)?;

        {
            let mut insert = tx
                .prepare(&format!(
                    "INSERT INTO {REVENUE_TABLE} (sku_id, date_id, price, sales, revenue)
                     VALUES (?1, ?2, ?3, ?4, ?5)"
                ))
                .map_err(write_failure)?;

            for row in rows {
                insert
                    .execute(params![
                        row.sku_id,
                        row.date,
                        row.price.to_f64(),
                        row.quantity,
                        row.revenue.to_f64(),
                    ])
                    .map_err(write_failure)?;
            }
        }

        tx.commit().map_err(write_failure)?;
        debug!(rows = rows.len(), table = REVENUE_TABLE, "replaced table");

        Ok(rows.len())
    }

    /// Lower-cased column names of `table`, empty when it does not exist.
    fn columns(&self, table: &str) -> Result<HashSet<String>> {
        let read_failure = |source| Error::Read {
            table: table.to_owned(),
            source,
        };

        let mut stmt = self
            .conn
            .prepare(&format!("PRAGMA table_info({table})"))
            .map_err(read_failure)?;
        let columns = stmt
            .query_map([], |row| {
                row.get::<_, String>(1).map(|name| name.to_ascii_lowercase())
            })
            .map_err(read_failure)?
            .collect::<rusqlite::Result<_>>()
            .map_err(read_failure)?;

        Ok(columns)
    }

    fn select<T>(
        &self,
        table: &str,
        columns: &[&str],
        map: impl FnMut(&Row<'_>) -> rusqlite::Result<T>,
    ) -> Result<Vec<T>> {
        let present = self.columns(table)?;
        if present.is_empty() {
            return Err(Error::schema(table, "table does not exist"));
        }
        if let Some(missing) = columns.iter().find(|column| !present.contains(**column)) {
            return Err(Error::schema(table, format!("missing column `{missing}`")));
        }

        let failure = |err| select_failure(table, columns, err);
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {} FROM {table}", columns.join(", ")))
            .map_err(failure)?;
        let rows = stmt
            .query_map([], map)
            .map_err(failure)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(failure)?;

        debug!(table, rows = rows.len(), "loaded table");
        Ok(rows)
    }
}

impl Drop for Store {
    fn drop(&mut self) {
        info!(path = %self.path, "closing store connection");
    }
}

fn write_failure(source: rusqlite::Error) -> Error {
    Error::Write {
        table: REVENUE_TABLE.to_owned(),
        source,
    }
}

/// Values of the wrong storage class are schema problems, not I/O ones.
fn select_failure(table: &str, columns: &[&str], err: rusqlite::Error) -> Error {
    let column = |idx: usize| columns.get(idx).copied().unwrap_or("?");

    match err {
        rusqlite::Error::InvalidColumnType(_, name, ty) => {
            Error::schema(table, format!("column `{name}` holds a {ty} value"))
        }
        rusqlite::Error::FromSqlConversionFailure(idx, ty, source) => Error::schema(
            table,
            format!("column `{}` holds an unusable {ty} value: {source}", column(idx)),
        ),
        source => Error::Read {
            table: table.to_owned(),
            source,
        },
    }
}

/// Decimal stored as INTEGER, REAL or TEXT.
struct SqlDecimal(Decimal);

impl FromSql for SqlDecimal {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        match value {
            ValueRef::Integer(int) => Ok(SqlDecimal(Decimal::from(int))),
            ValueRef::Real(real) => Decimal::try_from(real)
                .map(SqlDecimal)
                .map_err(|err| FromSqlError::Other(Box::new(err))),
            ValueRef::Text(_) => value
                .as_str()?
                .trim()
                .parse()
                .map(SqlDecimal)
                .map_err(|err: rust_decimal::Error| FromSqlError::Other(Box::new(err))),
            _ => Err(FromSqlError::InvalidType),
        }
    }
}

impl FromSql for SkuId {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        match value {
            ValueRef::Integer(id) => Ok(SkuId::Int(id)),
            ValueRef::Text(_) => value.as_str().map(SkuId::from),
            _ => Err(FromSqlError::InvalidType),
        }
    }
}

impl ToSql for SkuId {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            SkuId::Int(id) => ToSqlOutput::from(*id),
            SkuId::Text(id) => ToSqlOutput::from(id.as_str()),
        })
    }
}

/// REAL values have no agreed epoch, so they are handed to the normalizer as
/// text and rejected there.
impl FromSql for RawTimestamp {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        match value {
            ValueRef::Integer(secs) => Ok(RawTimestamp::Unix(secs)),
            ValueRef::Real(real) => Ok(RawTimestamp::Text(real.to_string())),
            ValueRef::Text(_) => value.as_str().map(|text| RawTimestamp::Text(text.to_owned())),
            _ => Err(FromSqlError::InvalidType),
        }
    }
}
