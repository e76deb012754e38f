use std::io::Write;

use csv::{Result, Writer};

use crate::domain::revenue::RevenueRow;

/// Write [`RevenueRow`]s as CSV with a header line.
///
/// Columns follow the stored table: `sku_id,date_id,price,sales,revenue`.
pub fn write<'a>(rows: impl IntoIterator<Item = &'a RevenueRow>, writer: impl Write) -> Result<()> {
    let mut writer = Writer::from_writer(writer);

    for row in rows {
        writer.serialize(row)?;
    }

    writer.flush()?;
    Ok(())
}
