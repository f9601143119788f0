//! Read-only table store.
//!
//! Both upstream tables are read in full exactly once, when [`TableStore::open`]
//! is called at process start. The resulting store is immutable; frontends
//! share it behind an `Arc` and every query reads from the same rows.

use std::collections::HashSet;
use std::fs::File;
use std::io::{ErrorKind, Seek};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use arrow::compute::cast;
use arrow::csv::reader::Format;
use arrow::csv::ReaderBuilder;
use arrow::datatypes::{DataType, Date32Type, Field, Int64Type, Schema};
use arrow_array::cast::AsArray;
use arrow_array::{Array, ArrayRef, Date32Array, Int64Array, RecordBatch, StringArray};
use chrono::NaiveDate;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use tracing::{info, warn};

use crate::error::{DashboardError, Result};
use crate::types::{InventoryRecord, OrderRecord, Region, Warehouse};

pub const INVENTORY_FILE: &str = "master_inventory_data.parquet";
pub const ORDERS_FILE: &str = "master_order_data.parquet";

const INVENTORY: &str = "inventory";
const ORDERS: &str = "orders";

const TEXT_COLUMNS: [&str; 8] = [
    "asin",
    "sku",
    "product-name",
    "Region",
    "Order ID",
    "Target_Region",
    "Warehouse",
    "Channel Name",
];

#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub inventory_path: PathBuf,
    pub orders_path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            inventory_path: PathBuf::from(INVENTORY_FILE),
            orders_path: PathBuf::from(ORDERS_FILE),
        }
    }
}

pub struct TableStore {
    inventory: Vec<InventoryRecord>,
    orders: Option<Vec<OrderRecord>>,
}

impl TableStore {
    /// Loads both tables. A missing or unreadable inventory table is fatal;
    /// the orders table degrades to `None`.
    pub fn open(config: &StoreConfig) -> Result<Self> {
        let batches = match read_batches(&config.inventory_path) {
            Err(DashboardError::Io { source, .. }) if source.kind() == ErrorKind::NotFound => {
                return Err(DashboardError::MissingInventory {
                    path: config.inventory_path.clone(),
                });
            }
            other => other?,
        };
        let inventory = decode_inventory(&batches)?;
        info!(
            path = %config.inventory_path.display(),
            rows = inventory.len(),
            "inventory table loaded"
        );

        let orders = match read_batches(&config.orders_path).and_then(|b| decode_orders(&b)) {
            Ok(rows) => {
                info!(path = %config.orders_path.display(), rows = rows.len(), "orders table loaded");
                Some(rows)
            }
            Err(DashboardError::Io { source, .. }) if source.kind() == ErrorKind::NotFound => {
                info!(path = %config.orders_path.display(), "orders table not found, showing inventory only");
                None
            }
            Err(e) => {
                warn!(path = %config.orders_path.display(), error = %e, "orders table unreadable, showing inventory only");
                None
            }
        };

        Ok(Self::from_records(inventory, orders))
    }

    /// Builds a store from already-decoded rows.
    pub fn from_records(inventory: Vec<InventoryRecord>, orders: Option<Vec<OrderRecord>>) -> Self {
        let unknown_inv = inventory.iter().filter(|r| matches!(r.region, Region::Other(_))).count();
        if unknown_inv > 0 {
            warn!(rows = unknown_inv, "inventory rows with a region other than UK/EU are not shown");
        }
        if let Some(ref rows) = orders {
            let unknown_ord = rows.iter().filter(|r| matches!(r.target_region, Region::Other(_))).count();
            if unknown_ord > 0 {
                warn!(rows = unknown_ord, "order rows with a target region other than UK/EU are not shown");
            }
        }
        Self { inventory, orders }
    }

    pub fn inventory(&self) -> &[InventoryRecord] {
        &self.inventory
    }

    /// `None` when no orders table was available at load time.
    pub fn orders(&self) -> Option<&[OrderRecord]> {
        self.orders.as_deref()
    }

    pub fn has_orders(&self) -> bool {
        self.orders.is_some()
    }

    /// `[min(date), max(date)]` over the whole inventory table.
    pub fn date_bounds(&self) -> Option<(NaiveDate, NaiveDate)> {
        let min = self.inventory.iter().map(|r| r.date).min()?;
        let max = self.inventory.iter().map(|r| r.date).max()?;
        Some((min, max))
    }

    /// The initial filter window: the table's full span, or today when the
    /// inventory table has no rows.
    pub fn default_range(&self) -> (NaiveDate, NaiveDate) {
        self.date_bounds().unwrap_or_else(|| {
            let today = chrono::Local::now().date_naive();
            (today, today)
        })
    }

    pub fn asin_count(&self) -> usize {
        self.inventory.iter().map(|r| r.asin.as_str()).collect::<HashSet<_>>().len()
    }
}

// ── File readers ──

fn read_batches(path: &Path) -> Result<Vec<RecordBatch>> {
    let io_err = |source| DashboardError::Io { path: path.to_path_buf(), source };
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    match ext.as_deref() {
        Some("parquet") => {
            let file = File::open(path).map_err(io_err)?;
            let reader = ParquetRecordBatchReaderBuilder::try_new(file)?.build()?;
            Ok(reader.collect::<std::result::Result<Vec<_>, _>>()?)
        }
        Some("csv") => {
            let mut file = File::open(path).map_err(io_err)?;
            let (inferred, _) = Format::default().with_header(true).infer_schema(&mut file, None)?;
            file.rewind().map_err(io_err)?;
            let reader = ReaderBuilder::new(Arc::new(text_as_utf8(&inferred)))
                .with_header(true)
                .build(file)?;
            Ok(reader.collect::<std::result::Result<Vec<_>, _>>()?)
        }
        _ => Err(DashboardError::UnsupportedFormat { path: path.to_path_buf() }),
    }
}

/// Identifier columns stay text even when every value looks numeric, so
/// zero-led ASINs such as ISBN-10 codes keep their leading zeros.
fn text_as_utf8(inferred: &Schema) -> Schema {
    let fields: Vec<Field> = inferred
        .fields()
        .iter()
        .map(|f| {
            if TEXT_COLUMNS.contains(&f.name().as_str()) {
                Field::new(f.name(), DataType::Utf8, true)
            } else {
                f.as_ref().clone()
            }
        })
        .collect();
    Schema::new(fields)
}

// ── Column access ──
// Every column is cast to one canonical type so upstream type drift
// (LargeUtf8, dictionaries, timestamps, float quantities) decodes the same way.

fn column<'a>(batch: &'a RecordBatch, table: &'static str, name: &'static str) -> Result<&'a ArrayRef> {
    batch
        .column_by_name(name)
        .ok_or(DashboardError::MissingColumn { table, column: name })
}

fn cast_column(
    batch: &RecordBatch,
    table: &'static str,
    name: &'static str,
    to: &DataType,
) -> Result<ArrayRef> {
    let col = column(batch, table, name)?;
    cast(col, to).map_err(|_| DashboardError::ColumnType {
        table,
        column: name,
        data_type: col.data_type().to_string(),
    })
}

fn text_column(batch: &RecordBatch, table: &'static str, name: &'static str) -> Result<StringArray> {
    Ok(cast_column(batch, table, name, &DataType::Utf8)?.as_string::<i32>().clone())
}

fn date_column(batch: &RecordBatch, table: &'static str, name: &'static str) -> Result<Date32Array> {
    Ok(cast_column(batch, table, name, &DataType::Date32)?.as_primitive::<Date32Type>().clone())
}

fn int_column(batch: &RecordBatch, table: &'static str, name: &'static str) -> Result<Int64Array> {
    Ok(cast_column(batch, table, name, &DataType::Int64)?.as_primitive::<Int64Type>().clone())
}

fn text(arr: &StringArray, i: usize) -> String {
    if arr.is_null(i) {
        String::new()
    } else {
        arr.value(i).to_string()
    }
}

fn int(arr: &Int64Array, i: usize) -> Option<i64> {
    arr.is_valid(i).then(|| arr.value(i))
}

fn date(arr: &Date32Array, i: usize) -> Option<NaiveDate> {
    if arr.is_null(i) {
        None
    } else {
        arr.value_as_date(i)
    }
}

// ── Decoders ──

pub(crate) fn decode_inventory(batches: &[RecordBatch]) -> Result<Vec<InventoryRecord>> {
    let mut out = Vec::with_capacity(batches.iter().map(|b| b.num_rows()).sum());
    let mut row_base = 0;

    for batch in batches {
        let asin = text_column(batch, INVENTORY, "asin")?;
        let sku = text_column(batch, INVENTORY, "sku")?;
        let name = text_column(batch, INVENTORY, "product-name")?;
        let dates = date_column(batch, INVENTORY, "Date")?;
        let region = text_column(batch, INVENTORY, "Region")?;
        let fulfillable = int_column(batch, INVENTORY, "Fulfillable Quantity")?;
        let reserved = int_column(batch, INVENTORY, "Reserved")?;
        let inbound = int_column(batch, INVENTORY, "Inbound")?;

        for i in 0..batch.num_rows() {
            let date = date(&dates, i).ok_or(DashboardError::NullValue {
                table: INVENTORY,
                column: "Date",
                row: row_base + i,
            })?;
            out.push(InventoryRecord {
                asin: text(&asin, i),
                sku: text(&sku, i),
                product_name: text(&name, i),
                date,
                region: Region::parse(&text(&region, i)),
                fulfillable_quantity: int(&fulfillable, i),
                reserved: int(&reserved, i),
                inbound: int(&inbound, i),
            });
        }
        row_base += batch.num_rows();
    }
    Ok(out)
}

pub(crate) fn decode_orders(batches: &[RecordBatch]) -> Result<Vec<OrderRecord>> {
    let mut out = Vec::with_capacity(batches.iter().map(|b| b.num_rows()).sum());
    let mut row_base = 0;

    for batch in batches {
        let asin = text_column(batch, ORDERS, "asin")?;
        let sku = text_column(batch, ORDERS, "sku")?;
        let order_id = text_column(batch, ORDERS, "Order ID")?;
        let order_date = date_column(batch, ORDERS, "Order Date")?;
        let dispatch_date = date_column(batch, ORDERS, "Dispatch Date")?;
        let quantity = int_column(batch, ORDERS, "Quantity")?;
        let region = text_column(batch, ORDERS, "Target_Region")?;
        let warehouse = text_column(batch, ORDERS, "Warehouse")?;
        let channel = text_column(batch, ORDERS, "Channel Name")?;

        for i in 0..batch.num_rows() {
            let placed = date(&order_date, i).ok_or(DashboardError::NullValue {
                table: ORDERS,
                column: "Order Date",
                row: row_base + i,
            })?;
            out.push(OrderRecord {
                asin: text(&asin, i),
                sku: text(&sku, i),
                order_id: text(&order_id, i),
                order_date: placed,
                dispatch_date: date(&dispatch_date, i),
                quantity: int(&quantity, i).unwrap_or(0),
                target_region: Region::parse(&text(&region, i)),
                warehouse: Warehouse::parse(&text(&warehouse, i)),
                channel_name: text(&channel, i),
            });
        }
        row_base += batch.num_rows();
    }
    Ok(out)
}
