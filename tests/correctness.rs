//! Correctness tests for the region/warehouse aggregation + edge cases.
//!
//! Builds small deterministic tables, runs a selection through the pipeline,
//! and asserts exact series values.

use std::fs;
use std::sync::Arc;

use arrow_array::{ArrayRef, Date32Array, Int64Array, RecordBatch, StringArray};
use arrow_schema::{DataType, Field, Schema};
use chrono::NaiveDate;
use parquet::arrow::ArrowWriter;

use stock_lens::aggregate::{aggregate, BarKind, Report};
use stock_lens::chart::{self, ChartOptions};
use stock_lens::error::DashboardError;
use stock_lens::notice::NoticeLevel;
use stock_lens::store::{StoreConfig, TableStore};
use stock_lens::types::*;

fn d(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn inv(asin: &str, day: &str, region: Region, available: i64) -> InventoryRecord {
    InventoryRecord {
        asin: asin.into(),
        sku: format!("SKU-{asin}"),
        product_name: format!("Product {asin}"),
        date: d(day),
        region,
        fulfillable_quantity: Some(available),
        reserved: Some(0),
        inbound: Some(0),
    }
}

fn order(asin: &str, id: &str, placed: &str, dispatched: Option<&str>, qty: i64, region: Region, wh: Warehouse) -> OrderRecord {
    OrderRecord {
        asin: asin.into(),
        sku: format!("SKU-{asin}"),
        order_id: id.into(),
        order_date: d(placed),
        dispatch_date: dispatched.map(d),
        quantity: qty,
        target_region: region,
        warehouse: wh,
        channel_name: "Amazon.co.uk".into(),
    }
}

fn select(asin: &str, start: &str, end: &str) -> QuerySelection {
    QuerySelection::new(asin, d(start), d(end))
}

// ── Test 1: the B000TEST1 walk-through ──
// UK inventory 01..03 with Available [10, 8, 12], one Dawson order placed
// on the 2nd and dispatched on the 3rd.
#[test]
fn test_single_uk_dawson_order() {
    let store = TableStore::from_records(
        vec![
            inv("B000TEST1", "2024-01-01", Region::Uk, 10),
            inv("B000TEST1", "2024-01-02", Region::Uk, 8),
            inv("B000TEST1", "2024-01-03", Region::Uk, 12),
        ],
        Some(vec![order("B000TEST1", "O-1", "2024-01-02", Some("2024-01-03"), 5, Region::Uk, Warehouse::Dawson)]),
    );

    let report = aggregate(&store, &select("B000TEST1", "2024-01-01", "2024-01-03"));
    let p = report.product().expect("expected data for B000TEST1");

    let available: Vec<_> = p.uk.inventory.iter().map(|pt| pt.available).collect();
    assert_eq!(available, vec![Some(10), Some(8), Some(12)]);

    let placed = p.uk.bar(BarKind::PlacedDawson).expect("Placed (Dawson) series");
    assert_eq!(placed.points, vec![SeriesPoint { date: d("2024-01-02"), quantity_sum: 5 }]);
    let dispatched = p.uk.bar(BarKind::DispatchedDawson).expect("Dispatched (Dawson) series");
    assert_eq!(dispatched.points, vec![SeriesPoint { date: d("2024-01-03"), quantity_sum: 5 }]);

    assert!(p.eu.is_empty(), "EU chart should be empty, got {:?}", p.eu);
    assert_eq!(p.uk_orders.rows.len(), 1);
    assert!(!p.eu_orders.has_orders);
}

// ── Test 2: EU-only inventory with Dawson + Romania orders ──
#[test]
fn test_eu_only_with_romania() {
    let store = TableStore::from_records(
        vec![
            inv("B000EU", "2024-03-01", Region::Eu, 40),
            inv("B000EU", "2024-03-02", Region::Eu, 35),
        ],
        Some(vec![
            order("B000EU", "O-1", "2024-03-01", Some("2024-03-02"), 2, Region::Eu, Warehouse::Dawson),
            order("B000EU", "O-2", "2024-03-01", Some("2024-03-01"), 3, Region::Eu, Warehouse::Romania),
            order("B000EU", "O-3", "2024-03-02", None, 4, Region::Eu, Warehouse::Romania),
        ]),
    );

    let report = aggregate(&store, &select("B000EU", "2024-03-01", "2024-03-31"));
    let p = report.product().unwrap();

    assert!(p.uk.bars.is_empty(), "UK must have no order bars");
    assert!(p.uk.inventory.is_empty());

    let kinds: Vec<_> = p.eu.bars.iter().map(|b| b.kind).collect();
    assert_eq!(
        kinds,
        vec![BarKind::PlacedDawson, BarKind::DispatchedDawson, BarKind::PlacedRomania, BarKind::DispatchedRomania]
    );
    let ro_placed = p.eu.bar(BarKind::PlacedRomania).unwrap();
    assert_eq!(ro_placed.at(d("2024-03-01")), Some(3));
    assert_eq!(ro_placed.at(d("2024-03-02")), Some(4));
    // The undispatched Romania order is simply absent from Dispatched.
    let ro_disp = p.eu.bar(BarKind::DispatchedRomania).unwrap();
    assert_eq!(ro_disp.points, vec![SeriesPoint { date: d("2024-03-01"), quantity_sum: 3 }]);
}

// ── Test 3: Romania orders addressed to UK never surface ──
#[test]
fn test_romania_never_in_uk_view() {
    let store = TableStore::from_records(
        vec![inv("B1", "2024-01-01", Region::Uk, 1)],
        Some(vec![
            order("B1", "O-1", "2024-01-01", Some("2024-01-01"), 7, Region::Uk, Warehouse::Romania),
            order("B1", "O-2", "2024-01-01", Some("2024-01-01"), 1, Region::Uk, Warehouse::Dawson),
        ]),
    );
    let report = aggregate(&store, &select("B1", "2024-01-01", "2024-01-01"));
    let p = report.product().unwrap();

    assert!(p.uk.bar(BarKind::PlacedRomania).is_none());
    assert!(p.uk.bar(BarKind::DispatchedRomania).is_none());
    assert_eq!(p.uk.bar(BarKind::PlacedDawson).unwrap().total(), 1);
    // The order table lists every warehouse for the region.
    assert_eq!(p.uk_orders.rows.len(), 2);
}

// ── Test 4: inclusive bounds ──
#[test]
fn test_date_bounds_are_inclusive() {
    let store = TableStore::from_records(
        vec![
            inv("B1", "2024-01-01", Region::Uk, 1),
            inv("B1", "2024-01-02", Region::Uk, 2),
            inv("B1", "2024-01-03", Region::Uk, 3),
            inv("B1", "2024-01-04", Region::Uk, 4),
        ],
        Some(vec![
            order("B1", "O-1", "2024-01-01", None, 1, Region::Uk, Warehouse::Dawson),
            order("B1", "O-2", "2024-01-02", None, 1, Region::Uk, Warehouse::Dawson),
            order("B1", "O-3", "2024-01-03", None, 1, Region::Uk, Warehouse::Dawson),
            order("B1", "O-4", "2024-01-04", None, 1, Region::Uk, Warehouse::Dawson),
        ]),
    );
    let report = aggregate(&store, &select("B1", "2024-01-02", "2024-01-03"));
    let p = report.product().unwrap();

    let dates: Vec<_> = p.uk.inventory.iter().map(|pt| pt.date).collect();
    assert_eq!(dates, vec![d("2024-01-02"), d("2024-01-03")]);
    let ids: Vec<_> = p.uk_orders.rows.iter().map(|r| r.order_id.as_str()).collect();
    assert_eq!(ids, vec!["O-3", "O-2"]);
}

// ── Test 5: full order history feeds the bars, the table is windowed ──
#[test]
fn test_bars_use_full_history() {
    let store = TableStore::from_records(
        vec![inv("B1", "2024-06-01", Region::Uk, 9)],
        Some(vec![
            order("B1", "O-OLD", "2024-01-15", Some("2024-01-16"), 6, Region::Uk, Warehouse::Dawson),
            order("B1", "O-NEW", "2024-06-01", None, 2, Region::Uk, Warehouse::Dawson),
        ]),
    );
    let sel = select("B1", "2024-06-01", "2024-06-30");
    let report = aggregate(&store, &sel);
    let p = report.product().unwrap();

    let placed = p.uk.bar(BarKind::PlacedDawson).unwrap();
    assert_eq!(placed.total(), 8);
    assert_eq!(placed.at(d("2024-01-15")), Some(6));
    assert_eq!(p.uk_orders.rows.len(), 1);
    assert_eq!(p.uk_orders.rows[0].order_id, "O-NEW");

    // The locked chart crops the view, not the series.
    let spec = chart::render(&p.uk, p.start_date, p.end_date, ChartOptions { lock_x_axis: true });
    assert_eq!(spec.x_bounds(), Some((d("2024-06-01"), d("2024-06-30"))));
    assert_eq!(spec.bars[0].points.len(), 2);
}

// ── Test 6: latest row wins for the product header ──
#[test]
fn test_latest_row_supplies_header() {
    let mut old = inv("B1", "2024-01-02", Region::Uk, 1);
    old.product_name = "Old Name".into();
    old.sku = "SKU-OLD".into();
    let mut first_rev = inv("B1", "2024-01-05", Region::Eu, 1);
    first_rev.product_name = "Revision A".into();
    let mut last_rev = inv("B1", "2024-01-05", Region::Uk, 1);
    last_rev.product_name = "Revision B".into();
    last_rev.sku = "SKU-NEW".into();

    // Table order deliberately not date-sorted.
    let store = TableStore::from_records(vec![first_rev, last_rev, old], None);
    let report = aggregate(&store, &select("B1", "2024-01-01", "2024-01-31"));
    let p = report.product().unwrap();
    assert_eq!(p.product_name, "Revision B");
    assert_eq!(p.sku, "SKU-NEW");
}

// ── Edge: unknown ASIN and empty window ──
#[test]
fn test_edge_unknown_asin_reports_no_data() {
    let store = TableStore::from_records(vec![inv("B1", "2024-01-01", Region::Uk, 1)], None);

    match aggregate(&store, &select("B2", "2024-01-01", "2024-12-31")) {
        Report::NoInventory { asin, notice } => {
            assert_eq!(asin, "B2");
            assert_eq!(notice.level, NoticeLevel::Warning);
            assert_eq!(notice.message, "No Inventory data found for B2 in this period.");
        }
        other => panic!("expected NoInventory, got {other:?}"),
    }

    // Known ASIN, nothing in the window.
    assert!(matches!(
        aggregate(&store, &select("B1", "2024-02-01", "2024-02-28")),
        Report::NoInventory { .. }
    ));
}

// ── Edge: lookup is case-sensitive and exact ──
#[test]
fn test_edge_asin_match_is_exact() {
    let store = TableStore::from_records(vec![inv("B00abc", "2024-01-01", Region::Uk, 1)], None);
    for candidate in ["B00ABC", "B00ab", "B00abcd"] {
        assert!(
            aggregate(&store, &select(candidate, "2024-01-01", "2024-01-01")).product().is_none(),
            "{candidate} must not match B00abc"
        );
    }
    assert!(aggregate(&store, &select(" B00abc ", "2024-01-01", "2024-01-01")).product().is_some());
}

// ── Edge: no orders table at all ──
#[test]
fn test_edge_missing_orders_table() {
    let store = TableStore::from_records(vec![inv("B1", "2024-01-01", Region::Uk, 5)], None);
    let report = aggregate(&store, &select("B1", "2024-01-01", "2024-01-01"));
    let p = report.product().unwrap();

    assert!(p.uk.bars.is_empty() && p.eu.bars.is_empty());
    assert_eq!(p.uk.inventory.len(), 1);
    assert!(p.notices.iter().any(|n| n.message.contains("No order table")));
    assert!(p.notices.iter().all(|n| n.level == NoticeLevel::Info));
}

// ── Edge: inventory region and order target region are independent ──
#[test]
fn test_edge_region_axes_not_conflated() {
    let store = TableStore::from_records(
        vec![inv("B1", "2024-01-01", Region::Uk, 5)],
        Some(vec![order("B1", "O-1", "2024-01-01", None, 3, Region::Eu, Warehouse::Dawson)]),
    );
    let report = aggregate(&store, &select("B1", "2024-01-01", "2024-01-01"));
    let p = report.product().unwrap();
    assert!(p.uk.bars.is_empty());
    assert_eq!(p.eu.bar(BarKind::PlacedDawson).unwrap().total(), 3);
    assert!(p.eu.inventory.is_empty());
}

// ── Table store: Parquet + CSV round through the real readers ──

fn write_parquet(path: &std::path::Path, batch: &RecordBatch) {
    let file = fs::File::create(path).unwrap();
    let mut writer = ArrowWriter::try_new(file, batch.schema(), None).unwrap();
    writer.write(batch).unwrap();
    writer.close().unwrap();
}

fn inventory_batch() -> RecordBatch {
    let s = |v: Vec<&str>| Arc::new(StringArray::from(v)) as ArrayRef;
    let schema = Schema::new(vec![
        Field::new("asin", DataType::Utf8, false),
        Field::new("sku", DataType::Utf8, false),
        Field::new("product-name", DataType::Utf8, false),
        Field::new("Date", DataType::Date32, false),
        Field::new("Region", DataType::Utf8, false),
        Field::new("Fulfillable Quantity", DataType::Int64, true),
        Field::new("Reserved", DataType::Int64, true),
        Field::new("Inbound", DataType::Int64, true),
    ]);
    // 19723 = 2024-01-01
    RecordBatch::try_new(
        Arc::new(schema),
        vec![
            s(vec!["B000TEST1", "B000TEST1"]),
            s(vec!["SKU-1", "SKU-1"]),
            s(vec!["Widget", "Widget"]),
            Arc::new(Date32Array::from(vec![19723, 19724])),
            s(vec!["UK", "EU"]),
            Arc::new(Int64Array::from(vec![Some(10i64), None])),
            Arc::new(Int64Array::from(vec![1, 2])),
            Arc::new(Int64Array::from(vec![0, 0])),
        ],
    )
    .unwrap()
}

#[test]
fn test_store_reads_parquet_inventory_and_csv_orders() {
    let dir = tempfile::tempdir().unwrap();
    let inventory_path = dir.path().join("master_inventory_data.parquet");
    let orders_path = dir.path().join("master_order_data.csv");

    write_parquet(&inventory_path, &inventory_batch());
    fs::write(
        &orders_path,
        "asin,sku,Order ID,Order Date,Dispatch Date,Quantity,Target_Region,Warehouse,Channel Name\n\
         B000TEST1,SKU-1,O-1,2024-01-02,2024-01-03,5,UK,Dawson,Amazon.co.uk\n\
         B000TEST1,SKU-1,O-2,2024-01-02,,4,EU,Romania,Amazon.de\n",
    )
    .unwrap();

    let store = TableStore::open(&StoreConfig { inventory_path, orders_path }).unwrap();
    assert_eq!(store.inventory().len(), 2);
    assert_eq!(store.inventory()[1].fulfillable_quantity, None);
    assert_eq!(store.date_bounds(), Some((d("2024-01-01"), d("2024-01-02"))));

    let orders = store.orders().expect("orders should load from CSV");
    assert_eq!(orders.len(), 2);
    assert_eq!(orders[0].dispatch_date, Some(d("2024-01-03")));
    assert_eq!(orders[1].dispatch_date, None);
    assert_eq!(orders[1].warehouse, Warehouse::Romania);

    let report = aggregate(&store, &select("B000TEST1", "2024-01-01", "2024-01-02"));
    let p = report.product().unwrap();
    assert_eq!(p.uk.bar(BarKind::DispatchedDawson).unwrap().at(d("2024-01-03")), Some(5));
    assert!(p.eu.bar(BarKind::DispatchedRomania).unwrap().points.is_empty());
}

#[test]
fn test_store_csv_keeps_zero_led_identifiers() {
    let dir = tempfile::tempdir().unwrap();
    let inventory_path = dir.path().join("master_inventory_data.csv");
    let orders_path = dir.path().join("master_order_data.csv");

    fs::write(
        &inventory_path,
        "asin,sku,product-name,Date,Region,Fulfillable Quantity,Reserved,Inbound\n\
         0316769487,00123,Paperback,2024-01-01,UK,7,0,0\n",
    )
    .unwrap();
    fs::write(
        &orders_path,
        "asin,sku,Order ID,Order Date,Dispatch Date,Quantity,Target_Region,Warehouse,Channel Name\n\
         0316769487,00123,0042,2024-01-01,2024-01-01,2,UK,Dawson,Amazon.co.uk\n",
    )
    .unwrap();

    let store = TableStore::open(&StoreConfig { inventory_path, orders_path }).unwrap();
    assert_eq!(store.inventory()[0].asin, "0316769487");
    assert_eq!(store.inventory()[0].sku, "00123");
    assert_eq!(store.orders().unwrap()[0].order_id, "0042");

    let report = aggregate(&store, &select("0316769487", "2024-01-01", "2024-01-01"));
    let p = report.product().expect("zero-led ASIN should match exactly");
    assert_eq!(p.sku, "00123");
    assert_eq!(p.uk.bar(BarKind::PlacedDawson).unwrap().total(), 2);
    assert_eq!(p.uk_orders.rows[0].order_id, "0042");
}

#[test]
fn test_store_missing_orders_degrades() {
    let dir = tempfile::tempdir().unwrap();
    let inventory_path = dir.path().join("inv.parquet");
    write_parquet(&inventory_path, &inventory_batch());

    let store = TableStore::open(&StoreConfig {
        inventory_path,
        orders_path: dir.path().join("absent.parquet"),
    })
    .unwrap();
    assert!(!store.has_orders());
}

#[test]
fn test_store_unreadable_orders_degrades() {
    let dir = tempfile::tempdir().unwrap();
    let inventory_path = dir.path().join("inv.parquet");
    let orders_path = dir.path().join("orders.csv");
    write_parquet(&inventory_path, &inventory_batch());
    fs::write(&orders_path, "asin,sku\nB000TEST1,SKU-1\n").unwrap();

    let store = TableStore::open(&StoreConfig { inventory_path, orders_path }).unwrap();
    assert!(!store.has_orders());
}

#[test]
fn test_store_missing_inventory_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let err = TableStore::open(&StoreConfig {
        inventory_path: dir.path().join("master_inventory_data.parquet"),
        orders_path: dir.path().join("master_order_data.parquet"),
    })
    .err()
    .expect("missing inventory must fail");
    assert!(matches!(err, DashboardError::MissingInventory { .. }));
}
