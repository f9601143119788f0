//! Region/warehouse aggregation.
//!
//! Inventory rows are restricted to the selected window and split by their
//! `region`. Order rows are split by `target_region` and then by warehouse;
//! they are NOT restricted to the window here, the full history feeds the
//! bar series and only the display tables are date-filtered.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::debug;

use crate::notice::Notice;
use crate::store::TableStore;
use crate::types::{InventoryRecord, OrderRecord, QuerySelection, Region, SeriesPoint, Warehouse};

// ── Output types ──

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum BarKind {
    PlacedDawson,
    DispatchedDawson,
    PlacedRomania,
    DispatchedRomania,
}

impl BarKind {
    pub fn label(&self) -> &'static str {
        match self {
            BarKind::PlacedDawson => "Order Placed (Dawson)",
            BarKind::DispatchedDawson => "Dispatched (Dawson)",
            BarKind::PlacedRomania => "Order Placed (RO)",
            BarKind::DispatchedRomania => "Dispatched (RO)",
        }
    }

    pub fn warehouse(&self) -> Warehouse {
        match self {
            BarKind::PlacedDawson | BarKind::DispatchedDawson => Warehouse::Dawson,
            BarKind::PlacedRomania | BarKind::DispatchedRomania => Warehouse::Romania,
        }
    }

    pub fn is_dispatch(&self) -> bool {
        matches!(self, BarKind::DispatchedDawson | BarKind::DispatchedRomania)
    }
}

/// One inventory row as plotted. `None` values are gaps the line bridges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct InventoryPoint {
    pub date: NaiveDate,
    pub available: Option<i64>,
    pub reserved: Option<i64>,
    pub inbound: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BarSeries {
    pub kind: BarKind,
    pub points: Vec<SeriesPoint>,
}

impl BarSeries {
    pub fn total(&self) -> i64 {
        self.points.iter().map(|p| p.quantity_sum).sum()
    }

    pub fn at(&self, date: NaiveDate) -> Option<i64> {
        self.points.iter().find(|p| p.date == date).map(|p| p.quantity_sum)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegionPanel {
    pub region: Region,
    pub inventory: Vec<InventoryPoint>,
    pub bars: Vec<BarSeries>,
}

impl RegionPanel {
    pub fn bar(&self, kind: BarKind) -> Option<&BarSeries> {
        self.bars.iter().find(|b| b.kind == kind)
    }

    pub fn is_empty(&self) -> bool {
        self.inventory.is_empty() && self.bars.is_empty()
    }
}

/// A row of the order history table, columns named as displayed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderRow {
    #[serde(rename = "Order Date")]
    pub order_date: NaiveDate,
    #[serde(rename = "Dispatch Date")]
    pub dispatch_date: Option<NaiveDate>,
    #[serde(rename = "Quantity")]
    pub quantity: i64,
    #[serde(rename = "Order ID")]
    pub order_id: String,
    #[serde(rename = "Warehouse")]
    pub warehouse: String,
    #[serde(rename = "Channel Name")]
    pub channel_name: String,
    pub sku: String,
}

pub const ORDER_TABLE_COLUMNS: [&str; 7] = [
    "Order Date",
    "Dispatch Date",
    "Quantity",
    "Order ID",
    "Warehouse",
    "Channel Name",
    "sku",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderTable {
    pub region: Region,
    /// Whether the region has any orders at all, before date filtering.
    pub has_orders: bool,
    /// Orders placed inside the selection, newest first.
    pub rows: Vec<OrderRow>,
    /// Shown in place of the table when the region has no orders.
    pub notice: Option<Notice>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductReport {
    pub asin: String,
    pub product_name: String,
    pub sku: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub uk: RegionPanel,
    pub eu: RegionPanel,
    pub uk_orders: OrderTable,
    pub eu_orders: OrderTable,
    pub notices: Vec<Notice>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Report {
    NoSelection { notice: Notice },
    NoInventory { asin: String, notice: Notice },
    Found(ProductReport),
}

impl Report {
    pub fn product(&self) -> Option<&ProductReport> {
        match self {
            Report::Found(p) => Some(p),
            _ => None,
        }
    }
}

// ── Pipeline ──

/// Runs the whole aggregation for one selection. Never fails: every empty
/// or partial outcome is expressed in the returned [`Report`].
pub fn aggregate(store: &TableStore, selection: &QuerySelection) -> Report {
    let asin = selection.target_asin.as_str();
    if asin.is_empty() {
        return Report::NoSelection { notice: Notice::enter_asin() };
    }

    let mut inventory: Vec<&InventoryRecord> = store
        .inventory()
        .iter()
        .filter(|r| r.asin == asin && selection.contains(r.date))
        .collect();

    let orders: Vec<&OrderRecord> = store
        .orders()
        .unwrap_or_default()
        .iter()
        .filter(|r| r.asin == asin)
        .collect();

    // Stable, so same-date revisions keep their table order.
    inventory.sort_by_key(|r| r.date);

    let Some(latest) = inventory.last() else {
        debug!(asin, start = %selection.start_date, end = %selection.end_date, "no inventory rows");
        return Report::NoInventory {
            asin: asin.to_string(),
            notice: Notice::no_inventory(asin),
        };
    };

    let uk_orders: Vec<&OrderRecord> = orders.iter().copied().filter(|o| o.target_region == Region::Uk).collect();
    let eu_orders: Vec<&OrderRecord> = orders.iter().copied().filter(|o| o.target_region == Region::Eu).collect();

    let mut notices = Vec::new();
    if !store.has_orders() {
        notices.push(Notice::no_orders_table());
    }

    debug!(
        asin,
        inventory_rows = inventory.len(),
        order_rows = orders.len(),
        "aggregated selection"
    );

    Report::Found(ProductReport {
        asin: asin.to_string(),
        product_name: latest.product_name.clone(),
        sku: latest.sku.clone(),
        start_date: selection.start_date,
        end_date: selection.end_date,
        uk: region_panel(Region::Uk, &inventory, &uk_orders),
        eu: region_panel(Region::Eu, &inventory, &eu_orders),
        uk_orders: order_table(Region::Uk, &uk_orders, selection),
        eu_orders: order_table(Region::Eu, &eu_orders, selection),
        notices,
    })
}

fn region_panel(region: Region, inventory: &[&InventoryRecord], orders: &[&OrderRecord]) -> RegionPanel {
    let points = inventory
        .iter()
        .filter(|r| r.region == region)
        .map(|r| InventoryPoint {
            date: r.date,
            available: r.fulfillable_quantity,
            reserved: r.reserved,
            inbound: r.inbound,
        })
        .collect();

    let mut bars = Vec::new();
    push_warehouse_bars(orders, BarKind::PlacedDawson, BarKind::DispatchedDawson, &mut bars);
    // Romania only ships into the EU view.
    if region == Region::Eu {
        push_warehouse_bars(orders, BarKind::PlacedRomania, BarKind::DispatchedRomania, &mut bars);
    }

    RegionPanel { region, inventory: points, bars }
}

fn push_warehouse_bars(orders: &[&OrderRecord], placed: BarKind, dispatched: BarKind, out: &mut Vec<BarSeries>) {
    let warehouse = placed.warehouse();
    let subset: Vec<&OrderRecord> = orders.iter().copied().filter(|o| o.warehouse == warehouse).collect();
    if subset.is_empty() {
        return;
    }

    out.push(BarSeries {
        kind: placed,
        points: sum_by_date(subset.iter().map(|o| (Some(o.order_date), o.quantity))),
    });
    out.push(BarSeries {
        kind: dispatched,
        points: sum_by_date(subset.iter().map(|o| (o.dispatch_date, o.quantity))),
    });
}

/// Sums quantities per date, ascending by date. Rows without a date are
/// dropped from the grouping.
pub fn sum_by_date(rows: impl Iterator<Item = (Option<NaiveDate>, i64)>) -> Vec<SeriesPoint> {
    let mut sums: BTreeMap<NaiveDate, i64> = BTreeMap::new();
    for (date, quantity) in rows {
        if let Some(date) = date {
            *sums.entry(date).or_insert(0) += quantity;
        }
    }
    sums.into_iter()
        .map(|(date, quantity_sum)| SeriesPoint { date, quantity_sum })
        .collect()
}

fn order_table(region: Region, orders: &[&OrderRecord], selection: &QuerySelection) -> OrderTable {
    let mut rows: Vec<OrderRow> = orders
        .iter()
        .filter(|o| selection.contains(o.order_date))
        .map(|o| OrderRow {
            order_date: o.order_date,
            dispatch_date: o.dispatch_date,
            quantity: o.quantity,
            order_id: o.order_id.clone(),
            warehouse: o.warehouse.label().to_string(),
            channel_name: o.channel_name.clone(),
            sku: o.sku.clone(),
        })
        .collect();
    rows.sort_by(|a, b| b.order_date.cmp(&a.order_date));

    let has_orders = !orders.is_empty();
    OrderTable {
        notice: (!has_orders).then(|| Notice::no_regional_orders(region.label())),
        region,
        has_orders,
        rows,
    }
}
