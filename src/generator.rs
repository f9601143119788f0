use chrono::{Duration, NaiveDate};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::types::{InventoryRecord, OrderRecord, Region, Warehouse};

pub const PRODUCTS: &[(&str, &str, &str)] = &[
    ("B000DEMO01", "SKU-KETTLE-01", "Stainless Kettle 1.7L"),
    ("B000DEMO02", "SKU-TOASTER-02", "Two-Slice Toaster"),
    ("B000DEMO03", "SKU-GRINDER-03", "Burr Coffee Grinder"),
    ("B000DEMO04", "SKU-SCALE-04", "Digital Kitchen Scale"),
    ("B000DEMO05", "SKU-BLENDER-05", "Compact Blender"),
];

const CHANNELS: &[&str] = &["Amazon.co.uk", "Amazon.de", "Amazon.fr", "Amazon.it", "Amazon.es"];

/// Synthetic inventory + order tables shaped like the upstream exports.
pub struct DemoGenerator {
    rng: StdRng,
    order_seq: u64,
    /// Share of orders with no dispatch date yet.
    pub undispatched_rate: f64,
}

impl DemoGenerator {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            order_seq: 0,
            undispatched_rate: 0.1,
        }
    }

    /// One inventory row per product, region and day, plus a random order
    /// flow. Product identifiers beyond the built-in list are numbered.
    pub fn generate(&mut self, products: usize, start: NaiveDate, days: i64) -> (Vec<InventoryRecord>, Vec<OrderRecord>) {
        let mut inventory = Vec::with_capacity(products * days as usize * 2);
        let mut orders = Vec::new();

        for p in 0..products {
            let (asin, sku, name) = product(p);
            for region in [Region::Uk, Region::Eu] {
                let mut stock: i64 = self.rng.gen_range(50..400);
                for day in 0..days {
                    let date = start + Duration::days(day);
                    let sold = self.rng.gen_range(0..12);
                    stock = (stock - sold).max(0);
                    if stock < 20 {
                        stock += self.rng.gen_range(100..300);
                    }
                    inventory.push(InventoryRecord {
                        asin: asin.clone(),
                        sku: sku.clone(),
                        product_name: name.clone(),
                        date,
                        region: region.clone(),
                        fulfillable_quantity: Some(stock),
                        reserved: Some(self.rng.gen_range(0..15)),
                        // Gaps in the inbound column are common upstream.
                        inbound: self.rng.gen_bool(0.8).then(|| self.rng.gen_range(0..200)),
                    });

                    for _ in 0..self.rng.gen_range(0..3) {
                        orders.push(self.order(&asin, &sku, date, region.clone()));
                    }
                }
            }
        }

        (inventory, orders)
    }

    fn order(&mut self, asin: &str, sku: &str, order_date: NaiveDate, target_region: Region) -> OrderRecord {
        self.order_seq += 1;
        let warehouse = match target_region {
            Region::Eu if self.rng.gen_bool(0.5) => Warehouse::Romania,
            _ => Warehouse::Dawson,
        };
        let dispatch_date = if self.rng.gen_bool(self.undispatched_rate) {
            None
        } else {
            Some(order_date + Duration::days(self.rng.gen_range(0..4)))
        };
        OrderRecord {
            asin: asin.to_string(),
            sku: sku.to_string(),
            order_id: format!("ORD-{:07}", self.order_seq),
            order_date,
            dispatch_date,
            quantity: self.rng.gen_range(1..6),
            target_region,
            warehouse,
            channel_name: CHANNELS[self.rng.gen_range(0..CHANNELS.len())].to_string(),
        }
    }
}

fn product(index: usize) -> (String, String, String) {
    match PRODUCTS.get(index) {
        Some((asin, sku, name)) => (asin.to_string(), sku.to_string(), name.to_string()),
        None => (
            format!("B{:09}", index),
            format!("SKU-GEN-{index}"),
            format!("Generated Product {index}"),
        ),
    }
}
