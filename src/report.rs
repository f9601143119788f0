//! Plain-text rendering of a [`Report`] for headless runs.

use std::io::{self, Write};

use crate::aggregate::{OrderTable, ProductReport, Report, ORDER_TABLE_COLUMNS};
use crate::chart::{self, ChartOptions, ChartSpec};

fn opt(v: Option<i64>) -> String {
    v.map(|v| v.to_string()).unwrap_or_else(|| "-".into())
}

pub fn write_text<W: Write>(out: &mut W, report: &Report, options: ChartOptions) -> io::Result<()> {
    match report {
        Report::NoSelection { notice } | Report::NoInventory { notice, .. } => {
            writeln!(out, "[{}] {}", notice.level.label(), notice.message)
        }
        Report::Found(p) => write_product(out, p, options),
    }
}

fn write_product<W: Write>(out: &mut W, p: &ProductReport, options: ChartOptions) -> io::Result<()> {
    writeln!(out, "ASIN {} | {} .. {}", p.asin, p.start_date, p.end_date)?;
    writeln!(out, "Product: {} | SKU: {}", p.product_name, p.sku)?;
    for n in &p.notices {
        writeln!(out, "[{}] {}", n.level.label(), n.message)?;
    }

    for panel in [&p.uk, &p.eu] {
        writeln!(out)?;
        write_chart(out, &chart::render(panel, p.start_date, p.end_date, options))?;
    }

    writeln!(out)?;
    write_orders(out, &p.uk_orders)?;
    writeln!(out)?;
    write_orders(out, &p.eu_orders)
}

fn write_chart<W: Write>(out: &mut W, spec: &ChartSpec) -> io::Result<()> {
    writeln!(out, "-- {} --", spec.title)?;
    let Some((lo, hi)) = spec.x_bounds().filter(|_| !spec.is_empty()) else {
        return writeln!(out, "  (no data)");
    };

    writeln!(out, "  {:<12}{:>10}{:>10}{:>10}", "Date", "Available", "Reserved", "Inbound")?;
    // The three line traces share the panel's inventory dates.
    if let [available, reserved, inbound] = spec.lines.as_slice() {
        for ((a, r), i) in available.points.iter().zip(&reserved.points).zip(&inbound.points) {
            if a.0 < lo || a.0 > hi {
                continue;
            }
            writeln!(out, "  {:<12}{:>10}{:>10}{:>10}", a.0.to_string(), opt(a.1), opt(r.1), opt(i.1))?;
        }
    }

    for bar in &spec.bars {
        let cells: Vec<String> = bar
            .points
            .iter()
            .filter(|(d, _)| *d >= lo && *d <= hi)
            .map(|(d, q)| format!("{d}={q}"))
            .collect();
        writeln!(out, "  {}: {}", bar.name, if cells.is_empty() { "-".to_string() } else { cells.join(", ") })?;
    }
    Ok(())
}

fn write_orders<W: Write>(out: &mut W, table: &OrderTable) -> io::Result<()> {
    writeln!(out, "-- {} Orders --", table.region)?;
    if let Some(ref notice) = table.notice {
        return writeln!(out, "  {}", notice.message);
    }
    writeln!(out, "  {}", ORDER_TABLE_COLUMNS.join(" | "))?;
    for r in &table.rows {
        writeln!(
            out,
            "  {} | {} | {} | {} | {} | {} | {}",
            r.order_date,
            r.dispatch_date.map(|d| d.to_string()).unwrap_or_else(|| "-".into()),
            r.quantity,
            r.order_id,
            r.warehouse,
            r.channel_name,
            r.sku,
        )?;
    }
    Ok(())
}
