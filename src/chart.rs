//! Combination line + bar chart per region.
//!
//! [`render`] produces a backend-neutral [`ChartSpec`]; [`ChartSpec::to_plotly`]
//! serializes it for the web page and the TUI draws it with ratatui.

use chrono::NaiveDate;
use serde::Serialize;
use serde_json::{json, Value};

use crate::aggregate::{BarKind, RegionPanel};
use crate::types::Region;

pub const CHART_HEIGHT: u32 = 500;
pub const BAR_OPACITY: f64 = 0.6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChartOptions {
    /// Fix the x-axis to the selected window instead of fitting the data.
    pub lock_x_axis: bool,
}

impl Default for ChartOptions {
    fn default() -> Self {
        Self { lock_x_axis: true }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineTrace {
    pub name: &'static str,
    pub color: &'static str,
    pub connect_gaps: bool,
    pub points: Vec<(NaiveDate, Option<i64>)>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BarTrace {
    pub kind: BarKind,
    pub name: &'static str,
    pub color: &'static str,
    pub opacity: f64,
    pub points: Vec<(NaiveDate, i64)>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSpec {
    pub title: &'static str,
    pub height: u32,
    pub x_range: Option<(NaiveDate, NaiveDate)>,
    pub lines: Vec<LineTrace>,
    pub bars: Vec<BarTrace>,
}

pub fn title(region: &Region) -> &'static str {
    match region {
        Region::Eu => "EU Inventory & Orders (Dawson + Romania)",
        _ => "UK Inventory & Orders",
    }
}

pub fn bar_color(kind: BarKind) -> &'static str {
    match kind {
        BarKind::PlacedDawson => "purple",
        BarKind::DispatchedDawson => "red",
        BarKind::PlacedRomania => "#FF69B4",
        BarKind::DispatchedRomania => "#8B0000",
    }
}

pub fn render(panel: &RegionPanel, start: NaiveDate, end: NaiveDate, options: ChartOptions) -> ChartSpec {
    let line = |name, color, value: fn(&crate::aggregate::InventoryPoint) -> Option<i64>| LineTrace {
        name,
        color,
        connect_gaps: true,
        points: panel.inventory.iter().map(|p| (p.date, value(p))).collect(),
    };

    let lines = vec![
        line("Available", "green", |p| p.available),
        line("Reserved", "orange", |p| p.reserved),
        line("Inbound", "blue", |p| p.inbound),
    ];

    let bars = panel
        .bars
        .iter()
        .map(|series| BarTrace {
            kind: series.kind,
            name: series.kind.label(),
            color: bar_color(series.kind),
            opacity: BAR_OPACITY,
            points: series.points.iter().map(|p| (p.date, p.quantity_sum)).collect(),
        })
        .collect();

    ChartSpec {
        title: title(&panel.region),
        height: CHART_HEIGHT,
        x_range: options.lock_x_axis.then_some((start, end)),
        lines,
        bars,
    }
}

impl ChartSpec {
    pub fn is_empty(&self) -> bool {
        self.lines.iter().all(|l| l.points.is_empty()) && self.bars.is_empty()
    }

    /// The effective x-axis window: the locked range, or the span of all
    /// plotted dates.
    pub fn x_bounds(&self) -> Option<(NaiveDate, NaiveDate)> {
        if let Some(range) = self.x_range {
            return Some(range);
        }
        let dates = self
            .lines
            .iter()
            .flat_map(|l| l.points.iter().map(|(d, _)| *d))
            .chain(self.bars.iter().flat_map(|b| b.points.iter().map(|(d, _)| *d)));
        dates.fold(None, |acc, d| match acc {
            None => Some((d, d)),
            Some((lo, hi)) => Some((lo.min(d), hi.max(d))),
        })
    }

    pub fn to_plotly(&self) -> Value {
        let mut data: Vec<Value> = self
            .lines
            .iter()
            .map(|l| {
                json!({
                    "type": "scatter",
                    "mode": "lines",
                    "name": l.name,
                    "x": l.points.iter().map(|(d, _)| d.to_string()).collect::<Vec<_>>(),
                    "y": l.points.iter().map(|(_, v)| *v).collect::<Vec<_>>(),
                    "line": { "color": l.color },
                    "connectgaps": l.connect_gaps,
                })
            })
            .collect();

        data.extend(self.bars.iter().map(|b| {
            json!({
                "type": "bar",
                "name": b.name,
                "x": b.points.iter().map(|(d, _)| d.to_string()).collect::<Vec<_>>(),
                "y": b.points.iter().map(|(_, v)| *v).collect::<Vec<_>>(),
                "marker": { "color": b.color },
                "opacity": b.opacity,
            })
        }));

        let mut xaxis = json!({ "type": "date" });
        if let Some((start, end)) = self.x_range {
            xaxis["range"] = json!([start.to_string(), end.to_string()]);
            xaxis["autorange"] = json!(false);
        }

        json!({
            "data": data,
            "layout": {
                "title": { "text": self.title },
                "height": self.height,
                "hovermode": "x unified",
                "barmode": "group",
                "xaxis": xaxis,
            }
        })
    }
}
