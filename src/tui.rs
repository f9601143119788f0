use std::io;
use std::sync::Arc;
use std::time::Duration;

use chrono::{Datelike, NaiveDate};
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::symbols;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Axis, Block, Borders, Cell, Chart, Dataset, GraphType, Paragraph, Row, Table};
use ratatui::Terminal;
use tracing::debug;

use crate::aggregate::{aggregate, OrderTable, ProductReport, RegionPanel, Report};
use crate::chart::{self, ChartOptions, ChartSpec};
use crate::notice::{Notice, NoticeLevel};
use crate::store::TableStore;
use crate::timing::QueryTimer;
use crate::types::QuerySelection;

const FIELD_LABELS: [&str; 3] = ["Start Date", "End Date", "Enter ASIN"];

struct App {
    store: Arc<TableStore>,
    options: ChartOptions,
    inputs: [String; 3],
    focus: usize,
    selection: QuerySelection,
    report: Report,
    timer: QueryTimer,
    input_error: Option<Notice>,
    should_quit: bool,
    scroll_offset: usize,
}

impl App {
    fn new(store: Arc<TableStore>, options: ChartOptions, selection: QuerySelection) -> Self {
        let inputs = [
            selection.start_date.to_string(),
            selection.end_date.to_string(),
            selection.target_asin.clone(),
        ];
        let mut app = Self {
            store,
            options,
            inputs,
            // Cursor starts on the identifier field.
            focus: 2,
            report: Report::NoSelection { notice: Notice::enter_asin() },
            selection,
            timer: QueryTimer::new(),
            input_error: None,
            should_quit: false,
            scroll_offset: 0,
        };
        app.recompute();
        app
    }

    fn recompute(&mut self) {
        let (store, selection) = (&self.store, &self.selection);
        self.report = self.timer.time(|| aggregate(store, selection));
        self.scroll_offset = 0;
        debug!(asin = %self.selection.target_asin, us = self.timer.stats().last_us, "recomputed");
    }

    /// Applies the typed filters. Bad input leaves the previous selection
    /// on screen.
    fn apply(&mut self) {
        match QuerySelection::from_input(&self.inputs[2], &self.inputs[0], &self.inputs[1]) {
            Ok(selection) => {
                self.input_error = None;
                self.selection = selection;
                self.recompute();
            }
            Err(e) => self.input_error = Some(Notice::error(e.to_string())),
        }
    }

    fn on_key(&mut self, code: KeyCode, modifiers: KeyModifiers) {
        match code {
            KeyCode::Esc => self.should_quit = true,
            KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => self.should_quit = true,
            KeyCode::Tab => self.focus = (self.focus + 1) % FIELD_LABELS.len(),
            KeyCode::BackTab => self.focus = (self.focus + FIELD_LABELS.len() - 1) % FIELD_LABELS.len(),
            KeyCode::Enter => self.apply(),
            KeyCode::Backspace => {
                self.inputs[self.focus].pop();
            }
            KeyCode::Char(c) => self.inputs[self.focus].push(c),
            KeyCode::Up => {
                if self.scroll_offset > 0 {
                    self.scroll_offset -= 1;
                }
            }
            KeyCode::Down => {
                self.scroll_offset = self.scroll_offset.saturating_add(1);
            }
            _ => {}
        }
    }
}

pub fn run(store: Arc<TableStore>, options: ChartOptions, selection: QuerySelection) -> Result<(), Box<dyn std::error::Error>> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, App::new(store, options, selection));

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    mut app: App,
) -> Result<(), Box<dyn std::error::Error>> {
    while !app.should_quit {
        terminal.draw(|f| draw(f, &app))?;

        if event::poll(Duration::from_millis(250))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    app.on_key(key.code, key.modifiers);
                }
            }
        }
    }
    Ok(())
}

fn draw(f: &mut ratatui::Frame, app: &App) {
    let size = f.area();

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(10)])
        .split(size);
    draw_header(f, app, rows[0]);

    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(30), Constraint::Min(40)])
        .split(rows[1]);
    draw_filters(f, app, cols[0]);

    match &app.report {
        Report::Found(report) => draw_report(f, app, report, cols[1]),
        Report::NoSelection { notice } | Report::NoInventory { notice, .. } => {
            draw_notices(f, std::slice::from_ref(notice), cols[1]);
        }
    }
}

fn draw_header(f: &mut ratatui::Frame, app: &App, area: Rect) {
    let t = app.timer.stats();
    let header = vec![
        Span::styled(" stock-lens ", Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)),
        Span::raw(" | "),
        Span::styled(format!("ASINs: {}", app.store.asin_count()), Style::default().fg(Color::Green)),
        Span::raw(" | "),
        Span::styled(
            if app.store.has_orders() { "Orders: loaded" } else { "Orders: none" },
            Style::default().fg(Color::Blue),
        ),
        Span::raw(" | "),
        Span::raw(format!("Query: {}us (p50={} p95={})", t.last_us, t.p50_us, t.p95_us)),
        Span::raw(" | "),
        Span::styled("Tab=field  Enter=apply  Up/Down=scroll  Esc=quit", Style::default().fg(Color::DarkGray)),
    ];
    let p = Paragraph::new(Line::from(header))
        .block(Block::default().borders(Borders::ALL).title(" Inventory & Order Dashboard "));
    f.render_widget(p, area);
}

fn draw_filters(f: &mut ratatui::Frame, app: &App, area: Rect) {
    let mut lines = Vec::new();
    for (i, label) in FIELD_LABELS.iter().enumerate() {
        let focused = i == app.focus;
        let style = if focused {
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::White)
        };
        lines.push(Line::from(Span::styled(format!(" {label}"), Style::default().fg(Color::DarkGray))));
        let cursor = if focused { "_" } else { "" };
        lines.push(Line::from(Span::styled(format!(" > {}{cursor}", app.inputs[i]), style)));
        lines.push(Line::from(""));
    }
    if let Some(ref err) = app.input_error {
        lines.push(Line::from(Span::styled(format!(" {}", err.message), Style::default().fg(Color::Red))));
    }
    let p = Paragraph::new(lines)
        .wrap(ratatui::widgets::Wrap { trim: true })
        .block(Block::default().borders(Borders::ALL).title(" Filters "));
    f.render_widget(p, area);
}

fn draw_report(f: &mut ratatui::Frame, app: &App, report: &ProductReport, area: Rect) {
    let notice_height = if report.notices.is_empty() { 0 } else { report.notices.len() as u16 + 2 };
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),             // product line
            Constraint::Length(notice_height), // notices
            Constraint::Percentage(33),        // UK chart
            Constraint::Percentage(33),        // EU chart
            Constraint::Min(6),                // order tables
        ])
        .split(area);

    let product = Line::from(vec![
        Span::styled("Product: ", Style::default().add_modifier(Modifier::BOLD)),
        Span::raw(report.product_name.clone()),
        Span::raw(" | "),
        Span::styled("SKU: ", Style::default().add_modifier(Modifier::BOLD)),
        Span::raw(report.sku.clone()),
    ]);
    f.render_widget(
        Paragraph::new(product).block(Block::default().borders(Borders::ALL).title(format!(" {} ", report.asin))),
        chunks[0],
    );

    if !report.notices.is_empty() {
        draw_notices(f, &report.notices, chunks[1]);
    }
    draw_chart(f, app, &report.uk, report, chunks[2]);
    draw_chart(f, app, &report.eu, report, chunks[3]);

    let tables = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(chunks[4]);
    draw_order_table(f, app, &report.uk_orders, tables[0]);
    draw_order_table(f, app, &report.eu_orders, tables[1]);
}

fn day_number(date: NaiveDate) -> f64 {
    date.num_days_from_ce() as f64
}

fn day_label(x: f64) -> String {
    NaiveDate::from_num_days_from_ce_opt(x.round() as i32)
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

/// Terminal colour for a chart colour name or `#RRGGBB` value.
fn terminal_color(name: &str) -> Color {
    if let Some(hex) = name.strip_prefix('#') {
        if let Ok(rgb) = u32::from_str_radix(hex, 16) {
            return Color::Rgb((rgb >> 16) as u8, (rgb >> 8) as u8, rgb as u8);
        }
    }
    match name {
        "green" => Color::Green,
        "orange" => Color::Rgb(255, 165, 0),
        "blue" => Color::Blue,
        "purple" => Color::Rgb(128, 0, 128),
        "red" => Color::Red,
        _ => Color::White,
    }
}

/// Plottable points of a chart, clipped to its x window. Bar series are
/// nudged apart so same-day bars sit side by side.
fn plot_points(spec: &ChartSpec, lo: f64, hi: f64) -> (Vec<Vec<(f64, f64)>>, Vec<Vec<(f64, f64)>>) {
    let inside = |x: f64| x >= lo && x <= hi;
    let lines = spec
        .lines
        .iter()
        .map(|l| {
            l.points
                .iter()
                .filter_map(|(d, v)| v.map(|v| (day_number(*d), v as f64)))
                .filter(|(x, _)| inside(*x))
                .collect()
        })
        .collect();
    let n = spec.bars.len().max(1) as f64;
    let bars = spec
        .bars
        .iter()
        .enumerate()
        .map(|(i, b)| {
            let nudge = (i as f64 - (n - 1.0) / 2.0) * (0.6 / n);
            b.points
                .iter()
                .map(|(d, v)| (day_number(*d), *v as f64))
                .filter(|(x, _)| inside(*x))
                .map(|(x, y)| (x + nudge, y))
                .collect()
        })
        .collect();
    (lines, bars)
}

fn draw_chart(f: &mut ratatui::Frame, app: &App, panel: &RegionPanel, report: &ProductReport, area: Rect) {
    let spec = chart::render(panel, report.start_date, report.end_date, app.options);
    let block = Block::default().borders(Borders::ALL).title(format!(" {} ", spec.title));

    let Some((start, end)) = spec.x_bounds() else {
        f.render_widget(Paragraph::new(" No data for this region.").block(block), area);
        return;
    };
    let (lo, hi) = (day_number(start) - 0.5, day_number(end) + 0.5);
    let (line_points, bar_points) = plot_points(&spec, lo, hi);

    let y_max = line_points
        .iter()
        .chain(bar_points.iter())
        .flat_map(|pts| pts.iter().map(|(_, y)| *y))
        .fold(1.0_f64, f64::max)
        * 1.1;

    let mut datasets = Vec::new();
    for (trace, pts) in spec.lines.iter().zip(line_points.iter()) {
        datasets.push(
            Dataset::default()
                .name(trace.name)
                .marker(symbols::Marker::Braille)
                .graph_type(GraphType::Line)
                .style(Style::default().fg(terminal_color(trace.color)))
                .data(pts),
        );
    }
    for (trace, pts) in spec.bars.iter().zip(bar_points.iter()) {
        datasets.push(
            Dataset::default()
                .name(trace.name)
                .marker(symbols::Marker::HalfBlock)
                .graph_type(GraphType::Bar)
                .style(Style::default().fg(terminal_color(trace.color)))
                .data(pts),
        );
    }

    let mid = (lo + hi) / 2.0;
    let chart = Chart::new(datasets)
        .block(block)
        .x_axis(
            Axis::default()
                .bounds([lo, hi])
                .style(Style::default().fg(Color::DarkGray))
                .labels([day_label(lo + 0.5), day_label(mid), day_label(hi - 0.5)]),
        )
        .y_axis(
            Axis::default()
                .bounds([0.0, y_max])
                .style(Style::default().fg(Color::DarkGray))
                .labels(["0".to_string(), format!("{:.0}", y_max / 2.0), format!("{:.0}", y_max)]),
        );
    f.render_widget(chart, area);
}

fn draw_order_table(f: &mut ratatui::Frame, app: &App, table: &OrderTable, area: Rect) {
    let title = format!(" {} Orders ({}) ", table.region, table.rows.len());
    let block = Block::default().borders(Borders::ALL).title(title);

    if let Some(ref notice) = table.notice {
        f.render_widget(Paragraph::new(format!(" {}", notice.message)).block(block), area);
        return;
    }

    let max_visible = (area.height as usize).saturating_sub(3);
    let rows: Vec<Row> = table
        .rows
        .iter()
        .skip(app.scroll_offset)
        .take(max_visible)
        .map(|r| {
            Row::new(vec![
                Cell::from(r.order_date.to_string()),
                Cell::from(r.dispatch_date.map(|d| d.to_string()).unwrap_or_else(|| "-".into())),
                Cell::from(r.quantity.to_string()),
                Cell::from(r.order_id.clone()),
                Cell::from(r.warehouse.clone()),
                Cell::from(r.channel_name.clone()),
                Cell::from(r.sku.clone()),
            ])
        })
        .collect();

    let widget = Table::new(
        rows,
        [
            Constraint::Length(10),
            Constraint::Length(10),
            Constraint::Length(4),
            Constraint::Min(10),
            Constraint::Length(8),
            Constraint::Min(8),
            Constraint::Min(8),
        ],
    )
    .header(
        Row::new(vec!["ORDERED", "DISPATCHED", "QTY", "ORDER ID", "WH", "CHANNEL", "SKU"])
            .style(Style::default().add_modifier(Modifier::BOLD).fg(Color::White)),
    )
    .block(block);
    f.render_widget(widget, area);
}

fn draw_notices(f: &mut ratatui::Frame, notices: &[Notice], area: Rect) {
    let lines: Vec<Line> = notices
        .iter()
        .map(|n| {
            let color = match n.level {
                NoticeLevel::Info => Color::Cyan,
                NoticeLevel::Warning => Color::Yellow,
                NoticeLevel::Error => Color::Red,
            };
            Line::from(vec![
                Span::styled(format!(" {:<5} ", n.level.label()), Style::default().fg(color).add_modifier(Modifier::BOLD)),
                Span::raw(n.message.clone()),
            ])
        })
        .collect();
    f.render_widget(
        Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title(" Notices ")),
        area,
    );
}
