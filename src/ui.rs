use crate::app::App;
use crate::bivariate::{MapFrame, NO_DATA_TITLE};
use crate::color::{Fill, Rgb};
use crate::legend::LegendGrid;
use crate::map::MapLayers;
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, Widget, Wrap},
    Frame,
};

/// Rows of the legend chart, two grid samples per row
const LEGEND_CHART_ROWS: u16 = 12;
/// Width reserved left of the legend chart for y tick labels
const LEGEND_TICK_WIDTH: u16 = 7;

struct Panels {
    header: Rect,
    map: Rect,
    legend: Rect,
    hover: Rect,
    table: Rect,
    status: Rect,
}

fn panels(area: Rect) -> Panels {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Selectors
            Constraint::Min(3),    // Body
            Constraint::Length(1), // Status bar
        ])
        .split(area);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(64), Constraint::Percentage(36)])
        .split(rows[1]);

    let side = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(LEGEND_CHART_ROWS + 5), // Legend with ticks and labels
            Constraint::Length(5),                     // Hover
            Constraint::Min(3),                        // Country table
        ])
        .split(body[1]);

    Panels {
        header: rows[0],
        map: body[0],
        legend: side[0],
        hover: side[1],
        table: side[2],
        status: rows[2],
    }
}

fn panel_block(title: &str) -> Block<'_> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(Span::styled(
            format!(" {} ", title),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ))
}

/// Screen area the map is drawn into, for a terminal of the given size
pub fn map_inner_area(area: Rect) -> Rect {
    Block::default().borders(Borders::ALL).inner(panels(area).map)
}

#[inline]
fn color(rgb: Rgb) -> Color {
    Color::Rgb(rgb.r, rgb.g, rgb.b)
}

/// Render the UI
pub fn render(frame: &mut Frame, app: &App) {
    let p = panels(frame.area());

    render_selectors(frame, app, p.header);
    render_map(frame, app, p.map);
    render_legend(frame, &app.legend, p.legend);
    render_hover(frame, app, p.hover);
    render_table(frame, app, p.table);
    render_status_bar(frame, app, p.status);
}

fn render_selectors(frame: &mut Frame, app: &App, area: Rect) {
    let s = app.selection;
    let key = Style::default().fg(Color::DarkGray);
    let value = Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD);

    let line = Line::from(vec![
        Span::styled(" Primary [p]: ", key),
        Span::styled(s.primary.label(), value),
        Span::styled("  Secondary [s/S]: ", key),
        Span::styled(s.secondary.label(), value),
        Span::styled("  Year [/]: ", key),
        Span::styled(s.year.to_string(), value),
        Span::styled(format!(" ({}-{})", app.years.0, app.years.1), key),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}

fn render_map(frame: &mut Frame, app: &App, area: Rect) {
    let title = match &app.map {
        Ok(map) => map.title.as_str(),
        Err(_) => NO_DATA_TITLE,
    };
    let block = panel_block(title);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let map = match &app.map {
        Ok(map) => map,
        Err(no_data) => {
            let text = Paragraph::new(no_data.reason.to_string())
                .style(Style::default().fg(Color::DarkGray))
                .wrap(Wrap { trim: true });
            frame.render_widget(text, inner);
            return;
        }
    };

    let mut viewport = app.viewport.clone();
    viewport.width = inner.width as usize * 2;
    viewport.height = inner.height as usize * 4;
    let layers = app
        .renderer
        .render(inner.width as usize, inner.height as usize, &viewport);

    let fills = map.fills();
    let fill_by_region: Vec<Option<Fill>> = app
        .renderer
        .countries()
        .iter()
        .map(|c| fills.get(c.iso_alpha.as_str()).copied())
        .collect();

    frame.render_widget(
        MapWidget {
            layers,
            fill_by_region,
            cursor_pos: app.cursor_cell(),
        },
        inner,
    );
}

/// Choropleth cells with braille borders on top
struct MapWidget {
    layers: MapLayers,
    /// Fill for each country index, `None` when not in the frame
    fill_by_region: Vec<Option<Fill>>,
    cursor_pos: Option<(u16, u16)>,
}

impl Widget for MapWidget {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let width = (self.layers.width as u16).min(area.width);
        let height = (self.layers.height as u16).min(area.height);

        for cy in 0..height {
            for cx in 0..width {
                let fill = self
                    .layers
                    .region_at(cx as usize, cy as usize)
                    .and_then(|idx| self.fill_by_region.get(idx).copied().flatten());
                if let Some(fill) = fill {
                    buf[(area.x + cx, area.y + cy)].set_bg(color(fill.rgb()));
                }
            }
        }

        for (cx, cy, ch) in self.layers.borders.glyphs() {
            let (cx, cy) = (cx as u16, cy as u16);
            if cx < width && cy < height {
                buf[(area.x + cx, area.y + cy)].set_char(ch).set_fg(Color::Black);
            }
        }

        if let Some((cx, cy)) = self.cursor_pos {
            if cx < width && cy < height {
                buf[(area.x + cx, area.y + cy)].set_char('╋').set_fg(Color::Red);
            }
        }
    }
}

fn render_legend(frame: &mut Frame, legend: &LegendGrid, area: Rect) {
    let block = panel_block(legend.title);
    let inner = block.inner(area);
    frame.render_widget(block, area);
    frame.render_widget(LegendWidget { legend }, inner);
}

/// Tick label short enough for the legend: numbers from 10000 up are
/// scaled to `k`, `M` or `G` with at most one decimal
fn tick_text(label: &str) -> String {
    let Ok(value) = label.parse::<f64>() else {
        return label.to_string();
    };
    let (scaled, suffix) = match value.abs() {
        v if v >= 1e9 => (value / 1e9, "G"),
        v if v >= 1e6 => (value / 1e6, "M"),
        v if v >= 1e4 => (value / 1e3, "k"),
        _ => return label.to_string(),
    };
    let digits = format!("{:.1}", scaled);
    format!("{}{}", digits.strip_suffix(".0").unwrap_or(&digits), suffix)
}

/// Half-block rendering of the legend square with tick labels.
///
/// Each terminal row shows two grid rows: `▀` takes the upper one as
/// foreground and the lower one as background.
struct LegendWidget<'a> {
    legend: &'a LegendGrid,
}

impl LegendWidget<'_> {
    fn put(buf: &mut Buffer, area: Rect, x: u16, y: u16, text: &str, style: Style) {
        for (i, ch) in text.chars().enumerate() {
            let px = x + i as u16;
            if px >= area.x + area.width || y >= area.y + area.height {
                break;
            }
            buf[(px, y)].set_char(ch).set_style(style);
        }
    }
}

impl Widget for LegendWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let legend = self.legend;
        let n = legend.size();
        // y label, chart, x ticks, x label
        if n == 0 || area.width <= LEGEND_TICK_WIDTH + 2 || area.height < 4 {
            return;
        }
        let text = Style::default().fg(Color::Gray);
        let chart = Rect {
            x: area.x + LEGEND_TICK_WIDTH,
            y: area.y + 1,
            width: area.width - LEGEND_TICK_WIDTH - 1,
            height: LEGEND_CHART_ROWS.min(area.height - 3),
        };

        Self::put(buf, area, area.x, area.y, &format!("▲ {}", legend.y_axis.label), text);

        let half_rows = chart.height as usize * 2;
        let sample = |i: usize, count: usize| i * (n - 1) / count.saturating_sub(1).max(1);
        for ty in 0..chart.height {
            for tx in 0..chart.width {
                let col = sample(tx as usize, chart.width as usize);
                let upper = legend.from_top(sample(ty as usize * 2, half_rows), col);
                let lower = legend.from_top(sample(ty as usize * 2 + 1, half_rows), col);
                if let (Some(upper), Some(lower)) = (upper, lower) {
                    buf[(chart.x + tx, chart.y + ty)]
                        .set_char('▀')
                        .set_fg(color(upper))
                        .set_bg(color(lower));
                }
            }
        }

        let last_row = chart.height.saturating_sub(1) as f64;
        for tick in &legend.y_axis.ticks {
            let ty = ((1.0 - tick.position) * last_row).round() as u16;
            let label = tick_text(&tick.label);
            let x = (chart.x - 1).saturating_sub(label.chars().count() as u16).max(area.x);
            Self::put(buf, area, x, chart.y + ty, &label, text);
        }

        let tick_row = chart.y + chart.height;
        let last_col = chart.width.saturating_sub(1) as f64;
        let mut next_free = chart.x;
        for tick in &legend.x_axis.ticks {
            let label = tick_text(&tick.label);
            let at = chart.x + (tick.position * last_col).round() as u16;
            let len = label.chars().count() as u16;
            // the last label ends at the panel edge instead of running past it
            let x = at
                .saturating_sub(len / 2)
                .min((area.x + area.width).saturating_sub(len))
                .max(next_free);
            Self::put(buf, area, x, tick_row, &label, text);
            next_free = x + len + 1;
        }

        Self::put(
            buf,
            area,
            chart.x,
            tick_row + 1,
            &format!("{} ▶", legend.x_axis.label),
            text,
        );
    }
}

fn render_hover(frame: &mut Frame, app: &App, area: Rect) {
    let block = panel_block("Hover");
    let lines: Vec<Line> = match app.hover() {
        Some(hover) => hover
            .lines
            .into_iter()
            .enumerate()
            .map(|(i, l)| {
                let style = if i == 0 {
                    Style::default().fg(Color::White).add_modifier(Modifier::BOLD)
                } else {
                    Style::default().fg(Color::Gray)
                };
                Line::from(Span::styled(l, style))
            })
            .collect(),
        None => vec![Line::from(Span::styled(
            "Point at a country",
            Style::default().fg(Color::DarkGray),
        ))],
    };
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn table_rows(map: &MapFrame) -> Vec<Row<'static>> {
    map.rows
        .iter()
        .map(|r| {
            let secondary = match r.secondary_value {
                Some(v) => format!("{:.1}", v),
                None => "N/A".to_string(),
            };
            Row::new(vec![
                Cell::from(Span::styled("██", Style::default().fg(color(r.fill.rgb())))),
                Cell::from(r.display_name.clone()),
                Cell::from(format!("{:.1}", r.primary_value)),
                Cell::from(secondary),
            ])
        })
        .collect()
}

fn render_table(frame: &mut Frame, app: &App, area: Rect) {
    let block = panel_block("Countries");
    let Ok(map) = &app.map else {
        frame.render_widget(
            Paragraph::new(Span::styled(NO_DATA_TITLE, Style::default().fg(Color::DarkGray))).block(block),
            area,
        );
        return;
    };

    let header = Row::new(vec!["", "Country", map.primary.key(), map.secondary.key()])
        .style(Style::default().fg(Color::Yellow));
    let table = Table::new(
        table_rows(map),
        [
            Constraint::Length(2),
            Constraint::Min(10),
            Constraint::Length(10),
            Constraint::Length(14),
        ],
    )
    .header(header)
    .block(block);
    frame.render_widget(table, area);
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let degraded = matches!(&app.map, Ok(m) if m.degraded);
    let mut spans = vec![
        Span::styled(" Zoom: ", Style::default().fg(Color::DarkGray)),
        Span::styled(app.zoom_level(), Style::default().fg(Color::Yellow)),
        Span::styled(" | ", Style::default().fg(Color::DarkGray)),
        Span::styled(app.center_coords(), Style::default().fg(Color::Cyan)),
    ];
    if degraded {
        spans.push(Span::styled(
            " | no secondary data for this year",
            Style::default().fg(Color::Magenta),
        ));
    }
    spans.push(Span::styled(
        " | p/s/S:variables [/]:year b:borders hjkl:pan +/-:zoom r:reset q:quit",
        Style::default().fg(Color::DarkGray),
    ));

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}
