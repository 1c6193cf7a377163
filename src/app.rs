use crate::bivariate::{build_map_for, MapFrame, NoDataResult};
use crate::data::DataAccess;
use crate::legend::{legend_for, LegendGrid};
use crate::map::{ChoroplethRenderer, Viewport};
use crate::ui;
use crate::variables::{PrimaryVariable, SecondaryVariable};
use ratatui::layout::Rect;
use tracing::info;

/// Current value of the three selectors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    pub primary: PrimaryVariable,
    pub secondary: SecondaryVariable,
    pub year: i32,
}

impl Default for Selection {
    fn default() -> Self {
        Self {
            primary: PrimaryVariable::GdpGrowth,
            secondary: SecondaryVariable::Health,
            year: 2018,
        }
    }
}

/// Tooltip for the country under the cursor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hover {
    pub lines: Vec<String>,
}

/// Application state
pub struct App {
    pub data: DataAccess,
    pub renderer: ChoroplethRenderer,
    pub viewport: Viewport,
    pub selection: Selection,
    /// Inclusive year range offered by the year selector
    pub years: (i32, i32),
    pub map: Result<MapFrame, NoDataResult>,
    pub legend: LegendGrid,
    /// Inner area of the map panel on screen
    pub map_area: Rect,
    pub should_quit: bool,
    /// Last mouse position for drag tracking
    pub last_mouse: Option<(u16, u16)>,
    /// Current mouse position for the cursor marker and hover
    pub mouse_pos: Option<(u16, u16)>,
}

impl App {
    pub fn new(data: DataAccess, renderer: ChoroplethRenderer, selection: Selection, width: u16, height: u16) -> Self {
        let years = data.year_span();
        let selection = Selection {
            year: selection.year.clamp(years.0, years.1),
            ..selection
        };
        let map_area = ui::map_inner_area(Rect::new(0, 0, width, height));
        let map = build_map_for(selection.primary, selection.secondary, selection.year, &data);
        let legend = legend_for(selection.primary, selection.secondary);

        Self {
            data,
            renderer,
            viewport: Viewport::europe(map_area.width as usize * 2, map_area.height as usize * 4),
            selection,
            years,
            map,
            legend,
            map_area,
            should_quit: false,
            last_mouse: None,
            mouse_pos: None,
        }
    }

    /// Update layout when the terminal resizes
    pub fn resize(&mut self, width: u16, height: u16) {
        self.map_area = ui::map_inner_area(Rect::new(0, 0, width, height));
        self.viewport.width = self.map_area.width as usize * 2;
        self.viewport.height = self.map_area.height as usize * 4;
    }

    fn refresh_map(&mut self) {
        let s = self.selection;
        self.map = build_map_for(s.primary, s.secondary, s.year, &self.data);
    }

    fn refresh_legend(&mut self) {
        self.legend = legend_for(self.selection.primary, self.selection.secondary);
    }

    /// Variables changed: both figures are rebuilt
    fn variables_changed(&mut self) {
        info!(
            primary = %self.selection.primary,
            secondary = %self.selection.secondary,
            "variable selection changed"
        );
        self.refresh_map();
        self.refresh_legend();
    }

    pub fn cycle_primary(&mut self) {
        self.selection.primary = self.selection.primary.cycle();
        self.variables_changed();
    }

    pub fn next_secondary(&mut self) {
        self.selection.secondary = self.selection.secondary.next();
        self.variables_changed();
    }

    pub fn prev_secondary(&mut self) {
        self.selection.secondary = self.selection.secondary.prev();
        self.variables_changed();
    }

    /// Step the year selector; the legend does not depend on the year
    pub fn step_year(&mut self, delta: i32) {
        let year = (self.selection.year + delta).clamp(self.years.0, self.years.1);
        if year != self.selection.year {
            self.selection.year = year;
            info!(year, "year changed");
            self.refresh_map();
        }
    }

    /// Pan the map
    pub fn pan(&mut self, dx: i32, dy: i32) {
        self.viewport.pan(dx, dy);
    }

    pub fn zoom_in(&mut self) {
        self.viewport.zoom_in();
    }

    pub fn zoom_out(&mut self) {
        self.viewport.zoom_out();
    }

    /// Reset to the initial Europe view
    pub fn reset_view(&mut self) {
        self.viewport = Viewport::europe(self.viewport.width, self.viewport.height);
    }

    /// Terminal cell to braille pixel inside the map panel
    fn cell_to_pixel(&self, col: u16, row: u16) -> Option<(i32, i32)> {
        let a = self.map_area;
        if col < a.x || row < a.y || col >= a.x + a.width || row >= a.y + a.height {
            return None;
        }
        Some((((col - a.x) as i32) * 2, ((row - a.y) as i32) * 4))
    }

    /// Zoom in towards a screen position (terminal column/row)
    pub fn zoom_in_at(&mut self, col: u16, row: u16) {
        if let Some((px, py)) = self.cell_to_pixel(col, row) {
            self.viewport.zoom_in_at(px, py);
        }
    }

    /// Zoom out from a screen position (terminal column/row)
    pub fn zoom_out_at(&mut self, col: u16, row: u16) {
        if let Some((px, py)) = self.cell_to_pixel(col, row) {
            self.viewport.zoom_out_at(px, py);
        }
    }

    /// Handle mouse drag by panning against the drag direction
    pub fn handle_drag(&mut self, x: u16, y: u16) {
        if let Some((last_x, last_y)) = self.last_mouse {
            let dx = last_x as i32 - x as i32;
            let dy = last_y as i32 - y as i32;
            let scale = if self.viewport.zoom < 8.0 { 2 } else { 3 };
            self.pan(dx * scale, dy * scale);
        }
        self.last_mouse = Some((x, y));
    }

    /// Reset drag state when mouse button released
    pub fn end_drag(&mut self) {
        self.last_mouse = None;
    }

    pub fn set_mouse_pos(&mut self, col: u16, row: u16) {
        self.mouse_pos = Some((col, row));
    }

    pub fn quit(&mut self) {
        self.should_quit = true;
    }

    /// Cursor position relative to the map panel, in character cells
    pub fn cursor_cell(&self) -> Option<(u16, u16)> {
        let (col, row) = self.mouse_pos?;
        self.cell_to_pixel(col, row)
            .map(|_| (col - self.map_area.x, row - self.map_area.y))
    }

    /// Tooltip for the country under the mouse, if any
    pub fn hover(&self) -> Option<Hover> {
        let (cx, cy) = self.cursor_cell()?;
        let (lon, lat) = self
            .viewport
            .unproject_f(cx as f64 * 2.0 + 1.0, cy as f64 * 4.0 + 2.0);
        let shape = self.renderer.country(self.renderer.country_at(lon, lat)?)?;

        let lines = match &self.map {
            Ok(frame) => match frame.row(&shape.iso_alpha) {
                Some(row) => frame.hover_lines(row).to_vec(),
                None => vec![shape.name.clone(), "not in the selected dataset".to_string()],
            },
            Err(_) => vec![shape.name.clone()],
        };
        Some(Hover { lines })
    }

    pub fn zoom_level(&self) -> String {
        format!("{:.1}x", self.viewport.zoom)
    }

    /// Current center coordinates as a string
    pub fn center_coords(&self) -> String {
        format!(
            "{:.1}°{}, {:.1}°{}",
            self.viewport.center_lat.abs(),
            if self.viewport.center_lat >= 0.0 { "N" } else { "S" },
            self.viewport.center_lon.abs(),
            if self.viewport.center_lon >= 0.0 { "E" } else { "W" }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Fill;
    use crate::data::{DatasetId, InMemorySource, ObservationRecord, DEFAULT_TTL};
    use crate::map::CountryShape;

    fn app() -> App {
        let source = InMemorySource::new()
            .with(
                DatasetId::GdpGrowth,
                vec![
                    ObservationRecord::new("France", 2018, Some(1.9), Some("FRA")),
                    ObservationRecord::new("France", 2019, Some(1.8), Some("FRA")),
                    ObservationRecord::new("Germany", 2019, Some(1.1), Some("DEU")),
                ],
            )
            .with(
                DatasetId::Health,
                vec![ObservationRecord::new("France", 2018, Some(4000.0), Some("FRA"))],
            )
            .with(DatasetId::LifeExpectancy, Vec::new());
        let ring = vec![(-4.0, 43.0), (7.0, 43.0), (7.0, 50.0), (-4.0, 50.0), (-4.0, 43.0)];
        let renderer = ChoroplethRenderer::new(vec![CountryShape::new("FRA", "France", vec![vec![ring]]).unwrap()]);
        App::new(
            DataAccess::new(source, DEFAULT_TTL),
            renderer,
            Selection::default(),
            120,
            40,
        )
    }

    #[test]
    fn test_initial_figures() {
        let app = app();
        assert_eq!(app.years, (2018, 2019));
        let frame = app.map.as_ref().unwrap();
        assert!(matches!(frame.row("FRA").unwrap().fill, Fill::Blended(_)));
        assert_eq!(app.legend.y_axis.label, "Health Expenditure");
    }

    #[test]
    fn test_year_change_keeps_legend() {
        let mut app = app();
        let legend = app.legend.clone();
        app.step_year(1);
        assert_eq!(app.selection.year, 2019);
        assert_eq!(app.legend, legend);
        let frame = app.map.as_ref().unwrap();
        assert_eq!(frame.rows.len(), 2);
        assert!(frame.degraded);

        app.step_year(5);
        assert_eq!(app.selection.year, 2019);
    }

    #[test]
    fn test_variable_change_rebuilds_legend() {
        let mut app = app();
        app.next_secondary();
        assert_eq!(app.selection.secondary, SecondaryVariable::LifeExpectancy);
        assert_eq!(app.legend.y_axis.label, "Life Expectancy");
        assert!(app.map.as_ref().unwrap().degraded);

        app.cycle_primary();
        assert_eq!(app.legend.x_axis.label, "GDP Per Capita (Euro)");
        assert!(app.map.is_err());
    }

    #[test]
    fn test_hover_over_france() {
        let mut app = app();
        let (px, py) = app.viewport.project(2.35, 46.5);
        let col = app.map_area.x + (px / 2) as u16;
        let row = app.map_area.y + (py / 4) as u16;
        app.set_mouse_pos(col, row);
        let hover = app.hover().unwrap();
        assert_eq!(hover.lines[0], "France");
        assert_eq!(hover.lines[2], "Health Expenditure: 4000");

        app.set_mouse_pos(0, 0);
        assert!(app.hover().is_none());
    }
}
