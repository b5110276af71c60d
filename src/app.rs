use crossterm::event::{KeyCode, KeyEvent, MouseButton, MouseEvent, MouseEventKind};
use ratatui::layout::{Position, Rect};

use crate::api::StatsSource;
use crate::controller::{ApplicationState, Controller};
use crate::map::{Lod, MapRenderer, Viewport};
use crate::stats::{CaseType, Marker, RegionId};
use crate::ui::Areas;
use crate::view::{picker_entries, table_rows, PickerEntry};

/// Rows moved by PgUp/PgDn.
const PAGE: usize = 10;

/// Region picker overlay: a filter string and a cursor into the filtered
/// entries.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Picker {
    pub filter: String,
    pub cursor: usize,
}

/// Application state
pub struct App<S> {
    pub controller: Controller<S>,
    /// Local pan/zoom; re-synced whenever the controller moves the map.
    pub viewport: Viewport,
    synced_revision: u64,
    pub map_renderer: MapRenderer,
    pub areas: Areas,
    pub should_quit: bool,
    /// Last mouse position for drag tracking
    pub last_mouse: Option<(u16, u16)>,
    /// Current mouse position, for hover popups
    pub mouse_pos: Option<(u16, u16)>,
    pub picker: Option<Picker>,
    pub table_cursor: usize,
}

impl<S: StatsSource> App<S> {
    pub fn new(controller: Controller<S>, width: u16, height: u16) -> Self {
        let areas = Areas::compute(Rect::new(0, 0, width, height));
        let (pw, ph) = areas.map_pixels();
        let viewport = Viewport::from_map_viewport(&controller.state().map_viewport, pw, ph);
        let synced_revision = controller.state().viewport_revision;

        Self {
            controller,
            viewport,
            synced_revision,
            map_renderer: MapRenderer::new(),
            areas,
            should_quit: false,
            last_mouse: None,
            mouse_pos: None,
            picker: None,
            table_cursor: 0,
        }
    }

    pub fn state(&self) -> &ApplicationState {
        self.controller.state()
    }

    /// Apply finished fetches and follow viewport changes. Returns true when
    /// anything changed.
    pub fn tick(&mut self) -> bool {
        let applied = self.controller.drain();
        let revision = self.state().viewport_revision;
        if revision != self.synced_revision {
            self.recenter();
        }
        applied > 0
    }

    /// Back to the viewport the controller last chose.
    pub fn recenter(&mut self) {
        let (pw, ph) = self.areas.map_pixels();
        self.viewport = Viewport::from_map_viewport(&self.state().map_viewport, pw, ph);
        self.synced_revision = self.state().viewport_revision;
    }

    /// Update layout and viewport size when terminal resizes
    pub fn resize(&mut self, width: u16, height: u16) {
        self.areas = Areas::compute(Rect::new(0, 0, width, height));
        let (pw, ph) = self.areas.map_pixels();
        self.viewport.resize(pw, ph);
    }

    pub fn pan(&mut self, dx: i32, dy: i32) {
        self.viewport.pan(dx, dy);
    }

    pub fn quit(&mut self) {
        self.should_quit = true;
    }

    pub fn select_region(&mut self, region_id: RegionId) {
        self.controller.select_region(region_id);
    }

    pub fn select_case_type(&mut self, case_type: CaseType) {
        self.controller.select_case_type(case_type);
    }

    pub fn picker_entries(&self) -> Vec<PickerEntry> {
        match &self.picker {
            Some(picker) => picker_entries(self.state(), &picker.filter),
            None => Vec::new(),
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        if self.picker.is_some() {
            self.handle_picker_key(key);
            return;
        }

        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => self.quit(),

            KeyCode::Char('/') | KeyCode::Char('s') => self.picker = Some(Picker::default()),
            KeyCode::Char('w') => self.select_region(RegionId::Worldwide),

            KeyCode::Char('1') | KeyCode::Char('c') => self.select_case_type(CaseType::Cases),
            KeyCode::Char('2') | KeyCode::Char('r') => self.select_case_type(CaseType::Recovered),
            KeyCode::Char('3') | KeyCode::Char('d') => self.select_case_type(CaseType::Deaths),
            KeyCode::Tab => {
                let next = self.state().selected_case_type.next();
                self.select_case_type(next);
            }

            KeyCode::Up => self.move_table_cursor(-1),
            KeyCode::Down => self.move_table_cursor(1),
            KeyCode::PageUp => self.move_table_cursor(-(PAGE as isize)),
            KeyCode::PageDown => self.move_table_cursor(PAGE as isize),
            KeyCode::Enter => {
                let rows = table_rows(self.state());
                if let Some(row) = rows.get(self.table_cursor) {
                    self.select_region(row.region_id.clone());
                }
            }

            KeyCode::Char('h') => self.pan(-10, 0),
            KeyCode::Char('l') => self.pan(10, 0),
            KeyCode::Char('k') => self.pan(0, -6),
            KeyCode::Char('j') => self.pan(0, 6),
            KeyCode::Char('+') | KeyCode::Char('=') => self.viewport.zoom_in(),
            KeyCode::Char('-') | KeyCode::Char('_') => self.viewport.zoom_out(),
            KeyCode::Char('0') => self.recenter(),
            KeyCode::Char('b') => self.map_renderer.toggle_borders(),
            KeyCode::Char('m') => self.map_renderer.toggle_markers(),

            _ => {}
        }
    }

    fn handle_picker_key(&mut self, key: KeyEvent) {
        let entries = self.picker_entries();
        let Some(picker) = self.picker.as_mut() else {
            return;
        };

        match key.code {
            KeyCode::Esc => self.picker = None,
            KeyCode::Enter => {
                let choice = entries.get(picker.cursor).cloned();
                self.picker = None;
                if let Some(entry) = choice {
                    self.select_region(entry.region_id);
                }
            }
            KeyCode::Up => picker.cursor = picker.cursor.saturating_sub(1),
            KeyCode::Down => picker.cursor = (picker.cursor + 1).min(entries.len().saturating_sub(1)),
            KeyCode::Backspace => {
                picker.filter.pop();
                picker.cursor = 0;
            }
            KeyCode::Char(ch) => {
                picker.filter.push(ch);
                picker.cursor = 0;
            }
            _ => {}
        }
    }

    fn move_table_cursor(&mut self, delta: isize) {
        let len = self.state().severity_order.len();
        if len == 0 {
            self.table_cursor = 0;
            return;
        }
        self.table_cursor = self.table_cursor.saturating_add_signed(delta).min(len - 1);
    }

    /// Mouse position in braille pixels, if it is over the map.
    pub fn mouse_pixel_pos(&self) -> Option<(i32, i32)> {
        let (col, row) = self.mouse_pos?;
        let inner = self.areas.map_inner;
        if !inner.contains(Position::new(col, row)) {
            return None;
        }
        Some((
            i32::from(col - inner.x) * 2,
            i32::from(row - inner.y) * 4,
        ))
    }

    pub fn hovered_marker(&self) -> Option<&Marker> {
        let (px, py) = self.mouse_pixel_pos()?;
        self.map_renderer
            .hit_test(&self.viewport, &self.state().markers, px, py)
    }

    /// Popup target: the hovered marker, else the selected region's.
    pub fn popup_marker(&self) -> Option<&Marker> {
        if !self.map_renderer.settings.show_markers {
            return None;
        }
        self.hovered_marker().or_else(|| {
            let selected = &self.state().selected_region;
            self.state().markers.iter().find(|m| &m.region_id == selected)
        })
    }

    pub fn handle_mouse(&mut self, mouse: MouseEvent) {
        self.mouse_pos = Some((mouse.column, mouse.row));
        let over_map = self.mouse_pixel_pos();

        match mouse.kind {
            MouseEventKind::ScrollUp => {
                if let Some((px, py)) = over_map {
                    self.viewport.zoom_in_at(px, py);
                }
            }
            MouseEventKind::ScrollDown => {
                if let Some((px, py)) = over_map {
                    self.viewport.zoom_out_at(px, py);
                }
            }
            MouseEventKind::ScrollLeft => self.pan(-15, 0),
            MouseEventKind::ScrollRight => self.pan(15, 0),
            // The picker overlay covers the map; clicks there are not map clicks.
            MouseEventKind::Down(MouseButton::Left) if self.picker.is_some() => {}
            MouseEventKind::Down(MouseButton::Left) => {
                if let Some(marker) = self.hovered_marker() {
                    let region = marker.region_id.clone();
                    self.select_region(region);
                } else if over_map.is_some() {
                    self.last_mouse = Some((mouse.column, mouse.row));
                }
            }
            MouseEventKind::Drag(MouseButton::Left) => self.handle_drag(mouse.column, mouse.row),
            MouseEventKind::Up(MouseButton::Left) => self.last_mouse = None,
            _ => {}
        }
    }

    fn handle_drag(&mut self, x: u16, y: u16) {
        if let Some((last_x, last_y)) = self.last_mouse {
            let dx = i32::from(last_x) - i32::from(x);
            let dy = i32::from(last_y) - i32::from(y);
            // Less sensitive when zoomed out
            let scale = if self.viewport.zoom < 2.0 {
                2
            } else if self.viewport.zoom < 4.0 {
                3
            } else {
                4
            };
            self.pan(dx * scale, dy * scale);
            self.last_mouse = Some((x, y));
        }
    }

    pub fn zoom_level(&self) -> String {
        format!("{:.1}x", self.viewport.zoom)
    }

    pub fn center_coords(&self) -> String {
        format!(
            "{:.1}°{}, {:.1}°{}",
            self.viewport.center_lat.abs(),
            if self.viewport.center_lat >= 0.0 { "N" } else { "S" },
            self.viewport.center_lon.abs(),
            if self.viewport.center_lon >= 0.0 { "E" } else { "W" }
        )
    }

    pub fn lod_level(&self) -> &'static str {
        match Lod::from_zoom(self.viewport.zoom) {
            Lod::Low => "110m",
            Lod::Medium => "50m",
        }
    }
}
