use crate::braille::{BrailleCanvas, Layer};
use crate::map::geometry::{draw_circle, draw_line};
use crate::map::projection::Viewport;
use crate::stats::{Marker, RegionId};

/// A geographic line (sequence of lon/lat coordinates)
pub type LineString = Vec<(f64, f64)>;

/// Markers are never drawn larger than this, whatever the zoom.
const MAX_MARKER_RADIUS_PX: i32 = 96;

/// Level of detail for the coastline backdrop
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Lod {
    Low,    // 110m - world view
    Medium, // 50m - continental
}

impl Lod {
    pub fn from_zoom(zoom: f64) -> Self {
        if zoom < 3.0 {
            Lod::Low
        } else {
            Lod::Medium
        }
    }
}

#[derive(Clone, Debug)]
pub struct DisplaySettings {
    pub show_borders: bool,
    pub show_markers: bool,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            show_borders: true,
            show_markers: true,
        }
    }
}

/// Label for a marker, in character cells relative to the map area.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Label {
    pub x: u16,
    pub y: u16,
    pub text: String,
}

/// World backdrop plus the case markers on top of it.
#[derive(Default)]
pub struct MapRenderer {
    pub coastlines_low: Vec<LineString>,
    pub coastlines_medium: Vec<LineString>,
    pub borders: Vec<LineString>,
    pub settings: DisplaySettings,
}

impl MapRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    fn coastlines(&self, lod: Lod) -> &[LineString] {
        match lod {
            Lod::Medium if !self.coastlines_medium.is_empty() => &self.coastlines_medium,
            _ => &self.coastlines_low,
        }
    }

    /// Draw everything and return the label of the selected region's marker.
    pub fn render(
        &self,
        canvas: &mut BrailleCanvas,
        viewport: &Viewport,
        markers: &[Marker],
        selected: &RegionId,
    ) -> Option<Label> {
        for line in self.coastlines(Lod::from_zoom(viewport.zoom)) {
            draw_linestring(canvas, line, viewport);
        }

        if self.settings.show_borders && viewport.zoom >= 2.0 {
            for line in &self.borders {
                draw_linestring(canvas, line, viewport);
            }
        }

        if !self.settings.show_markers {
            return None;
        }

        let mut label = None;
        for marker in markers {
            let center = viewport.project(marker.position.lng, marker.position.lat);
            let radius = marker_radius_px(viewport, marker);
            if !viewport.is_visible(center.0, center.1, radius) {
                continue;
            }

            if &marker.region_id == selected {
                draw_circle(canvas, center, radius, Layer::Highlight);
                draw_circle(canvas, center, radius + 1, Layer::Highlight);
                label = cell_label(center, radius, &marker.popup.title);
            } else {
                draw_circle(canvas, center, radius, Layer::Marker);
            }
        }

        label
    }

    /// The marker under a canvas pixel. Where circles overlap the smallest
    /// one wins, so small countries stay reachable inside big neighbours.
    pub fn hit_test<'a>(
        &self,
        viewport: &Viewport,
        markers: &'a [Marker],
        px: i32,
        py: i32,
    ) -> Option<&'a Marker> {
        if !self.settings.show_markers {
            return None;
        }
        markers
            .iter()
            .filter_map(|marker| {
                let (mx, my) = viewport.project(marker.position.lng, marker.position.lat);
                let radius = marker_radius_px(viewport, marker).max(2);
                let (dx, dy) = (i64::from(px - mx), i64::from(py - my));
                let r = i64::from(radius);
                (dx * dx + dy * dy <= r * r).then_some((radius, marker))
            })
            .min_by_key(|(radius, _)| *radius)
            .map(|(_, marker)| marker)
    }

    pub fn add_coastline(&mut self, line: LineString, lod: Lod) {
        match lod {
            Lod::Low => self.coastlines_low.push(line),
            Lod::Medium => self.coastlines_medium.push(line),
        }
    }

    pub fn add_border(&mut self, line: LineString) {
        self.borders.push(line);
    }

    pub fn has_data(&self) -> bool {
        !self.coastlines_low.is_empty() || !self.coastlines_medium.is_empty()
    }

    pub fn toggle_borders(&mut self) {
        self.settings.show_borders = !self.settings.show_borders;
    }

    pub fn toggle_markers(&mut self) {
        self.settings.show_markers = !self.settings.show_markers;
    }
}

fn marker_radius_px(viewport: &Viewport, marker: &Marker) -> i32 {
    viewport
        .radius_px(marker.radius_m, marker.position.lat)
        .clamp(0, MAX_MARKER_RADIUS_PX)
}

/// Braille pixels to character cells, placed right of the circle.
fn cell_label((px, py): (i32, i32), radius: i32, text: &str) -> Option<Label> {
    let x = u16::try_from((px + radius) / 2 + 2).ok()?;
    let y = u16::try_from(py / 4).ok()?;
    Some(Label {
        x,
        y,
        text: text.to_string(),
    })
}

/// Draw a linestring with viewport culling
fn draw_linestring(canvas: &mut BrailleCanvas, line: &LineString, viewport: &Viewport) {
    if line.len() < 2 {
        return;
    }

    let mut prev: Option<(i32, i32)> = None;

    for &(lon, lat) in line {
        let p = viewport.project(lon, lat);

        if let Some(q) = prev {
            // Segments crossing the antimeridian would span the whole canvas.
            let dist = ((p.0 - q.0).abs() + (p.1 - q.1).abs()) as usize;
            if dist < viewport.width && viewport.line_might_be_visible(q, p) {
                draw_line(canvas, q, p, Layer::Land);
            }
        }

        prev = Some(p);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::{project, CaseType, LatLng, RegionStats};

    fn stats(code: &str, cases: u64, lat: f64, lng: f64) -> RegionStats {
        RegionStats {
            region_id: RegionId::country(code),
            display_name: code.to_string(),
            position: LatLng::new(lat, lng),
            cases,
            deaths: 0,
            recovered: 0,
            today_cases: None,
            today_deaths: None,
            today_recovered: None,
        }
    }

    #[test]
    fn test_lod_from_zoom() {
        assert_eq!(Lod::from_zoom(1.0), Lod::Low);
        assert_eq!(Lod::from_zoom(4.0), Lod::Medium);
    }

    #[test]
    fn test_medium_falls_back_to_low() {
        let mut renderer = MapRenderer::new();
        renderer.add_coastline(vec![(0.0, 0.0), (1.0, 1.0)], Lod::Low);
        assert_eq!(renderer.coastlines(Lod::Medium).len(), 1);
        assert!(renderer.has_data());
    }

    #[test]
    fn test_hit_test_prefers_smallest_marker() {
        let records = vec![stats("BIG", 10_000_000, 0.0, 0.0), stats("SML", 10_000, 0.0, 0.5)];
        let markers = project(&records, CaseType::Cases);
        let vp = Viewport::new(0.0, 0.0, 4.0, 200, 100);
        let renderer = MapRenderer::new();

        let (px, py) = vp.project(0.5, 0.0);
        let hit = renderer.hit_test(&vp, &markers, px, py).unwrap();
        assert_eq!(hit.region_id, RegionId::country("SML"));

        let (px, py) = vp.project(-1.0, 0.0);
        let hit = renderer.hit_test(&vp, &markers, px, py).unwrap();
        assert_eq!(hit.region_id, RegionId::country("BIG"));

        assert!(renderer.hit_test(&vp, &markers, 0, 0).is_none());
    }

    #[test]
    fn test_selected_marker_gets_label() {
        let records = vec![stats("FR", 40_000, 46.0, 2.0)];
        let markers = project(&records, CaseType::Cases);
        let vp = Viewport::new(2.0, 46.0, 2.0, 160, 80);
        let mut canvas = BrailleCanvas::new(80, 20);

        let label = MapRenderer::new()
            .render(&mut canvas, &vp, &markers, &RegionId::country("FR"))
            .unwrap();
        assert_eq!(label.text, "FR");
        assert!(label.x > 40);
        assert_eq!(label.y, 10);

        let mut canvas = BrailleCanvas::new(80, 20);
        assert!(MapRenderer::new()
            .render(&mut canvas, &vp, &markers, &RegionId::Worldwide)
            .is_none());
    }

    #[test]
    fn test_hidden_markers_are_not_drawn_or_hit() {
        let records = vec![stats("FR", 40_000, 46.0, 2.0)];
        let markers = project(&records, CaseType::Cases);
        let vp = Viewport::new(2.0, 46.0, 2.0, 160, 80);
        let mut renderer = MapRenderer::new();
        renderer.toggle_markers();

        let mut canvas = BrailleCanvas::new(80, 20);
        let label = renderer.render(&mut canvas, &vp, &markers, &RegionId::country("FR"));
        assert!(label.is_none());
        assert!((0..20).all(|row| canvas.row_runs(row).iter().all(|(layer, _)| layer.is_none())));

        let (px, py) = vp.project(2.0, 46.0);
        assert!(renderer.hit_test(&vp, &markers, px, py).is_none());

        renderer.toggle_markers();
        assert!(renderer.hit_test(&vp, &markers, px, py).is_some());
    }
}
