use std::f64::consts::PI;

use crate::controller::MapViewport;

/// Equatorial circumference in metres (WGS84).
const EARTH_CIRCUMFERENCE_M: f64 = 40_075_016.686;

const MIN_ZOOM: f64 = 0.5;
const MAX_ZOOM: f64 = 64.0;

/// Local pan/zoom state of the terminal map, in canvas pixels.
#[derive(Clone, Debug, PartialEq)]
pub struct Viewport {
    /// Center longitude (-180 to 180)
    pub center_lon: f64,
    /// Center latitude, clamped to the Mercator limit
    pub center_lat: f64,
    /// 1.0 fits the whole world across the canvas width
    pub zoom: f64,
    /// Canvas pixel width
    pub width: usize,
    /// Canvas pixel height
    pub height: usize,
}

fn mercator_y(lat: f64) -> f64 {
    let lat_rad = lat.clamp(-85.0, 85.0) * PI / 180.0;
    (1.0 - (lat_rad.tan() + 1.0 / lat_rad.cos()).ln() / PI) / 2.0
}

impl Viewport {
    pub fn new(center_lon: f64, center_lat: f64, zoom: f64, width: usize, height: usize) -> Self {
        Self {
            center_lon,
            center_lat: center_lat.clamp(-85.0, 85.0),
            zoom: zoom.clamp(MIN_ZOOM, MAX_ZOOM),
            width,
            height,
        }
    }

    /// Tile zoom levels map onto canvas zoom with level 3 as the whole world.
    pub fn from_map_viewport(view: &MapViewport, width: usize, height: usize) -> Self {
        let zoom = 2f64.powi(i32::from(view.zoom) - 3);
        Self::new(view.center.lng, view.center.lat, zoom, width, height)
    }

    pub fn resize(&mut self, width: usize, height: usize) {
        self.width = width;
        self.height = height;
    }

    /// Pan the viewport by pixel delta
    pub fn pan(&mut self, dx: i32, dy: i32) {
        let scale = 360.0 / (self.zoom * self.width.max(1) as f64);
        self.center_lon += dx as f64 * scale;
        self.center_lat -= dy as f64 * scale * 0.5; // Mercator distortion

        if self.center_lon > 180.0 {
            self.center_lon -= 360.0;
        } else if self.center_lon < -180.0 {
            self.center_lon += 360.0;
        }

        self.center_lat = self.center_lat.clamp(-85.0, 85.0);
    }

    pub fn zoom_in(&mut self) {
        self.zoom = (self.zoom * 1.5).min(MAX_ZOOM);
    }

    pub fn zoom_out(&mut self) {
        self.zoom = (self.zoom / 1.5).max(MIN_ZOOM);
    }

    pub fn zoom_in_at(&mut self, px: i32, py: i32) {
        self.zoom_at(px, py, 1.5);
    }

    pub fn zoom_out_at(&mut self, px: i32, py: i32) {
        self.zoom_at(px, py, 1.0 / 1.5);
    }

    /// Zoom by `factor` keeping the point under the cursor in place.
    fn zoom_at(&mut self, px: i32, py: i32, factor: f64) {
        let (lon, lat) = self.unproject(px, py);
        self.zoom = (self.zoom * factor).clamp(MIN_ZOOM, MAX_ZOOM);

        let (new_px, new_py) = self.project(lon, lat);
        self.pan(new_px - px, new_py - py);
    }

    fn scale(&self) -> f64 {
        self.zoom * self.width as f64
    }

    /// Pixel coordinates back to (lon, lat).
    pub fn unproject(&self, px: i32, py: i32) -> (f64, f64) {
        let scale = self.scale();
        let center_x = (self.center_lon + 180.0) / 360.0;
        let center_y = mercator_y(self.center_lat);

        let x = (px as f64 - self.width as f64 / 2.0) / scale + center_x;
        let y = (py as f64 - self.height as f64 / 2.0) / scale + center_y;

        let lon = x * 360.0 - 180.0;
        let lat = (PI * (1.0 - 2.0 * y)).sinh().atan() * 180.0 / PI;

        (lon, lat)
    }

    /// (lon, lat) to pixel coordinates, Web Mercator.
    pub fn project(&self, lon: f64, lat: f64) -> (i32, i32) {
        let x = (lon + 180.0) / 360.0;
        let y = mercator_y(lat);

        let center_x = (self.center_lon + 180.0) / 360.0;
        let center_y = mercator_y(self.center_lat);
        let scale = self.scale();

        let px = ((x - center_x) * scale + self.width as f64 / 2.0) as i32;
        let py = ((y - center_y) * scale + self.height as f64 / 2.0) as i32;

        (px, py)
    }

    /// Ground distance covered by one pixel at `lat`.
    pub fn metres_per_pixel(&self, lat: f64) -> f64 {
        let lat_rad = lat.clamp(-85.0, 85.0) * PI / 180.0;
        EARTH_CIRCUMFERENCE_M * lat_rad.cos() / self.scale().max(f64::EPSILON)
    }

    /// Marker radius in pixels; anything below one pixel rounds to a dot.
    pub fn radius_px(&self, radius_m: f64, lat: f64) -> i32 {
        (radius_m / self.metres_per_pixel(lat)).round() as i32
    }

    /// Point plus a margin for shapes that straddle the edge.
    pub fn is_visible(&self, px: i32, py: i32, margin: i32) -> bool {
        px >= -margin
            && px < self.width as i32 + margin
            && py >= -margin
            && py < self.height as i32 + margin
    }

    /// Rough bounding box check for a segment.
    pub fn line_might_be_visible(&self, p1: (i32, i32), p2: (i32, i32)) -> bool {
        let min_x = p1.0.min(p2.0);
        let max_x = p1.0.max(p2.0);
        let min_y = p1.1.min(p2.1);
        let max_y = p1.1.max(p2.1);

        max_x >= 0 && min_x < self.width as i32 && max_y >= 0 && min_y < self.height as i32
    }
}
