//! Map markers derived from region stats and the selected case-type.

use super::format::format_count;
use super::{CaseType, LatLng, RegionId, RegionStats};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MarkerColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl MarkerColor {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn hex(self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

impl CaseType {
    /// Marker color; independent of magnitude.
    pub fn color(self) -> MarkerColor {
        match self {
            CaseType::Cases => MarkerColor::new(0xCC, 0x10, 0x34),
            CaseType::Recovered => MarkerColor::new(0x7D, 0xD7, 0x1D),
            CaseType::Deaths => MarkerColor::new(0xFB, 0x44, 0x43),
        }
    }

    /// Metres of marker radius per square-root unit of magnitude.
    pub fn marker_scale(self) -> f64 {
        match self {
            CaseType::Cases => 800.0,
            CaseType::Recovered => 1200.0,
            CaseType::Deaths => 2000.0,
        }
    }
}

/// Marker radius in metres. Square root so the circle *area* grows
/// linearly with the magnitude.
pub fn marker_radius_m(magnitude: u64, case_type: CaseType) -> f64 {
    (magnitude as f64).sqrt() * case_type.marker_scale()
}

/// Content shown when a marker is inspected: every case-type, not just the
/// selected one.
#[derive(Clone, Debug, PartialEq)]
pub struct Popup {
    pub title: String,
    pub lines: Vec<(CaseType, String)>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Marker {
    pub region_id: RegionId,
    pub position: LatLng,
    pub radius_m: f64,
    pub color: MarkerColor,
    pub popup: Popup,
}

impl Marker {
    /// Area in square metres, the quantity that tracks the magnitude.
    pub fn area_m2(&self) -> f64 {
        std::f64::consts::PI * self.radius_m * self.radius_m
    }
}

fn popup_for(stats: &RegionStats) -> Popup {
    Popup {
        title: stats.display_name.clone(),
        lines: CaseType::ALL
            .iter()
            .map(|&ct| (ct, format_count(stats.total(ct))))
            .collect(),
    }
}

/// Project records onto markers. Records without a position are skipped:
/// plotting them at a made-up coordinate would misrepresent the data.
pub fn project<'a, I>(records: I, case_type: CaseType) -> Vec<Marker>
where
    I: IntoIterator<Item = &'a RegionStats>,
{
    let color = case_type.color();
    records
        .into_iter()
        .filter_map(|stats| {
            let position = stats.position?;
            Some(Marker {
                region_id: stats.region_id.clone(),
                position,
                radius_m: marker_radius_m(stats.total(case_type), case_type),
                color,
                popup: popup_for(stats),
            })
        })
        .collect()
}
