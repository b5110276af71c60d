//! Internal shape of the statistics and the pure functions over it.

pub mod format;
pub mod history;
pub mod markers;
pub mod normalize;

use std::fmt;

pub use history::{History, RawHistory};
pub use markers::{project, Marker, MarkerColor, Popup};
pub use normalize::{
    normalize, normalize_batch, normalize_worldwide, sort_by_severity, NormalizedBatch, RawRecord,
};

/// Identifies a country by its ISO-2 code, or the worldwide aggregate.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RegionId {
    #[default]
    Worldwide,
    Country(String),
}

impl RegionId {
    pub fn country(code: impl Into<String>) -> Self {
        RegionId::Country(code.into())
    }

    pub fn is_worldwide(&self) -> bool {
        matches!(self, RegionId::Worldwide)
    }
}

impl fmt::Display for RegionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegionId::Worldwide => f.write_str("worldwide"),
            RegionId::Country(code) => f.write_str(code),
        }
    }
}

/// Geographic coordinate in degrees. Only constructed through `new`, which
/// rejects non-finite and out-of-range values.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub fn new(lat: f64, lng: f64) -> Option<Self> {
        if !lat.is_finite() || !lng.is_finite() {
            return None;
        }
        if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lng) {
            return None;
        }
        Some(Self { lat, lng })
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct RegionStats {
    pub region_id: RegionId,
    pub display_name: String,
    pub position: Option<LatLng>,
    pub cases: u64,
    pub deaths: u64,
    pub recovered: u64,
    pub today_cases: Option<u64>,
    pub today_deaths: Option<u64>,
    pub today_recovered: Option<u64>,
}

impl RegionStats {
    /// Cumulative count for the case-type.
    pub fn total(&self, case_type: CaseType) -> u64 {
        match case_type {
            CaseType::Cases => self.cases,
            CaseType::Recovered => self.recovered,
            CaseType::Deaths => self.deaths,
        }
    }

    /// Latest-period delta for the case-type, if the API reported one.
    pub fn today(&self, case_type: CaseType) -> Option<u64> {
        match case_type {
            CaseType::Cases => self.today_cases,
            CaseType::Recovered => self.today_recovered,
            CaseType::Deaths => self.today_deaths,
        }
    }
}

/// The statistic every view is currently keyed on.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum CaseType {
    #[default]
    Cases,
    Recovered,
    Deaths,
}

impl CaseType {
    pub const ALL: [CaseType; 3] = [CaseType::Cases, CaseType::Recovered, CaseType::Deaths];

    pub fn label(self) -> &'static str {
        match self {
            CaseType::Cases => "Cases",
            CaseType::Recovered => "Recovered",
            CaseType::Deaths => "Deaths",
        }
    }

    /// Next case-type in display order, wrapping around.
    pub fn next(self) -> Self {
        match self {
            CaseType::Cases => CaseType::Recovered,
            CaseType::Recovered => CaseType::Deaths,
            CaseType::Deaths => CaseType::Cases,
        }
    }
}

impl fmt::Display for CaseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
