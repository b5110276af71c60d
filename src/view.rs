//! Read-only view-models derived from [`ApplicationState`].
//!
//! The terminal widgets render these and nothing else, so everything that
//! needs formatting or ordering happens here.

use chrono::NaiveDate;

use crate::controller::{ApplicationState, FetchStatus};
use crate::stats::format::{format_count, format_magnitude, format_today};
use crate::stats::{CaseType, RegionId};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SummaryCard {
    pub case_type: CaseType,
    pub title: &'static str,
    /// Latest-period change, e.g. `+500`.
    pub delta: String,
    /// Cumulative total, e.g. `1.0m`.
    pub total: String,
    pub active: bool,
    /// Cases and deaths are alarming; recovered is not.
    pub is_red: bool,
}

fn card_title(case_type: CaseType) -> &'static str {
    match case_type {
        CaseType::Cases => "Coronavirus Cases",
        CaseType::Recovered => "Recovered",
        CaseType::Deaths => "Deaths",
    }
}

pub fn summary_cards(state: &ApplicationState) -> [SummaryCard; 3] {
    let stats = state.active_stats.as_ref();
    CaseType::ALL.map(|case_type| SummaryCard {
        case_type,
        title: card_title(case_type),
        delta: format_today(stats.and_then(|s| s.today(case_type))),
        total: format_magnitude(stats.map(|s| s.total(case_type))),
        active: state.selected_case_type == case_type,
        is_red: case_type != CaseType::Recovered,
    })
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TableRow {
    pub region_id: RegionId,
    pub name: String,
    pub cases: String,
    pub selected: bool,
}

/// Countries by severity with their full case counts.
pub fn table_rows(state: &ApplicationState) -> Vec<TableRow> {
    state
        .ranked()
        .map(|s| TableRow {
            region_id: s.region_id.clone(),
            name: s.display_name.clone(),
            cases: format_count(s.cases),
            selected: s.region_id == state.selected_region,
        })
        .collect()
}

#[derive(Clone, Debug, PartialEq)]
pub struct ChartSeries {
    pub title: String,
    /// `(day index, new count)`.
    pub points: Vec<(f64, f64)>,
    pub first_date: NaiveDate,
    pub last_date: NaiveDate,
    pub max: f64,
}

/// Worldwide new counts per day for the selected case-type.
pub fn chart_series(state: &ApplicationState) -> Option<ChartSeries> {
    let case_type = state.selected_case_type;
    let daily = state.history.as_ref()?.daily(case_type);
    let first_date = daily.first()?.0;
    let last_date = daily.last()?.0;

    let points: Vec<(f64, f64)> = daily
        .iter()
        .enumerate()
        .map(|(i, (_, n))| (i as f64, *n as f64))
        .collect();
    let max = points.iter().map(|(_, y)| *y).fold(0.0, f64::max);

    Some(ChartSeries {
        title: format!("Worldwide new {}", case_type.label().to_lowercase()),
        points,
        first_date,
        last_date,
        max,
    })
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PickerEntry {
    pub region_id: RegionId,
    pub label: String,
}

/// Worldwide first, then the catalog in API order, filtered by a
/// case-insensitive match on the name or the code.
pub fn picker_entries(state: &ApplicationState, filter: &str) -> Vec<PickerEntry> {
    let needle = filter.trim().to_lowercase();
    let matches = |label: &str, code: &str| {
        needle.is_empty()
            || label.to_lowercase().contains(&needle)
            || code.to_lowercase() == needle
    };

    let worldwide = PickerEntry {
        region_id: RegionId::Worldwide,
        label: "Worldwide".to_string(),
    };

    std::iter::once(worldwide)
        .chain(state.catalog.iter().map(|entry| PickerEntry {
            region_id: entry.region_id.clone(),
            label: entry.display_name.clone(),
        }))
        .filter(|e| matches(&e.label, &e.region_id.to_string()))
        .collect()
}

pub fn status_line(state: &ApplicationState) -> String {
    if let Some(err) = &state.last_error {
        return err.clone();
    }
    match state.status {
        FetchStatus::FetchingWorldwide => "Loading worldwide data...".to_string(),
        FetchStatus::FetchingRegion => {
            let name = state
                .display_name(&state.selected_region)
                .map(str::to_string)
                .unwrap_or_else(|| state.selected_region.to_string());
            format!("Loading {name}...")
        }
        FetchStatus::Idle => format!("{} countries", state.catalog.len()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::CatalogEntry;
    use crate::stats::{normalize_batch, normalize_worldwide, History, RawHistory, RawRecord};
    use serde_json::json;

    fn raw(value: serde_json::Value) -> RawRecord {
        serde_json::from_value(value).unwrap()
    }

    fn state_with_countries() -> ApplicationState {
        let batch = normalize_batch(&[
            raw(json!({ "country": "Italy", "countryInfo": { "iso2": "IT" }, "cases": 2500 })),
            raw(json!({ "country": "India", "countryInfo": { "iso2": "IN" }, "cases": 1234567 })),
        ]);
        let mut state = ApplicationState::default();
        state.catalog = batch
            .records
            .iter()
            .map(|s| CatalogEntry {
                region_id: s.region_id.clone(),
                display_name: s.display_name.clone(),
            })
            .collect();
        state.severity_order = vec![RegionId::country("IN"), RegionId::country("IT")];
        state.all_stats = batch
            .records
            .into_iter()
            .map(|s| (s.region_id.clone(), s))
            .collect();
        state
    }

    #[test]
    fn test_worldwide_summary_end_to_end() {
        let mut state = ApplicationState::default();
        state.active_stats = Some(normalize_worldwide(&raw(json!({
            "cases": 1000000, "todayCases": 500, "deaths": 20000
        })))
        .unwrap());

        let cards = summary_cards(&state);
        assert_eq!(cards[0].total, "1.0m");
        assert_eq!(cards[0].delta, "+500");
        assert!(cards[0].active);
        assert_eq!(cards[1].total, "0");
        assert_eq!(cards[1].delta, "0");
        assert!(!cards[1].is_red);
        assert_eq!(cards[2].total, "20.0k");
        assert_eq!(cards[2].delta, "0");
    }

    #[test]
    fn test_summary_without_stats() {
        let cards = summary_cards(&ApplicationState::default());
        assert!(cards.iter().all(|c| c.total == "0" && c.delta == "0"));
    }

    #[test]
    fn test_table_rows_follow_severity() {
        let mut state = state_with_countries();
        state.selected_region = RegionId::country("IT");
        let rows = table_rows(&state);
        assert_eq!(rows[0].name, "India");
        assert_eq!(rows[0].cases, "1,234,567");
        assert!(!rows[0].selected);
        assert!(rows[1].selected);
    }

    #[test]
    fn test_picker_filters() {
        let state = state_with_countries();
        let all: Vec<_> = picker_entries(&state, "").into_iter().map(|e| e.label).collect();
        assert_eq!(all, vec!["Worldwide", "Italy", "India"]);

        let found: Vec<_> = picker_entries(&state, "ind").into_iter().map(|e| e.label).collect();
        assert_eq!(found, vec!["India"]);

        let by_code = picker_entries(&state, "it");
        assert_eq!(by_code.len(), 1);
        assert_eq!(by_code[0].region_id, RegionId::country("IT"));
    }

    #[test]
    fn test_chart_series_for_selected_case_type() {
        let mut state = ApplicationState::default();
        let history: RawHistory = serde_json::from_value(json!({
            "cases": { "1/1/21": 10, "1/2/21": 25, "1/3/21": 30 },
            "deaths": { "1/1/21": 1, "1/2/21": 1, "1/3/21": 4 }
        }))
        .unwrap();
        state.history = Some(History::from_raw(&history));
        state.selected_case_type = CaseType::Deaths;

        let series = chart_series(&state).unwrap();
        assert_eq!(series.points, vec![(0.0, 0.0), (1.0, 3.0)]);
        assert_eq!(series.max, 3.0);
        assert_eq!(series.title, "Worldwide new deaths");
    }

    #[test]
    fn test_no_chart_without_history() {
        assert!(chart_series(&ApplicationState::default()).is_none());
    }

    #[test]
    fn test_status_prefers_errors() {
        let mut state = state_with_countries();
        assert_eq!(status_line(&state), "2 countries");
        state.status = FetchStatus::FetchingRegion;
        state.selected_region = RegionId::country("IN");
        assert_eq!(status_line(&state), "Loading India...");
        state.last_error = Some("Network unavailable".to_string());
        assert_eq!(status_line(&state), "Network unavailable");
    }
}
