//! Raw API records -> `RegionStats`.
//!
//! Every field coming from the API is treated as untrusted. Numbers may be
//! missing, null, negative, fractional or strings; they are read once here
//! through the lenient helpers and never reach the rest of the crate raw.

use std::cmp::Ordering;
use std::collections::HashSet;

use rayon::prelude::*;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use super::{LatLng, RegionId, RegionStats};
use crate::error::NormalizeError;

/// One record as served by the aggregate, list and single-country endpoints.
/// Unknown fields are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawRecord {
    #[serde(default, deserialize_with = "lenient_string")]
    pub country: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub country_info: Option<RawCountryInfo>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub cases: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub today_cases: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub deaths: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub today_deaths: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub recovered: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub today_recovered: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawCountryInfo {
    #[serde(default, deserialize_with = "lenient_string")]
    pub iso2: Option<String>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub lat: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub long: Option<f64>,
}

/// Accepts numbers and numeric strings; anything else (null, bool, objects,
/// NaN-producing strings) reads as absent.
pub(crate) fn lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(number_from_value(&value))
}

pub(crate) fn number_from_value(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    n.filter(|v| v.is_finite())
}

fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

/// A nested block of the wrong shape reads as absent instead of failing the
/// whole record.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

fn counter(raw: Option<f64>) -> u64 {
    delta(raw).unwrap_or(0)
}

fn delta(raw: Option<f64>) -> Option<u64> {
    raw.map(|v| if v > 0.0 { v.round() as u64 } else { 0 })
}

fn non_blank(s: Option<&str>) -> Option<&str> {
    s.map(str::trim).filter(|s| !s.is_empty())
}

fn build(raw: &RawRecord, region_id: RegionId, display_name: String, position: Option<LatLng>) -> RegionStats {
    RegionStats {
        region_id,
        display_name,
        position,
        cases: counter(raw.cases),
        deaths: counter(raw.deaths),
        recovered: counter(raw.recovered),
        today_cases: delta(raw.today_cases),
        today_deaths: delta(raw.today_deaths),
        today_recovered: delta(raw.today_recovered),
    }
}

/// Normalize one country record. The name and the ISO-2 code are required;
/// everything else falls back.
pub fn normalize(raw: &RawRecord) -> Result<RegionStats, NormalizeError> {
    let name = non_blank(raw.country.as_deref()).ok_or(NormalizeError::MissingName)?;
    let info = raw.country_info.as_ref();
    let code = non_blank(info.and_then(|i| i.iso2.as_deref())).ok_or_else(|| {
        NormalizeError::MissingCode {
            name: name.to_string(),
        }
    })?;
    let position = info.and_then(|i| LatLng::new(i.lat?, i.long?));

    Ok(build(
        raw,
        RegionId::country(code.to_ascii_uppercase()),
        name.to_string(),
        position,
    ))
}

/// Normalize the aggregate record. It carries no identity of its own, so it
/// always becomes the worldwide sentinel. Without a case count the body is
/// not an aggregate at all (an error object, a proxy page).
pub fn normalize_worldwide(raw: &RawRecord) -> Result<RegionStats, NormalizeError> {
    if raw.cases.is_none() {
        return Err(NormalizeError::MissingCounters);
    }
    Ok(build(raw, RegionId::Worldwide, "Worldwide".to_string(), None))
}

#[derive(Debug, Clone, Default)]
pub struct NormalizedBatch {
    /// Valid records in input order, first occurrence of each region only.
    pub records: Vec<RegionStats>,
    /// Malformed or duplicate records that were left out.
    pub dropped: usize,
}

/// Normalize a whole country list. Bad records are dropped, never fatal.
pub fn normalize_batch(raw: &[RawRecord]) -> NormalizedBatch {
    let results: Vec<Result<RegionStats, NormalizeError>> =
        raw.par_iter().map(normalize).collect();

    let mut seen = HashSet::with_capacity(results.len());
    let mut batch = NormalizedBatch {
        records: Vec::with_capacity(results.len()),
        dropped: 0,
    };

    for result in results {
        match result {
            Ok(stats) if seen.insert(stats.region_id.clone()) => batch.records.push(stats),
            Ok(stats) => {
                tracing::debug!(region = %stats.region_id, "dropping duplicate record");
                batch.dropped += 1;
            }
            Err(e) => {
                tracing::debug!(error = %e, "dropping malformed record");
                batch.dropped += 1;
            }
        }
    }

    batch
}

fn cmp_ignore_case(a: &str, b: &str) -> Ordering {
    a.chars()
        .flat_map(char::to_lowercase)
        .cmp(b.chars().flat_map(char::to_lowercase))
}

/// Table order: most cases first, ties by name ignoring case. The trailing
/// comparisons make the order total so the result never depends on the
/// input order.
pub fn severity_order(a: &RegionStats, b: &RegionStats) -> Ordering {
    b.cases
        .cmp(&a.cases)
        .then_with(|| cmp_ignore_case(&a.display_name, &b.display_name))
        .then_with(|| a.display_name.cmp(&b.display_name))
        .then_with(|| a.region_id.cmp(&b.region_id))
}

pub fn sort_by_severity(mut records: Vec<RegionStats>) -> Vec<RegionStats> {
    records.sort_by(severity_order);
    records
}
