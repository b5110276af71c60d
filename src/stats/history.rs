//! Worldwide time series for the chart.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use super::normalize::number_from_value;
use super::CaseType;

/// Date format used as map keys by the historical endpoint, e.g. `3/14/21`.
const DATE_FORMAT: &str = "%m/%d/%y";

/// Historical payload: one `"m/d/yy" -> cumulative count` map per case-type.
/// A series that is null or not a map reads as empty; the others survive.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawHistory {
    #[serde(default, deserialize_with = "lenient_series")]
    pub cases: HashMap<String, Value>,
    #[serde(default, deserialize_with = "lenient_series")]
    pub deaths: HashMap<String, Value>,
    #[serde(default, deserialize_with = "lenient_series")]
    pub recovered: HashMap<String, Value>,
}

fn lenient_series<'de, D>(deserializer: D) -> Result<HashMap<String, Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Object(map) => map.into_iter().collect(),
        _ => HashMap::new(),
    })
}

fn parse_series(raw: &HashMap<String, Value>) -> BTreeMap<NaiveDate, u64> {
    raw.iter()
        .filter_map(|(date, value)| {
            let date = NaiveDate::parse_from_str(date.trim(), DATE_FORMAT).ok()?;
            let n = number_from_value(value)?;
            Some((date, if n > 0.0 { n.round() as u64 } else { 0 }))
        })
        .collect()
}

/// Cumulative counts per day, aligned on one shared date axis.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct History {
    pub dates: Vec<NaiveDate>,
    cases: Vec<u64>,
    deaths: Vec<u64>,
    recovered: Vec<u64>,
}

impl History {
    pub fn from_raw(raw: &RawHistory) -> Self {
        let cases = parse_series(&raw.cases);
        let deaths = parse_series(&raw.deaths);
        let recovered = parse_series(&raw.recovered);

        let dates: Vec<NaiveDate> = cases
            .keys()
            .chain(deaths.keys())
            .chain(recovered.keys())
            .copied()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        // A day missing from one series repeats that series' previous value.
        let align = |series: &BTreeMap<NaiveDate, u64>| {
            let mut last = 0;
            dates
                .iter()
                .map(|d| {
                    if let Some(&v) = series.get(d) {
                        last = v;
                    }
                    last
                })
                .collect::<Vec<_>>()
        };

        Self {
            cases: align(&cases),
            deaths: align(&deaths),
            recovered: align(&recovered),
            dates,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn cumulative(&self, case_type: CaseType) -> &[u64] {
        match case_type {
            CaseType::Cases => &self.cases,
            CaseType::Recovered => &self.recovered,
            CaseType::Deaths => &self.deaths,
        }
    }

    /// New counts per day. The first day has no predecessor and is skipped;
    /// downward revisions read as zero.
    pub fn daily(&self, case_type: CaseType) -> Vec<(NaiveDate, u64)> {
        let series = self.cumulative(case_type);
        self.dates
            .iter()
            .skip(1)
            .zip(series.windows(2))
            .map(|(date, w)| (*date, w[1].saturating_sub(w[0])))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(value: Value) -> RawHistory {
        serde_json::from_value(value).unwrap()
    }

    fn day(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2021, m, d).unwrap()
    }

    #[test]
    fn test_dates_sorted_chronologically() {
        let history = History::from_raw(&raw(json!({
            "cases": { "3/10/21": 30, "3/2/21": 10, "3/9/21": 20 }
        })));
        assert_eq!(history.dates, vec![day(3, 2), day(3, 9), day(3, 10)]);
        assert_eq!(history.cumulative(CaseType::Cases), &[10, 20, 30]);
    }

    #[test]
    fn test_daily_differences() {
        let history = History::from_raw(&raw(json!({
            "cases": { "1/1/21": 100, "1/2/21": 150, "1/3/21": 140, "1/4/21": 200 },
            "deaths": { "1/1/21": 1, "1/2/21": 2, "1/3/21": 2, "1/4/21": 5 }
        })));
        assert_eq!(
            history.daily(CaseType::Cases),
            vec![(day(1, 2), 50), (day(1, 3), 0), (day(1, 4), 60)]
        );
        assert_eq!(
            history.daily(CaseType::Deaths),
            vec![(day(1, 2), 1), (day(1, 3), 0), (day(1, 4), 3)]
        );
        // Never reported: flat zero line.
        assert!(history.daily(CaseType::Recovered).iter().all(|(_, n)| *n == 0));
    }

    #[test]
    fn test_bad_entries_are_skipped() {
        let history = History::from_raw(&raw(json!({
            "cases": { "1/1/21": "7", "not a date": 9, "1/2/21": null, "1/3/21": 12 }
        })));
        assert_eq!(history.dates, vec![day(1, 1), day(1, 3)]);
        assert_eq!(history.cumulative(CaseType::Cases), &[7, 12]);
    }

    #[test]
    fn test_null_series_keeps_the_others() {
        let history = History::from_raw(&raw(json!({
            "cases": { "1/1/21": 10, "1/2/21": 15 },
            "deaths": "unavailable",
            "recovered": null
        })));
        assert_eq!(history.dates, vec![day(1, 1), day(1, 2)]);
        assert_eq!(history.cumulative(CaseType::Cases), &[10, 15]);
        assert_eq!(history.cumulative(CaseType::Deaths), &[0, 0]);
        assert_eq!(history.cumulative(CaseType::Recovered), &[0, 0]);
    }

    #[test]
    fn test_missing_days_carry_forward() {
        let history = History::from_raw(&raw(json!({
            "cases": { "1/1/21": 1, "1/2/21": 2 },
            "deaths": { "1/1/21": 5 }
        })));
        assert_eq!(history.cumulative(CaseType::Deaths), &[5, 5]);
    }

    #[test]
    fn test_empty_payload() {
        let history = History::from_raw(&RawHistory::default());
        assert!(history.is_empty());
        assert!(history.daily(CaseType::Cases).is_empty());
    }
}
