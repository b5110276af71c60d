use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use super::StatsSource;
use crate::config::Config;
use crate::error::FetchError;
use crate::stats::{RawHistory, RawRecord};

/// `StatsSource` backed by the disease.sh v3 COVID-19 API.
#[derive(Clone, Debug)]
pub struct DiseaseShClient {
    http: reqwest::Client,
    base_url: String,
}

impl DiseaseShClient {
    pub fn new(base_url: &str, timeout: Duration) -> reqwest::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &Config) -> reqwest::Result<Self> {
        Self::new(&config.api_url, config.timeout)
    }

    pub fn worldwide_url(&self) -> String {
        format!("{}/all", self.base_url)
    }

    pub fn countries_url(&self) -> String {
        format!("{}/countries", self.base_url)
    }

    pub fn country_url(&self, code: &str) -> String {
        format!("{}/countries/{}", self.base_url, code.trim())
    }

    pub fn history_url(&self, days: u32) -> String {
        format!("{}/historical/all?lastdays={}", self.base_url, days)
    }

    async fn get_bytes(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        tracing::debug!(%url, "GET");
        let res = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::from_reqwest(url, e))?;

        let status = res.status();
        if !status.is_success() {
            return Err(FetchError::BadStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = res
            .bytes()
            .await
            .map_err(|e| FetchError::from_reqwest(url, e))?;
        tracing::trace!(%url, bytes = body.len(), "response body");
        Ok(body.to_vec())
    }
}

#[async_trait]
impl StatsSource for DiseaseShClient {
    async fn worldwide(&self) -> Result<RawRecord, FetchError> {
        let mut body = self.get_bytes(&self.worldwide_url()).await?;
        parse_record(&mut body)
    }

    async fn countries(&self) -> Result<Vec<RawRecord>, FetchError> {
        let mut body = self.get_bytes(&self.countries_url()).await?;
        parse_catalog(&mut body)
    }

    async fn country(&self, code: &str) -> Result<RawRecord, FetchError> {
        let mut body = self.get_bytes(&self.country_url(code)).await?;
        parse_record(&mut body)
    }

    async fn history(&self, days: u32) -> Result<RawHistory, FetchError> {
        let mut body = self.get_bytes(&self.history_url(days)).await?;
        parse_history(&mut body)
    }
}

fn describe(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}

/// simd-json parses in place, so the buffer is scratch space afterwards.
fn parse_value(body: &mut [u8]) -> Option<Value> {
    simd_json::serde::from_slice::<Value>(body).ok()
}

/// One record from the aggregate or single-country endpoint.
pub fn parse_record(body: &mut [u8]) -> Result<RawRecord, FetchError> {
    let value = parse_value(body)
        .ok_or_else(|| FetchError::MalformedRecord("body is not valid JSON".to_string()))?;
    if !value.is_object() {
        return Err(FetchError::MalformedRecord(format!(
            "expected an object, found {}",
            describe(&value)
        )));
    }
    serde_json::from_value(value).map_err(|e| FetchError::MalformedRecord(e.to_string()))
}

/// The country list. A body that is not a list fails the whole catalog; a
/// list element that is not an object becomes an empty record, which the
/// normalizer then drops.
pub fn parse_catalog(body: &mut [u8]) -> Result<Vec<RawRecord>, FetchError> {
    let value = parse_value(body).ok_or_else(|| FetchError::MalformedCatalog {
        found: "invalid JSON".to_string(),
    })?;
    let items = match value {
        Value::Array(items) => items,
        other => {
            return Err(FetchError::MalformedCatalog {
                found: describe(&other).to_string(),
            })
        }
    };
    Ok(items
        .into_iter()
        .map(|item| serde_json::from_value(item).unwrap_or_default())
        .collect())
}

pub fn parse_history(body: &mut [u8]) -> Result<RawHistory, FetchError> {
    let value = parse_value(body)
        .ok_or_else(|| FetchError::MalformedRecord("body is not valid JSON".to_string()))?;
    if !value.is_object() {
        return Err(FetchError::MalformedRecord(format!(
            "expected a history object, found {}",
            describe(&value)
        )));
    }
    serde_json::from_value(value).map_err(|e| FetchError::MalformedRecord(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> DiseaseShClient {
        DiseaseShClient::new("https://disease.sh/v3/covid-19/", Duration::from_secs(1)).unwrap()
    }

    #[test]
    fn test_endpoint_urls() {
        let c = client();
        assert_eq!(c.worldwide_url(), "https://disease.sh/v3/covid-19/all");
        assert_eq!(c.countries_url(), "https://disease.sh/v3/covid-19/countries");
        assert_eq!(c.country_url("FR"), "https://disease.sh/v3/covid-19/countries/FR");
        assert_eq!(
            c.history_url(30),
            "https://disease.sh/v3/covid-19/historical/all?lastdays=30"
        );
    }

    #[test]
    fn test_parse_record() {
        let mut body = br#"{"country":"Chile","countryInfo":{"iso2":"CL","lat":-30,"long":-71},"cases":12}"#.to_vec();
        let record = parse_record(&mut body).unwrap();
        assert_eq!(record.country.as_deref(), Some("Chile"));
        assert_eq!(record.cases, Some(12.0));
    }

    #[test]
    fn test_parse_record_rejects_non_objects() {
        let mut list = b"[1,2]".to_vec();
        assert!(matches!(parse_record(&mut list), Err(FetchError::MalformedRecord(_))));

        let mut garbage = b"<html>".to_vec();
        assert!(matches!(parse_record(&mut garbage), Err(FetchError::MalformedRecord(_))));
    }

    #[test]
    fn test_catalog_must_be_a_list() {
        let mut body = br#"{"message":"rate limited"}"#.to_vec();
        match parse_catalog(&mut body) {
            Err(FetchError::MalformedCatalog { found }) => assert_eq!(found, "an object"),
            other => panic!("expected MalformedCatalog, got {other:?}"),
        }
    }

    #[test]
    fn test_catalog_keeps_bad_elements_as_empty_records() {
        let mut body = br#"[{"country":"Peru","countryInfo":{"iso2":"PE"}}, 42]"#.to_vec();
        let records = parse_catalog(&mut body).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].country.as_deref(), Some("Peru"));
        assert!(records[1].country.is_none());
    }

    #[test]
    fn test_parse_history() {
        let mut body = br#"{"cases":{"1/1/21":5},"deaths":{},"recovered":{}}"#.to_vec();
        let history = parse_history(&mut body).unwrap();
        assert_eq!(history.cases.len(), 1);

        let mut wrong = br#""country not found""#.to_vec();
        assert!(parse_history(&mut wrong).is_err());
    }

    #[test]
    fn test_parse_history_with_null_series() {
        let mut body = br#"{"cases":{"1/1/21":5,"1/2/21":8},"deaths":{"1/1/21":1},"recovered":null}"#.to_vec();
        let history = parse_history(&mut body).unwrap();
        assert_eq!(history.cases.len(), 2);
        assert_eq!(history.deaths.len(), 1);
        assert!(history.recovered.is_empty());
    }
}
