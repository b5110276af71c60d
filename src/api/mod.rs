//! Remote statistics source.

mod client;

pub use client::{parse_catalog, parse_history, parse_record, DiseaseShClient};

use async_trait::async_trait;

use crate::error::FetchError;
use crate::stats::{RawHistory, RawRecord};

/// Everything the controller needs from the remote service. Responses are
/// returned raw; normalization happens on the caller's side.
#[async_trait]
pub trait StatsSource: Send + Sync + 'static {
    /// Worldwide aggregate record.
    async fn worldwide(&self) -> Result<RawRecord, FetchError>;

    /// Every country record, in server order.
    async fn countries(&self) -> Result<Vec<RawRecord>, FetchError>;

    /// One country by ISO-2 code.
    async fn country(&self, code: &str) -> Result<RawRecord, FetchError>;

    /// Worldwide cumulative series for the last `days` days.
    async fn history(&self, days: u32) -> Result<RawHistory, FetchError>;
}
