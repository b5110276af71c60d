//! Region selection and the application state it owns.
//!
//! The controller is the only writer of [`ApplicationState`]. Fetches run as
//! tokio tasks and report back over a channel; outcomes are applied on the
//! caller's thread through [`Controller::drain`] or
//! [`Controller::next_outcome`]. Every selection bumps a generation counter;
//! region fetches carry the generation they were issued under and are dropped
//! on arrival if a newer selection exists, even one for the same region.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use crate::api::StatsSource;
use crate::config::Config;
use crate::error::FetchError;
use crate::stats::{
    normalize, normalize_batch, normalize_worldwide, project, sort_by_severity, CaseType, History,
    LatLng, Marker, NormalizedBatch, RegionId, RegionStats,
};

pub const DEFAULT_CENTER: LatLng = LatLng {
    lat: 34.80746,
    lng: -40.4796,
};
pub const DEFAULT_ZOOM: u8 = 3;
pub const FOCUSED_ZOOM: u8 = 4;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MapViewport {
    pub center: LatLng,
    pub zoom: u8,
}

impl Default for MapViewport {
    fn default() -> Self {
        Self {
            center: DEFAULT_CENTER,
            zoom: DEFAULT_ZOOM,
        }
    }
}

impl MapViewport {
    /// Viewport after a region fetch: centered on the region, or the world
    /// view for records without a position.
    pub fn for_stats(stats: &RegionStats) -> Self {
        match stats.position {
            Some(center) => Self {
                center,
                zoom: FOCUSED_ZOOM,
            },
            None => Self::default(),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FetchStatus {
    #[default]
    Idle,
    FetchingWorldwide,
    FetchingRegion,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CatalogEntry {
    pub region_id: RegionId,
    pub display_name: String,
}

#[derive(Clone, Debug, Default)]
pub struct ApplicationState {
    pub selected_region: RegionId,
    pub selected_case_type: CaseType,
    pub active_stats: Option<RegionStats>,
    /// API order.
    pub catalog: Vec<CatalogEntry>,
    pub all_stats: HashMap<RegionId, RegionStats>,
    /// Table order: most cases first.
    pub severity_order: Vec<RegionId>,
    pub markers: Vec<Marker>,
    pub map_viewport: MapViewport,
    pub viewport_revision: u64,
    pub history: Option<History>,
    pub status: FetchStatus,
    pub last_error: Option<String>,
}

impl ApplicationState {
    /// Rows in severity order.
    pub fn ranked(&self) -> impl Iterator<Item = &RegionStats> {
        self.severity_order
            .iter()
            .filter_map(|id| self.all_stats.get(id))
    }

    pub fn display_name(&self, region_id: &RegionId) -> Option<&str> {
        match region_id {
            RegionId::Worldwide => Some("Worldwide"),
            id => self.all_stats.get(id).map(|s| s.display_name.as_str()),
        }
    }
}

/// A completed fetch, sent from its task back to the controller.
#[derive(Debug)]
pub enum FetchOutcome {
    /// Startup aggregate.
    Worldwide(Result<RegionStats, FetchError>),
    /// Startup country list, already normalized.
    Catalog(Result<NormalizedBatch, FetchError>),
    History(Result<History, FetchError>),
    /// Selection fetch, tagged with the selection it was issued for.
    Region {
        region_id: RegionId,
        generation: u64,
        result: Result<RegionStats, FetchError>,
    },
}

/// Where failed fetches go besides `last_error`.
pub trait ErrorReporter: Send + Sync {
    fn report(&self, context: &str, error: &FetchError);
}

#[derive(Clone, Copy, Debug, Default)]
pub struct TracingReporter;

impl ErrorReporter for TracingReporter {
    fn report(&self, context: &str, error: &FetchError) {
        tracing::warn!(%context, %error, "fetch failed");
    }
}

/// Bounded exponential backoff for transport failures.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            base_delay: Duration::from_millis(250),
        }
    }
}

impl RetryPolicy {
    /// Delay before retry number `retry` (0-based): base, 2x base, 4x base...
    pub fn delay_for(&self, retry: u32) -> Duration {
        self.base_delay.saturating_mul(1u32 << retry.min(16))
    }

    pub async fn run<T, F, Fut>(&self, what: &str, mut op: F) -> Result<T, FetchError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, FetchError>>,
    {
        let mut retry = 0;
        loop {
            match op().await {
                Err(e) if e.is_retryable() && retry + 1 < self.attempts => {
                    let delay = self.delay_for(retry);
                    tracing::info!(%what, attempt = retry + 2, ?delay, error = %e, "retrying");
                    tokio::time::sleep(delay).await;
                    retry += 1;
                }
                other => return other,
            }
        }
    }
}

pub struct Controller<S> {
    source: Arc<S>,
    state: ApplicationState,
    retry: RetryPolicy,
    history_days: u32,
    reporter: Arc<dyn ErrorReporter>,
    tx: mpsc::UnboundedSender<FetchOutcome>,
    rx: mpsc::UnboundedReceiver<FetchOutcome>,
    startup_pending: usize,
    awaiting_region: bool,
    generation: u64,
}

impl<S: StatsSource> Controller<S> {
    pub fn new(source: Arc<S>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            source,
            state: ApplicationState::default(),
            retry: RetryPolicy::default(),
            history_days: 120,
            reporter: Arc::new(TracingReporter),
            tx,
            rx,
            startup_pending: 0,
            awaiting_region: false,
            generation: 0,
        }
    }

    pub fn from_config(source: Arc<S>, config: &Config) -> Self {
        Self::new(source)
            .with_retry(RetryPolicy {
                attempts: config.retries,
                ..RetryPolicy::default()
            })
            .with_history_days(config.history_days)
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_history_days(mut self, days: u32) -> Self {
        self.history_days = days;
        self
    }

    pub fn with_reporter(mut self, reporter: Arc<dyn ErrorReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    pub fn state(&self) -> &ApplicationState {
        &self.state
    }

    fn refresh_status(&mut self) {
        self.state.status = if self.awaiting_region {
            FetchStatus::FetchingRegion
        } else if self.startup_pending > 0 {
            FetchStatus::FetchingWorldwide
        } else {
            FetchStatus::Idle
        };
    }

    fn spawn<F>(&self, fut: F)
    where
        F: Future<Output = FetchOutcome> + Send + 'static,
    {
        let tx = self.tx.clone();
        tokio::spawn(async move {
            // The receiver lives as long as the controller; a send error
            // only happens during shutdown.
            if tx.send(fut.await).is_err() {
                tracing::debug!("controller gone, dropping fetch outcome");
            }
        });
    }

    /// Startup: worldwide aggregate, country list and history, concurrently.
    pub fn mount(&mut self) {
        tracing::info!("loading worldwide baseline and country list");
        self.startup_pending = 2;
        self.refresh_status();

        let source = Arc::clone(&self.source);
        self.spawn(async move {
            FetchOutcome::Worldwide(
                source
                    .worldwide()
                    .await
                    .and_then(|raw| normalize_worldwide(&raw).map_err(FetchError::from)),
            )
        });

        let source = Arc::clone(&self.source);
        self.spawn(async move {
            FetchOutcome::Catalog(source.countries().await.map(|raw| normalize_batch(&raw)))
        });

        let source = Arc::clone(&self.source);
        let days = self.history_days;
        self.spawn(async move {
            FetchOutcome::History(source.history(days).await.map(|raw| History::from_raw(&raw)))
        });
    }

    /// Select a region. The selection changes immediately; its stats follow
    /// when the fetch lands, unless another selection comes first.
    pub fn select_region(&mut self, region_id: RegionId) {
        tracing::info!(region = %region_id, "region selected");
        self.state.selected_region = region_id.clone();
        self.generation += 1;
        self.awaiting_region = true;
        self.refresh_status();

        let source = Arc::clone(&self.source);
        let retry = self.retry;
        let generation = self.generation;
        self.spawn(async move {
            let what = region_id.to_string();
            let result = match &region_id {
                RegionId::Worldwide => retry
                    .run(&what, || source.worldwide())
                    .await
                    .and_then(|raw| normalize_worldwide(&raw).map_err(FetchError::from)),
                RegionId::Country(code) => retry
                    .run(&what, || source.country(code))
                    .await
                    .and_then(|raw| normalize(&raw).map_err(FetchError::from)),
            };
            FetchOutcome::Region {
                region_id,
                generation,
                result,
            }
        });
    }

    pub fn select_case_type(&mut self, case_type: CaseType) {
        if self.state.selected_case_type == case_type {
            return;
        }
        self.state.selected_case_type = case_type;
        self.reproject();
    }

    fn reproject(&mut self) {
        self.state.markers = project(self.state.ranked(), self.state.selected_case_type);
    }

    fn fail(&mut self, context: &str, error: FetchError) {
        self.reporter.report(context, &error);
        self.state.last_error = Some(error.user_friendly_message());
    }

    /// Apply one outcome. Returns false when it was discarded as superseded.
    pub fn apply(&mut self, outcome: FetchOutcome) -> bool {
        match outcome {
            FetchOutcome::Worldwide(result) => {
                self.startup_pending = self.startup_pending.saturating_sub(1);
                match result {
                    Ok(stats) if self.state.selected_region.is_worldwide() => {
                        self.state.active_stats = Some(stats);
                    }
                    Ok(_) => {
                        tracing::debug!("worldwide baseline arrived after a country was selected");
                    }
                    Err(e) => self.fail("worldwide", e),
                }
            }
            FetchOutcome::Catalog(result) => {
                self.startup_pending = self.startup_pending.saturating_sub(1);
                match result {
                    Ok(batch) => self.load_catalog(batch),
                    Err(e) => self.fail("countries", e),
                }
            }
            FetchOutcome::History(result) => match result {
                Ok(history) => self.state.history = Some(history),
                Err(e) => self.fail("history", e),
            },
            FetchOutcome::Region {
                region_id,
                generation,
                result,
            } => {
                if generation != self.generation {
                    tracing::debug!(
                        region = %region_id,
                        generation,
                        current = self.generation,
                        "discarding superseded fetch"
                    );
                    return false;
                }
                self.awaiting_region = false;
                match result {
                    Ok(stats) => {
                        self.state.map_viewport = MapViewport::for_stats(&stats);
                        self.state.viewport_revision += 1;
                        self.state.active_stats = Some(stats);
                        self.state.last_error = None;
                    }
                    Err(e) => self.fail(&region_id.to_string(), e),
                }
            }
        }
        self.refresh_status();
        true
    }

    fn load_catalog(&mut self, batch: NormalizedBatch) {
        tracing::info!(
            countries = batch.records.len(),
            dropped = batch.dropped,
            "country list loaded"
        );
        self.state.catalog = batch
            .records
            .iter()
            .map(|s| CatalogEntry {
                region_id: s.region_id.clone(),
                display_name: s.display_name.clone(),
            })
            .collect();

        let sorted = sort_by_severity(batch.records);
        self.state.severity_order = sorted.iter().map(|s| s.region_id.clone()).collect();
        self.state.all_stats = sorted
            .into_iter()
            .map(|s| (s.region_id.clone(), s))
            .collect();
        self.reproject();
    }

    /// Apply every outcome that has already arrived. Never blocks.
    pub fn drain(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(outcome) = self.rx.try_recv() {
            if self.apply(outcome) {
                applied += 1;
            }
        }
        applied
    }

    /// Wait for the next outcome and apply it. Returns whether it was applied.
    pub async fn next_outcome(&mut self) -> bool {
        match self.rx.recv().await {
            Some(outcome) => self.apply(outcome),
            None => false,
        }
    }
}
