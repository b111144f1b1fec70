//! # metric-tag-select
//!
//! Incrementally loaded `key:"value"` options for a metric's tags.
//! Tag pages are fetched from a lookup service as the user scrolls,
//! flattened into a deduplicated option list, and handed to a generic
//! searchable select widget.

pub mod aggregator;
pub mod client;
pub mod config;
pub mod error;
pub mod fetcher;
pub mod logging;
pub mod metric;
pub mod pagination;

use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use aggregator::{aggregate_loaded, SelectOption};
use config::{TagSelectConfig, WidgetOptions};
use error::TagSelectError;
use fetcher::{LoadedPage, TagPage, TagPageFetcher, TagQuery};
use metric::{normalize_metric_name, MetricDescriptor};
use pagination::PaginationState;

/// Caller-owned selection handler
pub type ChangeHandler = Box<dyn FnMut(&str) + Send>;

/// Everything the selection widget needs to render
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectProps {
    pub value: String,
    pub options: Vec<SelectOption>,
    pub is_loading: bool,
    #[serde(flatten)]
    pub widget: WidgetOptions,
}

/// Tag option provider for a single metric.
///
/// State lives only as long as the user is looking at one metric. Switching
/// metrics goes through [`MetricTagSelect::rekey`], which starts over with a
/// fresh cursor and an empty page store.
pub struct MetricTagSelect {
    config: TagSelectConfig,
    metric_name: String,
    metric_attribute: String,
    descriptor: MetricDescriptor,
    value: String,
    on_change: ChangeHandler,
    pagination: PaginationState,
    loaded: BTreeMap<u32, LoadedPage>,
    in_flight: HashSet<TagQuery>,
    options: Vec<SelectOption>,
}

impl MetricTagSelect {
    /// Create a provider for `metric_name` (legacy `"<name> - <DataType>"` form).
    ///
    /// `metric_attribute` is carried but does not narrow the options.
    pub fn new(
        metric_name: impl Into<String>,
        metric_attribute: impl Into<String>,
        value: impl Into<String>,
        on_change: impl FnMut(&str) + Send + 'static,
        config: TagSelectConfig,
    ) -> Self {
        Self::with_handler(
            metric_name.into(),
            metric_attribute.into(),
            value.into(),
            Box::new(on_change),
            config,
        )
    }

    fn with_handler(
        metric_name: String,
        metric_attribute: String,
        value: String,
        on_change: ChangeHandler,
        config: TagSelectConfig,
    ) -> Self {
        let descriptor = normalize_metric_name(&metric_name);
        tracing::debug!(
            metric = %metric_name,
            name = %descriptor.name,
            data_type = ?descriptor.data_type,
            "tag select created"
        );
        Self {
            pagination: PaginationState::new(config.page_size),
            config,
            metric_name,
            metric_attribute,
            descriptor,
            value,
            on_change,
            loaded: BTreeMap::new(),
            in_flight: HashSet::new(),
            options: Vec::new(),
        }
    }

    /// Keep this provider if `metric_name` is unchanged, otherwise replace it
    /// with a fresh one for the new metric.
    pub fn rekey(self, metric_name: &str) -> Self {
        if self.metric_name == metric_name {
            return self;
        }
        tracing::debug!(from = %self.metric_name, to = metric_name, "metric changed, resetting");
        Self::with_handler(
            metric_name.to_string(),
            self.metric_attribute,
            self.value,
            self.on_change,
            self.config,
        )
    }

    pub fn metric_name(&self) -> &str {
        &self.metric_name
    }

    pub fn metric_attribute(&self) -> &str {
        &self.metric_attribute
    }

    pub fn descriptor(&self) -> &MetricDescriptor {
        &self.descriptor
    }

    pub fn pagination(&self) -> &PaginationState {
        &self.pagination
    }

    /// Number of distinct pages holding data
    pub fn pages_loaded(&self) -> usize {
        self.loaded.len()
    }

    /// Query for the page the cursor currently points at
    pub fn current_query(&self) -> TagQuery {
        TagQuery {
            descriptors: vec![self.descriptor.clone()],
            page: self.pagination.page(),
            limit: self.pagination.limit(),
        }
    }

    /// Claim the current query for fetching.
    ///
    /// Returns `None` if it is already in flight or loaded and still fresh.
    pub fn begin_fetch(&mut self) -> Option<TagQuery> {
        self.begin_fetch_at(Utc::now())
    }

    pub fn begin_fetch_at(&mut self, now: DateTime<Utc>) -> Option<TagQuery> {
        let query = self.current_query();
        if self.in_flight.contains(&query) {
            tracing::debug!(page = query.page, "tag page already in flight");
            return None;
        }
        if let Some(loaded) = self.loaded.get(&query.page) {
            if !loaded.is_stale(now, self.stale_after()) {
                return None;
            }
            tracing::debug!(page = query.page, "revalidating stale tag page");
        }
        self.in_flight.insert(query.clone());
        Some(query)
    }

    /// Record the outcome of a query claimed by [`begin_fetch`](Self::begin_fetch).
    ///
    /// Results for another metric are dropped. Failures keep whatever was
    /// already loaded.
    pub fn complete_fetch(&mut self, query: TagQuery, result: Result<Vec<TagPage>, TagSelectError>) {
        self.complete_fetch_at(query, result, Utc::now())
    }

    pub fn complete_fetch_at(
        &mut self,
        query: TagQuery,
        result: Result<Vec<TagPage>, TagSelectError>,
        now: DateTime<Utc>,
    ) {
        self.in_flight.remove(&query);
        if query.descriptors.as_slice() != std::slice::from_ref(&self.descriptor)
            || query.limit != self.pagination.limit()
        {
            tracing::debug!(
                metric = %self.metric_name,
                page = query.page,
                "discarding tag page for superseded query"
            );
            return;
        }
        match result {
            Ok(pages) => {
                self.loaded.insert(query.page, LoadedPage::new(pages, now));
                self.rederive();
            }
            Err(e) => {
                tracing::warn!(
                    metric = %self.metric_name,
                    page = query.page,
                    error = %e,
                    "tag fetch failed, keeping loaded options"
                );
            }
        }
    }

    /// Release a claimed query without recording a result.
    ///
    /// Loaded data is untouched; the next `begin_fetch` may claim it again.
    pub fn abandon_fetch(&mut self, query: &TagQuery) {
        if self.in_flight.remove(query) {
            tracing::debug!(page = query.page, "tag fetch abandoned");
        }
    }

    /// Fetch the current page if needed and apply the result.
    ///
    /// Cancel-safe: dropping the future before it resolves releases the claim.
    pub async fn refresh<F>(&mut self, fetcher: &F)
    where
        F: TagPageFetcher + ?Sized,
    {
        let Some(query) = self.begin_fetch() else {
            return;
        };
        let claim = FetchClaim {
            select: self,
            query,
            settled: false,
        };
        let result = fetcher.fetch_tag_pages(&claim.query).await;
        claim.settle(result);
    }

    pub fn is_loading(&self) -> bool {
        !self.in_flight.is_empty()
    }

    /// Options derived from every page loaded so far, in page order
    pub fn options(&self) -> &[SelectOption] {
        &self.options
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    /// Update the selected value supplied by the caller
    pub fn set_value(&mut self, value: impl Into<String>) {
        self.value = value.into();
    }

    /// Forward a user selection to the caller's handler
    pub fn select(&mut self, new_value: &str) {
        (self.on_change)(new_value);
    }

    /// Load-more signal from the widget
    pub fn on_menu_scroll_to_bottom(&mut self) {
        if self.pagination.has_more() {
            self.pagination.advance();
        }
    }

    pub fn props(&self) -> SelectProps {
        SelectProps {
            value: self.value.clone(),
            options: self.options.clone(),
            is_loading: self.is_loading(),
            widget: self.config.widget.clone(),
        }
    }

    fn stale_after(&self) -> Duration {
        Duration::seconds(self.config.stale_after_secs.min(u32::MAX as u64) as i64)
    }

    fn rederive(&mut self) {
        self.options = aggregate_loaded(
            self.loaded.values().map(|l| l.pages.as_slice()),
            &self.metric_name,
        );
        tracing::debug!(
            metric = %self.metric_name,
            pages = self.loaded.len(),
            options = self.options.len(),
            "tag options recomputed"
        );
    }
}

/// Claim on an in-flight query, released on drop unless settled
struct FetchClaim<'a> {
    select: &'a mut MetricTagSelect,
    query: TagQuery,
    settled: bool,
}

impl FetchClaim<'_> {
    fn settle(mut self, result: Result<Vec<TagPage>, TagSelectError>) {
        self.settled = true;
        self.select.complete_fetch(self.query.clone(), result);
    }
}

impl Drop for FetchClaim<'_> {
    fn drop(&mut self) {
        if !self.settled {
            self.select.abandon_fetch(&self.query);
        }
    }
}
