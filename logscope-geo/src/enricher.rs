use crate::cache::GeoCache;
use crate::lookup::{CountryLookup, GeoError};
use indicatif::{ProgressBar, ProgressStyle};
use logscope_core::frame::{Column, Frame, Value};
use logscope_core::LogscopeError;
use std::time::Duration;
use tracing::{info, warn};

/// Answer for an address the service knows nothing about.
pub const UNKNOWN_COUNTRY: &str = "Unknown";
/// Answer (and cached value) for a failed lookup.
pub const LOOKUP_ERROR: &str = "Error";

/// Adds an ISO country code column to a frame.
///
/// Every address is resolved at most once: answers, including failures, are
/// kept in the [`GeoCache`]. A successful network lookup is followed by a
/// short pause so large logs do not hammer the API.
pub struct GeoEnricher<L> {
    lookup: L,
    cache: GeoCache,
    delay: Duration,
    show_progress: bool,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct EnrichStats {
    pub rows: usize,
    pub cache_hits: usize,
    pub lookups: usize,
    pub failures: usize,
}

impl<L: CountryLookup> GeoEnricher<L> {
    pub fn new(lookup: L, cache: GeoCache) -> Self {
        Self {
            lookup,
            cache,
            delay: Duration::ZERO,
            show_progress: false,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    pub fn cache(&self) -> &GeoCache {
        &self.cache
    }

    pub fn into_cache(self) -> GeoCache {
        self.cache
    }

    /// Country code for `ip`, from cache when possible.
    pub async fn country_for(&mut self, ip: &str) -> String {
        self.resolve(ip, &mut EnrichStats::default()).await
    }

    async fn resolve(&mut self, ip: &str, stats: &mut EnrichStats) -> String {
        if let Some(hit) = self.cache.get(ip) {
            stats.cache_hits += 1;
            return hit.to_string();
        }

        stats.lookups += 1;
        match self.lookup.lookup(ip).await {
            Ok(country) => {
                self.cache.insert(ip, country.as_str());
                if !self.delay.is_zero() {
                    tokio::time::sleep(self.delay).await;
                }
                country
            }
            Err(GeoError::Offline) => UNKNOWN_COUNTRY.to_string(),
            Err(e) => {
                stats.failures += 1;
                warn!(ip = ip, error = %e, lookup = self.lookup.name(), "Country lookup failed");
                self.cache.insert(ip, LOOKUP_ERROR);
                LOOKUP_ERROR.to_string()
            }
        }
    }

    /// Append `new_col` holding the country of each address in `ip_col`, then
    /// persist the cache. Missing addresses yield missing country codes.
    pub async fn add_country_code(
        &mut self,
        frame: &mut Frame,
        ip_col: &str,
        new_col: &str,
    ) -> Result<EnrichStats, LogscopeError> {
        let ips: Vec<Value> = frame.column(ip_col)?.values.clone();
        if frame.has_column(new_col) {
            return Err(LogscopeError::ColumnExists(new_col.to_string()));
        }
        info!(
            column = new_col,
            from = ip_col,
            lookup = self.lookup.name(),
            "Adding country code column"
        );

        let progress = self.progress_bar(ips.len() as u64);
        let mut stats = EnrichStats {
            rows: ips.len(),
            ..EnrichStats::default()
        };
        let mut countries = Vec::with_capacity(ips.len());
        for value in &ips {
            let country = match value {
                Value::Text(ip) => Value::Text(self.resolve(ip, &mut stats).await),
                v if v.is_missing() => Value::Null,
                other => {
                    return Err(LogscopeError::InvalidColumnType {
                        column: ip_col.to_string(),
                        dtype: other.dtype().map(|d| d.to_string()).unwrap_or_default(),
                        operation: "country lookup",
                    });
                }
            };
            countries.push(country);
            progress.inc(1);
        }
        progress.finish_and_clear();

        frame.push_column(Column::new(new_col, countries))?;

        if let Err(e) = self.cache.save() {
            warn!(error = %e, "Failed to save geo cache");
        }
        info!(
            rows = stats.rows,
            cache_hits = stats.cache_hits,
            lookups = stats.lookups,
            failures = stats.failures,
            "Country codes added"
        );
        Ok(stats)
    }

    fn progress_bar(&self, len: u64) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }
        let pb = ProgressBar::new(len);
        if let Ok(style) =
            ProgressStyle::with_template("{spinner:.blue} geolocating IPs [{bar:30.cyan/blue}] {pos}/{len}")
        {
            pb.set_style(style.progress_chars("=> "));
        }
        pb
    }
}
