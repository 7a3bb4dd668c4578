//! Background coordinate fill-in for the nearby ordering.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use forkspin_cache::{Coordinates, GeocodeCache, Lookup};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::config::AdsConfig;
use crate::error::AdsError;
use crate::listing::DisplayItem;

/// Resolves a free-form place query to a position.
#[async_trait]
pub trait Geocoder: Send + Sync {
    /// `Ok(None)` means the service answered without a match.
    async fn geocode(&self, query: &str) -> Result<Option<Coordinates>, AdsError>;
}

/// Outcome counts for one fill-in run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FillReport {
    pub found: usize,
    pub not_found: usize,
    /// Lookups that errored. Also cached as not found.
    pub failed: usize,
}

impl FillReport {
    pub fn looked_up(&self) -> usize {
        self.found + self.not_found + self.failed
    }
}

/// Looks up coordinates for items that lack them, one request at a time.
///
/// Every outcome lands in the [`GeocodeCache`], misses included, so a name
/// is asked for at most once per page load.
pub struct GeocodeFiller {
    geocoder: Arc<dyn Geocoder>,
    cache: Arc<GeocodeCache>,
    interval: Duration,
    batch_size: usize,
}

impl GeocodeFiller {
    pub fn new(geocoder: Arc<dyn Geocoder>, cache: Arc<GeocodeCache>, config: &AdsConfig) -> Self {
        Self {
            geocoder,
            cache,
            interval: config.geocode_interval(),
            batch_size: config.geocode_batch_size.max(1),
        }
    }

    /// Override the spacing between requests.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Distinct queries among `items` that have no coordinates and were never
    /// looked up.
    pub fn pending(&self, items: &[DisplayItem]) -> Result<Vec<String>, AdsError> {
        let mut seen = HashSet::new();
        let mut queries = Vec::new();
        for item in items.iter().filter(|i| i.coordinates.is_none()) {
            let query = item.geocode_query();
            if seen.insert(query.trim().to_lowercase()) && self.cache.is_pending(query)? {
                queries.push(query.to_string());
            }
        }
        Ok(queries)
    }

    /// Look up every pending query, in batches, honouring the interval.
    pub async fn fill(&self, items: &[DisplayItem]) -> Result<FillReport, AdsError> {
        let queries = self.pending(items)?;
        let mut report = FillReport::default();

        for (batch_no, batch) in queries.chunks(self.batch_size).enumerate() {
            debug!(batch = batch_no, size = batch.len(), "geocoding batch");
            for query in batch {
                if report.looked_up() > 0 && !self.interval.is_zero() {
                    tokio::time::sleep(self.interval).await;
                }
                self.lookup(query, &mut report).await?;
            }
        }

        debug!(?report, "geocode fill-in finished");
        Ok(report)
    }

    /// Copy cached positions onto `items`. Returns how many were updated.
    pub fn apply(&self, items: &mut [DisplayItem]) -> Result<usize, AdsError> {
        let mut updated = 0;
        for item in items.iter_mut().filter(|i| i.coordinates.is_none()) {
            if let Some(Lookup::Found(coordinates)) = self.cache.get(item.geocode_query())? {
                item.coordinates = Some(coordinates);
                updated += 1;
            }
        }
        Ok(updated)
    }

    /// Run [`fill`](Self::fill) in the background.
    pub fn spawn_fill(self: Arc<Self>, items: Vec<DisplayItem>) -> JoinHandle<()> {
        tokio::spawn(async move {
            if let Err(e) = self.fill(&items).await {
                warn!(error = %e, "geocode fill-in aborted");
            }
        })
    }

    async fn lookup(&self, query: &str, report: &mut FillReport) -> Result<(), AdsError> {
        match self.geocoder.geocode(query).await {
            Ok(Some(coordinates)) => {
                self.cache.set_found(query, coordinates)?;
                report.found += 1;
            }
            Ok(None) => {
                self.cache.set_not_found(query)?;
                report.not_found += 1;
            }
            Err(e) => {
                warn!(query, error = %e, "geocoding failed");
                self.cache.set_not_found(query)?;
                report.failed += 1;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use tokio::time::Instant;

    struct FakeGeocoder {
        known: HashMap<String, Coordinates>,
        calls: AtomicUsize,
        asked: Mutex<Vec<(String, Instant)>>,
    }

    impl FakeGeocoder {
        fn new(known: &[(&str, Coordinates)]) -> Self {
            Self {
                known: known.iter().map(|(k, c)| (k.to_string(), *c)).collect(),
                calls: AtomicUsize::new(0),
                asked: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl Geocoder for FakeGeocoder {
        async fn geocode(&self, query: &str) -> Result<Option<Coordinates>, AdsError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.asked.lock().unwrap().push((query.to_string(), Instant::now()));
            if query == "timeout" {
                return Err(AdsError::Geocode {
                    query: query.to_string(),
                    reason: "timed out".to_string(),
                });
            }
            Ok(self.known.get(query).copied())
        }
    }

    fn filler(geocoder: Arc<FakeGeocoder>, cache: Arc<GeocodeCache>) -> GeocodeFiller {
        let config = AdsConfig {
            geocode_batch_size: 2,
            ..AdsConfig::default()
        };
        GeocodeFiller::new(geocoder, cache, &config).with_interval(Duration::ZERO)
    }

    fn item(id: &str, address: &str) -> DisplayItem {
        DisplayItem::new(id, id, Utc::now()).with_address(address)
    }

    #[tokio::test]
    async fn test_fill_records_hits_and_misses() {
        let home = Coordinates::new(40.0, -74.0);
        let geocoder = Arc::new(FakeGeocoder::new(&[("1 Main St", home)]));
        let cache = Arc::new(GeocodeCache::new());
        let filler = filler(geocoder.clone(), cache.clone());

        let mut items = vec![
            item("a", "1 Main St"),
            item("b", "Nowhere"),
            item("c", "timeout"),
            item("d", "1 main st"),
            item("e", "2 Oak Ave").with_coordinates(home),
        ];

        let report = filler.fill(&items).await.unwrap();
        assert_eq!(report, FillReport { found: 1, not_found: 1, failed: 1 });
        assert_eq!(geocoder.calls.load(Ordering::SeqCst), 3);
        assert_eq!(cache.get("timeout").unwrap(), Some(Lookup::NotFound));

        assert_eq!(filler.apply(&mut items).unwrap(), 2);
        assert_eq!(items[3].coordinates, Some(home));
        assert_eq!(items[1].coordinates, None);
    }

    #[tokio::test]
    async fn test_misses_not_retried_until_cleared() {
        let geocoder = Arc::new(FakeGeocoder::new(&[]));
        let cache = Arc::new(GeocodeCache::new());
        let filler = filler(geocoder.clone(), cache.clone());
        let items = vec![item("a", "Nowhere")];

        filler.fill(&items).await.unwrap();
        filler.fill(&items).await.unwrap();
        assert_eq!(geocoder.calls.load(Ordering::SeqCst), 1);

        // Fresh page load
        cache.clear_misses().unwrap();
        filler.fill(&items).await.unwrap();
        assert_eq!(geocoder.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_requests_are_spaced_by_interval() {
        let geocoder = Arc::new(FakeGeocoder::new(&[]));
        let cache = Arc::new(GeocodeCache::new());
        let filler = filler(geocoder.clone(), cache).with_interval(Duration::from_millis(1100));
        let items = vec![item("a", "First St"), item("b", "Second St"), item("c", "Third St")];

        let started = Instant::now();
        filler.fill(&items).await.unwrap();
        assert!(started.elapsed() >= Duration::from_millis(2200));

        let asked = geocoder.asked.lock().unwrap();
        let queries: Vec<&str> = asked.iter().map(|(q, _)| q.as_str()).collect();
        assert_eq!(queries, vec!["First St", "Second St", "Third St"]);
        for pair in asked.windows(2) {
            assert!(pair[1].1 - pair[0].1 >= Duration::from_millis(1100));
        }
    }

    #[tokio::test]
    async fn test_spawn_fill_runs_in_background() {
        let geocoder = Arc::new(FakeGeocoder::new(&[("x", Coordinates::new(1.0, 1.0))]));
        let cache = Arc::new(GeocodeCache::new());
        let filler = Arc::new(filler(geocoder, cache.clone()));

        filler.spawn_fill(vec![item("a", "x")]).await.unwrap();
        assert!(matches!(cache.get("x").unwrap(), Some(Lookup::Found(_))));
    }
}
