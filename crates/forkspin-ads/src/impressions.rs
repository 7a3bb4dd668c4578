//! Per-page-load impression guard.

use std::collections::{HashMap, HashSet};

use chrono::NaiveDate;
use rand::Rng;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::ids::{CampaignId, UserId};
use crate::ledger::{InteractionType, Ledger};
use crate::resolver::{Resolution, Resolver, SponsoredSlot};

/// Resolves sponsored slots for one page load and records their impressions.
///
/// A page re-renders many times; this type makes sure each category is
/// resolved once and each shown campaign costs one impression per load, not
/// one per render. Drop it and create a new one on a fresh page load.
pub struct PageImpressions {
    resolver: Resolver,
    ledger: Ledger,
    today: NaiveDate,
    user_id: Option<UserId>,
    include_weekly: bool,
    resolutions: HashMap<String, Resolution>,
    recorded: HashSet<CampaignId>,
    pending: Vec<JoinHandle<()>>,
}

impl PageImpressions {
    /// Start a page load as a guest.
    pub fn new(resolver: Resolver, ledger: Ledger, today: NaiveDate) -> Self {
        Self {
            resolver,
            ledger,
            today,
            user_id: None,
            include_weekly: true,
            resolutions: HashMap::new(),
            recorded: HashSet::new(),
            pending: Vec::new(),
        }
    }

    /// Attribute events to a signed-in user.
    pub fn with_user(mut self, user_id: Option<UserId>) -> Self {
        self.user_id = user_id;
        self
    }

    /// Whether the weekly slot is shown (and therefore counted).
    pub fn with_weekly(mut self, include_weekly: bool) -> Self {
        self.include_weekly = include_weekly;
        self
    }

    /// Slots for `category`, resolved on first request and reused after.
    ///
    /// Impressions for the winners are queued in the background the first
    /// time each campaign shows up during this load.
    pub async fn slots<R>(&mut self, category: &str, rng: &mut R) -> Resolution
    where
        R: Rng + ?Sized,
    {
        if let Some(resolution) = self.resolutions.get(category) {
            return resolution.clone();
        }

        let mut resolution = self.resolver.resolve(category, self.today, rng).await;
        if !self.include_weekly {
            resolution.weekly = None;
        }

        if let Some(slot) = &resolution.pinned {
            self.record_impression(slot);
        }
        if let Some(slot) = &resolution.weekly {
            self.record_impression(slot);
        }

        self.resolutions
            .insert(category.to_string(), resolution.clone());
        resolution
    }

    /// Queue one impression for `slot` unless already counted this load.
    ///
    /// Returns whether an impression was queued.
    pub fn record_impression(&mut self, slot: &SponsoredSlot) -> bool {
        if !self.recorded.insert(slot.campaign_id.clone()) {
            debug!(campaign_id = %slot.campaign_id, "impression already counted for this page load");
            return false;
        }
        let handle = self
            .ledger
            .spawn_impression(slot.campaign_id.clone(), self.user_id.clone());
        self.pending.push(handle);
        true
    }

    /// Queue a click on `slot`. Every click counts.
    pub fn record_click(&mut self, slot: &SponsoredSlot, interaction_type: InteractionType) {
        let handle = self.ledger.spawn_click(
            slot.campaign_id.clone(),
            slot.restaurant_id.clone(),
            interaction_type,
            self.user_id.clone(),
        );
        self.pending.push(handle);
    }

    /// Campaigns counted so far.
    pub fn counted(&self) -> usize {
        self.recorded.len()
    }

    /// Wait for every queued write to settle.
    pub async fn flush(&mut self) {
        for handle in self.pending.drain(..) {
            // Ledger tasks log their own failures
            let _ = handle.await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::campaign::Campaign;
    use crate::placement::Placement;
    use crate::resolver::ADVERTISEMENTS;
    use forkspin_store::{MemoryStore, Row, Store};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::sync::Arc;

    fn today() -> NaiveDate {
        "2025-01-01".parse().unwrap()
    }

    async fn page(campaigns: &[Campaign]) -> (Arc<MemoryStore>, PageImpressions) {
        let store = Arc::new(MemoryStore::new());
        for c in campaigns {
            store
                .insert(ADVERTISEMENTS, Row::from_serialize(c).unwrap())
                .await
                .unwrap();
        }
        let page = PageImpressions::new(
            Resolver::new(store.clone()),
            Ledger::new(store.clone()),
            today(),
        );
        (store, page)
    }

    fn views(store: &MemoryStore, id: &str) -> i64 {
        store
            .rows(ADVERTISEMENTS)
            .iter()
            .map(|r| r.deserialize::<Campaign>().unwrap())
            .find(|c| c.id.as_str() == id)
            .map(|c| c.views_count)
            .unwrap()
    }

    #[tokio::test]
    async fn test_rerender_counts_once() {
        let (store, mut page) = page(&[Campaign::new("a", "r-a", Placement::All, today())]).await;
        let mut rng = StdRng::seed_from_u64(5);

        for _ in 0..5 {
            let resolution = page.slots("all", &mut rng).await;
            assert_eq!(resolution.pinned.unwrap().campaign_id.as_str(), "a");
        }
        page.flush().await;

        assert_eq!(page.counted(), 1);
        assert_eq!(views(&store, "a"), 1);
    }

    #[tokio::test]
    async fn test_weekly_counted_when_shown() {
        let (store, mut page) = page(&[
            Campaign::new("a", "r-a", Placement::All, today()),
            Campaign::new("w", "r-w", Placement::Weekly, today()),
        ])
        .await;
        let mut rng = StdRng::seed_from_u64(5);

        page.slots("all", &mut rng).await;
        page.flush().await;
        assert_eq!(views(&store, "w"), 1);
    }

    #[tokio::test]
    async fn test_weekly_hidden_not_counted() {
        let (store, page) = page(&[Campaign::new("w", "r-w", Placement::Weekly, today())]).await;
        let mut page = page.with_weekly(false);
        let mut rng = StdRng::seed_from_u64(5);

        let resolution = page.slots("all", &mut rng).await;
        page.flush().await;
        assert!(resolution.weekly.is_none());
        assert_eq!(views(&store, "w"), 0);
    }

    #[tokio::test]
    async fn test_clicks_always_recorded() {
        let (store, mut page) = page(&[Campaign::new("a", "r-a", Placement::All, today())]).await;
        let mut rng = StdRng::seed_from_u64(5);

        let slot = page.slots("all", &mut rng).await.pinned.unwrap();
        page.record_click(&slot, InteractionType::Location);
        page.record_click(&slot, InteractionType::Delivery("ubereats".to_string()));
        page.flush().await;

        let campaign: Campaign = store.rows(ADVERTISEMENTS)[0].deserialize().unwrap();
        assert_eq!(campaign.clicks_count, 2);
        assert_eq!(campaign.views_count, 1);
    }
}
