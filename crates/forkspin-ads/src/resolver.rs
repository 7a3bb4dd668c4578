//! Campaign eligibility and winner selection.

use std::sync::Arc;

use chrono::NaiveDate;
use forkspin_store::{Condition, Select, Store};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::campaign::Campaign;
use crate::error::AdsError;
use crate::ids::{CampaignId, RestaurantId};
use crate::placement::Placement;

/// Campaign table.
pub const ADVERTISEMENTS: &str = "advertisements";

const CATALOG_COLUMNS: [&str; 9] = [
    "id",
    "restaurant_id",
    "placement",
    "start_date",
    "end_date",
    "is_active",
    "max_views",
    "views_count",
    "clicks_count",
];

/// The campaign chosen for a slot, ready to render as a featured card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SponsoredSlot {
    pub campaign_id: CampaignId,
    pub restaurant_id: RestaurantId,
    pub placement: Placement,
}

impl From<&Campaign> for SponsoredSlot {
    fn from(c: &Campaign) -> Self {
        Self {
            campaign_id: c.id.clone(),
            restaurant_id: c.restaurant_id.clone(),
            placement: c.placement.clone(),
        }
    }
}

/// Winners for both ad slots of one request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    /// The pinned card at the top of the list.
    pub pinned: Option<SponsoredSlot>,
    /// The weekly "most popular" slot.
    pub weekly: Option<SponsoredSlot>,
}

/// Campaigns from `catalog` that may be shown for `category` on `today`.
pub fn eligible<'a>(catalog: &'a [Campaign], category: &str, today: NaiveDate) -> Vec<&'a Campaign> {
    catalog
        .iter()
        .filter(|c| c.is_eligible(category, today))
        .collect()
}

/// Pick the pinned-card winner among already-eligible campaigns.
///
/// A campaign targeting `category` itself wins outright. Otherwise one of the
/// general pinned campaigns is drawn uniformly. No candidates means no card.
pub fn pick_pinned<'a, R>(eligible: &[&'a Campaign], category: &str, rng: &mut R) -> Option<&'a Campaign>
where
    R: Rng + ?Sized,
{
    let targeted: Vec<&'a Campaign> = eligible
        .iter()
        .copied()
        .filter(|c| c.placement.targets(category))
        .collect();
    if let Some(winner) = targeted.choose(rng) {
        return Some(*winner);
    }

    let general: Vec<&'a Campaign> = eligible
        .iter()
        .copied()
        .filter(|c| c.placement == Placement::All)
        .collect();
    general.choose(rng).copied()
}

/// Pick the weekly-slot winner among already-eligible campaigns.
pub fn pick_weekly<'a, R>(eligible: &[&'a Campaign], rng: &mut R) -> Option<&'a Campaign>
where
    R: Rng + ?Sized,
{
    let weekly: Vec<&'a Campaign> = eligible
        .iter()
        .copied()
        .filter(|c| c.placement == Placement::Weekly)
        .collect();
    weekly.choose(rng).copied()
}

/// Reads the campaign catalog and resolves slot winners.
#[derive(Clone)]
pub struct Resolver {
    store: Arc<dyn Store>,
}

impl Resolver {
    /// Create a resolver over `store`.
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Read the campaigns competing in the lanes of `category`.
    ///
    /// The store filters on lane, active flag and start date. Budget and end
    /// date are checked by [`eligible`]. Rows that fail to parse are skipped.
    pub async fn fetch_catalog(&self, category: &str, today: NaiveDate) -> Result<Vec<Campaign>, AdsError> {
        let lanes: Vec<String> = Placement::lanes_for(category)
            .iter()
            .map(Placement::key)
            .collect();

        let select = Select::new()
            .with(Condition::one_of("placement", lanes))
            .with(Condition::eq("is_active", true))
            .with(Condition::lte("start_date", today.to_string()))
            .columns(CATALOG_COLUMNS);

        let result = self.store.select(ADVERTISEMENTS, &select).await?;

        let mut catalog = Vec::with_capacity(result.len());
        for row in result.iter() {
            match row.deserialize::<Campaign>() {
                Ok(campaign) => catalog.push(campaign),
                Err(e) => warn!(error = %e, "skipping unreadable advertisement row"),
            }
        }
        Ok(catalog)
    }

    /// Resolve both slots from a single catalog read.
    ///
    /// A failed read resolves to no ads at all.
    pub async fn resolve<R>(&self, category: &str, today: NaiveDate, rng: &mut R) -> Resolution
    where
        R: Rng + ?Sized,
    {
        let catalog = match self.fetch_catalog(category, today).await {
            Ok(catalog) => catalog,
            Err(e) => {
                warn!(category, error = %e, "campaign catalog unavailable, omitting sponsored slots");
                return Resolution::default();
            }
        };

        let candidates = eligible(&catalog, category, today);
        let resolution = Resolution {
            pinned: pick_pinned(&candidates, category, rng).map(SponsoredSlot::from),
            weekly: pick_weekly(&candidates, rng).map(SponsoredSlot::from),
        };

        debug!(
            category,
            eligible = candidates.len(),
            pinned = ?resolution.pinned.as_ref().map(|s| s.campaign_id.as_str()),
            "resolved sponsored slots"
        );
        resolution
    }

    /// Resolve the pinned card only.
    pub async fn resolve_pinned<R>(&self, category: &str, today: NaiveDate, rng: &mut R) -> Option<SponsoredSlot>
    where
        R: Rng + ?Sized,
    {
        self.resolve(category, today, rng).await.pinned
    }

    /// Resolve the weekly slot only.
    pub async fn resolve_weekly<R>(&self, category: &str, today: NaiveDate, rng: &mut R) -> Option<SponsoredSlot>
    where
        R: Rng + ?Sized,
    {
        self.resolve(category, today, rng).await.weekly
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use forkspin_store::{MemoryStore, Row, Value};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashMap;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn today() -> NaiveDate {
        date("2025-01-01")
    }

    fn campaign(id: &str, placement: Placement) -> Campaign {
        Campaign::new(id, format!("r-{}", id), placement, date("2024-12-01"))
    }

    async fn store_with(campaigns: &[Campaign]) -> Arc<MemoryStore> {
        let store = Arc::new(MemoryStore::new());
        for c in campaigns {
            store
                .insert(ADVERTISEMENTS, Row::from_serialize(c).unwrap())
                .await
                .unwrap();
        }
        store
    }

    #[test]
    fn test_inactive_never_selected() {
        let catalog = vec![campaign("1", Placement::All).deactivated()];
        let mut rng = StdRng::seed_from_u64(1);
        let candidates = eligible(&catalog, "all", today());
        assert!(pick_pinned(&candidates, "all", &mut rng).is_none());
    }

    #[test]
    fn test_cuisine_beats_all() {
        let catalog = vec![
            campaign("general", Placement::All),
            campaign("sushi", Placement::cuisine("sushi")),
        ];
        let candidates = eligible(&catalog, "sushi", today());
        for seed in 0..50 {
            let mut rng = StdRng::seed_from_u64(seed);
            let winner = pick_pinned(&candidates, "sushi", &mut rng).unwrap();
            assert_eq!(winner.id.as_str(), "sushi");
        }
    }

    #[test]
    fn test_other_cuisine_not_pinned() {
        let catalog = vec![
            campaign("general", Placement::All),
            campaign("ramen", Placement::cuisine("ramen")),
        ];
        let candidates = eligible(&catalog, "sushi", today());
        let mut rng = StdRng::seed_from_u64(3);
        let winner = pick_pinned(&candidates, "sushi", &mut rng).unwrap();
        assert_eq!(winner.id.as_str(), "general");
    }

    #[test]
    fn test_general_tie_break_is_spread() {
        let catalog = vec![
            campaign("a", Placement::All),
            campaign("b", Placement::All),
            campaign("c", Placement::All),
        ];
        let candidates = eligible(&catalog, "all", today());
        let mut rng = StdRng::seed_from_u64(7);

        let mut wins: HashMap<String, usize> = HashMap::new();
        for _ in 0..3000 {
            let winner = pick_pinned(&candidates, "all", &mut rng).unwrap();
            *wins.entry(winner.id.to_string()).or_default() += 1;
        }

        assert_eq!(wins.len(), 3);
        for count in wins.values() {
            assert!((800..=1200).contains(count), "unbalanced: {:?}", wins);
        }
    }

    #[test]
    fn test_weekly_never_takes_pinned_slot() {
        let catalog = vec![campaign("w", Placement::Weekly)];
        let candidates = eligible(&catalog, "all", today());
        let mut rng = StdRng::seed_from_u64(1);
        assert!(pick_pinned(&candidates, "all", &mut rng).is_none());
        assert_eq!(pick_weekly(&candidates, &mut rng).unwrap().id.as_str(), "w");
    }

    #[test]
    fn test_no_eligible_means_no_slot() {
        let catalog: Vec<Campaign> = Vec::new();
        let mut rng = StdRng::seed_from_u64(1);
        assert!(pick_pinned(&eligible(&catalog, "all", today()), "all", &mut rng).is_none());
    }

    #[tokio::test]
    async fn test_fetch_filters_lanes_and_dates() {
        let store = store_with(&[
            campaign("all", Placement::All),
            campaign("sushi", Placement::cuisine("sushi")),
            campaign("ramen", Placement::cuisine("ramen")),
            Campaign::new("future", "r-f", Placement::All, date("2025-06-01")),
            campaign("off", Placement::All).deactivated(),
        ])
        .await;

        let resolver = Resolver::new(store);
        let catalog = resolver.fetch_catalog("sushi", today()).await.unwrap();
        let mut ids: Vec<&str> = catalog.iter().map(|c| c.id.as_str()).collect();
        ids.sort();
        assert_eq!(ids, vec!["all", "sushi"]);
    }

    #[tokio::test]
    async fn test_exhausted_and_expired_filtered_client_side() {
        let store = store_with(&[
            campaign("spent", Placement::All).with_budget(10).with_views(10),
            campaign("ended", Placement::All).ends_on(date("2024-12-31")),
            campaign("live", Placement::All).with_budget(10).with_views(9),
        ])
        .await;

        let resolver = Resolver::new(store);
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..20 {
            let slot = resolver.resolve_pinned("all", today(), &mut rng).await.unwrap();
            assert_eq!(slot.campaign_id.as_str(), "live");
        }
    }

    #[tokio::test]
    async fn test_read_failure_omits_slot() {
        let store = store_with(&[campaign("all", Placement::All)]).await;
        store.set_fail_reads(true);

        let resolver = Resolver::new(store);
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(resolver.resolve("all", today(), &mut rng).await, Resolution::default());
    }

    #[tokio::test]
    async fn test_bad_row_skipped() {
        let store = store_with(&[campaign("good", Placement::All)]).await;
        store
            .insert(
                ADVERTISEMENTS,
                Row::from_pairs([
                    // No restaurant_id: passes the store filter, fails to parse
                    ("id", Value::from("bad")),
                    ("placement", Value::from("pinned_ad_all")),
                    ("start_date", Value::from("2024-12-01")),
                    ("is_active", Value::Bool(true)),
                ]),
            )
            .await
            .unwrap();

        let resolver = Resolver::new(store);
        let catalog = resolver.fetch_catalog("all", today()).await.unwrap();
        assert_eq!(catalog.len(), 1);
    }
}
