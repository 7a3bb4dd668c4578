//! Campaign records and the eligibility predicate.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::ids::{CampaignId, RestaurantId};
use crate::placement::{Placement, ALL_CATEGORIES};

/// A time- and budget-limited promotional placement for one restaurant.
///
/// Field names match the `advertisements` table so rows deserialize directly.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Campaign {
    /// Unique campaign identifier.
    pub id: CampaignId,
    /// The restaurant being promoted.
    pub restaurant_id: RestaurantId,
    /// Lane the campaign competes in.
    pub placement: Placement,
    /// First day the campaign may run (inclusive).
    pub start_date: NaiveDate,
    /// Last day the campaign may run (inclusive). `None` = governed by budget only.
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    /// Once false the campaign is permanently excluded.
    #[serde(default = "default_active")]
    pub is_active: bool,
    /// Impression budget. `None` = unlimited.
    #[serde(default)]
    pub max_views: Option<i64>,
    /// Impressions consumed so far.
    #[serde(default)]
    pub views_count: i64,
    /// Clicks recorded so far.
    #[serde(default)]
    pub clicks_count: i64,
}

fn default_active() -> bool {
    true
}

impl Campaign {
    /// Create an active, open-ended, unlimited campaign.
    pub fn new(
        id: impl Into<CampaignId>,
        restaurant_id: impl Into<RestaurantId>,
        placement: Placement,
        start_date: NaiveDate,
    ) -> Self {
        Self {
            id: id.into(),
            restaurant_id: restaurant_id.into(),
            placement,
            start_date,
            end_date: None,
            is_active: true,
            max_views: None,
            views_count: 0,
            clicks_count: 0,
        }
    }

    /// Set an impression budget.
    pub fn with_budget(mut self, max_views: i64) -> Self {
        self.max_views = Some(max_views);
        self
    }

    /// Set the last day of the campaign.
    pub fn ends_on(mut self, end_date: NaiveDate) -> Self {
        self.end_date = Some(end_date);
        self
    }

    /// Set consumed impressions.
    pub fn with_views(mut self, views: i64) -> Self {
        self.views_count = views;
        self
    }

    /// Mark the campaign inactive.
    pub fn deactivated(mut self) -> Self {
        self.is_active = false;
        self
    }

    /// Check if the campaign may be shown for `category` on `today`.
    pub fn is_eligible(&self, category: &str, today: NaiveDate) -> bool {
        self.is_active
            && self.has_started(today)
            && self.in_lanes(category)
            && !self.is_exhausted()
            && !self.is_expired(today)
    }

    /// Check if the start date has been reached.
    pub fn has_started(&self, today: NaiveDate) -> bool {
        self.start_date <= today
    }

    /// Check if the end date has passed.
    pub fn is_expired(&self, today: NaiveDate) -> bool {
        self.end_date.map(|end| end < today).unwrap_or(false)
    }

    /// Check if the impression budget has been used up.
    pub fn is_exhausted(&self) -> bool {
        self.max_views
            .map(|limit| self.views_count >= limit)
            .unwrap_or(false)
    }

    /// Check if the placement belongs to the lanes requested for `category`.
    pub fn in_lanes(&self, category: &str) -> bool {
        match &self.placement {
            Placement::All | Placement::Weekly => true,
            Placement::Cuisine(name) => category != ALL_CATEGORIES && name == category,
        }
    }

    /// Impressions left before the budget runs out.
    pub fn remaining_views(&self) -> Option<i64> {
        self.max_views
            .map(|limit| (limit - self.views_count).max(0))
    }

    /// Delivery statistics for reporting.
    pub fn stats(&self) -> CampaignStats {
        let click_through_rate = if self.views_count > 0 {
            self.clicks_count as f64 / self.views_count as f64
        } else {
            0.0
        };

        CampaignStats {
            views: self.views_count,
            clicks: self.clicks_count,
            click_through_rate,
            remaining_views: self.remaining_views(),
        }
    }
}

/// Delivery statistics for one campaign.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CampaignStats {
    pub views: i64,
    pub clicks: i64,
    /// Clicks per impression, 0.0 when nothing was shown yet.
    pub click_through_rate: f64,
    pub remaining_views: Option<i64>,
}
