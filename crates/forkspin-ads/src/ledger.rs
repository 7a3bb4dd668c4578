//! Impression and click ledger.
//!
//! Every write here is best-effort. The user action that triggered it never
//! waits on the ledger, and a rejected write is logged and dropped.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use forkspin_store::{params, procedures, Condition, Row, Select, Store, Value};
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::error::AdsError;
use crate::ids::{CampaignId, InteractionId, RestaurantId, UserId};
use crate::resolver::ADVERTISEMENTS;

/// Per-campaign event log.
pub const AD_INTERACTIONS: &str = "ad_interactions";
/// Per-restaurant event log.
pub const RESTAURANT_INTERACTIONS: &str = "restaurant_interactions";

/// What the user did with a sponsored card.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum InteractionType {
    /// The card was rendered.
    View,
    /// The card itself was opened.
    Click,
    /// The user asked for directions.
    Location,
    /// The user jumped to a delivery app, by app name.
    Delivery(String),
}

impl InteractionType {
    /// Whether this event consumes impression budget.
    pub fn is_view(&self) -> bool {
        matches!(self, InteractionType::View)
    }

    fn as_str(&self) -> &str {
        match self {
            InteractionType::View => "view",
            InteractionType::Click => "click",
            InteractionType::Location => "location",
            InteractionType::Delivery(app) => app,
        }
    }
}

impl FromStr for InteractionType {
    type Err = AdsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "" => Err(AdsError::InvalidInteraction("empty interaction type".to_string())),
            "view" => Ok(InteractionType::View),
            "click" => Ok(InteractionType::Click),
            "location" => Ok(InteractionType::Location),
            app => Ok(InteractionType::Delivery(app.to_string())),
        }
    }
}

impl TryFrom<String> for InteractionType {
    type Error = AdsError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<InteractionType> for String {
    fn from(t: InteractionType) -> Self {
        t.as_str().to_string()
    }
}

impl fmt::Display for InteractionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One append-only ledger event.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Interaction {
    pub id: InteractionId,
    pub ad_id: CampaignId,
    pub interaction_type: InteractionType,
    /// `None` for guests.
    pub user_id: Option<UserId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub restaurant_id: Option<RestaurantId>,
    pub created_at: DateTime<Utc>,
}

impl Interaction {
    fn new(ad_id: &CampaignId, interaction_type: InteractionType, user_id: Option<&UserId>) -> Self {
        Self {
            id: InteractionId::generate(),
            ad_id: ad_id.clone(),
            interaction_type,
            user_id: user_id.cloned(),
            restaurant_id: None,
            created_at: Utc::now(),
        }
    }

    fn for_restaurant(mut self, restaurant_id: &RestaurantId) -> Self {
        self.restaurant_id = Some(restaurant_id.clone());
        self
    }
}

/// What a recorded impression did to its campaign.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImpressionOutcome {
    /// Views after this impression, as read back from the store.
    pub views_count: i64,
    /// Whether this call switched the campaign off.
    pub deactivated: bool,
}

#[derive(Debug, Deserialize)]
struct Consumption {
    views_count: i64,
    max_views: Option<i64>,
    is_active: bool,
}

/// Records impressions and clicks against the store.
#[derive(Clone)]
pub struct Ledger {
    store: Arc<dyn Store>,
}

impl Ledger {
    /// Create a ledger over `store`.
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Record one impression.
    ///
    /// Appends the event, asks the store for a relative `views_count + 1`,
    /// then reads the counter back and switches the campaign off if the budget
    /// is used up. The read-back is a separate round-trip, so concurrent
    /// viewers may push a campaign a few views past its budget.
    ///
    /// A rejected event append does not stop the increment: the budget is
    /// consumed for every impression, guests included.
    pub async fn record_impression(
        &self,
        campaign_id: &CampaignId,
        user_id: Option<&UserId>,
    ) -> Result<ImpressionOutcome, AdsError> {
        let event = Interaction::new(campaign_id, InteractionType::View, user_id);
        self.append(AD_INTERACTIONS, &event).await?;

        self.store
            .call(procedures::INCREMENT_AD_VIEWS, params![campaign_id.as_str()])
            .await?;

        let consumption = self.read_consumption(campaign_id).await?;
        let deactivated = match consumption.max_views {
            Some(max) if consumption.is_active && consumption.views_count >= max => {
                self.deactivate(campaign_id).await?;
                info!(
                    campaign_id = %campaign_id,
                    views = consumption.views_count,
                    max_views = max,
                    "campaign budget exhausted, deactivated"
                );
                true
            }
            _ => false,
        };

        Ok(ImpressionOutcome {
            views_count: consumption.views_count,
            deactivated,
        })
    }

    /// Record one click-class interaction.
    ///
    /// Clicks are logged per campaign and per restaurant and bump
    /// `clicks_count`. They never touch the budget or the active flag.
    /// Each append is independent of the counter. Returns the new click count.
    pub async fn record_click(
        &self,
        campaign_id: &CampaignId,
        restaurant_id: &RestaurantId,
        interaction_type: InteractionType,
        user_id: Option<&UserId>,
    ) -> Result<i64, AdsError> {
        if interaction_type.is_view() {
            return Err(AdsError::InvalidInteraction(
                "views are recorded as impressions, not clicks".to_string(),
            ));
        }

        let event = Interaction::new(campaign_id, interaction_type, user_id).for_restaurant(restaurant_id);
        self.append(AD_INTERACTIONS, &event).await?;
        self.append(RESTAURANT_INTERACTIONS, &event).await?;

        let clicks = self
            .store
            .call(procedures::INCREMENT_AD_CLICKS, params![campaign_id.as_str()])
            .await?;

        debug!(campaign_id = %campaign_id, interaction = %event.interaction_type, "click recorded");
        Ok(clicks.as_integer().unwrap_or_default())
    }

    /// Record an impression in the background.
    ///
    /// Returns immediately; failures are logged, never surfaced.
    pub fn spawn_impression(&self, campaign_id: CampaignId, user_id: Option<UserId>) -> JoinHandle<()> {
        let ledger = self.clone();
        tokio::spawn(async move {
            if let Err(e) = ledger.record_impression(&campaign_id, user_id.as_ref()).await {
                warn!(campaign_id = %campaign_id, error = %e, "impression not recorded");
            }
        })
    }

    /// Record a click in the background.
    ///
    /// Returns immediately; failures are logged, never surfaced.
    pub fn spawn_click(
        &self,
        campaign_id: CampaignId,
        restaurant_id: RestaurantId,
        interaction_type: InteractionType,
        user_id: Option<UserId>,
    ) -> JoinHandle<()> {
        let ledger = self.clone();
        tokio::spawn(async move {
            if let Err(e) = ledger
                .record_click(&campaign_id, &restaurant_id, interaction_type, user_id.as_ref())
                .await
            {
                warn!(campaign_id = %campaign_id, error = %e, "click not recorded");
            }
        })
    }

    /// Fire a click record, then run the user's action without waiting.
    pub fn track_then<T>(
        &self,
        campaign_id: CampaignId,
        restaurant_id: RestaurantId,
        interaction_type: InteractionType,
        user_id: Option<UserId>,
        action: impl FnOnce() -> T,
    ) -> T {
        drop(self.spawn_click(campaign_id, restaurant_id, interaction_type, user_id));
        action()
    }

    /// Append `event` to `table`. A store rejection is logged and dropped;
    /// only a row that cannot be built is an error.
    async fn append(&self, table: &str, event: &Interaction) -> Result<(), AdsError> {
        let row = Row::from_serialize(event)?;
        if let Err(e) = self.store.insert(table, row).await {
            warn!(
                table,
                campaign_id = %event.ad_id,
                interaction = %event.interaction_type,
                error = %e,
                "interaction not appended"
            );
        }
        Ok(())
    }

    async fn read_consumption(&self, campaign_id: &CampaignId) -> Result<Consumption, AdsError> {
        let select = Select::new()
            .with(Condition::eq("id", campaign_id.as_str()))
            .columns(["views_count", "max_views", "is_active"]);

        let result = self.store.select(ADVERTISEMENTS, &select).await?;
        let row = result
            .first()
            .ok_or_else(|| AdsError::CampaignNotFound(campaign_id.to_string()))?;
        Ok(row.deserialize()?)
    }

    async fn deactivate(&self, campaign_id: &CampaignId) -> Result<(), AdsError> {
        let changes = Row::from_pairs([("is_active", Value::Bool(false))]);
        self.store
            .update(ADVERTISEMENTS, campaign_id.as_str(), changes)
            .await?;
        Ok(())
    }
}
