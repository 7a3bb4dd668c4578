//! Catalog files: campaigns, restaurants and recorded interactions.
//!
//! A catalog is loaded into a [`MemoryStore`] so commands run the same code
//! paths as the app, then written back after mutating commands.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use forkspin_ads::ledger::{Interaction, AD_INTERACTIONS, RESTAURANT_INTERACTIONS};
use forkspin_ads::listing::DisplayItem;
use forkspin_ads::placement::ALL_CATEGORIES;
use forkspin_ads::resolver::ADVERTISEMENTS;
use forkspin_ads::{Campaign, CampaignId, RestaurantId};
use forkspin_store::{MemoryStore, Row, Select, Store};
use serde::{Deserialize, Serialize};

/// On-disk catalog layout.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct CatalogFile {
    #[serde(default)]
    pub campaigns: Vec<Campaign>,

    #[serde(default)]
    pub restaurants: Vec<RestaurantEntry>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub interactions: Vec<Interaction>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub restaurant_interactions: Vec<Interaction>,
}

/// A restaurant and the cuisines it is listed under.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RestaurantEntry {
    #[serde(flatten)]
    pub item: DisplayItem,

    #[serde(default)]
    pub cuisines: Vec<String>,
}

impl RestaurantEntry {
    fn serves(&self, category: &str) -> bool {
        category == ALL_CATEGORIES || self.cuisines.iter().any(|c| c == category)
    }
}

/// A catalog file backed by an in-memory store.
pub struct Catalog {
    path: PathBuf,
    restaurants: Vec<RestaurantEntry>,
    store: Arc<MemoryStore>,
}

impl Catalog {
    /// Read `path` (TOML or JSON by extension) and load it into a store.
    pub async fn open(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read catalog: {}", path.display()))?;

        let file: CatalogFile = if is_json(path) {
            serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse JSON catalog: {}", path.display()))?
        } else {
            toml::from_str(&content)
                .with_context(|| format!("Failed to parse TOML catalog: {}", path.display()))?
        };

        let store = Arc::new(MemoryStore::new());
        for campaign in &file.campaigns {
            store.insert(ADVERTISEMENTS, Row::from_serialize(campaign)?).await?;
        }
        for event in &file.interactions {
            store.insert(AD_INTERACTIONS, Row::from_serialize(event)?).await?;
        }
        for event in &file.restaurant_interactions {
            store
                .insert(RESTAURANT_INTERACTIONS, Row::from_serialize(event)?)
                .await?;
        }

        Ok(Self {
            path: path.to_path_buf(),
            restaurants: file.restaurants,
            store,
        })
    }

    pub fn store(&self) -> Arc<MemoryStore> {
        self.store.clone()
    }

    /// Restaurants listed under `category`.
    pub fn candidates(&self, category: &str) -> Vec<DisplayItem> {
        self.restaurants
            .iter()
            .filter(|r| r.serves(category))
            .map(|r| r.item.clone())
            .collect()
    }

    pub fn restaurant(&self, id: &RestaurantId) -> Option<DisplayItem> {
        self.restaurants
            .iter()
            .find(|r| &r.item.id == id)
            .map(|r| r.item.clone())
    }

    /// Current campaign rows.
    pub async fn campaigns(&self) -> Result<Vec<Campaign>> {
        let result = self.store.select(ADVERTISEMENTS, &Select::new()).await?;
        Ok(result.deserialize_all()?)
    }

    pub async fn campaign(&self, id: &CampaignId) -> Result<Campaign> {
        self.campaigns()
            .await?
            .into_iter()
            .find(|c| &c.id == id)
            .ok_or_else(|| anyhow!("Campaign not found: {}", id))
    }

    /// Write the store contents back to the catalog file.
    pub async fn save(&self) -> Result<()> {
        let file = CatalogFile {
            campaigns: self.campaigns().await?,
            restaurants: self.restaurants.clone(),
            interactions: self.events(AD_INTERACTIONS).await?,
            restaurant_interactions: self.events(RESTAURANT_INTERACTIONS).await?,
        };

        let content = if is_json(&self.path) {
            serde_json::to_string_pretty(&file)?
        } else {
            toml::to_string_pretty(&file)?
        };

        std::fs::write(&self.path, content)
            .with_context(|| format!("Failed to write catalog: {}", self.path.display()))
    }

    async fn events(&self, table: &str) -> Result<Vec<Interaction>> {
        let result = self.store.select(table, &Select::new()).await?;
        Ok(result.deserialize_all()?)
    }
}

fn is_json(path: &Path) -> bool {
    path.extension().map_or(false, |e| e == "json")
}
