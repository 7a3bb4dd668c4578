//! Sponsored placements and restaurant listing for Forkspin.
//!
//! This crate decides which campaign fills the featured card, keeps the
//! impression and click ledger, and orders the restaurant list:
//!
//! - **Resolver**: eligibility (active, date window, budget, lane) and winner
//!   selection, cuisine-targeted campaigns first
//! - **Ledger**: fire-and-forget impression and click recording with budget
//!   auto-deactivation
//! - **Listing**: per-filter shuffle sessions, sponsored pinning, load-more
//! - **Geocode**: rate-limited background coordinate fill-in for the nearby sort
//!
//! # Example
//!
//! ```rust,ignore
//! use forkspin_ads::prelude::*;
//!
//! let store = Arc::new(MemoryStore::new());
//! let mut page = PageImpressions::new(
//!     Resolver::new(store.clone()),
//!     Ledger::new(store.clone()),
//!     today,
//! );
//!
//! // Resolves once per category and records one impression per winner
//! let slots = page.slots("sushi", &mut rng).await;
//!
//! let mut listing = Listing::new(rng, config.page_size);
//! let visible = listing.refresh(SessionKey::new("sushi", false, false), &restaurants, featured.as_ref());
//! ```

pub mod campaign;
pub mod config;
pub mod error;
pub mod geo;
pub mod geocode;
pub mod ids;
pub mod impressions;
pub mod ledger;
pub mod listing;
pub mod placement;
pub mod resolver;

pub use campaign::{Campaign, CampaignStats};
pub use config::AdsConfig;
pub use error::AdsError;
pub use ids::*;
pub use placement::Placement;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::campaign::{Campaign, CampaignStats};
    pub use crate::config::AdsConfig;
    pub use crate::error::AdsError;
    pub use crate::ids::*;
    pub use crate::placement::{Placement, ALL_CATEGORIES};

    // Placement
    pub use crate::impressions::PageImpressions;
    pub use crate::resolver::{Resolution, Resolver, SponsoredSlot};

    // Ledger
    pub use crate::ledger::{ImpressionOutcome, Interaction, InteractionType, Ledger};

    // Listing
    pub use crate::geocode::{FillReport, GeocodeFiller, Geocoder};
    pub use crate::listing::{DisplayItem, Listing, OrderMode, SessionKey, VisibleWindow};

    pub use forkspin_cache::{Coordinates, GeocodeCache};
    pub use forkspin_store::{MemoryStore, Store};
}
