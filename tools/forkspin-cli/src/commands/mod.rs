//! CLI command implementations.

pub mod campaigns;
pub mod click;
pub mod fairness;
pub mod impress;
pub mod resolve;
pub mod shuffle;

use chrono::{Local, NaiveDate};
use clap::Args;
use rand::rngs::StdRng;
use rand::SeedableRng;

/// Arguments for the resolve command.
#[derive(Args)]
pub struct ResolveArgs {
    /// Category to resolve for ("all" or a cuisine).
    #[arg(default_value = "all")]
    pub category: String,

    /// Catalog file (default: `catalog` from forkspin.toml).
    #[arg(long)]
    pub catalog: Option<String>,

    /// Resolve as of this date (default: today).
    #[arg(long)]
    pub date: Option<NaiveDate>,

    /// Seed for the tie-break between general campaigns.
    #[arg(long)]
    pub seed: Option<u64>,
}

/// Arguments for the impress command.
#[derive(Args)]
pub struct ImpressArgs {
    /// Campaign to record an impression for.
    pub campaign_id: String,

    /// Catalog file (default: `catalog` from forkspin.toml).
    #[arg(long)]
    pub catalog: Option<String>,

    /// Signed-in user; omit for a guest.
    #[arg(short, long)]
    pub user: Option<String>,
}

/// Arguments for the click command.
#[derive(Args)]
pub struct ClickArgs {
    /// Campaign that was clicked.
    pub campaign_id: String,

    /// Interaction: "click", "location" or a delivery app name.
    #[arg(short, long, default_value = "click")]
    pub kind: String,

    /// Catalog file (default: `catalog` from forkspin.toml).
    #[arg(long)]
    pub catalog: Option<String>,

    /// Signed-in user; omit for a guest.
    #[arg(short, long)]
    pub user: Option<String>,
}

/// Arguments for the shuffle command.
#[derive(Args)]
pub struct ShuffleArgs {
    /// Category to list ("all" or a cuisine).
    #[arg(default_value = "all")]
    pub category: String,

    /// Catalog file (default: `catalog` from forkspin.toml).
    #[arg(long)]
    pub catalog: Option<String>,

    /// Sort by distance from --lat/--lng.
    #[arg(long)]
    pub nearby: bool,

    /// Sort by most recently added.
    #[arg(long)]
    pub newest: bool,

    /// User latitude for --nearby.
    #[arg(long, requires = "lng", allow_hyphen_values = true)]
    pub lat: Option<f64>,

    /// User longitude for --nearby.
    #[arg(long, requires = "lat", allow_hyphen_values = true)]
    pub lng: Option<f64>,

    /// Pages to load (1 + number of load-more actions).
    #[arg(short, long, default_value_t = 1)]
    pub pages: usize,

    /// Leave the featured card out.
    #[arg(long)]
    pub no_sponsor: bool,

    /// Resolve the featured card as of this date (default: today).
    #[arg(long)]
    pub date: Option<NaiveDate>,

    /// Seed for the shuffle.
    #[arg(long)]
    pub seed: Option<u64>,
}

/// Arguments for the fairness command.
#[derive(Args)]
pub struct FairnessArgs {
    /// Number of items to shuffle.
    #[arg(short, long, default_value_t = 5)]
    pub items: usize,

    /// Number of shuffles.
    #[arg(short, long, default_value_t = 10_000)]
    pub runs: usize,

    /// Seed for the shuffles.
    #[arg(long)]
    pub seed: Option<u64>,
}

/// Arguments for the campaigns command.
#[derive(Args)]
pub struct CampaignsArgs {
    /// Catalog file (default: `catalog` from forkspin.toml).
    #[arg(long)]
    pub catalog: Option<String>,

    /// Evaluate status as of this date (default: today).
    #[arg(long)]
    pub date: Option<NaiveDate>,
}

/// Seeded generator when a seed is given, else one from OS entropy.
pub fn rng_from(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

/// `date` or the local calendar date.
pub fn today_or(date: Option<NaiveDate>) -> NaiveDate {
    date.unwrap_or_else(|| Local::now().date_naive())
}
