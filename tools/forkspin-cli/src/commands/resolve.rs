//! Show which campaigns win the sponsored slots.

use anyhow::Result;
use forkspin_ads::resolver::{Resolver, SponsoredSlot};
use serde::Serialize;

use super::{rng_from, today_or, ResolveArgs};
use crate::catalog::Catalog;
use crate::context::Context;
use crate::output::format_percent;

#[derive(Serialize)]
struct ResolveReport {
    category: String,
    date: String,
    pinned: Option<SponsoredSlot>,
    weekly: Option<SponsoredSlot>,
}

/// Run the resolve command.
pub async fn run(args: ResolveArgs, ctx: &Context) -> Result<()> {
    let catalog = Catalog::open(&ctx.catalog_path(args.catalog.as_deref())?).await?;
    let today = today_or(args.date);
    let mut rng = rng_from(args.seed);

    let resolver = Resolver::new(catalog.store());
    let mut resolution = resolver.resolve(&args.category, today, &mut rng).await;
    if !ctx.config.ads.include_weekly {
        resolution.weekly = None;
    }

    if ctx.output.is_json() {
        ctx.output.json(&ResolveReport {
            category: args.category,
            date: today.to_string(),
            pinned: resolution.pinned,
            weekly: resolution.weekly,
        });
        return Ok(());
    }

    ctx.output
        .header(&format!("Sponsored slots for '{}' on {}", args.category, today));

    for (label, slot) in [("Pinned", &resolution.pinned), ("Weekly", &resolution.weekly)] {
        match slot {
            Some(slot) => {
                let campaign = catalog.campaign(&slot.campaign_id).await?;
                let stats = campaign.stats();
                ctx.output.success(&format!(
                    "{}: campaign {} for restaurant {}",
                    label, slot.campaign_id, slot.restaurant_id
                ));
                ctx.output.kv("placement", &slot.placement.to_string());
                ctx.output.kv("views", &stats.views.to_string());
                ctx.output.kv("clicks", &stats.clicks.to_string());
                ctx.output.kv("ctr", &format_percent(stats.click_through_rate));
                if let Some(remaining) = stats.remaining_views {
                    ctx.output.kv("remaining", &remaining.to_string());
                }
            }
            None => ctx.output.info(&format!("{}: no eligible campaign", label)),
        }
    }

    Ok(())
}
