//! Show the listing order for a filter combination.

use anyhow::Result;
use forkspin_ads::geo::distance_km;
use forkspin_ads::listing::{DisplayItem, Listing, SessionKey};
use forkspin_ads::prelude::Coordinates;
use forkspin_ads::resolver::Resolver;

use super::{rng_from, today_or, ShuffleArgs};
use crate::catalog::Catalog;
use crate::context::Context;

/// Run the shuffle command.
pub async fn run(args: ShuffleArgs, ctx: &Context) -> Result<()> {
    let catalog = Catalog::open(&ctx.catalog_path(args.catalog.as_deref())?).await?;
    let mut rng = rng_from(args.seed);
    let origin = args.lat.zip(args.lng).map(|(lat, lng)| Coordinates::new(lat, lng));

    if args.nearby && origin.is_none() {
        ctx.output
            .warn("--nearby without --lat/--lng: every distance is unknown");
    }

    let featured = if args.no_sponsor {
        None
    } else {
        let resolver = Resolver::new(catalog.store());
        let slot = resolver
            .resolve_pinned(&args.category, today_or(args.date), &mut rng)
            .await;
        slot.and_then(|slot| {
            let item = catalog.restaurant(&slot.restaurant_id);
            if item.is_none() {
                ctx.output.warn(&format!(
                    "Sponsored restaurant {} is not in the catalog",
                    slot.restaurant_id
                ));
            }
            item
        })
    };

    let candidates = catalog.candidates(&args.category);
    let mut listing = Listing::new(rng, ctx.config.ads.page_size);
    listing.set_origin(origin);
    listing.refresh(
        SessionKey::new(args.category.clone(), args.nearby, args.newest),
        &candidates,
        featured.as_ref(),
    );
    for _ in 1..args.pages.max(1) {
        listing.load_more();
    }

    let visible = listing.visible();
    let total = listing
        .session()
        .map(|s| s.order().len())
        .unwrap_or_default();

    if ctx.output.is_json() {
        ctx.output.json(&serde_json::json!({
            "category": args.category,
            "visible": visible,
            "total": total,
        }));
        return Ok(());
    }

    ctx.output.header(&format!(
        "{} of {} restaurants for '{}'",
        visible.len(),
        total,
        args.category
    ));
    ctx.output.debug(&format!("{} candidates before sponsored pinning", candidates.len()));

    let widths = [4, 12, 28, 10];
    ctx.output.table_row(&["#", "ID", "NAME", "DISTANCE"], &widths);
    for (position, item) in visible.iter().enumerate() {
        ctx.output.table_row(
            &[
                &(position + 1).to_string(),
                item.id.as_str(),
                &label(item),
                &distance(item, origin),
            ],
            &widths,
        );
    }

    Ok(())
}

fn label(item: &DisplayItem) -> String {
    if item.is_sponsored {
        format!("{} [sponsored]", item.name)
    } else {
        item.name.clone()
    }
}

fn distance(item: &DisplayItem, origin: Option<Coordinates>) -> String {
    match (origin, item.coordinates) {
        (Some(from), Some(to)) => format!("{:.1} km", distance_km(from, to)),
        _ => "-".to_string(),
    }
}
