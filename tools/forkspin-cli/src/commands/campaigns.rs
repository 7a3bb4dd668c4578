//! List campaigns with their delivery status.

use anyhow::Result;
use chrono::NaiveDate;
use forkspin_ads::Campaign;
use serde::Serialize;

use super::{today_or, CampaignsArgs};
use crate::catalog::Catalog;
use crate::context::Context;
use crate::output::{format_percent, status_badge};

#[derive(Serialize)]
struct CampaignRow {
    #[serde(flatten)]
    campaign: Campaign,
    status: &'static str,
}

/// Delivery status of `campaign` on `today`.
fn status(campaign: &Campaign, today: NaiveDate) -> &'static str {
    if !campaign.is_active {
        "inactive"
    } else if !campaign.has_started(today) {
        "scheduled"
    } else if campaign.is_exhausted() {
        "exhausted"
    } else if campaign.is_expired(today) {
        "expired"
    } else {
        "active"
    }
}

/// Run the campaigns command.
pub async fn run(args: CampaignsArgs, ctx: &Context) -> Result<()> {
    let catalog = Catalog::open(&ctx.catalog_path(args.catalog.as_deref())?).await?;
    let today = today_or(args.date);

    let mut campaigns = catalog.campaigns().await?;
    campaigns.sort_by(|a, b| a.id.cmp(&b.id));

    if ctx.output.is_json() {
        let rows: Vec<CampaignRow> = campaigns
            .into_iter()
            .map(|c| CampaignRow {
                status: status(&c, today),
                campaign: c,
            })
            .collect();
        ctx.output.json(&rows);
        return Ok(());
    }

    if campaigns.is_empty() {
        ctx.output.info("No campaigns in catalog.");
        return Ok(());
    }

    ctx.output.header(&format!("Campaigns as of {}", today));
    let widths = [10, 28, 12, 12, 8];
    ctx.output
        .table_row(&["ID", "PLACEMENT", "STATUS", "VIEWS", "CTR"], &widths);

    for campaign in &campaigns {
        let stats = campaign.stats();
        let views = match campaign.max_views {
            Some(max) => format!("{}/{}", stats.views, max),
            None => stats.views.to_string(),
        };
        // Pad before styling so escape codes do not break the columns
        let badge = status_badge(&format!("{:12}", status(campaign, today)));
        ctx.output.table_row(
            &[
                campaign.id.as_str(),
                &campaign.placement.to_string(),
                &badge,
                &views,
                &format_percent(stats.click_through_rate),
            ],
            &[10, 28, 0, 12, 8],
        );
    }

    Ok(())
}
