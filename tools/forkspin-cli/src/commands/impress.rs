//! Record an impression.

use anyhow::Result;
use forkspin_ads::ledger::Ledger;
use forkspin_ads::{CampaignId, UserId};

use super::ImpressArgs;
use crate::catalog::Catalog;
use crate::context::Context;

/// Run the impress command.
pub async fn run(args: ImpressArgs, ctx: &Context) -> Result<()> {
    let catalog = Catalog::open(&ctx.catalog_path(args.catalog.as_deref())?).await?;
    let campaign_id = CampaignId::new(args.campaign_id);
    let user_id = args.user.map(UserId::new);

    // Fail early on unknown ids rather than logging a swallowed error
    let before = catalog.campaign(&campaign_id).await?;
    if !before.is_active {
        ctx.output.warn(&format!("Campaign {} is inactive", campaign_id));
    }

    let ledger = Ledger::new(catalog.store());
    match ledger.record_impression(&campaign_id, user_id.as_ref()).await {
        Ok(outcome) => {
            catalog.save().await?;
            if ctx.output.is_json() {
                ctx.output.json(&serde_json::json!({
                    "campaign_id": campaign_id,
                    "views_count": outcome.views_count,
                    "deactivated": outcome.deactivated,
                }));
                return Ok(());
            }

            ctx.output.success(&format!(
                "Impression recorded for {} ({} views)",
                campaign_id, outcome.views_count
            ));
            if outcome.deactivated {
                ctx.output.warn("Budget reached, campaign deactivated");
            }
        }
        // Never fatal for the viewer
        Err(e) => ctx.output.warn(&format!("Impression not recorded: {}", e)),
    }

    Ok(())
}
