//! Record a click-class interaction.

use anyhow::{Context as _, Result};
use forkspin_ads::ledger::{InteractionType, Ledger};
use forkspin_ads::{CampaignId, UserId};

use super::ClickArgs;
use crate::catalog::Catalog;
use crate::context::Context;

/// Run the click command.
pub async fn run(args: ClickArgs, ctx: &Context) -> Result<()> {
    let catalog = Catalog::open(&ctx.catalog_path(args.catalog.as_deref())?).await?;
    let campaign_id = CampaignId::new(args.campaign_id);
    let user_id = args.user.map(UserId::new);
    let interaction: InteractionType = args
        .kind
        .parse()
        .with_context(|| format!("Invalid interaction: {}", args.kind))?;

    let campaign = catalog.campaign(&campaign_id).await?;
    let ledger = Ledger::new(catalog.store());

    match ledger
        .record_click(&campaign_id, &campaign.restaurant_id, interaction.clone(), user_id.as_ref())
        .await
    {
        Ok(clicks) => {
            catalog.save().await?;
            if ctx.output.is_json() {
                ctx.output.json(&serde_json::json!({
                    "campaign_id": campaign_id,
                    "interaction": interaction,
                    "clicks_count": clicks,
                }));
                return Ok(());
            }
            ctx.output.success(&format!(
                "{} recorded for {} ({} clicks)",
                interaction, campaign_id, clicks
            ));
        }
        Err(e) => ctx.output.warn(&format!("Click not recorded: {}", e)),
    }

    Ok(())
}
