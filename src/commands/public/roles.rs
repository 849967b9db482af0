use futures::Stream;
use poise::CreateReply;

use crate::commands::prelude::*;
use crate::config::Config;
use crate::roleup;

async fn autocomplete_category<'a>(
    ctx: Context<'a>,
    partial: &'a str,
) -> impl Stream<Item = String> + 'a {
    let categories: Vec<String> = match ctx.guild_id() {
        Some(guild_id) => match guild_id.roles(ctx.serenity_context()).await {
            Ok(roles) => roles
                .values()
                .filter_map(|role| role.name.strip_prefix("#Category_"))
                .map(str::to_owned)
                .collect(),
            Err(_) => Vec::new(),
        },
        None => Vec::new(),
    };
    futures::stream::iter(
        categories
            .into_iter()
            .filter(move |name| name.starts_with(partial)),
    )
}

/// Shows the self-assign role buttons for a category
#[command(slash_command, prefix_command, guild_only)]
pub async fn roles(
    ctx: Context<'_>,
    #[description = "Role category to browse"]
    #[autocomplete = "autocomplete_category"]
    category: String,
) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("This command only works in a guild")?;
    let member = ctx
        .author_member()
        .await
        .ok_or("Failed to get author member")?;
    let config = {
        let data = ctx.serenity_context().data.read().await;
        data.get::<Config>().ok_or("Config not found")?.clone()
    };

    let http = ctx.serenity_context().http.clone();
    let rows = roleup::role_menu(&http, &config, guild_id, &member.roles, &category, 0).await?;
    if rows.is_empty() {
        ctx.send(
            CreateReply::default()
                .content(format!("No roles found for category {}", category))
                .ephemeral(true),
        )
        .await?;
        return Ok(());
    }

    let reply = CreateReply::default()
        .content(format!("Self-assign roles: {}", category))
        .components(rows)
        .ephemeral(true);
    ctx.send(reply).await?;
    Ok(())
}
