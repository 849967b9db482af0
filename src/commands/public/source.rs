use poise::CreateReply;
use poise::serenity_prelude::{self as serenity, Colour, CreateEmbed, CreateEmbedAuthor};

use crate::commands::prelude::*;
use crate::config::Config;
use crate::saucenao::{Sauce, SaucePayload};

/// Reverse-searches a message's image attachment on SauceNAO
#[command(context_menu_command = "Find Source", guild_only)]
pub async fn find_source(ctx: Context<'_>, msg: serenity::Message) -> Result<(), Error> {
    let (finder_channel, home_guild) = {
        let data = ctx.serenity_context().data.read().await;
        let config = data.get::<Config>().ok_or("Config not found")?;
        (config.finder_channel, config.home_guild)
    };
    // Replies stay hidden everywhere in the home guild except the dedicated
    // finder channel.
    let ephemeral = ctx.guild_id().map(|id| id.get()) == Some(home_guild)
        && ctx.channel_id().get() != finder_channel;

    let Some(attachment) = msg.attachments.last() else {
        let embed = error_embed(&ctx).await?.description("No image found in message");
        ctx.send(CreateReply::default().embed(embed).ephemeral(true))
            .await?;
        return Ok(());
    };
    let objective = attachment.url.clone();

    let sauce = {
        let data = ctx.serenity_context().data.read().await;
        data.get::<Sauce>().ok_or("SauceNAO client not found")?.clone()
    };
    let payload = sauce.search(&objective).await?;

    if payload.header.status != 0 {
        let embed = error_embed(&ctx)
            .await?
            .description(status_text(payload.header.status));
        ctx.send(CreateReply::default().embed(embed).ephemeral(ephemeral))
            .await?;
        return Ok(());
    }

    let fields = sauce_fields(&payload);
    let mut embed = embed(&ctx)
        .await?
        .title("Source(s) found:")
        .author(CreateEmbedAuthor::new("SauceNAO").url("https://saucenao.com/"))
        .thumbnail(objective);
    if fields.is_empty() {
        embed = embed.field(
            "No accurate sources found...",
            "Try checking on the [main website](https://saucenao.com/) in the case of an error",
            false,
        );
    }
    for (title, content) in fields {
        embed = embed.field(title, content, false);
    }

    ctx.send(CreateReply::default().embed(embed).ephemeral(ephemeral))
        .await?;
    Ok(())
}

async fn error_embed(ctx: &Context<'_>) -> Result<CreateEmbed, Error> {
    Ok(embed(ctx)
        .await?
        .title("Error")
        .colour(Colour::RED)
        .author(CreateEmbedAuthor::new("SauceNAO").url("https://saucenao.com/")))
}

fn status_text(code: i64) -> String {
    let text = if code > 0 { "Server" } else { "Client" };
    format!("{} error, Code: {}", text, code)
}

/// One embed field per recognized match above the similarity threshold.
/// Only Pixiv, Twitter and the Booru family are recognized; every other
/// index is dropped regardless of similarity.
fn sauce_fields(payload: &SaucePayload) -> Vec<(String, String)> {
    let mut fields = Vec::new();

    for result in &payload.results {
        let similarity = result.header.similarity.parse::<f32>().unwrap_or(0.0);
        if similarity as i64 <= 55 {
            continue;
        }

        match result.header.index_id {
            5 => {
                // Pixiv
                let mut content = format!(
                    "Poster: {}",
                    result.data.member_name.as_deref().unwrap_or("unknown")
                );
                if let Some(link) = result.data.ext_urls.first() {
                    content.push_str(&format!("\n[Link to Post]({})", link));
                }
                fields.push(("Pixiv".to_owned(), content));
            }
            41 => {
                // Twitter
                let mut content = String::new();
                if let Some(handle) = &result.data.twitter_user_handle {
                    content.push_str(&format!("**Poster:** @{}", handle));
                }
                if let Some(link) = result.data.ext_urls.first() {
                    content.push_str(&format!("\n[Link to Post]({})", link));
                }
                fields.push(("Twitter".to_owned(), content));
            }
            9 => {
                // Danbooru and friends
                let mut content = String::new();
                if let Some(creator) = &result.data.creator {
                    content.push_str(&format!("Creator: {}\n", creator.as_text()));
                }
                if let Some(material) = &result.data.material {
                    content.push_str(&format!("Material: {}\n", material));
                }
                if let Some(characters) = &result.data.characters {
                    content.push_str(&format!("Character(s): {}\n", characters));
                }
                if !result.data.ext_urls.is_empty() {
                    content.push_str("**Link(s):**\n");
                    for link in &result.data.ext_urls {
                        content.push_str(&format_link(link));
                    }
                }
                fields.push(("Boorus".to_owned(), content));
            }
            _ => {}
        }
    }

    fields
}

fn format_link(link: &str) -> String {
    let name = link
        .strip_prefix("https://")
        .unwrap_or(link)
        .split('/')
        .next()
        .unwrap_or(link);
    format!("[{}]({})\n", name, link)
}

#[cfg(test)]
mod tests {
    use crate::saucenao::{Creator, PayloadHeader, ResultData, ResultHeader, SauceResult};

    use super::*;

    fn result(similarity: &str, index_id: u32, data: ResultData) -> SauceResult {
        SauceResult {
            header: ResultHeader {
                similarity: similarity.to_owned(),
                index_id,
            },
            data,
        }
    }

    fn payload(results: Vec<SauceResult>) -> SaucePayload {
        SaucePayload {
            header: PayloadHeader { status: 0 },
            results,
        }
    }

    #[test]
    fn positive_status_reads_as_server_error() {
        assert_eq!(status_text(2), "Server error, Code: 2");
        assert_eq!(status_text(-1), "Client error, Code: -1");
        assert_eq!(status_text(0), "Client error, Code: 0");
    }

    #[test]
    fn low_similarity_results_are_dropped() {
        let payload = payload(vec![result(
            "54.90",
            5,
            ResultData {
                member_name: Some("someone".to_owned()),
                ..Default::default()
            },
        )]);
        assert!(sauce_fields(&payload).is_empty());
    }

    #[test]
    fn unrecognized_indices_are_dropped_even_above_threshold() {
        let payload = payload(vec![result("99.00", 34, ResultData::default())]);
        assert!(sauce_fields(&payload).is_empty());
    }

    #[test]
    fn pixiv_results_format_poster_and_link() {
        let payload = payload(vec![result(
            "93.21",
            5,
            ResultData {
                member_name: Some("someone".to_owned()),
                ext_urls: vec!["https://www.pixiv.net/artworks/1".to_owned()],
                ..Default::default()
            },
        )]);
        let fields = sauce_fields(&payload);
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].0, "Pixiv");
        assert_eq!(
            fields[0].1,
            "Poster: someone\n[Link to Post](https://www.pixiv.net/artworks/1)"
        );
    }

    #[test]
    fn booru_results_format_metadata_and_links() {
        let payload = payload(vec![result(
            "88.00",
            9,
            ResultData {
                creator: Some(Creator::One("painter".to_owned())),
                material: Some("original".to_owned()),
                characters: Some("a, b".to_owned()),
                ext_urls: vec!["https://danbooru.donmai.us/post/show/2".to_owned()],
                ..Default::default()
            },
        )]);
        let fields = sauce_fields(&payload);
        assert_eq!(fields[0].0, "Boorus");
        assert_eq!(
            fields[0].1,
            "Creator: painter\nMaterial: original\nCharacter(s): a, b\n**Link(s):**\n[danbooru.donmai.us](https://danbooru.donmai.us/post/show/2)\n"
        );
    }
}
