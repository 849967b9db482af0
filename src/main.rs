pub mod commands;
mod config;
mod roleup;
mod saucenao;

use std::env;
use std::fs::read_to_string;

use poise::serenity_prelude::{
    Client, ComponentInteraction, Context, CreateInteractionResponse,
    CreateInteractionResponseMessage, EventHandler, GatewayIntents, Interaction, RoleId,
    async_trait,
};
use tracing::{error, info};

use crate::commands::public;
use crate::config::{Config, ConfigValue};
use crate::roleup::RoleupAction;
use crate::saucenao::{Sauce, SauceNao};

#[derive(Debug)]
struct Handler;

#[async_trait]
impl EventHandler for Handler {
    async fn interaction_create(&self, ctx: Context, interaction: Interaction) {
        let Interaction::Component(component) = interaction else {
            return;
        };
        // Custom ids that don't decode belong to someone else's components
        let Some(action) = roleup::parse_custom_id(&component.data.custom_id) else {
            return;
        };
        if let Err(e) = dispatch(&ctx, &component, action).await {
            error!("Failed to handle component interaction: {}", e);
        }
    }
}

async fn dispatch(
    ctx: &Context,
    component: &ComponentInteraction,
    action: RoleupAction,
) -> Result<(), commands::Error> {
    match action {
        RoleupAction::Toggle(role_id) => toggle_role(ctx, component, role_id).await,
        RoleupAction::ChangePage { category, page } => {
            change_page(ctx, component, &category, page).await
        }
    }
}

async fn toggle_role(
    ctx: &Context,
    component: &ComponentInteraction,
    role_id: RoleId,
) -> Result<(), commands::Error> {
    let member = component
        .member
        .as_ref()
        .ok_or("Role buttons only work in a guild")?;

    let content = if member.roles.contains(&role_id) {
        member.remove_role(&ctx.http, role_id).await?;
        format!("Removed <@&{}> from your roles", role_id)
    } else {
        member.add_role(&ctx.http, role_id).await?;
        format!("Added <@&{}> to your roles", role_id)
    };

    component
        .create_response(
            &ctx.http,
            CreateInteractionResponse::Message(
                CreateInteractionResponseMessage::new()
                    .content(content)
                    .ephemeral(true),
            ),
        )
        .await?;
    Ok(())
}

async fn change_page(
    ctx: &Context,
    component: &ComponentInteraction,
    category: &str,
    page: usize,
) -> Result<(), commands::Error> {
    let guild_id = component
        .guild_id
        .ok_or("Role buttons only work in a guild")?;
    let member = component
        .member
        .as_ref()
        .ok_or("Role buttons only work in a guild")?;
    let config = {
        let data = ctx.data.read().await;
        data.get::<Config>().ok_or("Config not found")?.clone()
    };

    let rows =
        roleup::role_menu(&ctx.http, &config, guild_id, &member.roles, category, page).await?;
    component
        .create_response(
            &ctx.http,
            CreateInteractionResponse::UpdateMessage(
                CreateInteractionResponseMessage::new().components(rows),
            ),
        )
        .await?;
    Ok(())
}

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt::init();

    let config_json = read_to_string("config.json").expect("Failed to read config.json");
    let config: ConfigValue =
        serde_json::from_str(&config_json).expect("Failed to parse config.json");

    // Login with a bot token from the environment
    let token = env::var("API_TOKEN").expect("Expected a token in the environment");
    let sauce_key =
        env::var("SAUCENAO_KEY").expect("Expected a SauceNAO API key in the environment");

    let intents =
        GatewayIntents::GUILDS | GatewayIntents::GUILD_MESSAGES | GatewayIntents::MESSAGE_CONTENT;

    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands: vec![public::find_source(), public::roles()],
            prefix_options: poise::PrefixFrameworkOptions {
                prefix: Some(";".to_string()),
                ..Default::default()
            },
            ..Default::default()
        })
        .setup(|ctx, _ready, framework| {
            Box::pin(async move {
                poise::builtins::register_globally(ctx, &framework.options().commands).await?;
                Ok(())
            })
        })
        .build();

    let mut client = Client::builder(token, intents)
        .event_handler(Handler)
        .framework(framework)
        .await
        .expect("Error creating client");

    {
        let mut data = client.data.write().await;
        data.insert::<Config>(config.clone());
        data.insert::<Sauce>(SauceNao::new(sauce_key));
    }

    info!("Starting {}", config.name);
    if let Err(why) = client.start().await {
        error!("Client error: {why:?}");
    }
}
