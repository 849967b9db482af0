use poise::serenity_prelude::prelude::TypeMapKey;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmbedOpts {
    pub colour: String,
    pub footer_text: String,
    pub footer_icon_url: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigValue {
    pub name: String,
    pub home_guild: u64,
    pub emoji_guild: u64,
    pub finder_channel: u64,
    pub embed_opts: EmbedOpts,
}

pub struct Config;

impl TypeMapKey for Config {
    type Value = ConfigValue;
}
