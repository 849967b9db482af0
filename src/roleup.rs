use std::collections::HashMap;
use std::sync::{Arc, LazyLock};

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64_ENGINE;
use poise::serenity_prelude::{
    ButtonStyle, CreateActionRow, CreateButton, Emoji, GuildId, Http, ReactionType, Role, RoleId,
};
use regex::Regex;

use crate::commands::Error;
use crate::config::ConfigValue;

pub const BUTTON_ROW_MAX_LENGTH: usize = 5;
pub const MAXIMUM_BUTTON_ROWS: usize = 5;
pub const MAX_ROLE_ROWS: usize = MAXIMUM_BUTTON_ROWS - 1;

static DISALLOWED_EMOJI_CHARACTERS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^0-9A-Za-z_]").expect("invalid emoji character regex"));

/// A category role with the fields emoji resolution needs.
#[derive(Debug, Clone)]
pub struct CatalogRole {
    pub id: RoleId,
    pub name: String,
    pub unicode_emoji: Option<String>,
    pub icon_url: Option<String>,
}

impl From<&Role> for CatalogRole {
    fn from(role: &Role) -> Self {
        Self {
            id: role.id,
            name: role.name.clone(),
            unicode_emoji: role.unicode_emoji.clone(),
            icon_url: role.icon.map(|hash| {
                format!("https://cdn.discordapp.com/role-icons/{}/{}.png", role.id, hash)
            }),
        }
    }
}

/// A role annotated with its resolved button glyph. The glyph lives here, in
/// a value built per invocation, never on the platform's role entity.
#[derive(Debug, Clone, PartialEq)]
pub struct RoleEntry {
    pub id: RoleId,
    pub name: String,
    pub emoji: Option<ReactionType>,
}

/// Finds every role positioned strictly between the `#Category_<name>` and
/// `#EndCategory_<name>` boundary roles. A missing boundary is a guild
/// misconfiguration and fails the whole operation.
pub fn category_roles(
    category: &str,
    guild_roles: &HashMap<RoleId, Role>,
) -> Result<Vec<CatalogRole>, Error> {
    let start_name = format!("#Category_{}", category);
    let end_name = format!("#EndCategory_{}", category);
    let start = guild_roles
        .values()
        .find(|role| role.name == start_name)
        .ok_or_else(|| format!("Missing boundary role {}", start_name))?;
    let end = guild_roles
        .values()
        .find(|role| role.name == end_name)
        .ok_or_else(|| format!("Missing boundary role {}", end_name))?;

    let roles = guild_roles
        .values()
        .filter(|role| role.position < start.position && role.position > end.position)
        .map(CatalogRole::from)
        .collect();
    Ok(roles)
}

pub fn emojify(text: &str) -> String {
    DISALLOWED_EMOJI_CHARACTERS.replace_all(text, "_").into_owned()
}

/// Outcome of a by-name emoji lookup. `Missing` is ordinary control flow
/// that triggers on-demand creation, not a failure.
#[derive(Debug, Clone)]
pub enum EmojiLookup {
    Found(ReactionType),
    Missing,
}

pub trait EmojiRegistry {
    fn find(&self, name: &str) -> EmojiLookup;
    async fn create(&mut self, name: &str, image_url: &str) -> Result<(), Error>;
}

/// The emoji set of the configured emoji guild, fetched once per invocation.
pub struct GuildEmojiRegistry {
    http: Arc<Http>,
    web: reqwest::Client,
    guild: GuildId,
    emojis: Vec<Emoji>,
}

impl GuildEmojiRegistry {
    pub async fn load(http: Arc<Http>, guild: GuildId) -> Result<Self, Error> {
        let emojis = guild.emojis(&http).await?;
        Ok(Self {
            http,
            web: reqwest::Client::new(),
            guild,
            emojis,
        })
    }
}

impl EmojiRegistry for GuildEmojiRegistry {
    fn find(&self, name: &str) -> EmojiLookup {
        match self.emojis.iter().find(|emoji| emoji.name == name) {
            Some(emoji) => EmojiLookup::Found(ReactionType::Custom {
                animated: emoji.animated,
                id: emoji.id,
                name: Some(emoji.name.clone()),
            }),
            None => EmojiLookup::Missing,
        }
    }

    async fn create(&mut self, name: &str, image_url: &str) -> Result<(), Error> {
        let response = self.web.get(image_url).send().await?;
        let mime = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or("image/png")
            .to_owned();
        let bytes = response.bytes().await?;
        let data = format!("data:{};base64,{}", mime, BASE64_ENGINE.encode(&bytes));
        let emoji = self.guild.create_emoji(&self.http, name, &data).await?;
        self.emojis.push(emoji);
        Ok(())
    }
}

/// Resolves a glyph for every role in the catalog. Roles are resolved one at
/// a time, each awaited before the next starts: the guild emoji registry is
/// shared mutable state and concurrent identical creations are not
/// idempotent. Separate invocations are not coordinated.
pub async fn bind_role_emojis<R: EmojiRegistry>(
    registry: &mut R,
    catalog: Vec<CatalogRole>,
) -> Result<Vec<RoleEntry>, Error> {
    let mut entries = Vec::with_capacity(catalog.len());
    for role in catalog {
        let emoji = resolve_role_emoji(registry, &role).await?;
        entries.push(RoleEntry {
            id: role.id,
            name: role.name,
            emoji,
        });
    }
    Ok(entries)
}

async fn resolve_role_emoji<R: EmojiRegistry>(
    registry: &mut R,
    role: &CatalogRole,
) -> Result<Option<ReactionType>, Error> {
    if let Some(unicode) = &role.unicode_emoji {
        // e.g. "💩"
        return Ok(Some(ReactionType::Unicode(unicode.clone())));
    }

    let Some(icon_url) = &role.icon_url else {
        return Ok(None);
    };

    let name = emojify(&role.name);
    match registry.find(&name) {
        EmojiLookup::Found(emoji) => Ok(Some(emoji)),
        EmojiLookup::Missing => {
            registry.create(&name, icon_url).await?;
            match registry.find(&name) {
                EmojiLookup::Found(emoji) => Ok(Some(emoji)),
                EmojiLookup::Missing => {
                    Err(format!("Created emoji {} but could not find it", name).into())
                }
            }
        }
    }
}

/// One button of the planned grid, before any serenity builder is involved.
#[derive(Debug, Clone, PartialEq)]
pub enum PlannedButton {
    Role {
        custom_id: String,
        label: String,
        emoji: Option<ReactionType>,
        active: bool,
    },
    PageNav {
        custom_id: String,
        label: &'static str,
        disabled: bool,
    },
}

/// Plans the button grid for one page of a category. Roles are sorted by
/// name, case-insensitive; catalogs that fit within one page get no
/// navigation row.
pub fn plan_button_rows(
    mut roles: Vec<RoleEntry>,
    member_roles: &[RoleId],
    category: &str,
    page: usize,
) -> Vec<Vec<PlannedButton>> {
    roles.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));

    if roles.len() <= MAXIMUM_BUTTON_ROWS * BUTTON_ROW_MAX_LENGTH {
        return role_rows(&roles, MAXIMUM_BUTTON_ROWS, member_roles);
    }

    let skip = (page * BUTTON_ROW_MAX_LENGTH * MAX_ROLE_ROWS).min(roles.len());
    let remaining = &roles[skip..];
    let shown = remaining.len().min(MAX_ROLE_ROWS * BUTTON_ROW_MAX_LENGTH);

    let mut rows = role_rows(remaining, MAX_ROLE_ROWS, member_roles);
    rows.push(nav_row(category, page, remaining.len() == shown));
    rows
}

fn role_rows(
    roles: &[RoleEntry],
    max_rows: usize,
    member_roles: &[RoleId],
) -> Vec<Vec<PlannedButton>> {
    roles
        .chunks(BUTTON_ROW_MAX_LENGTH)
        .take(max_rows)
        .map(|chunk| {
            chunk
                .iter()
                .map(|role| PlannedButton::Role {
                    custom_id: format!("toggleRoleButton_{}", role.id),
                    label: role.name.clone(),
                    emoji: role.emoji.clone(),
                    active: member_roles.contains(&role.id),
                })
                .collect()
        })
        .collect()
}

fn nav_row(category: &str, page: usize, exhausted: bool) -> Vec<PlannedButton> {
    // The "next" control only ever looks one page ahead: it is disabled on
    // exhaustion, not on a known total page count.
    vec![
        PlannedButton::PageNav {
            custom_id: format!("changeRolesPage_{}_{}", category, page as i64 - 1),
            label: "<",
            disabled: page == 0,
        },
        PlannedButton::PageNav {
            custom_id: format!("changeRolesPage_{}_{}", category, page as i64 + 1),
            label: ">",
            disabled: exhausted,
        },
    ]
}

pub fn to_action_rows(rows: Vec<Vec<PlannedButton>>) -> Vec<CreateActionRow> {
    rows.into_iter()
        .map(|row| {
            let buttons = row
                .into_iter()
                .map(|button| match button {
                    PlannedButton::Role {
                        custom_id,
                        label,
                        emoji,
                        active,
                    } => {
                        let mut button = CreateButton::new(custom_id).label(label).style(
                            if active {
                                ButtonStyle::Success
                            } else {
                                ButtonStyle::Secondary
                            },
                        );
                        if let Some(emoji) = emoji {
                            button = button.emoji(emoji);
                        }
                        button
                    }
                    PlannedButton::PageNav {
                        custom_id,
                        label,
                        disabled,
                    } => CreateButton::new(custom_id)
                        .label(label)
                        .style(ButtonStyle::Primary)
                        .disabled(disabled),
                })
                .collect();
            CreateActionRow::Buttons(buttons)
        })
        .collect()
}

/// Builds the rendered button grid for one page of a category: fetch the
/// guild's roles, resolve the catalog, bind glyphs, plan and render. Returns
/// an empty list when the category holds no roles.
pub async fn role_menu(
    http: &Arc<Http>,
    config: &ConfigValue,
    guild: GuildId,
    member_roles: &[RoleId],
    category: &str,
    page: usize,
) -> Result<Vec<CreateActionRow>, Error> {
    let guild_roles = guild.roles(http).await?;
    let catalog = category_roles(category, &guild_roles)?;
    if catalog.is_empty() {
        return Ok(Vec::new());
    }

    let emoji_guild = GuildId::new(config.emoji_guild);
    let mut registry = GuildEmojiRegistry::load(http.clone(), emoji_guild).await?;
    let entries = bind_role_emojis(&mut registry, catalog).await?;

    Ok(to_action_rows(plan_button_rows(
        entries,
        member_roles,
        category,
        page,
    )))
}

/// A decoded button press, the inverse of the planner's custom id encoding.
#[derive(Debug, Clone, PartialEq)]
pub enum RoleupAction {
    Toggle(RoleId),
    ChangePage { category: String, page: usize },
}

pub fn parse_custom_id(custom_id: &str) -> Option<RoleupAction> {
    if let Some(id) = custom_id.strip_prefix("toggleRoleButton_") {
        let id = id.parse::<u64>().ok().filter(|&id| id != 0)?;
        return Some(RoleupAction::Toggle(RoleId::new(id)));
    }
    let rest = custom_id.strip_prefix("changeRolesPage_")?;
    let (category, page) = rest.rsplit_once('_')?;
    Some(RoleupAction::ChangePage {
        category: category.to_owned(),
        page: page.parse().ok()?,
    })
}
