use std::sync::Arc;

use async_trait::async_trait;
use avenger_ledger::{DisplayNameResolver, UserId};
use serenity::http::{Http, HttpError};
use serenity::model::guild::Member;
use serenity::model::id::{GuildId, RoleId, UserId as DiscordUserId};
use serenity::model::permissions::Permissions;
use tracing::{debug, warn};

use crate::commands::is_administrator;

/// Map a ledger id onto a Discord user id. Snowflakes are never zero.
pub(super) fn to_discord_id(user_id: &UserId) -> Option<DiscordUserId> {
    user_id
        .as_u64()
        .filter(|id| *id != 0)
        .map(DiscordUserId::new)
}

/// Whether Discord answered 404, i.e. the user is not in the guild.
fn is_not_found(err: &serenity::Error) -> bool {
    match err {
        serenity::Error::Http(HttpError::UnsuccessfulRequest(response)) => {
            response.status_code.as_u16() == 404
        }
        _ => false,
    }
}

/// Member lookups scoped to one guild.
pub(super) struct GuildMembers {
    http: Arc<Http>,
    guild_id: GuildId,
}

impl GuildMembers {
    pub(super) fn new(http: Arc<Http>, guild_id: GuildId) -> Self {
        Self { http, guild_id }
    }

    pub(super) fn guild_id(&self) -> GuildId {
        self.guild_id
    }

    /// The guild member for `user_id`, or `None` if they are not (or no
    /// longer) in the guild.
    pub(super) async fn member(&self, user_id: &UserId) -> Option<Member> {
        let discord_id = to_discord_id(user_id)?;
        match self.guild_id.member(self.http.as_ref(), discord_id).await {
            Ok(member) => Some(member),
            Err(e) if is_not_found(&e) => {
                debug!("{} is not a member of guild {}", user_id, self.guild_id);
                None
            }
            Err(e) => {
                warn!(
                    "Member lookup failed for {} in guild {}: {}",
                    user_id, self.guild_id, e
                );
                None
            }
        }
    }

    /// Whether `user_id` holds ADMINISTRATOR in this guild.
    pub(super) async fn is_admin(&self, user_id: DiscordUserId) -> serenity::Result<bool> {
        let http = self.http.as_ref();
        let guild = self.guild_id.to_partial_guild(http).await?;
        if guild.owner_id == user_id {
            return Ok(true);
        }

        let member = self.guild_id.member(http, user_id).await?;
        let everyone = guild
            .roles
            .get(&RoleId::new(self.guild_id.get()))
            .map(|role| role.permissions)
            .unwrap_or_else(Permissions::empty);
        let role_perms = member
            .roles
            .iter()
            .filter_map(|role_id| guild.roles.get(role_id))
            .map(|role| role.permissions);

        Ok(is_administrator(false, everyone, role_perms))
    }
}

#[async_trait]
impl DisplayNameResolver for GuildMembers {
    async fn display_name(&self, user_id: &UserId) -> Option<String> {
        self.member(user_id)
            .await
            .map(|member| member.display_name().to_string())
    }
}
