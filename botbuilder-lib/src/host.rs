use crate::CloneableCtx;
use botbuilder_db::BotDb;
use chrono::{DateTime, Utc};
use color_eyre::eyre::{Result, WrapErr, bail};
use poise::serenity_prelude::{
    ChannelId, EditMember, GuildChannel, GuildId, Member, Permissions, Role, RoleId, UserId,
};
use std::{collections::HashMap, time::Duration};

/// What the assistant's actions act upon: one guild, through the bot's
/// cache and http client.
#[derive(Clone)]
pub struct DiscordHost {
    pub ctx: CloneableCtx,
    pub guild_id: GuildId,
    pub db: BotDb,
}

impl DiscordHost {
    pub fn new(ctx: impl Into<CloneableCtx>, guild_id: GuildId, db: BotDb) -> Self {
        Self {
            ctx: ctx.into(),
            guild_id,
            db,
        }
    }

    pub async fn member(&self, user_id: UserId) -> Result<Member> {
        self.guild_id
            .member(&self.ctx, user_id)
            .await
            .wrap_err_with(|| format!("Couldn't find <@{user_id}> in this server"))
    }

    pub async fn member_permissions(&self, user_id: UserId) -> Result<Permissions> {
        let member = self.member(user_id).await?;

        let cached = self
            .guild_id
            .to_guild_cached(&self.ctx.0)
            .map(|guild| guild.member_permissions(&member));

        if let Some(permissions) = cached {
            return Ok(permissions);
        }

        let guild = self
            .guild_id
            .to_partial_guild(&self.ctx)
            .await
            .wrap_err("Couldn't fetch the server")?;

        if guild.owner_id == user_id {
            return Ok(Permissions::all());
        }

        Ok(combine_role_permissions(
            &guild.roles,
            self.guild_id.everyone_role(),
            &member.roles,
        ))
    }

    /// Fails with a user-readable message unless the member has `required`.
    pub async fn require(&self, user_id: UserId, required: Permissions) -> Result<()> {
        let permissions = self.member_permissions(user_id).await?;

        if !has_permissions(permissions, required) {
            bail!(
                "You need the {} permission to do that",
                required.get_permission_names().join(", ")
            );
        }

        Ok(())
    }

    /// Fetches a channel and makes sure it belongs to this guild.
    pub async fn guild_channel(&self, channel_id: ChannelId) -> Result<GuildChannel> {
        let channel = channel_id
            .to_channel(&self.ctx)
            .await
            .wrap_err_with(|| format!("Couldn't find the channel {channel_id}"))?;

        match channel.guild() {
            Some(channel) if channel.guild_id == self.guild_id => Ok(channel),
            _ => bail!("<#{channel_id}> isn't a channel of this server"),
        }
    }

    pub async fn timeout(
        &self,
        target: UserId,
        duration: Duration,
        reason: Option<&str>,
    ) -> Result<DateTime<Utc>> {
        let timeout_end = Utc::now() + duration;

        let mut edit = EditMember::new().disable_communication_until(timeout_end.to_rfc3339());
        if let Some(reason) = reason {
            edit = edit.audit_log_reason(reason);
        }

        self.guild_id
            .edit_member(&self.ctx, target, edit)
            .await
            .wrap_err("Failed to edit member")?;

        Ok(timeout_end)
    }
}

fn has_permissions(permissions: Permissions, required: Permissions) -> bool {
    permissions.administrator() || permissions.contains(required)
}

fn combine_role_permissions(
    roles: &HashMap<RoleId, Role>,
    everyone: RoleId,
    member_roles: &[RoleId],
) -> Permissions {
    std::iter::once(&everyone)
        .chain(member_roles)
        .filter_map(|role_id| roles.get(role_id))
        .fold(Permissions::empty(), |permissions, role| {
            permissions | role.permissions
        })
}
