use super::requester;
use crate::host::DiscordHost;
use async_trait::async_trait;
use botbuilder_assistant::{
    Action, ActionCall, ActionDeclaration,
    serde_json::{Value, json},
};
use botbuilder_db::levels::{LevelsDb, UserLevel};
use color_eyre::eyre::{Result, bail};
use poise::serenity_prelude::{Permissions, UserId};

/// Keeps a single grant from making the leaderboard meaningless.
const MAX_GRANT: u64 = 100_000;

fn check_grant(amount: i64) -> Result<()> {
    if amount == 0 || amount.unsigned_abs() > MAX_GRANT {
        bail!("The amount has to be between 1 and {MAX_GRANT} (or negative)");
    }

    Ok(())
}

fn level_json(user_id: UserId, level: &UserLevel) -> Value {
    let progress = level.progress();

    json!({
        "userId": user_id.to_string(),
        "xp": level.xp,
        "level": progress.level,
        "xpIntoLevel": progress.xp_into_level,
        "xpForNextLevel": progress.xp_for_next_level,
    })
}

fn level_response() -> Value {
    json!({
        "type": "object",
        "properties": {
            "userId": { "type": "string" },
            "xp": { "type": "integer" },
            "level": { "type": "integer" },
            "xpIntoLevel": { "type": "integer" },
            "xpForNextLevel": { "type": "integer" },
        },
    })
}

pub struct AddExperience(ActionDeclaration);

impl Default for AddExperience {
    fn default() -> Self {
        Self(
            ActionDeclaration::new(
                "addExperience",
                "Gives (or with a negative amount, takes away) experience points from a member.",
            )
            .with_parameters(json!({
                "type": "object",
                "properties": {
                    "userId": { "type": "string" },
                    "amount": { "type": "integer" },
                },
                "required": ["userId", "amount"],
            }))
            .with_response(level_response()),
        )
    }
}

#[async_trait]
impl Action<DiscordHost> for AddExperience {
    fn declaration(&self) -> &ActionDeclaration {
        &self.0
    }

    async fn call(&self, call: ActionCall<'_, DiscordHost>) -> Result<Value> {
        let host = call.host;
        host.require(requester(&call), Permissions::MANAGE_GUILD)
            .await?;

        let user_id = UserId::new(call.id_arg("userId")?);
        let Some(amount) = call.opt_i64_arg("amount") else {
            bail!("`amount` has to be a whole number");
        };

        check_grant(amount)?;

        let level = LevelsDb::new(&host.db)?.add_experience(host.guild_id, user_id, amount)?;

        tracing::info!(
            "{} gave {} xp to {}, now at {}",
            requester(&call),
            amount,
            user_id,
            level.xp
        );

        Ok(level_json(user_id, &level))
    }
}

pub struct GetUserLevel(ActionDeclaration);

impl Default for GetUserLevel {
    fn default() -> Self {
        Self(
            ActionDeclaration::new(
                "getUserLevel",
                "Looks up the level and experience of a member.",
            )
            .with_parameters(json!({
                "type": "object",
                "properties": {
                    "userId": { "type": "string", "description": "Defaults to the user asking" },
                },
            }))
            .with_response(level_response()),
        )
    }
}

#[async_trait]
impl Action<DiscordHost> for GetUserLevel {
    fn declaration(&self) -> &ActionDeclaration {
        &self.0
    }

    async fn call(&self, call: ActionCall<'_, DiscordHost>) -> Result<Value> {
        let host = call.host;
        let user_id = call
            .opt_id_arg("userId")
            .map(UserId::new)
            .unwrap_or_else(|| requester(&call));

        let level = LevelsDb::new(&host.db)?.get(host.guild_id, user_id)?;

        Ok(level_json(user_id, &level))
    }
}
