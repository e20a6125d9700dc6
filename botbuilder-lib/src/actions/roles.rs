use super::requester;
use crate::host::DiscordHost;
use async_trait::async_trait;
use botbuilder_assistant::{
    Action, ActionCall, ActionDeclaration,
    serde_json::{Value, json},
};
use color_eyre::eyre::{Result, WrapErr, bail};
use poise::serenity_prelude::{self as serenity, Permissions, RoleId, UserId};

/// `#ff8800`, `ff8800` or `0xff8800`.
fn parse_colour(text: &str) -> Result<u32> {
    let hex = text
        .trim()
        .trim_start_matches('#')
        .trim_start_matches("0x");

    if hex.len() != 6 {
        bail!("`{text}` is not a hex colour like #ff8800");
    }

    u32::from_str_radix(hex, 16).wrap_err_with(|| format!("`{text}` is not a hex colour like #ff8800"))
}

fn member_role_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "userId": { "type": "string", "description": "Id of the member" },
            "roleId": { "type": "string" },
        },
        "required": ["userId", "roleId"],
    })
}

fn member_role_response() -> Value {
    json!({
        "type": "object",
        "properties": {
            "userId": { "type": "string" },
            "roleId": { "type": "string" },
        },
    })
}

pub struct CreateRole(ActionDeclaration);

impl Default for CreateRole {
    fn default() -> Self {
        Self(
            ActionDeclaration::new("createRole", "Creates a new role.")
                .with_parameters(json!({
                    "type": "object",
                    "properties": {
                        "name": { "type": "string" },
                        "color": { "type": "string", "description": "Hex colour, e.g. #ff8800" },
                        "hoist": { "type": "boolean", "description": "Show members separately in the member list" },
                        "mentionable": { "type": "boolean" },
                    },
                    "required": ["name"],
                }))
                .with_response(json!({
                    "type": "object",
                    "properties": {
                        "roleId": { "type": "string" },
                        "name": { "type": "string" },
                    },
                })),
        )
    }
}

#[async_trait]
impl Action<DiscordHost> for CreateRole {
    fn declaration(&self) -> &ActionDeclaration {
        &self.0
    }

    async fn call(&self, call: ActionCall<'_, DiscordHost>) -> Result<Value> {
        let host = call.host;
        host.require(requester(&call), Permissions::MANAGE_ROLES)
            .await?;

        let name = call.str_arg("name")?.trim();
        if name.is_empty() || name.chars().count() > 100 {
            bail!("Role names must be between 1 and 100 characters");
        }

        let mut builder = serenity::EditRole::new()
            .name(name)
            .hoist(call.opt_bool_arg("hoist").unwrap_or(false))
            .mentionable(call.opt_bool_arg("mentionable").unwrap_or(false));

        if let Some(colour) = call.opt_str_arg("color") {
            builder = builder.colour(parse_colour(colour)?);
        }

        let role = host
            .guild_id
            .create_role(&host.ctx, builder)
            .await
            .wrap_err("Couldn't create the role")?;

        tracing::info!("Created role {} ({})", role.name, role.id);

        Ok(json!({ "roleId": role.id.to_string(), "name": role.name }))
    }
}

pub struct AddRole(ActionDeclaration);

impl Default for AddRole {
    fn default() -> Self {
        Self(
            ActionDeclaration::new("addRole", "Gives a role to a member.")
                .with_parameters(member_role_schema())
                .with_response(member_role_response()),
        )
    }
}

#[async_trait]
impl Action<DiscordHost> for AddRole {
    fn declaration(&self) -> &ActionDeclaration {
        &self.0
    }

    async fn call(&self, call: ActionCall<'_, DiscordHost>) -> Result<Value> {
        let host = call.host;
        host.require(requester(&call), Permissions::MANAGE_ROLES)
            .await?;

        let user_id = UserId::new(call.id_arg("userId")?);
        let role_id = RoleId::new(call.id_arg("roleId")?);

        host.member(user_id)
            .await?
            .add_role(&host.ctx, role_id)
            .await
            .wrap_err_with(|| format!("Couldn't give <@&{role_id}> to <@{user_id}>"))?;

        Ok(json!({ "userId": user_id.to_string(), "roleId": role_id.to_string() }))
    }
}

pub struct RemoveRole(ActionDeclaration);

impl Default for RemoveRole {
    fn default() -> Self {
        Self(
            ActionDeclaration::new("removeRole", "Takes a role away from a member.")
                .with_parameters(member_role_schema())
                .with_response(member_role_response()),
        )
    }
}

#[async_trait]
impl Action<DiscordHost> for RemoveRole {
    fn declaration(&self) -> &ActionDeclaration {
        &self.0
    }

    async fn call(&self, call: ActionCall<'_, DiscordHost>) -> Result<Value> {
        let host = call.host;
        host.require(requester(&call), Permissions::MANAGE_ROLES)
            .await?;

        let user_id = UserId::new(call.id_arg("userId")?);
        let role_id = RoleId::new(call.id_arg("roleId")?);

        host.member(user_id)
            .await?
            .remove_role(&host.ctx, role_id)
            .await
            .wrap_err_with(|| format!("Couldn't take <@&{role_id}> from <@{user_id}>"))?;

        Ok(json!({ "userId": user_id.to_string(), "roleId": role_id.to_string() }))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn colours() {
        assert_eq!(parse_colour("#ff8800").unwrap(), 0xff8800);
        assert_eq!(parse_colour("0x00ff00").unwrap(), 0x00ff00);
        assert_eq!(parse_colour("123abc").unwrap(), 0x123abc);
        assert!(parse_colour("red").is_err());
        assert!(parse_colour("#zzzzzz").is_err());
    }
}
