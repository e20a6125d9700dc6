use super::requester;
use crate::host::DiscordHost;
use async_trait::async_trait;
use botbuilder_assistant::{
    Action, ActionCall, ActionDeclaration,
    serde_json::{Value, json},
};
use color_eyre::eyre::{Result, WrapErr, bail};
use poise::serenity_prelude::{self as serenity, ChannelId, ChannelType, Permissions};

const MAX_CHANNEL_NAME_LENGTH: usize = 100;

fn channel_name(name: &str) -> Result<&str> {
    let name = name.trim().trim_start_matches('#');

    if name.is_empty() || name.chars().count() > MAX_CHANNEL_NAME_LENGTH {
        bail!("Channel names must be between 1 and {MAX_CHANNEL_NAME_LENGTH} characters");
    }

    Ok(name)
}

/// Discord lowercases text channel names and turns spaces into dashes, so
/// compare names the way they end up looking.
fn normalize_channel_name(name: &str) -> String {
    name.trim()
        .trim_start_matches('#')
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
        .to_lowercase()
}

pub struct CreateCategory(ActionDeclaration);

impl Default for CreateCategory {
    fn default() -> Self {
        Self(
            ActionDeclaration::new("createCategory", "Creates a new channel category.")
                .with_parameters(json!({
                    "type": "object",
                    "properties": {
                        "name": { "type": "string", "description": "Name of the category, e.g. \"Support\"" },
                    },
                    "required": ["name"],
                }))
                .with_response(json!({
                    "type": "object",
                    "properties": {
                        "categoryId": { "type": "string" },
                        "name": { "type": "string" },
                    },
                })),
        )
    }
}

#[async_trait]
impl Action<DiscordHost> for CreateCategory {
    fn declaration(&self) -> &ActionDeclaration {
        &self.0
    }

    async fn call(&self, call: ActionCall<'_, DiscordHost>) -> Result<Value> {
        let host = call.host;
        host.require(requester(&call), Permissions::MANAGE_CHANNELS)
            .await?;

        let name = channel_name(call.str_arg("name")?)?;

        let category = host
            .guild_id
            .create_channel(
                &host.ctx,
                serenity::CreateChannel::new(name).kind(ChannelType::Category),
            )
            .await
            .wrap_err("Couldn't create the category")?;

        tracing::info!("Created category {} ({})", category.name, category.id);

        Ok(json!({ "categoryId": category.id.to_string(), "name": category.name }))
    }
}

pub struct CreateChannel(ActionDeclaration);

impl Default for CreateChannel {
    fn default() -> Self {
        Self(
            ActionDeclaration::new(
                "createChannel",
                "Creates a text or voice channel, optionally inside a category.",
            )
            .with_parameters(json!({
                "type": "object",
                "properties": {
                    "name": { "type": "string", "description": "Name of the channel, e.g. \"help\"" },
                    "type": { "type": "string", "enum": ["text", "voice"], "description": "Defaults to text" },
                    "categoryId": { "type": "string", "description": "Id of the parent category" },
                    "topic": { "type": "string", "description": "Topic of a text channel" },
                },
                "required": ["name"],
            }))
            .with_response(json!({
                "type": "object",
                "properties": {
                    "channelId": { "type": "string" },
                    "name": { "type": "string" },
                },
            })),
        )
    }
}

#[async_trait]
impl Action<DiscordHost> for CreateChannel {
    fn declaration(&self) -> &ActionDeclaration {
        &self.0
    }

    async fn call(&self, call: ActionCall<'_, DiscordHost>) -> Result<Value> {
        let host = call.host;
        host.require(requester(&call), Permissions::MANAGE_CHANNELS)
            .await?;

        let name = channel_name(call.str_arg("name")?)?;
        let kind = match call.opt_str_arg("type").unwrap_or("text") {
            "text" => ChannelType::Text,
            "voice" => ChannelType::Voice,
            other => bail!("Unsupported channel type `{other}`, use text or voice"),
        };

        let mut builder = serenity::CreateChannel::new(name).kind(kind);

        if let Some(category_id) = call.opt_id_arg("categoryId") {
            let category = host.guild_channel(ChannelId::new(category_id)).await?;
            if category.kind != ChannelType::Category {
                bail!("<#{category_id}> is not a category");
            }
            builder = builder.category(category.id);
        }

        if let (ChannelType::Text, Some(topic)) = (kind, call.opt_str_arg("topic")) {
            builder = builder.topic(topic);
        }

        let channel = host
            .guild_id
            .create_channel(&host.ctx, builder)
            .await
            .wrap_err("Couldn't create the channel")?;

        tracing::info!("Created channel {} ({})", channel.name, channel.id);

        Ok(json!({ "channelId": channel.id.to_string(), "name": channel.name }))
    }
}

pub struct RenameChannel(ActionDeclaration);

impl Default for RenameChannel {
    fn default() -> Self {
        Self(
            ActionDeclaration::new("renameChannel", "Renames a channel or category.")
                .with_parameters(json!({
                    "type": "object",
                    "properties": {
                        "channelId": { "type": "string" },
                        "name": { "type": "string", "description": "The new name" },
                    },
                    "required": ["channelId", "name"],
                }))
                .with_response(json!({
                    "type": "object",
                    "properties": {
                        "channelId": { "type": "string" },
                        "name": { "type": "string" },
                    },
                })),
        )
    }
}

#[async_trait]
impl Action<DiscordHost> for RenameChannel {
    fn declaration(&self) -> &ActionDeclaration {
        &self.0
    }

    async fn call(&self, call: ActionCall<'_, DiscordHost>) -> Result<Value> {
        let host = call.host;
        host.require(requester(&call), Permissions::MANAGE_CHANNELS)
            .await?;

        let name = channel_name(call.str_arg("name")?)?;
        let mut channel = host
            .guild_channel(ChannelId::new(call.id_arg("channelId")?))
            .await?;

        channel
            .edit(&host.ctx, serenity::EditChannel::new().name(name))
            .await
            .wrap_err("Couldn't rename the channel")?;

        Ok(json!({ "channelId": channel.id.to_string(), "name": channel.name }))
    }
}

pub struct DeleteChannel(ActionDeclaration);

impl Default for DeleteChannel {
    fn default() -> Self {
        Self(
            ActionDeclaration::new(
                "deleteChannel",
                "Deletes a channel or an empty category. This can't be undone.",
            )
            .with_parameters(json!({
                "type": "object",
                "properties": {
                    "channelId": { "type": "string" },
                },
                "required": ["channelId"],
            }))
            .with_response(json!({
                "type": "object",
                "properties": {
                    "channelId": { "type": "string" },
                    "name": { "type": "string" },
                },
            })),
        )
    }
}

#[async_trait]
impl Action<DiscordHost> for DeleteChannel {
    fn declaration(&self) -> &ActionDeclaration {
        &self.0
    }

    async fn call(&self, call: ActionCall<'_, DiscordHost>) -> Result<Value> {
        let host = call.host;
        host.require(requester(&call), Permissions::MANAGE_CHANNELS)
            .await?;

        let channel = host
            .guild_channel(ChannelId::new(call.id_arg("channelId")?))
            .await?;

        if channel.id.get() == call.channel_id {
            bail!("I won't delete the channel we're talking in");
        }

        channel
            .delete(&host.ctx)
            .await
            .wrap_err("Couldn't delete the channel")?;

        tracing::info!("Deleted channel {} ({})", channel.name, channel.id);

        Ok(json!({ "channelId": channel.id.to_string(), "name": channel.name }))
    }
}

pub struct FindChannel(ActionDeclaration);

impl Default for FindChannel {
    fn default() -> Self {
        Self(
            ActionDeclaration::new(
                "findChannel",
                "Looks up an existing channel or category by name to get its id.",
            )
            .with_parameters(json!({
                "type": "object",
                "properties": {
                    "name": { "type": "string" },
                },
                "required": ["name"],
            }))
            .with_response(json!({
                "type": "object",
                "properties": {
                    "channelId": { "type": "string" },
                    "name": { "type": "string" },
                    "kind": { "type": "string" },
                },
            })),
        )
    }
}

#[async_trait]
impl Action<DiscordHost> for FindChannel {
    fn declaration(&self) -> &ActionDeclaration {
        &self.0
    }

    async fn call(&self, call: ActionCall<'_, DiscordHost>) -> Result<Value> {
        let host = call.host;
        let wanted = normalize_channel_name(call.str_arg("name")?);

        let channels = host
            .guild_id
            .channels(&host.ctx)
            .await
            .wrap_err("Couldn't list the channels")?;

        let Some(channel) = channels
            .values()
            .find(|channel| normalize_channel_name(&channel.name) == wanted)
        else {
            bail!("There is no channel called `{wanted}`");
        };

        Ok(json!({
            "channelId": channel.id.to_string(),
            "name": channel.name,
            "kind": channel.kind.name(),
        }))
    }
}
