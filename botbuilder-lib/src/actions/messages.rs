use super::requester;
use crate::host::DiscordHost;
use async_trait::async_trait;
use botbuilder_assistant::{
    Action, ActionCall, ActionDeclaration,
    serde_json::{Value, json},
};
use color_eyre::eyre::{Result, WrapErr, bail};
use poise::serenity_prelude::{self as serenity, ChannelId, Permissions};

const MAX_MESSAGE_LENGTH: usize = 2000;

pub struct SendMessage(ActionDeclaration);

impl Default for SendMessage {
    fn default() -> Self {
        Self(
            ActionDeclaration::new(
                "sendMessage",
                "Posts a message as the bot. Use `response` instead to answer the user.",
            )
            .with_parameters(json!({
                "type": "object",
                "properties": {
                    "content": { "type": "string" },
                    "channelId": { "type": "string", "description": "Defaults to the current channel" },
                },
                "required": ["content"],
            }))
            .with_response(json!({
                "type": "object",
                "properties": {
                    "messageId": { "type": "string" },
                    "channelId": { "type": "string" },
                },
            })),
        )
    }
}

#[async_trait]
impl Action<DiscordHost> for SendMessage {
    fn declaration(&self) -> &ActionDeclaration {
        &self.0
    }

    async fn call(&self, call: ActionCall<'_, DiscordHost>) -> Result<Value> {
        let host = call.host;
        host.require(requester(&call), Permissions::SEND_MESSAGES)
            .await?;

        let content = call.str_arg("content")?;
        if content.trim().is_empty() {
            bail!("Can't send an empty message");
        }
        if content.chars().count() > MAX_MESSAGE_LENGTH {
            bail!("Messages can be at most {MAX_MESSAGE_LENGTH} characters long");
        }

        let channel_id = ChannelId::new(call.opt_id_arg("channelId").unwrap_or(call.channel_id));
        let channel = host.guild_channel(channel_id).await?;

        let message = channel
            .send_message(&host.ctx, serenity::CreateMessage::new().content(content))
            .await
            .wrap_err_with(|| format!("Couldn't send a message in <#{channel_id}>"))?;

        Ok(json!({
            "messageId": message.id.to_string(),
            "channelId": channel.id.to_string(),
        }))
    }
}
