use super::requester;
use crate::host::DiscordHost;
use async_trait::async_trait;
use botbuilder_assistant::{
    Action, ActionCall, ActionDeclaration,
    serde_json::{Value, json},
};
use botbuilder_db::tickets::{Ticket, TicketsDb};
use color_eyre::eyre::{Result, WrapErr, bail};
use poise::serenity_prelude::{
    self as serenity, ChannelType, PermissionOverwrite, PermissionOverwriteType, Permissions,
};

const MAX_SUBJECT_LENGTH: usize = 1024;

/// Only the ticket's author and the bot can see a ticket channel.
fn ticket_overwrites(host: &DiscordHost, author: serenity::UserId) -> Vec<PermissionOverwrite> {
    let visible = Permissions::VIEW_CHANNEL | Permissions::SEND_MESSAGES;

    vec![
        PermissionOverwrite {
            allow: Permissions::empty(),
            deny: Permissions::VIEW_CHANNEL,
            kind: PermissionOverwriteType::Role(host.guild_id.everyone_role()),
        },
        PermissionOverwrite {
            allow: visible,
            deny: Permissions::empty(),
            kind: PermissionOverwriteType::Member(author),
        },
        PermissionOverwrite {
            allow: visible,
            deny: Permissions::empty(),
            kind: PermissionOverwriteType::Member(host.ctx.0.current_user().id),
        },
    ]
}

pub struct CreateTicket(ActionDeclaration);

impl Default for CreateTicket {
    fn default() -> Self {
        Self(
            ActionDeclaration::new(
                "createTicket",
                "Opens a private support ticket channel for the user asking. \
                 A user can only have one open ticket.",
            )
            .with_parameters(json!({
                "type": "object",
                "properties": {
                    "subject": { "type": "string", "description": "Short summary of the problem" },
                },
                "required": ["subject"],
            }))
            .with_response(json!({
                "type": "object",
                "properties": {
                    "ticketId": { "type": "string" },
                    "channelId": { "type": "string" },
                },
            })),
        )
    }
}

#[async_trait]
impl Action<DiscordHost> for CreateTicket {
    fn declaration(&self) -> &ActionDeclaration {
        &self.0
    }

    async fn call(&self, call: ActionCall<'_, DiscordHost>) -> Result<Value> {
        let host = call.host;
        let author = requester(&call);

        let subject = call.str_arg("subject")?.trim();
        if subject.is_empty() || subject.chars().count() > MAX_SUBJECT_LENGTH {
            bail!("Ticket subjects must be between 1 and {MAX_SUBJECT_LENGTH} characters");
        }

        let tickets = TicketsDb::new(&host.db)?;
        if let Some(existing) = tickets.open_for_user(host.guild_id, author)? {
            bail!(
                "You already have ticket #{} open in <#{}>",
                existing.id,
                existing.channel_id
            );
        }

        let id = tickets.next_id()?;

        let channel = host
            .guild_id
            .create_channel(
                &host.ctx,
                serenity::CreateChannel::new(format!("ticket-{id}"))
                    .kind(ChannelType::Text)
                    .topic(subject)
                    .permissions(ticket_overwrites(host, author)),
            )
            .await
            .wrap_err("Couldn't create the ticket channel")?;

        tickets.open(&Ticket {
            id,
            guild_id: host.guild_id.get(),
            channel_id: channel.id.get(),
            user_id: author.get(),
            subject: subject.to_owned(),
            created_at: chrono::Utc::now().timestamp(),
            open: true,
        })?;

        tracing::info!("Opened ticket #{} for {} in {}", id, author, channel.id);

        Ok(json!({ "ticketId": id.to_string(), "channelId": channel.id.to_string() }))
    }
}
