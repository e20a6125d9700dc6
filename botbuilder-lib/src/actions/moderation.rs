use super::requester;
use crate::host::DiscordHost;
use async_trait::async_trait;
use botbuilder_assistant::{
    Action, ActionCall, ActionDeclaration,
    serde_json::{Value, json},
};
use color_eyre::eyre::{Result, bail};
use humantime::parse_duration;
use poise::serenity_prelude::{Permissions, UserId};
use std::time::Duration;

/// Discord refuses timeouts longer than this.
const MAX_TIMEOUT: Duration = Duration::from_secs(60 * 60 * 24 * 28);

fn parse_timeout(text: &str) -> Result<Duration> {
    if text.len() > 20 {
        bail!("`{text}` is not a reasonable duration");
    }

    let Ok(duration) = parse_duration(text.trim()) else {
        bail!("Invalid duration `{text}`, use something like '1h' or '3m'");
    };

    if duration > MAX_TIMEOUT {
        bail!("Discord doesn't allow timeouts longer than 28 days");
    }

    if duration < Duration::from_secs(1) {
        bail!("Timeouts must last at least a second");
    }

    Ok(duration)
}

pub struct TimeoutMember(ActionDeclaration);

impl Default for TimeoutMember {
    fn default() -> Self {
        Self(
            ActionDeclaration::new(
                "timeoutMember",
                "Times a member out so they can't talk for a while (at most 28 days).",
            )
            .with_parameters(json!({
                "type": "object",
                "properties": {
                    "userId": { "type": "string" },
                    "duration": { "type": "string", "description": "How long, e.g. \"10m\", \"1h\" or \"2d\"" },
                    "reason": { "type": "string", "description": "Shown in the audit log" },
                },
                "required": ["userId", "duration"],
            }))
            .with_response(json!({
                "type": "object",
                "properties": {
                    "userId": { "type": "string" },
                    "until": { "type": "string", "description": "RFC 3339 timestamp" },
                },
            })),
        )
    }
}

#[async_trait]
impl Action<DiscordHost> for TimeoutMember {
    fn declaration(&self) -> &ActionDeclaration {
        &self.0
    }

    async fn call(&self, call: ActionCall<'_, DiscordHost>) -> Result<Value> {
        let host = call.host;
        let moderator = requester(&call);
        host.require(moderator, Permissions::MODERATE_MEMBERS)
            .await?;

        let target = UserId::new(call.id_arg("userId")?);
        if target == moderator {
            bail!("I won't time out the person asking");
        }

        let duration = parse_timeout(call.str_arg("duration")?)?;

        let until = host
            .timeout(target, duration, call.opt_str_arg("reason"))
            .await?;

        tracing::info!("{} timed out {} until {}", moderator, target, until);

        Ok(json!({ "userId": target.to_string(), "until": until.to_rfc3339() }))
    }
}
