use crate::{CloneableCtx, data::PoiseContext, data::State, host::DiscordHost};
use botbuilder_assistant::AssistantError;
use color_eyre::eyre::{OptionExt, Result};
use poise::{
    CreateReply,
    serenity_prelude::{self as serenity, ChannelId, GuildId, UserId},
};
use std::time::Duration;

/// A deferred interaction needs an answer even when the plan had none.
const DONE_WITHOUT_RESPONSE: &str = "Done.";

/// Discord limits embed titles to 256 characters.
const MAX_TITLE_LENGTH: usize = 256;

/// Starts the user's cooldown window, or tells them how long to wait.
pub async fn check_cooldown(state: &State, user_id: UserId) -> Result<(), String> {
    let cooldown = state
        .config
        .read()
        .await
        .assistant
        .cooldown
        .to_std()
        .unwrap_or(Duration::ZERO);

    state
        .cooldowns
        .try_start(user_id, cooldown)
        .map_err(|remaining| {
            format!(
                "Please wait {} more second(s) before asking again",
                remaining.as_secs().max(1)
            )
        })
}

/// Runs one request through the assistant and turns the outcome into the
/// text shown to the user, if there is any.
pub async fn ask(
    state: &State,
    ctx: impl Into<CloneableCtx>,
    guild_id: GuildId,
    channel_id: ChannelId,
    user_id: UserId,
    query: &str,
) -> Option<String> {
    let host = DiscordHost::new(ctx, guild_id, state.db.clone());

    let outcome = state
        .assistant
        .run(&host, channel_id.get(), user_id.get(), query)
        .await;

    reply_text(outcome)
}

fn reply_text(outcome: Result<Option<String>, AssistantError>) -> Option<String> {
    match outcome {
        Ok(message) => message,
        Err(e) => {
            tracing::warn!("Assistant run failed: {}", e);
            Some(format!("⚠️ {e}"))
        }
    }
}

fn embed_title(asker: &str, prompt: &str) -> String {
    let mut title = format!("{} asked, \"{}\"", asker, prompt);

    if let Some((cut, _)) = title.char_indices().nth(MAX_TITLE_LENGTH) {
        title.truncate(cut);
    }

    title
}

/// Ask the assistant to do something on this server
#[poise::command(slash_command, guild_only)]
pub async fn assistant(
    ctx: PoiseContext<'_>,
    #[description = "What should be done?"] prompt: String,
) -> Result<()> {
    let guild_id = ctx.guild_id().ok_or_eyre("Couldn't get guild id")?;
    let author = ctx.author();

    if let Err(notice) = check_cooldown(ctx.data(), author.id).await {
        ctx.send(CreateReply::default().ephemeral(true).content(notice))
            .await?;
        return Ok(());
    }

    ctx.defer().await?;

    let shown_username = match author.nick_in(&ctx, guild_id).await {
        Some(nickname) => format!("{} ({})", nickname, author.name),
        None => author.name.clone(),
    };

    let reply = ask(
        ctx.data(),
        &ctx,
        guild_id,
        ctx.channel_id(),
        author.id,
        &prompt,
    )
    .await;

    ctx.send(
        CreateReply::default()
            .embed(
                serenity::CreateEmbed::new()
                    .title(embed_title(&shown_username, &prompt))
                    .description(reply.unwrap_or_else(|| DONE_WITHOUT_RESPONSE.to_owned())),
            )
            .reply(true),
    )
    .await?;

    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn titles_are_cut_on_character_boundaries() {
        assert_eq!(embed_title("ada", "hi"), "ada asked, \"hi\"");

        let long = embed_title("ada", &"é".repeat(300));
        assert_eq!(long.chars().count(), MAX_TITLE_LENGTH);
        assert!(long.starts_with("ada asked, \"é"));
    }

    #[test]
    fn outcomes_become_replies() {
        assert_eq!(
            reply_text(Ok(Some("Made it".to_owned()))).as_deref(),
            Some("Made it")
        );
        assert_eq!(reply_text(Ok(None)), None);
        assert_eq!(
            reply_text(Err(AssistantError::Handler {
                action: "createChannel".to_owned(),
                index: 0,
                message: "You need the Manage Channels permission to do that".to_owned(),
            }))
            .as_deref(),
            Some("⚠️ You need the Manage Channels permission to do that")
        );
    }
}
