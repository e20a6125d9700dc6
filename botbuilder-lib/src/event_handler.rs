use crate::{
    commands::assistant::{ask, check_cooldown},
    data::State,
};
use botbuilder_traits::ForwardRefToTracing;
use color_eyre::eyre::Result;
use poise::serenity_prelude::{self as serenity, Mentionable, UserId};

pub async fn event_handler(
    ctx: &serenity::Context,
    event: &serenity::FullEvent,
    data: State,
) -> Result<()> {
    match event {
        serenity::FullEvent::Message { new_message } => {
            let ctx = ctx.clone();
            let message = new_message.clone();

            // Planning takes a few seconds, don't hold up the event loop.
            tokio::spawn(async move {
                handle_mention(&ctx, data, &message).await.trace_err_ok();
            });
        }
        serenity::FullEvent::Ratelimit { data } => {
            tracing::warn!("Ratelimited: {:?}", data);
        }
        _ => {}
    };

    Ok(())
}

/// Strips every form of mention of the bot out of a message.
fn strip_mention(content: &str, bot_id: UserId) -> String {
    content
        .replace(&bot_id.mention().to_string(), "")
        .replace(&format!("<@!{bot_id}>"), "")
        .trim()
        .to_owned()
}

async fn handle_mention(
    ctx: &serenity::Context,
    data: State,
    message: &serenity::Message,
) -> Result<()> {
    let Some(guild_id) = message.guild_id else {
        return Ok(());
    };

    let bot_id = ctx.cache.current_user().id;

    if message.author.bot || !message.mentions_user_id(bot_id) {
        return Ok(());
    }

    if !data.config.read().await.assistant.respond_to_mentions {
        return Ok(());
    }

    let query = strip_mention(&message.content, bot_id);
    if query.is_empty() {
        return Ok(());
    }

    if let Err(notice) = check_cooldown(&data, message.author.id).await {
        message.reply(ctx, notice).await?;
        return Ok(());
    }

    tracing::info!("{} asked the assistant: {}", message.author.name, query);

    let typing = message.channel_id.start_typing(&ctx.http);
    let reply = ask(
        &data,
        ctx,
        guild_id,
        message.channel_id,
        message.author.id,
        &query,
    )
    .await;
    typing.stop();

    if let Some(reply) = reply {
        message.reply(ctx, reply).await?;
    }

    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn mentions_are_removed_from_the_query() {
        let bot = UserId::new(42);

        assert_eq!(
            strip_mention("<@42> make a channel called help", bot),
            "make a channel called help"
        );
        assert_eq!(strip_mention("hey <@!42>, what's my level?", bot), "hey , what's my level?");
        assert_eq!(strip_mention("<@42>", bot), "");
        assert_eq!(strip_mention("<@43> hi", bot), "<@43> hi");
    }
}
