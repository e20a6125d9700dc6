use crate::data::PoiseContext;
use color_eyre::eyre::Result;
use poise::builtins::register_application_commands_buttons;

/// Buttons to register or remove the slash commands, for the bot owners
#[poise::command(prefix_command, owners_only, hide_in_help)]
pub async fn register(ctx: PoiseContext<'_>) -> Result<()> {
    tracing::info!("{} opened the command registration", ctx.author().name);

    register_application_commands_buttons(ctx).await?;

    Ok(())
}
