use crate::data::PoiseContext;
use botbuilder_assistant::{ActionDeclaration, RESPONSE_ACTION};
use color_eyre::eyre::Result;

const MAX_MESSAGE_LENGTH: usize = 2000;

fn help_message(help_text: Option<&str>, declarations: &[&ActionDeclaration]) -> String {
    let mut message = help_text
        .unwrap_or("Mention me or use /assistant and tell me what to do.")
        .to_owned();

    message.push_str("\n\n**What I can do:**");
    for declaration in declarations
        .iter()
        .filter(|declaration| declaration.name != RESPONSE_ACTION)
    {
        message.push_str(&format!(
            "\n- `{}`: {}",
            declaration.name, declaration.description
        ));
    }

    if let Some((cut, _)) = message.char_indices().nth(MAX_MESSAGE_LENGTH) {
        message.truncate(cut);
    }

    message
}

/// How to use the assistant and what it can do
#[poise::command(slash_command, prefix_command)]
pub async fn help(ctx: PoiseContext<'_>) -> Result<()> {
    let help_text = ctx.data().config.read().await.help_text.clone();
    let declarations = ctx.data().assistant.registry().declarations();

    ctx.say(help_message(help_text.as_deref().map(String::as_str), &declarations))
        .await?;

    Ok(())
}
