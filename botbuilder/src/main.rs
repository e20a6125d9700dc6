use botbuilder_lib::{
    commands::{assistant::assistant, help::help, register::register},
    config,
    data::{RawAppState, State},
    event_handler::event_handler,
};
use clap::Parser;
use color_eyre::eyre::{Result, WrapErr};
use dotenvy::dotenv;
use poise::serenity_prelude as serenity;
use std::sync::Arc;
use tracing_subscriber::util::SubscriberInitExt;

/// The cli arguments for the bot
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Don't start the discord bot
    #[arg(short, long, default_value = "false")]
    pub dry_run: bool,

    /// Path to the config file
    #[arg(short, long, default_value_t = String::from("config.toml"))]
    pub config: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().wrap_err("Failed to load .env file. Add a file with `DISCORD_TOKEN=\"your token\"` and `GEMINI_API_KEY=\"your key\"` to the root directory of the repo.")?;
    color_eyre::install()?;

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .compact()
        .with_file(true)
        .with_line_number(true)
        .with_target(false)
        .finish()
        .init();

    let Args {
        dry_run,
        config: config_path,
    } = Args::parse();
    let token =
        std::env::var("DISCORD_TOKEN").wrap_err("Expected a discord token environment variable")?;
    let gemini_api_key = std::env::var("GEMINI_API_KEY")
        .wrap_err("Expected a gemini api key environment variable")?;
    let config =
        config::Config::create_from_file(&config_path).wrap_err("Failed to load config")?;

    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands: vec![help(), register(), assistant()],
            event_handler: |ctx, event, _framework, data| {
                Box::pin(event_handler(ctx, event, data.clone()))
            },
            on_error: |error| {
                async fn on_error(error: poise::FrameworkError<'_, State, color_eyre::eyre::Error>) {
                    tracing::error!("{:?}", error);
                }

                Box::pin(on_error(error))
            },
            ..Default::default()
        })
        .setup(|ctx, _ready, framework| {
            Box::pin(async move {
                poise::builtins::register_in_guild(
                    ctx,
                    &framework.options().commands,
                    serenity::GuildId::from(config.guild_id),
                )
                .await?;

                tracing::info!("Registered commands in guild {}", config.guild_id);

                Ok(Arc::new(RawAppState::new(
                    config,
                    config_path,
                    gemini_api_key,
                )?))
            })
        });

    let client = serenity::ClientBuilder::new(
        token,
        serenity::GatewayIntents::non_privileged()
            | serenity::GatewayIntents::MESSAGE_CONTENT
            | serenity::GatewayIntents::GUILD_MEMBERS
            | serenity::GatewayIntents::GUILD_MESSAGES,
    )
    .framework(framework.build())
    .await;

    if dry_run {
        println!("Bot setup worked, dry run enabled, exiting");
        return Ok(());
    }

    tracing::info!("Starting bot");

    client
        .wrap_err("Failed to start bot (serenity)")?
        .start()
        .await
        .wrap_err("Failed to start bot (startup)")
}
