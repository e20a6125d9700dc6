use data::PoiseContext;
use poise::serenity_prelude::{Cache, CacheHttp, Http};
use std::sync::Arc;

pub mod actions;
pub mod commands;
pub mod config;
pub mod cooldown;
pub mod data;
pub mod event_handler;
pub mod host;

/// Cache and http handles that can outlive the event or command they came from.
pub struct CloneableCtx(Arc<Cache>, Arc<Http>);

impl From<&PoiseContext<'_>> for CloneableCtx {
    fn from(ctx: &PoiseContext<'_>) -> Self {
        Self(
            Arc::clone(&ctx.serenity_context().cache),
            Arc::clone(&ctx.serenity_context().http),
        )
    }
}

impl From<&poise::serenity_prelude::Context> for CloneableCtx {
    fn from(ctx: &poise::serenity_prelude::Context) -> Self {
        Self(Arc::clone(&ctx.cache), Arc::clone(&ctx.http))
    }
}

impl CacheHttp for CloneableCtx {
    fn http(&self) -> &Http {
        &self.1
    }

    fn cache(&self) -> Option<&Arc<Cache>> {
        Some(&self.0)
    }
}

impl AsRef<Http> for CloneableCtx {
    fn as_ref(&self) -> &Http {
        &self.1
    }
}

impl Clone for CloneableCtx {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0), Arc::clone(&self.1))
    }
}
