//! The actions the assistant can take on a Discord server.
//!
//! Every handler checks the requesting member's permissions itself and fails
//! with a message that can be shown to them as-is.

mod channels;
mod levels;
mod messages;
mod moderation;
mod roles;
mod tickets;

use crate::host::DiscordHost;
use botbuilder_assistant::{ActionCall, ActionRegistry, AssistantError, ResponseAction};
use poise::serenity_prelude::UserId;

pub use channels::{CreateCategory, CreateChannel, DeleteChannel, FindChannel, RenameChannel};
pub use levels::{AddExperience, GetUserLevel};
pub use messages::SendMessage;
pub use moderation::TimeoutMember;
pub use roles::{AddRole, CreateRole, RemoveRole};
pub use tickets::CreateTicket;

/// Every action, in the order they are presented to the planner.
pub fn registry() -> Result<ActionRegistry<DiscordHost>, AssistantError> {
    ActionRegistry::builder()
        .register(CreateCategory::default())
        .register(CreateChannel::default())
        .register(RenameChannel::default())
        .register(DeleteChannel::default())
        .register(FindChannel::default())
        .register(CreateRole::default())
        .register(AddRole::default())
        .register(RemoveRole::default())
        .register(TimeoutMember::default())
        .register(SendMessage::default())
        .register(AddExperience::default())
        .register(GetUserLevel::default())
        .register(CreateTicket::default())
        .register(ResponseAction::default())
        .build()
}

fn requester(call: &ActionCall<'_, DiscordHost>) -> UserId {
    UserId::new(call.user_id)
}

#[cfg(test)]
mod test {
    use super::*;
    use botbuilder_assistant::RESPONSE_ACTION;

    #[test]
    fn every_action_is_registered_once() {
        let registry = registry().unwrap();

        let names: Vec<_> = registry
            .declarations()
            .into_iter()
            .map(|declaration| declaration.name.as_str())
            .collect();

        assert_eq!(registry.len(), 14);
        assert_eq!(names.first(), Some(&"createCategory"));
        assert_eq!(names.last(), Some(&RESPONSE_ACTION));
        assert!(names.contains(&"createChannel"));
    }

    #[test]
    fn declarations_are_object_schemas() {
        let registry = registry().unwrap();

        for declaration in registry.declarations() {
            assert_eq!(
                declaration.parameters["type"], "object",
                "{} should take an object",
                declaration.name
            );
            assert!(
                !declaration.description.is_empty(),
                "{} needs a description",
                declaration.name
            );
            assert!(
                declaration.response.is_object(),
                "{} should describe its result",
                declaration.name
            );
        }
    }
}
