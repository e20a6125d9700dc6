use thiserror::Error;

/// Everything that can end an orchestration run early.
///
/// The `Display` output is what ends up in front of users, so `Handler`
/// forwards the handler's own message untouched.
#[derive(Debug, Error)]
pub enum AssistantError {
    /// The language backend was unreachable or answered with something unusable.
    #[error("Planning failed: {0}")]
    Planning(String),

    /// The plan named an action the registry doesn't know about.
    #[error("Unknown action `{name}` at position {index}")]
    UnknownAction { name: String, index: usize },

    /// A placeholder could not be resolved against the results produced so far.
    #[error("Could not resolve `{reference}` for `{action}`: {reason}")]
    Placeholder {
        action: String,
        reference: String,
        reason: String,
    },

    /// The (resolved) arguments don't fit the declared parameter schema.
    #[error("Invalid arguments for `{action}`: {reason}")]
    InvalidArguments { action: String, reason: String },

    /// The handler reported a failure.
    #[error("{message}")]
    Handler {
        action: String,
        index: usize,
        message: String,
    },

    #[error("No assistant actions were registered")]
    EmptyRegistry,

    #[error("Action `{0}` was registered twice")]
    DuplicateAction(String),
}

impl AssistantError {
    pub fn planning(message: impl Into<String>) -> Self {
        Self::Planning(message.into())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn handler_errors_display_only_the_message() {
        let error = AssistantError::Handler {
            action: "createChannel".to_owned(),
            index: 1,
            message: "You need the Manage Channels permission".to_owned(),
        };

        assert_eq!(error.to_string(), "You need the Manage Channels permission");
    }
}
