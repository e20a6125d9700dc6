use crate::types::{ActionDeclaration, ActionResult};
use async_trait::async_trait;
use color_eyre::eyre::{OptionExt, Result};
use serde_json::{Map, Value, json};

/// Name of the built-in action the planner uses to phrase its final answer.
pub const RESPONSE_ACTION: &str = "response";

/// Everything a handler gets to see for one invocation.
pub struct ActionCall<'a, H> {
    /// Whatever the host application needs to perform side effects.
    pub host: &'a H,
    pub channel_id: u64,
    /// The user that made the request.
    pub user_id: u64,
    pub prior_results: &'a [ActionResult],
    /// Fully literal arguments, placeholders already resolved.
    pub arguments: Map<String, Value>,
}

impl<H> ActionCall<'_, H> {
    pub fn str_arg(&self, name: &str) -> Result<&str> {
        self.arguments
            .get(name)
            .and_then(Value::as_str)
            .ok_or_eyre(format!("Missing text argument `{name}`"))
    }

    pub fn opt_str_arg(&self, name: &str) -> Option<&str> {
        self.arguments
            .get(name)
            .and_then(Value::as_str)
            .filter(|value| !value.is_empty())
    }

    /// Discord ids arrive as strings most of the time, but the model sometimes
    /// sends bare numbers.
    pub fn id_arg(&self, name: &str) -> Result<u64> {
        self.opt_id_arg(name)
            .ok_or_eyre(format!("Missing or malformed id `{name}`"))
    }

    /// Zero is never a valid id and is treated as missing.
    pub fn opt_id_arg(&self, name: &str) -> Option<u64> {
        let id = match self.arguments.get(name)? {
            Value::String(value) => value
                .trim()
                .trim_start_matches("<#")
                .trim_start_matches("<@&")
                .trim_start_matches("<@")
                .trim_start_matches('!')
                .trim_end_matches('>')
                .parse()
                .ok(),
            Value::Number(value) => value.as_u64(),
            _ => None,
        }?;

        (id != 0).then_some(id)
    }

    pub fn opt_i64_arg(&self, name: &str) -> Option<i64> {
        match self.arguments.get(name)? {
            Value::Number(value) => value
                .as_i64()
                .or_else(|| value.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
            Value::String(value) => value.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn opt_bool_arg(&self, name: &str) -> Option<bool> {
        self.arguments.get(name).and_then(Value::as_bool)
    }
}

/// A capability the assistant can invoke.
///
/// Handlers report expected failures (permissions, bad input) as `Err`; the
/// orchestrator turns that into an unsuccessful result and stops the run.
#[async_trait]
pub trait Action<H>: Send + Sync {
    fn declaration(&self) -> &ActionDeclaration;

    async fn call(&self, call: ActionCall<'_, H>) -> Result<Value>;
}

/// Terminal action that carries the message shown to the user.
pub struct ResponseAction {
    declaration: ActionDeclaration,
}

impl Default for ResponseAction {
    fn default() -> Self {
        Self {
            declaration: ActionDeclaration::new(
                RESPONSE_ACTION,
                "Sends the final message to the user. Call this last, exactly once, \
                 to confirm what was done or to answer the request.",
            )
            .with_parameters(json!({
                "type": "object",
                "properties": {
                    "responseMessage": {
                        "type": "string",
                        "description": "The message shown to the user, e.g. \"Created the category Support.\"",
                    },
                },
                "required": ["responseMessage"],
            }))
            .with_response(json!({
                "type": "object",
                "properties": { "responseMessage": { "type": "string" } },
            })),
        }
    }
}

#[async_trait]
impl<H: Sync> Action<H> for ResponseAction {
    fn declaration(&self) -> &ActionDeclaration {
        &self.declaration
    }

    async fn call(&self, call: ActionCall<'_, H>) -> Result<Value> {
        let message = call.str_arg("responseMessage")?;

        Ok(json!({ "responseMessage": message }))
    }
}
