use crate::{
    action::{ActionCall, RESPONSE_ACTION},
    error::AssistantError,
    placeholder::resolve_arguments,
    planner::{PlanRequest, Planner, system_instruction},
    registry::ActionRegistry,
    schema::validate_arguments,
    types::{ActionInvocation, ActionResult, Plan},
};
use serde_json::Value;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct AssistantSettings {
    /// Prepended to the planning rules.
    pub persona: String,
    /// Plans with more invocations than this are refused before anything runs.
    pub max_invocations: usize,
}

impl Default for AssistantSettings {
    fn default() -> Self {
        Self {
            persona: "You are BotBuilder, a helpful Discord assistant. Keep answers short.".to_owned(),
            max_invocations: 16,
        }
    }
}

/// Turns a natural-language request into a sequence of actions and runs them.
///
/// Holds no per-request state, one instance serves every run.
pub struct Assistant<P, H> {
    planner: P,
    registry: Arc<ActionRegistry<H>>,
    settings: AssistantSettings,
    system_instruction: String,
}

impl<P: Planner, H: Sync> Assistant<P, H> {
    pub fn new(planner: P, registry: Arc<ActionRegistry<H>>, settings: AssistantSettings) -> Self {
        let system_instruction = system_instruction(&settings.persona);

        Self {
            planner,
            registry,
            settings,
            system_instruction,
        }
    }

    pub fn registry(&self) -> &ActionRegistry<H> {
        &self.registry
    }

    /// Runs one request end to end.
    ///
    /// Returns the message for the user, or `None` when actions ran but none
    /// of them was the `response` action.
    pub async fn run(
        &self,
        host: &H,
        channel_id: u64,
        user_id: u64,
        query: &str,
    ) -> Result<Option<String>, AssistantError> {
        tracing::info!("Assistant run for user {} in {}: {:?}", user_id, channel_id, query);

        let declarations = self.registry.declarations();
        let plan = self
            .planner
            .plan(PlanRequest {
                query,
                declarations: &declarations,
                system_instruction: &self.system_instruction,
            })
            .await?;

        let invocations = match plan {
            Plan::Reply(text) => {
                tracing::debug!("Planner answered directly");
                return Ok(Some(text));
            }
            Plan::Invocations(invocations) => invocations,
        };

        self.check_plan(&invocations)?;

        let results = self
            .execute(host, channel_id, user_id, &invocations)
            .await?;

        tracing::info!("Assistant run finished, {} actions executed", results.len());

        Ok(reduce(&results))
    }

    /// Rejects plans that could never finish, before anything has side effects.
    fn check_plan(&self, invocations: &[ActionInvocation]) -> Result<(), AssistantError> {
        if invocations.len() > self.settings.max_invocations {
            return Err(AssistantError::planning(format!(
                "The plan has {} steps, at most {} are allowed",
                invocations.len(),
                self.settings.max_invocations
            )));
        }

        for (index, invocation) in invocations.iter().enumerate() {
            if invocation.sequence_index != index {
                return Err(AssistantError::planning(format!(
                    "Invocation `{}` is out of sequence ({} at position {})",
                    invocation.action_name, invocation.sequence_index, index
                )));
            }

            self.registry.resolve_handler(invocation)?;
        }

        Ok(())
    }

    /// Executes the invocations strictly one after another, stopping at the
    /// first failure. Nothing that already ran is undone.
    async fn execute(
        &self,
        host: &H,
        channel_id: u64,
        user_id: u64,
        invocations: &[ActionInvocation],
    ) -> Result<Vec<ActionResult>, AssistantError> {
        let mut results: Vec<ActionResult> = Vec::with_capacity(invocations.len());

        for invocation in invocations {
            let name = &invocation.action_name;

            let arguments = if invocation.uses_previous_results {
                resolve_arguments(&invocation.arguments, &results).map_err(|e| {
                    AssistantError::Placeholder {
                        action: name.clone(),
                        reference: e.reference,
                        reason: e.reason,
                    }
                })?
            } else {
                invocation.arguments.clone()
            };

            let handler = self.registry.resolve_handler(invocation)?;

            validate_arguments(&handler.declaration().parameters, &arguments).map_err(|reason| {
                AssistantError::InvalidArguments {
                    action: name.clone(),
                    reason,
                }
            })?;

            tracing::debug!("Running `{}` ({})", name, invocation.sequence_index);

            let outcome = handler
                .call(ActionCall {
                    host,
                    channel_id,
                    user_id,
                    prior_results: &results,
                    arguments,
                })
                .await;

            let result = match outcome {
                Ok(data) => ActionResult::succeeded(invocation, data),
                Err(report) => ActionResult::failed(invocation, report.to_string()),
            };

            if !result.success {
                tracing::warn!("`{}` failed: {}", name, result.data);

                return Err(AssistantError::Handler {
                    action: name.clone(),
                    index: invocation.sequence_index,
                    message: result.data.as_str().unwrap_or_default().to_owned(),
                });
            }

            results.push(result);
        }

        Ok(results)
    }
}

/// The user-facing message of a successful run: what the last `response`
/// action said, if any.
pub fn reduce(results: &[ActionResult]) -> Option<String> {
    results
        .iter()
        .rev()
        .find(|result| result.function_name == RESPONSE_ACTION)
        .and_then(|result| result.data.get("responseMessage"))
        .and_then(Value::as_str)
        .map(str::to_owned)
}
