use crate::{
    action::RESPONSE_ACTION,
    error::AssistantError,
    types::{ActionDeclaration, Plan},
};
use async_trait::async_trait;

/// Argument the planner sets on an invocation whose arguments contain placeholders.
pub const USES_PREVIOUS_RESULTS: &str = "usePreviousResults";

/// Input for a single planning round-trip.
#[derive(Debug, Clone, Copy)]
pub struct PlanRequest<'a> {
    pub query: &'a str,
    pub declarations: &'a [&'a ActionDeclaration],
    pub system_instruction: &'a str,
}

/// Turns a request into a fixed, ordered plan in one call.
///
/// The plan is never revised once execution starts, later steps only get to
/// see earlier results through placeholders.
#[async_trait]
pub trait Planner: Send + Sync {
    async fn plan(&self, request: PlanRequest<'_>) -> Result<Plan, AssistantError>;
}

/// The rules the planning model has to follow, prefixed with the bot's persona.
pub fn system_instruction(persona: &str) -> String {
    format!(
        "{persona}

You can act on the Discord server by calling the provided functions.
- Plan every call you need up front, in the order they must run. They run one after another, never in parallel.
- When a value comes from the result of an earlier call in this same plan, pass the string \
`<functionName>::<dataPath>::<callIndex>` instead of the value, where callIndex is the 0-based position of that \
earlier call in your plan and dataPath is a dotted path into its result (for example `createCategory::data.categoryId::0`). \
Set `{USES_PREVIOUS_RESULTS}` to true on every call that uses such a reference.
- Never reference a call that comes later in the plan.
- Finish with exactly one call to `{RESPONSE_ACTION}` that tells the user what was done.
- If the request needs no action at all, just answer in plain text without calling any function.
- Discord ids are strings of digits. Mentions like <@123> or <#456> contain the id."
    )
}
