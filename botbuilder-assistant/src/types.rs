use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Static description of something the assistant is able to do.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionDeclaration {
    pub name: String,
    /// Shown to the planning model as-is.
    pub description: String,
    /// JSON-Schema-like object describing the accepted arguments.
    pub parameters: Value,
    /// JSON-Schema-like object describing `data` on success.
    pub response: Value,
}

impl ActionDeclaration {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters: serde_json::json!({ "type": "object", "properties": {} }),
            response: Value::Null,
        }
    }

    pub fn with_parameters(mut self, parameters: Value) -> Self {
        self.parameters = parameters;
        self
    }

    pub fn with_response(mut self, response: Value) -> Self {
        self.response = response;
        self
    }
}

/// One call proposed by the planner.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionInvocation {
    pub action_name: String,
    pub arguments: Map<String, Value>,
    /// Always equal to the position of the invocation in the plan.
    pub sequence_index: usize,
    /// Set when some argument is a placeholder into an earlier result.
    pub uses_previous_results: bool,
}

impl ActionInvocation {
    pub fn new(action_name: impl Into<String>, arguments: Map<String, Value>) -> Self {
        Self {
            action_name: action_name.into(),
            arguments,
            sequence_index: 0,
            uses_previous_results: false,
        }
    }

    pub fn using_previous_results(mut self) -> Self {
        self.uses_previous_results = true;
        self
    }
}

/// Outcome of a single executed invocation.
///
/// Placeholders walk the serialized form, which is why `data.foo` is the
/// usual shape of a data path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionResult {
    pub function_name: String,
    pub success: bool,
    pub data: Value,
    pub call_index: usize,
}

impl ActionResult {
    pub fn succeeded(invocation: &ActionInvocation, data: Value) -> Self {
        Self {
            function_name: invocation.action_name.clone(),
            success: true,
            data,
            call_index: invocation.sequence_index,
        }
    }

    pub fn failed(invocation: &ActionInvocation, message: impl Into<String>) -> Self {
        Self {
            function_name: invocation.action_name.clone(),
            success: false,
            data: Value::String(message.into()),
            call_index: invocation.sequence_index,
        }
    }
}

/// What the planner decided to do with a request.
#[derive(Debug, Clone, PartialEq)]
pub enum Plan {
    /// No actions, just answer with this text.
    Reply(String),
    Invocations(Vec<ActionInvocation>),
}

impl Plan {
    /// Builds an invocation plan, stamping each invocation with its position.
    pub fn invocations(invocations: impl IntoIterator<Item = ActionInvocation>) -> Self {
        Plan::Invocations(
            invocations
                .into_iter()
                .enumerate()
                .map(|(index, mut invocation)| {
                    invocation.sequence_index = index;
                    invocation
                })
                .collect(),
        )
    }
}
