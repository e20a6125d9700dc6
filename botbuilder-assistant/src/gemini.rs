//! Planner backed by Google's Gemini `generateContent` function calling.

use crate::{
    error::AssistantError,
    planner::{PlanRequest, Planner, USES_PREVIOUS_RESULTS},
    schema::strip_unsupported_fields,
    types::{ActionDeclaration, ActionInvocation, Plan},
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: String,
    /// e.g. `gemini-2.0-flash`
    pub model: String,
    pub endpoint: String,
    pub temperature: f32,
    pub timeout: Duration,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: "gemini-2.0-flash".to_owned(),
            endpoint: "https://generativelanguage.googleapis.com/v1beta".to_owned(),
            temperature: 0.2,
            timeout: Duration::from_secs(30),
        }
    }
}

pub struct GeminiPlanner {
    client: reqwest::Client,
    config: GeminiConfig,
}

impl GeminiPlanner {
    pub fn new(config: GeminiConfig) -> Result<Self, AssistantError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| AssistantError::planning(e.to_string()))?;

        Ok(Self { client, config })
    }

    fn url(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.config.endpoint.trim_end_matches('/'),
            self.config.model
        )
    }

    fn build_request(&self, request: &PlanRequest<'_>) -> GeminiRequest {
        let function_declarations = request
            .declarations
            .iter()
            .map(|declaration| function_declaration(declaration))
            .collect::<Vec<_>>();

        GeminiRequest {
            contents: vec![GeminiContent {
                role: Some("user".to_owned()),
                parts: vec![GeminiPart::Text {
                    text: request.query.to_owned(),
                }],
            }],
            system_instruction: Some(GeminiContent {
                role: None,
                parts: vec![GeminiPart::Text {
                    text: request.system_instruction.to_owned(),
                }],
            }),
            generation_config: GenerationConfig {
                temperature: self.config.temperature,
            },
            tools: (!function_declarations.is_empty()).then(|| {
                vec![GeminiTool {
                    function_declarations,
                }]
            }),
        }
    }
}

#[async_trait]
impl Planner for GeminiPlanner {
    async fn plan(&self, request: PlanRequest<'_>) -> Result<Plan, AssistantError> {
        let body = self.build_request(&request);

        let response = self
            .client
            .post(self.url())
            .header("x-goog-api-key", &self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| AssistantError::planning(format!("Gemini request failed: {e}")))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| AssistantError::planning(format!("Gemini response unreadable: {e}")))?;

        if !status.is_success() {
            let message = serde_json::from_str::<GeminiError>(&text)
                .map(|error| error.error.message)
                .unwrap_or(text);
            return Err(AssistantError::planning(format!(
                "Gemini returned {status}: {message}"
            )));
        }

        let parsed = serde_json::from_str::<GeminiResponse>(&text)
            .map_err(|e| AssistantError::planning(format!("Gemini response unparseable: {e}")))?;

        plan_from_response(parsed)
    }
}

/// The declaration as Gemini wants it: the opt-in placeholder flag is added to
/// the parameters and the response shape is described in prose, since the
/// model has to know it to write data paths.
fn function_declaration(declaration: &ActionDeclaration) -> FunctionDeclaration {
    let mut parameters = declaration.parameters.clone();

    if let Some(object) = parameters.as_object_mut() {
        object
            .entry("type")
            .or_insert_with(|| Value::String("object".to_owned()));

        let properties = object
            .entry("properties")
            .or_insert_with(|| Value::Object(Map::new()));

        if let Some(properties) = properties.as_object_mut() {
            properties.insert(
                USES_PREVIOUS_RESULTS.to_owned(),
                json!({
                    "type": "boolean",
                    "description": "True when any argument is a `<functionName>::<dataPath>::<callIndex>` reference to an earlier call's result.",
                }),
            );
        }
    }

    strip_unsupported_fields(&mut parameters);

    let description = if declaration.response.is_null() {
        declaration.description.clone()
    } else {
        format!(
            "{} On success the result is {{\"functionName\", \"success\", \"data\"}} where data matches: {}",
            declaration.description, declaration.response
        )
    };

    FunctionDeclaration {
        name: declaration.name.clone(),
        description,
        parameters,
    }
}

fn plan_from_response(response: GeminiResponse) -> Result<Plan, AssistantError> {
    let candidate = response
        .candidates
        .into_iter()
        .next()
        .ok_or_else(|| AssistantError::planning("Gemini returned no candidates"))?;

    let mut invocations = vec![];
    let mut text = String::new();

    for part in candidate.content.parts {
        match part {
            GeminiPart::FunctionCall { function_call } => {
                let mut arguments = match function_call.args {
                    Value::Object(arguments) => arguments,
                    Value::Null => Map::new(),
                    other => {
                        return Err(AssistantError::planning(format!(
                            "Arguments for `{}` are not an object: {other}",
                            function_call.name
                        )));
                    }
                };

                let uses_previous_results = arguments
                    .remove(USES_PREVIOUS_RESULTS)
                    .is_some_and(|flag| flag.as_bool().unwrap_or(false));

                invocations.push(ActionInvocation {
                    uses_previous_results,
                    ..ActionInvocation::new(function_call.name, arguments)
                });
            }
            GeminiPart::Text { text: part } => text.push_str(&part),
        }
    }

    if !invocations.is_empty() {
        return Ok(Plan::invocations(invocations));
    }

    let text = text.trim();
    if text.is_empty() {
        return Err(AssistantError::planning(format!(
            "Gemini returned neither text nor function calls (finish reason: {})",
            candidate.finish_reason.as_deref().unwrap_or("unknown")
        )));
    }

    Ok(Plan::Reply(text.to_owned()))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GeminiContent>,
    generation_config: GenerationConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<GeminiTool>>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(untagged)]
enum GeminiPart {
    Text {
        text: String,
    },
    FunctionCall {
        #[serde(rename = "functionCall")]
        function_call: FunctionCall,
    },
}

#[derive(Debug, Serialize, Deserialize)]
struct FunctionCall {
    name: String,
    #[serde(default)]
    args: Value,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    temperature: f32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiTool {
    function_declarations: Vec<FunctionDeclaration>,
}

#[derive(Debug, Serialize)]
struct FunctionDeclaration {
    name: String,
    description: String,
    parameters: Value,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: GeminiContent,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiError {
    error: GeminiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorDetail {
    message: String,
}

#[cfg(test)]
mod test {
    use super::*;

    fn parse(body: Value) -> Result<Plan, AssistantError> {
        plan_from_response(serde_json::from_value(body).unwrap())
    }

    #[test]
    fn function_calls_become_ordered_invocations() {
        let plan = parse(json!({
            "candidates": [{
                "content": {
                    "role": "model",
                    "parts": [
                        { "functionCall": { "name": "createCategory", "args": { "name": "Support" } } },
                        { "functionCall": { "name": "createChannel", "args": {
                            "name": "help",
                            "categoryId": "createCategory::data.categoryId::0",
                            "usePreviousResults": true,
                        } } },
                    ],
                },
                "finishReason": "STOP",
            }],
        }))
        .unwrap();

        let Plan::Invocations(invocations) = plan else {
            panic!("expected invocations, got {plan:?}");
        };

        assert_eq!(invocations.len(), 2);
        assert_eq!(invocations[0].action_name, "createCategory");
        assert_eq!(invocations[0].sequence_index, 0);
        assert!(!invocations[0].uses_previous_results);
        assert_eq!(invocations[1].sequence_index, 1);
        assert!(invocations[1].uses_previous_results);
        assert!(!invocations[1].arguments.contains_key(USES_PREVIOUS_RESULTS));
        assert_eq!(
            invocations[1].arguments["categoryId"],
            json!("createCategory::data.categoryId::0")
        );
    }

    #[test]
    fn text_only_answers_become_replies() {
        let plan = parse(json!({
            "candidates": [{
                "content": { "role": "model", "parts": [{ "text": "Hello " }, { "text": "there!" }] },
            }],
        }))
        .unwrap();

        assert_eq!(plan, Plan::Reply("Hello there!".to_owned()));
    }

    #[test]
    fn empty_answers_are_planning_errors() {
        assert!(matches!(
            parse(json!({ "candidates": [] })),
            Err(AssistantError::Planning(_))
        ));
        assert!(matches!(
            parse(json!({ "candidates": [{ "content": { "parts": [] }, "finishReason": "SAFETY" }] })),
            Err(AssistantError::Planning(message)) if message.contains("SAFETY")
        ));
    }

    #[test]
    fn declarations_carry_the_placeholder_flag_and_response_shape() {
        let declaration = ActionDeclaration::new("createCategory", "Creates a category.")
            .with_parameters(json!({
                "type": "object",
                "additionalProperties": false,
                "properties": { "name": { "type": "string" } },
                "required": ["name"],
            }))
            .with_response(json!({ "type": "object", "properties": { "categoryId": { "type": "string" } } }));

        let converted = function_declaration(&declaration);

        assert!(converted.parameters["properties"][USES_PREVIOUS_RESULTS].is_object());
        assert!(converted.parameters.get("additionalProperties").is_none());
        assert!(converted.description.starts_with("Creates a category."));
        assert!(converted.description.contains("categoryId"));
    }

    #[test]
    fn requests_only_send_tools_when_there_are_declarations() {
        let planner = GeminiPlanner::new(GeminiConfig::default()).unwrap();

        let request = planner.build_request(&PlanRequest {
            query: "hi",
            declarations: &[],
            system_instruction: "be nice",
        });

        let body = serde_json::to_value(&request).unwrap();
        assert!(body.get("tools").is_none());
        assert_eq!(body["systemInstruction"]["parts"][0]["text"], "be nice");
        assert_eq!(body["contents"][0]["role"], "user");
    }
}
