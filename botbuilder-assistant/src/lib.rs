//! Natural-language requests in, a sequence of side-effecting actions out.
//!
//! A [`Planner`] turns the request into an ordered list of invocations in a
//! single round-trip, the [`Assistant`] runs them one by one (substituting
//! placeholders that point at earlier results) and reduces the results to the
//! message shown to the user.

mod action;
mod error;
pub mod gemini;
pub mod placeholder;
mod planner;
mod orchestrator;
mod registry;
pub mod schema;
mod types;

pub use action::{Action, ActionCall, RESPONSE_ACTION, ResponseAction};
pub use error::AssistantError;
pub use gemini::{GeminiConfig, GeminiPlanner};
pub use orchestrator::{Assistant, AssistantSettings, reduce};
pub use planner::{PlanRequest, Planner, USES_PREVIOUS_RESULTS, system_instruction};
pub use registry::{ActionRegistry, ActionRegistryBuilder};
pub use types::{ActionDeclaration, ActionInvocation, ActionResult, Plan};

// Handlers build their schemas with `json!` and return `Value`s.
pub use serde_json;
