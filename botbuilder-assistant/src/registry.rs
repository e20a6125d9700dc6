use crate::{
    action::Action,
    error::AssistantError,
    types::{ActionDeclaration, ActionInvocation},
};
use std::collections::HashMap;

/// The set of actions available to every orchestration run.
///
/// Built once at startup and never mutated afterwards, so it can be shared
/// behind an `Arc` by any number of concurrent runs.
pub struct ActionRegistry<H> {
    actions: Vec<Box<dyn Action<H>>>,
    by_name: HashMap<String, usize>,
}

pub struct ActionRegistryBuilder<H> {
    actions: Vec<Box<dyn Action<H>>>,
}

impl<H> ActionRegistry<H> {
    pub fn builder() -> ActionRegistryBuilder<H> {
        ActionRegistryBuilder { actions: vec![] }
    }

    /// Declarations in registration order, as handed to the planner.
    pub fn declarations(&self) -> Vec<&ActionDeclaration> {
        self.actions
            .iter()
            .map(|action| action.declaration())
            .collect()
    }

    /// The handler an invocation refers to. A miss means the planner and the
    /// registry disagree, which is fatal for the run.
    pub fn resolve_handler(
        &self,
        invocation: &ActionInvocation,
    ) -> Result<&dyn Action<H>, AssistantError> {
        self.by_name
            .get(&invocation.action_name)
            .map(|&index| self.actions[index].as_ref())
            .ok_or_else(|| AssistantError::UnknownAction {
                name: invocation.action_name.clone(),
                index: invocation.sequence_index,
            })
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

impl<H> ActionRegistryBuilder<H> {
    pub fn register(mut self, action: impl Action<H> + 'static) -> Self {
        self.actions.push(Box::new(action));
        self
    }

    /// Fails when nothing was registered, the assistant can't do anything
    /// useful without at least one action.
    pub fn build(self) -> Result<ActionRegistry<H>, AssistantError> {
        if self.actions.is_empty() {
            return Err(AssistantError::EmptyRegistry);
        }

        let mut by_name = HashMap::with_capacity(self.actions.len());

        for (index, action) in self.actions.iter().enumerate() {
            let name = &action.declaration().name;
            if by_name.insert(name.clone(), index).is_some() {
                return Err(AssistantError::DuplicateAction(name.clone()));
            }
        }

        tracing::info!("Loaded {} assistant actions", self.actions.len());

        Ok(ActionRegistry {
            actions: self.actions,
            by_name,
        })
    }
}
