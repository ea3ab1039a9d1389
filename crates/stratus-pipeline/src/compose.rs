//! Pipeline composition.

use std::collections::{BTreeMap, BTreeSet};

use serde_json::{Value, json};
use stratus_function::{
    CompilerError, FunctionHandle, ResourceAttribute, ResourceGraphCompiler, Scope,
};

use crate::error::PipelineError;

/// Service integration used to invoke a function from a task state.
pub const LAMBDA_INVOKE_RESOURCE: &str = "arn:aws:states:::lambda:invoke";

/// Where a caught error is placed in the callback's input.
pub const CALLBACK_ERROR_PATH: &str = "$.error";

/// Built functions available to a pipeline, by step name.
#[derive(Debug, Clone, Default)]
pub struct PipelineSteps {
    steps: BTreeMap<String, FunctionHandle>,
}

impl PipelineSteps {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(
        &mut self,
        step: impl Into<String>,
        handle: FunctionHandle,
    ) -> Result<(), PipelineError> {
        let step = step.into();
        if self.steps.contains_key(&step) {
            return Err(PipelineError::DuplicateStep(step));
        }
        self.steps.insert(step, handle);
        Ok(())
    }

    pub fn with_step(
        mut self,
        step: impl Into<String>,
        handle: FunctionHandle,
    ) -> Result<Self, PipelineError> {
        self.insert(step, handle)?;
        Ok(self)
    }

    pub fn get(&self, step: &str) -> Option<&FunctionHandle> {
        self.steps.get(step)
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

/// One task of the workflow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskState {
    pub step: String,
    pub function: FunctionHandle,
    pub next: Option<String>,
    /// State entered when this task fails.
    pub catch: Option<String>,
}

impl TaskState {
    fn to_json(&self, placeholder: &str) -> Value {
        let mut state = json!({
            "Type": "Task",
            "Resource": LAMBDA_INVOKE_RESOURCE,
            "Parameters": {
                "FunctionName": format!("${{{}}}", placeholder),
                "Payload.$": "$",
            },
            "OutputPath": "$.Payload",
        });

        match &self.next {
            Some(next) => state["Next"] = json!(next),
            None => state["End"] = json!(true),
        }

        if let Some(catch) = &self.catch {
            state["Catch"] = json!([{
                "ErrorEquals": ["States.ALL"],
                "ResultPath": CALLBACK_ERROR_PATH,
                "Next": catch,
            }]);
        }

        state
    }
}

/// A composed workflow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowDefinition {
    pub name: String,
    pub start_at: String,
    /// Tasks in execution order, callback last.
    pub states: Vec<TaskState>,
    pub callback: String,
}

impl WorkflowDefinition {
    /// States Language document. Function addresses are left as
    /// `${placeholder}` references resolved by [`Self::substitutions`].
    pub fn to_states_json(&self) -> Value {
        let states: serde_json::Map<String, Value> = self
            .states
            .iter()
            .enumerate()
            .map(|(i, state)| (state.step.clone(), state.to_json(&placeholder(i))))
            .collect();

        json!({
            "Comment": self.name,
            "StartAt": self.start_at,
            "States": states,
        })
    }

    /// Placeholder name to function address.
    pub fn substitutions(&self) -> BTreeMap<String, &ResourceAttribute> {
        self.states
            .iter()
            .enumerate()
            .map(|(i, state)| (placeholder(i), &state.function.function_arn))
            .collect()
    }

    pub fn functions(&self) -> impl Iterator<Item = &FunctionHandle> {
        self.states.iter().map(|s| &s.function)
    }
}

fn placeholder(index: usize) -> String {
    format!("Function{}", index)
}

pub struct Pipeline;

impl Pipeline {
    /// Chain `order` so each step's payload feeds the next, and route any
    /// failure to `callback`.
    pub fn compose(
        name: &str,
        steps: &PipelineSteps,
        order: &[&str],
        callback: &str,
    ) -> Result<WorkflowDefinition, PipelineError> {
        let Some(first) = order.first() else {
            return Err(PipelineError::EmptyOrder(name.to_string()));
        };

        let callback_handle = steps
            .get(callback)
            .ok_or_else(|| PipelineError::MissingCallback(callback.to_string()))?;

        let mut seen = BTreeSet::new();
        for step in order {
            if *step == callback {
                return Err(PipelineError::CallbackInOrder(callback.to_string()));
            }
            if !seen.insert(*step) {
                return Err(PipelineError::DuplicateStep(step.to_string()));
            }
            if steps.get(step).is_none() {
                return Err(PipelineError::UnknownStep(step.to_string()));
            }
        }

        let mut states: Vec<TaskState> = Vec::with_capacity(order.len() + 1);
        for (i, step) in order.iter().enumerate() {
            let Some(function) = steps.get(step) else {
                return Err(PipelineError::UnknownStep(step.to_string()));
            };
            let next = order.get(i + 1).map(|s| s.to_string());
            states.push(TaskState {
                step: step.to_string(),
                function: function.clone(),
                next,
                catch: Some(callback.to_string()),
            });
        }
        states.push(TaskState {
            step: callback.to_string(),
            function: callback_handle.clone(),
            next: None,
            catch: None,
        });

        let unused = steps.len() - states.len();
        if unused > 0 {
            tracing::warn!(
                pipeline = name,
                unused,
                "Some mapped steps are not part of the pipeline"
            );
        }

        tracing::debug!(pipeline = name, steps = states.len(), "Composed pipeline");

        Ok(WorkflowDefinition {
            name: name.to_string(),
            start_at: first.to_string(),
            states,
            callback: callback.to_string(),
        })
    }
}

/// Handle on a materialized workflow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowHandle {
    pub state_machine_name: String,
    pub state_machine_arn: ResourceAttribute,
}

/// A compiler that can also materialize workflows.
pub trait WorkflowCompiler: ResourceGraphCompiler {
    fn materialize_workflow(
        &mut self,
        scope: &Scope,
        definition: &WorkflowDefinition,
    ) -> Result<WorkflowHandle, CompilerError>;
}
