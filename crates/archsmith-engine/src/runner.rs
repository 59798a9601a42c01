//! Runs one task with one agent through the model's tool-calling loop.

use std::sync::Arc;
use std::time::Duration;

use archsmith_llm::{LlmBackend, LlmInvocation, LlmResult, Message, ToolCall, ToolDeclaration};
use archsmith_tools::Toolbox;
use archsmith_utils::error::StageError;
use async_trait::async_trait;
use serde_json::{Value, json};
use tracing::{debug, info, warn};

use crate::agents::AgentProfile;
use crate::tasks::TaskSpec;

/// User turn sent when the agent has used up its tool rounds.
const FINAL_ANSWER_NUDGE: &str = "You have used all available tool rounds. Do not call any more \
     tools. Reply now with your final answer as described in EXPECTED OUTPUT.";

/// Executes a task with an agent and returns the agent's final text.
///
/// The workflow depends only on this trait; tests substitute scripted runners.
#[async_trait]
pub trait AgentRunner: Send + Sync {
    async fn run_task(&self, agent: &AgentProfile, task: &TaskSpec) -> Result<String, StageError>;
}

/// [`AgentRunner`] backed by a model and a toolbox.
pub struct LlmAgentRunner {
    backend: Arc<dyn LlmBackend>,
    toolbox: Toolbox,
    timeout: Duration,
    max_rounds: u32,
}

impl LlmAgentRunner {
    pub fn new(
        backend: Arc<dyn LlmBackend>,
        toolbox: Toolbox,
        timeout: Duration,
        max_rounds: u32,
    ) -> Self {
        Self {
            backend,
            toolbox,
            timeout,
            max_rounds: max_rounds.max(1),
        }
    }

    /// Declarations for the tools bound to `agent` that the toolbox provides.
    fn declarations_for(&self, agent: &AgentProfile) -> Vec<ToolDeclaration> {
        agent
            .tools
            .iter()
            .filter_map(|name| self.toolbox.get(name))
            .map(|tool| ToolDeclaration {
                name: tool.name().to_string(),
                description: tool.description().to_string(),
                parameters: tool.parameters_schema(),
            })
            .collect()
    }

    /// Run one tool call. Problems come back as error payloads for the model.
    fn execute_call(&self, agent: &AgentProfile, call: &ToolCall) -> Value {
        if !agent.can_use(&call.name) {
            return tool_error(format!(
                "Tool '{}' is not available to the {}. Available tools: {}",
                call.name,
                agent.role,
                agent.tools.join(", ")
            ));
        }
        let Some(tool) = self.toolbox.get(&call.name) else {
            return tool_error(format!("Unknown tool '{}'", call.name));
        };
        if !call.arguments.is_object() {
            return tool_error(format!(
                "Arguments for '{}' must be a JSON object, got: {}",
                call.name, call.arguments
            ));
        }
        tool.invoke(&call.arguments)
    }

    async fn invoke(
        &self,
        task: &TaskSpec,
        messages: &[Message],
        tools: Vec<ToolDeclaration>,
    ) -> Result<LlmResult, StageError> {
        let invocation = LlmInvocation::new(
            task.run_id.as_str(),
            task.stage.as_str(),
            "",
            self.timeout,
            messages.to_vec(),
        )
        .with_tools(tools);

        self.backend
            .invoke(invocation)
            .await
            .map_err(|source| StageError::Llm {
                stage: task.stage.as_str().to_string(),
                source,
            })
    }
}

fn tool_error(message: String) -> Value {
    json!({ "success": false, "error": message })
}

/// Trimmed final reply. May be empty.
fn final_text(task: &TaskSpec, result: LlmResult) -> String {
    let text = result.raw_response.trim();
    if text.is_empty() {
        debug!(stage = task.stage.as_str(), "Agent returned an empty final answer");
    }
    text.to_string()
}

#[async_trait]
impl AgentRunner for LlmAgentRunner {
    async fn run_task(&self, agent: &AgentProfile, task: &TaskSpec) -> Result<String, StageError> {
        let tools = self.declarations_for(agent);
        let mut messages = vec![
            Message::system(agent.system_prompt()),
            Message::user(task.prompt()),
        ];

        for round in 1..=self.max_rounds {
            let result = self.invoke(task, &messages, tools.clone()).await?;
            if !result.has_tool_calls() {
                debug!(
                    stage = task.stage.as_str(),
                    round,
                    tokens_output = result.tokens_output,
                    "Agent finished"
                );
                return Ok(final_text(task, result));
            }

            let calls = result.tool_calls.clone();
            messages.push(Message::assistant_with_tool_calls(
                result.raw_response,
                calls.clone(),
            ));

            for call in &calls {
                let output = self.execute_call(agent, call);
                if output.get("success").and_then(Value::as_bool) == Some(false)
                    || output.get("valid_syntax").and_then(Value::as_bool) == Some(false)
                {
                    warn!(
                        stage = task.stage.as_str(),
                        tool = %call.name,
                        "Tool call reported a problem"
                    );
                } else {
                    debug!(stage = task.stage.as_str(), tool = %call.name, "Tool call succeeded");
                }
                messages.push(Message::tool_result(call, output.to_string()));
            }
        }

        info!(
            stage = task.stage.as_str(),
            max_rounds = self.max_rounds,
            "Tool rounds exhausted; requesting final answer"
        );
        messages.push(Message::user(FINAL_ANSWER_NUDGE));
        let result = self.invoke(task, &messages, Vec::new()).await?;
        Ok(final_text(task, result))
    }
}
