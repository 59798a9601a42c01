//! OpenRouter HTTP backend implementation
//!
//! OpenRouter exposes many models behind an OpenAI-compatible chat API,
//! including `tools` / `tool_calls` for function calling.

use crate::LlmError;
use crate::http_client::{HttpClient, HttpParams, resolve_params};
use crate::types::{LlmBackend, LlmInvocation, LlmResult, Message, Role, ToolCall, ToolDeclaration};
use archsmith_config::Config;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

/// Default OpenRouter API endpoint
const DEFAULT_BASE_URL: &str = "https://openrouter.ai/api/v1/chat/completions";

/// Environment variable holding the API key unless `api_key_env` says otherwise
pub const DEFAULT_OPENROUTER_KEY_ENV: &str = "OPENROUTER_API_KEY";

const DEFAULT_REFERER: &str = "https://github.com/archsmith/archsmith";

const DEFAULT_TITLE: &str = "archsmith";

#[derive(Clone)]
pub(crate) struct OpenRouterBackend {
    client: Arc<HttpClient>,
    base_url: String,
    api_key: String,
    default_model: String,
    default_params: HttpParams,
}

impl OpenRouterBackend {
    /// # Errors
    ///
    /// Returns `LlmError::Misconfiguration` if the HTTP client cannot be constructed
    pub fn new(
        api_key: String,
        base_url: Option<String>,
        default_model: String,
        default_params: HttpParams,
    ) -> Result<Self, LlmError> {
        let client = HttpClient::new()?;

        Ok(Self {
            client: Arc::new(client),
            base_url: base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            api_key,
            default_model,
            default_params,
        })
    }

    /// # Errors
    ///
    /// Returns `LlmError::Misconfiguration` if:
    /// - The API key environment variable is not set
    /// - No model is configured in `[llm.openrouter]`
    pub fn new_from_config(config: &Config) -> Result<Self, LlmError> {
        Self::new_from_config_with_env(config, |key| std::env::var(key).ok())
    }

    pub(crate) fn new_from_config_with_env<F>(config: &Config, env: F) -> Result<Self, LlmError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let section = config.llm.openrouter.as_ref();

        let api_key_env = section
            .and_then(|s| s.api_key_env.as_deref())
            .unwrap_or(DEFAULT_OPENROUTER_KEY_ENV);

        let api_key = env(api_key_env)
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                LlmError::Misconfiguration(format!(
                    "OpenRouter API key not found in environment variable '{api_key_env}'. \
                     Please set this variable or configure a different api_key_env in [llm.openrouter]."
                ))
            })?;

        let default_model = section.and_then(|s| s.model.clone()).ok_or_else(|| {
            LlmError::Misconfiguration(
                "OpenRouter model not specified in configuration. \
                 Please set [llm.openrouter] model = \"model-name\" or pass --model."
                    .to_string(),
            )
        })?;

        let defaults = HttpParams::default();
        let default_params = HttpParams {
            max_tokens: section
                .and_then(|s| s.max_tokens)
                .unwrap_or(defaults.max_tokens),
            temperature: section
                .and_then(|s| s.temperature)
                .unwrap_or(defaults.temperature),
        };

        Self::new(
            api_key,
            section.and_then(|s| s.base_url.clone()),
            default_model,
            default_params,
        )
    }

    fn convert_messages(messages: &[Message]) -> Vec<OpenAiMessage> {
        messages
            .iter()
            .map(|msg| {
                let role = match msg.role {
                    Role::System => "system",
                    Role::User => "user",
                    Role::Assistant => "assistant",
                    Role::Tool => "tool",
                };
                let tool_calls = msg
                    .tool_calls
                    .iter()
                    .map(|call| OpenAiToolCall {
                        id: call.id.clone(),
                        kind: "function".to_string(),
                        function: OpenAiFunctionCall {
                            name: call.name.clone(),
                            arguments: call.arguments.to_string(),
                        },
                    })
                    .collect::<Vec<_>>();
                // Assistant turns that only call tools carry null content
                let content = if msg.role == Role::Assistant
                    && msg.content.is_empty()
                    && !tool_calls.is_empty()
                {
                    None
                } else {
                    Some(msg.content.clone())
                };
                OpenAiMessage {
                    role: role.to_string(),
                    content,
                    tool_calls,
                    tool_call_id: msg.tool_call_id.clone(),
                }
            })
            .collect()
    }

    fn convert_tools(tools: &[ToolDeclaration]) -> Vec<OpenAiTool> {
        tools
            .iter()
            .map(|t| OpenAiTool {
                kind: "function".to_string(),
                function: OpenAiFunction {
                    name: t.name.clone(),
                    description: t.description.clone(),
                    parameters: t.parameters.clone(),
                },
            })
            .collect()
    }
}

/// Turn the first choice into an [`LlmResult`].
fn parse_response(body: OpenRouterResponse, model: String) -> Result<LlmResult, LlmError> {
    let choice = body.choices.into_iter().next().ok_or_else(|| {
        LlmError::Transport("OpenRouter response missing choices[0]".to_string())
    })?;

    let tool_calls = choice
        .message
        .tool_calls
        .into_iter()
        .map(|call| ToolCall {
            id: call.id,
            name: call.function.name,
            // Keep unparseable arguments as a string so the caller can report them
            arguments: serde_json::from_str(&call.function.arguments)
                .unwrap_or(serde_json::Value::String(call.function.arguments)),
        })
        .collect::<Vec<_>>();

    let content = choice.message.content.unwrap_or_default();
    if content.is_empty() && tool_calls.is_empty() {
        return Err(LlmError::Transport(
            "OpenRouter response missing content in choices[0]".to_string(),
        ));
    }

    let mut result = LlmResult::new(content, "openrouter", model).with_tool_calls(tool_calls);
    result.finish_reason = choice.finish_reason;

    if let Some(usage) = body.usage {
        result = result.with_tokens(usage.prompt_tokens, usage.completion_tokens);
    }

    Ok(result)
}

#[async_trait]
impl LlmBackend for OpenRouterBackend {
    async fn invoke(&self, inv: LlmInvocation) -> Result<LlmResult, LlmError> {
        let (model, params) = resolve_params(&inv, &self.default_model, &self.default_params);

        debug!(
            provider = "openrouter",
            run_id = %inv.run_id,
            stage = %inv.stage,
            model = %model,
            max_tokens = params.max_tokens,
            temperature = params.temperature,
            tools = inv.tools.len(),
            timeout_secs = inv.timeout.as_secs(),
            "Invoking OpenRouter backend"
        );

        let request_body = OpenRouterRequest {
            model: model.clone(),
            messages: Self::convert_messages(&inv.messages),
            tools: Self::convert_tools(&inv.tools),
            max_tokens: params.max_tokens,
            temperature: params.temperature,
            stream: false,
        };

        let request = self
            .client
            .post(&self.base_url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("HTTP-Referer", DEFAULT_REFERER)
            .header("X-Title", DEFAULT_TITLE)
            .header("Content-Type", "application/json")
            .json(&request_body);

        let response = self
            .client
            .execute_with_retry(request, inv.timeout, "openrouter")
            .await?;

        let response_body: OpenRouterResponse = response.json().await.map_err(|e| {
            LlmError::Transport(format!("Failed to parse OpenRouter response: {e}"))
        })?;

        let result = parse_response(response_body, model)?;

        debug!(
            provider = "openrouter",
            tokens_input = ?result.tokens_input,
            tokens_output = ?result.tokens_output,
            tool_calls = result.tool_calls.len(),
            "OpenRouter invocation completed"
        );

        Ok(result)
    }
}

#[derive(Debug, Clone, Serialize)]
struct OpenAiMessage {
    role: String,
    content: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tool_calls: Vec<OpenAiToolCall>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct OpenAiToolCall {
    id: String,
    #[serde(rename = "type", default = "function_kind")]
    kind: String,
    function: OpenAiFunctionCall,
}

fn function_kind() -> String {
    "function".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct OpenAiFunctionCall {
    name: String,
    /// JSON-encoded arguments
    #[serde(default)]
    arguments: String,
}

#[derive(Debug, Clone, Serialize)]
struct OpenAiTool {
    #[serde(rename = "type")]
    kind: String,
    function: OpenAiFunction,
}

#[derive(Debug, Clone, Serialize)]
struct OpenAiFunction {
    name: String,
    description: String,
    parameters: serde_json::Value,
}

#[derive(Debug, Clone, Deserialize)]
struct OpenAiResponseMessage {
    content: Option<String>,
    #[serde(default)]
    tool_calls: Vec<OpenAiToolCall>,
}

#[derive(Debug, Clone, Serialize)]
struct OpenRouterRequest {
    model: String,
    messages: Vec<OpenAiMessage>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<OpenAiTool>,
    max_tokens: u32,
    temperature: f32,
    stream: bool,
}

#[derive(Debug, Clone, Deserialize)]
struct OpenRouterResponse {
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Debug, Clone, Deserialize)]
struct Choice {
    message: OpenAiResponseMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct Usage {
    prompt_tokens: u64,
    completion_tokens: u64,
}
