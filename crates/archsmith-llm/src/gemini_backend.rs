//! Google Gemini HTTP backend
//!
//! Talks to the `generateContent` endpoint of the Generative Language API,
//! with function calling for agent tools.

use crate::LlmError;
use crate::http_client::{HttpClient, HttpParams, resolve_params};
use crate::types::{LlmBackend, LlmInvocation, LlmResult, Message, Role, ToolCall, ToolDeclaration};
use archsmith_config::Config;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

/// Default Generative Language API root
const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Model used when `[llm.gemini] model` is not set
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";

/// Environment variable holding the API key unless `api_key_env` says otherwise
pub const DEFAULT_GEMINI_KEY_ENV: &str = "GEMINI_API_KEY";

/// Where users obtain a key
const API_KEY_URL: &str = "https://aistudio.google.com/app/apikey";

#[derive(Clone)]
pub(crate) struct GeminiBackend {
    client: Arc<HttpClient>,
    base_url: String,
    api_key: String,
    default_model: String,
    default_params: HttpParams,
}

/// Strip the `gemini/` routing prefix some configs carry.
pub(crate) fn normalize_model(model: &str) -> &str {
    model.strip_prefix("gemini/").unwrap_or(model)
}

impl GeminiBackend {
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
            base_url: base_url
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            api_key,
            default_model: normalize_model(&default_model).to_string(),
            default_params,
        })
    }

    /// Build from `[llm.gemini]`, reading the key from the process environment.
    ///
    /// # Errors
    ///
    /// Returns `LlmError::Misconfiguration` if the key is missing or empty
    pub fn new_from_config(config: &Config) -> Result<Self, LlmError> {
        Self::new_from_config_with_env(config, |key| std::env::var(key).ok())
    }

    pub(crate) fn new_from_config_with_env<F>(config: &Config, env: F) -> Result<Self, LlmError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let section = config.llm.gemini.as_ref();

        let api_key_env = section
            .and_then(|s| s.api_key_env.as_deref())
            .unwrap_or(DEFAULT_GEMINI_KEY_ENV);

        let api_key = env(api_key_env)
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                LlmError::Misconfiguration(format!(
                    "Gemini API key not found in environment variable '{api_key_env}'. \
                     Get a key at {API_KEY_URL} and export it (a .env file works too), \
                     or configure a different api_key_env in [llm.gemini]."
                ))
            })?;

        let base_url = section.and_then(|s| s.base_url.clone());
        let default_model = section
            .and_then(|s| s.model.clone())
            .unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string());
        let defaults = HttpParams::default();
        let default_params = HttpParams {
            max_tokens: section
                .and_then(|s| s.max_tokens)
                .unwrap_or(defaults.max_tokens),
            temperature: section
                .and_then(|s| s.temperature)
                .unwrap_or(defaults.temperature),
        };

        Self::new(api_key, base_url, default_model, default_params)
    }

    fn endpoint(&self, model: &str) -> String {
        format!("{}/models/{}:generateContent", self.base_url, model)
    }
}

#[async_trait]
impl LlmBackend for GeminiBackend {
    async fn invoke(&self, inv: LlmInvocation) -> Result<LlmResult, LlmError> {
        let (model, params) = resolve_params(&inv, &self.default_model, &self.default_params);
        let model = normalize_model(&model).to_string();

        debug!(
            provider = "gemini",
            run_id = %inv.run_id,
            stage = %inv.stage,
            model = %model,
            tools = inv.tools.len(),
            messages = inv.messages.len(),
            timeout_secs = inv.timeout.as_secs(),
            "Invoking Gemini backend"
        );

        let body = build_request(&inv.messages, &inv.tools, &params);

        let request = self
            .client
            .post(&self.endpoint(&model))
            .header("x-goog-api-key", &self.api_key)
            .header("Content-Type", "application/json")
            .json(&body);

        let response = self
            .client
            .execute_with_retry(request, inv.timeout, "gemini")
            .await?;

        let response_body: GeminiResponse = response.json().await.map_err(|e| {
            LlmError::Transport(format!("Failed to parse Gemini response: {e}"))
        })?;

        let result = parse_response(response_body, &model)?;

        debug!(
            provider = "gemini",
            stage = %inv.stage,
            tool_calls = result.tool_calls.len(),
            response_chars = result.raw_response.len(),
            finish_reason = result.finish_reason.as_deref().unwrap_or("unknown"),
            "Received response from Gemini"
        );

        Ok(result)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GeminiContent>,
    contents: Vec<GeminiContent>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<GeminiToolSet>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct GeminiContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    function_call: Option<FunctionCall>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    function_response: Option<FunctionResponse>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct FunctionCall {
    name: String,
    #[serde(default)]
    args: serde_json::Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct FunctionResponse {
    name: String,
    response: serde_json::Value,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiToolSet {
    function_declarations: Vec<FunctionDeclaration>,
}

#[derive(Debug, Serialize)]
struct FunctionDeclaration {
    name: String,
    description: String,
    parameters: serde_json::Value,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    usage_metadata: Option<UsageMetadata>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<GeminiContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    prompt_token_count: Option<u64>,
    candidates_token_count: Option<u64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

fn text_part(text: &str) -> Part {
    Part {
        text: Some(text.to_string()),
        ..Part::default()
    }
}

/// Tool output as a JSON object; Gemini rejects non-object responses.
fn response_object(content: &str) -> serde_json::Value {
    match serde_json::from_str::<serde_json::Value>(content) {
        Ok(value @ serde_json::Value::Object(_)) => value,
        Ok(other) => serde_json::json!({ "result": other }),
        Err(_) => serde_json::json!({ "result": content }),
    }
}

fn convert_message(msg: &Message) -> (String, Vec<Part>) {
    match msg.role {
        Role::User | Role::System => ("user".to_string(), vec![text_part(&msg.content)]),
        Role::Assistant => {
            let mut parts = Vec::new();
            if !msg.content.is_empty() || msg.tool_calls.is_empty() {
                parts.push(text_part(&msg.content));
            }
            parts.extend(msg.tool_calls.iter().map(|call| Part {
                function_call: Some(FunctionCall {
                    name: call.name.clone(),
                    args: call.arguments.clone(),
                    id: None,
                }),
                ..Part::default()
            }));
            ("model".to_string(), parts)
        }
        Role::Tool => (
            "user".to_string(),
            vec![Part {
                function_response: Some(FunctionResponse {
                    name: msg.tool_name.clone().unwrap_or_else(|| "tool".to_string()),
                    response: response_object(&msg.content),
                }),
                ..Part::default()
            }],
        ),
    }
}

/// Build the request body. System messages become `systemInstruction`;
/// consecutive turns of the same role are merged into one content entry.
fn build_request(
    messages: &[Message],
    tools: &[ToolDeclaration],
    params: &HttpParams,
) -> GeminiRequest {
    let system_text: Vec<&str> = messages
        .iter()
        .filter(|m| m.role == Role::System)
        .map(|m| m.content.as_str())
        .collect();

    let system_instruction = (!system_text.is_empty()).then(|| GeminiContent {
        role: None,
        parts: vec![text_part(&system_text.join("\n\n"))],
    });

    let mut contents: Vec<GeminiContent> = Vec::new();
    for msg in messages.iter().filter(|m| m.role != Role::System) {
        let (role, parts) = convert_message(msg);
        match contents.last_mut() {
            Some(last) if last.role.as_deref() == Some(role.as_str()) => last.parts.extend(parts),
            _ => contents.push(GeminiContent {
                role: Some(role),
                parts,
            }),
        }
    }

    let tools = if tools.is_empty() {
        Vec::new()
    } else {
        vec![GeminiToolSet {
            function_declarations: tools
                .iter()
                .map(|t| FunctionDeclaration {
                    name: t.name.clone(),
                    description: t.description.clone(),
                    parameters: t.parameters.clone(),
                })
                .collect(),
        }]
    };

    GeminiRequest {
        system_instruction,
        contents,
        tools,
        generation_config: GenerationConfig {
            temperature: params.temperature,
            max_output_tokens: params.max_tokens,
        },
    }
}

fn parse_response(body: GeminiResponse, model: &str) -> Result<LlmResult, LlmError> {
    let Some(candidate) = body.candidates.into_iter().next() else {
        let reason = body
            .prompt_feedback
            .and_then(|f| f.block_reason)
            .map_or_else(String::new, |r| format!(" (blocked: {r})"));
        return Err(LlmError::Transport(format!(
            "Gemini response missing candidates{reason}"
        )));
    };

    let parts = candidate.content.map(|c| c.parts).unwrap_or_default();

    let mut text = String::new();
    let mut tool_calls = Vec::new();
    for part in parts {
        if let Some(t) = part.text {
            text.push_str(&t);
        }
        if let Some(call) = part.function_call {
            let id = call
                .id
                .unwrap_or_else(|| format!("call_{}", tool_calls.len()));
            tool_calls.push(ToolCall {
                id,
                name: call.name,
                arguments: call.args,
            });
        }
    }

    let mut result = LlmResult::new(text, "gemini", model).with_tool_calls(tool_calls);
    result.finish_reason = candidate.finish_reason;

    if let Some(usage) = body.usage_metadata {
        result = result.with_tokens(
            usage.prompt_token_count.unwrap_or(0),
            usage.candidates_token_count.unwrap_or(0),
        );
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use archsmith_config::HttpProviderConfig;
    use serde_json::json;

    fn call(id: &str, name: &str) -> ToolCall {
        ToolCall {
            id: id.to_string(),
            name: name.to_string(),
            arguments: json!({"file_path": "main.py", "content": "print(1)"}),
        }
    }

    #[test]
    fn test_missing_key_is_misconfiguration() {
        let config = Config::minimal_for_testing();
        let err = GeminiBackend::new_from_config_with_env(&config, |_| None)
            .err()
            .unwrap();

        match err {
            LlmError::Misconfiguration(msg) => {
                assert!(msg.contains("GEMINI_API_KEY"));
                assert!(msg.contains(API_KEY_URL));
            }
            other => panic!("Expected Misconfiguration, got {other:?}"),
        }
    }

    #[test]
    fn test_blank_key_is_treated_as_missing() {
        let config = Config::minimal_for_testing();
        let result = GeminiBackend::new_from_config_with_env(&config, |_| Some("  ".into()));
        assert!(matches!(result, Err(LlmError::Misconfiguration(_))));
    }

    #[test]
    fn test_config_section_drives_backend() {
        let mut config = Config::minimal_for_testing();
        config.llm.gemini = Some(HttpProviderConfig {
            api_key_env: Some("MY_KEY".to_string()),
            base_url: Some("http://localhost:9999/v1beta/".to_string()),
            model: Some("gemini/gemini-2.0-flash".to_string()),
            max_tokens: Some(1000),
            temperature: Some(0.7),
        });

        let backend = GeminiBackend::new_from_config_with_env(&config, |key| {
            (key == "MY_KEY").then(|| "secret".to_string())
        })
        .unwrap();

        assert_eq!(backend.default_model, "gemini-2.0-flash");
        assert_eq!(backend.default_params.max_tokens, 1000);
        assert_eq!(
            backend.endpoint("gemini-2.0-flash"),
            "http://localhost:9999/v1beta/models/gemini-2.0-flash:generateContent"
        );
    }

    #[test]
    fn test_normalize_model_strips_prefix() {
        assert_eq!(normalize_model("gemini/gemini-2.5-flash"), "gemini-2.5-flash");
        assert_eq!(normalize_model("gemini-2.5-pro"), "gemini-2.5-pro");
    }

    #[test]
    fn test_build_request_shapes_conversation() {
        let c = call("call_0", "file_writer");
        let messages = vec![
            Message::system("You are a backend specialist."),
            Message::user("Build the API."),
            Message::assistant_with_tool_calls("", vec![c.clone()]),
            Message::tool_result(&c, r#"{"success":true,"path":"/out/backend/main.py"}"#),
        ];
        let tools = vec![ToolDeclaration {
            name: "file_writer".to_string(),
            description: "Write a file".to_string(),
            parameters: json!({"type": "object", "properties": {}}),
        }];

        let body = serde_json::to_value(build_request(&messages, &tools, &HttpParams::default()))
            .unwrap();

        assert_eq!(
            body["systemInstruction"]["parts"][0]["text"],
            "You are a backend specialist."
        );
        assert_eq!(body["contents"].as_array().unwrap().len(), 3);
        assert_eq!(body["contents"][0]["role"], "user");
        assert_eq!(body["contents"][1]["role"], "model");
        assert_eq!(
            body["contents"][1]["parts"][0]["functionCall"]["name"],
            "file_writer"
        );
        assert_eq!(
            body["contents"][2]["parts"][0]["functionResponse"]["response"]["success"],
            true
        );
        assert_eq!(
            body["tools"][0]["functionDeclarations"][0]["name"],
            "file_writer"
        );
        assert_eq!(body["generationConfig"]["maxOutputTokens"], 8192);
    }

    #[test]
    fn test_consecutive_tool_results_share_one_turn() {
        let a = call("call_0", "file_writer");
        let b = call("call_1", "code_linter");
        let messages = vec![
            Message::user("go"),
            Message::assistant_with_tool_calls("", vec![a.clone(), b.clone()]),
            Message::tool_result(&a, r#"{"success":true}"#),
            Message::tool_result(&b, "not json"),
        ];

        let body = serde_json::to_value(build_request(&messages, &[], &HttpParams::default()))
            .unwrap();

        let contents = body["contents"].as_array().unwrap();
        assert_eq!(contents.len(), 3);
        assert_eq!(contents[2]["parts"].as_array().unwrap().len(), 2);
        assert_eq!(
            contents[2]["parts"][1]["functionResponse"]["response"]["result"],
            "not json"
        );
        assert!(body.get("tools").is_none());
    }

    #[test]
    fn test_parse_response_collects_text_and_calls() {
        let body: GeminiResponse = serde_json::from_value(json!({
            "candidates": [{
                "content": {"role": "model", "parts": [
                    {"text": "Writing files. "},
                    {"functionCall": {"name": "file_writer", "args": {"file_path": "a.py"}}},
                    {"functionCall": {"name": "code_linter", "args": {"code": "x"}}}
                ]},
                "finishReason": "STOP"
            }],
            "usageMetadata": {"promptTokenCount": 120, "candidatesTokenCount": 40}
        }))
        .unwrap();

        let result = parse_response(body, "gemini-2.5-flash").unwrap();
        assert_eq!(result.raw_response, "Writing files. ");
        assert_eq!(result.tool_calls.len(), 2);
        assert_eq!(result.tool_calls[0].id, "call_0");
        assert_eq!(result.tool_calls[1].id, "call_1");
        assert_eq!(result.tool_calls[1].name, "code_linter");
        assert_eq!(result.tokens_input, Some(120));
        assert_eq!(result.finish_reason.as_deref(), Some("STOP"));
    }

    #[test]
    fn test_parse_response_without_candidates_reports_block() {
        let body: GeminiResponse = serde_json::from_value(json!({
            "promptFeedback": {"blockReason": "SAFETY"}
        }))
        .unwrap();

        match parse_response(body, "m") {
            Err(LlmError::Transport(msg)) => assert!(msg.contains("SAFETY")),
            other => panic!("Expected Transport error, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_response_tolerates_empty_content() {
        let body: GeminiResponse = serde_json::from_value(json!({
            "candidates": [{"content": {"role": "model"}, "finishReason": "MAX_TOKENS"}]
        }))
        .unwrap();

        let result = parse_response(body, "m").unwrap();
        assert!(result.raw_response.is_empty());
        assert!(!result.has_tool_calls());
    }
}
