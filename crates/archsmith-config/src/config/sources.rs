use std::collections::HashMap;

use super::{Config, ConfigSource, HttpProviderConfig};

fn source_label(source: Option<&ConfigSource>) -> String {
    source.unwrap_or(&ConfigSource::Default).as_str().to_string()
}

impl Config {
    /// Effective configuration as `key -> (value, source)`.
    #[must_use]
    pub fn effective_config(&self) -> HashMap<String, (String, String)> {
        let mut config = HashMap::new();

        let mut add = |key: &str, attribution: &str, value: Option<String>| {
            if let Some(val) = value {
                let source = source_label(self.source_attribution.get(attribution));
                config.insert(key.to_string(), (val, source));
            }
        };

        add("output_dir", "output_dir", self.defaults.output_dir.clone());
        add("verbose", "verbose", self.defaults.verbose.map(|v| v.to_string()));
        add(
            "clean_output",
            "clean_output",
            self.defaults.clean_output.map(|v| v.to_string()),
        );
        add(
            "stage_timeout",
            "stage_timeout",
            self.defaults.stage_timeout.map(|v| v.to_string()),
        );
        add(
            "max_tool_rounds",
            "max_tool_rounds",
            self.defaults.max_tool_rounds.map(|v| v.to_string()),
        );
        add("llm.provider", "llm_provider", self.llm.provider.clone());
        add("llm.budget", "llm_budget", self.llm.budget.map(|v| v.to_string()));

        for (name, section) in [
            ("gemini", self.llm.gemini.as_ref()),
            ("openrouter", self.llm.openrouter.as_ref()),
        ] {
            let Some(section) = section else { continue };
            let attribution = if self.llm.provider.as_deref() == Some(name)
                && self.source_attribution.contains_key("llm_model")
            {
                "llm_model".to_string()
            } else {
                format!("llm_{name}")
            };
            for (field, value) in provider_fields(section) {
                add(&format!("llm.{name}.{field}"), &attribution, value);
            }
        }

        for (stage, secs) in &self.delays.stages {
            add(&format!("delays.{stage}"), "delays", Some(secs.to_string()));
        }
        add("delays.default", "delays", self.delays.default.map(|v| v.to_string()));

        config
    }
}

fn provider_fields(section: &HttpProviderConfig) -> [(&'static str, Option<String>); 5] {
    [
        ("api_key_env", section.api_key_env.clone()),
        ("base_url", section.base_url.clone()),
        ("model", section.model.clone()),
        ("max_tokens", section.max_tokens.map(|v| v.to_string())),
        ("temperature", section.temperature.map(|v| v.to_string())),
    ]
}
