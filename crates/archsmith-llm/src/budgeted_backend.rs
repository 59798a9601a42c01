//! Budgeted backend wrapper for LLM call limiting
//!
//! A full run makes one model call per tool round per stage, so a runaway
//! tool loop can burn through a paid quota. This wrapper caps the number of
//! calls per process.

use crate::LlmError;
use crate::types::{LlmBackend, LlmInvocation, LlmResult};
use archsmith_config::DEFAULT_LLM_BUDGET;
use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use tracing::{debug, warn};

/// Environment variable for overriding the budget limit
pub const BUDGET_ENV_VAR: &str = "ARCHSMITH_LLM_BUDGET";

/// A wrapper around an `LlmBackend` that enforces a limit on invocations.
///
/// The budget counts attempted calls, not successful ones: a failed call
/// still consumes its slot, so retries cannot bypass the limit.
pub struct BudgetedBackend {
    inner: Box<dyn LlmBackend>,
    budget: Arc<AtomicU32>,
    limit: u32,
}

impl BudgetedBackend {
    pub fn new(inner: Box<dyn LlmBackend>, limit: u32) -> Self {
        debug!(limit = limit, "Creating BudgetedBackend");
        Self {
            inner,
            budget: Arc::new(AtomicU32::new(0)),
            limit,
        }
    }

    /// Limit resolved as env (`ARCHSMITH_LLM_BUDGET`) > `[llm] budget` > 200.
    pub fn with_limit_from_config(inner: Box<dyn LlmBackend>, config_budget: Option<u32>) -> Self {
        let limit = resolve_limit(std::env::var(BUDGET_ENV_VAR).ok().as_deref(), config_budget);
        Self::new(inner, limit)
    }

    /// Calls made so far, including failed ones.
    pub fn call_count(&self) -> u32 {
        self.budget.load(Ordering::SeqCst)
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }
}

/// Pick the budget limit. Unparseable or zero env values are ignored.
pub(crate) fn resolve_limit(env_value: Option<&str>, config_budget: Option<u32>) -> u32 {
    if let Some(raw) = env_value {
        match raw.trim().parse::<u32>() {
            Ok(limit) if limit > 0 => {
                debug!(
                    limit = limit,
                    "Using budget limit from environment variable {}", BUDGET_ENV_VAR
                );
                return limit;
            }
            _ => warn!(value = raw, "Ignoring invalid {}", BUDGET_ENV_VAR),
        }
    }

    if let Some(limit) = config_budget {
        debug!(limit = limit, "Using budget limit from config file");
        return limit;
    }

    debug!(limit = DEFAULT_LLM_BUDGET, "Using default budget limit");
    DEFAULT_LLM_BUDGET
}

#[async_trait]
impl LlmBackend for BudgetedBackend {
    async fn invoke(&self, inv: LlmInvocation) -> Result<LlmResult, LlmError> {
        // Count before calling so failures consume their slot
        let current = self.budget.fetch_add(1, Ordering::SeqCst);

        if current >= self.limit {
            let attempted = current + 1;
            warn!(
                limit = self.limit,
                attempted = attempted,
                stage = %inv.stage,
                "Budget limit exceeded"
            );
            return Err(LlmError::BudgetExceeded {
                limit: self.limit,
                attempted,
            });
        }

        debug!(
            call_count = current + 1,
            limit = self.limit,
            "Budget check passed, invoking inner backend"
        );

        let result = self.inner.invoke(inv).await;

        if let Err(e) = &result {
            debug!(
                call_count = current + 1,
                limit = self.limit,
                error = %e,
                "Inner backend invocation failed (budget slot still consumed)"
            );
        }

        result
    }
}
