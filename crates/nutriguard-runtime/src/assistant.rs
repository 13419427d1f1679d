//! Nutrition assistant pipeline.
//!
//! Composes the pieces of one LLM-backed request:
//! - Credential check (no provider call without a key)
//! - Provider call bounded by the configured timeout
//! - Validation of the untrusted reply (deterministic, from nutriguard-core)
//! - Bounded retry with linear backoff
//!
//! Every failure reaches the caller as a single classified [`ErrorRecord`].

use std::sync::Arc;

use chrono::Local;
use nutriguard_core::{
    ErrorRecord, Failure, FoodResponse, GoalResponse, ResponseValidator, SchemaPayload,
    TransportFailure,
};
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::config::{ConfigError, RuntimeConfig};
use crate::prompts::{system_prompt, user_prompt};
use crate::providers::{ApiCredential, ChatMessage, CredentialStore, LlmProvider};
use crate::resilience::{RetryError, RetryExecutor};

/// Operation key for daily goal estimates.
pub const GOAL_OPERATION: &str = "goal_estimate";

/// Operation key for food analysis.
pub const FOOD_OPERATION: &str = "food_analysis";

/// Display label for an operation key, used in user-facing messages.
pub fn operation_label(key: &str) -> &str {
    match key {
        GOAL_OPERATION => "Goal estimate",
        FOOD_OPERATION => "Food analysis",
        other => other,
    }
}

/// Errors from assembling an assistant.
#[derive(Error, Debug)]
pub enum AssistantError {
    #[error("Provider not configured: {0}")]
    ProviderNotConfigured(String),

    #[error("Credential store not configured")]
    CredentialsNotConfigured,

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Runs nutrition requests against an LLM provider.
///
/// # Architecture
/// - Provider and credential store are injected, never constructed here
/// - Retry counters live in the [`RetryExecutor`], which may be shared
///   between assistants
/// - Replies are validated before anything is returned
pub struct NutritionAssistant {
    provider: Arc<dyn LlmProvider>,
    credentials: Arc<dyn CredentialStore>,
    config: RuntimeConfig,
    executor: Arc<RetryExecutor>,
    validator: ResponseValidator,
}

impl NutritionAssistant {
    /// Start building an assistant.
    pub fn builder() -> NutritionAssistantBuilder {
        NutritionAssistantBuilder::new()
    }

    /// Estimate daily nutrition goals for a self-description.
    pub async fn estimate_goals(&self, description: &str) -> Result<GoalResponse, ErrorRecord> {
        self.request(GOAL_OPERATION, description, &CancellationToken::new())
            .await
    }

    /// Analyze a food the user ate.
    pub async fn analyze_food(&self, description: &str) -> Result<FoodResponse, ErrorRecord> {
        self.request(FOOD_OPERATION, description, &CancellationToken::new())
            .await
    }

    /// Run one request for payload `T` under operation `key`.
    ///
    /// Stops between attempts once `cancel` fires; an in-flight provider call
    /// is allowed to finish.
    pub async fn request<T: SchemaPayload>(
        &self,
        key: &str,
        description: &str,
        cancel: &CancellationToken,
    ) -> Result<T, ErrorRecord> {
        let classifier = self.executor.classifier();
        let label = operation_label(key);

        let Some(credential) = self.credentials.credential() else {
            tracing::warn!(operation = key, "No credential configured");
            return Err(classifier.classify(&Failure::MissingCredential, label));
        };

        let schema = T::schema();
        let today = Local::now().date_naive();
        let messages = vec![
            ChatMessage::system(system_prompt(schema)),
            ChatMessage::user(user_prompt(schema, description, today)),
        ];

        tracing::info!(
            operation = key,
            provider = self.provider.name(),
            schema = schema.name(),
            "Requesting nutrition data"
        );

        let credential: &ApiCredential = &credential;
        let messages = &messages;
        let result = self
            .executor
            .run_with_retry_cancellable(key, &self.config.retry, cancel, move || async move {
                self.attempt::<T>(credential, messages.clone())
                    .await
                    .map_err(|failure| classifier.classify(&failure, label))
            })
            .await;

        result.map_err(|error| match error {
            RetryError::Cancelled { .. } => classifier.classify(
                &Failure::Transport(TransportFailure::Cancelled),
                label,
            ),
            other => other.into_record(classifier),
        })
    }

    /// One provider call plus validation.
    async fn attempt<T: SchemaPayload>(
        &self,
        credential: &ApiCredential,
        messages: Vec<ChatMessage>,
    ) -> Result<T, Failure> {
        let settings = &self.config.completion;
        let call = self.provider.complete(credential, messages, settings);

        let response = match tokio::time::timeout(settings.timeout, call).await {
            Ok(response) => response?,
            Err(_) => {
                tracing::warn!(
                    provider = self.provider.name(),
                    timeout = ?settings.timeout,
                    "Provider call timed out"
                );
                return Err(Failure::Transport(TransportFailure::TimedOut));
            }
        };

        tracing::debug!(
            model = %response.model,
            stop_reason = ?response.stop_reason,
            length = response.content.len(),
            "Received completion"
        );

        Ok(self
            .validator
            .validate::<T>(&response.content)
            .into_result()?)
    }

    /// Failed attempts recorded for `key`.
    pub fn attempts(&self, key: &str) -> u32 {
        self.executor.attempts(key)
    }

    /// Explicitly reset the attempt counter for `key`.
    pub fn reset(&self, key: &str) {
        self.executor.reset(key);
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// Name of the configured provider.
    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }
}

/// Builder for NutritionAssistant.
pub struct NutritionAssistantBuilder {
    provider: Option<Arc<dyn LlmProvider>>,
    credentials: Option<Arc<dyn CredentialStore>>,
    config: RuntimeConfig,
    executor: Option<Arc<RetryExecutor>>,
}

impl NutritionAssistantBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self {
            provider: None,
            credentials: None,
            config: RuntimeConfig::default(),
            executor: None,
        }
    }

    /// Set the LLM provider.
    pub fn provider(mut self, provider: Arc<dyn LlmProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Set the credential store.
    pub fn credentials(mut self, credentials: Arc<dyn CredentialStore>) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Set the configuration.
    pub fn config(mut self, config: RuntimeConfig) -> Self {
        self.config = config;
        self
    }

    /// Share a retry executor (and its attempt counters).
    pub fn executor(mut self, executor: Arc<RetryExecutor>) -> Self {
        self.executor = Some(executor);
        self
    }

    /// Build the assistant.
    pub fn build(self) -> Result<NutritionAssistant, AssistantError> {
        let provider = self
            .provider
            .ok_or_else(|| AssistantError::ProviderNotConfigured("No provider set".to_string()))?;
        let credentials = self
            .credentials
            .ok_or(AssistantError::CredentialsNotConfigured)?;
        self.config.validate()?;

        Ok(NutritionAssistant {
            provider,
            credentials,
            config: self.config,
            executor: self.executor.unwrap_or_default(),
            validator: ResponseValidator::new(),
        })
    }
}

impl Default for NutritionAssistantBuilder {
    fn default() -> Self {
        Self::new()
    }
}
