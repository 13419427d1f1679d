//! # nutriguard-runtime
//!
//! Async runtime around `nutriguard-core`: bounded retry, credentials,
//! prompts and the LLM request pipeline.
//!
//! ## Important
//!
//! This crate never talks to the network itself. The host supplies an
//! [`LlmProvider`] and a [`CredentialStore`]; everything the provider returns
//! is validated by `nutriguard-core` before it reaches the caller.
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use nutriguard_runtime::{EnvCredentialStore, NutritionAssistant, RuntimeConfig};
//!
//! let assistant = NutritionAssistant::builder()
//!     .provider(Arc::new(MyProvider::new()))
//!     .credentials(Arc::new(EnvCredentialStore::new("NUTRIGUARD_API_KEY", "API key")))
//!     .config(RuntimeConfig::from_yaml_file("nutriguard.yaml")?)
//!     .build()?;
//!
//! match assistant.analyze_food("a bowl of oatmeal with banana").await {
//!     Ok(food) => println!("{}: {} kcal", food.name, food.totals().k_cals),
//!     Err(record) => eprintln!("{}\n{}", record.title(), record.message()),
//! }
//! ```

pub mod assistant;
pub mod config;
pub mod prompts;
pub mod providers;
pub mod resilience;
pub mod telemetry;

pub use assistant::{
    AssistantError, NutritionAssistant, NutritionAssistantBuilder, FOOD_OPERATION,
    GOAL_OPERATION,
};
pub use config::{ConfigError, RuntimeConfig};
pub use providers::{
    ApiCredential, ChatMessage, CompletionConfig, CompletionResponse, CredentialSource,
    CredentialStore, EnvCredentialStore, LlmProvider, ProviderError, StaticCredentialStore,
};
pub use resilience::{AttemptRegistry, RetryError, RetryExecutor, RetryPolicy};
pub use telemetry::{init_tracing, TelemetryError};

pub use tokio_util::sync::CancellationToken;
