//! Credential handling for LLM providers.
//!
//! Credentials are wrapped in [`ApiCredential`] as soon as they are read, so
//! they cannot appear in `Debug`/`Display` output and are zeroed on drop.
//! Where a credential comes from is abstracted by [`CredentialStore`]; the
//! runtime only asks whether one is present before calling a provider.
//!
//! ```ignore
//! let store = EnvCredentialStore::new("NUTRIGUARD_API_KEY", "Nutrition API key");
//! if let Some(cred) = store.credential() {
//!     request.header("x-api-key", cred.expose());
//! }
//! ```

use secrecy::{ExposeSecret, SecretString};
use std::fmt;
use std::sync::Arc;

/// Where a credential was loaded from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialSource {
    /// Loaded from environment variable
    Environment,
    /// Provided programmatically (e.g. read from the platform keychain)
    Programmatic,
}

impl fmt::Display for CredentialSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CredentialSource::Environment => write!(f, "environment"),
            CredentialSource::Programmatic => write!(f, "programmatic"),
        }
    }
}

/// A securely-stored API credential.
pub struct ApiCredential {
    value: SecretString,
    source: CredentialSource,
    name: &'static str,
}

impl ApiCredential {
    pub fn new(value: impl Into<String>, source: CredentialSource, name: &'static str) -> Self {
        Self {
            value: SecretString::from(value.into()),
            source,
            name,
        }
    }

    /// Expose the credential value for use in an API call.
    ///
    /// Only call this where the value is actually sent; never store the
    /// exposed string.
    pub fn expose(&self) -> &str {
        self.value.expose_secret()
    }

    /// Check if the credential is blank.
    pub fn is_blank(&self) -> bool {
        self.value.expose_secret().trim().is_empty()
    }

    pub fn source(&self) -> CredentialSource {
        self.source
    }

    /// Human-readable name of this credential.
    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl fmt::Debug for ApiCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiCredential")
            .field("value", &"[REDACTED]")
            .field("source", &self.source)
            .field("name", &self.name)
            .finish()
    }
}

impl fmt::Display for ApiCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} from {} [REDACTED]", self.name, self.source)
    }
}

/// Supplies the credential for LLM calls, if one is configured.
///
/// Blank values must be reported as absent.
pub trait CredentialStore: Send + Sync {
    fn credential(&self) -> Option<Arc<ApiCredential>>;
}

/// Reads the credential from an environment variable on every call.
#[derive(Debug, Clone)]
pub struct EnvCredentialStore {
    env_var: String,
    name: &'static str,
}

impl EnvCredentialStore {
    pub fn new(env_var: impl Into<String>, name: &'static str) -> Self {
        Self {
            env_var: env_var.into(),
            name,
        }
    }
}

impl CredentialStore for EnvCredentialStore {
    fn credential(&self) -> Option<Arc<ApiCredential>> {
        let value = std::env::var(&self.env_var).ok()?;
        let credential = ApiCredential::new(value, CredentialSource::Environment, self.name);
        if credential.is_blank() {
            tracing::debug!(env_var = %self.env_var, "Credential variable is blank");
            return None;
        }
        Some(Arc::new(credential))
    }
}

/// Holds a credential handed over by the host application.
#[derive(Debug, Default)]
pub struct StaticCredentialStore {
    credential: Option<Arc<ApiCredential>>,
}

impl StaticCredentialStore {
    pub fn new(value: impl Into<String>, name: &'static str) -> Self {
        let credential = ApiCredential::new(value, CredentialSource::Programmatic, name);
        Self {
            credential: (!credential.is_blank()).then(|| Arc::new(credential)),
        }
    }

    /// A store with no credential.
    pub fn empty() -> Self {
        Self::default()
    }
}

impl CredentialStore for StaticCredentialStore {
    fn credential(&self) -> Option<Arc<ApiCredential>> {
        self.credential.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credential_redacted_in_debug() {
        let secret = "sk-super-secret-key-12345";
        let cred = ApiCredential::new(secret, CredentialSource::Programmatic, "Test API key");

        let debug = format!("{:?}", cred);
        assert!(!debug.contains(secret), "Secret exposed in Debug!");
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn test_credential_redacted_in_display() {
        let secret = "sk-super-secret-key-12345";
        let cred = ApiCredential::new(secret, CredentialSource::Environment, "Test API key");

        let display = format!("{}", cred);
        assert!(!display.contains(secret), "Secret exposed in Display!");
        assert!(display.contains("Test API key"));
        assert!(display.contains("environment"));
    }

    #[test]
    fn test_credential_expose() {
        let cred = ApiCredential::new("sk-123", CredentialSource::Programmatic, "Test API key");
        assert_eq!(cred.expose(), "sk-123");
        assert_eq!(cred.source(), CredentialSource::Programmatic);
    }

    #[test]
    fn test_static_store() {
        let store = StaticCredentialStore::new("sk-123", "Test API key");
        assert_eq!(store.credential().unwrap().expose(), "sk-123");

        assert!(StaticCredentialStore::empty().credential().is_none());
        assert!(StaticCredentialStore::new("   ", "Test API key")
            .credential()
            .is_none());
    }

    #[test]
    fn test_env_store() {
        std::env::set_var("NUTRIGUARD_TEST_KEY_PRESENT", "env-key");
        let store = EnvCredentialStore::new("NUTRIGUARD_TEST_KEY_PRESENT", "Test key");
        let cred = store.credential().unwrap();
        assert_eq!(cred.expose(), "env-key");
        assert_eq!(cred.source(), CredentialSource::Environment);
        std::env::remove_var("NUTRIGUARD_TEST_KEY_PRESENT");

        let missing = EnvCredentialStore::new("NUTRIGUARD_TEST_KEY_MISSING_12345", "Test key");
        assert!(missing.credential().is_none());
    }

    #[test]
    fn test_env_store_blank_is_absent() {
        std::env::set_var("NUTRIGUARD_TEST_KEY_BLANK", "  ");
        let store = EnvCredentialStore::new("NUTRIGUARD_TEST_KEY_BLANK", "Test key");
        assert!(store.credential().is_none());
        std::env::remove_var("NUTRIGUARD_TEST_KEY_BLANK");
    }
}
