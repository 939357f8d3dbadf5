use std::env;

/// Environment variable holding the auto-injected default credential.
pub const CREDENTIAL_ENV_VAR: &str = "GEMINI_API_KEY";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialSource {
    /// Explicitly entered by the user. Failures under a user-supplied key are
    /// surfaced verbatim instead of being absorbed into a fallback result.
    UserProvided,
    /// Auto-injected from the environment.
    Environment,
}

/// Opaque secret identifying the caller to the identification service.
///
/// Absence of a credential is `None`, never an empty string: blank values
/// from either source are treated as not configured.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    value: String,
    source: CredentialSource,
}

impl Credential {
    /// Resolves the effective credential: a user-entered override always wins
    /// over the environment default.
    pub fn resolve(user_override: Option<&str>) -> Option<Self> {
        let env_value = env::var(CREDENTIAL_ENV_VAR).ok();
        Self::resolve_from(user_override, env_value.as_deref())
    }

    fn resolve_from(user_override: Option<&str>, env_value: Option<&str>) -> Option<Self> {
        if let Some(value) = non_blank(user_override) {
            return Some(Self::user_provided(value));
        }
        non_blank(env_value).map(Self::environment)
    }

    pub fn user_provided(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            source: CredentialSource::UserProvided,
        }
    }

    pub fn environment(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            source: CredentialSource::Environment,
        }
    }

    pub fn expose(&self) -> &str {
        &self.value
    }

    pub fn source(&self) -> CredentialSource {
        self.source
    }

    pub fn is_user_supplied(&self) -> bool {
        self.source == CredentialSource::UserProvided
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
