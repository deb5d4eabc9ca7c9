use crate::error::{FetchError, Result};
use regex::Regex;
use std::sync::OnceLock;

/// Environment variable consulted when no contact e-mail is set explicitly.
pub const CONTACT_EMAIL_ENV: &str = "SECMAP_CONTACT_EMAIL";

fn email_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("static pattern"))
}

/// Contact identity required by the SEC fair-access policy.
///
/// The upstream dataset rejects anonymous clients, so every download carries
/// a `User-Agent` naming a reachable e-mail address. An explicitly set
/// address wins over the [`CONTACT_EMAIL_ENV`] environment variable; a
/// malformed address in the environment is ignored.
#[derive(Debug, Clone, Default)]
pub struct FetchConfig {
    contact_email: Option<String>,
}

impl FetchConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a config with a validated contact e-mail.
    pub fn with_contact_email(email: impl Into<String>) -> Result<Self> {
        let email = email.into();
        validate_email(&email)?;
        Ok(Self {
            contact_email: Some(email),
        })
    }

    /// Build a config from [`CONTACT_EMAIL_ENV`], ignoring a malformed value.
    #[must_use]
    pub fn from_env() -> Self {
        match std::env::var(CONTACT_EMAIL_ENV) {
            Ok(email) if validate_email(&email).is_ok() => Self {
                contact_email: Some(email),
            },
            Ok(email) => {
                log::warn!("Ignoring malformed {CONTACT_EMAIL_ENV} value '{email}'");
                Self::default()
            }
            Err(_) => Self::default(),
        }
    }

    /// Render the `User-Agent` header, or fail with a configuration error
    /// when no contact e-mail is available.
    pub fn user_agent(&self) -> Result<String> {
        let email = self.contact_email.as_deref().ok_or_else(|| {
            FetchError::Configuration(format!(
                "A contact e-mail is required for SEC requests. Set one via \
                 FetchConfig::with_contact_email or the {CONTACT_EMAIL_ENV} \
                 environment variable."
            ))
        })?;
        Ok(format!("secmap/{} ({email})", env!("CARGO_PKG_VERSION")))
    }
}

fn validate_email(email: &str) -> Result<()> {
    if email_pattern().is_match(email) {
        Ok(())
    } else {
        Err(FetchError::Configuration(format!(
            "Invalid contact e-mail '{email}'"
        )))
    }
}
