//! Credentials for Google API calls.

use secrecy::{ExposeSecret, SecretString};

/// OAuth bearer credentials attached to every remote call.
///
/// The token is held as a secret so it never shows up in `Debug` output or
/// logs.
#[derive(Debug, Clone)]
pub struct Credentials {
    token: SecretString,
}

impl Credentials {
    /// Wrap an OAuth access token.
    pub fn bearer(token: impl Into<SecretString>) -> Self {
        Self {
            token: token.into(),
        }
    }

    /// Value for the `Authorization` header.
    pub(crate) fn authorization_header(&self) -> String {
        format!("Bearer {}", self.token.expose_secret())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_is_redacted_in_debug() {
        let creds = Credentials::bearer("ya29.super-secret".to_string());
        let debug = format!("{:?}", creds);
        assert!(!debug.contains("super-secret"));
        assert_eq!(creds.authorization_header(), "Bearer ya29.super-secret");
    }
}
