//! Session credential issued by the appliance's login endpoint.

use std::fmt;

/// Opaque session token (`api-key`).
///
/// Owned by one session attempt. The `Debug` and `Display` impls only show a
/// short prefix so the token never ends up in logs verbatim.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// Wrap a raw token.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// The raw token, for building requests.
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Whether the token is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Redacted form for logging: first four characters then `***`.
    pub fn redacted(&self) -> String {
        let prefix: String = self.0.chars().take(4).collect();
        format!("{prefix}***")
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Credential").field(&self.redacted()).finish()
    }
}

impl fmt::Display for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.redacted())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expose_returns_raw_token() {
        let cred = Credential::new("abcdef123456");
        assert_eq!(cred.expose(), "abcdef123456");
    }

    #[test]
    fn debug_is_redacted() {
        let cred = Credential::new("abcdef123456");
        let debug = format!("{cred:?}");
        assert!(debug.contains("abcd***"));
        assert!(!debug.contains("123456"));
    }

    #[test]
    fn display_is_redacted() {
        let cred = Credential::new("secret-token");
        assert_eq!(cred.to_string(), "secr***");
    }

    #[test]
    fn short_token_redacts_without_panic() {
        let cred = Credential::new("ab");
        assert_eq!(cred.redacted(), "ab***");
        assert!(!cred.is_empty());
        assert!(Credential::new("").is_empty());
    }
}
