use secrecy::{ExposeSecret, SecretString};

/// Azure DevOps Personal Access Token.
///
/// Sent as the password of an HTTP Basic credential with an empty user name.
#[derive(Clone)]
pub struct Token(SecretString);

impl Token {
    pub fn as_str(&self) -> &str {
        self.0.expose_secret()
    }
}

impl From<&str> for Token {
    fn from(value: &str) -> Self {
        Self(SecretString::from(value.to_string()))
    }
}

impl From<String> for Token {
    fn from(value: String) -> Self {
        Self(SecretString::from(value))
    }
}

impl std::fmt::Debug for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Token([REDACTED])")
    }
}
