use std::fmt;

/// Bearer token passed through to the GitHub API.
///
/// `Debug` is redacted so the token never ends up in logs.
#[derive(Clone, PartialEq, Eq)]
pub struct Token(String);

impl Token {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl From<&str> for Token {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl From<String> for Token {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Token(***)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_output_is_redacted() {
        let token = Token::from("ghp_secret");
        let debug = format!("{token:?}");
        assert!(!debug.contains("ghp_secret"));
        assert_eq!(debug, "Token(***)");
    }

    #[test]
    fn test_as_str_returns_raw_value() {
        let token = Token::from(String::from("ghp_secret"));
        assert_eq!(token.as_str(), "ghp_secret");
    }

    #[test]
    fn test_is_blank() {
        assert!(Token::from("   ").is_blank());
        assert!(!Token::from("abc").is_blank());
    }
}
