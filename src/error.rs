use thiserror::Error;

/// Failures of a translate/expand round trip. None of them are retried.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TranslateError {
    /// API key or URL missing; raised before any network call
    #[error("Configuration error: {0}")]
    Config(String),

    /// Nothing to translate
    #[error("Input text is empty")]
    EmptyInput,

    /// Transport failure, error status or a response without a usable choice
    #[error("{0}")]
    Api(String),

    /// Expansion output that is not the expected JSON object
    #[error("Failed to parse AI response: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for TranslateError {
    fn from(err: reqwest::Error) -> Self {
        TranslateError::Api(err.to_string())
    }
}

pub type TranslateResult<T> = Result<T, TranslateError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_messages_pass_through_verbatim() {
        let err = TranslateError::Api("Failed to translate text".to_string());
        assert_eq!(err.to_string(), "Failed to translate text");
    }

    #[test]
    fn parse_and_config_errors_are_labelled() {
        assert_eq!(
            TranslateError::Parse("missing field `englishContent`".to_string()).to_string(),
            "Failed to parse AI response: missing field `englishContent`"
        );
        assert!(TranslateError::Config("API key is not set".to_string())
            .to_string()
            .starts_with("Configuration error"));
    }
}
