/// Every failure surfaced to the instructor. `Display` is the inline message
/// the front end prints.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("You are not logged in")]
    Unauthorized,

    #[error("Invalid password. Please try again.")]
    InvalidCredentials,

    #[error("Email already registered. Please try logging in.")]
    EmailAlreadyRegistered,

    #[error("{message}")]
    Backend { status: u16, message: String },

    #[error("Error connecting to server: {0}")]
    Connection(String),

    #[error("{0}")]
    Validation(String),

    #[error("Failed to read PDF: {0}")]
    Extraction(String),

    #[error("Could not parse quiz questions: {0}")]
    Parse(String),

    #[error("Quiz generation failed: {0}")]
    Generation(String),

    #[error("{0}")]
    InvalidState(String),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::Connection(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_match_screen_text() {
        assert_eq!(
            AppError::InvalidCredentials.to_string(),
            "Invalid password. Please try again."
        );
        assert_eq!(
            AppError::Connection("refused".into()).to_string(),
            "Error connecting to server: refused"
        );
        let backend = AppError::Backend {
            status: 500,
            message: "Failed to create group: boom".into(),
        };
        assert_eq!(backend.to_string(), "Failed to create group: boom");
    }
}
