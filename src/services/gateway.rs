use anyhow::{Context, Result};
use reqwest::StatusCode;
use serde_json::Value;

use crate::config::BackendConfig;
use crate::dto::auth::{AuthReply, LoginRequest, SignupRequest};
use crate::dto::group::{FindGroupsResponse, Group, group_names};
use crate::dto::quiz::{AssignResponse, QuizAssignment};
use crate::errors::AppError;

const GENERIC_ERROR: &str = "An error occurred. Please try again.";

/// Groups visible to the logged-in instructor.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupListing {
    pub mail_id: Option<String>,
    pub groups: Vec<String>,
}

/// Stateless calls to the quiz backend. Each call is made once; failures are
/// returned to the caller as they are.
#[derive(Clone)]
pub struct GatewayClient {
    client: reqwest::Client,
    base_url: String,
}

impl GatewayClient {
    pub fn new(config: &BackendConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<String, AppError> {
        let response = self
            .client
            .post(self.url("/t-login"))
            .json(&LoginRequest { email, password })
            .send()
            .await?;

        let status = response.status();
        let reply = read_auth_reply(response).await?;

        if status == StatusCode::OK && reply.is_success() {
            tracing::info!("Login succeeded for {email}");
            return reply.token.ok_or_else(|| AppError::Backend {
                status: status.as_u16(),
                message: "Login response did not contain a token".to_string(),
            });
        }
        if status == StatusCode::BAD_REQUEST && reply.is_rejected() {
            tracing::info!("Login rejected for {email}");
            return Err(AppError::InvalidCredentials);
        }

        Err(AppError::Backend {
            status: status.as_u16(),
            message: reply.message.unwrap_or_else(|| GENERIC_ERROR.to_string()),
        })
    }

    pub async fn signup(&self, name: &str, email: &str, password: &str) -> Result<(), AppError> {
        let response = self
            .client
            .post(self.url("/t-signup"))
            .json(&SignupRequest {
                name,
                email,
                password,
            })
            .send()
            .await?;

        let status = response.status();
        let reply = read_auth_reply(response).await?;

        if status == StatusCode::OK && reply.is_success() {
            tracing::info!("Registered instructor {email}");
            return Ok(());
        }
        if status == StatusCode::BAD_REQUEST && reply.is_rejected() {
            return Err(AppError::EmailAlreadyRegistered);
        }

        Err(AppError::Backend {
            status: status.as_u16(),
            message: reply.message.unwrap_or_else(|| GENERIC_ERROR.to_string()),
        })
    }

    pub async fn create_group(&self, token: &str, group: &Group) -> Result<(), AppError> {
        let response = self
            .client
            .post(self.url("/t-addgroup"))
            .bearer_auth(token)
            .json(group)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::OK {
            tracing::info!(
                "Created group '{}' with {} members",
                group.group_name,
                group.users.len()
            );
            return Ok(());
        }

        let body = response.text().await?;
        Err(AppError::Backend {
            status: status.as_u16(),
            message: format!("Failed to create group: {body}"),
        })
    }

    pub async fn find_groups(&self, token: &str) -> Result<GroupListing, AppError> {
        let response = self
            .client
            .post(self.url("/find_groups"))
            .bearer_auth(token)
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(AppError::Backend {
                status: status.as_u16(),
                message: "Failed to fetch groups.".to_string(),
            });
        }

        let invalid = || AppError::Backend {
            status: status.as_u16(),
            message: "Invalid response structure.".to_string(),
        };

        let body: FindGroupsResponse = response.json().await.map_err(|_| invalid())?;
        let groups = body.groups.ok_or_else(invalid)?;

        Ok(GroupListing {
            mail_id: body.mail_id,
            groups: group_names(&groups),
        })
    }

    /// Returns the backend's id for the new quiz.
    pub async fn assign_test(&self, token: &str, payload: &QuizAssignment) -> Result<String, AppError> {
        let response = self
            .client
            .post(self.url("/assign_tests"))
            .bearer_auth(token)
            .json(payload)
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::OK {
            let body = response.text().await?;
            return Err(AppError::Backend {
                status: status.as_u16(),
                message: format!("Failed to assign quiz: {body}"),
            });
        }

        let invalid = || AppError::Backend {
            status: status.as_u16(),
            message: "Unexpected response structure.".to_string(),
        };

        let body: AssignResponse = response.json().await.map_err(|_| invalid())?;
        let quiz_id = match body.quiz_id.ok_or_else(invalid)? {
            Value::String(id) => id,
            Value::Number(id) => id.to_string(),
            _ => return Err(invalid()),
        };

        tracing::info!(
            "Assigned quiz {quiz_id} ({} questions) to group '{}'",
            payload.questions().len(),
            payload.group()
        );
        Ok(quiz_id)
    }
}

/// Auth replies may carry an empty or non-JSON body on failure.
async fn read_auth_reply(response: reqwest::Response) -> Result<AuthReply, AppError> {
    let body = response.text().await?;
    Ok(serde_json::from_str(&body).unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::MockBackend;

    #[tokio::test]
    async fn test_login_returns_token() {
        let backend = MockBackend::start().await;
        let gateway = backend.gateway();

        let token = gateway.login("a@b.com", "secret").await.unwrap();
        assert_eq!(token, MockBackend::TOKEN);
    }

    #[tokio::test]
    async fn test_login_wrong_password() {
        let backend = MockBackend::start().await;
        let gateway = backend.gateway();

        let err = gateway.login("a@b.com", "wrong").await.unwrap_err();
        assert!(matches!(err, AppError::InvalidCredentials));
        assert_eq!(err.to_string(), "Invalid password. Please try again.");
    }

    #[tokio::test]
    async fn test_signup_duplicate_email() {
        let backend = MockBackend::start().await;
        let gateway = backend.gateway();

        gateway.signup("Ada", "new@b.com", "pw").await.unwrap();
        let err = gateway.signup("Ada", "a@b.com", "pw").await.unwrap_err();
        assert!(matches!(err, AppError::EmailAlreadyRegistered));
    }

    #[tokio::test]
    async fn test_group_calls_require_bearer_token() {
        let backend = MockBackend::start().await;
        let gateway = backend.gateway();

        let listing = gateway.find_groups(MockBackend::TOKEN).await.unwrap();
        assert_eq!(listing.mail_id.as_deref(), Some("a@b.com"));
        assert_eq!(listing.groups, vec!["G1".to_string()]);

        let group = Group {
            group_name: "G2".into(),
            users: vec!["s@b.com".into()],
        };
        gateway.create_group(MockBackend::TOKEN, &group).await.unwrap();
        assert_eq!(backend.created_groups(), vec![serde_json::to_value(&group).unwrap()]);

        let err = gateway.find_groups("bogus").await.unwrap_err();
        assert_eq!(err.to_string(), "Failed to fetch groups.");

        let err = gateway.create_group("bogus", &group).await.unwrap_err();
        assert!(err.to_string().starts_with("Failed to create group:"));
    }

    #[tokio::test]
    async fn test_connection_failure_is_reported() {
        // Nothing listens on the discard port.
        let gateway = GatewayClient::new(&BackendConfig {
            base_url: "http://127.0.0.1:9".into(),
        })
        .unwrap();

        let err = gateway.login("a@b.com", "secret").await.unwrap_err();
        assert!(matches!(err, AppError::Connection(_)));
        assert!(err.to_string().starts_with("Error connecting to server:"));
    }
}
