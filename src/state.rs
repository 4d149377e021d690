use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::config::AppConfig;
use crate::errors::AppError;
use crate::models::quiz::{Difficulty, QuestionType, QuizQuestion};
use crate::services::gateway::GatewayClient;
use crate::services::llm_provider::{CompletionBackend, Embedder, RigCompletion, RigEmbedder};

/// Process-wide dependencies, built once at startup and handed to the
/// controller.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub gateway: GatewayClient,
    pub embedder: Arc<dyn Embedder>,
    pub llm: Arc<dyn CompletionBackend>,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        gateway: GatewayClient,
        embedder: Arc<dyn Embedder>,
        llm: Arc<dyn CompletionBackend>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            gateway,
            embedder,
            llm,
        }
    }

    pub fn from_config(config: AppConfig) -> Result<Self> {
        let gateway = GatewayClient::new(&config.backend)?;
        let embedder = RigEmbedder::from_config(&config.embeddings)
            .context("Failed to set up the embedding model")?;
        let llm = RigCompletion::from_config(&config.llm).context("Failed to set up the LLM")?;

        Ok(Self::new(config, gateway, Arc::new(embedder), Arc::new(llm)))
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum Page {
    #[default]
    Login,
    SignUp,
    Home,
}

/// Parameters of one "Generate Quiz" action.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QuizRequest {
    pub difficulty: Difficulty,
    pub question_type: QuestionType,
    pub num_questions: u32,
    /// Optional search text; when blank the leading chunks are used.
    pub search: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub enum DraftStatus {
    #[default]
    Draft,
    Generated,
    Assigned {
        quiz_id: String,
        assigned_at: DateTime<Utc>,
    },
}

/// The quiz being prepared: `Draft -> Generated -> Assigned`. Regenerating
/// replaces the questions wholesale and stays in `Generated`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct QuizDraft {
    pub status: DraftStatus,
    pub request: Option<QuizRequest>,
    pub questions: Vec<QuizQuestion>,
}

impl QuizDraft {
    pub fn mark_generated(
        &mut self,
        request: QuizRequest,
        questions: Vec<QuizQuestion>,
    ) -> Result<(), AppError> {
        if let DraftStatus::Assigned { quiz_id, .. } = &self.status {
            return Err(AppError::InvalidState(format!(
                "Quiz {quiz_id} has already been assigned. Start a new quiz first."
            )));
        }
        self.status = DraftStatus::Generated;
        self.request = Some(request);
        self.questions = questions;
        Ok(())
    }

    pub fn mark_assigned(&mut self, quiz_id: String) -> Result<(), AppError> {
        match self.status {
            DraftStatus::Generated => {
                self.status = DraftStatus::Assigned {
                    quiz_id,
                    assigned_at: Utc::now(),
                };
                Ok(())
            }
            DraftStatus::Draft => Err(AppError::InvalidState(
                "Generate a quiz before assigning it.".to_string(),
            )),
            DraftStatus::Assigned { .. } => Err(AppError::InvalidState(
                "This quiz has already been assigned.".to_string(),
            )),
        }
    }

    pub fn is_generated(&self) -> bool {
        self.status == DraftStatus::Generated
    }
}

/// Everything one instructor session remembers between actions.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct SessionState {
    pub page: Page,
    pub token: Option<String>,
    pub mail_id: Option<String>,
    pub groups: Vec<String>,
    pub selected_group: Option<String>,
    pub draft: QuizDraft,
}

impl SessionState {
    pub fn is_logged_in(&self) -> bool {
        self.token.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> QuizRequest {
        QuizRequest {
            difficulty: Difficulty::Easy,
            question_type: QuestionType::FillInTheBlanks,
            num_questions: 1,
            search: None,
        }
    }

    #[test]
    fn test_draft_state_machine() {
        let mut draft = QuizDraft::default();
        assert!(matches!(draft.mark_assigned("q".into()), Err(AppError::InvalidState(_))));

        draft.mark_generated(request(), vec![]).unwrap();
        draft.mark_generated(request(), vec![]).unwrap();
        assert!(draft.is_generated());

        draft.mark_assigned("quiz-1".into()).unwrap();
        assert!(matches!(draft.status, DraftStatus::Assigned { ref quiz_id, .. } if quiz_id == "quiz-1"));

        assert!(draft.mark_generated(request(), vec![]).is_err());
        assert!(draft.mark_assigned("quiz-2".into()).is_err());
    }

    #[test]
    fn test_session_state_serializes() {
        let mut session = SessionState {
            page: Page::Home,
            token: Some("t".into()),
            groups: vec!["G1".into()],
            ..Default::default()
        };
        session.draft.mark_generated(request(), vec![]).unwrap();

        let json = serde_json::to_string(&session).unwrap();
        let restored: SessionState = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, session);
    }
}
