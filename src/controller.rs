use crate::dto::group::Group;
use crate::dto::quiz::{QuizAssignment, RetestPolicy};
use crate::errors::AppError;
use crate::models::document::Document;
use crate::models::quiz::QuizQuestion;
use crate::services::gateway::GroupListing;
use crate::services::pdf;
use crate::services::quiz_generator::QuizGenerator;
use crate::services::vector::VectorIndex;
use crate::state::{AppState, DraftStatus, Page, QuizDraft, QuizRequest, SessionState};

/// Options chosen on the "Assign Quiz" step.
#[derive(Debug, Clone)]
pub struct AssignmentOptions {
    pub quiz_name: String,
    pub marks_for_each_qn: u32,
    pub retest: RetestPolicy,
}

/// The uploaded document and everything derived from it.
struct Material {
    document: Document,
    chunks: Vec<String>,
    index: VectorIndex,
}

/// Drives one instructor session: every user action maps to one method,
/// which runs its pipeline stage to completion and updates [`SessionState`].
pub struct AppController {
    state: AppState,
    generator: QuizGenerator,
    session: SessionState,
    material: Option<Material>,
}

impl AppController {
    pub fn new(state: AppState) -> Self {
        let generator = QuizGenerator::new(state.llm.clone(), state.config.llm.max_attempts);
        Self {
            state,
            generator,
            session: SessionState::default(),
            material: None,
        }
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    pub fn document(&self) -> Option<&Document> {
        self.material.as_ref().map(|m| &m.document)
    }

    pub fn show_page(&mut self, page: Page) {
        self.session.page = if page == Page::Home && !self.session.is_logged_in() {
            Page::Login
        } else {
            page
        };
    }

    fn token(&self) -> Result<String, AppError> {
        self.session.token.clone().ok_or(AppError::Unauthorized)
    }

    // ── Auth ────────────────────────────────────────────────

    pub async fn login(&mut self, email: &str, password: &str) -> Result<(), AppError> {
        let email = email.trim();
        if email.is_empty() || password.is_empty() {
            return Err(AppError::Validation(
                "Please enter both email and password.".to_string(),
            ));
        }

        let token = self.state.gateway.login(email, password).await?;
        self.session.token = Some(token);
        self.session.page = Page::Home;
        Ok(())
    }

    pub async fn signup(&mut self, name: &str, email: &str, password: &str) -> Result<(), AppError> {
        let (name, email) = (name.trim(), email.trim());
        if name.is_empty() || email.is_empty() || password.is_empty() {
            return Err(AppError::Validation("Please fill in all fields.".to_string()));
        }

        self.state.gateway.signup(name, email, password).await?;
        self.session.page = Page::Login;
        Ok(())
    }

    /// Forget everything about the session, including the vector index.
    pub async fn logout(&mut self) {
        self.discard_material().await;
        self.session = SessionState::default();
    }

    // ── Groups ──────────────────────────────────────────────

    pub async fn create_group(&mut self, group_name: &str, emails: &[String]) -> Result<Group, AppError> {
        let group_name = group_name.trim();
        let users: Vec<String> = emails
            .iter()
            .map(|e| e.trim())
            .filter(|e| !e.is_empty())
            .map(str::to_string)
            .collect();

        if group_name.is_empty() || emails.iter().all(|e| e.is_empty()) {
            return Err(AppError::Validation(
                "Please provide both a group name and at least one user email.".to_string(),
            ));
        }
        if users.is_empty() {
            return Err(AppError::Validation(
                "Please enter at least one valid email.".to_string(),
            ));
        }

        let token = self.token()?;
        let group = Group {
            group_name: group_name.to_string(),
            users,
        };
        self.state.gateway.create_group(&token, &group).await?;
        Ok(group)
    }

    pub async fn refresh_groups(&mut self) -> Result<GroupListing, AppError> {
        let token = self.token()?;
        let listing = self.state.gateway.find_groups(&token).await?;

        self.session.mail_id = listing.mail_id.clone();
        self.session.groups = listing.groups.clone();
        let still_listed = self
            .session
            .selected_group
            .as_ref()
            .is_none_or(|g| self.session.groups.contains(g));
        if !still_listed {
            self.session.selected_group = None;
        }

        Ok(listing)
    }

    pub fn select_group(&mut self, group_name: &str) -> Result<(), AppError> {
        if !self.session.groups.iter().any(|g| g == group_name) {
            return Err(AppError::Validation(format!("Unknown group: {group_name}")));
        }
        self.session.selected_group = Some(group_name.to_string());
        Ok(())
    }

    // ── Learning material ───────────────────────────────────

    /// Extract, chunk and index an uploaded PDF. Returns the chunk count.
    pub async fn upload_pdf(&mut self, filename: &str, bytes: Vec<u8>) -> Result<usize, AppError> {
        let document = Document::from_pdf(filename, bytes)
            .await
            .map_err(|e| AppError::Extraction(format!("{e:#}")))?;
        self.ingest(document).await
    }

    /// Index a document whose text is already known.
    pub async fn ingest(&mut self, document: Document) -> Result<usize, AppError> {
        if !document.has_text() {
            return Err(AppError::Validation(
                "No text could be extracted from the uploaded PDF.".to_string(),
            ));
        }

        let chunking = &self.state.config.chunking;
        let chunks = pdf::chunk_text(&document.text, chunking.chunk_size, chunking.chunk_overlap);

        self.discard_material().await;

        let index = VectorIndex::build(
            self.state.embedder.clone(),
            &self.state.config.vector_store,
            &document.id,
            &chunks,
        )
        .await?;

        tracing::info!(
            "Learning material '{}' indexed ({} chunks)",
            document.filename,
            chunks.len()
        );

        let count = chunks.len();
        self.material = Some(Material {
            document,
            chunks,
            index,
        });
        self.session.draft = QuizDraft::default();
        Ok(count)
    }

    async fn discard_material(&mut self) {
        if let Some(material) = self.material.take() {
            if let Err(e) = material.index.teardown().await {
                tracing::warn!("Failed to tear down vector index: {e:#}");
            }
        }
    }

    // ── Quiz ────────────────────────────────────────────────

    /// Generate (or regenerate) the draft's questions.
    pub async fn generate_quiz(&mut self, request: QuizRequest) -> Result<&[QuizQuestion], AppError> {
        let material = self.material.as_ref().ok_or_else(|| {
            AppError::Validation("Please upload learning material (PDF) first.".to_string())
        })?;
        if let DraftStatus::Assigned { .. } = self.session.draft.status {
            return Err(AppError::InvalidState(
                "This quiz has already been assigned. Start a new quiz first.".to_string(),
            ));
        }

        let retrieval = &self.state.config.retrieval;
        let context = match request.search.as_deref().map(str::trim) {
            Some(search) if !search.is_empty() => material.index.query(search, retrieval.top_k).await?,
            _ => material
                .chunks
                .iter()
                .take(retrieval.fallback_chunks)
                .map(String::as_str)
                .collect::<Vec<_>>()
                .join(" "),
        };

        let questions = self
            .generator
            .generate(
                &context,
                request.difficulty,
                request.question_type,
                request.num_questions,
            )
            .await?;

        self.session.draft.mark_generated(request, questions)?;
        Ok(&self.session.draft.questions)
    }

    /// Discard an assigned quiz and start over with the same material.
    pub fn start_new_quiz(&mut self) {
        self.session.draft = QuizDraft::default();
    }

    /// Send the generated quiz to the selected group. Returns the quiz id.
    pub async fn assign_quiz(&mut self, options: AssignmentOptions) -> Result<String, AppError> {
        let token = self.token()?;
        if !self.session.draft.is_generated() {
            return Err(AppError::InvalidState(match self.session.draft.status {
                DraftStatus::Assigned { .. } => "This quiz has already been assigned.".to_string(),
                _ => "Generate a quiz before assigning it.".to_string(),
            }));
        }

        let group = self
            .session
            .selected_group
            .clone()
            .ok_or_else(|| AppError::Validation("Please select a group".to_string()))?;
        let document = self
            .document()
            .ok_or_else(|| AppError::Validation("Please upload learning material (PDF) first.".to_string()))?;

        let payload = QuizAssignment::new(
            &group,
            &options.quiz_name,
            self.session.draft.questions.clone(),
            options.marks_for_each_qn,
            options.retest,
            document,
        )?;

        let quiz_id = self.state.gateway.assign_test(&token, &payload).await?;
        self.session.draft.mark_assigned(quiz_id.clone())?;
        Ok(quiz_id)
    }
}
