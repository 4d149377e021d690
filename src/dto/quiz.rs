use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::models::document::Document;
use crate::models::quiz::QuizQuestion;

/// Whether students scoring below a threshold are automatically re-tested.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum RetestPolicy {
    #[default]
    Disabled,
    Automated { max_retests: u32, min_marks: u32 },
}

/// Body of `POST /assign_tests`.
///
/// Only [`QuizAssignment::new`] builds one, so `total_marks` always equals
/// `marks_for_each_qn * questions.len()` and the retest fields are zero
/// unless retests are automated.
#[derive(Debug, Clone, Serialize)]
pub struct QuizAssignment {
    group: String,
    questions: Vec<QuizQuestion>,
    quiz_name: String,
    is_retest_automated: bool,
    max_retests_allowed: u32,
    min_marks_for_retest: u32,
    total_marks: u32,
    marks_for_each_qn: u32,
    pdf_binary: String,
    document_id: String,
}

impl QuizAssignment {
    pub fn new(
        group: &str,
        quiz_name: &str,
        questions: Vec<QuizQuestion>,
        marks_for_each_qn: u32,
        retest: RetestPolicy,
        document: &Document,
    ) -> Result<Self, AppError> {
        if group.trim().is_empty() {
            return Err(AppError::Validation("Please select a group".to_string()));
        }
        if quiz_name.trim().is_empty() {
            return Err(AppError::Validation("Please enter a quiz name".to_string()));
        }
        if questions.is_empty() {
            return Err(AppError::Validation("The quiz has no questions".to_string()));
        }
        if marks_for_each_qn == 0 {
            return Err(AppError::Validation(
                "Marks for each question must be at least 1".to_string(),
            ));
        }

        let count = u32::try_from(questions.len())
            .map_err(|_| AppError::Validation("Too many questions".to_string()))?;
        let total_marks = marks_for_each_qn
            .checked_mul(count)
            .ok_or_else(|| AppError::Validation("Total marks overflow".to_string()))?;

        let (is_retest_automated, max_retests_allowed, min_marks_for_retest) = match retest {
            RetestPolicy::Disabled => (false, 0, 0),
            RetestPolicy::Automated {
                max_retests,
                min_marks,
            } => {
                if min_marks > total_marks {
                    return Err(AppError::Validation(format!(
                        "Minimum marks for a retest ({min_marks}) exceed the total marks ({total_marks})"
                    )));
                }
                (true, max_retests, min_marks)
            }
        };

        Ok(Self {
            group: group.to_string(),
            questions,
            quiz_name: quiz_name.trim().to_string(),
            is_retest_automated,
            max_retests_allowed,
            min_marks_for_retest,
            total_marks,
            marks_for_each_qn,
            pdf_binary: STANDARD.encode(&document.bytes),
            document_id: document.id.clone(),
        })
    }

    pub fn group(&self) -> &str {
        &self.group
    }

    pub fn questions(&self) -> &[QuizQuestion] {
        &self.questions
    }

    pub fn total_marks(&self) -> u32 {
        self.total_marks
    }

    pub fn marks_for_each_qn(&self) -> u32 {
        self.marks_for_each_qn
    }

    pub fn min_marks_for_retest(&self) -> u32 {
        self.min_marks_for_retest
    }
}

#[derive(Debug, Deserialize)]
pub struct AssignResponse {
    pub quiz_id: Option<serde_json::Value>,
}
