use serde::de::DeserializeOwned;
use std::sync::Arc;

use crate::errors::AppError;
use crate::models::quiz::{
    Difficulty, FillInBlankQuestion, MultipleChoiceQuestion, QuestionType, QuizQuestion,
};
use crate::services::llm_provider::CompletionBackend;
use crate::services::prompt::build_prompt;

/// Slice the outermost JSON array out of a free-text completion.
pub fn extract_json_array(response: &str) -> Result<&str, AppError> {
    let start = response.find('[');
    let end = response.rfind(']');

    match (start, end) {
        (Some(start), Some(end)) if start < end => Ok(&response[start..=end]),
        _ => Err(AppError::Parse(
            "no JSON array found in the model response".to_string(),
        )),
    }
}

fn parse_array<T: DeserializeOwned>(json: &str) -> Result<Vec<T>, AppError> {
    serde_json::from_str(json).map_err(|e| AppError::Parse(e.to_string()))
}

/// Parse and validate a completion against the shape of `question_type`.
pub fn parse_questions(
    response: &str,
    question_type: QuestionType,
) -> Result<Vec<QuizQuestion>, AppError> {
    let json = extract_json_array(response)?;

    let questions: Vec<QuizQuestion> = match question_type {
        QuestionType::MultipleChoice => parse_array::<MultipleChoiceQuestion>(json)?
            .into_iter()
            .map(QuizQuestion::MultipleChoice)
            .collect(),
        QuestionType::FillInTheBlanks => parse_array::<FillInBlankQuestion>(json)?
            .into_iter()
            .map(QuizQuestion::FillInBlank)
            .collect(),
    };

    if questions.is_empty() {
        return Err(AppError::Parse("the model returned no questions".to_string()));
    }
    for question in &questions {
        question.validate().map_err(AppError::Parse)?;
    }

    Ok(questions)
}

pub struct QuizGenerator {
    llm: Arc<dyn CompletionBackend>,
    max_attempts: u32,
}

impl QuizGenerator {
    pub fn new(llm: Arc<dyn CompletionBackend>, max_attempts: u32) -> Self {
        Self {
            llm,
            max_attempts: max_attempts.max(1),
        }
    }

    /// Ask the model for questions. A response that fails to parse is
    /// retried up to `max_attempts` in total; transport errors are not.
    pub async fn generate(
        &self,
        context: &str,
        difficulty: Difficulty,
        question_type: QuestionType,
        num_questions: u32,
    ) -> Result<Vec<QuizQuestion>, AppError> {
        let prompt = build_prompt(context, difficulty, question_type, num_questions)?;

        let mut last_error = None;
        for attempt in 1..=self.max_attempts {
            let response = self
                .llm
                .complete(&prompt)
                .await
                .map_err(|e| AppError::Generation(format!("{e:#}")))?;

            match parse_questions(&response, question_type) {
                Ok(questions) => {
                    tracing::info!(
                        "Generated {} {question_type} questions (attempt {attempt})",
                        questions.len()
                    );
                    return Ok(questions);
                }
                Err(e) => {
                    tracing::warn!("Attempt {attempt}/{} returned unusable output: {e}", self.max_attempts);
                    last_error = Some(e);
                }
            }
        }

        Err(AppError::Generation(
            last_error.map(|e| e.to_string()).unwrap_or_default(),
        ))
    }
}
