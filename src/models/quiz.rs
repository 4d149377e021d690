use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard];
}

impl std::fmt::Display for Difficulty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Difficulty::Easy => write!(f, "Easy"),
            Difficulty::Medium => write!(f, "Medium"),
            Difficulty::Hard => write!(f, "Hard"),
        }
    }
}

impl FromStr for Difficulty {
    type Err = anyhow::Error;
    fn from_str(value: &str) -> anyhow::Result<Self> {
        match value.trim().to_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            other => Err(anyhow::anyhow!("Invalid difficulty: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum QuestionType {
    #[serde(rename = "MCQ")]
    MultipleChoice,
    #[serde(rename = "Fill in the Blanks")]
    FillInTheBlanks,
}

impl QuestionType {
    pub const ALL: [QuestionType; 2] = [QuestionType::MultipleChoice, QuestionType::FillInTheBlanks];
}

impl std::fmt::Display for QuestionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QuestionType::MultipleChoice => write!(f, "MCQ"),
            QuestionType::FillInTheBlanks => write!(f, "Fill in the Blanks"),
        }
    }
}

impl FromStr for QuestionType {
    type Err = anyhow::Error;
    fn from_str(value: &str) -> anyhow::Result<Self> {
        match value.trim().to_lowercase().as_str() {
            "mcq" => Ok(QuestionType::MultipleChoice),
            "fill in the blanks" | "fill" | "blanks" => Ok(QuestionType::FillInTheBlanks),
            other => Err(anyhow::anyhow!("Invalid question type: {other}")),
        }
    }
}

pub const MCQ_OPTION_COUNT: usize = 4;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct MultipleChoiceQuestion {
    pub question: String,
    pub answer: String,
    pub options: Vec<String>,
    pub topic: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct FillInBlankQuestion {
    pub question: String,
    pub answer: String,
    pub topic: String,
}

/// A generated question. Serializes as the bare object the backend stores;
/// an object with `options` reads back as multiple choice.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum QuizQuestion {
    MultipleChoice(MultipleChoiceQuestion),
    FillInBlank(FillInBlankQuestion),
}

impl QuizQuestion {
    pub fn question(&self) -> &str {
        match self {
            QuizQuestion::MultipleChoice(q) => &q.question,
            QuizQuestion::FillInBlank(q) => &q.question,
        }
    }

    pub fn answer(&self) -> &str {
        match self {
            QuizQuestion::MultipleChoice(q) => &q.answer,
            QuizQuestion::FillInBlank(q) => &q.answer,
        }
    }

    pub fn topic(&self) -> &str {
        match self {
            QuizQuestion::MultipleChoice(q) => &q.topic,
            QuizQuestion::FillInBlank(q) => &q.topic,
        }
    }

    /// Checks the constraints JSON syntax alone cannot express.
    pub fn validate(&self) -> Result<(), String> {
        if self.question().trim().is_empty() {
            return Err("question text is empty".to_string());
        }
        if self.answer().trim().is_empty() {
            return Err(format!("question '{}' has no answer", self.question()));
        }
        if let QuizQuestion::MultipleChoice(q) = self {
            if q.options.len() != MCQ_OPTION_COUNT {
                return Err(format!(
                    "question '{}' has {} options, expected {MCQ_OPTION_COUNT}",
                    q.question,
                    q.options.len()
                ));
            }
        }
        Ok(())
    }
}
