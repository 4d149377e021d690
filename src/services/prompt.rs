use crate::errors::AppError;
use crate::models::quiz::{Difficulty, QuestionType};

fn difficulty_guidance(difficulty: Difficulty) -> &'static str {
    match difficulty {
        Difficulty::Easy => {
            "Generate simple, straightforward questions that test basic knowledge. \
             They are meant for beginners, need little critical thinking, and focus on \
             foundational concepts and definitions."
        }
        Difficulty::Medium => {
            "Generate moderately challenging questions that need a deeper understanding of \
             the material. Learners should have to apply what they know and think critically, \
             often solving a small problem. Aim at learners with some experience of the topic."
        }
        Difficulty::Hard => {
            "Generate complex, advanced questions that stretch the learner's knowledge and \
             analytical ability. They should require synthesis of information and connections \
             between different concepts, and suit advanced learners comfortable with intricate problems."
        }
    }
}

fn format_instructions(question_type: QuestionType) -> &'static str {
    match question_type {
        QuestionType::MultipleChoice => {
            "Generate concise multiple-choice questions (MCQ) with exactly 4 answer options. \
             Keep the questions, the answer and the options strictly short and relevant. \
             Include the correct answer and a topic for each question. \
             Respond with valid, properly indented JSON only and no other text. \
             The response must be a JSON array where each question is an object with the fields:\n\
             - \"question\" (the MCQ question text)\n\
             - \"answer\" (the correct answer)\n\
             - \"options\" (an array containing the 4 answer options)\n\
             - \"topic\" (the topic of the question)."
        }
        QuestionType::FillInTheBlanks => {
            "Generate concise fill-in-the-blank questions. \
             Make the blanks meaningful and avoid overly long statements. \
             Provide the correct answer and a topic for each question. \
             Respond with valid, properly indented JSON only and no other text. \
             The response must be a JSON array where each question is an object with the fields:\n\
             - \"question\" (the question text, with the blank written as '____')\n\
             - \"answer\" (the word or phrase that fills the blank)\n\
             - \"topic\" (the topic of the question)."
        }
    }
}

/// Compose the single instruction sent to the LLM.
pub fn build_prompt(
    context: &str,
    difficulty: Difficulty,
    question_type: QuestionType,
    num_questions: u32,
) -> Result<String, AppError> {
    if num_questions == 0 {
        return Err(AppError::Validation(
            "Number of questions must be at least 1".to_string(),
        ));
    }

    Ok(format!(
        "Context: {context}\n\nGenerate {num_questions} {question_type} questions based on this context. {} {}",
        difficulty_guidance(difficulty),
        format_instructions(question_type),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_combination_names_count_and_fields() {
        for difficulty in Difficulty::ALL {
            for question_type in QuestionType::ALL {
                let prompt = build_prompt("The sky is blue.", difficulty, question_type, 7).unwrap();

                assert!(prompt.starts_with("Context: The sky is blue.\n\n"));
                assert!(prompt.contains(&format!("Generate 7 {question_type} questions")));
                assert!(prompt.contains(difficulty_guidance(difficulty)));
                assert!(prompt.contains("\"question\""));
                assert!(prompt.contains("\"answer\""));
                assert!(prompt.contains("\"topic\""));

                match question_type {
                    QuestionType::MultipleChoice => assert!(prompt.contains("\"options\"")),
                    QuestionType::FillInTheBlanks => {
                        assert!(!prompt.contains("\"options\""));
                        assert!(prompt.contains("____"));
                    }
                }
            }
        }
    }

    #[test]
    fn test_zero_questions_rejected() {
        let result = build_prompt("ctx", Difficulty::Easy, QuestionType::MultipleChoice, 0);
        assert!(matches!(result, Err(AppError::Validation(_))));
    }
}
