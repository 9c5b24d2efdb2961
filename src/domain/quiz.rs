use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type QuizId = i64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub prompt: String,
    /// Shown to the taker numbered from 1
    pub options: Vec<String>,
    /// Text of the correct option
    pub answer: String,
}

impl Question {
    /// `choice` is the 1-based option number picked by the taker.
    pub fn is_correct(&self, choice: usize) -> bool {
        choice
            .checked_sub(1)
            .and_then(|idx| self.options.get(idx))
            .is_some_and(|option| *option == self.answer)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Quiz {
    pub id: QuizId,
    pub name: String,
    pub questions: Vec<Question>,
}

impl Quiz {
    /// One point per correct answer. Missing or out-of-range answers score nothing.
    pub fn score(&self, answers: &[usize]) -> u32 {
        self.questions
            .iter()
            .zip(answers)
            .filter(|(question, choice)| question.is_correct(**choice))
            .count() as u32
    }

    pub fn total(&self) -> u32 {
        self.questions.len() as u32
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizUser {
    pub id: i64,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

/// A scored attempt at a quiz.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizAttempt {
    pub id: i64,
    pub email: String,
    pub quiz_name: String,
    pub score: u32,
    pub total: u32,
    pub taken_at: DateTime<Utc>,
}

/// Emails are matched case-insensitively and without surrounding whitespace.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
