use anyhow::{Context, Result};
use chrono::Utc;
use sqlx::Row;
use sqlx::sqlite::SqliteRow;

use crate::domain::{Question, Quiz, QuizAttempt, QuizId, QuizUser};

use super::Repository;
use super::repository::parse_timestamp;

impl Repository {
    // ========================
    // Quiz users
    // ========================

    /// Insert a quiz user. `email` must already be normalized.
    /// Returns `None` when the email is already registered.
    pub async fn save_quiz_user(&self, email: &str, password: &str) -> Result<Option<QuizUser>> {
        let created_at = Utc::now();
        let row = sqlx::query(
            r#"
            INSERT INTO quiz_users (email, password, created_at)
            VALUES (?, ?, ?)
            ON CONFLICT (email) DO NOTHING
            RETURNING id
            "#,
        )
        .bind(email)
        .bind(password)
        .bind(created_at.to_rfc3339())
        .fetch_optional(&self.pool)
        .await
        .context("Failed to save quiz user")?;

        Ok(row.map(|row| QuizUser {
            id: row.get("id"),
            email: email.to_string(),
            created_at,
        }))
    }

    /// The user and their stored password, if registered.
    pub async fn get_quiz_user(&self, email: &str) -> Result<Option<(QuizUser, String)>> {
        let row = sqlx::query("SELECT id, email, password, created_at FROM quiz_users WHERE email = ?")
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch quiz user")?;

        let Some(row) = row else {
            return Ok(None);
        };
        let created_at: String = row.get("created_at");
        let user = QuizUser {
            id: row.get("id"),
            email: row.get("email"),
            created_at: parse_timestamp(&created_at).context("Invalid created_at")?,
        };
        Ok(Some((user, row.get("password"))))
    }

    // ========================
    // Quizzes
    // ========================

    pub async fn list_quizzes(&self) -> Result<Vec<Quiz>> {
        let rows = sqlx::query("SELECT id, name FROM quizzes ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .context("Failed to list quizzes")?;

        let mut quizzes = Vec::with_capacity(rows.len());
        for row in rows {
            let id: QuizId = row.get("id");
            quizzes.push(Quiz {
                id,
                name: row.get("name"),
                questions: self.list_questions(id).await?,
            });
        }
        Ok(quizzes)
    }

    /// Case-insensitive lookup by name.
    pub async fn get_quiz_by_name(&self, name: &str) -> Result<Option<Quiz>> {
        let row = sqlx::query("SELECT id, name FROM quizzes WHERE name = ? COLLATE NOCASE")
            .bind(name.trim())
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch quiz")?;

        match row {
            Some(row) => {
                let id: QuizId = row.get("id");
                Ok(Some(Quiz {
                    id,
                    name: row.get("name"),
                    questions: self.list_questions(id).await?,
                }))
            }
            None => Ok(None),
        }
    }

    async fn list_questions(&self, quiz_id: QuizId) -> Result<Vec<Question>> {
        let rows = sqlx::query(
            "SELECT prompt, options, answer FROM quiz_questions WHERE quiz_id = ? ORDER BY position",
        )
        .bind(quiz_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list quiz questions")?;

        rows.iter().map(Self::row_to_question).collect()
    }

    fn row_to_question(row: &SqliteRow) -> Result<Question> {
        let options_json: String = row.get("options");
        Ok(Question {
            prompt: row.get("prompt"),
            options: serde_json::from_str(&options_json).context("Invalid question options")?,
            answer: row.get("answer"),
        })
    }

    // ========================
    // Attempts
    // ========================

    pub async fn save_attempt(
        &self,
        user: &QuizUser,
        quiz: &Quiz,
        score: u32,
        total: u32,
    ) -> Result<QuizAttempt> {
        let taken_at = Utc::now();
        let row = sqlx::query(
            r#"
            INSERT INTO quiz_attempts (user_id, quiz_id, score, total, taken_at)
            VALUES (?, ?, ?, ?, ?)
            RETURNING id
            "#,
        )
        .bind(user.id)
        .bind(quiz.id)
        .bind(score)
        .bind(total)
        .bind(taken_at.to_rfc3339())
        .fetch_one(&self.pool)
        .await
        .context("Failed to save quiz attempt")?;

        Ok(QuizAttempt {
            id: row.get("id"),
            email: user.email.clone(),
            quiz_name: quiz.name.clone(),
            score,
            total,
            taken_at,
        })
    }

    /// Attempts by one user in the order they were taken.
    pub async fn list_attempts(&self, user: &QuizUser) -> Result<Vec<QuizAttempt>> {
        let rows = sqlx::query(
            r#"
            SELECT a.id, u.email, q.name AS quiz_name, a.score, a.total, a.taken_at
            FROM quiz_attempts a
            JOIN quiz_users u ON u.id = a.user_id
            JOIN quizzes q ON q.id = a.quiz_id
            WHERE a.user_id = ?
            ORDER BY a.id
            "#,
        )
        .bind(user.id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list quiz attempts")?;

        rows.iter().map(Self::row_to_attempt).collect()
    }

    fn row_to_attempt(row: &SqliteRow) -> Result<QuizAttempt> {
        let taken_at: String = row.get("taken_at");
        Ok(QuizAttempt {
            id: row.get("id"),
            email: row.get("email"),
            quiz_name: row.get("quiz_name"),
            score: row.get("score"),
            total: row.get("total"),
            taken_at: parse_timestamp(&taken_at).context("Invalid taken_at")?,
        })
    }
}
