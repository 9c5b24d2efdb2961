use tracing::{info, warn};

use crate::domain::{
    Quiz, QuizAttempt, QuizUser, normalize_email, validate_email, validate_password,
};
use crate::storage::Repository;

use super::LedgerError;

/// Registration, login and scoring for the quiz tracker.
pub struct QuizService {
    repo: Repository,
}

impl QuizService {
    pub fn new(repo: Repository) -> Self {
        Self { repo }
    }

    /// Initialize a new database at the given path.
    pub async fn init(database_path: &str) -> Result<Self, LedgerError> {
        let db_url = format!("sqlite:{}?mode=rwc", database_path);
        let repo = Repository::init(&db_url).await?;
        Ok(Self::new(repo))
    }

    /// Connect to an existing database.
    pub async fn connect(database_path: &str) -> Result<Self, LedgerError> {
        let db_url = format!("sqlite:{}", database_path);
        let repo = Repository::connect(&db_url).await?;
        Ok(Self::new(repo))
    }

    pub async fn register(&self, email: &str, password: &str) -> Result<QuizUser, LedgerError> {
        let email = normalize_email(email);
        validate_email(&email)?;
        validate_password(password)?;

        let Some(user) = self.repo.save_quiz_user(&email, password).await? else {
            return Err(LedgerError::EmailAlreadyRegistered(email));
        };
        info!(email = %user.email, "quiz user registered");
        Ok(user)
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<QuizUser, LedgerError> {
        let email = normalize_email(email);
        match self.repo.get_quiz_user(&email).await? {
            Some((user, stored)) if stored == password => Ok(user),
            _ => {
                warn!(email = %email, "quiz login failed");
                Err(LedgerError::AuthenticationFailed)
            }
        }
    }

    pub async fn list_quizzes(&self) -> Result<Vec<Quiz>, LedgerError> {
        Ok(self.repo.list_quizzes().await?)
    }

    pub async fn get_quiz(&self, name: &str) -> Result<Quiz, LedgerError> {
        self.repo
            .get_quiz_by_name(name)
            .await?
            .ok_or_else(|| LedgerError::QuizNotFound(name.to_string()))
    }

    /// Score `answers` (1-based option numbers, one per question) and store the attempt.
    pub async fn take_quiz(
        &self,
        user: &QuizUser,
        quiz_name: &str,
        answers: &[usize],
    ) -> Result<QuizAttempt, LedgerError> {
        let quiz = self.get_quiz(quiz_name).await?;
        let score = quiz.score(answers);
        let attempt = self
            .repo
            .save_attempt(user, &quiz, score, quiz.total())
            .await?;

        info!(
            email = %user.email,
            quiz = %quiz.name,
            score,
            total = attempt.total,
            "quiz attempt recorded"
        );
        Ok(attempt)
    }

    /// Every attempt by `user`, oldest first.
    pub async fn results(&self, user: &QuizUser) -> Result<Vec<QuizAttempt>, LedgerError> {
        Ok(self.repo.list_attempts(user).await?)
    }
}
