mod quiz;
mod repository;

pub use repository::*;

/// SQL migration for accounts, movements and login sessions
pub const MIGRATION_001_ACCOUNTS: &str = include_str!("migrations/001_accounts.sql");

/// SQL migration for quiz tables and seeded quizzes
pub const MIGRATION_002_QUIZZES: &str = include_str!("migrations/002_quizzes.sql");
