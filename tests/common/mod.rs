// Allow dead_code because these helpers are used across different test files
// which are compiled separately
#![allow(dead_code)]

use anyhow::Result;
use bankbook::application::{LedgerService, QuizService, Session};
use bankbook::domain::{Account, AccountHolder, Cents, Registration};
use chrono::NaiveDate;
use tempfile::TempDir;

pub const PASSWORD: &str = "Secur3#pass";

/// Helper to create a test service with a temporary database
pub async fn test_service() -> Result<(LedgerService, TempDir)> {
    let temp_dir = TempDir::new()?;
    let db_path = temp_dir.path().join("test.db");
    let service = LedgerService::init(db_path.to_str().unwrap()).await?;
    Ok((service, temp_dir))
}

/// Helper to create a quiz service with a temporary database
pub async fn test_quiz_service() -> Result<(QuizService, TempDir)> {
    let temp_dir = TempDir::new()?;
    let db_path = temp_dir.path().join("test.db");
    let service = QuizService::init(db_path.to_str().unwrap()).await?;
    Ok((service, temp_dir))
}

/// A registration that passes every field check.
pub fn registration(name: &str) -> Registration {
    Registration {
        holder: AccountHolder {
            name: name.to_string(),
            date_of_birth: NaiveDate::from_ymd_opt(1992, 6, 15).unwrap(),
            city: "Pune".to_string(),
            phone: "9123456780".to_string(),
            email: format!("{}@example.com", name.to_lowercase().replace(' ', ".")),
        },
        password: PASSWORD.to_string(),
    }
}

/// Open an account for `name` with `deposit` cents.
pub async fn open(service: &LedgerService, name: &str, deposit: Cents) -> Result<Account> {
    Ok(service.open_account(registration(name), deposit).await?)
}

/// Open an account and log in to it.
pub async fn open_and_login(
    service: &LedgerService,
    name: &str,
    deposit: Cents,
) -> Result<Session> {
    let account = open(service, name, deposit).await?;
    Ok(service
        .authenticate(&account.account_number, PASSWORD)
        .await?)
}
