use thiserror::Error;

use crate::domain::{AccountNumber, Cents, RuleViolation, ValidationError, display_cents};

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Invalid input: {0}")]
    Validation(#[from] ValidationError),

    #[error("Not enough money: balance {}, requested {}", display_cents(.balance), display_cents(.requested))]
    InsufficientFunds { balance: Cents, requested: Cents },

    #[error(
        "Can't go below {}: balance {}, requested {}",
        display_cents(.minimum),
        display_cents(.balance),
        display_cents(.requested)
    )]
    MinimumBalance {
        balance: Cents,
        requested: Cents,
        minimum: Cents,
    },

    #[error("Account not found: {0}")]
    AccountNotFound(String),

    #[error("Can't send money to your own account {0}")]
    SelfTransfer(String),

    #[error("Could not generate a unique account number after {attempts} attempts")]
    DuplicateAccount { attempts: usize },

    #[error("Wrong account number, email or password")]
    AuthenticationFailed,

    #[error("Email already registered: {0}")]
    EmailAlreadyRegistered(String),

    #[error("Quiz not found: {0}")]
    QuizNotFound(String),

    #[error("Database error: {0}")]
    Database(#[from] anyhow::Error),
}

impl LedgerError {
    pub(crate) fn account_not_found(number: &AccountNumber) -> Self {
        LedgerError::AccountNotFound(number.to_string())
    }
}

impl From<RuleViolation> for LedgerError {
    fn from(violation: RuleViolation) -> Self {
        match violation {
            RuleViolation::Validation(err) => LedgerError::Validation(err),
            RuleViolation::InsufficientFunds { balance, requested } => {
                LedgerError::InsufficientFunds { balance, requested }
            }
            RuleViolation::MinimumBalance {
                balance,
                requested,
                minimum,
            } => LedgerError::MinimumBalance {
                balance,
                requested,
                minimum,
            },
            RuleViolation::SelfTransfer(number) => LedgerError::SelfTransfer(number.to_string()),
        }
    }
}
